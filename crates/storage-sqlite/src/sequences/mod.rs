//! SQLite storage implementation for sequence counters.

mod repository;

pub use repository::SequenceRepository;
