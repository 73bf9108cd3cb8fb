//! Sequences module - per-partition counters for human-readable codes.

mod sequences_service;
mod sequences_traits;

pub use sequences_service::{format_code, with_sequence_retry, SequenceService};
pub use sequences_traits::{SequenceRepositoryTrait, SequenceServiceTrait};
