//! SQLite storage implementation for plans.

mod model;
mod repository;

pub use model::PlanDB;
pub use repository::PlanRepository;
