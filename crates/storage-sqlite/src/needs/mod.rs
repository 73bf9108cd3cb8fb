//! SQLite storage implementation for needs and their plan links.

mod model;
mod repository;

pub use model::{NeedDB, NeedPlanDB};
pub use repository::NeedRepository;
