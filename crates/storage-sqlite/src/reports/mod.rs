//! SQLite storage implementation for report definitions and queries.

mod model;
mod repository;

pub use model::{ReportDefinitionDB, ReportQueryDB};
pub use repository::ReportRepository;
