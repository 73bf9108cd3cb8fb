//! SQLite storage implementation for the tenant directory.

mod model;
mod repository;

pub use model::TenantDB;
pub use repository::TenantRepository;
