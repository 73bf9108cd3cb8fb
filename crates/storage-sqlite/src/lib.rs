//! SQLite storage implementation for the SNDS backend.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in `snds-core`
//! and contains:
//! - Connection pooling, one writer actor per database file
//! - Embedded Diesel migrations for the directory and partition databases
//! - Lazily opened per-tenant partition databases
//! - Repository implementations for all domain entities
//!
//! # Architecture
//!
//! ```text
//!            core (domain)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!           │              │
//!           ▼              ▼
//!     directory.db    snds_<code>.db (one per tenant)
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod contributions;
pub mod needs;
pub mod plans;
pub mod reports;
pub mod sequences;
pub mod tenants;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, open, open_directory, run_migrations, Database,
    DbConnection, DbPool, PartitionPools, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use contributions::ContributionRepository;
pub use needs::NeedRepository;
pub use plans::PlanRepository;
pub use reports::ReportRepository;
pub use sequences::SequenceRepository;
pub use tenants::TenantRepository;

// Re-export from snds-core for convenience
pub use snds_core::errors::{DatabaseError, Error, Result};
