//! SNDS Core - Domain entities, services, and traits.
//!
//! This crate contains the business logic for the school needs backend:
//! tenant partitions, plans, needs, contributions, status propagation,
//! permissions and reports. It is database-agnostic and defines traits that
//! are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod contributions;
pub mod errors;
pub mod events;
pub mod needs;
pub mod permissions;
pub mod plans;
pub mod propagation;
pub mod reports;
pub mod sequences;
pub mod tenants;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use tenants::PartitionHandle;
