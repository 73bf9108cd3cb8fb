//! Tenants module - directory models, partition resolution, and services.

mod partition;
mod tenants_model;
mod tenants_service;
mod tenants_traits;

pub use partition::{partition_id_for, PartitionHandle, PartitionResolver};
pub use tenants_model::{NewTenant, Tenant, TenantUpdate};
pub use tenants_service::TenantService;
pub use tenants_traits::{TenantRepositoryTrait, TenantServiceTrait};
