//! Tenant directory repository and service traits.

use async_trait::async_trait;

use super::tenants_model::{NewTenant, Tenant, TenantUpdate};
use crate::errors::Result;

/// Persistence contract for the tenant directory.
///
/// The directory lives outside every tenant partition; it is the only
/// store consulted before a partition handle exists.
#[async_trait]
pub trait TenantRepositoryTrait: Send + Sync {
    /// Looks up a tenant by its exact code.
    fn find_by_code(&self, code: &str) -> Result<Option<Tenant>>;

    /// Lists tenants, optionally filtered by active flag.
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Tenant>>;

    async fn create(&self, new_tenant: NewTenant) -> Result<Tenant>;

    async fn update(&self, code: &str, update: TenantUpdate) -> Result<Tenant>;

    /// Inserts the tenant or refreshes its mutable fields. Used by seeding.
    async fn upsert(&self, tenant: NewTenant) -> Result<Tenant>;
}

/// Tenant administration operations.
#[async_trait]
pub trait TenantServiceTrait: Send + Sync {
    fn get_tenant(&self, code: &str) -> Result<Tenant>;

    fn list_tenants(&self, is_active_filter: Option<bool>) -> Result<Vec<Tenant>>;

    async fn create_tenant(&self, new_tenant: NewTenant) -> Result<Tenant>;

    async fn update_tenant(&self, code: &str, update: TenantUpdate) -> Result<Tenant>;

    /// Upserts every tenant from a seed list; returns the number applied.
    async fn seed_tenants(&self, tenants: Vec<NewTenant>) -> Result<usize>;
}
