use log::{debug, info};
use std::sync::Arc;

use super::partition::PartitionResolver;
use super::tenants_model::{NewTenant, Tenant, TenantUpdate};
use super::tenants_traits::{TenantRepositoryTrait, TenantServiceTrait};
use crate::errors::{Error, Result};

/// Service for administering the tenant directory.
///
/// Every write drops the resolver's cached handle for the tenant so that a
/// deactivation takes effect on the next request.
pub struct TenantService {
    repository: Arc<dyn TenantRepositoryTrait>,
    resolver: Arc<PartitionResolver>,
}

impl TenantService {
    pub fn new(repository: Arc<dyn TenantRepositoryTrait>, resolver: Arc<PartitionResolver>) -> Self {
        Self {
            repository,
            resolver,
        }
    }
}

#[async_trait::async_trait]
impl TenantServiceTrait for TenantService {
    fn get_tenant(&self, code: &str) -> Result<Tenant> {
        self.repository
            .find_by_code(code)?
            .ok_or_else(|| Error::not_found("Tenant", code))
    }

    fn list_tenants(&self, is_active_filter: Option<bool>) -> Result<Vec<Tenant>> {
        self.repository.list(is_active_filter)
    }

    async fn create_tenant(&self, new_tenant: NewTenant) -> Result<Tenant> {
        new_tenant.validate()?;
        if self.repository.find_by_code(&new_tenant.code)?.is_some() {
            return Err(Error::Conflict(format!(
                "Tenant '{}' already exists",
                new_tenant.code
            )));
        }
        debug!("Creating tenant {}", new_tenant.code);
        let tenant = self.repository.create(new_tenant).await?;
        self.resolver.invalidate(&tenant.code);
        Ok(tenant)
    }

    async fn update_tenant(&self, code: &str, update: TenantUpdate) -> Result<Tenant> {
        update.validate()?;
        let tenant = self.repository.update(code, update).await?;
        self.resolver.invalidate(code);
        Ok(tenant)
    }

    async fn seed_tenants(&self, tenants: Vec<NewTenant>) -> Result<usize> {
        let mut applied = 0;
        for tenant in tenants {
            tenant.validate()?;
            let code = tenant.code.clone();
            self.repository.upsert(tenant).await?;
            self.resolver.invalidate(&code);
            applied += 1;
        }
        info!("Seeded {} tenant(s) into the directory", applied);
        Ok(applied)
    }
}
