//! Per-request resolution of tenant codes to partition handles.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use super::tenants_traits::TenantRepositoryTrait;
use crate::constants::PARTITION_PREFIX;
use crate::errors::{Error, Result};

/// Physical partition name for a tenant code.
pub fn partition_id_for(tenant_code: &str) -> String {
    format!("{}{}", PARTITION_PREFIX, tenant_code)
}

/// Handle to one tenant's isolated data partition.
///
/// Handles are immutable and cheap to clone. Two handles built for the same
/// tenant code always carry the same partition id, in every process.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PartitionHandle {
    tenant_code: Arc<str>,
    partition_id: Arc<str>,
}

impl PartitionHandle {
    pub fn for_tenant(tenant_code: &str) -> Self {
        Self {
            tenant_code: Arc::from(tenant_code),
            partition_id: Arc::from(partition_id_for(tenant_code)),
        }
    }

    pub fn tenant_code(&self) -> &str {
        &self.tenant_code
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }
}

impl fmt::Debug for PartitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PartitionHandle")
            .field(&self.partition_id)
            .finish()
    }
}

/// Resolves tenant codes through the directory and caches the handles.
///
/// Only successful lookups of active tenants are cached. The cache is a pure
/// optimization: `invalidate` may be called at any time.
pub struct PartitionResolver {
    directory: Arc<dyn TenantRepositoryTrait>,
    handles: DashMap<String, PartitionHandle>,
}

impl PartitionResolver {
    pub fn new(directory: Arc<dyn TenantRepositoryTrait>) -> Self {
        Self {
            directory,
            handles: DashMap::new(),
        }
    }

    /// Resolves the tenant code supplied with a request.
    ///
    /// Fails with `TenantCodeMissing` when no (or a blank) code was supplied
    /// and with `NotFound` when the directory has no active tenant for it.
    pub fn resolve(&self, tenant_code: Option<&str>) -> Result<PartitionHandle> {
        let code = match tenant_code {
            Some(code) if !code.trim().is_empty() => code,
            _ => return Err(Error::TenantCodeMissing),
        };

        if let Some(handle) = self.handles.get(code) {
            return Ok(handle.clone());
        }

        match self.directory.find_by_code(code)? {
            Some(tenant) if tenant.is_active => {
                let handle = PartitionHandle::for_tenant(&tenant.code);
                debug!(
                    "Resolved tenant '{}' to partition '{}'",
                    code,
                    handle.partition_id()
                );
                self.handles.insert(code.to_string(), handle.clone());
                Ok(handle)
            }
            _ => Err(Error::not_found("Tenant", code)),
        }
    }

    /// Drops the cached handle for a tenant.
    pub fn invalidate(&self, tenant_code: &str) {
        self.handles.remove(tenant_code);
    }

    pub fn cached_len(&self) -> usize {
        self.handles.len()
    }
}
