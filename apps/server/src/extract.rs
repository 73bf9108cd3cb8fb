//! Request extractors for the tenant partition and the caller identity.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use snds_core::constants::{CALLER_PERMISSIONS_HEADER, CALLER_ROLE_HEADER, TENANT_HEADER};
use snds_core::permissions::CallerIdentity;
use snds_core::PartitionHandle;

use crate::error::ApiError;
use crate::main_lib::AppState;

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Partition of the tenant named by the `x-tenant-code` header.
///
/// Resolution happens before the handler body runs, so an unknown tenant is
/// rejected before any partition data is touched.
pub struct Tenant(pub PartitionHandle);

impl FromRequestParts<Arc<AppState>> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let handle = state.resolver.resolve(header(parts, TENANT_HEADER))?;
        tracing::debug!(partition = handle.partition_id(), "tenant resolved");
        Ok(Tenant(handle))
    }
}

/// Role and granted permissions forwarded by the identity collaborator.
pub struct Caller(pub CallerIdentity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(CallerIdentity::from_header_values(
            header(parts, CALLER_ROLE_HEADER),
            header(parts, CALLER_PERMISSIONS_HEADER),
        )))
    }
}
