use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{error::ApiResult, extract::Caller, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpandedPermissions {
    role: Option<String>,
    granted: BTreeSet<String>,
    effective: BTreeSet<String>,
}

/// Effective capabilities of the caller. Needs no tenant.
async fn expand_caller(Caller(caller): Caller) -> ApiResult<Json<ExpandedPermissions>> {
    let effective = caller.expanded_permissions();
    Ok(Json(ExpandedPermissions {
        granted: caller.permissions.iter().cloned().collect(),
        role: caller.role,
        effective,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/permissions/expand", get(expand_caller))
}
