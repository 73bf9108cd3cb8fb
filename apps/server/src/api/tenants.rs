use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::capabilities::MANAGE_TENANTS;
use crate::{
    error::ApiResult,
    extract::Caller,
    main_lib::AppState,
    models::{NewTenant, Tenant, TenantUpdate},
};

#[derive(Deserialize)]
pub struct TenantListQuery {
    pub active: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    params(("active" = Option<bool>, Query, description = "Filter on the active flag")),
    responses((status = 200, body = [Tenant]))
)]
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TenantListQuery>,
) -> ApiResult<Json<Vec<Tenant>>> {
    let tenants = state.tenant_service.list_tenants(query.active)?;
    Ok(Json(tenants.into_iter().map(Tenant::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = NewTenant,
    responses((status = 200, body = Tenant), (status = 403))
)]
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(tenant): Json<NewTenant>,
) -> ApiResult<Json<Tenant>> {
    caller.require(MANAGE_TENANTS)?;
    let created = state.tenant_service.create_tenant(tenant.into()).await?;
    Ok(Json(created.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants/{code}",
    params(("code" = String, Path, description = "Tenant code")),
    responses((status = 200, body = Tenant), (status = 404))
)]
pub async fn get_tenant(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Tenant>> {
    let tenant = state.tenant_service.get_tenant(&code)?;
    Ok(Json(tenant.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenants/{code}",
    params(("code" = String, Path, description = "Tenant code")),
    request_body = TenantUpdate,
    responses((status = 200, body = Tenant), (status = 403), (status = 404))
)]
pub async fn update_tenant(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(update): Json<TenantUpdate>,
) -> ApiResult<Json<Tenant>> {
    caller.require(MANAGE_TENANTS)?;
    let updated = state
        .tenant_service
        .update_tenant(&code, update.into())
        .await?;
    Ok(Json(updated.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route("/tenants/{code}", get(get_tenant).put(update_tenant))
}
