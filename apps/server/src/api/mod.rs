use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    config::Config,
    main_lib::AppState,
    models::{NewTenant, Tenant, TenantUpdate},
};

mod contributions;
mod needs;
mod permissions;
mod plans;
mod reports;
mod sequences;
mod tenants;

/// Capabilities checked by the handlers.
pub(crate) mod capabilities {
    pub const MANAGE_TENANTS: &str = "manage_tenants";
    pub const VIEW_PLANS: &str = "view_plans";
    pub const MANAGE_PLANS: &str = "manage_plans";
    pub const VIEW_NEEDS: &str = "view_needs";
    pub const MANAGE_NEEDS: &str = "manage_needs";
    pub const VIEW_CONTRIBUTIONS: &str = "view_contributions";
    pub const MANAGE_CONTRIBUTIONS: &str = "manage_contributions";
    pub const VIEW_REPORTS: &str = "view_reports";
    pub const MANAGE_REPORTS: &str = "manage_reports";
}

#[utoipa::path(get, path = "/api/v1/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

#[utoipa::path(get, path = "/api/v1/readyz", responses((status = 200, description = "Ready")))]
pub async fn readyz() -> &'static str {
    "ok"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        readyz,
        tenants::list_tenants,
        tenants::create_tenant,
        tenants::get_tenant,
        tenants::update_tenant
    ),
    components(schemas(Tenant, NewTenant, TenantUpdate)),
    tags((name = "snds"))
)]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<HeaderValue>>();
        CorsLayer::new().allow_origin(origins)
    };

    let openapi = ApiDoc::openapi();

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(tenants::router())
        .merge(plans::router())
        .merge(needs::router())
        .merge(contributions::router())
        .merge(reports::router())
        .merge(sequences::router())
        .merge(permissions::router());

    Router::new()
        .nest("/api/v1", api)
        .route("/openapi.json", get(|| async { Json(openapi) }))
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}
