use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use snds_core::needs::Need;
use snds_core::plans::{NewPlan, Plan, PlanFilter, PlanUpdate};

use super::capabilities::{MANAGE_PLANS, VIEW_NEEDS, VIEW_PLANS};
use crate::{
    error::ApiResult,
    extract::{Caller, Tenant},
    main_lib::AppState,
};

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Query(filter): Query<PlanFilter>,
) -> ApiResult<Json<Vec<Plan>>> {
    caller.require(VIEW_PLANS)?;
    let plans = state.plan_service.list_plans(&partition, &filter)?;
    Ok(Json(plans))
}

async fn get_plan(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Plan>> {
    caller.require(VIEW_PLANS)?;
    Ok(Json(state.plan_service.get_plan(&partition, &id)?))
}

async fn get_plan_needs(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<Need>>> {
    caller.require(VIEW_NEEDS)?;
    Ok(Json(state.plan_service.get_plan_needs(&partition, &id)?))
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(plan): Json<NewPlan>,
) -> ApiResult<Json<Plan>> {
    caller.require(MANAGE_PLANS)?;
    let created = state.plan_service.create_plan(&partition, plan).await?;
    Ok(Json(created))
}

async fn update_plan(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(update): Json<PlanUpdate>,
) -> ApiResult<Json<Plan>> {
    caller.require(MANAGE_PLANS)?;
    let updated = state.plan_service.update_plan(&partition, &id, update).await?;
    Ok(Json(updated))
}

async fn delete_plan(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE_PLANS)?;
    state.plan_service.delete_plan(&partition, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recompute_plan(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Plan>> {
    caller.require(MANAGE_PLANS)?;
    Ok(Json(state.plan_service.recompute_plan(&partition, &id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/{id}",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
        .route("/plans/{id}/needs", get(get_plan_needs))
        .route("/plans/{id}/recompute", post(recompute_plan))
}
