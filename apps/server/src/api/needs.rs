use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use snds_core::contributions::{Contribution, ContributionFilter};
use snds_core::needs::{Need, NeedFilter, NeedSummary, NeedUpdate, NewNeed};

use super::capabilities::{MANAGE_NEEDS, VIEW_CONTRIBUTIONS, VIEW_NEEDS};
use crate::{
    error::ApiResult,
    extract::{Caller, Tenant},
    main_lib::AppState,
};

async fn list_needs(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Query(filter): Query<NeedFilter>,
) -> ApiResult<Json<Vec<Need>>> {
    caller.require(VIEW_NEEDS)?;
    Ok(Json(state.need_service.list_needs(&partition, &filter)?))
}

async fn get_need(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Need>> {
    caller.require(VIEW_NEEDS)?;
    Ok(Json(state.need_service.get_need(&partition, &id)?))
}

async fn get_need_summary(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<NeedSummary>> {
    caller.require(VIEW_NEEDS)?;
    Ok(Json(state.need_service.get_need_summary(&partition, &id)?))
}

async fn get_need_contributions(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<Contribution>>> {
    caller.require(VIEW_CONTRIBUTIONS)?;
    // 404 for an unknown need rather than an empty list.
    state.need_service.get_need(&partition, &id)?;
    let filter = ContributionFilter {
        need_id: Some(id),
        ..Default::default()
    };
    Ok(Json(
        state
            .contribution_service
            .list_contributions(&partition, &filter)?,
    ))
}

async fn create_need(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(need): Json<NewNeed>,
) -> ApiResult<Json<Need>> {
    caller.require(MANAGE_NEEDS)?;
    Ok(Json(state.need_service.create_need(&partition, need).await?))
}

async fn update_need(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(update): Json<NeedUpdate>,
) -> ApiResult<Json<Need>> {
    caller.require(MANAGE_NEEDS)?;
    let updated = state.need_service.update_need(&partition, &id, update).await?;
    Ok(Json(updated))
}

async fn delete_need(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE_NEEDS)?;
    state.need_service.delete_need(&partition, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recompute_need(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Need>> {
    caller.require(MANAGE_NEEDS)?;
    Ok(Json(state.need_service.recompute_need(&partition, &id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/needs", get(list_needs).post(create_need))
        .route(
            "/needs/{id}",
            get(get_need).put(update_need).delete(delete_need),
        )
        .route("/needs/{id}/summary", get(get_need_summary))
        .route("/needs/{id}/contributions", get(get_need_contributions))
        .route("/needs/{id}/recompute", post(recompute_need))
}
