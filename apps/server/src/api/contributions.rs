use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use snds_core::contributions::{
    Contribution, ContributionFilter, ContributionUpdate, NewContribution,
};

use super::capabilities::{MANAGE_CONTRIBUTIONS, VIEW_CONTRIBUTIONS};
use crate::{
    error::ApiResult,
    extract::{Caller, Tenant},
    main_lib::AppState,
};

async fn list_contributions(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Query(filter): Query<ContributionFilter>,
) -> ApiResult<Json<Vec<Contribution>>> {
    caller.require(VIEW_CONTRIBUTIONS)?;
    let contributions = state
        .contribution_service
        .list_contributions(&partition, &filter)?;
    Ok(Json(contributions))
}

async fn get_contribution(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Contribution>> {
    caller.require(VIEW_CONTRIBUTIONS)?;
    Ok(Json(
        state.contribution_service.get_contribution(&partition, &id)?,
    ))
}

async fn create_contribution(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(contribution): Json<NewContribution>,
) -> ApiResult<Json<Contribution>> {
    caller.require(MANAGE_CONTRIBUTIONS)?;
    let created = state
        .contribution_service
        .create_contribution(&partition, contribution)
        .await?;
    Ok(Json(created))
}

async fn update_contribution(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(update): Json<ContributionUpdate>,
) -> ApiResult<Json<Contribution>> {
    caller.require(MANAGE_CONTRIBUTIONS)?;
    let updated = state
        .contribution_service
        .update_contribution(&partition, &id, update)
        .await?;
    Ok(Json(updated))
}

async fn delete_contribution(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE_CONTRIBUTIONS)?;
    state
        .contribution_service
        .delete_contribution(&partition, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/contributions",
            get(list_contributions).post(create_contribution),
        )
        .route(
            "/contributions/{id}",
            get(get_contribution)
                .put(update_contribution)
                .delete(delete_contribution),
        )
}
