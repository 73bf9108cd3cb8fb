use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};
use snds_core::reports::{
    NewReportDefinition, NewReportQuery, ReportDefinition, ReportOutput, ReportQuery,
};

use super::capabilities::{MANAGE_REPORTS, VIEW_REPORTS};
use crate::{
    error::{ApiError, ApiResult},
    extract::{Caller, Tenant},
    main_lib::AppState,
};

/// Reports the caller may run; restricted definitions are filtered out.
async fn list_reports(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<ReportDefinition>>> {
    caller.require(VIEW_REPORTS)?;
    Ok(Json(state.report_service.list_reports(&partition, &caller)?))
}

async fn get_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<ReportDefinition>> {
    caller.require(VIEW_REPORTS)?;
    Ok(Json(state.report_service.get_report(&partition, &id)?))
}

async fn create_report(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(definition): Json<NewReportDefinition>,
) -> ApiResult<Json<ReportDefinition>> {
    caller.require(MANAGE_REPORTS)?;
    let created = state
        .report_service
        .create_report(&partition, definition)
        .await?;
    Ok(Json(created))
}

async fn delete_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE_REPORTS)?;
    state.report_service.delete_report(&partition, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a report with parameters taken from the JSON body, a plain object.
async fn run_report(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    body: Bytes,
) -> ApiResult<Json<ReportOutput>> {
    let params: Map<String, Value> = if body.is_empty() {
        Map::new()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid report parameters: {}", e)))?
    };
    let output = state.report_service.run(&partition, &id, &params, &caller)?;
    Ok(Json(output))
}

/// Same as `run_report` with query string parameters, all passed as strings.
async fn run_report_get(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ReportOutput>> {
    let params: Map<String, Value> = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let output = state.report_service.run(&partition, &id, &params, &caller)?;
    Ok(Json(output))
}

async fn list_queries(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<ReportQuery>>> {
    caller.require(MANAGE_REPORTS)?;
    Ok(Json(state.report_service.list_queries(&partition)?))
}

async fn get_query(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<ReportQuery>> {
    caller.require(MANAGE_REPORTS)?;
    Ok(Json(state.report_service.get_query(&partition, &id)?))
}

async fn create_query(
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
    Json(query): Json<NewReportQuery>,
) -> ApiResult<Json<ReportQuery>> {
    caller.require(MANAGE_REPORTS)?;
    Ok(Json(
        state.report_service.create_query(&partition, query).await?,
    ))
}

async fn delete_query(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE_REPORTS)?;
    state.report_service.delete_query(&partition, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/{id}", get(get_report).delete(delete_report))
        .route("/reports/{id}/run", get(run_report_get).post(run_report))
        .route("/report-queries", get(list_queries).post(create_query))
        .route("/report-queries/{id}", get(get_query).delete(delete_query))
}
