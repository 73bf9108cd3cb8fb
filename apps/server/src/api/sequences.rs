use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use snds_core::{permissions::CallerIdentity, Error};

use super::capabilities::{MANAGE_NEEDS, MANAGE_PLANS};
use crate::{
    error::ApiResult,
    extract::{Caller, Tenant},
    main_lib::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SequenceValue {
    name: String,
    value: Option<i64>,
}

fn require_sequence_access(caller: &CallerIdentity) -> Result<(), Error> {
    if caller.can(MANAGE_PLANS) || caller.can(MANAGE_NEEDS) {
        Ok(())
    } else {
        Err(Error::AccessDenied(
            "Sequences require 'manage_plans' or 'manage_needs'".to_string(),
        ))
    }
}

async fn current_value(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<SequenceValue>> {
    require_sequence_access(&caller)?;
    let value = state.sequence_service.current(&partition, &name)?;
    Ok(Json(SequenceValue { name, value }))
}

async fn next_value(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
    Tenant(partition): Tenant,
    Caller(caller): Caller,
) -> ApiResult<Json<SequenceValue>> {
    require_sequence_access(&caller)?;
    let value = state.sequence_service.next(&partition, &name).await?;
    Ok(Json(SequenceValue {
        name,
        value: Some(value),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sequences/{name}", get(current_value))
        .route("/sequences/{name}/next", post(next_value))
}
