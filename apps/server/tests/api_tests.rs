use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use snds_core::propagation::FixedClock;
use snds_server::{api::app_router, build_state_with_clock, config::Config};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const ADMIN: &str = "manage_tenants,manage_plans,manage_needs,manage_contributions,manage_reports";

async fn test_app(today: NaiveDate) -> (TempDir, Router) {
    let tmp = tempdir().unwrap();
    let config = Config::for_data_dir(tmp.path());
    let state = build_state_with_clock(&config, Arc::new(FixedClock(today)))
        .await
        .unwrap();
    (tmp, app_router(state, &config))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    tenant: Option<&str>,
    permissions: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-caller-permissions", permissions);
    if let Some(code) = tenant {
        builder = builder.header("x-tenant-code", code);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register_tenant(app: &Router, code: &str) {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/tenants",
        None,
        "manage_tenants",
        Some(json!({"code": code, "name": format!("Region {}", code)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_plan(app: &Router, tenant: &str, year: &str) -> Value {
    let (status, plan) = call(
        app,
        Method::POST,
        "/api/v1/plans",
        Some(tenant),
        ADMIN,
        Some(json!({"schoolId": "school-1", "schoolYear": year, "title": "Reading"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", plan);
    plan
}

async fn create_need(app: &Router, tenant: &str, plan_id: &str, target: f64) -> Value {
    let (status, need) = call(
        app,
        Method::POST,
        "/api/v1/needs",
        Some(tenant),
        ADMIN,
        Some(json!({"planIds": [plan_id], "title": "Books", "targetQuantity": target})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", need);
    need
}

async fn contribute(app: &Router, tenant: &str, need_id: &str, quantity: f64) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/contributions",
        Some(tenant),
        ADMIN,
        Some(json!({"needId": need_id, "partnerId": "partner-1", "amount": 1500.5, "quantity": quantity})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn healthz_works() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    let response = app
        .oneshot(Request::builder().uri("/api/v1/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn openapi_documents_tenant_routes() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    let (status, doc) = call(&app, Method::GET, "/openapi.json", None, "", None).await;
    assert_eq!(status, StatusCode::OK);

    let by_code = &doc["paths"]["/api/v1/tenants/{code}"];
    assert!(by_code["get"].is_object());
    assert!(by_code["put"].is_object());
    assert_eq!(by_code["get"]["parameters"][0]["name"], "code");
    assert_eq!(by_code["get"]["parameters"][0]["description"], "Tenant code");
    assert!(doc["paths"]["/api/v1/tenants"]["get"].is_object());
}

#[tokio::test]
async fn tenant_header_is_required() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    let (status, body) = call(&app, Method::GET, "/api/v1/plans", None, ADMIN, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn unknown_tenant_is_rejected_without_touching_storage() {
    let (tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    let (status, _) = call(&app, Method::GET, "/api/v1/plans", Some("nowhere"), ADMIN, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(!tmp.path().join("snds_nowhere.db").exists());
}

#[tokio::test]
async fn inactive_tenant_is_not_found() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    register_tenant(&app, "car").await;
    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/v1/tenants/car",
        None,
        "manage_tenants",
        Some(json!({"name": "Cordillera", "isActive": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, "/api/v1/plans", Some("car"), ADMIN, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, active) = call(&app, Method::GET, "/api/v1/tenants?active=true", None, "", None).await;
    assert_eq!(active, json!([]));
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    register_tenant(&app, "ncr").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/plans",
        Some("ncr"),
        "view_plans",
        Some(json!({"schoolId": "school-1", "schoolYear": "2024-2025", "title": "Reading"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // manage_needs implies view_plans.
    let (status, plans) = call(&app, Method::GET, "/api/v1/plans", Some("ncr"), "manage_needs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans, json!([]));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/tenants",
        None,
        "manage_plans",
        Some(json!({"code": "x", "name": "X"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn contributions_drive_need_and_plan_status() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    register_tenant(&app, "ncr").await;

    let plan = create_plan(&app, "ncr", "2024-2025").await;
    let plan_id = plan["id"].as_str().unwrap().to_string();
    assert_eq!(plan["status"], "Created");
    assert_eq!(plan["sequenceNumber"], 1);

    let need = create_need(&app, "ncr", &plan_id, 100.0).await;
    let need_id = need["id"].as_str().unwrap().to_string();
    assert_eq!(need["code"], "NEED-000001");
    assert_eq!(need["implementationStatus"], "LookingForPartner");

    contribute(&app, "ncr", &need_id, 40.0).await;
    let (_, need) = call(&app, Method::GET, &format!("/api/v1/needs/{}", need_id), Some("ncr"), ADMIN, None).await;
    assert_eq!(need["implementationStatus"], "40% Complete");
    let (_, plan) = call(&app, Method::GET, &format!("/api/v1/plans/{}", plan_id), Some("ncr"), ADMIN, None).await;
    assert_eq!(plan["status"], "Ongoing");

    contribute(&app, "ncr", &need_id, 60.0).await;
    let (_, summary) = call(
        &app,
        Method::GET,
        &format!("/api/v1/needs/{}/summary", need_id),
        Some("ncr"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(summary["implementationStatus"], "Completed");
    assert_eq!(summary["fulfilledQuantity"], 100.0);
    assert_eq!(summary["contributionCount"], 2);

    let (_, plan) = call(&app, Method::GET, &format!("/api/v1/plans/{}", plan_id), Some("ncr"), ADMIN, None).await;
    assert_eq!(plan["status"], "Completed");

    let (_, contributions) = call(
        &app,
        Method::GET,
        &format!("/api/v1/needs/{}/contributions", need_id),
        Some("ncr"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(contributions.as_array().unwrap().len(), 2);
    assert_eq!(contributions[0]["schoolYear"], "2024-2025");
}

#[tokio::test]
async fn past_school_year_is_unimplemented() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).await;
    register_tenant(&app, "ncr").await;

    let plan = create_plan(&app, "ncr", "2020-2021").await;
    let plan_id = plan["id"].as_str().unwrap();
    let need = create_need(&app, "ncr", plan_id, 10.0).await;
    contribute(&app, "ncr", need["id"].as_str().unwrap(), 3.0).await;

    let (_, plan) = call(&app, Method::GET, &format!("/api/v1/plans/{}", plan_id), Some("ncr"), ADMIN, None).await;
    assert_eq!(plan["status"], "Unimplemented");
}

#[tokio::test]
async fn tenants_have_separate_data() {
    let (tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    register_tenant(&app, "ncr").await;
    register_tenant(&app, "car").await;

    let plan = create_plan(&app, "ncr", "2024-2025").await;
    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/v1/plans/{}", plan["id"].as_str().unwrap()),
        Some("car"),
        ADMIN,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let other = create_plan(&app, "car", "2024-2025").await;
    assert_eq!(other["sequenceNumber"], 1);
    assert!(tmp.path().join("snds_ncr.db").exists());
    assert!(tmp.path().join("snds_car.db").exists());
}

#[tokio::test]
async fn report_runs_with_parameters_and_restrictions() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    register_tenant(&app, "ncr").await;
    let plan = create_plan(&app, "ncr", "2024-2025").await;
    create_need(&app, "ncr", plan["id"].as_str().unwrap(), 5.0).await;
    create_need(&app, "ncr", plan["id"].as_str().unwrap(), 8.0).await;

    let (status, query) = call(
        &app,
        Method::POST,
        "/api/v1/report-queries",
        Some("ncr"),
        ADMIN,
        Some(json!({
            "name": "Needs of a year",
            "collection": "needs",
            "params": [{"name": "year", "type": "string", "required": true}],
            "steps": [{"op": "count", "filter": {"schoolYear": "{{year}}"}}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", query);

    let (status, report) = call(
        &app,
        Method::POST,
        "/api/v1/reports",
        Some("ncr"),
        ADMIN,
        Some(json!({
            "name": "Need count",
            "template": "need-count",
            "queryId": query["id"],
            "allowedPermissions": ["view_needs"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    let run_uri = format!("/api/v1/reports/{}/run", report["id"].as_str().unwrap());

    let (status, output) = call(
        &app,
        Method::POST,
        &run_uri,
        Some("ncr"),
        "view_needs",
        Some(json!({"year": "2024-2025"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", output);
    assert_eq!(output["template"], "need-count");
    assert_eq!(output["data"], 2);

    let (status, _) = call(
        &app,
        Method::POST,
        &run_uri,
        Some("ncr"),
        "view_plans",
        Some(json!({"year": "2024-2025"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::POST, &run_uri, Some("ncr"), "view_needs", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expands_caller_permissions() {
    let (_tmp, app) = test_app(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).await;
    let (status, body) = call(&app, Method::GET, "/api/v1/permissions/expand", None, "manage_contributions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], json!(["manage_contributions"]));
    assert_eq!(
        body["effective"],
        json!([
            "manage_contributions",
            "view_contributions",
            "view_needs",
            "view_partners"
        ])
    );
}

#[tokio::test]
async fn seed_file_registers_tenants_at_boot() {
    let tmp = tempdir().unwrap();
    let seed = tmp.path().join("tenants.json");
    std::fs::write(
        &seed,
        json!([{"code": "ncr", "name": "National Capital Region"}]).to_string(),
    )
    .unwrap();
    let mut config = Config::for_data_dir(tmp.path());
    config.tenant_seed_file = Some(seed);
    let state = build_state_with_clock(
        &config,
        Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap())),
    )
    .await
    .unwrap();
    let app = app_router(state, &config);

    let (status, tenant) = call(&app, Method::GET, "/api/v1/tenants/ncr", None, "", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tenant["isActive"], true);
}
