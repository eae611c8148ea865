//! # Tests for Handlers

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{JwtManager, Role};
use crate::config::AppConfig;
use crate::handlers::{healthz, root};
use crate::server::{AppState, create_app};
use crate::telemetry::TRACE_ID_HEADER;

const SECRET: &str = "handler-tests-secret-0123456789abcdef";

fn state_with(db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        db,
        jwt: Arc::new(JwtManager::new(SECRET, 3600)),
    }
}

async fn app_with_tenant() -> (Router, AppState, Uuid) {
    let db = crate::db::testing::migrated_sqlite().await;
    let tenant_id = crate::db::testing::insert_tenant(&db, "Cappadocia Tours").await;
    let state = state_with(db);
    (create_app(state.clone()), state, tenant_id)
}

fn bearer(state: &AppState, tenant_id: Uuid, role: Role) -> String {
    let token = state
        .jwt
        .issue(Uuid::new_v4(), tenant_id, role, None)
        .unwrap();
    format!("Bearer {token}")
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "tourcrm");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_reports_unavailable_database() {
    let state = state_with(DatabaseConnection::default());

    let response = healthz(State(state)).await.into_response();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_healthz_ok_on_migrated_database() {
    let (app, _, _) = app_with_tenant().await;

    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let (app, _, _) = app_with_tenant().await;

    let response = app
        .oneshot(Request::get("/api/v1/clients").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (app, _, tenant_id) = app_with_tenant().await;
    let foreign = JwtManager::new("some-other-secret-0123456789abcdef", 3600)
        .issue(Uuid::new_v4(), tenant_id, Role::Admin, None)
        .unwrap();

    let response = app
        .oneshot(
            Request::get("/api/v1/clients")
                .header(header::AUTHORIZATION, format!("Bearer {foreign}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_viewer_cannot_create_client() {
    let (app, state, tenant_id) = app_with_tenant().await;

    let response = app
        .oneshot(
            Request::post("/api/v1/clients")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Viewer))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "name": "Ayse Demir" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_agent_creates_and_lists_clients() {
    let (app, state, tenant_id) = app_with_tenant().await;
    let auth = bearer(&state, tenant_id, Role::Agent);

    let created = app
        .clone()
        .oneshot(
            Request::post("/api/v1/clients")
                .header(header::AUTHORIZATION, &auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": "Ayse Demir", "email": "Ayse@Example.com" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let client = body_json(created).await;
    assert_eq!(client["email"], "ayse@example.com");

    let listed = app
        .oneshot(
            Request::get("/api/v1/clients?limit=10")
                .header(header::AUTHORIZATION, &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let page = body_json(listed).await;
    assert_eq!(page["pagination"]["total"], 1);
    assert_eq!(page["pagination"]["limit"], 10);
    assert_eq!(page["pagination"]["has_more"], false);
    assert_eq!(page["data"][0]["id"], client["id"]);
}

#[tokio::test]
async fn test_limit_out_of_range_is_rejected() {
    let (app, state, tenant_id) = app_with_tenant().await;

    let response = app
        .oneshot(
            Request::get("/api/v1/leads?limit=500")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_unknown_rate_kind_is_bad_request() {
    let (app, state, tenant_id) = app_with_tenant().await;

    let response = app
        .oneshot(
            Request::get("/api/v1/rates/cruise")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Viewer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_audit_timeline_is_admin_only() {
    let (app, state, tenant_id) = app_with_tenant().await;

    let as_agent = app
        .clone()
        .oneshot(
            Request::get("/api/v1/audit-logs/timeline")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Agent))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(as_agent.status(), StatusCode::FORBIDDEN);

    let as_admin = app
        .oneshot(
            Request::get("/api/v1/audit-logs/timeline")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(as_admin.status(), StatusCode::OK);
    assert_eq!(body_json(as_admin).await["data"], json!([]));
}

#[tokio::test]
async fn test_current_tenant() {
    let (app, state, tenant_id) = app_with_tenant().await;

    let response = app
        .oneshot(
            Request::get("/api/v1/tenants/current")
                .header(header::AUTHORIZATION, bearer(&state, tenant_id, Role::Finance))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], tenant_id.to_string());
    assert_eq!(body["name"], "Cappadocia Tours");
}

#[tokio::test]
async fn test_openapi_security_scheme() {
    let (app, _, _) = app_with_tenant().await;

    let response = app
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let openapi = body_json(response).await;
    let bearer_auth = &openapi["components"]["securitySchemes"]["bearer_auth"];
    assert_eq!(bearer_auth["type"], "http");
    assert_eq!(bearer_auth["scheme"], "bearer");
    assert!(openapi["paths"]["/api/v1/quotations/{id}/accept"]["post"].is_object());
}
