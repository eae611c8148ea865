//! Test utilities for database and HTTP testing.
//!
//! Provides in-memory SQLite databases with migrations applied, fixture helpers and
//! a router wired with a known JWT secret.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, header},
    response::Response,
};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;
use tourcrm::{
    auth::Role,
    config::AppConfig,
    repositories::{
        ClientRepository, CreateTenantRequest, ExchangeRateRepository, TenantRepository,
        client::CreateClientRequest, exchange_rate::CreateExchangeRateRequest,
    },
    server::{AppState, create_app},
};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-tests-secret-0123456789abcdef";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool holds a single connection so every query sees the same database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Creates a tenant and returns its id.
pub async fn create_test_tenant(db: &DatabaseConnection, name: &str) -> Result<Uuid> {
    let tenant = TenantRepository::new(db)
        .create_tenant(CreateTenantRequest {
            name: name.to_string(),
        })
        .await?;
    Ok(tenant.id)
}

/// Creates a client, with an e-mail address when one is given.
pub async fn create_test_client(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    name: &str,
    email: Option<&str>,
) -> Result<Uuid> {
    let client = ClientRepository::new(db)
        .create(
            tenant_id,
            CreateClientRequest {
                name: name.to_string(),
                email: email.map(str::to_string),
                phone: None,
                nationality: None,
                notes: None,
            },
        )
        .await?;
    Ok(client.id)
}

/// Records a TRY → EUR rate effective `days_ago` days before today.
pub async fn create_try_eur_rate(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    rate: Decimal,
    days_ago: i64,
) -> Result<()> {
    ExchangeRateRepository::new(db)
        .create(
            tenant_id,
            CreateExchangeRateRequest {
                from_currency: "TRY".to_string(),
                to_currency: "EUR".to_string(),
                rate,
                effective_date: chrono::Utc::now().date_naive() - chrono::Duration::days(days_ago),
            },
        )
        .await?;
    Ok(())
}

/// Shared state with the default config (TRY → EUR rate lock) and the test secret.
pub fn test_state(db: DatabaseConnection) -> AppState {
    let config = AppConfig {
        jwt_secret: Some(TEST_JWT_SECRET.to_string()),
        ..AppConfig::default()
    };
    AppState::new(config, db).expect("test state")
}

pub fn test_app(db: DatabaseConnection) -> (Router, AppState) {
    let state = test_state(db);
    (create_app(state.clone()), state)
}

/// `Authorization` header value for a fresh user of `tenant_id`.
pub fn bearer(state: &AppState, tenant_id: Uuid, role: Role) -> String {
    let token = state
        .jwt
        .issue(Uuid::new_v4(), tenant_id, role, None)
        .expect("token issues");
    format!("Bearer {token}")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router responds")
}

pub async fn get(app: &Router, auth: &str, uri: &str) -> Response {
    send(
        app,
        Request::get(uri)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
            .expect("request builds"),
    )
    .await
}

pub async fn post_json(app: &Router, auth: &str, uri: &str, body: &Value) -> Response {
    send(
        app,
        Request::post(uri)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
    )
    .await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Creates, sends and accepts a two-line quotation for `client_id` and returns the
/// booking id. The tenant needs a TRY → EUR rate on or before today.
pub async fn create_confirmed_booking(app: &Router, auth: &str, client_id: Uuid) -> String {
    let quotation = post_json(
        app,
        auth,
        "/api/v1/quotations",
        &serde_json::json!({
            "client_id": client_id,
            "title": "Istanbul city break",
            "items": [
                {
                    "service_type": "HOTEL_ROOM",
                    "description": "2 nights",
                    "quantity": 2,
                    "unit_price": "150.00"
                },
                {
                    "service_type": "GUIDE",
                    "description": "Old city tour",
                    "quantity": 1,
                    "unit_price": "100.00"
                }
            ]
        }),
    )
    .await;
    let id = body_json(quotation).await["id"]
        .as_str()
        .expect("quotation id")
        .to_string();

    let empty = serde_json::json!({});
    post_json(app, auth, &format!("/api/v1/quotations/{id}/send"), &empty).await;
    let accepted = post_json(app, auth, &format!("/api/v1/quotations/{id}/accept"), &empty).await;
    body_json(accepted).await["booking"]["id"]
        .as_str()
        .expect("booking id")
        .to_string()
}
