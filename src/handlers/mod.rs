//! # API Handlers
//!
//! HTTP endpoint handlers for the Tour CRM API. Everything under `/api/v1` runs
//! behind the bearer-token middleware and receives the caller as an
//! [`AuthContext`](crate::auth::AuthContext).

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod audit_logs;
pub mod bookings;
pub mod clients;
pub mod exchange_rates;
pub mod leads;
pub mod manual_quotes;
pub mod payments;
pub mod quotations;
pub mod rates;
pub mod service_offerings;
pub mod tenants;
pub mod types;
pub mod vendors;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health probe body
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: &'static str,
}

/// Liveness and database readiness probe
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthStatus),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn healthz(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|err| {
        tracing::warn!(error = ?err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unavailable",
        )
    })?;
    Ok(Json(HealthStatus { status: "ok" }))
}

#[cfg(test)]
mod tests;
