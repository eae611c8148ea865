//! # Seasonal Rates API Handlers
//!
//! One set of routes serves all five rate tables; the `{kind}` path segment
//! (`hotel-room`, `transfer`, `vehicle`, `guide`, `activity`) selects the table and
//! the body shape.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, CRM_WRITERS};
use crate::error::{ApiError, validation_error};
use crate::rates::{RateFilter, RateKind};
use crate::repositories::RateRepository;
use crate::repositories::rate::{RateRecord, RateRequest};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRatesQuery {
    pub service_offering_id: Option<Uuid>,
    pub include_inactive: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn parse_kind(kind: &str) -> Result<RateKind, ApiError> {
    kind.parse().map_err(|message: String| {
        validation_error(
            &message,
            json!({
                "field": "kind",
                "allowed": RateKind::ALL.iter().map(RateKind::as_str).collect::<Vec<_>>(),
            }),
        )
    })
}

fn rate_body(
    kind: RateKind,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<RateRequest, ApiError> {
    let Json(body) = payload?;
    Ok(RateRequest::from_json(kind, body)?)
}

#[utoipa::path(
    get,
    path = "/api/v1/rates/{kind}",
    security(("bearer_auth" = [])),
    params(("kind" = RateKind, Path, description = "Rate table"), ListRatesQuery),
    responses(
        (status = 200, description = "Page of rates ordered by offering and season start", body = PaginatedResponse<RateRecord>),
        (status = 400, description = "Unknown rate kind or invalid filters", body = ApiError)
    ),
    tag = "rates"
)]
pub async fn list_rates(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kind): Path<String>,
    Query(query): Query<ListRatesQuery>,
) -> Result<Json<PaginatedResponse<RateRecord>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let page = page_from(query.limit, query.offset)?;
    let filter = RateFilter {
        service_offering_id: query.service_offering_id,
        include_inactive: query.include_inactive.unwrap_or(false),
        limit: page.limit,
        offset: page.offset,
    };

    let (rates, total) = RateRepository::new(&state.db)
        .list(auth.tenant_id, kind, &filter)
        .await?;
    Ok(Json(PaginatedResponse::new(rates, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rates/{kind}/{id}",
    security(("bearer_auth" = [])),
    params(
        ("kind" = RateKind, Path, description = "Rate table"),
        ("id" = Uuid, Path, description = "Rate id")
    ),
    responses(
        (status = 200, description = "Rate", body = RateRecord),
        (status = 400, description = "Unknown rate kind", body = ApiError),
        (status = 404, description = "Rate not found", body = ApiError)
    ),
    tag = "rates"
)]
pub async fn get_rate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<RateRecord>, ApiError> {
    let kind = parse_kind(&kind)?;
    let rate = RateRepository::new(&state.db)
        .get(auth.tenant_id, kind, id)
        .await?;
    Ok(Json(rate))
}

/// Creates a rate. A season overlapping an active rate with the same offering (and
/// board type for hotel rooms) is rejected with 409.
#[utoipa::path(
    post,
    path = "/api/v1/rates/{kind}",
    security(("bearer_auth" = [])),
    params(("kind" = RateKind, Path, description = "Rate table")),
    request_body = RateRequest,
    responses(
        (status = 201, description = "Rate created", body = RateRecord),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 409, description = "Season overlaps an active rate", body = ApiError)
    ),
    tag = "rates"
)]
pub async fn create_rate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(kind): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RateRecord>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let kind = parse_kind(&kind)?;
    let request = rate_body(kind, payload)?;

    let rate = RateRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

#[utoipa::path(
    put,
    path = "/api/v1/rates/{kind}/{id}",
    security(("bearer_auth" = [])),
    params(
        ("kind" = RateKind, Path, description = "Rate table"),
        ("id" = Uuid, Path, description = "Rate id")
    ),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rate replaced", body = RateRecord),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Rate not found", body = ApiError),
        (status = 409, description = "Season overlaps an active rate", body = ApiError)
    ),
    tag = "rates"
)]
pub async fn update_rate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kind, id)): Path<(String, Uuid)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RateRecord>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let kind = parse_kind(&kind)?;
    let request = rate_body(kind, payload)?;

    let rate = RateRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(rate))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rates/{kind}/{id}",
    security(("bearer_auth" = [])),
    params(
        ("kind" = RateKind, Path, description = "Rate table"),
        ("id" = Uuid, Path, description = "Rate id")
    ),
    responses(
        (status = 204, description = "Rate deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Rate not found", body = ApiError)
    ),
    tag = "rates"
)]
pub async fn deactivate_rate(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let kind = parse_kind(&kind)?;

    RateRepository::new(&state.db)
        .deactivate(auth.tenant_id, kind, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
