//! # Exchange Rates API Handlers

use axum::{
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, FINANCE_WRITERS};
use crate::error::ApiError;
use crate::models::exchange_rate::Model as ExchangeRateModel;
use crate::repositories::ExchangeRateRepository;
use crate::repositories::exchange_rate::{CreateExchangeRateRequest, ExchangeRateFilter};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListExchangeRatesQuery {
    /// ISO 4217 code, e.g. TRY
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/exchange-rates",
    security(("bearer_auth" = [])),
    params(ListExchangeRatesQuery),
    responses(
        (status = 200, description = "Rates, newest effective date first", body = PaginatedResponse<ExchangeRateModel>),
        (status = 400, description = "Invalid filters", body = ApiError)
    ),
    tag = "exchange-rates"
)]
pub async fn list_exchange_rates(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListExchangeRatesQuery>,
) -> Result<Json<PaginatedResponse<ExchangeRateModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = ExchangeRateFilter {
        from_currency: query.from_currency,
        to_currency: query.to_currency,
    };

    let (rates, total) = ExchangeRateRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(rates, total, page)))
}

/// Records a rate for a currency pair and effective date. Rates are append-only.
#[utoipa::path(
    post,
    path = "/api/v1/exchange-rates",
    security(("bearer_auth" = [])),
    request_body = CreateExchangeRateRequest,
    responses(
        (status = 201, description = "Exchange rate recorded", body = ExchangeRateModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 409, description = "Rate for this pair and date already exists", body = ApiError)
    ),
    tag = "exchange-rates"
)]
pub async fn create_exchange_rate(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateExchangeRateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExchangeRateModel>), ApiError> {
    auth.require_any(FINANCE_WRITERS)?;
    let Json(request) = payload?;

    let rate = ExchangeRateRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(rate)))
}
