//! # Payments API Handlers
//!
//! Client payments against bookings and payments made to vendors. Both create
//! endpoints honour the `Idempotency-Key` header.

use axum::{
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, FINANCE_WRITERS};
use crate::error::{ApiError, validation_error};
use crate::idempotency::{self, Begin};
use crate::models::payment_client::Model as ClientPaymentModel;
use crate::models::payment_vendor::Model as VendorPaymentModel;
use crate::repositories::PaymentRepository;
use crate::repositories::payment::{
    CreateClientPaymentRequest, CreateVendorPaymentRequest, PaymentFilter,
};
use crate::server::AppState;

const CLIENT_PAYMENTS_PATH: &str = "/api/v1/payments/client";
const VENDOR_PAYMENTS_PATH: &str = "/api/v1/payments/vendor";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListClientPaymentsQuery {
    pub booking_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVendorPaymentsQuery {
    pub vendor_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, ApiError> {
    serde_json::from_value(body.clone()).map_err(|err| {
        validation_error("Invalid payment body", json!({ "reason": err.to_string() }))
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/client",
    security(("bearer_auth" = [])),
    params(ListClientPaymentsQuery),
    responses(
        (status = 200, description = "Page of client payments", body = PaginatedResponse<ClientPaymentModel>),
        (status = 400, description = "Invalid filters", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn list_client_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListClientPaymentsQuery>,
) -> Result<Json<PaginatedResponse<ClientPaymentModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = PaymentFilter {
        booking_id: query.booking_id,
        vendor_id: None,
    };

    let (payments, total) = PaymentRepository::new(&state.db)
        .list_client_payments(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(payments, total, page)))
}

/// Records a payment received from a client. Retrying with the same
/// `Idempotency-Key` and body returns the first response.
#[utoipa::path(
    post,
    path = "/api/v1/payments/client",
    security(("bearer_auth" = [])),
    params(("Idempotency-Key" = Option<String>, Header, description = "Client-chosen retry key")),
    request_body = CreateClientPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ClientPaymentModel),
        (status = 400, description = "Validation failed or unknown booking", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 409, description = "Booking cancelled or idempotency key reused", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn create_client_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    auth.require_any(FINANCE_WRITERS)?;
    let Json(body) = payload?;

    let pending = match idempotency::begin(
        &state.db,
        auth.tenant_id,
        &headers,
        &Method::POST,
        CLIENT_PAYMENTS_PATH,
        &body,
    )
    .await?
    {
        Begin::Replay(response) => return Ok(response),
        Begin::Proceed(pending) => pending,
    };

    let request: CreateClientPaymentRequest = decode(&body)?;
    let payment = PaymentRepository::new(&state.db)
        .create_client_payment(auth.tenant_id, Some(auth.user_id), request, pending)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/vendor",
    security(("bearer_auth" = [])),
    params(ListVendorPaymentsQuery),
    responses(
        (status = 200, description = "Page of vendor payments", body = PaginatedResponse<VendorPaymentModel>),
        (status = 400, description = "Invalid filters", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn list_vendor_payments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListVendorPaymentsQuery>,
) -> Result<Json<PaginatedResponse<VendorPaymentModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = PaymentFilter {
        booking_id: query.booking_id,
        vendor_id: query.vendor_id,
    };

    let (payments, total) = PaymentRepository::new(&state.db)
        .list_vendor_payments(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(payments, total, page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/vendor",
    security(("bearer_auth" = [])),
    params(("Idempotency-Key" = Option<String>, Header, description = "Client-chosen retry key")),
    request_body = CreateVendorPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = VendorPaymentModel),
        (status = 400, description = "Validation failed or unknown vendor", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 409, description = "Idempotency key reused for a different request", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn create_vendor_payment(
    State(state): State<AppState>,
    auth: AuthContext,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    auth.require_any(FINANCE_WRITERS)?;
    let Json(body) = payload?;

    let pending = match idempotency::begin(
        &state.db,
        auth.tenant_id,
        &headers,
        &Method::POST,
        VENDOR_PAYMENTS_PATH,
        &body,
    )
    .await?
    {
        Begin::Replay(response) => return Ok(response),
        Begin::Proceed(pending) => pending,
    };

    let request: CreateVendorPaymentRequest = decode(&body)?;
    let payment = PaymentRepository::new(&state.db)
        .create_vendor_payment(auth.tenant_id, Some(auth.user_id), request, pending)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)).into_response())
}
