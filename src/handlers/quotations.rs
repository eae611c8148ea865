//! # Quotations API Handlers
//!
//! Quotation CRUD plus the DRAFT → SENT → ACCEPTED/REJECTED workflow. Accepting a
//! quotation creates its booking in the same transaction.

use axum::{
    body::Bytes,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, CRM_WRITERS};
use crate::error::{ApiError, validation_error};
use crate::models::quotation::{Model as QuotationModel, QuotationStatus};
use crate::quotation_workflow::{AcceptedQuotation, QuotationWorkflow};
use crate::repositories::QuotationRepository;
use crate::repositories::quotation::{
    CreateQuotationRequest, QuotationFilter, UpdateQuotationRequest,
};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuotationsQuery {
    pub status: Option<QuotationStatus>,
    pub client_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Body of the reject action. An empty body rejects without a reason.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectQuotationRequest {
    #[schema(example = "Found a cheaper offer")]
    pub reason: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/quotations",
    security(("bearer_auth" = [])),
    params(ListQuotationsQuery),
    responses(
        (status = 200, description = "Page of quotations, newest first", body = PaginatedResponse<QuotationModel>),
        (status = 400, description = "Invalid filters", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn list_quotations(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuotationsQuery>,
) -> Result<Json<PaginatedResponse<QuotationModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = QuotationFilter {
        status: query.status,
        client_id: query.client_id,
    };

    let (quotations, total) = QuotationRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(quotations, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quotations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Quotation", body = QuotationModel),
        (status = 404, description = "Quotation not found", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn get_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<QuotationModel>, ApiError> {
    let quotation = QuotationRepository::new(&state.db)
        .get(auth.tenant_id, id)
        .await?;
    Ok(Json(quotation))
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations",
    security(("bearer_auth" = [])),
    request_body = CreateQuotationRequest,
    responses(
        (status = 201, description = "Draft quotation created", body = QuotationModel),
        (status = 400, description = "Validation failed or unknown client", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn create_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateQuotationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<QuotationModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let quotation = QuotationRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

/// Edits a quotation. Only drafts can be edited.
#[utoipa::path(
    patch,
    path = "/api/v1/quotations/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Quotation id")),
    request_body = UpdateQuotationRequest,
    responses(
        (status = 200, description = "Quotation updated", body = QuotationModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Quotation not found", body = ApiError),
        (status = 409, description = "Quotation is no longer a draft", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn update_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateQuotationRequest>, JsonRejection>,
) -> Result<Json<QuotationModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let quotation = QuotationRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(quotation))
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/send",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Quotation sent", body = QuotationModel),
        (status = 400, description = "Quotation has no client e-mail", body = ApiError),
        (status = 404, description = "Quotation not found", body = ApiError),
        (status = 409, description = "Quotation is not a draft", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn send_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<QuotationModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    let quotation = QuotationWorkflow::new(&state.db, &state.config.rate_lock)
        .send(auth.tenant_id, id, Some(auth.user_id))
        .await?;
    Ok(Json(quotation))
}

#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/reject",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Quotation id")),
    request_body(content = RejectQuotationRequest, description = "Optional rejection reason"),
    responses(
        (status = 200, description = "Quotation rejected", body = QuotationModel),
        (status = 404, description = "Quotation not found", body = ApiError),
        (status = 409, description = "Quotation is not awaiting a decision", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn reject_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<QuotationModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let request: RejectQuotationRequest = if body.is_empty() {
        RejectQuotationRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            validation_error("Invalid reject body", json!({ "reason": err.to_string() }))
        })?
    };

    let quotation = QuotationWorkflow::new(&state.db, &state.config.rate_lock)
        .reject(auth.tenant_id, id, Some(auth.user_id), request.reason)
        .await?;
    Ok(Json(quotation))
}

/// Accepts a sent quotation. The booking copies its items and locks today's
/// exchange rate for the configured currency pair.
#[utoipa::path(
    post,
    path = "/api/v1/quotations/{id}/accept",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Quotation id")),
    responses(
        (status = 200, description = "Quotation accepted and booking created", body = AcceptedQuotation),
        (status = 400, description = "No exchange rate to lock or client missing", body = ApiError),
        (status = 404, description = "Quotation not found", body = ApiError),
        (status = 409, description = "Quotation is not awaiting a decision", body = ApiError)
    ),
    tag = "quotations"
)]
pub async fn accept_quotation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<AcceptedQuotation>, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    let accepted = QuotationWorkflow::new(&state.db, &state.config.rate_lock)
        .accept(auth.tenant_id, id, Some(auth.user_id), Utc::now().date_naive())
        .await?;
    Ok(Json(accepted))
}
