//! # Leads API Handlers

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, CRM_WRITERS};
use crate::error::ApiError;
use crate::models::lead::{LeadStatus, Model as LeadModel};
use crate::repositories::LeadRepository;
use crate::repositories::lead::{CreateLeadRequest, LeadFilter, UpdateLeadRequest};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLeadsQuery {
    /// Only leads in this pipeline status
    pub status: Option<LeadStatus>,
    pub include_inactive: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/leads",
    security(("bearer_auth" = [])),
    params(ListLeadsQuery),
    responses(
        (status = 200, description = "Page of leads", body = PaginatedResponse<LeadModel>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn list_leads(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<PaginatedResponse<LeadModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = LeadFilter {
        status: query.status,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let (leads, total) = LeadRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(leads, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead", body = LeadModel),
        (status = 404, description = "Lead not found", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn get_lead(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<LeadModel>, ApiError> {
    let lead = LeadRepository::new(&state.db).get(auth.tenant_id, id).await?;
    Ok(Json(lead))
}

#[utoipa::path(
    post,
    path = "/api/v1/leads",
    security(("bearer_auth" = [])),
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead created", body = LeadModel),
        (status = 400, description = "Validation failed or unknown client", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn create_lead(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateLeadRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LeadModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let lead = LeadRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/leads/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Lead id")),
    request_body = UpdateLeadRequest,
    responses(
        (status = 200, description = "Lead updated", body = LeadModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn update_lead(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateLeadRequest>, JsonRejection>,
) -> Result<Json<LeadModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let lead = LeadRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(lead))
}

#[utoipa::path(
    delete,
    path = "/api/v1/leads/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Lead id")),
    responses(
        (status = 204, description = "Lead deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Lead not found", body = ApiError)
    ),
    tag = "leads"
)]
pub async fn deactivate_lead(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    LeadRepository::new(&state.db)
        .deactivate(auth.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
