//! # Clients API Handlers
//!
//! Tenant-scoped CRUD for travel clients.

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
use crate::models::client::Model as ClientModel;
use crate::repositories::ClientRepository;
use crate::repositories::client::{ClientFilter, CreateClientRequest, UpdateClientRequest};
use crate::server::AppState;

/// Query parameters for listing clients
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListClientsQuery {
    /// Substring of the client name
    pub search: Option<String>,
    /// Include deactivated clients (default: false)
    pub include_inactive: Option<bool>,
    /// Page size (default: 50, max: 200)
    pub limit: Option<u64>,
    /// Rows to skip (default: 0)
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    security(("bearer_auth" = [])),
    params(ListClientsQuery),
    responses(
        (status = 200, description = "Page of clients", body = PaginatedResponse<ClientModel>),
        (status = 400, description = "Invalid pagination", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<PaginatedResponse<ClientModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = ClientFilter {
        search: query.search,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let (clients, total) = ClientRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(clients, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = ClientModel),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientModel>, ApiError> {
    let client = ClientRepository::new(&state.db)
        .get(auth.tenant_id, id)
        .await?;
    Ok(Json(client))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    security(("bearer_auth" = [])),
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ClientModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 409, description = "E-mail already used by another client", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let client = ClientRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/clients/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", body = ClientModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError),
        (status = 409, description = "E-mail already used by another client", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateClientRequest>, JsonRejection>,
) -> Result<Json<ClientModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let client = ClientRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(client))
}

/// Soft-deletes a client; it stays visible with `include_inactive=true`
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 204, description = "Client deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Client not found", body = ApiError)
    ),
    tag = "clients"
)]
pub async fn deactivate_client(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    ClientRepository::new(&state.db)
        .deactivate(auth.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
