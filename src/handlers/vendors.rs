//! # Vendors API Handlers
//!
//! Suppliers of hotel rooms, transport, guiding and activities.

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
use crate::models::vendor::{Model as VendorModel, VendorType};
use crate::repositories::VendorRepository;
use crate::repositories::vendor::{CreateVendorRequest, UpdateVendorRequest, VendorFilter};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListVendorsQuery {
    pub vendor_type: Option<VendorType>,
    pub include_inactive: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors",
    security(("bearer_auth" = [])),
    params(ListVendorsQuery),
    responses(
        (status = 200, description = "Page of vendors", body = PaginatedResponse<VendorModel>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListVendorsQuery>,
) -> Result<Json<PaginatedResponse<VendorModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = VendorFilter {
        vendor_type: query.vendor_type,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let (vendors, total) = VendorRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(vendors, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/vendors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 200, description = "Vendor", body = VendorModel),
        (status = 404, description = "Vendor not found", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn get_vendor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorModel>, ApiError> {
    let vendor = VendorRepository::new(&state.db).get(auth.tenant_id, id).await?;
    Ok(Json(vendor))
}

#[utoipa::path(
    post,
    path = "/api/v1/vendors",
    security(("bearer_auth" = [])),
    request_body = CreateVendorRequest,
    responses(
        (status = 201, description = "Vendor created", body = VendorModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateVendorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VendorModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let vendor = VendorRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/vendors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vendor id")),
    request_body = UpdateVendorRequest,
    responses(
        (status = 200, description = "Vendor updated", body = VendorModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Vendor not found", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn update_vendor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateVendorRequest>, JsonRejection>,
) -> Result<Json<VendorModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let vendor = VendorRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(vendor))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vendors/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vendor id")),
    responses(
        (status = 204, description = "Vendor deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Vendor not found", body = ApiError)
    ),
    tag = "vendors"
)]
pub async fn deactivate_vendor(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    VendorRepository::new(&state.db)
        .deactivate(auth.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
