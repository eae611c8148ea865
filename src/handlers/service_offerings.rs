//! # Service Offerings API Handlers
//!
//! Bookable services of a vendor. Rates attach to an offering of the matching type.

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
use crate::models::service_offering::{Model as ServiceOfferingModel, ServiceType};
use crate::repositories::ServiceOfferingRepository;
use crate::repositories::service_offering::{
    CreateServiceOfferingRequest, ServiceOfferingFilter, UpdateServiceOfferingRequest,
};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListServiceOfferingsQuery {
    pub vendor_id: Option<Uuid>,
    pub service_type: Option<ServiceType>,
    pub include_inactive: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/service-offerings",
    security(("bearer_auth" = [])),
    params(ListServiceOfferingsQuery),
    responses(
        (status = 200, description = "Page of service offerings", body = PaginatedResponse<ServiceOfferingModel>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "service-offerings"
)]
pub async fn list_service_offerings(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListServiceOfferingsQuery>,
) -> Result<Json<PaginatedResponse<ServiceOfferingModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = ServiceOfferingFilter {
        vendor_id: query.vendor_id,
        service_type: query.service_type,
        include_inactive: query.include_inactive.unwrap_or(false),
    };

    let (offerings, total) = ServiceOfferingRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(offerings, total, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-offerings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Service offering id")),
    responses(
        (status = 200, description = "Service offering", body = ServiceOfferingModel),
        (status = 404, description = "Service offering not found", body = ApiError)
    ),
    tag = "service-offerings"
)]
pub async fn get_service_offering(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceOfferingModel>, ApiError> {
    let offering = ServiceOfferingRepository::new(&state.db)
        .get(auth.tenant_id, id)
        .await?;
    Ok(Json(offering))
}

#[utoipa::path(
    post,
    path = "/api/v1/service-offerings",
    security(("bearer_auth" = [])),
    request_body = CreateServiceOfferingRequest,
    responses(
        (status = 201, description = "Service offering created", body = ServiceOfferingModel),
        (status = 400, description = "Validation failed or unknown vendor", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError)
    ),
    tag = "service-offerings"
)]
pub async fn create_service_offering(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateServiceOfferingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceOfferingModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let offering = ServiceOfferingRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(offering)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/service-offerings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Service offering id")),
    request_body = UpdateServiceOfferingRequest,
    responses(
        (status = 200, description = "Service offering updated", body = ServiceOfferingModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Service offering not found", body = ApiError)
    ),
    tag = "service-offerings"
)]
pub async fn update_service_offering(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateServiceOfferingRequest>, JsonRejection>,
) -> Result<Json<ServiceOfferingModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let offering = ServiceOfferingRepository::new(&state.db)
        .update(auth.tenant_id, id, request)
        .await?;
    Ok(Json(offering))
}

#[utoipa::path(
    delete,
    path = "/api/v1/service-offerings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Service offering id")),
    responses(
        (status = 204, description = "Service offering deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Service offering not found", body = ApiError)
    ),
    tag = "service-offerings"
)]
pub async fn deactivate_service_offering(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    ServiceOfferingRepository::new(&state.db)
        .deactivate(auth.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
