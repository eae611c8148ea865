//! # Bookings API Handlers
//!
//! Bookings are created by accepting a quotation; this module only reads and
//! cancels them.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{AuthContext, CRM_WRITERS};
use crate::error::ApiError;
use crate::models::booking::{BookingStatus, Model as BookingModel};
use crate::repositories::BookingRepository;
use crate::repositories::booking::{BookingDetail, BookingFilter};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub client_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    security(("bearer_auth" = [])),
    params(ListBookingsQuery),
    responses(
        (status = 200, description = "Page of bookings, latest code first", body = PaginatedResponse<BookingModel>),
        (status = 400, description = "Invalid filters", body = ApiError)
    ),
    tag = "bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<PaginatedResponse<BookingModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let filter = BookingFilter {
        status: query.status,
        client_id: query.client_id,
    };

    let (bookings, total) = BookingRepository::new(&state.db)
        .list(auth.tenant_id, &filter, page)
        .await?;
    Ok(Json(PaginatedResponse::new(bookings, total, page)))
}

/// Booking with its items and the client payment balance
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking detail", body = BookingDetail),
        (status = 404, description = "Booking not found", body = ApiError)
    ),
    tag = "bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDetail>, ApiError> {
    let detail = BookingRepository::new(&state.db)
        .get_detail(auth.tenant_id, id)
        .await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingModel),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Booking not found", body = ApiError),
        (status = 409, description = "Booking is not confirmed", body = ApiError)
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    let booking = BookingRepository::new(&state.db)
        .cancel(auth.tenant_id, id, Some(auth.user_id))
        .await?;
    Ok(Json(booking))
}
