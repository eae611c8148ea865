//! # Manual Quotes API Handlers
//!
//! Day-by-day expense builder. Every change to days or expenses recomputes the
//! per-pax pricing table stored on the quote.

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
use crate::models::manual_quote::Model as ManualQuoteModel;
use crate::models::manual_quote_day::Model as DayModel;
use crate::models::manual_quote_expense::Model as ExpenseModel;
use crate::repositories::ManualQuoteRepository;
use crate::repositories::manual_quote::{
    AddDayRequest, AddExpenseRequest, CreateManualQuoteRequest, ManualQuoteDetail,
    UpdateExpenseRequest, UpdateManualQuoteRequest,
};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListManualQuotesQuery {
    pub include_inactive: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/manual-quotes",
    security(("bearer_auth" = [])),
    params(ListManualQuotesQuery),
    responses(
        (status = 200, description = "Page of manual quotes", body = PaginatedResponse<ManualQuoteModel>),
        (status = 400, description = "Invalid pagination", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn list_manual_quotes(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListManualQuotesQuery>,
) -> Result<Json<PaginatedResponse<ManualQuoteModel>>, ApiError> {
    let page = page_from(query.limit, query.offset)?;
    let (quotes, total) = ManualQuoteRepository::new(&state.db)
        .list(auth.tenant_id, query.include_inactive.unwrap_or(false), page)
        .await?;
    Ok(Json(PaginatedResponse::new(quotes, total, page)))
}

/// Quote with its days and their expenses
#[utoipa::path(
    get,
    path = "/api/v1/manual-quotes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manual quote id")),
    responses(
        (status = 200, description = "Manual quote detail", body = ManualQuoteDetail),
        (status = 404, description = "Manual quote not found", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn get_manual_quote(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<ManualQuoteDetail>, ApiError> {
    let detail = ManualQuoteRepository::new(&state.db)
        .get_detail(auth.tenant_id, id)
        .await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/manual-quotes",
    security(("bearer_auth" = [])),
    request_body = CreateManualQuoteRequest,
    responses(
        (status = 201, description = "Manual quote created", body = ManualQuoteModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 403, description = "Role not allowed", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn create_manual_quote(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<CreateManualQuoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ManualQuoteModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let quote = ManualQuoteRepository::new(&state.db)
        .create(auth.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// Updates title, client, currency or pricing settings and recomputes the table
#[utoipa::path(
    patch,
    path = "/api/v1/manual-quotes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manual quote id")),
    request_body = UpdateManualQuoteRequest,
    responses(
        (status = 200, description = "Manual quote updated", body = ManualQuoteModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Manual quote not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn update_manual_quote(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateManualQuoteRequest>, JsonRejection>,
) -> Result<Json<ManualQuoteModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let quote = ManualQuoteRepository::new(&state.db)
        .update_settings(auth.tenant_id, id, request)
        .await?;
    Ok(Json(quote))
}

#[utoipa::path(
    delete,
    path = "/api/v1/manual-quotes/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manual quote id")),
    responses(
        (status = 204, description = "Manual quote deactivated"),
        (status = 403, description = "Role not allowed", body = ApiError),
        (status = 404, description = "Manual quote not found", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn deactivate_manual_quote(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    ManualQuoteRepository::new(&state.db)
        .deactivate(auth.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/manual-quotes/{id}/days",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Manual quote id")),
    request_body = AddDayRequest,
    responses(
        (status = 201, description = "Day appended", body = DayModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Manual quote not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn add_day(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddDayRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DayModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let day = ManualQuoteRepository::new(&state.db)
        .add_day(auth.tenant_id, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(day)))
}

/// Removes a day with its expenses; later days move up by one
#[utoipa::path(
    delete,
    path = "/api/v1/manual-quotes/{id}/days/{day_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Manual quote id"),
        ("day_id" = Uuid, Path, description = "Day id")
    ),
    responses(
        (status = 200, description = "Day removed, quote with recomputed pricing", body = ManualQuoteModel),
        (status = 404, description = "Manual quote or day not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn delete_day(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, day_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ManualQuoteModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    let quote = ManualQuoteRepository::new(&state.db)
        .delete_day(auth.tenant_id, id, day_id)
        .await?;
    Ok(Json(quote))
}

#[utoipa::path(
    post,
    path = "/api/v1/manual-quotes/{id}/days/{day_id}/expenses",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Manual quote id"),
        ("day_id" = Uuid, Path, description = "Day id")
    ),
    request_body = AddExpenseRequest,
    responses(
        (status = 201, description = "Expense added", body = ExpenseModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Manual quote or day not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn add_expense(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, day_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<AddExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseModel>), ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let expense = ManualQuoteRepository::new(&state.db)
        .add_expense(auth.tenant_id, id, day_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/manual-quotes/{id}/expenses/{expense_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Manual quote id"),
        ("expense_id" = Uuid, Path, description = "Expense id")
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseModel),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Manual quote or expense not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, expense_id)): Path<(Uuid, Uuid)>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<Json<ExpenseModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;
    let Json(request) = payload?;

    let expense = ManualQuoteRepository::new(&state.db)
        .update_expense(auth.tenant_id, id, expense_id, request)
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/v1/manual-quotes/{id}/expenses/{expense_id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Manual quote id"),
        ("expense_id" = Uuid, Path, description = "Expense id")
    ),
    responses(
        (status = 200, description = "Expense removed, quote with recomputed pricing", body = ManualQuoteModel),
        (status = 404, description = "Manual quote or expense not found", body = ApiError),
        (status = 409, description = "Manual quote is deactivated", body = ApiError)
    ),
    tag = "manual-quotes"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, expense_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ManualQuoteModel>, ApiError> {
    auth.require_any(CRM_WRITERS)?;

    let quote = ManualQuoteRepository::new(&state.db)
        .delete_expense(auth.tenant_id, id, expense_id)
        .await?;
    Ok(Json(quote))
}
