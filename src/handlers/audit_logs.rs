//! # Audit Timeline Handler

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::types::{PaginatedResponse, page_from};
use crate::auth::{ADMINS, AuthContext};
use crate::error::ApiError;
use crate::repositories::AuditLogRepository;
use crate::repositories::audit_log::{AuditFilter, TimelineDay};
use crate::server::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimelineQuery {
    /// e.g. `quotation`, `booking`, `vendor`
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    /// Entries per page, before grouping by day
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Audit entries grouped by UTC day, newest first. Pagination counts entries, not
/// days.
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/timeline",
    security(("bearer_auth" = [])),
    params(TimelineQuery),
    responses(
        (status = 200, description = "Timeline page", body = PaginatedResponse<TimelineDay>),
        (status = 400, description = "Invalid filters", body = ApiError),
        (status = 403, description = "Admin role required", body = ApiError)
    ),
    tag = "audit-logs"
)]
pub async fn timeline(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<PaginatedResponse<TimelineDay>>, ApiError> {
    auth.require_any(ADMINS)?;
    let page = page_from(query.limit, query.offset)?;
    let filter = AuditFilter {
        entity_type: query.entity_type,
        entity_id: query.entity_id,
    };

    let (days, total) = AuditLogRepository::new(&state.db)
        .timeline(auth.tenant_id, &filter, page)
        .await?;
    let entries = days.iter().map(|day| day.entries.len()).sum::<usize>() as u64;

    let has_more = page.offset.saturating_add(entries) < total;
    let mut response = PaginatedResponse::new(days, total, page);
    response.pagination.has_more = has_more;
    Ok(Json(response))
}
