//! # Tenants API Handlers

use axum::{extract::State, response::Json};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::models::tenant::Model as TenantModel;
use crate::repositories::TenantRepository;
use crate::server::AppState;

/// Tenant of the bearer token
#[utoipa::path(
    get,
    path = "/api/v1/tenants/current",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's tenant", body = TenantModel),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Tenant no longer exists", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn current_tenant(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<TenantModel>, ApiError> {
    let tenant = TenantRepository::new(&state.db)
        .get_tenant_by_id(auth.tenant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
    Ok(Json(tenant))
}
