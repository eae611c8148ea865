//! # Tenant Repository
//!
//! This module contains the repository implementation for Tenant entities.
//! Tenants are created out of band (admin CLI); the API only reads them.

use crate::error::RepositoryError;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Entity as Tenant, Model as TenantModel,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

/// Request data for creating a new tenant
#[derive(Debug, Clone)]
pub struct CreateTenantRequest {
    /// Display name for the tenant
    pub name: String,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantRepository<'a> {
    /// Create a new TenantRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new tenant
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantModel, RepositoryError> {
        let name = self.validate_tenant_name(&request.name)?;

        let tenant = TenantActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now().into()),
        };

        let result = tenant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(tenant_id = %result.id, "Tenant created");
        Ok(result)
    }

    /// Get tenant by ID
    pub async fn get_tenant_by_id(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        let tenant = Tenant::find_by_id(tenant_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(tenant)
    }

    /// Get tenant count
    pub async fn get_tenant_count(&self) -> Result<u64, RepositoryError> {
        let count = Tenant::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count)
    }

    /// Validate tenant name according to business rules
    fn validate_tenant_name(&self, name: &str) -> Result<String, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_error(
                "Tenant name cannot be empty",
            ));
        }

        if name.len() > 255 {
            return Err(RepositoryError::validation_error(
                "Tenant name cannot exceed 255 characters",
            ));
        }

        // Letters, numbers, spaces, hyphens, underscores, dots and ampersands
        if !name.chars().all(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.' | '&')
        }) {
            return Err(RepositoryError::validation_error(
                "Tenant name can only contain letters, numbers, spaces and - _ . &",
            ));
        }

        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::migrated_sqlite as setup_test_db;

    #[tokio::test]
    async fn test_create_and_fetch_tenant() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        let tenant = repo
            .create_tenant(CreateTenantRequest {
                name: "  Aegean Tours  ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(tenant.name, "Aegean Tours");
        let fetched = repo.get_tenant_by_id(tenant.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, tenant.id);
        assert_eq!(fetched.name, tenant.name);
        assert_eq!(repo.get_tenant_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_tenant_names_rejected() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        for name in ["", "   ", "Bad<script>"] {
            let err = repo
                .create_tenant(CreateTenantRequest {
                    name: name.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, RepositoryError::Validation { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_missing_tenant_is_none() {
        let db = setup_test_db().await;
        let repo = TenantRepository::new(&db);

        assert!(repo.get_tenant_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
