//! # Client Repository
//!
//! Tenant-scoped CRUD for clients. E-mail addresses are stored lower-cased and are
//! unique per tenant.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Page, normalize_email, optional_text, required_text};
use crate::error::{RepositoryError, is_unique_violation};
use crate::models::client::{self, Entity as Client, Model as ClientModel};

/// Payload for creating a client
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateClientRequest {
    #[schema(example = "Ayse Demir")]
    pub name: String,
    #[schema(example = "ayse@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "TR")]
    pub nationality: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub notes: Option<String>,
}

/// List filters for clients
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    /// Substring match on the client name
    pub search: Option<String>,
    pub include_inactive: bool,
}

/// Repository for Client database operations
pub struct ClientRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ClientRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ClientFilter,
        page: Page,
    ) -> Result<(Vec<ClientModel>, u64), RepositoryError> {
        let mut query = Client::find().filter(client::Column::TenantId.eq(tenant_id));
        if !filter.include_inactive {
            query = query.filter(client::Column::IsActive.eq(true));
        }
        if let Some(search) = optional_text(filter.search.clone()) {
            query = query.filter(client::Column::Name.contains(search));
        }

        let total = query.clone().count(self.db).await?;
        let clients = query
            .order_by_asc(client::Column::Name)
            .order_by_asc(client::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((clients, total))
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ClientModel>, RepositoryError> {
        Ok(Client::find_by_id(id)
            .filter(client::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<ClientModel, RepositoryError> {
        self.find(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Client not found"))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateClientRequest,
    ) -> Result<ClientModel, RepositoryError> {
        let now = Utc::now();
        let email = normalize_email(request.email)?;

        let model = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(required_text("name", &request.name)?),
            email: Set(email.clone()),
            phone: Set(optional_text(request.phone)),
            nationality: Set(optional_text(request.nationality)),
            notes: Set(optional_text(request.notes)),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        model
            .insert(self.db)
            .await
            .map_err(|err| duplicate_email(err, email.as_deref()))
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<ClientModel, RepositoryError> {
        let existing = self.get(tenant_id, id).await?;
        let mut model = existing.into_active_model();

        if let Some(name) = request.name {
            model.name = Set(required_text("name", &name)?);
        }
        let mut email = None;
        if request.email.is_some() {
            email = normalize_email(request.email)?;
            model.email = Set(email.clone());
        }
        if request.phone.is_some() {
            model.phone = Set(optional_text(request.phone));
        }
        if request.nationality.is_some() {
            model.nationality = Set(optional_text(request.nationality));
        }
        if request.notes.is_some() {
            model.notes = Set(optional_text(request.notes));
        }
        model.updated_at = Set(Utc::now().into());

        model
            .update(self.db)
            .await
            .map_err(|err| duplicate_email(err, email.as_deref()))
    }

    /// Soft-deletes the client. Bookings and quotations keep referencing it.
    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let existing = self.get(tenant_id, id).await?;
        let mut model = existing.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now().into());
        model.update(self.db).await?;
        Ok(())
    }
}

fn duplicate_email(err: sea_orm::DbErr, email: Option<&str>) -> RepositoryError {
    if is_unique_violation(&err) {
        return RepositoryError::conflict(
            "A client with this email already exists",
            Some(json!({ "field": "email", "value": email })),
        );
    }
    RepositoryError::database_error(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_tenant, migrated_sqlite};

    fn request(name: &str, email: Option<&str>) -> CreateClientRequest {
        CreateClientRequest {
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: None,
            nationality: Some("TR".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ClientRepository::new(&db);

        let client = repo
            .create(tenant_id, request("Ayse", Some(" Ayse@Example.com")))
            .await
            .unwrap();

        assert_eq!(client.email.as_deref(), Some("ayse@example.com"));
        assert!(client.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_email_in_same_tenant_conflicts() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let other_tenant = insert_tenant(&db, "Lycian").await;
        let repo = ClientRepository::new(&db);

        repo.create(tenant_id, request("Ayse", Some("ayse@example.com")))
            .await
            .unwrap();
        let err = repo
            .create(tenant_id, request("Ayse D.", Some("AYSE@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { .. }));

        // Same address under another tenant is fine
        repo.create(other_tenant, request("Ayse", Some("ayse@example.com")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = ClientRepository::new(&db);
        let client = repo.create(tenant_id, request("Ayse", None)).await.unwrap();

        let updated = repo
            .update(
                tenant_id,
                client.id,
                UpdateClientRequest {
                    phone: Some("+90 555 000 0000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+90 555 000 0000"));
        assert_eq!(updated.name, "Ayse");

        repo.deactivate(tenant_id, client.id).await.unwrap();
        let (active, total) = repo
            .list(tenant_id, &ClientFilter::default(), Page::default())
            .await
            .unwrap();
        assert!(active.is_empty());
        assert_eq!(total, 0);

        let (all, _) = repo
            .list(
                tenant_id,
                &ClientFilter {
                    include_inactive: true,
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_read_client() {
        let db = migrated_sqlite().await;
        let owner = insert_tenant(&db, "Aegean").await;
        let intruder = insert_tenant(&db, "Lycian").await;
        let repo = ClientRepository::new(&db);
        let client = repo.create(owner, request("Ayse", None)).await.unwrap();

        let err = repo.get(intruder, client.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
