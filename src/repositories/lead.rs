//! # Lead Repository

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ClientRepository, Page, normalize_email, optional_text, required_text};
use crate::error::RepositoryError;
use crate::models::lead::{self, Entity as Lead, LeadStatus, Model as LeadModel};

/// Payload for creating a lead
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLeadRequest {
    pub client_id: Option<Uuid>,
    #[schema(example = "Demir family, Cappadocia")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "website")]
    pub source: Option<String>,
    /// Defaults to NEW
    pub status: Option<LeadStatus>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_date: Option<NaiveDate>,
    #[schema(example = 4)]
    pub pax: Option<i32>,
    pub notes: Option<String>,
}

/// Partial update; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLeadRequest {
    pub client_id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<LeadStatus>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_date: Option<NaiveDate>,
    pub pax: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub include_inactive: bool,
}

pub struct LeadRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeadRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &LeadFilter,
        page: Page,
    ) -> Result<(Vec<LeadModel>, u64), RepositoryError> {
        let mut query = Lead::find().filter(lead::Column::TenantId.eq(tenant_id));
        if !filter.include_inactive {
            query = query.filter(lead::Column::IsActive.eq(true));
        }
        if let Some(status) = filter.status {
            query = query.filter(lead::Column::Status.eq(status));
        }

        let total = query.clone().count(self.db).await?;
        let leads = query
            .order_by_desc(lead::Column::CreatedAt)
            .order_by_asc(lead::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((leads, total))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<LeadModel, RepositoryError> {
        Lead::find_by_id(id)
            .filter(lead::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Lead not found"))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateLeadRequest,
    ) -> Result<LeadModel, RepositoryError> {
        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
        }
        let now = Utc::now();

        let model = lead::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            client_id: Set(request.client_id),
            name: Set(required_text("name", &request.name)?),
            email: Set(normalize_email(request.email)?),
            phone: Set(optional_text(request.phone)),
            source: Set(optional_text(request.source)),
            status: Set(request.status.unwrap_or_default()),
            travel_date: Set(request.travel_date),
            pax: Set(validate_pax(request.pax)?),
            notes: Set(optional_text(request.notes)),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(model.insert(self.db).await?)
    }

    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateLeadRequest,
    ) -> Result<LeadModel, RepositoryError> {
        let existing = self.get(tenant_id, id).await?;
        let previous_status = existing.status;
        let mut model = existing.into_active_model();

        if let Some(client_id) = request.client_id {
            self.ensure_client(tenant_id, client_id).await?;
            model.client_id = Set(Some(client_id));
        }
        if let Some(name) = request.name {
            model.name = Set(required_text("name", &name)?);
        }
        if request.email.is_some() {
            model.email = Set(normalize_email(request.email)?);
        }
        if request.phone.is_some() {
            model.phone = Set(optional_text(request.phone));
        }
        if request.source.is_some() {
            model.source = Set(optional_text(request.source));
        }
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        if request.travel_date.is_some() {
            model.travel_date = Set(request.travel_date);
        }
        if request.pax.is_some() {
            model.pax = Set(validate_pax(request.pax)?);
        }
        if request.notes.is_some() {
            model.notes = Set(optional_text(request.notes));
        }
        model.updated_at = Set(Utc::now().into());

        let updated = model.update(self.db).await?;
        if updated.status != previous_status {
            tracing::info!(
                lead_id = %updated.id,
                from = ?previous_status,
                to = ?updated.status,
                "Lead status changed"
            );
        }
        Ok(updated)
    }

    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let existing = self.get(tenant_id, id).await?;
        let mut model = existing.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now().into());
        model.update(self.db).await?;
        Ok(())
    }

    async fn ensure_client(&self, tenant_id: Uuid, client_id: Uuid) -> Result<(), RepositoryError> {
        match ClientRepository::new(self.db).find(tenant_id, client_id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::validation_with_details(
                "client_id does not reference a client of this tenant",
                json!({ "field": "client_id", "value": client_id }),
            )),
        }
    }
}

fn validate_pax(pax: Option<i32>) -> Result<Option<i32>, RepositoryError> {
    match pax {
        Some(value) if value < 1 => Err(RepositoryError::validation_with_details(
            "pax must be at least 1",
            json!({ "field": "pax", "value": value }),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{insert_tenant, migrated_sqlite};

    fn request(name: &str) -> CreateLeadRequest {
        CreateLeadRequest {
            client_id: None,
            name: name.to_string(),
            email: None,
            phone: None,
            source: Some("website".to_string()),
            status: None,
            travel_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            pax: Some(2),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_new() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = LeadRepository::new(&db);

        let lead = repo.create(tenant_id, request("Demir family")).await.unwrap();

        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.pax, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_client_rejected() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = LeadRepository::new(&db);

        let err = repo
            .create(
                tenant_id,
                CreateLeadRequest {
                    client_id: Some(Uuid::new_v4()),
                    ..request("Ghost")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_zero_pax_rejected() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = LeadRepository::new(&db);

        let err = repo
            .create(
                tenant_id,
                CreateLeadRequest {
                    pax: Some(0),
                    ..request("Nobody")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_filter_by_status() {
        let db = migrated_sqlite().await;
        let tenant_id = insert_tenant(&db, "Aegean").await;
        let repo = LeadRepository::new(&db);

        let lead = repo.create(tenant_id, request("First")).await.unwrap();
        repo.create(tenant_id, request("Second")).await.unwrap();
        repo.update(
            tenant_id,
            lead.id,
            UpdateLeadRequest {
                status: Some(LeadStatus::Qualified),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let filter = LeadFilter {
            status: Some(LeadStatus::Qualified),
            ..Default::default()
        };
        let (leads, total) = repo.list(tenant_id, &filter, Page::default()).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(leads[0].id, lead.id);
    }
}
