//! # Service Offering Repository
//!
//! Offerings are the sellable catalog entries of a vendor; rate tables hang off them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Page, VendorRepository, optional_text, required_text};
use crate::error::RepositoryError;
use crate::models::service_offering::{
    self, Entity as ServiceOffering, Model as ServiceOfferingModel, ServiceType,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateServiceOfferingRequest {
    pub vendor_id: Uuid,
    pub service_type: ServiceType,
    #[schema(example = "Deluxe cave room")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateServiceOfferingRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceOfferingFilter {
    pub vendor_id: Option<Uuid>,
    pub service_type: Option<ServiceType>,
    pub include_inactive: bool,
}

pub struct ServiceOfferingRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ServiceOfferingRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &ServiceOfferingFilter,
        page: Page,
    ) -> Result<(Vec<ServiceOfferingModel>, u64), RepositoryError> {
        let mut query =
            ServiceOffering::find().filter(service_offering::Column::TenantId.eq(tenant_id));
        if !filter.include_inactive {
            query = query.filter(service_offering::Column::IsActive.eq(true));
        }
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(service_offering::Column::VendorId.eq(vendor_id));
        }
        if let Some(service_type) = filter.service_type {
            query = query.filter(service_offering::Column::ServiceType.eq(service_type));
        }

        let total = query.clone().count(self.db).await?;
        let offerings = query
            .order_by_asc(service_offering::Column::Name)
            .order_by_asc(service_offering::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((offerings, total))
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ServiceOfferingModel>, RepositoryError> {
        Ok(ServiceOffering::find_by_id(id)
            .filter(service_offering::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<ServiceOfferingModel, RepositoryError> {
        self.find(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Service offering not found"))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateServiceOfferingRequest,
    ) -> Result<ServiceOfferingModel, RepositoryError> {
        let vendor = VendorRepository::new(self.db)
            .find(tenant_id, request.vendor_id)
            .await?;
        if vendor.is_none() {
            return Err(RepositoryError::validation_with_details(
                "vendor_id does not reference a vendor of this tenant",
                json!({ "field": "vendor_id", "value": request.vendor_id }),
            ));
        }

        let now = Utc::now();
        let model = service_offering::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            vendor_id: Set(request.vendor_id),
            service_type: Set(request.service_type),
            name: Set(required_text("name", &request.name)?),
            description: Set(optional_text(request.description)),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        Ok(model.insert(self.db).await?)
    }

    /// Updates descriptive fields. The vendor and service type are fixed once rates
    /// may reference the offering.
    pub async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: UpdateServiceOfferingRequest,
    ) -> Result<ServiceOfferingModel, RepositoryError> {
        let mut model = self.get(tenant_id, id).await?.into_active_model();

        if let Some(name) = request.name {
            model.name = Set(required_text("name", &name)?);
        }
        if request.description.is_some() {
            model.description = Set(optional_text(request.description));
        }
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(self.db).await?)
    }

    pub async fn deactivate(&self, tenant_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
        let mut model = self.get(tenant_id, id).await?.into_active_model();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now().into());
        model.update(self.db).await?;
        Ok(())
    }
}
