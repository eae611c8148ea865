//! # Vendor Repository
//!
//! Vendors are the hotels, transport companies, guides and activity providers a
//! tenant buys services from.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Page, normalize_email, optional_text, required_text};
use crate::error::RepositoryError;
use crate::models::vendor::{self, Entity as Vendor, Model as VendorModel, VendorType};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVendorRequest {
    #[schema(example = "Kaya Boutique Hotel")]
    pub name: String,
    pub vendor_type: VendorType,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Goreme")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub vendor_type: Option<VendorType>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    pub vendor_type: Option<VendorType>,
    pub include_inactive: bool,
}

pub struct VendorRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> VendorRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &VendorFilter,
        page: Page,
    ) -> Result<(Vec<VendorModel>, u64), RepositoryError> {
        let mut query = Vendor::find().filter(vendor::Column::TenantId.eq(tenant_id));
        if !filter.include_inactive {
            query = query.filter(vendor::Column::IsActive.eq(true));
        }
        if let Some(vendor_type) = filter.vendor_type {
            query = query.filter(vendor::Column::VendorType.eq(vendor_type));
        }

        let total = query.clone().count(self.db).await?;
        let vendors = query
            .order_by_asc(vendor::Column::Name)
            .order_by_asc(vendor::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(self.db)
            .await?;

        Ok((vendors, total))
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VendorModel>, RepositoryError> {
        Ok(Vendor::find_by_id(id)
            .filter(vendor::Column::TenantId.eq(tenant_id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<VendorModel, RepositoryError> {
        self.find(tenant_id, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Vendor not found"))
    }

    pub async fn create(
        &self,
        tenant_id: Uuid,
        request: CreateVendorRequest,
    ) -> Result<VendorModel, RepositoryError> {
        let now = Utc::now();
        let model = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            name: Set(required_text("name", &request.name)?),
            vendor_type: Set(request.vendor_type),
            email: Set(normalize_email(request.email)?),
            phone: Set(optional_text(request.phone)),
            city: Set(optional_text(request.city)),
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
        request: UpdateVendorRequest,
    ) -> Result<VendorModel, RepositoryError> {
        let mut model = self.get(tenant_id, id).await?.into_active_model();

        if let Some(name) = request.name {
            model.name = Set(required_text("name", &name)?);
        }
        if let Some(vendor_type) = request.vendor_type {
            model.vendor_type = Set(vendor_type);
        }
        if request.email.is_some() {
            model.email = Set(normalize_email(request.email)?);
        }
        if request.phone.is_some() {
            model.phone = Set(optional_text(request.phone));
        }
        if request.city.is_some() {
            model.city = Set(optional_text(request.city));
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
