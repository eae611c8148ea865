//! Vendor payment entity model

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

pub use super::payment_client::{PaymentMethod, PaymentStatus};

/// Money paid out to a vendor, optionally tied to the booking it settles.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "payments_vendor")]
#[schema(as = PaymentVendor)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vendor_id: Uuid,
    pub booking_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    #[schema(value_type = String)]
    pub paid_at: DateTimeWithTimeZone,
    pub status: PaymentStatus,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
}

impl ActiveModelBehavior for ActiveModel {}
