//! Transfer rate entity model

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Seasonal point-to-point transfer price, charged per vehicle.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "transfer_rates")]
#[schema(as = TransferRate)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_offering_id: Uuid,
    #[schema(value_type = String, format = Date)]
    pub season_from: Date,
    #[schema(value_type = String, format = Date)]
    pub season_to: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub price_per_vehicle: Decimal,
    /// Seats available in the vehicle
    pub vehicle_capacity: i32,
    pub currency: String,
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_offering::Entity",
        from = "Column::ServiceOfferingId",
        to = "super::service_offering::Column::Id"
    )]
    ServiceOffering,
}

impl ActiveModelBehavior for ActiveModel {}
