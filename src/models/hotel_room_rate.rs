//! Hotel room rate entity model
//!
//! Seasonal room prices per board type. Seasons for the same offering and board type
//! must not overlap while active (see [`crate::rates`]).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "hotel_room_rates")]
#[schema(as = HotelRoomRate)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_offering_id: Uuid,
    pub board_type: BoardType,
    #[schema(value_type = String, format = Date)]
    pub season_from: Date,
    #[schema(value_type = String, format = Date)]
    pub season_to: Date,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub price_single: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub price_double: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))", nullable)]
    pub price_triple: Option<Decimal>,
    pub currency: String,
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

/// Meal plan included with the room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum BoardType {
    /// Room only
    #[sea_orm(string_value = "RO")]
    #[serde(rename = "RO")]
    RoomOnly,
    /// Bed and breakfast
    #[sea_orm(string_value = "BB")]
    #[serde(rename = "BB")]
    BedAndBreakfast,
    /// Half board
    #[sea_orm(string_value = "HB")]
    #[serde(rename = "HB")]
    HalfBoard,
    /// Full board
    #[sea_orm(string_value = "FB")]
    #[serde(rename = "FB")]
    FullBoard,
    /// All inclusive
    #[sea_orm(string_value = "AI")]
    #[serde(rename = "AI")]
    AllInclusive,
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
