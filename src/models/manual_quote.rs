//! Manual quote entity model
//!
//! A hand-built itinerary priced by the calculator in [`crate::pricing`]. The computed
//! PAX table is cached in `pricing_table` and rewritten after every structural edit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "manual_quotes")]
#[schema(as = ManualQuote)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Option<Uuid>,
    pub title: String,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    #[schema(value_type = String, example = "15.00")]
    pub markup_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((7, 2)))")]
    #[schema(value_type = String, example = "10.00")]
    pub tax_percent: Decimal,
    pub transport_pricing: TransportPricing,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    #[schema(value_type = Option<Vec<crate::pricing::PaxPrice>>)]
    pub pricing_table: Option<Json>,
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

/// How TRANSPORTATION expense lines scale with group size.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportPricing {
    /// Price is per traveller and multiplied by PAX
    #[sea_orm(string_value = "PER_PERSON")]
    #[default]
    PerPerson,
    /// Price is for the whole vehicle and stays fixed
    #[sea_orm(string_value = "PER_VEHICLE")]
    PerVehicle,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::manual_quote_day::Entity")]
    ManualQuoteDay,
    #[sea_orm(has_many = "super::manual_quote_expense::Entity")]
    ManualQuoteExpense,
}

impl Related<super::manual_quote_day::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuoteDay.def()
    }
}

impl Related<super::manual_quote_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuoteExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
