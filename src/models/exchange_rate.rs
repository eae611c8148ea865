//! Exchange rate entity model

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// Conversion rate from one currency into another, valid from `effective_date` until
/// superseded by a later entry for the same pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "exchange_rates")]
#[schema(as = ExchangeRate)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub from_currency: String,
    pub to_currency: String,
    /// Units of `to_currency` per unit of `from_currency`, 6 decimal places
    #[sea_orm(column_type = "Decimal(Some((16, 6)))")]
    pub rate: Decimal,
    #[schema(value_type = String, format = Date)]
    pub effective_date: Date,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
