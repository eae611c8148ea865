//! Manual quote expense entity model

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One cost line on a manual quote day. `price` is per person, except TRANSPORTATION
/// lines on a quote priced per vehicle.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "manual_quote_expenses")]
#[schema(as = ManualQuoteExpense)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub manual_quote_id: Uuid,
    pub manual_quote_day_id: Uuid,
    pub category: ExpenseCategory,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    #[schema(value_type = String, example = "45.00")]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseCategory {
    #[sea_orm(string_value = "TRANSPORTATION")]
    Transportation,
    #[sea_orm(string_value = "ACCOMMODATION")]
    Accommodation,
    #[sea_orm(string_value = "ACTIVITY")]
    Activity,
    #[sea_orm(string_value = "GUIDE")]
    Guide,
    #[sea_orm(string_value = "MEAL")]
    Meal,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manual_quote::Entity",
        from = "Column::ManualQuoteId",
        to = "super::manual_quote::Column::Id"
    )]
    ManualQuote,
    #[sea_orm(
        belongs_to = "super::manual_quote_day::Entity",
        from = "Column::ManualQuoteDayId",
        to = "super::manual_quote_day::Column::Id"
    )]
    ManualQuoteDay,
}

impl Related<super::manual_quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuote.def()
    }
}

impl Related<super::manual_quote_day::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuoteDay.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
