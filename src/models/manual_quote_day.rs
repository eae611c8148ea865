//! Manual quote day entity model

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "manual_quote_days")]
#[schema(as = ManualQuoteDay)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub manual_quote_id: Uuid,
    /// 1-based position in the itinerary
    pub day_number: i32,
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<Date>,
    pub title: String,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manual_quote::Entity",
        from = "Column::ManualQuoteId",
        to = "super::manual_quote::Column::Id"
    )]
    ManualQuote,
    #[sea_orm(has_many = "super::manual_quote_expense::Entity")]
    ManualQuoteExpense,
}

impl Related<super::manual_quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuote.def()
    }
}

impl Related<super::manual_quote_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManualQuoteExpense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
