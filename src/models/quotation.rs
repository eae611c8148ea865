//! Quotation entity model
//!
//! A priced proposal sent to a client. Line items are stored as a JSON array of
//! [`QuotationItem`] and only become relational rows (booking items) on acceptance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "quotations")]
#[schema(as = Quotation)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Option<Uuid>,
    pub title: String,
    pub status: QuotationStatus,
    pub currency: String,
    /// JSON array of [`QuotationItem`]
    #[sea_orm(column_type = "JsonBinary")]
    #[schema(value_type = Vec<QuotationItem>)]
    pub items: Json,
    /// Sum of quantity × unit price over all items
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_price: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_start: Option<Date>,
    #[schema(value_type = Option<String>, format = Date)]
    pub travel_end: Option<Date>,
    #[schema(value_type = Option<String>)]
    pub sent_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>)]
    pub accepted_at: Option<DateTimeWithTimeZone>,
    #[schema(value_type = Option<String>)]
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejection_reason: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String)]
    pub updated_at: DateTimeWithTimeZone,
}

/// Lifecycle: DRAFT → SENT → ACCEPTED | REJECTED. The last two are terminal.
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
pub enum QuotationStatus {
    #[sea_orm(string_value = "DRAFT")]
    #[default]
    Draft,
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "DRAFT",
            QuotationStatus::Sent => "SENT",
            QuotationStatus::Accepted => "ACCEPTED",
            QuotationStatus::Rejected => "REJECTED",
        }
    }
}

/// One priced line of a quotation as stored in the `items` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuotationItem {
    /// Free-form service category, e.g. "HOTEL_ROOM" or "TRANSFER"
    #[schema(example = "HOTEL_ROOM")]
    pub service_type: String,
    pub service_offering_id: Option<Uuid>,
    #[schema(example = "3 nights, double room, BB")]
    pub description: String,
    #[schema(value_type = Option<String>, format = Date)]
    pub service_date: Option<Date>,
    #[schema(example = 3)]
    pub quantity: i32,
    #[schema(value_type = String, example = "120.00")]
    pub unit_price: Decimal,
}

impl QuotationItem {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
