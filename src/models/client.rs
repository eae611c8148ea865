//! Client entity model

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

/// A traveller or company the operator sells to. Email is unique per tenant when set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "clients")]
#[schema(as = Client)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub notes: Option<String>,
    /// Soft-delete flag
    pub is_active: bool,
    #[schema(value_type = String, example = "2026-01-05T09:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
    #[schema(value_type = String, example = "2026-01-05T09:00:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
