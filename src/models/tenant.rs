//! Tenant entity model
//!
//! A tenant is one tour-operator organisation; every other row hangs off it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "tenants")]
#[schema(as = Tenant)]
pub struct Model {
    /// Unique identifier for the tenant (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name for the tenant
    pub name: String,

    /// Timestamp when the tenant was created
    #[schema(value_type = String, example = "2026-01-05T09:00:00Z")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
