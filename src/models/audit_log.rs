//! Audit log entity model
//!
//! Append-only record of state changes. `changes` holds whatever JSON snapshot the
//! writer considered relevant (status transitions, amounts, codes).

use sea_orm::entity::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, ToSchema)]
#[sea_orm(table_name = "audit_logs")]
#[schema(as = AuditLog)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Acting user, if the change came from an authenticated request
    pub user_id: Option<Uuid>,
    #[schema(example = "quotation")]
    pub entity_type: String,
    pub entity_id: Uuid,
    #[schema(example = "accepted")]
    pub action: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    #[schema(value_type = Option<Object>)]
    pub changes: Option<Json>,
    #[schema(value_type = String)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
