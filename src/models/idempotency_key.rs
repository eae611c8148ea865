//! Idempotency key entity model
//!
//! Stores the first successful response for a (tenant, key) pair so that retries of
//! a payment mutation replay it instead of executing twice.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "idempotency_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Client-supplied `Idempotency-Key` header value
    pub key: String,
    pub request_path: String,
    /// Hex SHA-256 fingerprint of method, path and body
    pub request_hash: String,
    pub response_status: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub response_body: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
