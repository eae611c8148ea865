//! # Idempotency Key Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::idempotency_key::{self, Entity as IdempotencyKey, Model as IdempotencyKeyModel};

/// Response captured for later replay
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub key: String,
    pub request_path: String,
    pub request_hash: String,
    pub response_status: u16,
    pub response_body: serde_json::Value,
}

pub struct IdempotencyKeyRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> IdempotencyKeyRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(
        &self,
        tenant_id: Uuid,
        key: &str,
    ) -> Result<Option<IdempotencyKeyModel>, RepositoryError> {
        Ok(IdempotencyKey::find()
            .filter(idempotency_key::Column::TenantId.eq(tenant_id))
            .filter(idempotency_key::Column::Key.eq(key))
            .one(self.db)
            .await?)
    }
}

/// Stores a response on `conn`, normally the transaction that ran the mutation, so
/// the key exists exactly when the mutation committed. A key already stored by a
/// concurrent request is a conflict and rolls the caller's transaction back.
pub async fn store_in<C: ConnectionTrait>(
    conn: &C,
    tenant_id: Uuid,
    response: StoredResponse,
) -> Result<(), RepositoryError> {
    let key = response.key.clone();
    let model = idempotency_key::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        key: Set(response.key),
        request_path: Set(response.request_path),
        request_hash: Set(response.request_hash),
        response_status: Set(i32::from(response.response_status)),
        response_body: Set(response.response_body),
        created_at: Set(Utc::now().into()),
    };

    match model.insert(conn).await {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(RepositoryError::conflict(
            "A request with this Idempotency-Key was completed concurrently",
            Some(json!({ "idempotency_key": key })),
        )),
        Err(err) => Err(err.into()),
    }
}
