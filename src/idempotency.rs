//! # Idempotency Keys
//!
//! Payment-creating endpoints accept an `Idempotency-Key` header. The first request
//! with a key executes normally and its response is stored in the same transaction
//! as the payment; a retry with the same key and the same request fingerprint gets
//! the stored response back without running the mutation again. Reusing a key for a
//! different request is a conflict.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ApiError, RepositoryError, validation_error};
use crate::repositories::IdempotencyKeyRepository;
use crate::repositories::idempotency_key::{StoredResponse, store_in};

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

const MAX_KEY_LEN: usize = 255;

/// Reads the optional `Idempotency-Key` header. Keys must be 1 to 255 visible ASCII
/// characters.
pub fn parse_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let invalid = || {
        validation_error(
            "Idempotency-Key must be 1-255 visible ASCII characters",
            json!({ "header": "Idempotency-Key" }),
        )
    };
    let key = value.to_str().map_err(|_| invalid())?;
    if key.is_empty() || key.len() > MAX_KEY_LEN || !key.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(invalid());
    }
    Ok(Some(key.to_string()))
}

/// SHA-256 over method, path and the canonical JSON body. `serde_json::Value` keeps
/// object keys sorted, so key order in the request does not matter.
pub fn fingerprint(method: &Method, path: &str, body: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(path.as_bytes());
    hasher.update(b"\n");
    hasher.update(body.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Outcome of checking a request against stored keys
pub enum Begin {
    /// Run the mutation. Holds the pending key when the request carried one.
    Proceed(Option<PendingKey>),
    /// Stored response to return as-is
    Replay(Response),
}

/// Key claimed by a request that has not produced a response yet.
#[derive(Debug)]
pub struct PendingKey {
    pub(crate) tenant_id: Uuid,
    pub(crate) key: String,
    pub(crate) path: String,
    pub(crate) hash: String,
}

/// Looks up the request's idempotency key, if any.
pub async fn begin(
    db: &DatabaseConnection,
    tenant_id: Uuid,
    headers: &HeaderMap,
    method: &Method,
    path: &str,
    body: &serde_json::Value,
) -> Result<Begin, ApiError> {
    let Some(key) = parse_key(headers)? else {
        return Ok(Begin::Proceed(None));
    };
    let hash = fingerprint(method, path, body);

    match IdempotencyKeyRepository::new(db).find(tenant_id, &key).await? {
        Some(stored) if stored.request_hash == hash => {
            tracing::info!(idempotency_key = %key, path, "Replaying stored response");
            metrics::counter!("idempotent_replays_total").increment(1);
            Ok(Begin::Replay(replay(stored.response_status, stored.response_body)))
        }
        Some(stored) => {
            tracing::warn!(
                idempotency_key = %key,
                stored_path = %stored.request_path,
                "Idempotency key reused for a different request"
            );
            Err(ApiError::conflict("Idempotency-Key was already used for a different request")
                .with_details(json!({ "idempotency_key": key })))
        }
        None => Ok(Begin::Proceed(Some(PendingKey {
            tenant_id,
            key,
            path: path.to_string(),
            hash,
        }))),
    }
}

impl PendingKey {
    /// Stores the response produced for this key on `conn`. Called inside the
    /// mutation's transaction, so a failure here rolls the mutation back.
    pub async fn record<C, T>(
        self,
        conn: &C,
        status: StatusCode,
        body: &T,
    ) -> Result<(), RepositoryError>
    where
        C: ConnectionTrait,
        T: Serialize,
    {
        let response_body = serde_json::to_value(body)
            .map_err(|err| DbErr::Custom(format!("Failed to serialize stored response: {err}")))?;

        store_in(
            conn,
            self.tenant_id,
            StoredResponse {
                key: self.key,
                request_path: self.path,
                request_hash: self.hash,
                response_status: status.as_u16(),
                response_body,
            },
        )
        .await
    }
}

fn replay(status: i32, body: serde_json::Value) -> Response {
    let status = u16::try_from(status)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(REPLAYED_HEADER, HeaderValue::from_static("true"));
    response
}
