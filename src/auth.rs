//! # Authentication and Authorization
//!
//! Bearer JWT authentication (HS256) and role checks for protected API endpoints.
//! The token carries the caller's tenant, so every downstream query is scoped by the
//! [`AuthContext`] the middleware places in the request extensions.

use std::{
    fmt,
    str::FromStr,
    sync::Arc,
    time::{SystemTime, SystemTimeError, UNIX_EPOCH},
};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, forbidden, unauthorized};

/// Roles recognised by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
    Finance,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Finance => "finance",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "agent" => Ok(Role::Agent),
            "finance" => Ok(Role::Finance),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!(
                "unknown role '{other}' (expected admin, agent, finance or viewer)"
            )),
        }
    }
}

/// Roles allowed to change CRM records, the catalog, rates, quotations and manual quotes.
pub const CRM_WRITERS: &[Role] = &[Role::Admin, Role::Agent];
/// Roles allowed to record payments and exchange rates.
pub const FINANCE_WRITERS: &[Role] = &[Role::Admin, Role::Finance];
pub const ADMINS: &[Role] = &[Role::Admin];

/// JWT claims issued to API callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID (subject)
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("system clock is before the unix epoch: {0}")]
    Clock(#[from] SystemTimeError),
    #[error("failed to encode token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Issues and validates HS256 bearer tokens.
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_seconds: u64,
}

impl JwtManager {
    pub fn new(secret: &str, expiration_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_seconds,
        }
    }

    /// Mints a token; `ttl_seconds` overrides the configured lifetime.
    pub fn issue(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        role: Role,
        ttl_seconds: Option<u64>,
    ) -> Result<String, TokenError> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = Claims {
            sub: user_id,
            tenant_id,
            role,
            iat: now,
            exp: now + ttl_seconds.unwrap_or(self.expiration_seconds),
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }

    /// Verifies the signature and expiry and returns the claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(token_data.claims)
    }
}

/// Authenticated caller, available to handlers as an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}

impl AuthContext {
    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user_id,
            tenant_id = %self.tenant_id,
            role = %self.role,
            "Role not permitted for operation"
        );
        Err(forbidden(Some(&format!(
            "Role '{}' is not allowed to perform this operation",
            self.role
        ))))
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }
}

/// Authentication middleware that validates bearer tokens
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;

    let claims = jwt.validate(token).map_err(|err| {
        tracing::debug!(error = %err, "Rejected bearer token");
        unauthorized(Some("Invalid or expired bearer token"))
    })?;

    let context = AuthContext::from(claims);
    tracing::debug!(
        tenant_id = %context.tenant_id,
        user_id = %context.user_id,
        role = %context.role,
        "Authenticated request"
    );

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes";

    fn jwt() -> Arc<JwtManager> {
        Arc::new(JwtManager::new(SECRET, 3600))
    }

    async fn run_middleware(jwt: Arc<JwtManager>, request: Request<Body>) -> Response {
        async fn handler(auth: AuthContext) -> String {
            auth.role.to_string()
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(jwt, auth_middleware))
            .oneshot(request)
            .await
            .unwrap()
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Finance".parse::<Role>().unwrap(), Role::Finance);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let jwt = jwt();
        let user = Uuid::new_v4();
        let tenant = Uuid::new_v4();

        let token = jwt.issue(user, tenant, Role::Agent, None).unwrap();
        let claims = jwt.validate(&token).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.tenant_id, tenant);
        assert_eq!(claims.role, Role::Agent);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = JwtManager::new("another-secret-that-is-32-bytes-long!", 3600);
        let token = other
            .issue(Uuid::new_v4(), Uuid::new_v4(), Role::Admin, None)
            .unwrap();

        assert!(jwt().validate(&token).is_err());
    }

    #[test]
    fn require_any_enforces_roles() {
        let viewer = AuthContext {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Viewer,
        };
        let err = viewer.require_any(CRM_WRITERS).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let finance = AuthContext {
            role: Role::Finance,
            ..viewer
        };
        assert!(finance.require_any(FINANCE_WRITERS).is_ok());
        assert!(finance.require_any(ADMINS).is_err());
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = run_middleware(jwt(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dGVzdDoxMjM=")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(jwt(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_returns_401() {
        let jwt = jwt();
        let claims = Claims {
            sub: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Admin,
            iat: 1_000,
            exp: 2_000,
        };
        let token = jwt.encode_claims(&claims).unwrap();

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(jwt, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_request_passes_through() {
        let jwt = jwt();
        let token = jwt
            .issue(Uuid::new_v4(), Uuid::new_v4(), Role::Finance, None)
            .unwrap();

        let request = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(jwt, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
