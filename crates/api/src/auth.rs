//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs carrying the user ID and admin flag. Handlers take a
//! [`Caller`] or [`AdminCaller`] argument to require authentication.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use common::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use store::Store;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::AppState;

/// Errors from issuing or checking tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token could not be signed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("invalid or expired token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: Uuid,
    is_admin: bool,
    iat: i64,
    exp: i64,
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub is_admin: bool,
}

/// A [`Caller`] that is known to be an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminCaller(pub Caller);

/// Issues and validates signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Signs a token that expires after the configured TTL.
    pub fn issue(&self, user_id: UserId, is_admin: bool) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: user_id.as_uuid(),
            is_admin,
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Checks signature and expiry and returns who the token belongs to.
    pub fn resolve_caller(&self, token: &str) -> Result<Caller, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(AuthError::Invalid)?;

        Ok(Caller {
            user_id: UserId::from_uuid(data.claims.user_id),
            is_admin: data.claims.is_admin,
        })
    }
}

fn extract_bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts).ok_or_else(|| {
            ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

        state.tokens.resolve_caller(token).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }
}

impl<S: Store> FromRequestParts<Arc<AppState<S>>> for AdminCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if !caller.is_admin {
            return Err(ApiError::Forbidden(
                "Access denied: Admin privilege required".to_string(),
            ));
        }
        Ok(AdminCaller(caller))
    }
}
