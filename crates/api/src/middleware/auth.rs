//! # Authentication Module
//!
//! Bearer-token identity for the owner-facing endpoints. Tokens are HS256
//! JWTs carrying the caller's user id in a `userId` claim; the
//! [`AuthUser`] extractor rejects requests without a valid one.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use schedlite_core::errors::{SchedError, SchedResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

/// Turns a bearer token into the id of the user it was issued to.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> SchedResult<Uuid>;
}

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: Uuid,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

pub struct JwtVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issues a token for `user_id` that expires after `ttl`.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> SchedResult<String> {
        let claims = TokenClaims {
            user_id,
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SchedError::Internal(Box::new(e)))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> SchedResult<Uuid> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                SchedError::Authentication("Invalid or expired token.".to_string())
            })
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| SchedError::Authentication("Missing bearer token.".to_string()))?;
        let user_id = state.identity.verify(token)?;
        Ok(AuthUser(user_id))
    }
}
