// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Stateless session tokens (HS256 JWT).
//!
//! Tokens are the only session state the server holds: validity is
//! re-checked on every request and nothing is cached beyond the token
//! itself. There is no server-side revocation; logout is a client-side
//! token discard and issued tokens stay valid until natural expiry.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::roles::Role;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: u64,
    /// Persisted role id
    pub role_id: u64,
    /// Role name resolved at issue time
    pub role_name: String,
    /// Username at issue time
    pub username: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Identity attached to a request by the authentication gate.
///
/// Lives in request extensions for the lifetime of one request; downstream
/// handlers trust it because the gate is the only place signatures are
/// verified.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AuthenticatedUser {
    pub id: u64,
    pub role_id: u64,
    /// `None` when the token's role id maps to no known role.
    pub role: Option<Role>,
    pub username: String,
}

/// Issues and validates signed session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    /// Issue a token for a freshly authenticated account.
    pub fn issue(
        &self,
        id: u64,
        role_id: u64,
        role_name: &str,
        username: &str,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: id,
            role_id,
            role_name: role_name.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::AuthFailed)
    }

    /// Verify signature and expiry, yielding the embedded claims.
    ///
    /// Failures are classified: expired, malformed/bad-signature, other.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => AuthError::MalformedToken,
                _ => AuthError::AuthFailed,
            })
    }

    /// Decode claims without verifying the signature or expiry.
    ///
    /// Used only to attribute an audit record to the (stale) identity inside
    /// an invalid token. Never proof of identity.
    pub fn decode_unverified(&self, token: &str) -> Option<Claims> {
        jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
            .ok()
            .map(|data| data.claims)
    }
}
