// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure classes produced by the token validator and the two gates.
///
/// The user-visible message varies by class (an expired session reads
/// differently from a malformed token), but internal decode details never
/// cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token on the request
    MissingToken,
    /// Authorization header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// Token signature verified once, but the token is past its expiry
    TokenExpired,
    /// Token is structurally broken or carries a bad signature
    MalformedToken,
    /// Any other verification failure
    AuthFailed,
    /// Authenticated, but the token carries no resolvable role
    RoleMissing,
    /// Authenticated, but the role is not in the route's allowed set
    AccessDenied,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    message: String,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidAuthHeader
            | AuthError::TokenExpired
            | AuthError::MalformedToken
            | AuthError::AuthFailed => StatusCode::UNAUTHORIZED,
            AuthError::RoleMissing | AuthError::AccessDenied => StatusCode::FORBIDDEN,
        }
    }

    /// Short machine-oriented reason recorded in audit details.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing token",
            AuthError::InvalidAuthHeader => "invalid authorization header",
            AuthError::TokenExpired => "token expired",
            AuthError::MalformedToken => "malformed token",
            AuthError::AuthFailed => "verification failed",
            AuthError::RoleMissing => "role information missing from token",
            AuthError::AccessDenied => "role not permitted",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Access denied. No token provided."),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header (expected 'Bearer <token>').")
            }
            AuthError::TokenExpired => {
                write!(f, "Your session has ended. Please log in again.")
            }
            AuthError::MalformedToken => write!(f, "Invalid token. Please log in again."),
            AuthError::AuthFailed => write!(f, "Authentication failed."),
            AuthError::RoleMissing => {
                write!(f, "Access denied: role information is missing.")
            }
            AuthError::AccessDenied => {
                write!(f, "Access denied: your role does not permit this action.")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_token_returns_401_envelope() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Access denied. No token provided.");
    }

    #[tokio::test]
    async fn access_denied_returns_403() {
        let response = AuthError::AccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn expired_and_malformed_messages_differ() {
        assert_ne!(
            AuthError::TokenExpired.to_string(),
            AuthError::MalformedToken.to_string()
        );
    }
}
