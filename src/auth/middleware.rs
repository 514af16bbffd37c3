// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Authentication and authorization gates for Axum.
//!
//! Two middleware run back to back on protected routes:
//!
//! 1. [`authenticate`] verifies the bearer token and attaches an
//!    [`AuthenticatedUser`] to the request extensions.
//! 2. [`authorize`] (parameterized by a [`RoleGate`]) checks that the
//!    authenticated role is in the route's allowed set.
//!
//! Every rejection past the missing-header case produces exactly one audit
//! record, committed before the error response leaves the server.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::state::AppState;
use crate::storage::{AuditAction, AuditRecord, AuditRepository, SYSTEM_ACCOUNT_ID};

use super::error::AuthError;
use super::roles::RoleSet;
use super::token::AuthenticatedUser;

/// One protected route's authorization policy: which roles may pass.
#[derive(Clone)]
pub struct RoleGate {
    pub state: AppState,
    pub allowed: RoleSet,
}

impl RoleGate {
    pub fn new(state: AppState, allowed: RoleSet) -> Self {
        Self { state, allowed }
    }
}

/// Best-effort caller address: first entry of `x-forwarded-for` when the
/// server sits behind a proxy.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = forwarded.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

fn append_audit(state: &AppState, record: AuditRecord) {
    let audit = AuditRepository::new(&state.db);
    if let Err(e) = audit.append(record) {
        tracing::error!(error = %e, "failed to write audit record");
    }
}

/// Authentication gate.
///
/// A request with no `Authorization` header is turned away without an audit
/// record; a request that *presented* a token which fails verification is
/// audited as `AUTH_FAILED`, attributed to the identity claimed inside the
/// token when it can still be decoded, otherwise to the system account.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(err) => return err.into_response(),
    };

    match state.tokens.verify(&token) {
        Ok(claims) => {
            let user = AuthenticatedUser {
                id: claims.sub,
                role_id: claims.role_id,
                role: state.roles.resolve(claims.role_id),
                username: claims.username,
            };
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            let claimed_id = state
                .tokens
                .decode_unverified(&token)
                .map(|claims| claims.sub)
                .unwrap_or(SYSTEM_ACCOUNT_ID);
            append_audit(
                &state,
                AuditRecord::new(AuditAction::AuthFailed)
                    .with_user(claimed_id)
                    .with_ip(client_ip(request.headers()))
                    .with_details(json!({
                        "reason": err.reason(),
                        "attempted_endpoint": request.uri().path(),
                    })),
            );
            err.into_response()
        }
    }
}

/// Authorization gate. Must run after [`authenticate`]; a request arriving
/// here without an attached identity is rejected outright.
pub async fn authorize(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<AuthenticatedUser>().cloned() else {
        return AuthError::AuthFailed.into_response();
    };

    let endpoint = request.uri().path().to_string();
    let ip = client_ip(request.headers());

    let Some(role) = user.role else {
        append_audit(
            &gate.state,
            AuditRecord::new(AuditAction::AuthenticationFailed)
                .with_user(user.id)
                .with_ip(ip)
                .with_details(json!({
                    "reason": AuthError::RoleMissing.reason(),
                    "attempted_endpoint": endpoint,
                })),
        );
        return AuthError::RoleMissing.into_response();
    };

    if !gate.allowed.allows(role) {
        append_audit(
            &gate.state,
            AuditRecord::new(AuditAction::AccessDenied)
                .with_user(user.id)
                .with_ip(ip)
                .with_details(json!({
                    "attempted_endpoint": endpoint,
                    "user_role": role.as_str(),
                    "required_roles": gate.allowed.describe(),
                })),
        );
        return AuthError::AccessDenied.into_response();
    }

    next.run(request).await
}
