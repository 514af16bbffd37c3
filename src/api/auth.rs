// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Login, logout, and session inspection.
//!
//! The login handler is the one place credentials are checked. Its audit
//! records are written and committed before the HTTP response is produced,
//! so a crash right after a lockout can never lose the record that explains
//! it. Logout is the sole exception: its audit write is best-effort.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::json;

use crate::{
    auth::{client_ip, verify_password, AuthenticatedUser},
    error::ApiError,
    models::{LoginData, LoginRequest, UserSummary},
    response::ApiResponse,
    state::AppState,
    storage::{AuditAction, AuditRecord, AuditRepository, UserRepository},
};

fn append_audit(state: &AppState, record: AuditRecord) -> Result<(), ApiError> {
    AuditRepository::new(&state.db).append(record)?;
    Ok(())
}

/// Authenticate with username and password, producing a session token.
///
/// Outcomes, in evaluation order:
/// - unknown username: 401, no audit record (nothing to attribute);
/// - inactive account: 403, `LOGIN_BLOCKED_INACTIVE`, password never checked;
/// - wrong password: one failed attempt is charged; `ACCOUNT_LOCKED` and a
///   401 naming the lockout when this trips the threshold, otherwise
///   `LOGIN_FAILED` and a generic 401;
/// - match: failure counter reset, `USER_LOGIN`, token issued.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<LoginData>),
        (status = 401, description = "Invalid credentials, or account locked by this attempt"),
        (status = 403, description = "Account inactive"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let ip = client_ip(&headers);
    let users = UserRepository::new(&state.db);

    let Some(account) = users.find_by_username(&request.username)? else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials.",
        ));
    };

    if !account.is_active {
        append_audit(
            &state,
            AuditRecord::new(AuditAction::LoginBlockedInactive)
                .with_user(account.id)
                .with_ip(ip)
                .with_details(json!({ "username": account.username })),
        )?;
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Your account is inactive. Please contact an administrator.",
        ));
    }

    if !verify_password(&request.password, &account.password_hash) {
        let outcome = state.lockout.record_failure(&users, account.id)?;
        if outcome.locked {
            append_audit(
                &state,
                AuditRecord::new(AuditAction::AccountLocked)
                    .with_user(account.id)
                    .with_ip(ip)
                    .with_details(json!({
                        "username": account.username,
                        "failed_attempts": outcome.attempt_count,
                    })),
            )?;
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                format!(
                    "Account disabled after {} failed login attempts. \
                     Please contact an administrator.",
                    outcome.attempt_count
                ),
            ));
        }
        append_audit(
            &state,
            AuditRecord::new(AuditAction::LoginFailed)
                .with_user(account.id)
                .with_ip(ip)
                .with_details(json!({
                    "username": account.username,
                    "failed_attempts": outcome.attempt_count,
                    "attempts_remaining": outcome.remaining(state.lockout.max_failed_attempts()),
                })),
        )?;
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials.",
        ));
    }

    state.lockout.record_success(&users, &account)?;

    // Role name comes from the seeded roles table; a missing row falls
    // back to the least-privileged name.
    let role_name = state
        .db
        .role_name(account.role_id)?
        .unwrap_or_else(|| "viewer".to_string());
    let token = state
        .tokens
        .issue(account.id, account.role_id, &role_name, &account.username)
        .map_err(|_| ApiError::internal("Failed to issue session token."))?;

    append_audit(
        &state,
        AuditRecord::new(AuditAction::UserLogin)
            .with_user(account.id)
            .with_ip(ip)
            .with_details(json!({ "username": account.username.clone() })),
    )?;

    Ok(ApiResponse::new(
        "Login successful.",
        LoginData {
            token,
            user: UserSummary {
                id: account.id,
                username: account.username,
                role_id: account.role_id,
            },
        },
    ))
}

/// Invalidate the session on the client side.
///
/// Tokens are stateless, so there is nothing to revoke server-side; this
/// endpoint exists to audit the logout. It is public and never fails. A
/// `USER_LOGOUT` record is written only when the request carries a token
/// whose claims can still be decoded; a logout with no identity leaves no
/// trace. The write runs detached so a slow disk cannot delay the response.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse<()> {
    let claims = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| state.tokens.decode_unverified(token.trim()));

    if let Some(claims) = claims {
        let ip = client_ip(&headers);
        tokio::spawn(async move {
            let audit = AuditRepository::new(&state.db);
            let record = AuditRecord::new(AuditAction::UserLogout)
                .with_user(claims.sub)
                .with_ip(ip);
            if let Err(e) = audit.append(record) {
                tracing::error!(error = %e, "failed to write logout audit record");
            }
        });
    }

    ApiResponse::message_only("Logged out successfully.")
}

/// Return the identity bound to the presented token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<AuthenticatedUser>),
        (status = 401, description = "Invalid or missing token"),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<AuthenticatedUser>, ApiError> {
    append_audit(
        &state,
        AuditRecord::new(AuditAction::SessionCheck)
            .with_user(user.id)
            .with_ip(client_ip(&headers)),
    )?;
    Ok(ApiResponse::new("Session is valid.", user))
}
