// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! User administration endpoints (admin only).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::json;

use crate::{
    auth::{client_ip, hash_password, AuthenticatedUser, Role},
    error::ApiError,
    models::{RegisterRequest, ToggleActiveRequest, UserView},
    response::ApiResponse,
    state::AppState,
    storage::{
        AuditAction, AuditRecord, AuditRepository, NewAccount, StoreError, UserRepository,
        SYSTEM_ACCOUNT_ID,
    },
    validators::{validate_password, validate_username},
};

const USERS_TABLE: &str = "users";

fn append_audit(state: &AppState, record: AuditRecord) -> Result<(), ApiError> {
    AuditRepository::new(&state.db).append(record)?;
    Ok(())
}

fn view(state: &AppState, account: crate::storage::Account) -> UserView {
    let role_name = state
        .roles
        .resolve(account.role_id)
        .map(|role| role.as_str().to_string());
    UserView::from_account(account, role_name)
}

/// List all accounts.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All accounts", body = ApiResponse<Vec<UserView>>),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<Vec<UserView>>, ApiError> {
    let users = UserRepository::new(&state.db);
    let accounts: Vec<UserView> = users
        .list()?
        .into_iter()
        .map(|account| view(&state, account))
        .collect();

    append_audit(
        &state,
        AuditRecord::new(AuditAction::ReadAllUsers)
            .with_user(user.id)
            .with_table(USERS_TABLE)
            .with_ip(client_ip(&headers)),
    )?;

    let count = accounts.len();
    Ok(ApiResponse::new("Users retrieved.", accounts)
        .with_metadata(json!({ "count": count })))
}

/// Create an account.
///
/// Validation failures and username conflicts both audit as
/// `REGISTRATION_FAILED`; the conflict case reveals nothing about which
/// account exists beyond the generic message.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserView>),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Username already taken"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<UserView>), ApiError> {
    let ip = client_ip(&headers);

    if let Err(message) = validate_username(&request.username)
        .and_then(|()| validate_password(&request.password))
    {
        append_audit(
            &state,
            AuditRecord::new(AuditAction::RegistrationFailed)
                .with_user(actor.id)
                .with_table(USERS_TABLE)
                .with_ip(ip)
                .with_details(json!({
                    "username": request.username,
                    "reason": message,
                })),
        )?;
        return Err(ApiError::bad_request(message));
    }

    let role_id = request.role_id.unwrap_or_else(|| {
        state.roles.id_of(Role::Viewer).unwrap_or(1)
    });
    if state.roles.resolve(role_id).is_none() {
        return Err(ApiError::bad_request("Unknown role id."));
    }

    let password_hash =
        hash_password(&request.password).map_err(|_| ApiError::internal("Hashing failed."))?;

    let users = UserRepository::new(&state.db);
    let account = match users.create(NewAccount {
        username: request.username.clone(),
        password_hash,
        role_id,
        is_active: true,
    }) {
        Ok(account) => account,
        Err(StoreError::Conflict(_)) => {
            append_audit(
                &state,
                AuditRecord::new(AuditAction::RegistrationFailed)
                    .with_user(actor.id)
                    .with_table(USERS_TABLE)
                    .with_ip(ip)
                    .with_details(json!({
                        "username": request.username,
                        "reason": "username already taken",
                    })),
            )?;
            return Err(ApiError::conflict("Username is already taken."));
        }
        Err(other) => return Err(other.into()),
    };

    append_audit(
        &state,
        AuditRecord::new(AuditAction::UserCreated)
            .with_user(actor.id)
            .with_table(USERS_TABLE)
            .with_record(account.id)
            .with_ip(ip)
            .with_details(json!({ "username": account.username.clone(), "role_id": role_id })),
    )?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("User created.", view(&state, account)),
    ))
}

/// Activate or deactivate an account.
///
/// Re-activation clears the lockout counter; this is the recovery path for
/// a locked-out account. The system account cannot be toggled.
#[utoipa::path(
    put,
    path = "/api/users/{id}/active",
    params(("id" = u64, Path, description = "Account id")),
    request_body = ToggleActiveRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserView>),
        (status = 404, description = "No such account"),
    )
)]
pub async fn toggle_active(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<ToggleActiveRequest>,
) -> Result<ApiResponse<UserView>, ApiError> {
    let ip = client_ip(&headers);

    let refusal = if id == SYSTEM_ACCOUNT_ID {
        Some(("system account is reserved", "The system account cannot be modified."))
    } else if id == actor.id && !request.is_active {
        Some(("self-deactivation", "You cannot deactivate your own account."))
    } else {
        None
    };
    if let Some((reason, message)) = refusal {
        append_audit(
            &state,
            AuditRecord::new(AuditAction::UserToggleFailed)
                .with_user(actor.id)
                .with_table(USERS_TABLE)
                .with_record(id)
                .with_ip(ip)
                .with_details(json!({ "reason": reason })),
        )?;
        return Err(ApiError::bad_request(message));
    }

    let users = UserRepository::new(&state.db);
    let account = match users.set_active(id, request.is_active) {
        Ok(account) => account,
        Err(StoreError::NotFound(_)) => {
            append_audit(
                &state,
                AuditRecord::new(AuditAction::UserToggleFailed)
                    .with_user(actor.id)
                    .with_table(USERS_TABLE)
                    .with_record(id)
                    .with_ip(ip)
                    .with_details(json!({ "reason": "account not found" })),
            )?;
            return Err(ApiError::not_found("No such account."));
        }
        Err(other) => return Err(other.into()),
    };

    let action = if account.is_active {
        AuditAction::UserActivated
    } else {
        AuditAction::UserDeactivated
    };
    append_audit(
        &state,
        AuditRecord::new(action)
            .with_user(actor.id)
            .with_table(USERS_TABLE)
            .with_record(account.id)
            .with_ip(ip)
            .with_details(json!({ "username": account.username.clone() })),
    )?;

    let message = if account.is_active {
        "User activated."
    } else {
        "User deactivated."
    };
    Ok(ApiResponse::new(message, view(&state, account)))
}

/// Delete an account. The system account cannot be deleted.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "Account id")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 404, description = "No such account"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Extension(actor): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<()>, ApiError> {
    if id == SYSTEM_ACCOUNT_ID {
        return Err(ApiError::bad_request("The system account cannot be deleted."));
    }

    let users = UserRepository::new(&state.db);
    let account = users.delete(id)?;

    append_audit(
        &state,
        AuditRecord::new(AuditAction::UserDeleted)
            .with_user(actor.id)
            .with_table(USERS_TABLE)
            .with_record(account.id)
            .with_ip(client_ip(&headers))
            .with_details(json!({ "username": account.username })),
    )?;

    Ok(ApiResponse::message_only("User deleted."))
}
