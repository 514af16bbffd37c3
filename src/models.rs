// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Request and response bodies for the HTTP API.
//!
//! Account views never carry the password hash; the storage-level
//! [`Account`](crate::storage::Account) stays behind the repository
//! boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{Account, DocumentStatus};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Minimal account view embedded in the login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub role_id: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginData {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Defaults to the viewer role when omitted.
    pub role_id: Option<u64>,
}

/// Full account view for administration endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub role_id: u64,
    pub role_name: Option<String>,
    pub is_active: bool,
    pub failed_attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    pub fn from_account(account: Account, role_name: Option<String>) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role_id: account.role_id,
            role_name,
            is_active: account.is_active,
            failed_attempt_count: account.failed_attempt_count,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub description: Option<String>,
    pub markdown_content: String,
    pub status: Option<DocumentStatus>,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub markdown_content: Option<String>,
    pub status: Option<DocumentStatus>,
    pub version: Option<String>,
}
