// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Audit trail inspection (admin only).

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::{
    auth::{client_ip, AuthenticatedUser},
    error::ApiError,
    response::ApiResponse,
    state::AppState,
    storage::{AuditAction, AuditRecord, AuditRepository},
};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Maximum number of records to return (newest first). Capped at 1000.
    pub limit: Option<usize>,
}

/// List the most recent audit records, newest first.
///
/// Viewing the trail is itself audited (`VIEW_AUDIT_LOGS`), but the record
/// of this view is written after the listing is read, so it never shows up
/// in its own response.
#[utoipa::path(
    get,
    path = "/api/audit/all",
    params(AuditQuery),
    tag = "Audit",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recent audit records", body = ApiResponse<Vec<AuditRecord>>),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<AuditQuery>,
) -> Result<ApiResponse<Vec<AuditRecord>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let audit = AuditRepository::new(&state.db);

    let records = audit.list_recent(limit)?;
    let total = audit.count()?;

    audit.append(
        AuditRecord::new(AuditAction::ViewAuditLogs)
            .with_user(user.id)
            .with_table("audit_logs")
            .with_ip(client_ip(&headers))
            .with_details(json!({ "limit": limit })),
    )?;

    let returned = records.len();
    Ok(ApiResponse::new("Audit logs retrieved.", records)
        .with_metadata(json!({ "returned": returned, "total": total })))
}
