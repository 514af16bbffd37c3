// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Health endpoint for liveness probes. Unauthenticated.

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{response::ApiResponse, state::AppState, storage::AuditRepository};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// Whether the embedded database answers a read.
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Service health", body = ApiResponse<HealthData>))
)]
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let database = match AuditRepository::new(&state.db).count() {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "health check database read failed");
            "unavailable"
        }
    };
    let status = if database == "ok" { "ok" } else { "degraded" };
    ApiResponse::new(
        "Health check.",
        HealthData {
            status: status.to_string(),
            database: database.to_string(),
        },
    )
}
