// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! HTTP surface.
//!
//! Routes are grouped by required role and each group carries its own gate
//! pair: `authenticate` verifies the token, then `authorize` checks the
//! role. The login, logout, and health endpoints are the only public ones.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{authenticate, authorize, AuthenticatedUser, Role, RoleGate, RoleSet},
    models::{
        CreateDocumentRequest, LoginData, LoginRequest, RegisterRequest, ToggleActiveRequest,
        UpdateDocumentRequest, UserSummary, UserView,
    },
    state::AppState,
    storage::{AuditAction, AuditRecord, Document, DocumentStatus},
};

pub mod audit;
pub mod auth;
pub mod documents;
pub mod health;
pub mod users;

/// Attach both gates to a route group: `authenticate` runs first (outer
/// layer), then `authorize` with the given role set.
fn guarded(routes: Router<AppState>, state: &AppState, allowed: RoleSet) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(state.clone(), allowed),
            authorize,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health", get(health::health));

    let any_role = guarded(
        Router::new()
            .route("/auth/me", get(auth::me))
            .route("/documents", get(documents::list_documents))
            .route("/documents/{slug}", get(documents::get_document)),
        &state,
        RoleSet::any(),
    );

    let editors = guarded(
        Router::new()
            .route("/documents", post(documents::create_document))
            .route("/documents/{slug}", put(documents::update_document)),
        &state,
        RoleSet::of(&[Role::Admin, Role::Editor]),
    );

    let admin = guarded(
        Router::new()
            .route("/users", get(users::list_users).post(users::register))
            .route("/users/{id}/active", put(users::toggle_active))
            .route("/users/{id}", delete(users::delete_user))
            .route("/audit/all", get(audit::list_audit_logs)),
        &state,
        RoleSet::of(&[Role::Admin]),
    );

    let api = public
        .merge(any_role)
        .merge(editors)
        .merge(admin)
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::logout,
        auth::me,
        users::list_users,
        users::register,
        users::toggle_active,
        users::delete_user,
        documents::list_documents,
        documents::get_document,
        documents::create_document,
        documents::update_document,
        audit::list_audit_logs,
        health::health
    ),
    components(
        schemas(
            LoginRequest,
            LoginData,
            UserSummary,
            RegisterRequest,
            UserView,
            ToggleActiveRequest,
            CreateDocumentRequest,
            UpdateDocumentRequest,
            Document,
            DocumentStatus,
            AuditRecord,
            AuditAction,
            AuthenticatedUser,
            health::HealthData
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, logout, session inspection"),
        (name = "Users", description = "Account administration"),
        (name = "Documents", description = "Versioned Markdown documents"),
        (name = "Audit", description = "Audit trail inspection"),
        (name = "Health", description = "Liveness")
    )
)]
struct ApiDoc;

/// Registers the `bearer` scheme that protected paths reference in their
/// `security` clauses.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
