// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Document endpoints. Reads are open to every role; writes require the
//! editor or admin role (enforced by the route's gate).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde_json::json;

use crate::{
    auth::{client_ip, AuthenticatedUser},
    error::ApiError,
    models::{CreateDocumentRequest, UpdateDocumentRequest},
    response::ApiResponse,
    state::AppState,
    storage::{
        AuditAction, AuditRecord, AuditRepository, Document, DocumentPatch, DocumentRepository,
        DocumentStatus, NewDocument, StoreError,
    },
};

const DOCUMENTS_TABLE: &str = "documents";

fn append_audit(state: &AppState, record: AuditRecord) -> Result<(), ApiError> {
    AuditRepository::new(&state.db).append(record)?;
    Ok(())
}

/// List all documents.
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "Documents",
    security(("bearer" = [])),
    responses((status = 200, description = "All documents", body = ApiResponse<Vec<Document>>))
)]
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Document>>, ApiError> {
    let documents = DocumentRepository::new(&state.db).list()?;
    let count = documents.len();
    Ok(ApiResponse::new("Documents retrieved.", documents)
        .with_metadata(json!({ "count": count })))
}

/// Fetch one document by slug.
#[utoipa::path(
    get,
    path = "/api/documents/{slug}",
    params(("slug" = String, Path, description = "Document slug")),
    tag = "Documents",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The document", body = ApiResponse<Document>),
        (status = 404, description = "No such document"),
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<Document>, ApiError> {
    let document = DocumentRepository::new(&state.db)
        .find_by_slug(&slug)?
        .ok_or_else(|| ApiError::not_found("No such document."))?;
    Ok(ApiResponse::new("Document retrieved.", document))
}

/// Create a document. The slug is derived from the title.
#[utoipa::path(
    post,
    path = "/api/documents",
    request_body = CreateDocumentRequest,
    tag = "Documents",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Document created", body = ApiResponse<Document>),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Slug already in use"),
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, ApiResponse<Document>), ApiError> {
    let ip = client_ip(&headers);

    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title must not be empty."));
    }
    if crate::storage::slugify(&request.title).is_empty() {
        return Err(ApiError::bad_request(
            "Title must contain at least one letter or digit.",
        ));
    }

    let docs = DocumentRepository::new(&state.db);
    let document = match docs.create(NewDocument {
        title: request.title.clone(),
        description: request.description,
        markdown_content: request.markdown_content,
        status: request.status.unwrap_or(DocumentStatus::Draft),
        version: request.version.unwrap_or_else(|| "1.0".to_string()),
        created_by: actor.id,
    }) {
        Ok(document) => document,
        Err(StoreError::Conflict(_)) => {
            append_audit(
                &state,
                AuditRecord::new(AuditAction::CreateDocumentFailed)
                    .with_user(actor.id)
                    .with_table(DOCUMENTS_TABLE)
                    .with_ip(ip)
                    .with_details(json!({
                        "title": request.title,
                        "reason": "slug already in use",
                    })),
            )?;
            return Err(ApiError::conflict(
                "A document with this title already exists.",
            ));
        }
        Err(other) => return Err(other.into()),
    };

    append_audit(
        &state,
        AuditRecord::new(AuditAction::CreateDocument)
            .with_user(actor.id)
            .with_table(DOCUMENTS_TABLE)
            .with_record(document.id)
            .with_ip(ip)
            .with_details(json!({ "slug": document.slug.clone(), "title": document.title.clone() })),
    )?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Document created.", document),
    ))
}

/// Update a document by slug. A title change moves the document to a new
/// slug; a content change recomputes the stored checksum.
#[utoipa::path(
    put,
    path = "/api/documents/{slug}",
    params(("slug" = String, Path, description = "Document slug")),
    request_body = UpdateDocumentRequest,
    tag = "Documents",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Document updated", body = ApiResponse<Document>),
        (status = 404, description = "No such document"),
        (status = 409, description = "New title collides with an existing slug"),
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<ApiResponse<Document>, ApiError> {
    let docs = DocumentRepository::new(&state.db);
    let document = docs.update_by_slug(
        &slug,
        DocumentPatch {
            title: request.title,
            description: request.description,
            markdown_content: request.markdown_content,
            status: request.status,
            version: request.version,
        },
        actor.id,
    )?;

    append_audit(
        &state,
        AuditRecord::new(AuditAction::UpdateDocument)
            .with_user(actor.id)
            .with_table(DOCUMENTS_TABLE)
            .with_record(document.id)
            .with_ip(client_ip(&headers))
            .with_details(json!({ "slug": document.slug.clone() })),
    )?;

    Ok(ApiResponse::new("Document updated.", document))
}
