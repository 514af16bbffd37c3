// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Document persistence: versioned Markdown documents addressed by slug.
//!
//! The slug is derived from the title and the checksum is the SHA-256 of
//! the Markdown content, recomputed whenever the content changes.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::db::{next_id, Db, StoreError, StoreResult, COUNTERS, DOCUMENTS, SLUG_INDEX};

const DOCUMENT_COUNTER: &str = "next_document_id";

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Approved,
    Archived,
}

/// A versioned Markdown document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: u64,
    pub title: String,
    /// URL-safe identifier derived from the title; unique.
    pub slug: String,
    pub description: Option<String>,
    pub markdown_content: String,
    pub status: DocumentStatus,
    pub version: String,
    /// SHA-256 hex of `markdown_content`.
    pub checksum: String,
    pub created_by: u64,
    pub updated_by: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a document.
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub markdown_content: String,
    pub status: DocumentStatus,
    pub version: String,
    pub created_by: u64,
}

/// Partial update; `None` fields are left untouched.
#[derive(Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub markdown_content: Option<String>,
    pub status: Option<DocumentStatus>,
    pub version: Option<String>,
}

/// Derive a URL-safe slug from a title: lowercase, strip everything outside
/// `[a-z0-9 -]`, collapse whitespace/hyphen runs into single hyphens.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        match c {
            'a'..='z' | '0'..='9' => {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            }
            ' ' | '-' | '\t' | '\n' => pending_hyphen = true,
            _ => {}
        }
    }
    slug
}

/// SHA-256 hex digest of document content.
pub fn content_checksum(markdown: &str) -> String {
    let digest = Sha256::digest(markdown.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Repository for documents.
pub struct DocumentRepository<'a> {
    db: &'a Db,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Create a document. Fails with `Conflict` when the derived slug is
    /// already in use.
    pub fn create(&self, new: NewDocument) -> StoreResult<Document> {
        let slug = slugify(&new.title);
        let write_txn = self.db.begin_write()?;
        let document = {
            let mut index = write_txn.open_table(SLUG_INDEX)?;
            let taken = index.get(slug.as_str())?.is_some();
            if taken {
                return Err(StoreError::Conflict(format!("slug '{slug}' already in use")));
            }

            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = next_id(&mut counters, DOCUMENT_COUNTER)?;
            drop(counters);

            let now = Utc::now();
            let document = Document {
                id,
                checksum: content_checksum(&new.markdown_content),
                title: new.title,
                slug: slug.clone(),
                description: new.description,
                markdown_content: new.markdown_content,
                status: new.status,
                version: new.version,
                created_by: new.created_by,
                updated_by: new.created_by,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&document)?;
            let mut docs = write_txn.open_table(DOCUMENTS)?;
            docs.insert(id, json.as_slice())?;
            index.insert(slug.as_str(), id)?;
            document
        };
        write_txn.commit()?;
        Ok(document)
    }

    pub fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SLUG_INDEX)?;
        let Some(id) = index.get(slug)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let docs = read_txn.open_table(DOCUMENTS)?;
        match docs.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> StoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let docs = read_txn.open_table(DOCUMENTS)?;
        let mut documents = Vec::new();
        for entry in docs.range(0..=u64::MAX)? {
            let (_, value) = entry?;
            documents.push(serde_json::from_slice(value.value())?);
        }
        Ok(documents)
    }

    /// Apply a patch to the document at `slug`. A title change re-derives
    /// the slug; a content change recomputes the checksum. Both the row and
    /// the slug index update in one transaction.
    pub fn update_by_slug(
        &self,
        slug: &str,
        patch: DocumentPatch,
        updated_by: u64,
    ) -> StoreResult<Document> {
        let write_txn = self.db.begin_write()?;
        let document = {
            let mut index = write_txn.open_table(SLUG_INDEX)?;
            let id = index
                .get(slug)?
                .map(|v| v.value())
                .ok_or_else(|| StoreError::NotFound(format!("document '{slug}'")))?;

            let mut docs = write_txn.open_table(DOCUMENTS)?;
            let bytes = {
                let existing = docs
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("document {id}")))?;
                existing.value().to_vec()
            };
            let mut document: Document = serde_json::from_slice(&bytes)?;

            if let Some(content) = patch.markdown_content {
                if content != document.markdown_content {
                    document.checksum = content_checksum(&content);
                }
                document.markdown_content = content;
            }
            if let Some(title) = patch.title {
                if title != document.title {
                    let new_slug = slugify(&title);
                    if new_slug != document.slug {
                        let conflict = index.get(new_slug.as_str())?.is_some();
                        if conflict {
                            return Err(StoreError::Conflict(format!(
                                "slug '{new_slug}' already in use"
                            )));
                        }
                        index.remove(document.slug.as_str())?;
                        index.insert(new_slug.as_str(), id)?;
                        document.slug = new_slug;
                    }
                }
                document.title = title;
            }
            if let Some(description) = patch.description {
                document.description = Some(description);
            }
            if let Some(status) = patch.status {
                document.status = status;
            }
            if let Some(version) = patch.version {
                document.version = version;
            }
            document.updated_by = updated_by;
            document.updated_at = Utc::now();

            let json = serde_json::to_vec(&document)?;
            docs.insert(id, json.as_slice())?;
            document
        };
        write_txn.commit()?;
        Ok(document)
    }
}
