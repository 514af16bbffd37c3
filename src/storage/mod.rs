// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Embedded persistence built on redb.
//!
//! One database file holds every table; repositories borrow the shared
//! [`Db`] handle and run each operation in its own transaction.

pub mod audit;
pub mod db;
pub mod documents;
pub mod users;

pub use audit::{AuditAction, AuditRecord, AuditRepository};
pub use db::{Db, StoreError, StoreResult};
pub use documents::{
    content_checksum, slugify, Document, DocumentPatch, DocumentRepository, DocumentStatus,
    NewDocument,
};
pub use users::{Account, NewAccount, UserRepository, SYSTEM_ACCOUNT_ID, SYSTEM_USERNAME};
