// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Append-only audit trail of security-relevant decisions.
//!
//! Records are immutable once written: the repository exposes append and
//! read operations only. Every access-control decision (auth failure,
//! denial, lockout, login) produces exactly one record, written and
//! committed before the HTTP response is sent — except logout, which is
//! deliberately best-effort (see `api::auth::logout`).

use chrono::{DateTime, Utc};
use redb::ReadableTableMetadata;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::db::{next_id, Db, StoreResult, AUDIT_LOGS, COUNTERS};

const AUDIT_COUNTER: &str = "next_audit_id";

/// Action tags for auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Login flow
    UserLogin,
    LoginFailed,
    AccountLocked,
    LoginBlockedInactive,
    UserLogout,
    SessionCheck,

    // Gates
    AuthFailed,
    AuthenticationFailed,
    AccessDenied,

    // User administration
    RegistrationFailed,
    UserCreated,
    UserActivated,
    UserDeactivated,
    UserToggleFailed,
    UserDeleted,
    ReadAllUsers,
    ViewAuditLogs,

    // Documents
    CreateDocument,
    CreateDocumentFailed,
    UpdateDocument,
}

/// An immutable audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditRecord {
    /// Monotonic record id, assigned at append time.
    pub id: u64,
    /// Acting account, if attributable. `None` only for pre-authentication
    /// failures with no safe attribution (e.g. registration conflicts).
    pub user_id: Option<u64>,
    /// What kind of decision this records.
    pub action: AuditAction,
    /// Subject table, if the decision concerned a stored entity.
    pub table_name: Option<String>,
    /// Subject row id within `table_name`.
    pub record_id: Option<u64>,
    /// Caller IP, best effort.
    pub ip_address: Option<String>,
    /// Free-form structured detail.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: 0,
            user_id: None,
            action,
            table_name: None,
            record_id: None,
            ip_address: None,
            details: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_record(mut self, record_id: u64) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Repository for audit records.
pub struct AuditRepository<'a> {
    db: &'a Db,
}

impl<'a> AuditRepository<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Append one record; id assignment and insert commit atomically.
    /// Returns the assigned id.
    pub fn append(&self, mut record: AuditRecord) -> StoreResult<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = next_id(&mut counters, AUDIT_COUNTER)?;
            drop(counters);

            record.id = id;
            let json = serde_json::to_vec(&record)?;
            let mut table = write_txn.open_table(AUDIT_LOGS)?;
            table.insert(id, json.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Newest-first listing, capped at `limit`.
    pub fn list_recent(&self, limit: usize) -> StoreResult<Vec<AuditRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOGS)?;
        let mut records = Vec::new();
        for entry in table.range(0..=u64::MAX)?.rev() {
            if records.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Total number of records ever written.
    pub fn count(&self) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOGS)?;
        Ok(table.len()? as usize)
    }
}
