// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: account id → serialized Account (JSON bytes)
//! - `username_index`: username → account id
//! - `roles`: role id → role name (seeded once at startup)
//! - `audit_logs`: record id → serialized AuditRecord
//! - `documents`: document id → serialized Document
//! - `slug_index`: slug → document id
//! - `counters`: name → next id watermark
//!
//! redb serializes write transactions, which is what gives the lockout
//! counter its per-account atomicity under concurrent login attempts.

use std::path::Path;

use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use crate::auth::roles::RoleRegistry;

pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
pub(crate) const USERNAME_INDEX: TableDefinition<&str, u64> =
    TableDefinition::new("username_index");
pub(crate) const ROLES: TableDefinition<u64, &str> = TableDefinition::new("roles");
pub(crate) const AUDIT_LOGS: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_logs");
pub(crate) const DOCUMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("documents");
pub(crate) const SLUG_INDEX: TableDefinition<&str, u64> = TableDefinition::new("slug_index");
pub(crate) const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the embedded database. Shared across repositories via `Arc`.
pub struct Db {
    db: redb::Database,
}

impl Db {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
            let _ = write_txn.open_table(ROLES)?;
            let _ = write_txn.open_table(AUDIT_LOGS)?;
            let _ = write_txn.open_table(DOCUMENTS)?;
            let _ = write_txn.open_table(SLUG_INDEX)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> StoreResult<redb::WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub(crate) fn begin_read(&self) -> StoreResult<redb::ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Seed the fixed role rows. Idempotent; never altered by request traffic.
    pub fn seed_roles(&self, registry: &RoleRegistry) -> StoreResult<()> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(ROLES)?;
            for (id, role) in registry.entries() {
                let exists = table.get(id)?.is_some();
                if !exists {
                    table.insert(id, role.as_str())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Resolve a role id against the seeded rows.
    pub fn role_name(&self, role_id: u64) -> StoreResult<Option<String>> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ROLES)?;
        Ok(table.get(role_id)?.map(|v| v.value().to_string()))
    }
}

/// Bump and return the next value of a named id counter.
///
/// Must be called inside the same write transaction as the insert that uses
/// the id, so assignment and use commit together.
pub(crate) fn next_id(
    counters: &mut redb::Table<&str, u64>,
    name: &str,
) -> StoreResult<u64> {
    let next = counters.get(name)?.map_or(0, |v| v.value()) + 1;
    counters.insert(name, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;

    fn temp_db() -> (Db, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn seed_roles_is_idempotent() {
        let (db, _dir) = temp_db();
        let registry = RoleRegistry::default();

        db.seed_roles(&registry).unwrap();
        db.seed_roles(&registry).unwrap();

        assert_eq!(db.role_name(1).unwrap().as_deref(), Some("viewer"));
        assert_eq!(db.role_name(2).unwrap().as_deref(), Some("editor"));
        assert_eq!(db.role_name(3).unwrap().as_deref(), Some("admin"));
        assert_eq!(db.role_name(42).unwrap(), None);
    }

    #[test]
    fn custom_registry_seeds_custom_ids() {
        let (db, _dir) = temp_db();
        let registry =
            RoleRegistry::new(std::collections::HashMap::from([(9, Role::Admin)]));
        db.seed_roles(&registry).unwrap();
        assert_eq!(db.role_name(9).unwrap().as_deref(), Some("admin"));
        assert_eq!(db.role_name(1).unwrap(), None);
    }

    #[test]
    fn counters_are_monotonic() {
        let (db, _dir) = temp_db();

        for expected in 1..=3u64 {
            let write_txn = db.begin_write().unwrap();
            let id = {
                let mut counters = write_txn.open_table(COUNTERS).unwrap();
                next_id(&mut counters, "test").unwrap()
            };
            write_txn.commit().unwrap();
            assert_eq!(id, expected);
        }
    }
}
