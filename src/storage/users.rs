// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Account persistence.
//!
//! The failure-counter update in [`UserRepository::record_failure`] is the
//! load-bearing operation here: increment, threshold check, and the
//! active→locked transition happen inside one write transaction, so two
//! concurrent wrong-password attempts cannot both read a stale counter and
//! slip past the threshold.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::db::{next_id, Db, StoreError, StoreResult, COUNTERS, USERNAME_INDEX, USERS};
use crate::auth::lockout::LockoutOutcome;

/// Reserved account used to attribute audit records when no real identity is
/// available (failed token decode, denied anonymous request).
pub const SYSTEM_ACCOUNT_ID: u64 = 1;
pub const SYSTEM_USERNAME: &str = "system";

const USER_COUNTER: &str = "next_user_id";

/// A login-capable identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub username: String,
    /// PHC-format adaptive hash; never serialized to clients.
    pub password_hash: String,
    pub role_id: u64,
    pub is_active: bool,
    pub failed_attempt_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an account.
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub role_id: u64,
    pub is_active: bool,
}

/// Repository for accounts.
pub struct UserRepository<'a> {
    db: &'a Db,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Create an account. Fails with `Conflict` if the username is taken;
    /// the uniqueness check and the insert share one transaction.
    pub fn create(&self, new: NewAccount) -> StoreResult<Account> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut index = write_txn.open_table(USERNAME_INDEX)?;
            let taken = index.get(new.username.as_str())?.is_some();
            if taken {
                return Err(StoreError::Conflict(format!(
                    "username '{}' already taken",
                    new.username
                )));
            }

            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = next_id(&mut counters, USER_COUNTER)?;
            drop(counters);

            let now = Utc::now();
            let account = Account {
                id,
                username: new.username,
                password_hash: new.password_hash,
                role_id: new.role_id,
                is_active: new.is_active,
                failed_attempt_count: 0,
                created_at: now,
                updated_at: now,
            };

            let json = serde_json::to_vec(&account)?;
            let mut users = write_txn.open_table(USERS)?;
            users.insert(account.id, json.as_slice())?;
            index.insert(account.username.as_str(), account.id)?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    pub fn find_by_id(&self, id: u64) -> StoreResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERNAME_INDEX)?;
        let Some(id) = index.get(username)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All accounts, ascending by id.
    pub fn list(&self) -> StoreResult<Vec<Account>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let mut accounts = Vec::new();
        for entry in users.range(0..=u64::MAX)? {
            let (_, value) = entry?;
            accounts.push(serde_json::from_slice(value.value())?);
        }
        Ok(accounts)
    }

    /// Flip the active flag. Re-activation also resets the failure counter,
    /// otherwise the next mismatch would re-lock the account instantly.
    pub fn set_active(&self, id: u64, active: bool) -> StoreResult<Account> {
        self.update(id, |account| {
            account.is_active = active;
            if active {
                account.failed_attempt_count = 0;
            }
        })
    }

    pub fn delete(&self, id: u64) -> StoreResult<Account> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut users = write_txn.open_table(USERS)?;
            let bytes = {
                let existing = users
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
                existing.value().to_vec()
            };
            let account: Account = serde_json::from_slice(&bytes)?;
            users.remove(id)?;
            let mut index = write_txn.open_table(USERNAME_INDEX)?;
            index.remove(account.username.as_str())?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }

    /// Record one failed login attempt and report whether it tripped the
    /// lockout threshold. Durable before this returns.
    ///
    /// An account that is already inactive never consumes an attempt; callers
    /// reject those before password verification, and a concurrent request
    /// that raced past that check lands here and sees `locked = true`.
    pub fn record_failure(
        &self,
        id: u64,
        max_failed_attempts: u32,
    ) -> StoreResult<LockoutOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut users = write_txn.open_table(USERS)?;
            let bytes = {
                let existing = users
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
                existing.value().to_vec()
            };
            let mut account: Account = serde_json::from_slice(&bytes)?;

            if !account.is_active {
                LockoutOutcome {
                    locked: true,
                    attempt_count: account.failed_attempt_count,
                }
            } else {
                account.failed_attempt_count += 1;
                let locked = account.failed_attempt_count >= max_failed_attempts;
                if locked {
                    account.is_active = false;
                }
                account.updated_at = Utc::now();

                let json = serde_json::to_vec(&account)?;
                users.insert(id, json.as_slice())?;
                LockoutOutcome {
                    locked,
                    attempt_count: account.failed_attempt_count,
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Reset the failure counter after a successful authentication.
    pub fn reset_failures(&self, id: u64) -> StoreResult<()> {
        self.update(id, |account| account.failed_attempt_count = 0)?;
        Ok(())
    }

    /// Ensure the reserved system account exists: inactive, with an
    /// unusable credential, so it can attribute audit records but never
    /// authenticate. Called once at startup on an empty or existing store.
    pub fn ensure_system_account(&self) -> StoreResult<()> {
        if self.find_by_username(SYSTEM_USERNAME)?.is_some() {
            return Ok(());
        }
        let account = self.create(NewAccount {
            username: SYSTEM_USERNAME.to_string(),
            password_hash: String::new(),
            role_id: 0,
            is_active: false,
        })?;
        if account.id != SYSTEM_ACCOUNT_ID {
            tracing::warn!(
                id = account.id,
                "system account was not assigned the reserved id"
            );
        }
        Ok(())
    }

    /// Read-modify-write a single account row in one transaction.
    fn update(&self, id: u64, mutate: impl FnOnce(&mut Account)) -> StoreResult<Account> {
        let write_txn = self.db.begin_write()?;
        let account = {
            let mut users = write_txn.open_table(USERS)?;
            let bytes = {
                let existing = users
                    .get(id)?
                    .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
                existing.value().to_vec()
            };
            let mut account: Account = serde_json::from_slice(&bytes)?;
            mutate(&mut account);
            account.updated_at = Utc::now();

            let json = serde_json::to_vec(&account)?;
            users.insert(id, json.as_slice())?;
            account
        };
        write_txn.commit()?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (Db, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role_id: 2,
            is_active: true,
        }
    }

    #[test]
    fn create_and_find() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);

        let created = users.create(sample("alice")).unwrap();
        assert_eq!(created.failed_attempt_count, 0);
        assert!(created.is_active);

        let by_name = users.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = users.find_by_id(created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        assert!(users.find_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_conflicts() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);

        users.create(sample("alice")).unwrap();
        let err = users.create(sample("alice")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn record_failure_locks_at_threshold() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let account = users.create(sample("bob")).unwrap();

        let first = users.record_failure(account.id, 3).unwrap();
        assert!(!first.locked);
        assert_eq!(first.attempt_count, 1);

        let second = users.record_failure(account.id, 3).unwrap();
        assert!(!second.locked);
        assert_eq!(second.attempt_count, 2);

        let third = users.record_failure(account.id, 3).unwrap();
        assert!(third.locked);
        assert_eq!(third.attempt_count, 3);

        // Locked state is durable
        let reloaded = users.find_by_id(account.id).unwrap().unwrap();
        assert!(!reloaded.is_active);
        assert_eq!(reloaded.failed_attempt_count, 3);
    }

    #[test]
    fn record_failure_on_inactive_account_does_not_increment() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let account = users.create(sample("bob")).unwrap();
        users.set_active(account.id, false).unwrap();

        let outcome = users.record_failure(account.id, 3).unwrap();
        assert!(outcome.locked);
        assert_eq!(outcome.attempt_count, 0);

        let reloaded = users.find_by_id(account.id).unwrap().unwrap();
        assert_eq!(reloaded.failed_attempt_count, 0);
    }

    #[test]
    fn reset_failures_clears_counter() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let account = users.create(sample("bob")).unwrap();

        users.record_failure(account.id, 3).unwrap();
        users.record_failure(account.id, 3).unwrap();
        users.reset_failures(account.id).unwrap();

        let reloaded = users.find_by_id(account.id).unwrap().unwrap();
        assert_eq!(reloaded.failed_attempt_count, 0);
        assert!(reloaded.is_active);
    }

    #[test]
    fn reactivation_resets_counter() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let account = users.create(sample("bob")).unwrap();

        for _ in 0..3 {
            users.record_failure(account.id, 3).unwrap();
        }
        let reactivated = users.set_active(account.id, true).unwrap();
        assert!(reactivated.is_active);
        assert_eq!(reactivated.failed_attempt_count, 0);
    }

    #[test]
    fn delete_frees_username() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let account = users.create(sample("alice")).unwrap();

        users.delete(account.id).unwrap();
        assert!(users.find_by_username("alice").unwrap().is_none());

        // Username is reusable after deletion
        users.create(sample("alice")).unwrap();
    }

    #[test]
    fn delete_missing_account_is_not_found() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        assert!(matches!(
            users.delete(999).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn system_account_is_seeded_first_and_unusable() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);

        users.ensure_system_account().unwrap();
        users.ensure_system_account().unwrap();

        let system = users.find_by_username(SYSTEM_USERNAME).unwrap().unwrap();
        assert_eq!(system.id, SYSTEM_ACCOUNT_ID);
        assert!(!system.is_active);
        assert!(system.password_hash.is_empty());
    }

    #[test]
    fn list_returns_all_accounts_in_id_order() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        users.create(sample("alice")).unwrap();
        users.create(sample("bob")).unwrap();

        let all = users.list().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
    }
}
