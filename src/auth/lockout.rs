// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Consecutive-failure lockout policy.
//!
//! Counts only *consecutive* password mismatches: any successful login
//! clears the counter. Once the threshold is reached the account goes
//! inactive and stays that way until an administrator reactivates it.

use crate::storage::{Account, StoreResult, UserRepository};

/// Result of charging one failed attempt against an account.
#[derive(Debug, Clone, Copy)]
pub struct LockoutOutcome {
    /// The account is (now or already) locked out.
    pub locked: bool,
    /// The consecutive-failure counter after this attempt.
    pub attempt_count: u32,
}

impl LockoutOutcome {
    /// Attempts left before lockout; zero when already locked.
    pub fn remaining(&self, max_failed_attempts: u32) -> u32 {
        max_failed_attempts.saturating_sub(self.attempt_count)
    }
}

/// Lockout policy with a configurable consecutive-failure threshold.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_failed_attempts: u32,
}

impl LockoutPolicy {
    pub fn new(max_failed_attempts: u32) -> Self {
        Self { max_failed_attempts }
    }

    pub fn max_failed_attempts(&self) -> u32 {
        self.max_failed_attempts
    }

    /// Charge one failed attempt. The increment, threshold check, and
    /// deactivation are a single durable storage operation.
    pub fn record_failure(&self, users: &UserRepository, id: u64) -> StoreResult<LockoutOutcome> {
        users.record_failure(id, self.max_failed_attempts)
    }

    /// Clear the counter after a successful authentication. Skips the write
    /// when the counter is already zero, which is the common case.
    pub fn record_success(&self, users: &UserRepository, account: &Account) -> StoreResult<()> {
        if account.failed_attempt_count > 0 {
            users.reset_failures(account.id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Db, NewAccount};

    fn temp_db() -> (Db, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn make_account(users: &UserRepository) -> Account {
        users
            .create(NewAccount {
                username: "alice".to_string(),
                password_hash: "$argon2id$fake".to_string(),
                role_id: 2,
                is_active: true,
            })
            .unwrap()
    }

    #[test]
    fn locks_after_exactly_three_consecutive_failures() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let policy = LockoutPolicy::new(3);
        let account = make_account(&users);

        assert!(!policy.record_failure(&users, account.id).unwrap().locked);
        assert!(!policy.record_failure(&users, account.id).unwrap().locked);
        let third = policy.record_failure(&users, account.id).unwrap();
        assert!(third.locked);
        assert_eq!(third.remaining(3), 0);
    }

    #[test]
    fn success_resets_the_counter() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let policy = LockoutPolicy::new(3);
        let account = make_account(&users);

        policy.record_failure(&users, account.id).unwrap();
        policy.record_failure(&users, account.id).unwrap();

        let reloaded = users.find_by_id(account.id).unwrap().unwrap();
        policy.record_success(&users, &reloaded).unwrap();

        // Fresh run of failures starts from zero again
        let next = policy.record_failure(&users, account.id).unwrap();
        assert_eq!(next.attempt_count, 1);
        assert!(!next.locked);
    }

    #[test]
    fn success_with_clean_counter_writes_nothing() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let policy = LockoutPolicy::new(3);
        let account = make_account(&users);

        let before = users.find_by_id(account.id).unwrap().unwrap();
        policy.record_success(&users, &account).unwrap();
        let after = users.find_by_id(account.id).unwrap().unwrap();
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[test]
    fn remaining_attempts_reported() {
        let (db, _dir) = temp_db();
        let users = UserRepository::new(&db);
        let policy = LockoutPolicy::new(3);
        let account = make_account(&users);

        let first = policy.record_failure(&users, account.id).unwrap();
        assert_eq!(first.remaining(policy.max_failed_attempts()), 2);
    }
}
