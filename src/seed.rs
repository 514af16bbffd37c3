// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Startup seeding: roles, the reserved system account, and (optionally) a
//! bootstrap administrator. Every step is idempotent, so restarting against
//! an existing database is a no-op.

use crate::auth::{hash_password, Role, RoleRegistry};
use crate::config::Config;
use crate::storage::{Db, NewAccount, StoreResult, UserRepository};

pub fn run(db: &Db, roles: &RoleRegistry, config: &Config) -> StoreResult<()> {
    db.seed_roles(roles)?;

    let users = UserRepository::new(db);
    users.ensure_system_account()?;

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        if users.find_by_username(username)?.is_none() {
            match hash_password(password) {
                Ok(password_hash) => {
                    let account = users.create(NewAccount {
                        username: username.clone(),
                        password_hash,
                        role_id: roles.id_of(Role::Admin).unwrap_or(3),
                        is_active: true,
                    })?;
                    tracing::info!(
                        id = account.id,
                        username = %account.username,
                        "bootstrap admin created"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "bootstrap admin password hash failed, skipping");
                }
            }
        }
    }

    Ok(())
}
