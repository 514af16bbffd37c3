// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

use std::sync::Arc;

use crate::auth::{LockoutPolicy, RoleRegistry, TokenService};
use crate::config::Config;
use crate::storage::Db;

/// Shared application state; cheap to clone, one per router.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub tokens: Arc<TokenService>,
    pub roles: Arc<RoleRegistry>,
    pub lockout: LockoutPolicy,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Db, config: Config) -> Self {
        Self::with_roles(db, config, RoleRegistry::default())
    }

    pub fn with_roles(db: Db, config: Config, roles: RoleRegistry) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_secs);
        let lockout = LockoutPolicy::new(config.max_failed_attempts);
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            roles: Arc::new(roles),
            lockout,
            config: Arc::new(config),
        }
    }
}
