// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! User roles for authorization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Permission tiers gating route access.
///
/// - `Viewer` - Read-only access to documents
/// - `Editor` - Can create and update documents
/// - `Admin` - Full access including user management and audit logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only document access
    Viewer,
    /// Document authoring
    Editor,
    /// Full administrative access
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from persisted role ids to role names.
///
/// Injected into [`crate::state::AppState`] instead of living as a hard-coded
/// global, so tests can substitute alternate role sets. The default mapping
/// mirrors the seeded role rows: 1 → viewer, 2 → editor, 3 → admin.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    map: HashMap<u64, Role>,
}

impl RoleRegistry {
    pub fn new(map: HashMap<u64, Role>) -> Self {
        Self { map }
    }

    /// Resolve a role id to a role name. Unknown ids yield `None`; the
    /// authorization gate treats that as role-missing.
    pub fn resolve(&self, role_id: u64) -> Option<Role> {
        self.map.get(&role_id).copied()
    }

    /// Look up the id a role was seeded under.
    pub fn id_of(&self, role: Role) -> Option<u64> {
        self.map
            .iter()
            .find(|(_, r)| **r == role)
            .map(|(id, _)| *id)
    }

    /// Iterate `(id, role)` pairs, used to seed the roles table at startup.
    pub fn entries(&self) -> impl Iterator<Item = (u64, Role)> + '_ {
        self.map.iter().map(|(id, role)| (*id, *role))
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new(HashMap::from([
            (1, Role::Viewer),
            (2, Role::Editor),
            (3, Role::Admin),
        ]))
    }
}

/// The set of roles a route admits.
///
/// `Any` is the "all" sentinel: any authenticated role passes.
#[derive(Debug, Clone)]
pub enum RoleSet {
    Any,
    Only(Vec<Role>),
}

impl RoleSet {
    pub fn any() -> Self {
        RoleSet::Any
    }

    pub fn of(roles: &[Role]) -> Self {
        RoleSet::Only(roles.to_vec())
    }

    pub fn allows(&self, role: Role) -> bool {
        match self {
            RoleSet::Any => true,
            RoleSet::Only(roles) => roles.contains(&role),
        }
    }

    /// Human-readable list for audit details, e.g. `"admin, editor"`.
    pub fn describe(&self) -> String {
        match self {
            RoleSet::Any => "all".to_string(),
            RoleSet::Only(roles) => roles
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
