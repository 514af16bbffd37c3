// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! Authentication, authorization, and lockout.
//!
//! The pieces compose in request order: [`middleware::authenticate`]
//! verifies the token and attaches an [`AuthenticatedUser`], then
//! [`middleware::authorize`] checks the role against the route's
//! [`RoleSet`]. Credential checks and the consecutive-failure lockout in
//! [`lockout`] run only inside the login flow.

pub mod error;
pub mod lockout;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod token;

pub use error::AuthError;
pub use lockout::{LockoutOutcome, LockoutPolicy};
pub use middleware::{authenticate, authorize, client_ip, RoleGate};
pub use password::{hash_password, verify_password};
pub use roles::{Role, RoleRegistry, RoleSet};
pub use token::{AuthenticatedUser, Claims, TokenService};
