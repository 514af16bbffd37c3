// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 e-Docs Contributors

//! e-Docs - Document Management Service
//!
//! This crate provides the authentication, authorization, and audit core of
//! a document management service: password login with consecutive-failure
//! lockout, stateless session tokens, role-gated routes, and an append-only
//! audit trail, all backed by an embedded database.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential checks, tokens, lockout, and the two request gates
//! - `storage` - Embedded persistence (redb) for accounts, documents, audit

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod seed;
pub mod state;
pub mod storage;
pub mod validators;
