// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Authbridge: delegated login through OAuth2 / OpenID Connect providers
//!
//! This crate verifies users with external identity providers using the
//! authorization-code flow and issues its own server-side sessions.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::AuthService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
}
