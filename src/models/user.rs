// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and linked-account models for storage and API.

use serde::{Deserialize, Serialize};

/// Local user, created on the first successful login from an external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user ID (assigned by the storage adapter)
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    /// Profile picture URL
    pub image: String,
}

/// External identity linked to a [`User`].
///
/// Unique on `(provider, provider_account_id)`; never reassigned once created.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    /// Account ID (assigned by the storage adapter)
    pub id: String,
    /// Owning user (assigned by the storage adapter)
    pub user_id: String,
    /// Provider type, e.g. `oauth`
    #[sqlx(rename = "type")]
    pub account_type: String,
    /// Provider ID, e.g. `google`
    pub provider: String,
    /// Subject identifier scoped to the provider
    pub provider_account_id: String,
    pub refresh_token: Option<String>,
    pub access_token: String,
    /// Access token expiry (Unix seconds)
    pub expires_at: Option<i64>,
    pub id_token: String,
    pub scope: String,
    pub token_type: String,
    pub session_state: Option<String>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("account_type", &self.account_type)
            .field("provider", &self.provider)
            .field("provider_account_id", &self.provider_account_id)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}
