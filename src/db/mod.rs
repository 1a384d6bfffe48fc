// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer: the adapter contract and its backends.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryAdapter;
pub use sqlite::SqliteAdapter;

use crate::error::{AuthError, Result};
use crate::models::{Account, Session, User};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const ACCOUNTS: &str = "accounts";
    pub const SESSIONS: &str = "sessions";
}

/// Random bytes in a session token.
const SESSION_TOKEN_BYTES: usize = 32;

/// Persistence for users, linked accounts and sessions.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> Result<User>;

    async fn get_user_by_email(&self, email: &str) -> Result<User>;

    /// Resolve the owner of an unexpired session.
    ///
    /// Unknown and expired tokens both fail with `SessionNotFound`.
    async fn get_user_by_session_token(&self, token: &str) -> Result<User>;

    /// Upsert by external identity.
    ///
    /// If an account with the same `(provider, provider_account_id)` exists,
    /// its owner is returned unchanged. Otherwise a new user and the linked
    /// account are written atomically. The `id`/`user_id` fields of the
    /// arguments are ignored and assigned by the adapter.
    async fn create_user(&self, user: &User, account: &Account) -> Result<User>;

    /// Mint a new session for `user` expiring after the adapter's TTL.
    async fn create_session(&self, user: &User) -> Result<Session>;

    /// Remove a session. Removing an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> Result<()>;
}

/// Generate an unguessable session token (256 bits, base64url).
pub fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AuthError::Internal(anyhow::anyhow!("system RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Session expiry for a session created at `now`.
pub(crate) fn session_expiry(
    now: chrono::DateTime<chrono::Utc>,
    ttl: std::time::Duration,
) -> Result<chrono::DateTime<chrono::Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("invalid session TTL: {}", e)))?;
    if ttl <= chrono::Duration::zero() {
        return Err(AuthError::Internal(anyhow::anyhow!(
            "session TTL must be positive"
        )));
    }
    Ok(now + ttl)
}
