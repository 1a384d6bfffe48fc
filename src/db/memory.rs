// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory storage adapter for tests and single-process deployments.

use crate::db::{generate_session_token, session_expiry, StorageAdapter};
use crate::error::{AuthError, Result};
use crate::models::{Account, Session, User};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryStore {
    users: HashMap<String, User>,
    /// Keyed by `(provider, provider_account_id)`
    accounts: HashMap<(String, String), Account>,
    sessions: HashMap<String, Session>,
}

/// Storage adapter backed by process memory.
///
/// All collections sit behind one lock so a user and its account become
/// visible together.
pub struct MemoryAdapter {
    store: RwLock<MemoryStore>,
    session_ttl: Duration,
}

impl MemoryAdapter {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            store: RwLock::new(MemoryStore::default()),
            session_ttl,
        }
    }

    /// Number of linked accounts.
    pub async fn account_count(&self) -> usize {
        self.store.read().await.accounts.len()
    }

    /// Number of stored sessions, including expired ones not yet pruned.
    pub async fn session_count(&self) -> usize {
        self.store.read().await.sessions.len()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn get_user_by_id(&self, id: &str) -> Result<User> {
        self.store
            .read()
            .await
            .users
            .get(id)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.store
            .read()
            .await
            .users
            .values()
            .find(|u| !u.email.is_empty() && u.email == email)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_session_token(&self, token: &str) -> Result<User> {
        let now = Utc::now();
        let mut store = self.store.write().await;

        let user_id = match store.sessions.get(token) {
            Some(session) if !session.is_expired(now) => session.user_id.clone(),
            Some(_) => {
                store.sessions.remove(token);
                return Err(AuthError::SessionNotFound);
            }
            None => return Err(AuthError::SessionNotFound),
        };

        store
            .users
            .get(&user_id)
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }

    async fn create_user(&self, user: &User, account: &Account) -> Result<User> {
        let key = (
            account.provider.clone(),
            account.provider_account_id.clone(),
        );
        let mut store = self.store.write().await;

        if let Some(existing) = store.accounts.get(&key) {
            return store.users.get(&existing.user_id).cloned().ok_or_else(|| {
                AuthError::Storage(format!(
                    "account {} references missing user {}",
                    existing.id, existing.user_id
                ))
            });
        }

        let new_user = User {
            id: uuid::Uuid::new_v4().to_string(),
            ..user.clone()
        };
        let new_account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new_user.id.clone(),
            ..account.clone()
        };

        store.users.insert(new_user.id.clone(), new_user.clone());
        store.accounts.insert(key, new_account);

        tracing::debug!(user_id = %new_user.id, provider = %account.provider, "User created");
        Ok(new_user)
    }

    async fn create_session(&self, user: &User) -> Result<Session> {
        let now = Utc::now();
        let expires = session_expiry(now, self.session_ttl)?;
        let mut store = self.store.write().await;

        if !store.users.contains_key(&user.id) {
            return Err(AuthError::UserNotFound);
        }

        store.sessions.retain(|_, s| !s.is_expired(now));

        let mut session_token = generate_session_token()?;
        while store.sessions.contains_key(&session_token) {
            session_token = generate_session_token()?;
        }

        let session = Session {
            session_token,
            user_id: user.id.clone(),
            expires,
        };
        store
            .sessions
            .insert(session.session_token.clone(), session.clone());

        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        self.store.write().await.sessions.remove(token);
        Ok(())
    }
}
