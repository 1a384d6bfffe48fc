// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite storage adapter.
//!
//! Provides typed operations for:
//! - Users (identity records)
//! - Accounts (external identities, unique per provider)
//! - Sessions (login sessions with expiry)

use crate::db::{generate_session_token, session_expiry, tables, StorageAdapter};
use crate::error::{AuthError, Result};
use crate::models::{Account, Session, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 8;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        email_verified INTEGER NOT NULL DEFAULT 0,
        image TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        type TEXT NOT NULL,
        provider TEXT NOT NULL,
        provider_account_id TEXT NOT NULL,
        refresh_token TEXT,
        access_token TEXT NOT NULL DEFAULT '',
        expires_at INTEGER,
        id_token TEXT NOT NULL DEFAULT '',
        scope TEXT NOT NULL DEFAULT '',
        token_type TEXT NOT NULL DEFAULT '',
        session_state TEXT,
        UNIQUE (provider, provider_account_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        session_token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions (user_id)",
];

/// SQLite-backed storage adapter.
#[derive(Clone)]
pub struct SqliteAdapter {
    pool: SqlitePool,
    session_ttl: Duration,
}

impl SqliteAdapter {
    /// Connect to a SQLite database (`sqlite://path` or `sqlite::memory:`).
    ///
    /// In-memory databases are limited to one connection so every query sees
    /// the same database.
    pub async fn connect(url: &str, session_ttl: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AuthError::Storage(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            // Closing the only connection would drop the database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::info!(max_connections, "Connected to SQLite");

        Ok(Self::new(pool, session_ttl))
    }

    pub fn new(pool: SqlitePool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }

    /// Create the schema if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AuthError::Storage(format!("Migration failed: {}", e)))?;
        }
        tracing::info!("SQLite schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Existing owner of `(provider, provider_account_id)`, if any.
    async fn existing_owner(
        conn: &mut sqlx::SqliteConnection,
        account: &Account,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT u.id, u.name, u.email, u.email_verified, u.image \
             FROM {} a JOIN {} u ON u.id = a.user_id \
             WHERE a.provider = ? AND a.provider_account_id = ?",
            tables::ACCOUNTS,
            tables::USERS
        ))
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .fetch_optional(conn)
        .await?;

        Ok(user)
    }

    async fn insert_user_and_account(
        conn: &mut sqlx::SqliteConnection,
        user: &User,
        account: &Account,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, name, email, email_verified, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(&user.image)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO accounts \
             (id, user_id, type, provider, provider_account_id, refresh_token, access_token, \
              expires_at, id_token, scope, token_type, session_state) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.user_id)
        .bind(&account.account_type)
        .bind(&account.provider)
        .bind(&account.provider_account_id)
        .bind(&account.refresh_token)
        .bind(&account.access_token)
        .bind(account.expires_at)
        .bind(&account.id_token)
        .bind(&account.scope)
        .bind(&account.token_type)
        .bind(&account.session_state)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteAdapter {
    async fn get_user_by_id(&self, id: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, email_verified, image FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User> {
        if email.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        sqlx::query_as::<_, User>(
            "SELECT id, name, email, email_verified, image FROM users WHERE email = ? LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)
    }

    async fn get_user_by_session_token(&self, token: &str) -> Result<User> {
        let now_ms = Utc::now().timestamp_millis();

        sqlx::query_as::<_, User>(
            "SELECT u.id, u.name, u.email, u.email_verified, u.image \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.session_token = ? AND s.expires > ?",
        )
        .bind(token)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::SessionNotFound)
    }

    async fn create_user(&self, user: &User, account: &Account) -> Result<User> {
        // Take the write lock before the lookup so concurrent logins serialize
        // instead of failing to upgrade a stale read snapshot.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        if let Some(existing) = Self::existing_owner(&mut tx, account).await? {
            tx.commit().await?;
            return Ok(existing);
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

        if let Err(e) = Self::insert_user_and_account(&mut tx, &new_user, &new_account).await {
            // Dropping the transaction rolls back the user insert
            drop(tx);
            return Err(AuthError::Storage(format!("Failed to create user: {}", e)));
        }

        tx.commit().await?;
        tracing::debug!(user_id = %new_user.id, provider = %account.provider, "User created");
        Ok(new_user)
    }

    async fn create_session(&self, user: &User) -> Result<Session> {
        let expires = session_expiry(Utc::now(), self.session_ttl)?;
        let session_token = generate_session_token()?;

        sqlx::query("INSERT INTO sessions (session_token, user_id, expires) VALUES (?, ?, ?)")
            .bind(&session_token)
            .bind(&user.id)
            .bind(expires.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to create session: {}", e)))?;

        Ok(Session {
            session_token,
            user_id: user.id.clone(),
            expires: from_millis(expires.timestamp_millis())?,
        })
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl SqliteAdapter {
    /// Delete expired sessions, returning how many were removed.
    pub async fn prune_expired_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Accounts linked to a user.
    pub async fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT id, user_id, type, provider, provider_account_id, refresh_token, \
             access_token, expires_at, id_token, scope, token_type, session_state \
             FROM accounts WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AuthError::Storage(format!("Invalid timestamp: {}", ms)))
}
