// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authbridge API Server
//!
//! Delegates login to external OAuth2 / OpenID Connect providers and
//! issues server-side sessions.

use anyhow::Context;
use authbridge::{
    config::Config,
    db::{MemoryAdapter, SqliteAdapter, StorageAdapter},
    services::{google_config, AuthService, OAuthProvider, Provider, StateTokenSigner},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Authbridge API");

    let storage = init_storage(&config).await?;

    let state_tokens = Arc::new(
        StateTokenSigner::new(&config.auth_secret, config.state_max_age)
            .context("Failed to initialize state token signer")?,
    );

    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
    match (&config.google_client_id, &config.google_client_secret) {
        (Some(client_id), Some(client_secret)) => {
            if config.allow_email_linking {
                tracing::warn!(
                    "ALLOW_EMAIL_LINKING is set: provider emails are trusted as verified"
                );
            }
            let google = OAuthProvider::new(
                google_config(client_id, client_secret, config.allow_email_linking),
                state_tokens.clone(),
                config.http_timeout,
            )
            .context("Failed to initialize Google provider")?;
            providers.push(Arc::new(google));
            tracing::info!("Google provider configured");
        }
        _ => tracing::warn!(
            "GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, no providers configured"
        ),
    }

    let auth = AuthService::new(providers, storage, config.public_url.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        auth,
    });

    // Build router
    let app = authbridge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Select the storage backend: SQLite when `DATABASE_URL` is set, else memory.
async fn init_storage(config: &Config) -> anyhow::Result<Arc<dyn StorageAdapter>> {
    match &config.database_url {
        Some(url) => {
            let sqlite = SqliteAdapter::connect(url, config.session_ttl)
                .await
                .context("Failed to connect to SQLite")?;
            sqlite
                .migrate()
                .await
                .context("Failed to create database schema")?;
            Ok(Arc::new(sqlite))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            Ok(Arc::new(MemoryAdapter::new(config.session_ttl)))
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("authbridge=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
