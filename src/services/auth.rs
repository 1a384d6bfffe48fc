// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login orchestration: provider redirect, callback, session issuance.
//!
//! No per-attempt state is kept between `login` and `callback`; the state
//! token embedded in the redirect carries everything needed to verify the
//! round trip.

use crate::db::StorageAdapter;
use crate::error::{AuthError, Result};
use crate::models::{Account, Profile, ProviderDescriptor, SessionCookie, TokenSet, User};
use crate::services::provider::{CallbackParams, Provider};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a completed login.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    pub user: User,
    pub cookie: SessionCookie,
}

/// Composes configured providers with a storage backend.
pub struct AuthService {
    providers: HashMap<String, Arc<dyn Provider>>,
    storage: Arc<dyn StorageAdapter>,
    public_url: String,
}

impl AuthService {
    /// `public_url` is the externally visible base URL of this service.
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        storage: Arc<dyn StorageAdapter>,
        public_url: impl Into<String>,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.descriptor().id.clone(), p))
            .collect();

        Self {
            providers,
            storage,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Descriptors of all configured providers, ordered by id.
    pub fn list_providers(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors: Vec<_> = self
            .providers
            .values()
            .map(|p| p.descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Callback URL registered with the IdP for `provider_id`.
    pub fn callback_url(&self, provider_id: &str) -> String {
        format!("{}/auth/callback/{}", self.public_url, provider_id)
    }

    fn provider(&self, provider_id: &str) -> Result<&Arc<dyn Provider>> {
        self.providers
            .get(provider_id)
            .ok_or_else(|| AuthError::ProviderNotFound(provider_id.to_string()))
    }

    /// Authorization URL to redirect the browser to.
    pub fn login(&self, provider_id: &str) -> Result<String> {
        let provider = self.provider(provider_id)?;
        let url = provider.authorization_url(&self.callback_url(provider_id))?;
        tracing::info!(provider = provider_id, "Redirect issued");
        Ok(url)
    }

    /// Complete a login: verify the callback, upsert the user and issue a session.
    ///
    /// Nothing is written to storage unless the provider callback succeeds.
    pub async fn callback(
        &self,
        provider_id: &str,
        params: &CallbackParams,
    ) -> Result<CallbackOutcome> {
        let provider = self.provider(provider_id)?;
        tracing::info!(provider = provider_id, "Callback received");

        let callback = provider
            .handle_callback(params, &self.callback_url(provider_id))
            .await
            .inspect_err(|e| tracing::warn!(provider = provider_id, error = %e, "Login failed"))?;

        let (user, account) =
            user_and_account(provider.descriptor(), &callback.profile, &callback.tokens);

        let user = self.storage.create_user(&user, &account).await?;
        tracing::info!(provider = provider_id, user_id = %user.id, "User upserted");

        let session = match self.storage.create_session(&user).await {
            Ok(session) if !session.session_token.is_empty() => session,
            Ok(_) => {
                tracing::error!(user_id = %user.id, "Storage returned an empty session token");
                return Err(AuthError::SessionNotCreated);
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to create session");
                return Err(AuthError::SessionNotCreated);
            }
        };

        tracing::info!(
            provider = provider_id,
            user_id = %user.id,
            expires = %session.expires,
            "Session issued"
        );

        Ok(CallbackOutcome {
            cookie: SessionCookie::for_session(&session),
            user,
        })
    }

    /// Resolve the user owning a session token.
    ///
    /// Unknown, expired and malformed tokens all fail with `InvalidSession`.
    pub async fn session(&self, token: &str) -> Result<User> {
        if token.is_empty() {
            return Err(AuthError::InvalidSession);
        }

        match self.storage.get_user_by_session_token(token).await {
            Ok(user) => Ok(user),
            Err(AuthError::SessionNotFound | AuthError::UserNotFound) => {
                Err(AuthError::InvalidSession)
            }
            Err(e) => Err(e),
        }
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Ok(());
        }
        self.storage.delete_session(token).await?;
        tracing::info!("Session ended");
        Ok(())
    }
}

/// Map a verified profile and its tokens onto the records to upsert.
fn user_and_account(
    descriptor: &ProviderDescriptor,
    profile: &Profile,
    tokens: &TokenSet,
) -> (User, Account) {
    let user = User {
        id: String::new(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        email_verified: profile.email_verified,
        image: profile.picture.clone(),
    };

    let account = Account {
        id: String::new(),
        user_id: String::new(),
        account_type: descriptor.kind.clone(),
        provider: descriptor.id.clone(),
        provider_account_id: profile.sub.clone(),
        refresh_token: tokens.refresh_token.clone(),
        access_token: tokens.access_token.clone(),
        expires_at: tokens.expires_at,
        id_token: tokens.id_token.clone().unwrap_or_default(),
        scope: tokens.scope.clone(),
        token_type: tokens.token_type.clone(),
        session_state: None,
    };

    (user, account)
}
