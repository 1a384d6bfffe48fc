// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generic OAuth2 / OpenID Connect provider.
//!
//! Handles:
//! - Authorization URL construction with a signed `state`
//! - Authorization code exchange at the token endpoint
//! - Profile extraction from a signature-verified ID token

use crate::error::{AuthError, Result};
use crate::models::{Profile, ProviderDescriptor, TokenSet};
use crate::services::oidc::{IdTokenVerifier, VerifierSettings};
use crate::services::provider::{CallbackParams, Provider, ProviderCallback};
use crate::services::state_token::{StateTokenSigner, DEFAULT_NONCE_BYTES};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Static configuration of one OAuth provider.
#[derive(Clone)]
pub struct OAuthProviderConfig {
    pub descriptor: ProviderDescriptor,
    pub scopes: Vec<String>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    /// OIDC discovery document, used to locate the JWKS
    pub discovery_url: String,
    /// JWKS URI used when discovery fails
    pub jwks_uri: Option<String>,
    /// Values accepted in the ID token `iss` claim
    pub accepted_issuers: Vec<String>,
    pub client_id: String,
    pub client_secret: String,
    /// Deployer trust decision: mark every profile email as verified.
    ///
    /// Only enable this for IdPs that never hand out unverified addresses.
    pub allow_email_linking: bool,
}

impl std::fmt::Debug for OAuthProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProviderConfig")
            .field("descriptor", &self.descriptor)
            .field("scopes", &self.scopes)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("discovery_url", &self.discovery_url)
            .field("jwks_uri", &self.jwks_uri)
            .field("accepted_issuers", &self.accepted_issuers)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("allow_email_linking", &self.allow_email_linking)
            .finish()
    }
}

impl OAuthProviderConfig {
    fn verifier_settings(&self) -> VerifierSettings {
        let issuers = if self.accepted_issuers.is_empty() {
            vec![self.descriptor.issuer.clone()]
        } else {
            self.accepted_issuers.clone()
        };

        VerifierSettings {
            issuers,
            audience: self.client_id.clone(),
            discovery_url: self.discovery_url.clone(),
            fallback_jwks_uri: self.jwks_uri.clone(),
        }
    }
}

/// Error body returned by token endpoints (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
}

/// OAuth2 authorization-code provider backed by a token endpoint and an
/// ID token verifier.
pub struct OAuthProvider {
    config: OAuthProviderConfig,
    http: reqwest::Client,
    state_tokens: Arc<StateTokenSigner>,
    verifier: IdTokenVerifier,
}

impl OAuthProvider {
    /// Create a provider whose ID tokens are verified via OIDC discovery.
    pub fn new(
        config: OAuthProviderConfig,
        state_tokens: Arc<StateTokenSigner>,
        http_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let verifier = IdTokenVerifier::new(config.verifier_settings(), http_timeout)?;
        let http = reqwest::Client::builder()
            .timeout(http_timeout)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            config,
            http,
            state_tokens,
            verifier,
        })
    }

    /// Exchange an authorization code for tokens at the token endpoint.
    pub async fn exchange_code(&self, code: &str, callback_url: &str) -> Result<TokenSet> {
        let response = self
            .http
            .post(&self.config.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", callback_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                AuthError::TokenExchangeFailed(format!(
                    "token request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Only the RFC 6749 error code is surfaced, never the raw body
            let reason = response
                .json::<TokenErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "unknown_error".to_string());
            return Err(AuthError::TokenExchangeFailed(format!(
                "HTTP {}: {}",
                status, reason
            )));
        }

        let mut tokens: TokenSet = response.json().await.map_err(|e| {
            AuthError::TokenExchangeFailed(format!("invalid token response: {}", e.without_url()))
        })?;
        tokens.resolve_expiry(chrono::Utc::now().timestamp());

        Ok(tokens)
    }

    /// Extract the identity profile from the verified ID token.
    async fn extract_profile(&self, tokens: &TokenSet) -> Result<Profile> {
        let id_token = tokens
            .id_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::ProfileExtractionFailed("missing id_token".to_string()))?;

        let claims = self
            .verifier
            .verify(id_token)
            .await
            .map_err(|e| AuthError::ProfileExtractionFailed(e.to_string()))?;

        let mut profile = claims.profile;
        if self.config.allow_email_linking {
            profile.email_verified = true;
        }

        Ok(profile)
    }
}

#[async_trait]
impl Provider for OAuthProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.config.descriptor
    }

    fn authorization_url(&self, callback_url: &str) -> Result<String> {
        let state = self.state_tokens.generate(DEFAULT_NONCE_BYTES)?;
        let scope = self.config.scopes.join(" ");

        let separator = if self.config.authorization_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };

        Ok(format!(
            "{}{}\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            self.config.authorization_endpoint,
            separator,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode(&scope),
            urlencoding::encode(&state),
        ))
    }

    async fn handle_callback(
        &self,
        params: &CallbackParams,
        callback_url: &str,
    ) -> Result<ProviderCallback> {
        let provider = self.config.descriptor.id.as_str();

        let state = params.state.as_deref().unwrap_or_default();
        if !self.state_tokens.verify(state) {
            tracing::warn!(provider, "Invalid or tampered state parameter");
            return Err(AuthError::InvalidState);
        }

        if let Some(error) = &params.error {
            tracing::warn!(
                provider,
                error = %error,
                description = params.error_description.as_deref().unwrap_or(""),
                "OAuth error from identity provider"
            );
            return Err(AuthError::AuthorizationDenied(error.clone()));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;

        tracing::info!(provider, "Exchanging authorization code for tokens");
        let tokens = self.exchange_code(code, callback_url).await?;

        let profile = self.extract_profile(&tokens).await?;
        tracing::info!(provider, subject = %profile.sub, "Identity profile extracted");

        Ok(ProviderCallback { profile, tokens })
    }
}
