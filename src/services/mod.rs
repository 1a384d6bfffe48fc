// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod google;
pub mod oauth;
pub mod oidc;
pub mod provider;
pub mod state_token;

pub use auth::{AuthService, CallbackOutcome};
pub use google::{google_config, GOOGLE_PROVIDER_ID};
pub use oauth::{OAuthProvider, OAuthProviderConfig};
pub use oidc::{IdTokenClaims, IdTokenVerifier, OidcError, VerifierSettings};
pub use provider::{CallbackParams, Provider, ProviderCallback};
pub use state_token::StateTokenSigner;
