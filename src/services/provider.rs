// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider capability.

use crate::error::Result;
use crate::models::{Profile, ProviderDescriptor, TokenSet};
use async_trait::async_trait;
use serde::Deserialize;

/// Query parameters delivered to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Result of a successful callback: who logged in, and the tokens issued.
#[derive(Debug, Clone)]
pub struct ProviderCallback {
    pub profile: Profile,
    pub tokens: TokenSet,
}

/// One identity provider's authorization-code flow.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Public description of this provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Authorization URL to redirect the browser to, with a fresh state token.
    fn authorization_url(&self, callback_url: &str) -> Result<String>;

    /// Verify state, exchange the code and extract a verified profile.
    ///
    /// `callback_url` must be the one used to build the authorization URL.
    async fn handle_callback(
        &self,
        params: &CallbackParams,
        callback_url: &str,
    ) -> Result<ProviderCallback>;
}
