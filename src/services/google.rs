// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google as an OpenID Connect provider.

use crate::models::ProviderDescriptor;
use crate::services::oauth::OAuthProviderConfig;

pub const GOOGLE_PROVIDER_ID: &str = "google";
pub const GOOGLE_ISSUER: &str = "https://accounts.google.com";

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const DEFAULT_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const ICON_URL: &str = "https://lh3.googleusercontent.com/COxitqgJr1sJnIDe8-jiKhxDx1FrYbtRHKJ9z_hELisAlapwE9LUPh6fcXIfb5vwpbMl4xl9H9TRFPc5NOO8Sb3VSgIBrfRYvW6cUA";

/// Provider configuration for Google sign-in.
pub fn google_config(
    client_id: impl Into<String>,
    client_secret: impl Into<String>,
    allow_email_linking: bool,
) -> OAuthProviderConfig {
    OAuthProviderConfig {
        descriptor: ProviderDescriptor {
            id: GOOGLE_PROVIDER_ID.to_string(),
            name: "Google".to_string(),
            issuer: GOOGLE_ISSUER.to_string(),
            kind: "oauth".to_string(),
            image: ICON_URL.to_string(),
        },
        scopes: vec![
            "openid".to_string(),
            "profile".to_string(),
            "email".to_string(),
        ],
        authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
        token_endpoint: TOKEN_ENDPOINT.to_string(),
        discovery_url: DISCOVERY_URL.to_string(),
        jwks_uri: Some(DEFAULT_JWKS_URL.to_string()),
        // Google issues both forms
        accepted_issuers: vec![GOOGLE_ISSUER.to_string(), "accounts.google.com".to_string()],
        client_id: client_id.into(),
        client_secret: client_secret.into(),
        allow_email_linking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_config() {
        let config = google_config("id", "secret", false);
        assert_eq!(config.descriptor.id, "google");
        assert_eq!(config.descriptor.kind, "oauth");
        assert_eq!(config.scopes.join(" "), "openid profile email");
        assert!(config.accepted_issuers.contains(&"accounts.google.com".to_string()));
        assert!(!config.allow_email_linking);
    }
}
