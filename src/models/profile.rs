// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider descriptors, token responses and identity profiles.

use serde::{Deserialize, Deserializer, Serialize};

/// Public description of a configured identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    /// Display name
    pub name: String,
    pub issuer: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Icon URL
    pub image: String,
}

/// Token endpoint response from an IdP.
#[derive(Clone, Default, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Absolute expiry (Unix seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Relative expiry; used to fill `expires_at` when that is absent
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
}

impl TokenSet {
    /// Fill `expires_at` from `expires_in` relative to `now` (Unix seconds).
    pub fn resolve_expiry(&mut self, now: i64) {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now + secs);
        }
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("has_id_token", &self.id_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Identity claims extracted from a verified ID token.
///
/// Every claim is optional; absent claims stay at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub sub: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub middle_name: String,
    pub nickname: String,
    pub preferred_username: String,
    pub profile: String,
    pub picture: String,
    pub website: String,
    pub email: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub email_verified: bool,
    pub gender: String,
    pub birthdate: String,
    pub zoneinfo: String,
    pub locale: String,
    pub phone_number: String,
    #[serde(deserialize_with = "lenient_string")]
    pub updated_at: String,
}

/// Some IdPs send `email_verified` as a string.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    Ok(match Option::<BoolOrString>::deserialize(deserializer)? {
        Some(BoolOrString::Bool(b)) => b,
        Some(BoolOrString::String(s)) => s.eq_ignore_ascii_case("true"),
        None => false,
    })
}

/// `updated_at` is a number in OIDC Core but a string in some deployments.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}
