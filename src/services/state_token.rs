// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Self-verifying OAuth `state` tokens.
//!
//! A token is `value|digest` where `value` is a random hex nonce plus the
//! issue time, and `digest` is HMAC-SHA256 over `value` keyed with a key
//! derived from `AUTH_SECRET`. Nothing is stored server-side: a token is
//! valid exactly when the digest matches and (optionally) it is fresh.

use crate::error::{AuthError, Result};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Separator between value and digest.
pub const STATE_SEPARATOR: char = '|';

/// Separator between nonce and issue time inside the value.
const ISSUED_AT_SEPARATOR: char = '.';

/// Default nonce size in bytes.
pub const DEFAULT_NONCE_BYTES: usize = 16;

const HKDF_SALT: &[u8] = b"authbridge/v1";
const HKDF_INFO: &[u8] = b"oauth-state-token";
const CLOCK_SKEW_SECS: u64 = 60;

/// Generates and verifies state tokens.
pub struct StateTokenSigner {
    key: [u8; 32],
    max_age: Option<Duration>,
    rng: SystemRandom,
}

impl StateTokenSigner {
    /// Create a signer from the service secret.
    ///
    /// `max_age` bounds how long a token stays valid; `None` makes validity
    /// depend on the secret alone.
    pub fn new(secret: &[u8], max_age: Option<Duration>) -> Result<Self> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret);
        let mut key = [0u8; 32];
        hk.expand(HKDF_INFO, &mut key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("HKDF expand failed: {}", e)))?;

        Ok(Self {
            key,
            max_age,
            rng: SystemRandom::new(),
        })
    }

    /// Generate a token carrying `size` random bytes.
    pub fn generate(&self, size: usize) -> Result<String> {
        let mut nonce = vec![0u8; size];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| AuthError::Internal(anyhow::anyhow!("system RNG failure")))?;

        self.sign_value(&hex::encode(nonce), now_unix_secs())
    }

    /// Check a token's digest in constant time, then its age.
    pub fn verify(&self, token: &str) -> bool {
        let parts: Vec<&str> = token.split(STATE_SEPARATOR).collect();
        if parts.len() != 2 {
            return false;
        }

        let (value, digest) = (parts[0], parts[1]);
        let Ok(expected) = self.digest(value) else {
            return false;
        };

        if !bool::from(expected.as_bytes().ct_eq(digest.as_bytes())) {
            tracing::warn!("OAuth state signature mismatch");
            return false;
        }

        let Some(issued_at) = value
            .rsplit_once(ISSUED_AT_SEPARATOR)
            .and_then(|(_, ts)| u64::from_str_radix(ts, 16).ok())
        else {
            return false;
        };

        self.is_fresh(issued_at, now_unix_secs())
    }

    fn is_fresh(&self, issued_at: u64, now: u64) -> bool {
        let Some(max_age) = self.max_age else {
            return true;
        };

        if issued_at > now + CLOCK_SKEW_SECS {
            return false;
        }

        now.saturating_sub(issued_at) <= max_age.as_secs()
    }

    pub(crate) fn sign_value(&self, nonce_hex: &str, issued_at: u64) -> Result<String> {
        let value = format!("{}{}{:x}", nonce_hex, ISSUED_AT_SEPARATOR, issued_at);
        let digest = self.digest(&value)?;
        Ok(format!("{}{}{}", value, STATE_SEPARATOR, digest))
    }

    fn digest(&self, value: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(value.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> StateTokenSigner {
        StateTokenSigner::new(b"secret_key_for_state_tokens_0000", None).unwrap()
    }

    #[test]
    fn test_generate_then_verify() {
        let signer = signer();
        for size in [1, 16, 32, 64] {
            let token = signer.generate(size).unwrap();
            assert!(signer.verify(&token), "token of size {size} should verify");
        }
    }

    #[test]
    fn test_token_shape() {
        let token = signer().generate(DEFAULT_NONCE_BYTES).unwrap();
        let (value, digest) = token.split_once(STATE_SEPARATOR).unwrap();
        let (nonce, _) = value.split_once(ISSUED_AT_SEPARATOR).unwrap();
        assert_eq!(nonce.len(), DEFAULT_NONCE_BYTES * 2);
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_tokens_are_unique() {
        let signer = signer();
        let a = signer.generate(DEFAULT_NONCE_BYTES).unwrap();
        let b = signer.generate(DEFAULT_NONCE_BYTES).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_flipped_digest_character_rejected() {
        let signer = signer();
        let token = signer.generate(DEFAULT_NONCE_BYTES).unwrap();
        let digest_start = token.find(STATE_SEPARATOR).unwrap() + 1;

        for i in digest_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(!signer.verify(&tampered), "flip at {i} should fail");
        }
    }

    #[test]
    fn test_tampered_value_rejected() {
        let signer = signer();
        let token = signer.generate(DEFAULT_NONCE_BYTES).unwrap();
        let first = if token.starts_with('f') { "e" } else { "f" };
        let tampered = format!("{}{}", first, &token[1..]);
        assert!(!signer.verify(&tampered));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let signer = signer();
        assert!(!signer.verify("invalid"));
        assert!(!signer.verify("malformed|token|extra"));
        assert!(!signer.verify(""));
        assert!(!signer.verify("|"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = signer().generate(DEFAULT_NONCE_BYTES).unwrap();
        let other = StateTokenSigner::new(b"a_completely_different_secret_00", None).unwrap();
        assert!(!other.verify(&token));
    }

    #[test]
    fn test_max_age_enforced() {
        let signer = StateTokenSigner::new(
            b"secret_key_for_state_tokens_0000",
            Some(Duration::from_secs(600)),
        )
        .unwrap();
        let now = now_unix_secs();

        let fresh = signer.sign_value("abcd", now - 10).unwrap();
        assert!(signer.verify(&fresh));

        let stale = signer.sign_value("abcd", now - 601).unwrap();
        assert!(!signer.verify(&stale));

        let future = signer.sign_value("abcd", now + 3600).unwrap();
        assert!(!signer.verify(&future));
    }

    #[test]
    fn test_no_max_age_accepts_old_tokens() {
        let signer = signer();
        let old = signer.sign_value("abcd", 1).unwrap();
        assert!(signer.verify(&old));
    }
}
