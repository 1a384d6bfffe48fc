// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sessions and the cookie that carries them.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Persisted login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unguessable session token (cookie value)
    #[serde(skip_serializing)]
    pub session_token: String,
    pub user_id: String,
    pub expires: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

/// Transport-neutral description of the session cookie set after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub value: String,
    pub expires: DateTime<Utc>,
}

impl SessionCookie {
    pub fn for_session(session: &Session) -> Self {
        Self {
            value: session.session_token.clone(),
            expires: session.expires,
        }
    }

    /// Build the cookie: `HttpOnly; Secure; SameSite=Strict; Path=/` with an
    /// `Expires` attribute matching the session.
    pub fn to_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((SESSION_COOKIE_NAME, self.value.clone()))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict);

        match time::OffsetDateTime::from_unix_timestamp(self.expires.timestamp()) {
            Ok(expires) => builder = builder.expires(expires),
            Err(e) => tracing::warn!(error = %e, "Session expiry out of cookie range"),
        }

        builder.build()
    }

    /// Full `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        self.to_cookie().to_string()
    }

    /// Cookie that removes the session cookie from the browser.
    pub fn removal() -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .build();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = SessionCookie {
            value: "tok123".to_string(),
            expires: Utc.with_ymd_and_hms(2026, 10, 21, 7, 28, 0).unwrap(),
        };

        let header = cookie.header_value();
        assert!(header.starts_with("session=tok123"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Strict"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Expires=Wed, 21 Oct 2026 07:28:00 GMT"));
    }

    #[test]
    fn test_removal_cookie() {
        let header = SessionCookie::removal().to_string();
        assert!(header.starts_with("session="));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            session_token: "t".to_string(),
            user_id: "u".to_string(),
            expires: now,
        };
        assert!(session.is_expired(now));
        assert!(!session.is_expired(now - chrono::Duration::seconds(1)));
    }
}
