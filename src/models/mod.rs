// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod profile;
pub mod session;
pub mod user;

pub use profile::{Profile, ProviderDescriptor, TokenSet};
pub use session::{Session, SessionCookie, SESSION_COOKIE_NAME};
pub use user::{Account, User};
