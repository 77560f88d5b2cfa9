//! Authentication state for a Panoptes client.
//!
//! This module provides [`AuthState`], the mutable login/token state owned by
//! a [`Panoptes`](crate::Panoptes) client, and the token endpoint response
//! type.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Mutable authentication state for one client.
///
/// Holds the stored credentials, the `logged_in` flag set by a successful
/// sign-in, and the OAuth bearer/refresh token pair with its expiry. The
/// client keeps this behind a mutex; it is never shared across clients.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    /// Stored username, if any.
    pub(crate) username: Option<String>,
    /// Stored password, if any.
    pub(crate) password: Option<String>,
    /// Whether a sign-in has succeeded on this client.
    pub(crate) logged_in: bool,
    /// The current OAuth bearer token.
    pub(crate) bearer_token: Option<String>,
    /// The refresh token paired with the bearer token.
    pub(crate) refresh_token: Option<String>,
    /// When the bearer token expires.
    pub(crate) bearer_expires: Option<DateTime<Utc>>,
}

impl AuthState {
    /// Creates auth state with optional stored credentials.
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            username,
            password,
            ..Self::default()
        }
    }

    /// Returns `true` if a sign-in has succeeded.
    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.logged_in
    }

    /// Returns `true` if the cached bearer token has expired.
    ///
    /// A token without a recorded expiry is treated as expired.
    #[must_use]
    pub fn bearer_expired(&self) -> bool {
        self.bearer_expires.map_or(true, |expires| Utc::now() >= expires)
    }

    /// Returns `true` if a token must be acquired or refreshed: either no
    /// token is cached, or the cached one has expired.
    #[must_use]
    pub fn needs_token(&self) -> bool {
        self.bearer_token.is_none() || self.bearer_expired()
    }

    /// Stores a token endpoint response, computing the expiry from the
    /// server-declared lifetime.
    pub(crate) fn apply_token_response(&mut self, response: TokenResponse) {
        self.bearer_expires = Some(Utc::now() + Duration::seconds(response.expires_in));
        self.bearer_token = Some(response.access_token);
        self.refresh_token = Some(response.refresh_token);
    }
}

/// Successful response from the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}
