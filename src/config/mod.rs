//! Configuration for the Panoptes SDK.
//!
//! This module provides [`PanoptesConfig`] and its builder, along with the
//! validated [`Endpoint`] newtype. Configuration is instance-based and passed
//! explicitly; nothing in the core reads global state.
//!
//! # Example
//!
//! ```rust
//! use panoptes_api::{Endpoint, PanoptesConfig};
//!
//! // Anonymous, read-only access against production
//! let config = PanoptesConfig::builder().build().unwrap();
//! assert!(config.username().is_none());
//!
//! // Authenticated access against a staging deployment
//! let config = PanoptesConfig::builder()
//!     .endpoint(Endpoint::new("https://panoptes-staging.zooniverse.org").unwrap())
//!     .username("example")
//!     .password("hunter2")
//!     .build()
//!     .unwrap();
//! ```

mod endpoint;

pub use endpoint::Endpoint;

use crate::error::ConfigError;

/// Known endpoints and the OAuth client id registered for each.
///
/// Endpoints not listed here fall back to [`DEFAULT_CLIENT_ID`].
const ENDPOINT_CLIENT_IDS: &[(&str, &str)] = &[(
    "https://panoptes.zooniverse.org",
    "f79cf5ea821bb161d8cbb52d061ab9a2321d7cb169007003af66b43f7b79ce2a",
)];

/// Fallback OAuth client id for endpoints without a registered id.
const DEFAULT_CLIENT_ID: &str =
    "f79cf5ea821bb161d8cbb52d061ab9a2321d7cb169007003af66b43f7b79ce2a";

/// Configuration for a [`Panoptes`](crate::Panoptes) client.
///
/// Credentials are optional; leaving them unset puts the client in anonymous
/// read-only mode. The OAuth client id defaults per known endpoint, with a
/// fallback for unknown deployments.
#[derive(Clone, Debug)]
pub struct PanoptesConfig {
    endpoint: Endpoint,
    client_id: String,
    username: Option<String>,
    password: Option<String>,
}

impl PanoptesConfig {
    /// Creates a builder for constructing a configuration.
    #[must_use]
    pub fn builder() -> PanoptesConfigBuilder {
        PanoptesConfigBuilder::default()
    }

    /// The API endpoint this configuration targets.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The OAuth client id used for token requests.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The configured username, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The configured password, if any.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Looks up the default client id for an endpoint.
    fn default_client_id(endpoint: &Endpoint) -> String {
        ENDPOINT_CLIENT_IDS
            .iter()
            .find(|(url, _)| *url == endpoint.as_ref())
            .map_or(DEFAULT_CLIENT_ID, |(_, id)| *id)
            .to_string()
    }
}

impl Default for PanoptesConfig {
    /// An anonymous configuration against the production endpoint.
    fn default() -> Self {
        let endpoint = Endpoint::production();
        let client_id = Self::default_client_id(&endpoint);
        Self {
            endpoint,
            client_id,
            username: None,
            password: None,
        }
    }
}

/// Builder for [`PanoptesConfig`].
#[derive(Debug, Default)]
pub struct PanoptesConfigBuilder {
    endpoint: Option<Endpoint>,
    client_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl PanoptesConfigBuilder {
    /// Sets the API endpoint. Defaults to production.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Overrides the OAuth client id.
    ///
    /// When unset, the id is looked up from the known-endpoint table.
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the username for authenticated access.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password for authenticated access.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCredential`] if a credential was set to an
    /// empty string. Omit credentials entirely for anonymous access.
    pub fn build(self) -> Result<PanoptesConfig, ConfigError> {
        if self.username.as_deref() == Some("") {
            return Err(ConfigError::EmptyCredential { field: "username" });
        }
        if self.password.as_deref() == Some("") {
            return Err(ConfigError::EmptyCredential { field: "password" });
        }

        let endpoint = self.endpoint.unwrap_or_default();
        let client_id = self
            .client_id
            .unwrap_or_else(|| PanoptesConfig::default_client_id(&endpoint));

        Ok(PanoptesConfig {
            endpoint,
            client_id,
            username: self.username,
            password: self.password,
        })
    }
}
