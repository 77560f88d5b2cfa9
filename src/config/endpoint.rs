//! Validated endpoint newtype.

use std::fmt;

use crate::error::ConfigError;

/// The base URL of a Panoptes API deployment.
///
/// Validated on construction: the URL must carry an `http://` or `https://`
/// scheme and a non-empty host. A trailing slash is stripped so paths can be
/// appended directly.
///
/// # Example
///
/// ```rust
/// use panoptes_api::Endpoint;
///
/// let endpoint = Endpoint::new("https://panoptes.zooniverse.org/").unwrap();
/// assert_eq!(endpoint.as_ref(), "https://panoptes.zooniverse.org");
///
/// assert!(Endpoint::new("panoptes.zooniverse.org").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Creates a validated endpoint from a URL string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if the URL has no http(s)
    /// scheme or no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim_end_matches('/');

        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"));

        match rest {
            Some(host) if !host.is_empty() => Ok(Self(trimmed.to_string())),
            _ => Err(ConfigError::InvalidEndpoint { url }),
        }
    }

    /// Returns the default production endpoint, `https://panoptes.zooniverse.org`.
    #[must_use]
    pub fn production() -> Self {
        Self("https://panoptes.zooniverse.org".to_string())
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::production()
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
