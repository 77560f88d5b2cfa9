//! Error types for SDK configuration.
//!
//! This module contains the error type used for configuration and
//! validation failures.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use panoptes_api::{Endpoint, ConfigError};
//!
//! let result = Endpoint::new("panoptes.zooniverse.org");
//! assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during SDK configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The endpoint URL is invalid.
    #[error("Invalid endpoint '{url}'. Expected an http(s) URL such as 'https://panoptes.zooniverse.org'.")]
    InvalidEndpoint {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A credential was explicitly set to an empty string.
    ///
    /// Omit the credential entirely for anonymous access instead.
    #[error("The '{field}' credential cannot be empty. Omit it for anonymous access.")]
    EmptyCredential {
        /// The name of the offending field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_error_message() {
        let error = ConfigError::InvalidEndpoint {
            url: "ftp://example.org".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ftp://example.org"));
        assert!(message.contains("http(s) URL"));
    }

    #[test]
    fn test_empty_credential_error_message() {
        let error = ConfigError::EmptyCredential { field: "username" };
        let message = error.to_string();
        assert!(message.contains("username"));
        assert!(message.contains("anonymous"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptyCredential { field: "password" };
        let _: &dyn std::error::Error = &error;
    }
}
