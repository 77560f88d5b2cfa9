//! HTTP-level error types.
//!
//! This module contains the error type for the request dispatcher. Errors
//! here are either transport failures, server failures (status >= 500), or
//! API-level errors reported through a JSON `errors` envelope.
//!
//! # Error Handling
//!
//! - [`ClientError::Server`]: the HTTP layer reported a >= 500 status; not
//!   locally recoverable, surfaced immediately.
//! - [`ClientError::Api`]: a parsed JSON response carried an `errors` field,
//!   or a login/token endpoint reported failure. The message aggregates the
//!   server-provided detail.
//! - [`ClientError::Network`] / [`ClientError::Json`]: transport and body
//!   parsing failures from the underlying stack.
//!
//! No retries are performed anywhere; every failure surfaces synchronously
//! to the caller.

use thiserror::Error;

/// Errors from the HTTP request dispatcher.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server responded with a status code >= 500.
    #[error("Received HTTP status code {status} from API")]
    Server {
        /// The HTTP status code of the response.
        status: u16,
    },

    /// The API reported an error through its JSON envelope.
    #[error("{message}")]
    Api {
        /// Aggregated server-provided error detail.
        message: String,
    },

    /// A response header required by the flow was missing.
    #[error("Missing '{header}' header in response")]
    MissingHeader {
        /// The name of the missing header.
        header: &'static str,
    },

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_message_includes_status() {
        let error = ClientError::Server { status: 503 };
        assert_eq!(error.to_string(), "Received HTTP status code 503 from API");
    }

    #[test]
    fn test_api_error_message_is_server_detail() {
        let error = ClientError::Api {
            message: "Conflict".to_string(),
        };
        assert_eq!(error.to_string(), "Conflict");
    }

    #[test]
    fn test_missing_header_message_names_header() {
        let error = ClientError::MissingHeader {
            header: "x-csrf-token",
        };
        assert!(error.to_string().contains("x-csrf-token"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error: &dyn std::error::Error = &ClientError::Server { status: 500 };
        let _ = error;
    }
}
