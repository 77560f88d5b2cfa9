//! HTTP response type for the request dispatcher.

use serde_json::Value;

/// A raw response from the Panoptes API.
///
/// The dispatcher returns this from [`http_request`](crate::Panoptes::http_request)
/// and the raw verb wrappers. The body is kept as text; callers that need
/// JSON go through [`json_request`](crate::Panoptes::json_request), which
/// also unwraps the error envelope.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The `ETag` header value, if the server sent one.
    pub etag: Option<String>,
    /// The raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
