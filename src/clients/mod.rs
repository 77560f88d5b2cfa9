//! HTTP client layer for the Panoptes API.
//!
//! This module contains the [`Panoptes`] client (session, auth flows, and
//! request dispatcher), its raw response type, and the HTTP-level errors.

mod errors;
mod http_client;
mod http_response;

pub use errors::ClientError;
pub use http_client::{Headers, HttpMethod, Panoptes, Params};
pub use http_response::ApiResponse;
