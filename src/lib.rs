//! # Panoptes API for Rust
//!
//! A Rust SDK for the [Panoptes](https://www.zooniverse.org) citizen
//! science API: authenticated sessions, a JSON request dispatcher, and
//! schema-less resource objects with edit tracking, pagination, and
//! explicit link resolution.
//!
//! ## Features
//!
//! - **Sessions**: cookie-based sign-in with CSRF handling, OAuth bearer
//!   tokens acquired and refreshed on demand, and a silent anonymous
//!   read-only mode when no credentials are configured.
//! - **Dispatcher**: layered header composition, versioned accept header,
//!   and unwrapping of the API's JSON error envelope.
//! - **Resources**: raw JSON payloads behind a typed editable-attribute
//!   whitelist, with per-attribute edit tracking so updates send only what
//!   changed, guarded by `ETag`/`If-Match` preconditions.
//! - **Pagination**: lazy page-by-page cursors over listing responses.
//! - **Links**: an explicit slug-to-type registry; resolving a link through
//!   the wrong type is an error, not a guess.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use panoptes_api::{Panoptes, PanoptesConfig};
//! use panoptes_api::rest::{Resource, resources::Project};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PanoptesConfig::builder()
//!         .username("example")
//!         .password("hunter2")
//!         .build()?;
//!     let client = Panoptes::new(config);
//!
//!     let mut projects = Resource::<Project>::find(&client, Some("1234"), None).await?;
//!     if let Some(mut project) = projects.next().await? {
//!         project.set_attr("display_name", json!("Galaxy Zoo"))?;
//!         project.save(&client).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Applications that want one shared client can install it with
//! [`Panoptes::connect`] and fetch it anywhere with [`Panoptes::client`];
//! library code should keep taking `&Panoptes` explicitly.

pub mod auth;
pub mod clients;
pub mod config;
mod error;
pub mod rest;

pub use auth::AuthState;
pub use clients::{ApiResponse, ClientError, Headers, HttpMethod, Panoptes, Params};
pub use config::{Endpoint, PanoptesConfig, PanoptesConfigBuilder};
pub use error::ConfigError;
pub use rest::{
    EditAttr, LinkRegistry, LinkResolver, Resource, ResourceError, ResourceType, ResultPaginator,
};
