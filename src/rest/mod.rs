//! Resource layer: schema-less resource objects, pagination, and link
//! resolution on top of the HTTP client.

mod errors;
mod links;
mod paginator;
mod resource;
pub mod resources;

pub use errors::ResourceError;
pub use links::{LinkRegistry, LinkResolver};
pub use paginator::ResultPaginator;
pub use resource::{EditAttr, Resource, ResourceType};
