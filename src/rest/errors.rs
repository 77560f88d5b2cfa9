//! Resource-level error types.
//!
//! Errors raised by resource objects, paginators, and link resolution.
//! HTTP-level failures pass through transparently as
//! [`ResourceError::Client`].

use thiserror::Error;

use crate::clients::ClientError;

/// Errors from resource objects and link resolution.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// An attribute outside the editable set was assigned.
    #[error("Attribute '{field}' is not editable")]
    ReadOnlyAttribute {
        /// The attribute name that was assigned.
        field: String,
    },

    /// An attribute was read that the fetched payload does not contain.
    #[error("{resource} has no attribute '{field}'")]
    UnknownAttribute {
        /// The resource type name.
        resource: &'static str,
        /// The attribute name that was read.
        field: String,
    },

    /// A link name is not present on the resource's payload.
    #[error("No link named '{name}'")]
    MissingLink {
        /// The link name that was requested.
        name: String,
    },

    /// A link name has no registered resource type.
    #[error("Link '{name}' has no registered resource type")]
    UnknownLink {
        /// The link name that was requested.
        name: String,
    },

    /// A link resolved to a different resource type than requested.
    #[error("Link '{name}' is registered as {registered}, not {requested}")]
    LinkTypeMismatch {
        /// The link name that was requested.
        name: String,
        /// The type the registry holds for this link.
        registered: &'static str,
        /// The type the caller asked for.
        requested: &'static str,
    },

    /// A scalar link was resolved where the payload holds a collection.
    #[error("Link '{name}' is a collection; use resolve_all")]
    LinkIsCollection {
        /// The link name that was requested.
        name: String,
    },

    /// A collection link was resolved where the payload holds a scalar.
    #[error("Link '{name}' is a single resource; use resolve")]
    LinkIsScalar {
        /// The link name that was requested.
        name: String,
    },

    /// A link value was neither an id, an object with an id, nor a list.
    #[error("Link '{name}' has an unrecognized shape")]
    LinkShape {
        /// The link name that was requested.
        name: String,
    },

    /// A save response did not include the resource id.
    #[error("No id for saved {resource}")]
    MissingId {
        /// The resource type name.
        resource: &'static str,
    },

    /// A fetch by id returned no matching resource.
    #[error("Could not find {resource} with id '{id}'")]
    NotFound {
        /// The resource type name.
        resource: &'static str,
        /// The id that was requested.
        id: String,
    },

    /// An HTTP-level failure.
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_attribute_message() {
        let error = ResourceError::ReadOnlyAttribute {
            field: "id".to_string(),
        };
        assert_eq!(error.to_string(), "Attribute 'id' is not editable");
    }

    #[test]
    fn test_not_found_message_names_resource_and_id() {
        let error = ResourceError::NotFound {
            resource: "project",
            id: "1234".to_string(),
        };
        assert_eq!(error.to_string(), "Could not find project with id '1234'");
    }

    #[test]
    fn test_client_error_is_transparent() {
        let inner = ClientError::Server { status: 500 };
        let expected = inner.to_string();
        let error = ResourceError::from(inner);
        assert_eq!(error.to_string(), expected);
    }
}
