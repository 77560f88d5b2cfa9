//! Link registration and resolution.
//!
//! Resources reference each other through a `links` object in their
//! payload, keyed by slug and holding bare ids. The [`LinkRegistry`] maps
//! those slugs to resource types explicitly; the [`LinkResolver`] reads a
//! resource's links and fetches the targets.

use std::any::TypeId;
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::clients::Panoptes;
use crate::rest::errors::ResourceError;
use crate::rest::resource::{Resource, ResourceType};
use crate::rest::resources::{Classification, Project, SubjectSet, Workflow};

#[derive(Clone, Copy, Debug)]
struct LinkEntry {
    type_id: TypeId,
    name: &'static str,
}

/// Maps link slugs to resource types.
///
/// Registration is explicit: a slug resolves only to a type registered for
/// it, and resolving through the wrong type is an error rather than a
/// guess. Each type is registered under both its singular link slug and its
/// plural endpoint slug, matching how the API names scalar and collection
/// links.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    entries: HashMap<&'static str, LinkEntry>,
}

impl LinkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in resource types registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<Project>();
        registry.register::<Workflow>();
        registry.register::<SubjectSet>();
        registry.register::<Classification>();
        registry
    }

    /// Registers a resource type under its singular and plural slugs.
    pub fn register<T: ResourceType>(&mut self) {
        let entry = LinkEntry {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
        };
        self.entries.insert(T::LINK_SLUG, entry);
        self.entries.insert(T::SLUG, entry);
    }

    /// Returns `true` if the slug has a registration.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Checks that `name` is registered and registered as `T`.
    fn expect<T: ResourceType>(&self, name: &str) -> Result<(), ResourceError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ResourceError::UnknownLink {
                name: name.to_string(),
            })?;
        if entry.type_id != TypeId::of::<T>() {
            return Err(ResourceError::LinkTypeMismatch {
                name: name.to_string(),
                registered: entry.name,
                requested: T::NAME,
            });
        }
        Ok(())
    }
}

/// Resolves the links of one resource payload.
///
/// Produced by [`Resource::links`](crate::rest::Resource::links); borrows
/// the payload, so resolve links before mutating the resource.
#[derive(Clone, Copy, Debug)]
pub struct LinkResolver<'a> {
    links: Option<&'a Map<String, Value>>,
}

impl<'a> LinkResolver<'a> {
    pub(crate) const fn new(links: Option<&'a Map<String, Value>>) -> Self {
        Self { links }
    }

    /// Reads a raw link value.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingLink`] if the payload has no such
    /// link.
    pub fn get(&self, name: &str) -> Result<&'a Value, ResourceError> {
        self.links
            .and_then(|links| links.get(name))
            .ok_or_else(|| ResourceError::MissingLink {
                name: name.to_string(),
            })
    }

    /// Resolves a scalar link to its target resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownLink`] for an unregistered slug,
    /// [`ResourceError::LinkTypeMismatch`] when the registration does not
    /// match `T`, [`ResourceError::LinkIsCollection`] when the link holds a
    /// list, and [`ResourceError::NotFound`] when the target fetch comes
    /// back empty.
    pub async fn resolve<T: ResourceType>(
        &self,
        client: &Panoptes,
        name: &str,
    ) -> Result<Resource<T>, ResourceError> {
        client.registry().expect::<T>(name)?;
        let value = self.get(name)?;
        if value.is_array() {
            return Err(ResourceError::LinkIsCollection {
                name: name.to_string(),
            });
        }
        let id = link_id(name, value)?;
        fetch_one::<T>(client, &id).await
    }

    /// Resolves a collection link, fetching every target eagerly.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve), except a scalar link reports
    /// [`ResourceError::LinkIsScalar`].
    pub async fn resolve_all<T: ResourceType>(
        &self,
        client: &Panoptes,
        name: &str,
    ) -> Result<Vec<Resource<T>>, ResourceError> {
        client.registry().expect::<T>(name)?;
        let value = self.get(name)?;
        let Some(ids) = value.as_array() else {
            return Err(ResourceError::LinkIsScalar {
                name: name.to_string(),
            });
        };

        let mut resources = Vec::with_capacity(ids.len());
        for id in ids {
            let id = link_id(name, id)?;
            resources.push(fetch_one::<T>(client, &id).await?);
        }
        Ok(resources)
    }
}

async fn fetch_one<T: ResourceType>(
    client: &Panoptes,
    id: &str,
) -> Result<Resource<T>, ResourceError> {
    Resource::<T>::find(client, Some(id), None)
        .await?
        .next()
        .await?
        .ok_or_else(|| ResourceError::NotFound {
            resource: T::NAME,
            id: id.to_string(),
        })
}

/// Extracts the target id from a link value: a bare id, or an object
/// carrying an `id` field.
fn link_id(name: &str, value: &Value) -> Result<String, ResourceError> {
    match value {
        Value::String(id) => Ok(id.clone()),
        Value::Number(id) => Ok(id.to_string()),
        Value::Object(object) => match object.get("id") {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(ResourceError::LinkShape {
                name: name.to_string(),
            }),
        },
        _ => Err(ResourceError::LinkShape {
            name: name.to_string(),
        }),
    }
}
