//! Schema-less resource objects with edit tracking.
//!
//! A [`Resource`] wraps one JSON fragment from the API. The payload stays a
//! raw JSON map rather than a typed struct; what a resource type declares
//! statically is its naming (slugs) and which attributes are editable, via
//! the [`ResourceType`] trait. Writes are tracked per attribute so updates
//! send only what changed.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use serde_json::{json, Map, Value};

use crate::clients::{Headers, Panoptes, Params};
use crate::rest::errors::ResourceError;
use crate::rest::links::LinkResolver;
use crate::rest::paginator::ResultPaginator;

/// One editable attribute declaration.
#[derive(Clone, Copy, Debug)]
pub enum EditAttr {
    /// A plain top-level attribute.
    Field(&'static str),
    /// A nested object attribute, saved as an object built from the listed
    /// fields one level down.
    Nested {
        /// The top-level key of the nested object.
        key: &'static str,
        /// The fields of the nested object that are sent on save.
        fields: &'static [&'static str],
    },
}

impl EditAttr {
    /// Returns the top-level key this declaration covers.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Field(name) => name,
            Self::Nested { key, .. } => key,
        }
    }
}

/// Static description of one API resource type.
///
/// Implementations carry no data; they name the endpoint slugs and declare
/// the editable attribute set. See [`resources`](crate::rest::resources)
/// for the built-in types.
pub trait ResourceType: Send + Sync + 'static {
    /// Human-readable singular name, used in error messages.
    const NAME: &'static str;
    /// Plural endpoint slug: URL segment, envelope key, and pagination
    /// metadata key.
    const SLUG: &'static str;
    /// Singular slug used as a link name on other resources.
    const LINK_SLUG: &'static str;
    /// The attributes a caller may assign and that save sends.
    const EDIT_ATTRIBUTES: &'static [EditAttr];
}

/// A single API resource with its payload, `ETag`, and edit tracking.
pub struct Resource<T: ResourceType> {
    raw: Map<String, Value>,
    etag: Option<String>,
    modified: BTreeSet<&'static str>,
    _type: PhantomData<fn() -> T>,
}

// Manual impls keep the marker type free of Clone/Debug bounds.
impl<T: ResourceType> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            etag: self.etag.clone(),
            modified: self.modified.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: ResourceType> std::fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("type", &T::NAME)
            .field("id", &self.id())
            .field("etag", &self.etag)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl<T: ResourceType> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceType> Resource<T> {
    /// Creates an empty, unsaved resource.
    ///
    /// Every editable attribute starts out present and null, so a fresh
    /// resource can be assigned and saved without fetching anything first.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: default_raw::<T>(),
            etag: None,
            modified: BTreeSet::new(),
            _type: PhantomData,
        }
    }

    /// Wraps a fetched payload fragment.
    ///
    /// Editable attributes the fragment omits are filled in as null.
    #[must_use]
    pub fn from_raw(raw: Map<String, Value>, etag: Option<String>) -> Self {
        let mut resource = Self::new();
        resource.set_raw(raw, etag);
        resource
    }

    /// Replaces the payload wholesale, resetting edit tracking.
    pub(crate) fn set_raw(&mut self, raw: Map<String, Value>, etag: Option<String>) {
        self.raw = default_raw::<T>();
        self.raw.extend(raw);
        self.etag = etag;
        self.modified.clear();
    }

    /// Returns the resource id, if the payload carries one.
    ///
    /// Ids arrive as strings but are normalized from numbers too.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.raw.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Returns the `ETag` captured when this payload was fetched.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns `true` if any attribute has been assigned since the last
    /// fetch or save.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.modified.is_empty()
    }

    /// Reads an attribute from the payload.
    ///
    /// Reading `id` on an unsaved resource yields null rather than an
    /// error; a null id is how an unsaved resource is recognized.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::UnknownAttribute`] if the payload has no
    /// such key.
    pub fn attr(&self, name: &str) -> Result<&Value, ResourceError> {
        match self.raw.get(name) {
            Some(value) => Ok(value),
            None if name == "id" => Ok(&Value::Null),
            None => Err(ResourceError::UnknownAttribute {
                resource: T::NAME,
                field: name.to_string(),
            }),
        }
    }

    /// Assigns an editable attribute and marks it modified.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ReadOnlyAttribute`] if the attribute is not
    /// in the type's editable set.
    pub fn set_attr(&mut self, name: &str, value: Value) -> Result<(), ResourceError> {
        let Some(attr) = T::EDIT_ATTRIBUTES.iter().find(|attr| attr.key() == name) else {
            return Err(ResourceError::ReadOnlyAttribute {
                field: name.to_string(),
            });
        };

        self.raw.insert(attr.key().to_string(), value);
        self.modified.insert(attr.key());
        Ok(())
    }

    /// Builds the attribute map sent on save.
    ///
    /// For a create every editable attribute is included; for an update only
    /// the modified ones. Nested declarations are rebuilt as objects from
    /// their listed fields.
    #[must_use]
    pub fn savable_dict(&self, modified_only: bool) -> Map<String, Value> {
        let mut dict = Map::new();
        for attr in T::EDIT_ATTRIBUTES {
            if modified_only && !self.modified.contains(attr.key()) {
                continue;
            }
            match attr {
                EditAttr::Field(name) => {
                    dict.insert(
                        (*name).to_string(),
                        self.raw.get(*name).cloned().unwrap_or(Value::Null),
                    );
                }
                EditAttr::Nested { key, fields } => {
                    let source = self.raw.get(*key).and_then(Value::as_object);
                    let mut nested = Map::new();
                    for field in *fields {
                        nested.insert(
                            (*field).to_string(),
                            source
                                .and_then(|object| object.get(*field))
                                .cloned()
                                .unwrap_or(Value::Null),
                        );
                    }
                    dict.insert((*key).to_string(), Value::Object(nested));
                }
            }
        }
        dict
    }

    /// Builds an API path under this type's slug, skipping empty segments.
    #[must_use]
    pub fn url(segments: &[&str]) -> String {
        let mut url = format!("/{}", T::SLUG);
        for segment in segments {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }

    /// Fetches resources of this type, returning a paginator over the
    /// results.
    ///
    /// With an `id` the listing is scoped to that single resource; without
    /// one it walks the full (optionally filtered) collection.
    ///
    /// # Errors
    ///
    /// Propagates HTTP and API errors from the fetch.
    pub async fn find<'a>(
        client: &'a Panoptes,
        id: Option<&str>,
        params: Option<&Params>,
    ) -> Result<ResultPaginator<'a, T>, ResourceError> {
        let path = Self::url(&[id.unwrap_or("")]);
        let (response, etag) = client.get(&path, params, None).await?;
        Ok(ResultPaginator::new(client, &response, etag))
    }

    /// Performs a raw GET scoped under this type's slug.
    ///
    /// # Errors
    ///
    /// Propagates HTTP and API errors from the fetch.
    pub async fn get(
        client: &Panoptes,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
    ) -> Result<(Value, Option<String>), ResourceError> {
        let path = Self::url(&[path]);
        Ok(client.get(&path, params, headers).await?)
    }

    /// Saves the resource: a create for a new resource, an update sending
    /// only the modified attributes for an existing one.
    ///
    /// Updates carry the captured `ETag` as an `If-Match` precondition, so
    /// a concurrent edit surfaces as an API error instead of a silent
    /// overwrite. After the write the resource is re-fetched wholesale and
    /// edit tracking resets.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingId`] if the save response carries no
    /// id, [`ResourceError::NotFound`] if the re-fetch comes back empty,
    /// and propagates HTTP and API errors (including the stale-`ETag`
    /// conflict).
    pub async fn save(&mut self, client: &Panoptes) -> Result<(), ResourceError> {
        let response = match self.id() {
            None => {
                let body = json!({ T::SLUG: self.savable_dict(false) });
                tracing::debug!(resource = T::NAME, "creating resource");
                client.post(&Self::url(&[]), None, None, Some(&body), None).await?
            }
            Some(id) => {
                let body = json!({ T::SLUG: self.savable_dict(true) });
                tracing::debug!(resource = T::NAME, %id, "updating resource");
                client
                    .put(&Self::url(&[&id]), None, None, Some(&body), self.etag())
                    .await?
            }
        };

        let id = response
            .0
            .get(T::SLUG)
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(|fragment| fragment.get("id"))
            .and_then(id_as_string)
            .ok_or(ResourceError::MissingId { resource: T::NAME })?;

        // Record the id before refreshing, so a failed re-fetch still
        // leaves the resource identified and the fetch retryable.
        self.raw.insert("id".to_string(), Value::String(id.clone()));

        let mut refreshed = Self::find(client, Some(&id), None).await?;
        let fresh = refreshed
            .next()
            .await?
            .ok_or_else(|| ResourceError::NotFound {
                resource: T::NAME,
                id: id.clone(),
            })?;
        self.set_raw(fresh.raw, fresh.etag);
        Ok(())
    }

    /// Returns a resolver over this resource's `links` payload.
    ///
    /// A payload without a `links` key yields a resolver for which every
    /// lookup reports a missing link.
    #[must_use]
    pub fn links(&self) -> LinkResolver<'_> {
        LinkResolver::new(self.raw.get("links").and_then(Value::as_object))
    }
}

/// Normalizes an id value that may be a string or a number.
fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Builds the default payload for a type: every editable attribute present
/// and null, nested objects pre-shaped with null fields.
fn default_raw<T: ResourceType>() -> Map<String, Value> {
    let mut raw = Map::new();
    for attr in T::EDIT_ATTRIBUTES {
        match attr {
            EditAttr::Field(name) => {
                raw.insert((*name).to_string(), Value::Null);
            }
            EditAttr::Nested { key, fields } => {
                let mut nested = Map::new();
                for field in *fields {
                    nested.insert((*field).to_string(), Value::Null);
                }
                raw.insert((*key).to_string(), Value::Object(nested));
            }
        }
    }
    raw
}
