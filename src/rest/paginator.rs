//! Pagination over listing responses.
//!
//! The API returns listings as `{ "<slug>": [fragments], "meta": { "<slug>":
//! { page, page_count, next_href } } }`. [`ResultPaginator`] walks those
//! pages one resource at a time, fetching the next page on demand.

use std::marker::PhantomData;

use serde_json::Value;

use crate::clients::Panoptes;
use crate::rest::errors::ResourceError;
use crate::rest::resource::{Resource, ResourceType};

/// An iterator-style cursor over a paginated listing.
///
/// Call [`next`](Self::next) until it yields `None`. Pages are fetched
/// lazily; every resource shares the `ETag` captured with the first page,
/// which is the one save uses for its `If-Match` precondition.
#[derive(Debug)]
pub struct ResultPaginator<'a, T: ResourceType> {
    client: &'a Panoptes,
    etag: Option<String>,
    object_list: Vec<Value>,
    object_index: usize,
    page: u64,
    page_count: u64,
    next_href: Option<String>,
    _type: PhantomData<fn() -> T>,
}

impl<'a, T: ResourceType> ResultPaginator<'a, T> {
    /// Wraps a listing response.
    #[must_use]
    pub fn new(client: &'a Panoptes, response: &Value, etag: Option<String>) -> Self {
        let mut paginator = Self {
            client,
            etag,
            object_list: Vec::new(),
            object_index: 0,
            page: 1,
            page_count: 1,
            next_href: None,
            _type: PhantomData,
        };
        paginator.set_page(response);
        paginator
    }

    /// Yields the next resource, fetching the next page when the current
    /// one is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates HTTP and API errors from page fetches.
    pub async fn next(&mut self) -> Result<Option<Resource<T>>, ResourceError> {
        while self.object_index >= self.object_list.len() {
            let Some(href) = self.next_href.take() else {
                return Ok(None);
            };
            tracing::debug!(resource = T::NAME, %href, "fetching next page");
            let path = strip_api_prefix(&href);
            let (response, _) = self.client.get(path, None, None).await?;
            self.set_page(&response);
        }

        let fragment = &self.object_list[self.object_index];
        self.object_index += 1;

        let raw = fragment
            .as_object()
            .cloned()
            .unwrap_or_default();
        Ok(Some(Resource::from_raw(raw, self.etag.clone())))
    }

    /// The current page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// The total number of pages reported by the listing.
    #[must_use]
    pub const fn page_count(&self) -> u64 {
        self.page_count
    }

    /// The number of resources on the current page.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.object_list.len()
    }

    /// Loads one listing response: the resource fragments plus the
    /// pagination metadata under `meta.<slug>`, resetting the in-page
    /// cursor.
    ///
    /// Listings without metadata (single-resource fetches) read as a single
    /// page.
    fn set_page(&mut self, response: &Value) {
        self.object_index = 0;
        let meta = response
            .get("meta")
            .and_then(|meta| meta.get(T::SLUG));
        self.page = meta
            .and_then(|meta| meta.get("page"))
            .and_then(Value::as_u64)
            .unwrap_or(1);
        self.page_count = meta
            .and_then(|meta| meta.get("page_count"))
            .and_then(Value::as_u64)
            .unwrap_or(1);
        self.next_href = meta
            .and_then(|meta| meta.get("next_href"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        self.object_list = response
            .get(T::SLUG)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
    }
}

/// Strips the dispatcher's `/api` prefix from a server-supplied href, since
/// the dispatcher adds it back.
fn strip_api_prefix(href: &str) -> &str {
    href.strip_prefix("/api").unwrap_or(href)
}
