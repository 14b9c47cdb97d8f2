//! Remote catalog seam.
//!
//! The engine only needs two reads from the catalog; everything about the
//! transport stays behind [`CatalogClient`].

pub mod http;

use crate::core::{Entity, PageResponse, Result};
use async_trait::async_trait;

pub use http::HttpCatalogClient;

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch page `page` (1-based), filtered by name substring when
    /// `name_filter` is set. `Ok(None)` means the catalog answered with an
    /// empty body.
    async fn fetch_page(
        &self,
        page: u32,
        name_filter: Option<&str>,
    ) -> Result<Option<PageResponse>>;

    /// Fetch one entity. `Ok(None)` means the catalog answered with an
    /// empty body; an unknown id is an error.
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Entity>>;
}
