//! The seam between the page cache and the store API.

use crate::error::ApiError;
use crate::listing::{PageQuery, ProductPage};
use async_trait::async_trait;

/// Fetches product pages.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch one page. Implementations do not cache.
    async fn fetch_page(&self, query: &PageQuery) -> Result<ProductPage, ApiError>;
}
