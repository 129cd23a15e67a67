//! Product listings.
//!
//! Contains listing namespaces, page queries, the product source seam and
//! the paginated page cache.

mod cache;
mod namespace;
mod page;
mod query;
mod source;

pub use crate::error::ListingError;
pub use cache::{PageCache, PageView};
pub use namespace::Namespace;
pub use page::{Pagination, ProductPage};
pub use query::{PageQuery, SortOption, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use source::ProductSource;
