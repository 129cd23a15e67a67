//! Page queries sent to the product source.

use crate::listing::Namespace;
use serde::{Deserialize, Serialize};

/// Default page size used by the storefront.
pub const DEFAULT_PER_PAGE: u32 = 12;

/// Largest page size the store API accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Sort order for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOption {
    /// Store-defined order.
    #[default]
    Position,
    /// Sort by newest first.
    Newest,
    /// Sort by price, low to high.
    PriceAsc,
    /// Sort by price, high to low.
    PriceDesc,
    /// Sort by name A-Z.
    NameAsc,
    /// Sort by best selling.
    BestSelling,
}

impl SortOption {
    /// `orderby` and `order` query values.
    pub fn to_query(&self) -> (&'static str, &'static str) {
        match self {
            SortOption::Position => ("menu_order", "asc"),
            SortOption::Newest => ("date", "desc"),
            SortOption::PriceAsc => ("price", "asc"),
            SortOption::PriceDesc => ("price", "desc"),
            SortOption::NameAsc => ("title", "asc"),
            SortOption::BestSelling => ("popularity", "desc"),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortOption::Position => "Featured",
            SortOption::Newest => "Newest",
            SortOption::PriceAsc => "Price: Low to High",
            SortOption::PriceDesc => "Price: High to Low",
            SortOption::NameAsc => "Name: A-Z",
            SortOption::BestSelling => "Best Selling",
        }
    }
}

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageQuery {
    pub namespace: Namespace,
    /// Page number (1-indexed).
    pub page: u32,
    pub per_page: u32,
    pub sort: SortOption,
}

impl PageQuery {
    /// Create a query. `per_page` is clamped to 1..=MAX_PER_PAGE.
    pub fn new(namespace: Namespace, page: u32, per_page: u32) -> Self {
        Self {
            namespace,
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            sort: SortOption::default(),
        }
    }

    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    /// Query-string pairs shared by every product listing request.
    ///
    /// The category filter is added by the source, which knows how to
    /// resolve the slug.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let (orderby, order) = self.sort.to_query();
        vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("status".to_string(), "publish".to_string()),
            ("orderby".to_string(), orderby.to_string()),
            ("order".to_string(), order.to_string()),
        ]
    }
}
