//! Listing namespaces.

use crate::listing::ListingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The listing context a page belongs to.
///
/// Pages from different namespaces are never mixed in one cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// The full shop listing.
    #[default]
    Shop,
    /// Products in one category, by slug.
    Category(String),
}

impl Namespace {
    /// Namespace for a category slug.
    pub fn category(slug: impl Into<String>) -> Self {
        Namespace::Category(slug.into())
    }

    /// Category slug, if this is a category listing.
    pub fn category_slug(&self) -> Option<&str> {
        match self {
            Namespace::Shop => None,
            Namespace::Category(slug) => Some(slug),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Shop => f.write_str("shop"),
            Namespace::Category(slug) => write!(f, "category:{}", slug),
        }
    }
}

impl FromStr for Namespace {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "shop" {
            return Ok(Namespace::Shop);
        }
        match s.strip_prefix("category:").map(str::trim) {
            Some(slug) if !slug.is_empty() => Ok(Namespace::Category(slug.to_string())),
            _ => Err(ListingError::InvalidNamespace(s.to_string())),
        }
    }
}
