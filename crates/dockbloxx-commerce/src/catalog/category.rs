//! Category types for product organization.

use crate::ids::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category as listed by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    /// Parent category ID (None for root categories).
    pub parent_id: Option<CategoryId>,
    pub name: String,
    /// URL-friendly slug, also used to name listing namespaces.
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Number of published products in this category.
    pub product_count: u64,
}

impl Category {
    /// Check if this is a root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Direct children of this category within `all`.
    pub fn children<'a>(&self, all: &'a [Category]) -> Vec<&'a Category> {
        all.iter().filter(|c| c.parent_id == Some(self.id)).collect()
    }

    /// Short reference as embedded in products and cart items.
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// A category reference carried on products and cart items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: u64, parent: Option<u64>, slug: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: String::new(),
            image_url: None,
            product_count: 0,
        }
    }

    #[test]
    fn test_root_category() {
        let cat = category(1, None, "accessories");
        assert!(cat.is_root());
        assert_eq!(cat.to_ref().slug, "accessories");
    }

    #[test]
    fn test_children() {
        let all = vec![
            category(1, None, "accessories"),
            category(2, Some(1), "rod-holders"),
            category(3, Some(1), "cup-holders"),
            category(4, None, "dock-edge"),
        ];
        let children = all[0].children(&all);
        assert_eq!(children.len(), 2);
        assert!(all[3].children(&all).is_empty());
    }
}
