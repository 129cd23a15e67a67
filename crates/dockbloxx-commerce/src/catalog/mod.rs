//! Product catalog module.
//!
//! Read-only snapshots of WooCommerce products, variations and categories
//! as the storefront receives them.

mod category;
mod product;

pub use category::{Category, CategoryRef};
#[cfg(test)]
pub(crate) use product::fixtures;
pub use product::{
    Product, ProductAttribute, ProductImage, ProductType, ProductVariation, StockStatus,
    VariantOption,
};
