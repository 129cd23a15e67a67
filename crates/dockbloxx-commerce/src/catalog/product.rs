//! Product and variation types.

use crate::cart::CartItemInput;
use crate::catalog::CategoryRef;
use crate::ids::{ProductId, VariationId};
use crate::money::{Money, BASIS_POINTS};
use serde::{Deserialize, Serialize};

/// Product type as WooCommerce classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Simple product with no variations.
    #[default]
    Simple,
    /// Product with variations (e.g., dock length, finish).
    Variable,
    /// A set of related simple products.
    Grouped,
    /// Sold elsewhere; links out.
    External,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Simple => "simple",
            ProductType::Variable => "variable",
            ProductType::Grouped => "grouped",
            ProductType::External => "external",
        }
    }

    /// Parse the WooCommerce `type` field.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Some(ProductType::Simple),
            "variable" => Some(ProductType::Variable),
            "grouped" => Some(ProductType::Grouped),
            "external" => Some(ProductType::External),
            _ => None,
        }
    }
}

/// Stock status reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    /// Parse the WooCommerce `stock_status` field.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "instock" => Some(StockStatus::InStock),
            "outofstock" => Some(StockStatus::OutOfStock),
            "onbackorder" => Some(StockStatus::OnBackorder),
            _ => None,
        }
    }

    /// Whether the item can be added to a cart.
    pub fn is_available(&self) -> bool {
        !matches!(self, StockStatus::OutOfStock)
    }
}

/// A product image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductImage {
    /// Image URL.
    pub src: String,
    /// Alt text for accessibility.
    pub alt: String,
}

/// A product attribute offered to the shopper (e.g., Finish: Black, Silver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductAttribute {
    pub name: String,
    pub options: Vec<String>,
    /// Whether this attribute selects a variation.
    pub variation: bool,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL-friendly slug.
    pub slug: String,
    pub permalink: String,
    pub product_type: ProductType,
    /// Current selling price.
    pub price: Money,
    /// Price before any sale.
    pub regular_price: Money,
    /// Sale price, when a sale is running.
    pub sale_price: Option<Money>,
    pub on_sale: bool,
    pub stock_status: StockStatus,
    /// Short description HTML for listings.
    pub short_description: String,
    pub images: Vec<ProductImage>,
    pub categories: Vec<CategoryRef>,
    pub attributes: Vec<ProductAttribute>,
    /// Variation ids for variable products.
    pub variations: Vec<VariationId>,
}

impl Product {
    /// Check if the product can be bought directly from a listing.
    pub fn is_purchasable(&self) -> bool {
        self.stock_status.is_available()
            && matches!(self.product_type, ProductType::Simple)
            && !self.price.is_negative()
    }

    /// Check if this is a variable product (has variations).
    pub fn has_variations(&self) -> bool {
        self.product_type == ProductType::Variable
    }

    /// First image, used as the cart thumbnail.
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    /// Sale discount in basis points off the regular price.
    pub fn sale_discount_bps(&self) -> Option<i64> {
        if !self.on_sale || self.regular_price.amount_cents <= self.price.amount_cents {
            return None;
        }
        let savings = self.regular_price.amount_cents - self.price.amount_cents;
        Some(savings * BASIS_POINTS / self.regular_price.amount_cents)
    }

    /// Check whether the product belongs to a category slug.
    pub fn in_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }

    /// Build the cart input for a simple product.
    pub fn to_cart_input(&self, quantity: u32) -> CartItemInput {
        CartItemInput {
            product_id: self.id,
            variation_id: None,
            options: Vec::new(),
            name: self.name.clone(),
            unit_price: self.price,
            quantity,
            image: self.primary_image().map(|i| i.src.clone()),
            categories: self.categories.clone(),
            on_sale: self.on_sale,
        }
    }
}

/// A purchasable variation of a variable product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductVariation {
    pub id: VariationId,
    pub product_id: ProductId,
    pub price: Money,
    pub on_sale: bool,
    pub stock_status: StockStatus,
    /// Options that define this variation.
    pub attributes: Vec<VariantOption>,
    pub image: Option<ProductImage>,
}

impl ProductVariation {
    /// Build the variation name from options (e.g., "48in / Black").
    pub fn build_name(&self) -> String {
        self.attributes
            .iter()
            .map(|o| o.value.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Build the cart input for this variation of `parent`.
    pub fn to_cart_input(&self, parent: &Product, quantity: u32) -> CartItemInput {
        let name = if self.attributes.is_empty() {
            parent.name.clone()
        } else {
            format!("{} - {}", parent.name, self.build_name())
        };
        CartItemInput {
            product_id: parent.id,
            variation_id: Some(self.id),
            options: self.attributes.clone(),
            name,
            unit_price: self.price,
            quantity,
            image: self
                .image
                .as_ref()
                .or(parent.primary_image())
                .map(|i| i.src.clone()),
            categories: parent.categories.clone(),
            on_sale: self.on_sale,
        }
    }
}

/// A variation option (e.g., Size: Large).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantOption {
    /// Option name (e.g., "Length", "Finish").
    pub name: String,
    /// Option value (e.g., "48in", "Black").
    pub value: String,
}

impl VariantOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
