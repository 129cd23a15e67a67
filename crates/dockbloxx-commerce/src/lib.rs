//! Storefront domain types and logic for DockBloxx.
//!
//! This crate holds the state a WooCommerce-backed storefront keeps on the
//! client side:
//!
//! - **Catalog**: Products, variations, categories
//! - **Cart**: Cart store with identity keys, coupons, discount allocation, totals
//! - **Listing**: Paginated product cache keyed by listing namespace
//! - **Checkout**: Checkout flow, order and payment intent requests
//!
//! Network access goes through small async traits ([`listing::ProductSource`],
//! [`cart::CouponLookup`], [`checkout::OrderApi`], [`checkout::PaymentApi`])
//! so the stores can be driven by real clients or in-memory fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use dockbloxx_commerce::prelude::*;
//!
//! let mut cart = CartStore::new(Currency::USD);
//! let key = cart.add_item(product.to_cart_input(2))?;
//! cart.apply_coupon(coupon)?;
//!
//! let totals = cart.totals();
//! println!("Total: {}", totals.grand_total.display());
//!
//! let listing = PageCache::new(source);
//! listing.switch_namespace(Namespace::category("accessories"));
//! let view = listing.set_current_page(1).await;
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod listing;

pub use error::{ApiError, CommerceError, ListingError};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ApiError, CommerceError, ListingError};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::{
        Category, CategoryRef, Product, ProductType, ProductVariation, StockStatus, VariantOption,
    };

    // Cart
    pub use crate::cart::{
        redeem_coupon, CartItem, CartItemInput, CartStore, CartTotals, Coupon, CouponError,
        CouponLookup, CouponRejection, DiscountType, DiscountValue, ItemKey, LineTotals,
    };

    // Listing
    pub use crate::listing::{
        Namespace, PageCache, PageQuery, PageView, Pagination, ProductPage, ProductSource,
    };

    // Checkout
    pub use crate::checkout::{
        Address, Checkout, CheckoutError, CheckoutFlow, CheckoutStep, OrderApi, OrderPayload,
        OrderReceipt, PaymentApi, PaymentIntent, PaymentIntentRequest, ShippingMethod,
        ShippingSelection,
    };
}
