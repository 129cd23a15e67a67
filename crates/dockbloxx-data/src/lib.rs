//! REST clients for the DockBloxx storefront.
//!
//! Talks to the WooCommerce v3 API for products, categories, coupons and
//! orders, and to Stripe for payment intents. The clients implement the
//! collaborator traits from `dockbloxx-commerce`, so a [`WooClient`] can back a
//! page cache or a cart's coupon lookup directly.
//!
//! GET requests are retried on transient failures according to a
//! per-endpoint [`FetchPolicy`]. Order and payment POSTs are sent once.
//!
//! # Example
//!
//! ```rust,ignore
//! use dockbloxx_data::{DockbloxxConfig, WooClient};
//! use dockbloxx_commerce::prelude::*;
//! use std::sync::Arc;
//!
//! let mut config = DockbloxxConfig::default();
//! config.apply_env_overrides();
//!
//! let woo = Arc::new(WooClient::new(&config.store)?);
//! let cache = PageCache::new(woo).with_per_page(config.store.per_page);
//! let page = cache.ensure_page(1).await?;
//! println!("{} of {} products", page.len(), page.total);
//! ```

mod client;
pub mod config;
mod endpoint;
mod error;
mod request;
mod response;
mod retry;
pub mod stripe;
pub mod woo;

#[cfg(test)]
mod test_support;

pub use client::{ClientRequestBuilder, FetchClient};
pub use config::{
    DockbloxxConfig, StoreConfig, StripeConfig, ENV_STORE_URL, ENV_STRIPE_KEY, ENV_WC_KEY,
    ENV_WC_SECRET,
};
pub use endpoint::Endpoint;
pub use error::FetchError;
pub use request::{Auth, Body, Method, RequestBuilder};
pub use response::Response;
pub use retry::{BackoffStrategy, FetchPolicy, RetryCondition, RetryPolicy};
pub use stripe::StripeClient;
pub use woo::WooClient;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        DockbloxxConfig, Endpoint, FetchClient, FetchError, FetchPolicy, RetryPolicy,
        StripeClient, WooClient,
    };
}
