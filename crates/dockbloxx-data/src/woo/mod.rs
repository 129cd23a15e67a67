//! WooCommerce REST v3 client.
//!
//! Implements the storefront seams: [`ProductSource`] for the page cache,
//! [`CouponLookup`] for coupon redemption and [`OrderApi`] for checkout.

mod wire;

use crate::client::{ClientRequestBuilder, FetchClient};
use crate::config::StoreConfig;
use crate::endpoint::Endpoint;
use crate::FetchError;
use async_trait::async_trait;
use dockbloxx_commerce::cart::{Coupon, CouponLookup};
use dockbloxx_commerce::catalog::{Category, Product, ProductVariation};
use dockbloxx_commerce::checkout::{OrderApi, OrderPayload, OrderReceipt};
use dockbloxx_commerce::listing::{Namespace, PageQuery, ProductPage, ProductSource, MAX_PER_PAGE};
use dockbloxx_commerce::{ApiError, CategoryId, Currency, ProductId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use wire::{WireCategory, WireCoupon, WireOrder, WireProduct, WireVariation};

const TOTAL_HEADER: &str = "X-WP-Total";
const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// Client for one WooCommerce store.
pub struct WooClient {
    fetch: FetchClient,
    consumer_key: String,
    consumer_secret: String,
    currency: Currency,
    per_page: u32,
    /// Category slug to id, filled as namespaces are resolved.
    category_ids: Mutex<HashMap<String, CategoryId>>,
}

impl WooClient {
    /// Create a client from validated store settings.
    pub fn new(config: &StoreConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let mut fetch = FetchClient::new(config.api_url())?
            .with_default_header("Accept", "application/json");
        for endpoint in [
            Endpoint::Products,
            Endpoint::Product,
            Endpoint::Categories,
            Endpoint::Coupons,
            Endpoint::Orders,
        ] {
            fetch = fetch.with_policy(endpoint, config.policy_for(endpoint));
        }

        Ok(Self {
            fetch,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            currency: config.currency()?,
            per_page: config.per_page,
            category_ids: Mutex::new(HashMap::new()),
        })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Configured listing page size.
    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    fn request(&self, endpoint: Endpoint, path: &str) -> ClientRequestBuilder<'_> {
        self.fetch
            .request(endpoint, path)
            .basic_auth(&self.consumer_key, &self.consumer_secret)
    }

    /// Fetch one page of published products.
    pub async fn list_products(&self, query: &PageQuery) -> Result<ProductPage, FetchError> {
        let mut request = self
            .request(Endpoint::Products, "products")
            .query_pairs(query.to_query_pairs());
        if let Namespace::Category(slug) = &query.namespace {
            let id = self.category_id(slug).await?;
            request = request.query("category", id.get());
        }

        let response = request.send().await?;
        let products = response
            .json::<Vec<WireProduct>>()?
            .into_iter()
            .map(|p| p.into_product(self.currency))
            .collect::<Result<Vec<_>, _>>()?;

        let per_page = query.per_page;
        let shown_so_far = u64::from(query.page.saturating_sub(1)) * u64::from(per_page)
            + products.len() as u64;
        let total = response.header_u64(TOTAL_HEADER).unwrap_or(shown_so_far);
        let total_pages = response
            .header_u64(TOTAL_PAGES_HEADER)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_else(|| pages_for(total, per_page));

        debug!(
            namespace = %query.namespace,
            page = query.page,
            count = products.len(),
            total,
            "Fetched product page"
        );

        Ok(ProductPage {
            page: query.page,
            per_page,
            products,
            total,
            total_pages,
        })
    }

    /// Fetch a single product.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, FetchError> {
        self.request(Endpoint::Product, &format!("products/{}", id))
            .send()
            .await?
            .json::<WireProduct>()?
            .into_product(self.currency)
    }

    /// Fetch the variations of a variable product.
    pub async fn list_variations(&self, id: ProductId) -> Result<Vec<ProductVariation>, FetchError> {
        self.request(Endpoint::Product, &format!("products/{}/variations", id))
            .query("per_page", MAX_PER_PAGE)
            .send()
            .await?
            .json::<Vec<WireVariation>>()?
            .into_iter()
            .map(|v| v.into_variation(id, self.currency))
            .collect()
    }

    /// Fetch every product category, following pagination.
    pub async fn list_categories(&self) -> Result<Vec<Category>, FetchError> {
        let mut categories = Vec::new();
        let mut page: u32 = 1;
        loop {
            let response = self
                .request(Endpoint::Categories, "products/categories")
                .query("per_page", MAX_PER_PAGE)
                .query("page", page)
                .send()
                .await?;
            let batch = response.json::<Vec<WireCategory>>()?;
            let total_pages = response.header_u64(TOTAL_PAGES_HEADER).unwrap_or(1);
            let done = batch.is_empty() || u64::from(page) >= total_pages;
            categories.extend(batch.into_iter().map(Category::from));
            if done {
                break;
            }
            page += 1;
        }

        self.lock_categories()
            .extend(categories.iter().map(|c| (c.slug.clone(), c.id)));
        Ok(categories)
    }

    /// Resolve a category slug to its id, caching the answer.
    pub async fn category_id(&self, slug: &str) -> Result<CategoryId, FetchError> {
        let cached = self.lock_categories().get(slug).copied();
        if let Some(id) = cached {
            return Ok(id);
        }

        let found = self
            .request(Endpoint::Categories, "products/categories")
            .query("slug", slug)
            .send()
            .await?
            .json::<Vec<WireCategory>>()?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| FetchError::NotFound(format!("category {:?}", slug)))?;

        let id = CategoryId::new(found.id);
        debug!(slug, id = %id, "Resolved category slug");
        self.lock_categories().insert(slug.to_string(), id);
        Ok(id)
    }

    fn lock_categories(&self) -> std::sync::MutexGuard<'_, HashMap<String, CategoryId>> {
        self.category_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a coupon by code. `Ok(None)` when no coupon matches.
    pub async fn get_coupon(&self, code: &str) -> Result<Option<Coupon>, FetchError> {
        let code = code.trim().to_lowercase();
        let coupons = self
            .request(Endpoint::Coupons, "coupons")
            .query("code", &code)
            .send()
            .await?
            .json::<Vec<WireCoupon>>()?;

        coupons
            .into_iter()
            .map(|c| c.into_coupon(self.currency))
            .find(|c| c.as_ref().map_or(true, |c| c.matches_code(&code)))
            .transpose()
    }

    /// Create an order.
    pub async fn post_order(&self, order: &OrderPayload) -> Result<OrderReceipt, FetchError> {
        self.request(Endpoint::Orders, "orders")
            .json(order)?
            .send()
            .await?
            .json::<WireOrder>()?
            .into_receipt(self.currency)
    }

    #[cfg(test)]
    fn without_proxy(mut self) -> Self {
        self.fetch = self.fetch.without_proxy();
        self
    }
}

impl std::fmt::Debug for WooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooClient")
            .field("api_url", &self.fetch.base_url())
            .field("consumer_key", &self.consumer_key)
            .field("currency", &self.currency)
            .field("per_page", &self.per_page)
            .finish_non_exhaustive()
    }
}

fn pages_for(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
}

#[async_trait]
impl ProductSource for WooClient {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ProductPage, ApiError> {
        Ok(self.list_products(query).await?)
    }
}

#[async_trait]
impl CouponLookup for WooClient {
    async fn find_coupon(&self, code: &str) -> Result<Coupon, ApiError> {
        self.get_coupon(code)
            .await?
            .ok_or_else(|| ApiError::NotFound(code.to_string()))
    }
}

#[async_trait]
impl OrderApi for WooClient {
    async fn create_order(&self, order: &OrderPayload) -> Result<OrderReceipt, ApiError> {
        Ok(self.post_order(order).await?)
    }
}
