/// End-to-end checks of the cart store and the page cache through the
/// public API, with an in-memory product source and coupon table.
use async_trait::async_trait;
use dockbloxx_commerce::cart::MAX_QUANTITY_PER_ITEM;
use dockbloxx_commerce::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

fn usd(cents: i64) -> Money {
    Money::new(cents, Currency::USD)
}

fn input(id: u64, cents: i64, quantity: u32) -> CartItemInput {
    CartItemInput {
        product_id: ProductId::new(id),
        variation_id: None,
        options: Vec::new(),
        name: format!("Dock Bloxx {}", id),
        unit_price: usd(cents),
        quantity,
        image: None,
        categories: vec![CategoryRef {
            id: CategoryId::new(3),
            name: "Accessories".to_string(),
            slug: "accessories".to_string(),
        }],
        on_sale: false,
    }
}

fn listed_product(id: u64, category: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Dock Bloxx {}", id),
        slug: format!("dock-bloxx-{}", id),
        permalink: format!("https://dockbloxx.test/product/dock-bloxx-{}", id),
        product_type: ProductType::Simple,
        price: usd(1999),
        regular_price: usd(1999),
        sale_price: None,
        on_sale: false,
        stock_status: StockStatus::InStock,
        short_description: String::new(),
        images: Vec::new(),
        categories: vec![CategoryRef {
            id: CategoryId::new(3),
            name: category.to_string(),
            slug: category.to_string(),
        }],
        attributes: Vec::new(),
        variations: Vec::new(),
    }
}

/// 25 products in the shop, 14 in accessories; pages gated by a semaphore
/// when a test needs two fetches to overlap.
struct CatalogSource {
    calls: AtomicUsize,
    requests: std::sync::Mutex<Vec<(Namespace, u32)>>,
    gate: Option<Semaphore>,
}

impl CatalogSource {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductSource for CatalogSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<ProductPage, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((query.namespace.clone(), query.page));
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        let (total, slug, offset) = match query.namespace.category_slug() {
            Some(slug) => (14u64, slug.to_string(), 500),
            None => (25u64, "shop".to_string(), 0),
        };
        let per_page = u64::from(query.per_page);
        let total_pages = u32::try_from(total.div_ceil(per_page)).unwrap();
        let start = u64::from(query.page - 1) * per_page;
        let end = (start + per_page).min(total);
        let products = (start..end)
            .map(|i| listed_product(offset + i + 1, &slug))
            .collect();

        Ok(ProductPage {
            page: query.page,
            per_page: query.per_page,
            products,
            total,
            total_pages,
        })
    }
}

struct CouponTable(HashMap<String, Coupon>);

#[async_trait]
impl CouponLookup for CouponTable {
    async fn find_coupon(&self, code: &str) -> Result<Coupon, ApiError> {
        self.0
            .get(&code.to_lowercase())
            .cloned()
            .ok_or_else(|| ApiError::NotFound(code.to_string()))
    }
}

#[test]
fn test_repeated_adds_collapse_into_one_line() {
    let mut cart = CartStore::new(Currency::USD);

    let first = cart.add_item(input(42, 2500, 1)).unwrap();
    let second = cart.add_item(input(42, 2500, 2)).unwrap();
    let third = cart.add_item(input(42, 2500, 3)).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(cart.unique_item_count(), 1);
    assert_eq!(cart.item_count(), 6);
    assert_eq!(cart.totals().subtotal, usd(15000));
}

#[test]
fn test_add_then_remove_leaves_empty_cart() {
    let mut cart = CartStore::new(Currency::USD);

    let key = cart.add_item(input(42, 2500, 2)).unwrap();
    assert!(cart.remove_item(&key));

    let totals = cart.totals();
    assert!(cart.is_empty());
    assert_eq!(totals.item_count, 0);
    assert_eq!(totals.subtotal, usd(0));
    assert_eq!(totals.grand_total, usd(0));
}

#[test]
fn test_quantity_bounds() {
    let mut cart = CartStore::new(Currency::USD);

    assert!(cart.add_item(input(42, 2500, 0)).is_err());
    assert!(cart
        .add_item(input(42, 2500, MAX_QUANTITY_PER_ITEM + 1))
        .is_err());
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_percent_coupon_discounts_ten_dollars() {
    let coupons = CouponTable(HashMap::from([(
        "dock10".to_string(),
        Coupon::percent("DOCK10", 1000),
    )]));
    let mut cart = CartStore::new(Currency::USD);
    cart.add_item(input(42, 10000, 1)).unwrap();

    redeem_coupon(&mut cart, &coupons, "  DOCK10 ").await.unwrap();

    let totals = cart.totals();
    assert_eq!(totals.subtotal, usd(10000));
    assert_eq!(totals.discount_total, usd(1000));
    assert_eq!(totals.grand_total, usd(9000));
    assert_eq!(totals.coupon_code.as_deref(), Some("DOCK10"));
}

#[tokio::test]
async fn test_minimum_spend_coupon_leaves_totals_unchanged() {
    let coupons = CouponTable(HashMap::from([(
        "big50".to_string(),
        Coupon::fixed_cart("BIG50", usd(5000)).with_minimum_spend(usd(20000)),
    )]));
    let mut cart = CartStore::new(Currency::USD);
    cart.add_item(input(42, 10000, 1)).unwrap();
    let before = cart.totals();

    let err = redeem_coupon(&mut cart, &coupons, "BIG50").await.unwrap_err();

    assert!(matches!(
        err,
        CouponError::Rejected(CouponRejection::MinimumSpend { .. })
    ));
    assert!(cart.coupon().is_none());
    assert_eq!(cart.totals(), before);
}

#[tokio::test]
async fn test_unknown_coupon_is_not_found() {
    let coupons = CouponTable(HashMap::new());
    let mut cart = CartStore::new(Currency::USD);
    cart.add_item(input(42, 10000, 1)).unwrap();

    let err = redeem_coupon(&mut cart, &coupons, "NOPE").await.unwrap_err();
    assert!(matches!(err, CouponError::NotFound(_)));
}

#[tokio::test]
async fn test_switching_namespace_clears_pages_and_refetches() {
    let source = Arc::new(CatalogSource::new());
    let cache = PageCache::new(source.clone()).with_per_page(12);

    let shop = cache.set_current_page(1).await;
    assert_eq!(shop.page.as_ref().map(|p| p.len()), Some(12));
    assert_eq!(shop.total, Some(25));
    cache.ensure_page(2).await.unwrap();
    assert_eq!(source.calls(), 2);

    assert!(cache.switch_namespace("category:accessories".parse().unwrap()));
    assert!(cache.cached(1).is_none());
    assert!(cache.cached(2).is_none());
    assert_eq!(cache.total(), None);

    let accessories = cache.set_current_page(1).await;
    assert_eq!(source.calls(), 3);
    assert_eq!(accessories.total, Some(14));
    assert_eq!(
        accessories.namespace,
        Namespace::category("accessories")
    );
    let first = &accessories.page.unwrap().products[0];
    assert!(first.in_category("accessories"));

    let last = source.requests.lock().unwrap().last().cloned();
    assert_eq!(last, Some((Namespace::category("accessories"), 1)));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let source = Arc::new(CatalogSource::gated());
    let cache = PageCache::new(source.clone()).with_per_page(12);

    let release = async {
        while !cache.is_loading(2) {
            tokio::task::yield_now().await;
        }
        tokio::task::yield_now().await;
        source.gate.as_ref().unwrap().add_permits(1);
    };
    let (a, b, _) = tokio::join!(cache.ensure_page(2), cache.ensure_page(2), release);

    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(source.calls(), 1);
    assert!(!cache.is_loading(2));
    assert_eq!(cache.cached(2).map(|p| p.page), Some(2));
}

#[tokio::test]
async fn test_out_of_range_page_is_not_fetched() {
    let source = Arc::new(CatalogSource::new());
    let cache = PageCache::new(source.clone()).with_per_page(12);
    cache.ensure_page(1).await.unwrap();

    let view = cache.set_current_page(9).await;

    assert_eq!(source.calls(), 1);
    assert_eq!(
        view.error,
        Some(ListingError::OutOfRange {
            page: 9,
            total_pages: 3
        })
    );
    assert!(view.page.is_none());
}
