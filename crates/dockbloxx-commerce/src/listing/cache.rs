//! Paginated product cache.
//!
//! Holds the pages fetched for one listing namespace at a time. Concurrent
//! requests for the same page share a single fetch. Switching namespace
//! drops everything, and fetches started before the switch are discarded
//! when they finish.
//!
//! Per-page state: uncached -> loading -> cached, or back to uncached with
//! the error recorded. Nothing is retried here; the next navigation tries
//! again.

use crate::error::ListingError;
use crate::listing::{
    Namespace, PageQuery, Pagination, ProductPage, ProductSource, SortOption, DEFAULT_PER_PAGE,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

type PageResult = Result<Arc<ProductPage>, ListingError>;
type SharedFetch = Shared<BoxFuture<'static, PageResult>>;

#[derive(Default)]
struct CacheState {
    namespace: Namespace,
    /// Bumped on every reset; fetches from an older generation are stale.
    generation: u64,
    pages: BTreeMap<u32, Arc<ProductPage>>,
    in_flight: HashMap<u32, SharedFetch>,
    errors: BTreeMap<u32, ListingError>,
    total: Option<u64>,
    total_pages: Option<u32>,
    current_page: u32,
}

impl CacheState {
    fn clear(&mut self, namespace: Namespace) {
        self.generation = self.generation.wrapping_add(1);
        self.namespace = namespace;
        self.pages.clear();
        self.in_flight.clear();
        self.errors.clear();
        self.total = None;
        self.total_pages = None;
        self.current_page = 1;
    }

    fn store(&mut self, page: Arc<ProductPage>) {
        self.total = Some(page.total);
        self.total_pages = Some(page.total_pages);
        self.errors.remove(&page.page);
        self.pages.insert(page.page, page);
    }
}

/// What the listing UI renders for the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub namespace: Namespace,
    pub current_page: u32,
    /// The page, once loaded.
    pub page: Option<Arc<ProductPage>>,
    pub pagination: Option<Pagination>,
    /// Total products in the namespace, once known.
    pub total: Option<u64>,
    pub loading: bool,
    /// Why the current page failed to load.
    pub error: Option<ListingError>,
}

/// Page cache for product listings.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct PageCache {
    source: Arc<dyn ProductSource>,
    per_page: u32,
    sort: SortOption,
    state: Arc<Mutex<CacheState>>,
}

impl PageCache {
    /// Create an empty cache for the shop listing.
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            per_page: DEFAULT_PER_PAGE,
            sort: SortOption::default(),
            state: Arc::new(Mutex::new(CacheState {
                current_page: 1,
                ..CacheState::default()
            })),
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop all state and start over in `namespace`, optionally seeded with
    /// a page that was rendered ahead of time.
    pub fn reset(&self, namespace: Namespace, initial: Option<ProductPage>) {
        let mut state = self.lock();
        debug!(namespace = %namespace, seeded = initial.is_some(), "Resetting page cache");
        state.clear(namespace);
        if let Some(page) = initial {
            state.current_page = page.page.max(1);
            state.store(Arc::new(page));
        }
    }

    /// Reset into `namespace` if it differs from the current one.
    ///
    /// Returns whether anything changed.
    pub fn switch_namespace(&self, namespace: Namespace) -> bool {
        if self.lock().namespace == namespace {
            return false;
        }
        self.reset(namespace, None);
        true
    }

    pub fn namespace(&self) -> Namespace {
        self.lock().namespace.clone()
    }

    /// Total products in the namespace, once any page has loaded.
    pub fn total(&self) -> Option<u64> {
        self.lock().total
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.lock().total_pages
    }

    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    /// A cached page, without fetching.
    pub fn cached(&self, page: u32) -> Option<Arc<ProductPage>> {
        self.lock().pages.get(&page).cloned()
    }

    pub fn is_loading(&self, page: u32) -> bool {
        self.lock().in_flight.contains_key(&page)
    }

    /// The last error recorded for a page.
    pub fn error_for(&self, page: u32) -> Option<ListingError> {
        self.lock().errors.get(&page).cloned()
    }

    /// Return page `page`, fetching it if needed.
    ///
    /// Concurrent callers asking for the same uncached page wait on the same
    /// fetch and see the same result.
    pub async fn ensure_page(&self, page: u32) -> PageResult {
        if page == 0 {
            return Err(ListingError::InvalidPage(page));
        }

        let fetch = {
            let mut state = self.lock();

            if let Some(cached) = state.pages.get(&page) {
                debug!(namespace = %state.namespace, page, "Page cache hit");
                return Ok(Arc::clone(cached));
            }

            if let Some(total_pages) = state.total_pages {
                if page > total_pages.max(1) {
                    return Err(ListingError::OutOfRange { page, total_pages });
                }
            }

            match state.in_flight.get(&page) {
                Some(existing) => {
                    debug!(namespace = %state.namespace, page, "Joining in-flight page fetch");
                    existing.clone()
                }
                None => {
                    debug!(namespace = %state.namespace, page, "Page cache miss");
                    let fetch = self.start_fetch(&state, page);
                    state.errors.remove(&page);
                    state.in_flight.insert(page, fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    fn start_fetch(&self, state: &CacheState, page: u32) -> SharedFetch {
        let query = PageQuery::new(state.namespace.clone(), page, self.per_page)
            .with_sort(self.sort);
        let generation = state.generation;
        let source = Arc::clone(&self.source);
        let shared_state = Arc::clone(&self.state);

        async move {
            let result = source
                .fetch_page(&query)
                .await
                .map(Arc::new)
                .map_err(ListingError::from);

            let mut state = shared_state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation {
                debug!(namespace = %query.namespace, page, "Discarding page from previous listing");
                return Err(ListingError::Superseded(page));
            }

            state.in_flight.remove(&page);
            match &result {
                Ok(fetched) => state.store(Arc::clone(fetched)),
                Err(e) => {
                    warn!(namespace = %query.namespace, page, error = %e, "Page fetch failed");
                    state.errors.insert(page, e.clone());
                }
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Make `page` current and load it.
    ///
    /// Errors are not returned; they show up in [`PageCache::view`].
    pub async fn set_current_page(&self, page: u32) -> PageView {
        if page == 0 {
            let mut view = self.view();
            view.error = Some(ListingError::InvalidPage(0));
            return view;
        }
        self.lock().current_page = page;
        // Fetch failures are recorded by the fetch itself.
        if let Err(e @ (ListingError::InvalidPage(_) | ListingError::OutOfRange { .. })) =
            self.ensure_page(page).await
        {
            self.lock().errors.insert(page, e);
        }
        self.view()
    }

    /// Snapshot of the current page state.
    pub fn view(&self) -> PageView {
        let state = self.lock();
        let current = state.current_page;
        let page = state.pages.get(&current).cloned();
        let pagination = state.total_pages.map(|total_pages| {
            Pagination::new(
                current,
                self.per_page,
                state.total.unwrap_or_default(),
                total_pages,
            )
        });

        PageView {
            namespace: state.namespace.clone(),
            current_page: current,
            page,
            pagination,
            total: state.total,
            loading: state.in_flight.contains_key(&current),
            error: state.errors.get(&current).cloned(),
        }
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("PageCache")
            .field("namespace", &state.namespace)
            .field("pages", &state.pages.keys().collect::<Vec<_>>())
            .field("in_flight", &state.in_flight.len())
            .field("total", &state.total)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::product;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// 30 products per namespace; fetches wait for a permit when gated.
    struct FakeSource {
        calls: AtomicUsize,
        gate: Option<Semaphore>,
        fail_pages: Vec<u32>,
    }

    impl FakeSource {
        fn open() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: None,
                fail_pages: Vec::new(),
            }
        }

        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::open()
            }
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(100);
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn fetch_page(&self, query: &PageQuery) -> Result<ProductPage, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.map_err(|e| ApiError::Network(e.to_string()))?;
            }
            if self.fail_pages.contains(&query.page) {
                return Err(ApiError::Http {
                    status: 502,
                    message: "bad gateway".into(),
                });
            }

            let offset: u64 = match &query.namespace {
                Namespace::Shop => 0,
                Namespace::Category(_) => 1000,
            };
            let total = 30u64;
            let first = u64::from(query.page - 1) * u64::from(query.per_page);
            let products = (first..total.min(first + u64::from(query.per_page)))
                .map(|i| product(offset + i + 1, 1000, "accessories"))
                .collect();
            Ok(ProductPage {
                page: query.page,
                per_page: query.per_page,
                products,
                total,
                total_pages: Pagination::from_total(1, query.per_page, total).total_pages,
            })
        }
    }

    fn cache(source: &Arc<FakeSource>) -> PageCache {
        let dyn_source: Arc<dyn ProductSource> = source.clone();
        PageCache::new(dyn_source).with_per_page(10)
    }

    #[tokio::test]
    async fn test_cached_page_needs_no_fetch() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);

        let first = cache.ensure_page(1).await.unwrap();
        let second = cache.ensure_page(1).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
        assert_eq!(cache.total(), Some(30));
        assert_eq!(cache.total_pages(), Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let source = Arc::new(FakeSource::gated());
        let cache = cache(&source);

        let (a, b, _) = tokio::join!(cache.ensure_page(2), cache.ensure_page(2), async {
            tokio::task::yield_now().await;
            assert!(cache.is_loading(2));
            source.release();
        });

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(!cache.is_loading(2));
    }

    #[tokio::test]
    async fn test_seeded_reset() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);
        let seed = source
            .fetch_page(&PageQuery::new(Namespace::category("accessories"), 2, 10))
            .await
            .unwrap();

        cache.reset(Namespace::category("accessories"), Some(seed));
        let view = cache.view();
        assert_eq!(view.current_page, 2);
        assert!(view.page.is_some());
        assert_eq!(view.total, Some(30));

        cache.ensure_page(2).await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_namespace_switch_refetches() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);
        cache.ensure_page(1).await.unwrap();

        assert!(!cache.switch_namespace(Namespace::Shop));
        assert!(cache.switch_namespace(Namespace::category("accessories")));
        assert!(cache.cached(1).is_none());
        assert_eq!(cache.total(), None);

        let page = cache.ensure_page(1).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(page.products[0].id.get(), 1001);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let source = Arc::new(FakeSource::gated());
        let cache = cache(&source);

        let (stale, _) = tokio::join!(cache.ensure_page(1), async {
            tokio::task::yield_now().await;
            cache.switch_namespace(Namespace::category("accessories"));
            source.release();
        });

        assert_eq!(stale, Err(ListingError::Superseded(1)));
        assert_eq!(cache.namespace(), Namespace::category("accessories"));
        assert!(cache.cached(1).is_none());
        assert_eq!(cache.total(), None);
        assert!(!cache.is_loading(1));
    }

    #[tokio::test]
    async fn test_failure_leaves_page_uncached() {
        let source = Arc::new(FakeSource {
            fail_pages: vec![2],
            ..FakeSource::open()
        });
        let cache = cache(&source);
        cache.ensure_page(1).await.unwrap();

        let err = cache.ensure_page(2).await.unwrap_err();
        assert!(matches!(err, ListingError::Api(ApiError::Http { status: 502, .. })));
        assert!(cache.cached(2).is_none());
        assert!(cache.cached(1).is_some());
        assert!(cache.error_for(2).is_some());
        assert!(cache.error_for(1).is_none());

        // Next navigation tries again.
        let _ = cache.ensure_page(2).await;
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_and_out_of_range_pages() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);

        assert_eq!(cache.ensure_page(0).await, Err(ListingError::InvalidPage(0)));
        cache.ensure_page(1).await.unwrap();
        assert_eq!(
            cache.ensure_page(4).await,
            Err(ListingError::OutOfRange {
                page: 4,
                total_pages: 3
            })
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_set_current_page_reports_through_view() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);

        let view = cache.set_current_page(3).await;
        assert_eq!(view.current_page, 3);
        assert_eq!(view.page.map(|p| p.len()), Some(10));
        let pagination = view.pagination.unwrap();
        assert!(pagination.is_last());
        assert!(!view.loading);

        let view = cache.set_current_page(9).await;
        assert!(view.page.is_none());
        assert!(matches!(view.error, Some(ListingError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_set_current_page_zero_keeps_current() {
        let source = Arc::new(FakeSource::open());
        let cache = cache(&source);
        cache.set_current_page(2).await;

        let view = cache.set_current_page(0).await;
        assert_eq!(view.error, Some(ListingError::InvalidPage(0)));
        assert_eq!(view.current_page, 2);
        assert!(view.page.is_some());
        assert_eq!(cache.view().current_page, 2);
        assert_eq!(cache.view().error, None);
        assert_eq!(source.calls(), 1);
    }
}
