//! Per-view list query controller.
//!
//! A finite state machine (`Idle → Loading → {Success, Error}`) that owns
//! one view's filter state, derives cache keys from it, and drives cache
//! fetches. Success and Error re-enter Loading on filter changes or
//! explicit refresh while the last good rows stay visible, so page and
//! filter transitions never blank the view.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use rubrica_api_types::{RecordPage, Resource};

use crate::api::FetchFailure;
use crate::cache::{CacheEntry, EntryStatus, QueryData, QueryKey, ResourceCache, lock_guard};

use super::filter::FilterState;
use super::pagination::PaginationModel;
use super::ResourceGateway;

/// View-facing lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// What a view renders: status, rows, derived pagination, and the last
/// failure if any. Once a fetch has completed at least once, a snapshot
/// never carries both no data and no error.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub status: QueryStatus,
    pub data: Option<RecordPage>,
    pub pagination: Option<PaginationModel>,
    pub error: Option<FetchFailure>,
    /// True while reloading with previous rows still on screen.
    pub is_refreshing: bool,
}

struct ControllerState {
    filter: FilterState,
    /// Bumped on every outgoing fetch; stale responses (older generation)
    /// are discarded on arrival instead of overwriting newer state.
    generation: u64,
    status: QueryStatus,
    data: Option<RecordPage>,
    error: Option<FetchFailure>,
}

impl ControllerState {
    fn snapshot(&self) -> ListSnapshot {
        let pagination = self.data.as_ref().map(|page| {
            PaginationModel::derive(
                self.filter.page,
                page.pagination.limit,
                page.pagination.total,
            )
        });
        ListSnapshot {
            status: self.status,
            data: self.data.clone(),
            pagination,
            error: self.error.clone(),
            is_refreshing: self.status == QueryStatus::Loading && self.data.is_some(),
        }
    }
}

/// State machine for one list view.
///
/// Cheaply cloneable; clones share the same state, so overlapping calls
/// (a second filter change while a fetch is in flight) resolve through the
/// generation counter.
#[derive(Clone)]
pub struct ListQueryController {
    resource: Resource,
    cache: Arc<ResourceCache>,
    gateway: Arc<dyn ResourceGateway>,
    page_size: u32,
    state: Arc<Mutex<ControllerState>>,
}

impl ListQueryController {
    pub fn new(
        resource: Resource,
        cache: Arc<ResourceCache>,
        gateway: Arc<dyn ResourceGateway>,
        page_size: u32,
    ) -> Self {
        Self {
            resource,
            cache,
            gateway,
            page_size,
            state: Arc::new(Mutex::new(ControllerState {
                filter: FilterState::default(),
                generation: 0,
                status: QueryStatus::Idle,
                data: None,
                error: None,
            })),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Current filter state (copy).
    pub fn filter(&self) -> FilterState {
        lock_guard(&self.state, "controller.filter").filter.clone()
    }

    /// Current view state without touching the network.
    pub fn snapshot(&self) -> ListSnapshot {
        lock_guard(&self.state, "controller.snapshot").snapshot()
    }

    /// Fetch the current key. First load after construction, or a reload
    /// served from the cache when the entry is still present.
    pub async fn load(&self) -> ListSnapshot {
        let (generation, key) = self.begin_fetch(|_| true);
        self.run_fetch(generation, key, false).await
    }

    /// Update the search text; resets the page to 1 and refetches.
    pub async fn set_search(&self, search: impl Into<String>) -> ListSnapshot {
        let search = search.into();
        self.apply_filter_change(move |filter| filter.set_search(search))
            .await
    }

    /// Update the status filter; resets the page to 1 and refetches.
    pub async fn set_status(&self, status: Option<String>) -> ListSnapshot {
        self.apply_filter_change(move |filter| filter.set_status(status))
            .await
    }

    /// Update the subtype filter; resets the page to 1 and refetches.
    pub async fn set_kind(&self, kind: Option<String>) -> ListSnapshot {
        self.apply_filter_change(move |filter| filter.set_kind(kind))
            .await
    }

    /// Update the segment filter; resets the page to 1 and refetches.
    pub async fn set_segment(&self, segment: Option<String>) -> ListSnapshot {
        self.apply_filter_change(move |filter| filter.set_segment(segment))
            .await
    }

    /// Navigate to a page. Other filters stay put; previously visited
    /// pages are served from the cache without a network call.
    pub async fn set_page(&self, page: u32) -> ListSnapshot {
        self.apply_filter_change(move |filter| filter.set_page(page))
            .await
    }

    /// Replace the whole filter state and fetch, regardless of whether it
    /// differs from the current one.
    pub async fn set_filter(&self, filter: FilterState) -> ListSnapshot {
        let (generation, key) = self.begin_fetch(move |current| {
            *current = filter;
            true
        });
        self.run_fetch(generation, key, false).await
    }

    /// Reload the current key, bypassing any completed cache entry. This
    /// is the only path that retries a failed fetch.
    pub async fn refresh(&self) -> ListSnapshot {
        let (generation, key) = self.begin_fetch(|_| true);
        self.run_fetch(generation, key, true).await
    }

    /// Consume invalidation events and eagerly refetch whenever this
    /// controller's resource is invalidated. Runs until the cache is
    /// dropped; spawn it alongside the view.
    pub async fn run_invalidation_listener(&self) {
        let mut events = self.cache.subscribe();
        loop {
            match events.recv().await {
                Ok(event) if event.resource == self.resource => {
                    debug!(
                        resource = %self.resource,
                        event_id = %event.id,
                        "Invalidation received; refetching"
                    );
                    self.refetch_current().await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        resource = %self.resource,
                        skipped,
                        "Invalidation listener lagged; refetching to resync"
                    );
                    self.refetch_current().await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn refetch_current(&self) {
        let idle = {
            let state = lock_guard(&self.state, "controller.refetch");
            state.status == QueryStatus::Idle
        };
        if idle {
            return;
        }
        // The invalidation already removed matching entries, so a plain
        // fetch misses and reloads; if a sibling controller repopulated the
        // key first, serving that fresh entry is correct.
        let (generation, key) = self.begin_fetch(|_| true);
        self.run_fetch(generation, key, false).await;
    }

    /// Apply a filter mutation; when nothing changed, the current snapshot
    /// is returned without a fetch.
    async fn apply_filter_change(
        &self,
        mutate: impl FnOnce(&mut FilterState) -> bool,
    ) -> ListSnapshot {
        let begun = {
            let mut state = lock_guard(&self.state, "controller.filter_change");
            if !mutate(&mut state.filter) {
                None
            } else {
                state.generation += 1;
                state.status = QueryStatus::Loading;
                state.error = None;
                Some((
                    state.generation,
                    state.filter.to_key(self.resource, self.page_size),
                ))
            }
        };
        match begun {
            Some((generation, key)) => self.run_fetch(generation, key, false).await,
            None => self.snapshot(),
        }
    }

    fn begin_fetch(&self, mutate: impl FnOnce(&mut FilterState) -> bool) -> (u64, QueryKey) {
        let mut state = lock_guard(&self.state, "controller.begin_fetch");
        mutate(&mut state.filter);
        state.generation += 1;
        state.status = QueryStatus::Loading;
        state.error = None;
        (
            state.generation,
            state.filter.to_key(self.resource, self.page_size),
        )
    }

    async fn run_fetch(&self, generation: u64, key: QueryKey, force: bool) -> ListSnapshot {
        let gateway = self.gateway.clone();
        let resource = self.resource;
        let params = key.params().cloned().unwrap_or_default();
        let loader = move || async move { gateway.list(resource, params).await.map(QueryData::Page) };

        let entry = if force {
            self.cache.refresh(key, loader).await
        } else {
            self.cache.fetch(key, loader).await
        };
        self.apply_entry(generation, entry)
    }

    fn apply_entry(&self, generation: u64, entry: CacheEntry) -> ListSnapshot {
        let mut state = lock_guard(&self.state, "controller.apply_entry");
        if state.generation != generation {
            debug!(
                resource = %self.resource,
                stale_generation = generation,
                current_generation = state.generation,
                "Discarding stale fetch result"
            );
            return state.snapshot();
        }

        match entry.status {
            EntryStatus::Success => {
                state.status = QueryStatus::Success;
                state.data = entry.page().cloned();
                state.error = None;
            }
            EntryStatus::Error => {
                state.status = QueryStatus::Error;
                state.error = entry.error;
                // Stale-with-error: keep showing the last good rows. The
                // entry's retained data wins when present; otherwise the
                // controller's previous rows stay.
                if let Some(page) = entry.data.as_ref().and_then(QueryData::as_page) {
                    state.data = Some(page.clone());
                }
            }
            EntryStatus::Loading => {
                state.status = QueryStatus::Loading;
            }
        }
        state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::BoxFuture;
    use serde_json::json;

    use rubrica_api_types::{PageInfo, Record};

    use crate::api::{ApiError, FailureKind};
    use crate::cache::CacheConfig;
    use crate::query::PAGE_SIZE;

    use super::*;

    #[derive(Default)]
    struct StubGateway {
        list_calls: AtomicUsize,
        /// Echoed into every record so tests can observe refetches.
        version: AtomicUsize,
        delays_by_search: Mutex<HashMap<String, Duration>>,
        failing_searches: Mutex<HashSet<String>>,
    }

    impl StubGateway {
        fn delay(&self, search: &str, delay: Duration) {
            self.delays_by_search
                .lock()
                .unwrap()
                .insert(search.to_string(), delay);
        }

        fn fail(&self, search: &str) {
            self.failing_searches
                .lock()
                .unwrap()
                .insert(search.to_string());
        }
    }

    impl ResourceGateway for StubGateway {
        fn list(
            &self,
            _resource: Resource,
            params: BTreeMap<String, String>,
        ) -> BoxFuture<'static, Result<RecordPage, FetchFailure>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let search = params.get("search").cloned().unwrap_or_default();
            let page: u32 = params
                .get("page")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1);
            let delay = self
                .delays_by_search
                .lock()
                .unwrap()
                .get(&search)
                .copied()
                .unwrap_or_default();
            let failing = self.failing_searches.lock().unwrap().contains(&search);
            let version = self.version.load(Ordering::SeqCst);

            Box::pin(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if failing {
                    return Err(FetchFailure::new(
                        FailureKind::Server,
                        Some(500),
                        "stub failure",
                    ));
                }
                Ok(RecordPage {
                    items: vec![Record::new(json!({
                        "id": format!("r{page}"),
                        "search": search,
                        "version": version,
                    }))],
                    pagination: PageInfo {
                        page,
                        limit: 20,
                        total: 45,
                        total_pages: 3,
                    },
                })
            })
        }

        fn get(
            &self,
            _resource: Resource,
            _id: String,
        ) -> BoxFuture<'static, Result<Record, FetchFailure>> {
            Box::pin(async {
                Err(FetchFailure::new(
                    FailureKind::Decode,
                    None,
                    "unused in controller tests",
                ))
            })
        }

        fn create(
            &self,
            _resource: Resource,
            _payload: serde_json::Value,
        ) -> BoxFuture<'static, Result<Record, ApiError>> {
            Box::pin(async { Err(ApiError::decode("unused in controller tests")) })
        }

        fn update(
            &self,
            _resource: Resource,
            _id: String,
            _payload: serde_json::Value,
        ) -> BoxFuture<'static, Result<Record, ApiError>> {
            Box::pin(async { Err(ApiError::decode("unused in controller tests")) })
        }

        fn delete(
            &self,
            _resource: Resource,
            _id: String,
        ) -> BoxFuture<'static, Result<(), ApiError>> {
            Box::pin(async { Err(ApiError::decode("unused in controller tests")) })
        }
    }

    fn setup() -> (ListQueryController, Arc<StubGateway>, Arc<ResourceCache>) {
        let gateway = Arc::new(StubGateway::default());
        let cache = Arc::new(ResourceCache::new(CacheConfig::default()));
        let controller = ListQueryController::new(
            Resource::Customers,
            cache.clone(),
            gateway.clone(),
            PAGE_SIZE,
        );
        (controller, gateway, cache)
    }

    fn record_field(snapshot: &ListSnapshot, field: &str) -> serde_json::Value {
        snapshot
            .data
            .as_ref()
            .and_then(|page| page.items.first())
            .and_then(|record| record.get(field))
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    #[test]
    fn idle_until_first_load() {
        let (controller, _, _) = setup();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, QueryStatus::Idle);
        assert!(snapshot.data.is_none());
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_refreshing);
    }

    #[tokio::test]
    async fn initial_load_reaches_success() {
        let (controller, gateway, _) = setup();

        let snapshot = controller.load().await;

        assert_eq!(snapshot.status, QueryStatus::Success);
        assert!(!snapshot.is_refreshing);
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 1);

        let pagination = snapshot.pagination.expect("pagination derived");
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next());
    }

    #[tokio::test]
    async fn filter_change_resets_page_and_refetches() {
        let (controller, _, _) = setup();
        controller.load().await;
        controller.set_page(3).await;
        assert_eq!(controller.filter().page, 3);

        let snapshot = controller.set_search("acme").await;

        assert_eq!(controller.filter().page, 1);
        assert_eq!(record_field(&snapshot, "search"), json!("acme"));
        assert_eq!(snapshot.pagination.map(|p| p.page), Some(1));
    }

    #[tokio::test]
    async fn page_navigation_reuses_cached_pages() {
        let (controller, gateway, _) = setup();

        controller.load().await;
        controller.set_page(2).await;
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 2);

        // Back to page 1: served from the cache, no third network call.
        let snapshot = controller.set_page(1).await;
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(record_field(&snapshot, "id"), json!("r1"));
    }

    #[tokio::test]
    async fn no_op_filter_change_does_not_refetch() {
        let (controller, gateway, _) = setup();
        controller.load().await;

        let snapshot = controller.set_search("").await;

        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.status, QueryStatus::Success);
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let (controller, gateway, _) = setup();
        gateway.delay("slow", Duration::from_millis(50));
        gateway.delay("fast", Duration::from_millis(5));

        // "slow" goes out first, "fast" supersedes it before it resolves.
        let (_, fast) = tokio::join!(
            controller.set_search("slow"),
            controller.set_search("fast"),
        );

        assert_eq!(record_field(&fast, "search"), json!("fast"));
        let settled = controller.snapshot();
        assert_eq!(settled.status, QueryStatus::Success);
        assert_eq!(
            record_field(&settled, "search"),
            json!("fast"),
            "slow response must not overwrite the newer generation"
        );
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_rows_beside_the_error() {
        let (controller, gateway, _) = setup();
        controller.load().await;
        gateway.fail("bad");

        let snapshot = controller.set_search("bad").await;

        assert_eq!(snapshot.status, QueryStatus::Error);
        let error = snapshot.error.as_ref().expect("failure surfaced");
        assert_eq!(error.kind, FailureKind::Server);
        assert_eq!(
            record_field(&snapshot, "search"),
            json!(""),
            "last good rows stay visible"
        );
    }

    #[tokio::test]
    async fn error_without_prior_data_exposes_only_the_error() {
        let (controller, gateway, _) = setup();
        gateway.fail("");

        let snapshot = controller.load().await;

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.error.is_some());
        assert!(snapshot.data.is_none());
    }

    #[tokio::test]
    async fn refresh_bypasses_the_cache() {
        let (controller, gateway, _) = setup();
        controller.load().await;

        controller.refresh().await;

        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidation_triggers_eager_refetch() {
        let (controller, gateway, cache) = setup();
        controller.load().await;
        assert_eq!(record_field(&controller.snapshot(), "version"), json!(0));

        let listener = controller.clone();
        tokio::spawn(async move { listener.run_invalidation_listener().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        gateway.version.store(1, Ordering::SeqCst);
        cache.invalidate(Resource::Customers);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(record_field(&controller.snapshot(), "version"), json!(1));
    }

    #[tokio::test]
    async fn other_resources_do_not_trigger_refetch() {
        let (controller, gateway, cache) = setup();
        controller.load().await;

        let listener = controller.clone();
        tokio::spawn(async move { listener.run_invalidation_listener().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        cache.invalidate(Resource::Tags);
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 1);
    }
}
