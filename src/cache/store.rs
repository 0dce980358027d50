//! The shared resource cache.
//!
//! One process-wide store mapping canonical query keys to entries, with
//! single-flight fetch coordination: concurrent callers for an identical
//! key share one underlying load instead of issuing duplicate requests.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use lru::LruCache;
use metrics::{counter, gauge};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use rubrica_api_types::{Record, RecordPage, Resource};

use crate::api::FetchFailure;

use super::config::CacheConfig;
use super::events::{InvalidationBus, InvalidationEvent};
use super::keys::QueryKey;
use super::lock::{lock_guard, write_guard};

pub(crate) const METRIC_HIT: &str = "rubrica_cache_hit_total";
pub(crate) const METRIC_MISS: &str = "rubrica_cache_miss_total";
pub(crate) const METRIC_JOIN: &str = "rubrica_cache_join_total";
pub(crate) const METRIC_INVALIDATED: &str = "rubrica_cache_invalidated_total";
pub(crate) const METRIC_ENTRIES: &str = "rubrica_cache_entry_count";

/// Payload held by a completed query: a list page or a single record.
#[derive(Debug, Clone)]
pub enum QueryData {
    Page(RecordPage),
    Record(Record),
}

impl QueryData {
    pub fn as_page(&self) -> Option<&RecordPage> {
        match self {
            Self::Page(page) => Some(page),
            Self::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Page(_) => None,
        }
    }
}

/// Lifecycle state of a cache entry. Every entry is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Loading,
    Success,
    Error,
}

/// One cached query result.
///
/// An Error entry retains the previous Success data, if any, so views can
/// keep rendering stale rows alongside the surfaced failure.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QueryKey,
    pub status: EntryStatus,
    pub data: Option<QueryData>,
    pub error: Option<FetchFailure>,
    pub fetched_at: OffsetDateTime,
    /// Token of the load currently in flight for this key, if any.
    pub in_flight_request_id: Option<Uuid>,
}

impl CacheEntry {
    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == EntryStatus::Error
    }

    pub fn page(&self) -> Option<&RecordPage> {
        self.data.as_ref().and_then(QueryData::as_page)
    }

    pub fn record(&self) -> Option<&Record> {
        self.data.as_ref().and_then(QueryData::as_record)
    }
}

/// Removes the in-flight claim and wakes joined waiters, even when the
/// owning load future is dropped mid-request.
struct InFlightClaim<'a> {
    cache: &'a ResourceCache,
    key: QueryKey,
    done: watch::Sender<bool>,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        lock_guard(&self.cache.in_flight, "in_flight.release").remove(&self.key);
        let _ = self.done.send(true);
    }
}

/// Process-wide cache of query results, keyed by canonical `QueryKey`.
///
/// All writes go through this type; controllers and the console only read
/// entries or fetch through the single-flight path.
pub struct ResourceCache {
    config: CacheConfig,
    entries: RwLock<LruCache<QueryKey, CacheEntry>>,
    in_flight: Mutex<HashMap<QueryKey, watch::Receiver<bool>>>,
    bus: InvalidationBus,
}

impl ResourceCache {
    pub fn new(config: CacheConfig) -> Self {
        let entry_limit = config.entry_limit_non_zero();
        let event_buffer = config.event_buffer_non_zero();
        Self {
            config,
            entries: RwLock::new(LruCache::new(entry_limit)),
            in_flight: Mutex::new(HashMap::new()),
            bus: InvalidationBus::new(event_buffer),
        }
    }

    /// Non-blocking lookup. Returns `None` when the key has never been
    /// fetched, was invalidated, or the cache is disabled.
    pub fn read(&self, key: &QueryKey) -> Option<CacheEntry> {
        if !self.config.enabled {
            return None;
        }
        // LruCache::get updates recency, so even reads take the write guard.
        write_guard(&self.entries, "read").get(key).cloned()
    }

    /// Fetch through the cache: a completed entry is served as-is, an
    /// in-flight load for the same key is joined, and otherwise the loader
    /// runs once and its outcome is stored.
    ///
    /// Loader failure becomes an Error entry rather than propagating; the
    /// previous Success data, if any, is retained alongside the error.
    pub async fn fetch<F, Fut>(&self, key: QueryKey, loader: F) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryData, FetchFailure>>,
    {
        self.load(key, loader, false).await
    }

    /// Like [`fetch`](Self::fetch), but reloads even when a completed entry
    /// exists. Still single-flight: a concurrent load for the same key is
    /// joined instead of duplicated.
    pub async fn refresh<F, Fut>(&self, key: QueryKey, loader: F) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryData, FetchFailure>>,
    {
        self.load(key, loader, true).await
    }

    async fn load<F, Fut>(&self, key: QueryKey, loader: F, force: bool) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryData, FetchFailure>>,
    {
        if !self.config.enabled {
            return Self::run_uncached(key, loader).await;
        }

        let mut serve_completed = !force;
        let claim = loop {
            if serve_completed {
                if let Some(entry) = self.read(&key) {
                    if entry.status != EntryStatus::Loading {
                        counter!(METRIC_HIT).increment(1);
                        return entry;
                    }
                }
            }

            let waiter = {
                let mut in_flight = lock_guard(&self.in_flight, "in_flight.claim");
                match in_flight.get(&key) {
                    Some(rx) => Some(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(false);
                        in_flight.insert(key.clone(), rx);
                        break InFlightClaim {
                            cache: self,
                            key: key.clone(),
                            done: tx,
                        };
                    }
                }
            };

            if let Some(mut rx) = waiter {
                counter!(METRIC_JOIN).increment(1);
                debug!(key = %key, "Joining in-flight fetch");
                // Err means the loading future was dropped; either way the
                // claim is gone, so loop and decide again from the entry.
                let _ = rx.wait_for(|done| *done).await;
                serve_completed = true;
            }
        };

        let request_id = Uuid::new_v4();
        counter!(METRIC_MISS).increment(1);

        let previous_data = self.read(&key).and_then(|entry| entry.data);
        self.store_entry(CacheEntry {
            key: key.clone(),
            status: EntryStatus::Loading,
            data: previous_data.clone(),
            error: None,
            fetched_at: OffsetDateTime::now_utc(),
            in_flight_request_id: Some(request_id),
        });

        let entry = match loader().await {
            Ok(data) => CacheEntry {
                key: key.clone(),
                status: EntryStatus::Success,
                data: Some(data),
                error: None,
                fetched_at: OffsetDateTime::now_utc(),
                in_flight_request_id: None,
            },
            Err(failure) => {
                warn!(
                    key = %key,
                    request_id = %request_id,
                    kind = %failure.kind,
                    status = failure.status,
                    "Fetch failed; retaining stale data"
                );
                CacheEntry {
                    key: key.clone(),
                    status: EntryStatus::Error,
                    data: previous_data,
                    error: Some(failure),
                    fetched_at: OffsetDateTime::now_utc(),
                    in_flight_request_id: None,
                }
            }
        };

        self.store_entry(entry.clone());
        drop(claim);
        entry
    }

    async fn run_uncached<F, Fut>(key: QueryKey, loader: F) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<QueryData, FetchFailure>>,
    {
        counter!(METRIC_MISS).increment(1);
        match loader().await {
            Ok(data) => CacheEntry {
                key,
                status: EntryStatus::Success,
                data: Some(data),
                error: None,
                fetched_at: OffsetDateTime::now_utc(),
                in_flight_request_id: None,
            },
            Err(failure) => CacheEntry {
                key,
                status: EntryStatus::Error,
                data: None,
                error: Some(failure),
                fetched_at: OffsetDateTime::now_utc(),
                in_flight_request_id: None,
            },
        }
    }

    fn store_entry(&self, entry: CacheEntry) {
        let mut entries = write_guard(&self.entries, "store_entry");
        entries.put(entry.key.clone(), entry);
        gauge!(METRIC_ENTRIES).set(entries.len() as f64);
    }

    /// Remove every entry for `resource`, independent of parameter suffix:
    /// all pages, searches, and filter combinations, plus detail entries.
    /// Subsequent reads for any matching key behave as a miss.
    pub fn invalidate(&self, resource: Resource) -> usize {
        let removed = if self.config.enabled {
            let mut entries = write_guard(&self.entries, "invalidate");
            let matching: Vec<QueryKey> = entries
                .iter()
                .map(|(key, _)| key)
                .filter(|key| key.resource() == resource)
                .cloned()
                .collect();
            for key in &matching {
                entries.pop(key);
            }
            gauge!(METRIC_ENTRIES).set(entries.len() as f64);
            matching.len()
        } else {
            0
        };

        counter!(METRIC_INVALIDATED).increment(removed as u64);
        info!(resource = %resource, removed, "Invalidated cached entries for resource");
        self.bus.publish(InvalidationEvent::resource_wide(resource));
        removed
    }

    /// Clear the detail entry for a single record. Used after delete and
    /// update so a removed record cannot be served from its detail key.
    pub fn invalidate_one(&self, resource: Resource, id: &str) {
        if self.config.enabled {
            let mut entries = write_guard(&self.entries, "invalidate_one");
            if entries.pop(&QueryKey::detail(resource, id)).is_some() {
                counter!(METRIC_INVALIDATED).increment(1);
            }
            gauge!(METRIC_ENTRIES).set(entries.len() as f64);
        }
        self.bus.publish(InvalidationEvent::single_record(resource, id));
    }

    /// Subscribe to invalidation events for eager refetch.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<InvalidationEvent> {
        self.bus.subscribe()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        let mut entries = write_guard(&self.entries, "clear");
        entries.clear();
        gauge!(METRIC_ENTRIES).set(0.0);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        super::lock::read_guard(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
