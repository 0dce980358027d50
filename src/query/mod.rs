//! Query layer: per-view list controllers, pagination, and the mutation
//! coordinator that keeps the cache coherent after writes.

mod controller;
mod filter;
mod mutation;
mod pagination;

pub use controller::{ListQueryController, ListSnapshot, QueryStatus};
pub use filter::FilterState;
pub use mutation::MutationCoordinator;
pub use pagination::{PAGE_SIZE, PaginationModel};

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use rubrica_api_types::{Record, RecordPage, Resource};

use crate::api::{ApiError, FetchFailure};
use crate::cache::{CacheEntry, QueryData, QueryKey, ResourceCache};

/// Boundary between the query layer and the REST transport.
///
/// Reads surface the cloneable `FetchFailure` the cache can hold; mutation
/// errors pass through as full `ApiError`s so callers see them unmodified.
pub trait ResourceGateway: Send + Sync {
    fn list(
        &self,
        resource: Resource,
        params: BTreeMap<String, String>,
    ) -> BoxFuture<'static, Result<RecordPage, FetchFailure>>;

    fn get(&self, resource: Resource, id: String)
    -> BoxFuture<'static, Result<Record, FetchFailure>>;

    fn create(
        &self,
        resource: Resource,
        payload: serde_json::Value,
    ) -> BoxFuture<'static, Result<Record, ApiError>>;

    fn update(
        &self,
        resource: Resource,
        id: String,
        payload: serde_json::Value,
    ) -> BoxFuture<'static, Result<Record, ApiError>>;

    fn delete(&self, resource: Resource, id: String) -> BoxFuture<'static, Result<(), ApiError>>;
}

/// Fetch a single record through the cache under its detail key.
///
/// Served from the cache until `invalidate_one` (or a resource-wide
/// invalidation) clears it.
pub async fn fetch_detail(
    cache: &ResourceCache,
    gateway: &Arc<dyn ResourceGateway>,
    resource: Resource,
    id: &str,
) -> CacheEntry {
    let key = QueryKey::detail(resource, id);
    let gateway = gateway.clone();
    let id = id.to_string();
    cache
        .fetch(key, move || async move {
            gateway.get(resource, id).await.map(QueryData::Record)
        })
        .await
}
