//! Mutation coordinator.
//!
//! Every write goes through here so cache coherence is not a per-call-site
//! concern. On success the affected resource is invalidated BEFORE the
//! mutation result is handed back: by the time a caller observes a
//! completed create/update/delete, no list or detail entry for that
//! resource can still serve pre-mutation data.

use std::sync::Arc;

use tracing::debug;

use rubrica_api_types::{Record, Resource};

use crate::api::ApiError;
use crate::cache::ResourceCache;

use super::ResourceGateway;

pub struct MutationCoordinator {
    gateway: Arc<dyn ResourceGateway>,
    cache: Arc<ResourceCache>,
}

impl MutationCoordinator {
    pub fn new(gateway: Arc<dyn ResourceGateway>, cache: Arc<ResourceCache>) -> Self {
        Self { gateway, cache }
    }

    /// Create a record. Invalidates every list entry for the resource
    /// before returning the created record.
    pub async fn create(
        &self,
        resource: Resource,
        payload: serde_json::Value,
    ) -> Result<Record, ApiError> {
        let record = self.gateway.create(resource, payload).await?;
        let removed = self.cache.invalidate(resource);
        debug!(%resource, removed, "Create committed; cache invalidated");
        Ok(record)
    }

    /// Update a record. Invalidates the resource's list entries and the
    /// record's detail entry before returning the updated record.
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<Record, ApiError> {
        let record = self.gateway.update(resource, id.to_string(), payload).await?;
        let removed = self.cache.invalidate(resource);
        self.cache.invalidate_one(resource, id);
        debug!(%resource, id, removed, "Update committed; cache invalidated");
        Ok(record)
    }

    /// Delete a record. Invalidates the resource's list entries and the
    /// record's detail entry before resolving.
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        self.gateway.delete(resource, id.to_string()).await?;
        let removed = self.cache.invalidate(resource);
        self.cache.invalidate_one(resource, id);
        debug!(%resource, id, removed, "Delete committed; cache invalidated");
        Ok(())
    }
}
