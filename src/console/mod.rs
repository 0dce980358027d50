//! Headless console: per-resource command handlers over the query layer.
//!
//! Handlers never talk to the transport directly. Reads go through the
//! query cache and list controllers; writes go through the mutation
//! coordinator so every command leaves the cache coherent.

mod contacts;
mod customers;
mod print;
mod segments;
mod tags;
mod tickets;

use std::sync::Arc;

use thiserror::Error;

use rubrica_api_types::Resource;

use crate::api::{ApiError, FetchFailure};
use crate::cache::{CacheEntry, EntryStatus, ResourceCache};
use crate::config::{Command, ListArgs, QuerySettings};
use crate::query::{
    FilterState, ListQueryController, ListSnapshot, MutationCoordinator, QueryStatus,
    ResourceGateway, fetch_detail,
};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Shared handle bundle every handler receives.
pub struct AppContext {
    cache: Arc<ResourceCache>,
    gateway: Arc<dyn ResourceGateway>,
    mutations: MutationCoordinator,
    page_size: u32,
}

impl AppContext {
    pub fn new(
        cache: Arc<ResourceCache>,
        gateway: Arc<dyn ResourceGateway>,
        query: &QuerySettings,
    ) -> Self {
        let mutations = MutationCoordinator::new(gateway.clone(), cache.clone());
        Self {
            cache,
            gateway,
            mutations,
            page_size: query.page_size.get(),
        }
    }

    fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    /// Run a list query through a controller and surface its terminal state.
    async fn list(&self, resource: Resource, args: &ListArgs) -> Result<ListSnapshot, ConsoleError> {
        let controller = ListQueryController::new(
            resource,
            self.cache.clone(),
            self.gateway.clone(),
            self.page_size,
        );
        let snapshot = controller.set_filter(filter_from_args(args)).await;
        match snapshot.status {
            QueryStatus::Error => Err(snapshot
                .error
                .unwrap_or_else(|| missing_error_descriptor())
                .into()),
            _ => Ok(snapshot),
        }
    }

    /// Fetch one record through the cache under its detail key.
    async fn show(&self, resource: Resource, id: &str) -> Result<CacheEntry, ConsoleError> {
        let entry = fetch_detail(&self.cache, &self.gateway, resource, id).await;
        if entry.status == EntryStatus::Error {
            return Err(entry
                .error
                .unwrap_or_else(|| missing_error_descriptor())
                .into());
        }
        Ok(entry)
    }
}

fn filter_from_args(args: &ListArgs) -> FilterState {
    let mut filter = FilterState::default();
    if let Some(search) = &args.search {
        filter.set_search(search.clone());
    }
    filter.set_status(args.status.clone());
    filter.set_kind(args.kind.clone());
    filter.set_segment(args.segment.clone());
    filter.set_page(args.page);
    filter
}

// Error entries always carry an error; this only guards the type system.
fn missing_error_descriptor() -> FetchFailure {
    FetchFailure::new(
        crate::api::FailureKind::Decode,
        None,
        "fetch failed without an error descriptor",
    )
}

/// Dispatch a parsed command to its resource handler.
pub async fn dispatch(ctx: &AppContext, command: Command) -> Result<(), ConsoleError> {
    match command {
        Command::Customers(args) => customers::handle(ctx, args.command).await,
        Command::Contacts(args) => contacts::handle(ctx, args.command).await,
        Command::Segments(args) => segments::handle(ctx, args.command).await,
        Command::Tickets(args) => tickets::handle(ctx, args.command).await,
        Command::Tags(args) => tags::handle(ctx, args.command).await,
    }
}
