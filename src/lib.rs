//! Rubrica: a headless CRM console with a cached, invalidation-aware
//! query layer.
//!
//! Reads flow through [`cache::ResourceCache`] keyed by canonical
//! [`cache::QueryKey`]s, with single-flight coordination so concurrent
//! identical fetches share one network call. Writes flow through
//! [`query::MutationCoordinator`], which invalidates affected entries
//! before the mutation resolves to its caller.

pub mod api;
pub mod cache;
pub mod config;
pub mod console;
pub mod infra;
pub mod query;
