//! Rubrica query cache.
//!
//! Process-wide cache for list and detail reads, with single-flight fetch
//! coordination and event-driven invalidation:
//!
//! - **Keys** canonicalize a resource plus filter/pagination parameters.
//! - **Store** owns every entry; writers go through its API only.
//! - **Events** broadcast invalidations so live controllers refetch eagerly.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `rubrica.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! entry_limit = 256
//! event_buffer = 64
//! ```

mod config;
mod events;
mod keys;
mod lock;
mod store;

pub(crate) use lock::lock_guard;

pub use config::CacheConfig;
pub use events::{InvalidationBus, InvalidationEvent};
pub use keys::{KeyKind, QueryKey, QueryKeyBuilder};
pub use store::{CacheEntry, EntryStatus, QueryData, ResourceCache};
