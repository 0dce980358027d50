//! Invalidation event fan-out.
//!
//! Every invalidation is broadcast to subscribed controllers so they can
//! eagerly refetch instead of waiting for the next read to miss.

use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use rubrica_api_types::Resource;

/// A cache invalidation, broadcast after the affected entries are removed.
#[derive(Debug, Clone)]
pub struct InvalidationEvent {
    /// Unique identifier for log correlation.
    pub id: Uuid,
    /// The resource whose entries were invalidated.
    pub resource: Resource,
    /// Set when a single record's detail entry was also cleared.
    pub record_id: Option<String>,
    /// When the invalidation happened.
    pub timestamp: OffsetDateTime,
}

impl InvalidationEvent {
    pub fn resource_wide(resource: Resource) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            record_id: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn single_record(resource: Resource, record_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            record_id: Some(record_id.into()),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Broadcast hub for invalidation events.
///
/// Wraps a `tokio::sync::broadcast` channel: publishing never blocks, and
/// subscribers that fall behind observe a lag error rather than stalling
/// the cache. Publishing with no live subscribers is a no-op.
pub struct InvalidationBus {
    sender: broadcast::Sender<InvalidationEvent>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to future invalidation events.
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: InvalidationEvent) {
        debug!(
            event_id = %event.id,
            resource = %event.resource,
            record_id = event.record_id.as_deref(),
            "Invalidation event published"
        );
        // Err only means no subscribers are listening right now.
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
