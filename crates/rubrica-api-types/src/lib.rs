//! Shared request and response types for the Rubrica CRM API.
//!
//! The query layer treats server records as opaque blobs with an `id`
//! field; everything it depends on from the wire is defined here, so the
//! main crate and any future SDK consumers agree on the envelope shape.

mod requests;

pub use requests::{
    ContactCreateRequest, CustomerCreateRequest, CustomerUpdateRequest, SegmentCreateRequest,
    TagCreateRequest, TicketCreateRequest,
};

use serde::{Deserialize, Serialize};

/// A named category of records addressed via the REST boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Customers,
    Contacts,
    Segments,
    SupportTickets,
    Tags,
}

impl Resource {
    /// URL path segment for this resource collection.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Customers => "customers",
            Resource::Contacts => "contacts",
            Resource::Segments => "segments",
            Resource::SupportTickets => "support-tickets",
            Resource::Tags => "tags",
        }
    }

    /// All known resources, in display order.
    pub fn all() -> &'static [Resource] {
        &[
            Resource::Customers,
            Resource::Contacts,
            Resource::Segments,
            Resource::SupportTickets,
            Resource::Tags,
        ]
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Top-level response envelope: every successful response wraps its payload
/// in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// Server-reported pagination for a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

impl PageInfo {
    /// A single empty page, used when a collection has no records yet.
    pub fn empty(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 1,
        }
    }
}

/// One page of records plus its pagination envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPage {
    pub items: Vec<Record>,
    pub pagination: PageInfo,
}

/// An opaque server record.
///
/// The client never interprets resource-specific fields; it relies only on
/// the `id` field for targeted invalidation. Ids arrive as JSON strings or
/// integers depending on the backend and are normalized to strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(serde_json::Value);

impl Record {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The record id, normalized to a string. Absent when the payload has
    /// no `id` field or the field is not a string or integer.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Raw access to a top-level field.
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Record {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn resource_paths_are_stable() {
        assert_eq!(Resource::Customers.path(), "customers");
        assert_eq!(Resource::SupportTickets.path(), "support-tickets");
        assert_eq!(Resource::all().len(), 5);
    }

    #[test]
    fn record_id_accepts_string_and_integer() {
        let by_string = Record::new(json!({"id": "c1", "name": "Acme"}));
        assert_eq!(by_string.id().as_deref(), Some("c1"));

        let by_number = Record::new(json!({"id": 42, "name": "Acme"}));
        assert_eq!(by_number.id().as_deref(), Some("42"));

        let missing = Record::new(json!({"name": "Acme"}));
        assert!(missing.id().is_none());
    }

    #[test]
    fn list_envelope_roundtrip() {
        let body = json!({
            "data": {
                "items": [{"id": "c1"}, {"id": "c2"}],
                "pagination": {"page": 1, "limit": 20, "total": 45, "totalPages": 3}
            }
        });

        let envelope: ApiEnvelope<RecordPage> = serde_json::from_value(body).expect("envelope");
        assert_eq!(envelope.data.items.len(), 2);
        assert_eq!(envelope.data.pagination.total, 45);
        assert_eq!(envelope.data.pagination.total_pages, 3);
    }

    #[test]
    fn empty_page_info() {
        let info = PageInfo::empty(20);
        assert_eq!(info.page, 1);
        assert_eq!(info.total, 0);
        assert_eq!(info.total_pages, 1);
    }
}
