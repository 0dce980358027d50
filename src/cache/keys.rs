//! Cache key definitions.
//!
//! A `QueryKey` canonically identifies a cacheable read: one resource plus
//! either a sorted list-parameter map or a single record id.

use std::collections::BTreeMap;
use std::fmt;

use rubrica_api_types::Resource;

/// Canonical identifier for a cacheable read.
///
/// Equality is purely structural: two keys built from the same non-empty
/// parameters compare equal regardless of the order the parameters were
/// supplied in, because list parameters live in a `BTreeMap` sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Resource,
    kind: KeyKind,
}

/// List reads carry their canonical parameter map; detail reads carry the
/// record id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyKind {
    List(BTreeMap<String, String>),
    Detail(String),
}

impl QueryKey {
    /// Key for a single-record detail read.
    pub fn detail(resource: Resource, id: impl Into<String>) -> Self {
        Self {
            resource,
            kind: KeyKind::Detail(id.into()),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn kind(&self) -> &KeyKind {
        &self.kind
    }

    /// The canonical parameter map for a list key, if this is one.
    pub fn params(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            KeyKind::List(params) => Some(params),
            KeyKind::Detail(_) => None,
        }
    }

    /// The record id for a detail key, if this is one.
    pub fn detail_id(&self) -> Option<&str> {
        match &self.kind {
            KeyKind::Detail(id) => Some(id),
            KeyKind::List(_) => None,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            KeyKind::Detail(id) => write!(f, "{}/{id}", self.resource),
            KeyKind::List(params) => {
                write!(f, "{}?", self.resource)?;
                for (i, (name, value)) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Builds canonical list keys from a resource and a parameter set.
///
/// Parameters with empty values are omitted, so `{search: "", status:
/// "active"}` and `{status: "active"}` canonicalize to the same key. Values
/// are stringified; the builder never fails.
#[derive(Debug, Clone)]
pub struct QueryKeyBuilder {
    resource: Resource,
    params: BTreeMap<String, String>,
}

impl QueryKeyBuilder {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. Empty values are dropped.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.params.insert(name.to_string(), value);
        }
        self
    }

    /// Add an optional parameter. `None` and empty values are dropped.
    pub fn opt_param(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn build(self) -> QueryKey {
        QueryKey {
            resource: self.resource,
            kind: KeyKind::List(self.params),
        }
    }
}
