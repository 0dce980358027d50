//! Per-view filter state.
//!
//! One `FilterState` backs each list view: free-text search, categorical
//! filters, and the current page. Changing anything other than the page
//! resets the page to 1 so a narrowed result set is viewed from the start.

use rubrica_api_types::Resource;

use crate::cache::{QueryKey, QueryKeyBuilder};

/// Filter and pagination state owned by a list controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub status: Option<String>,
    /// Resource subtype filter; sent as the `type` query parameter
    /// (e.g. `individual`/`business` for customers).
    pub kind: Option<String>,
    pub segment: Option<String>,
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            kind: None,
            segment: None,
            page: 1,
        }
    }
}

impl FilterState {
    /// Update the search text. Returns whether anything changed; a change
    /// resets the page to 1.
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if self.search == search {
            return false;
        }
        self.search = search;
        self.page = 1;
        true
    }

    /// Update the status filter; a change resets the page to 1.
    pub fn set_status(&mut self, status: Option<String>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.page = 1;
        true
    }

    /// Update the subtype filter; a change resets the page to 1.
    pub fn set_kind(&mut self, kind: Option<String>) -> bool {
        if self.kind == kind {
            return false;
        }
        self.kind = kind;
        self.page = 1;
        true
    }

    /// Update the segment filter; a change resets the page to 1.
    pub fn set_segment(&mut self, segment: Option<String>) -> bool {
        if self.segment == segment {
            return false;
        }
        self.segment = segment;
        self.page = 1;
        true
    }

    /// Navigate to a page. Does NOT reset other filters; pages below 1 are
    /// clamped. Returns whether the page changed.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if self.page == page {
            return false;
        }
        self.page = page;
        true
    }

    /// Build the canonical cache key for this filter state.
    pub fn to_key(&self, resource: Resource, limit: u32) -> QueryKey {
        QueryKeyBuilder::new(resource)
            .param("page", self.page)
            .param("limit", limit)
            .param("search", &self.search)
            .opt_param("status", self.status.as_deref())
            .opt_param("type", self.kind.as_deref())
            .opt_param("segment", self.segment.as_deref())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_change_resets_page() {
        let mut filter = FilterState::default();
        filter.set_page(3);
        assert_eq!(filter.page, 3);

        assert!(filter.set_search("acme"));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn clearing_search_also_resets_page() {
        let mut filter = FilterState::default();
        filter.set_search("acme");
        filter.set_page(3);

        assert!(filter.set_search(""));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn categorical_changes_reset_page() {
        let mut filter = FilterState::default();

        filter.set_page(2);
        assert!(filter.set_status(Some("active".to_string())));
        assert_eq!(filter.page, 1);

        filter.set_page(2);
        assert!(filter.set_kind(Some("business".to_string())));
        assert_eq!(filter.page, 1);

        filter.set_page(2);
        assert!(filter.set_segment(Some("s1".to_string())));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn page_change_keeps_other_filters() {
        let mut filter = FilterState::default();
        filter.set_search("acme");
        filter.set_status(Some("active".to_string()));

        assert!(filter.set_page(2));
        assert_eq!(filter.search, "acme");
        assert_eq!(filter.status.as_deref(), Some("active"));
    }

    #[test]
    fn unchanged_values_report_no_change() {
        let mut filter = FilterState::default();
        filter.set_search("acme");
        filter.set_page(3);

        assert!(!filter.set_search("acme"));
        assert_eq!(filter.page, 3, "no-op change must not reset the page");
        assert!(!filter.set_status(None));
        assert!(!filter.set_page(3));
    }

    #[test]
    fn page_is_clamped_to_one() {
        let mut filter = FilterState::default();
        assert!(!filter.set_page(0));
        assert_eq!(filter.page, 1);
    }

    #[test]
    fn empty_filters_are_omitted_from_the_key() {
        let blank = FilterState::default().to_key(Resource::Customers, 20);
        let params = blank.params().expect("list params");
        assert_eq!(params.len(), 2, "only page and limit: {params:?}");
        assert!(params.contains_key("page"));
        assert!(params.contains_key("limit"));
    }

    #[test]
    fn populated_filters_appear_in_the_key() {
        let mut filter = FilterState::default();
        filter.set_search("acme");
        filter.set_status(Some("active".to_string()));
        filter.set_kind(Some("business".to_string()));
        filter.set_page(2);

        let key = filter.to_key(Resource::Customers, 20);
        let params = key.params().expect("list params");
        assert_eq!(params.get("search").map(String::as_str), Some("acme"));
        assert_eq!(params.get("status").map(String::as_str), Some("active"));
        assert_eq!(params.get("type").map(String::as_str), Some("business"));
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
    }
}
