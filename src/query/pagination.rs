//! Shared page-number pagination helpers.
//!
//! The backend reports offset pagination (`page`/`limit`/`total`); this
//! model derives the page count and clamps requested pages into range.

use rubrica_api_types::PageInfo;

/// Fixed page size for list views. A configuration constant, not a
/// user-adjustable knob.
pub const PAGE_SIZE: u32 = 20;

/// Derived pagination state for one list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationModel {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationModel {
    /// Derive pagination from a requested page and server-reported totals.
    ///
    /// `total_pages` is `ceil(total / limit)`, or 1 when the collection is
    /// empty; the requested page is clamped into `[1, total_pages]`.
    pub fn derive(requested_page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(u64::from(limit)) as u32
        };
        Self {
            page: requested_page.clamp(1, total_pages),
            limit,
            total,
            total_pages,
        }
    }

    /// Derive pagination from a server envelope, trusting its totals but
    /// still clamping the reported page.
    pub fn from_page_info(info: &PageInfo) -> Self {
        Self::derive(info.page, info.limit, info.total)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let model = PaginationModel::derive(1, 20, 45);
        assert_eq!(model.total_pages, 3);

        let exact = PaginationModel::derive(1, 20, 40);
        assert_eq!(exact.total_pages, 2);
    }

    #[test]
    fn empty_collection_is_a_single_page() {
        let model = PaginationModel::derive(1, 20, 0);
        assert_eq!(model.total_pages, 1);
        assert_eq!(model.page, 1);
        assert!(!model.has_next());
        assert!(!model.has_previous());
    }

    #[test]
    fn requested_page_is_clamped() {
        let beyond = PaginationModel::derive(9, 20, 45);
        assert_eq!(beyond.page, 3);

        let zero = PaginationModel::derive(0, 20, 45);
        assert_eq!(zero.page, 1);
    }

    #[test]
    fn navigation_flags() {
        let first = PaginationModel::derive(1, 20, 45);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let middle = PaginationModel::derive(2, 20, 45);
        assert!(middle.has_next());
        assert!(middle.has_previous());

        let last = PaginationModel::derive(3, 20, 45);
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn zero_limit_is_clamped() {
        let model = PaginationModel::derive(1, 0, 10);
        assert_eq!(model.limit, 1);
        assert_eq!(model.total_pages, 10);
    }

    #[test]
    fn from_page_info_clamps_reported_page() {
        let info = PageInfo {
            page: 7,
            limit: 20,
            total: 45,
            total_pages: 3,
        };
        let model = PaginationModel::from_page_info(&info);
        assert_eq!(model.page, 3);
    }
}
