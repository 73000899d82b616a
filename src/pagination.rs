//! Pagination parameters and response metadata.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not send `limit`.
pub const DEFAULT_LIMIT: u32 = 12;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 50;

/// Raw `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page index
    pub page: Option<u32>,
    /// items per page
    pub limit: Option<u32>,
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl PageParams {
    /// Clamp to sane defaults: page >= 1, limit in `1..=MAX_LIMIT`.
    pub fn normalize(self) -> Pagination {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        Pagination { page, limit }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Build response metadata for a query that matched `total` rows.
    pub fn meta(&self, total: i64) -> PageMeta {
        let total = total.max(0);
        let limit = i64::from(self.limit);
        let total_pages = (total + limit - 1) / limit;
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages,
            has_more: i64::from(self.page) < total_pages,
        }
    }
}

/// Pagination block returned next to list items.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

/// A page of items plus its metadata.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: &Pagination, total: i64) -> Self {
        Self {
            items,
            pagination: pagination.meta(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let p = PageParams {
            page: Some(0),
            limit: Some(0),
        }
        .normalize();
        assert_eq!(p, Pagination { page: 1, limit: 1 });
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let p = PageParams {
            page: Some(5),
            limit: Some(1000),
        }
        .normalize();
        assert_eq!(p.limit, MAX_LIMIT);
        assert_eq!(p.offset(), 4 * i64::from(MAX_LIMIT));
    }

    #[test]
    fn missing_params_use_defaults() {
        let p = PageParams::default().normalize();
        assert_eq!(p, Pagination { page: 1, limit: DEFAULT_LIMIT });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn meta_rounds_total_pages_up() {
        let meta = Pagination { page: 2, limit: 12 }.meta(25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_more);

        let last = Pagination { page: 3, limit: 12 }.meta(25);
        assert!(!last.has_more);
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = Pagination { page: 1, limit: 12 }.meta(0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_more);
    }
}
