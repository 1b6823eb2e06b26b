//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

use domain::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Requested page (1-based) and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

/// Offsets are bound as signed 64-bit integers by the SQL driver
const MAX_OFFSET: u64 = i64::MAX as u64;

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Page number, clamped so the resulting offset stays addressable
    pub fn page(&self) -> u64 {
        self.page.clamp(1, MAX_OFFSET / MAX_PAGE_SIZE + 1)
    }

    /// Get limit clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Calculate offset for the store query
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit()).min(MAX_OFFSET)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a list result
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            limit: request.limit(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_clamping() {
        let request = PageRequest::new(3, 10);
        assert_eq!(request.offset(), 20);

        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(1, 10_000);
        assert_eq!(request.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_huge_page_number_does_not_overflow() {
        let request = PageRequest::new(u64::MAX, 20);

        assert!(request.page() > 1);
        assert!(request.offset() <= i64::MAX as u64);
        assert_eq!(request.offset(), (request.page() - 1) * request.limit());

        let request = PageRequest::new(u64::MAX, u64::MAX);
        assert!(request.offset() <= i64::MAX as u64);
    }

    #[test]
    fn test_total_pages() {
        let page: Page<u8> = Page::new(vec![], 45, PageRequest::new(1, 20));
        assert_eq!(page.total_pages(), 3);
    }
}
