//! Pagination helpers for the result view.

use models::PAGE_SIZE;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: u32) -> Self {
        Self { page, per_page: PAGE_SIZE }
    }

    /// Clamp page to >= 1 and per_page to 1..=100.
    pub fn normalize(self) -> Self {
        Self { page: self.page.max(1), per_page: self.per_page.clamp(1, 100) }
    }

    pub fn total_pages(self, total: u64) -> u32 {
        let per = self.normalize().per_page as u64;
        u32::try_from(total.div_ceil(per)).unwrap_or(u32::MAX)
    }

    pub fn has_prev(self) -> bool {
        self.normalize().page > 1
    }

    pub fn has_next(self, total: u64) -> bool {
        self.normalize().page < self.total_pages(total)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self::new(1) }
}
