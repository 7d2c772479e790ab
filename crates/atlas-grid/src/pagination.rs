//! Page index/size bookkeeping for the client-side pager

use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Pagination state (1-indexed pages)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub current_page: usize,
    /// Rows per page, never zero
    pub page_size: usize,
    /// Page size options offered by the pager
    pub available_page_sizes: Vec<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            available_page_sizes: vec![10, 25, 50, 100],
        }
    }

    /// Number of pages needed for `len` rows; zero when there are no rows
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Current page clamped to what `len` rows can fill
    pub fn effective_page(&self, len: usize) -> usize {
        self.current_page.clamp(1, self.total_pages(len).max(1))
    }

    /// Index of the first row on the current page
    pub fn offset(&self, len: usize) -> usize {
        (self.effective_page(len) - 1) * self.page_size
    }

    /// Row range of the current page
    pub fn page_range(&self, len: usize) -> Range<usize> {
        let start = self.offset(len).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    /// Go to `page`, clamped into `[1, total_pages]`
    pub fn set_page(&mut self, page: usize, len: usize) -> bool {
        let page = page.clamp(1, self.total_pages(len).max(1));
        if self.current_page == page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Change the page size; always returns to the first page
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        let changed = self.page_size != page_size || self.current_page != 1;
        self.page_size = page_size;
        self.current_page = 1;
        changed
    }

    pub fn reset(&mut self) -> bool {
        if self.current_page == 1 {
            return false;
        }
        self.current_page = 1;
        true
    }

    /// Pull the current page back into range after the row count shrank
    pub fn clamp_to(&mut self, len: usize) -> bool {
        let page = self.effective_page(len);
        if page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn can_go_next(&self, len: usize) -> bool {
        self.current_page < self.total_pages(len)
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn go_next(&mut self, len: usize) -> bool {
        self.can_go_next(len) && self.set_page(self.current_page + 1, len)
    }

    pub fn go_prev(&mut self, len: usize) -> bool {
        self.can_go_prev() && self.set_page(self.current_page - 1, len)
    }

    pub fn go_first(&mut self) -> bool {
        self.reset()
    }

    pub fn go_last(&mut self, len: usize) -> bool {
        self.set_page(self.total_pages(len), len)
    }

    /// Pager caption such as `"51–75 of 1000"`
    pub fn range_label(&self, len: usize) -> String {
        let range = self.page_range(len);
        if range.is_empty() {
            return format!("0 of {}", len);
        }
        format!("{}–{} of {}", range.start + 1, range.end, len)
    }
}
