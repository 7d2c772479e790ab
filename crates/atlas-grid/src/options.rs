//! Grid construction options

use std::time::Duration;

use crate::{
    DEFAULT_OVERSCAN, DEFAULT_PAGE_SIZE, DEFAULT_ROW_HEIGHT, DEFAULT_SEARCH_DEBOUNCE,
    VirtualizationMode,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    /// Rows per page when paginating
    pub page_size: usize,
    /// Page size options offered by the pager
    pub page_sizes: Vec<usize>,
    /// Paginate instead of showing every row; disables windowing
    pub paginate: bool,
    pub multi_select: bool,
    /// Quiet period before a typed search term is applied
    pub search_debounce: Duration,
    pub virtualization: VirtualizationMode,
    /// Fixed row height in pixels, used for windowing
    pub row_height: f64,
    /// Extra rows materialized above and below the viewport
    pub overscan: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_sizes: vec![10, 25, 50, 100],
            paginate: true,
            multi_select: true,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            virtualization: VirtualizationMode::default(),
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl GridOptions {
    pub fn paginated(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    pub fn virtualization(mut self, mode: VirtualizationMode) -> Self {
        self.virtualization = mode;
        self
    }

    pub fn row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }
}
