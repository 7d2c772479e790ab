//! Fixed-height row windowing
//!
//! Windowing only decides which rows are materialized; it never changes which
//! rows exist.

use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROW_HEIGHT: f64 = 40.0;
pub const DEFAULT_OVERSCAN: usize = 5;
pub const DEFAULT_VIRTUALIZATION_THRESHOLD: usize = 100;

/// When the grid windows its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualizationMode {
    Off,
    On,
    /// Window once the row count exceeds `threshold`
    Auto { threshold: usize },
}

impl Default for VirtualizationMode {
    fn default() -> Self {
        Self::Auto {
            threshold: DEFAULT_VIRTUALIZATION_THRESHOLD,
        }
    }
}

impl VirtualizationMode {
    /// Pagination always wins over windowing
    pub fn is_active(&self, paginated: bool, row_count: usize) -> bool {
        if paginated {
            return false;
        }
        match self {
            Self::Off => false,
            Self::On => true,
            Self::Auto { threshold } => row_count > *threshold,
        }
    }
}

/// Rows to materialize plus their absolute offsets
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportWindow {
    /// Half-open range of row indices into the sorted rows
    pub rows: Range<usize>,
    /// Height of the scroll content; zero when not windowing
    pub total_content_height: f64,
    /// `row_offsets[i]` is the top of `rows.start + i`; empty when not windowing
    pub row_offsets: Vec<f64>,
}

impl ViewportWindow {
    /// Un-windowed view over `len` rows
    pub fn full(len: usize) -> Self {
        Self {
            rows: 0..len,
            total_content_height: 0.0,
            row_offsets: Vec::new(),
        }
    }

    pub fn is_windowed(&self) -> bool {
        !self.row_offsets.is_empty()
    }

    pub fn first_visible(&self) -> Option<usize> {
        (!self.rows.is_empty()).then_some(self.rows.start)
    }

    pub fn last_visible(&self) -> Option<usize> {
        (!self.rows.is_empty()).then(|| self.rows.end - 1)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pixel offset of an absolute row index inside the window
    pub fn offset_of(&self, index: usize) -> Option<f64> {
        if !self.rows.contains(&index) {
            return None;
        }
        self.row_offsets.get(index - self.rows.start).copied()
    }
}

/// Scroll container geometry
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualWindow {
    row_height: f64,
    overscan: usize,
    scroll_top: f64,
    viewport_height: f64,
}

impl Default for VirtualWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_HEIGHT, DEFAULT_OVERSCAN)
    }
}

fn sanitize(px: f64) -> f64 {
    if px.is_finite() { px.max(0.0) } else { 0.0 }
}

impl VirtualWindow {
    pub fn new(row_height: f64, overscan: usize) -> Self {
        Self {
            row_height: if row_height.is_finite() && row_height > 0.0 {
                row_height
            } else {
                1.0
            },
            overscan,
            scroll_top: 0.0,
            viewport_height: 0.0,
        }
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn set_scroll_top(&mut self, scroll_top: f64) -> bool {
        let scroll_top = sanitize(scroll_top);
        if scroll_top == self.scroll_top {
            return false;
        }
        self.scroll_top = scroll_top;
        true
    }

    pub fn set_viewport_height(&mut self, height: f64) -> bool {
        let height = sanitize(height);
        if height == self.viewport_height {
            return false;
        }
        self.viewport_height = height;
        true
    }

    /// Rows intersecting `[scroll_top, scroll_top + viewport_height]`,
    /// widened by the overscan on both sides and clamped to `[0, len - 1]`.
    pub fn compute(&self, len: usize) -> ViewportWindow {
        if len == 0 {
            return ViewportWindow::default();
        }
        let rh = self.row_height;
        let last_index = len - 1;

        let first = ((self.scroll_top / rh).floor() as usize).saturating_sub(self.overscan);
        let last = ((self.scroll_top + self.viewport_height) / rh).ceil() as usize;
        let last = last.saturating_add(self.overscan).min(last_index);
        let first = first.min(last);

        let rows = first..last + 1;
        let row_offsets = rows.clone().map(|i| i as f64 * rh).collect();
        tracing::trace!(first, last, len, "viewport window");

        ViewportWindow {
            rows,
            total_content_height: len as f64 * rh,
            row_offsets,
        }
    }

    /// Scroll position that brings `index` to the top
    pub fn scroll_offset_for(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }
}
