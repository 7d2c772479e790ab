//! Notifications emitted by [`GridState`](crate::GridState) actions

use atlas_core::{Record, Value};

use crate::{CellId, FilterPredicate, SortKey};

/// Handle returned by [`GridState::subscribe`](crate::GridState::subscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) usize);

/// Something observable changed
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Raw rows were replaced wholesale
    DataReplaced { row_count: usize },
    /// The caller's column set changed; `layout_changed` is false when the
    /// order and hidden set survived untouched
    ColumnsReconciled { layout_changed: bool },
    /// The debounced search term was applied
    SearchApplied { term: String },
    SortChanged { keys: Vec<SortKey> },
    FiltersChanged { predicates: Vec<FilterPredicate> },
    /// Filters and search were both cleared
    FiltersCleared,
    PageChanged { page: usize },
    PageSizeChanged { page_size: usize },
    RowSelectionChanged { selected: Vec<usize> },
    RowExpansionToggled { index: usize, expanded: bool },
    CellSelectionChanged { selected: usize },
    CellsMerged { region_id: u64 },
    CellsUnmerged { region_id: u64 },
    ColumnVisibilityChanged { column_id: String, visible: bool },
    ColumnMoved { from: usize, to: usize },
    ColumnWidthChanged { column_id: String, width: f32 },
    LayoutRestored,
    EditingCellChanged { cell: Option<CellId> },
    /// A cell edit was committed. The grid does not patch its rows; the host
    /// persists the change and pushes new data.
    CellEdited {
        record: Record,
        row_index: usize,
        column_id: String,
        value: Value,
    },
}

impl GridEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataReplaced { .. } => "data_replaced",
            Self::ColumnsReconciled { .. } => "columns_reconciled",
            Self::SearchApplied { .. } => "search_applied",
            Self::SortChanged { .. } => "sort_changed",
            Self::FiltersChanged { .. } => "filters_changed",
            Self::FiltersCleared => "filters_cleared",
            Self::PageChanged { .. } => "page_changed",
            Self::PageSizeChanged { .. } => "page_size_changed",
            Self::RowSelectionChanged { .. } => "row_selection_changed",
            Self::RowExpansionToggled { .. } => "row_expansion_toggled",
            Self::CellSelectionChanged { .. } => "cell_selection_changed",
            Self::CellsMerged { .. } => "cells_merged",
            Self::CellsUnmerged { .. } => "cells_unmerged",
            Self::ColumnVisibilityChanged { .. } => "column_visibility_changed",
            Self::ColumnMoved { .. } => "column_moved",
            Self::ColumnWidthChanged { .. } => "column_width_changed",
            Self::LayoutRestored => "layout_restored",
            Self::EditingCellChanged { .. } => "editing_cell_changed",
            Self::CellEdited { .. } => "cell_edited",
        }
    }
}
