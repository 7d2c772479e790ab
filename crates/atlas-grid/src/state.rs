//! Grid state orchestrator
//!
//! [`GridState`] owns the raw rows, the column set and every piece of user
//! state. Actions mutate that state and then run [`GridState::recompute`],
//! which walks the pipeline in a fixed order:
//!
//! 1. filter (search term + predicates)
//! 2. sort
//! 3. paginate, or leave the sorted rows for the viewport window
//! 4. resolve visible columns
//!
//! Every stage is memoized on its own inputs and hands out the same `Rc` while
//! they are unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use atlas_core::{Record, Value};

use crate::memo::{Memo, RcKey};
use crate::{
    AccessorStats, CellId, CellSelection, ColumnDef, ColumnLayout, ColumnLayoutSnapshot, Debounced,
    FilterPredicate, FilterQuery, FilterSet, GridEvent, GridOptions, MergeInfo, Pagination,
    RowSelection, SortDirection, SortSpec, SubscriptionId, ValueAccessor, ViewportWindow,
    VirtualWindow, searchable_paths,
};

type Subscriber = Box<dyn FnMut(&GridEvent)>;

#[derive(Debug, Clone, PartialEq)]
struct FilterInputs {
    data: u64,
    columns: u64,
    search: String,
    filters: u64,
}

type SortInputs = (RcKey<Vec<usize>>, Vec<(String, SortDirection)>);
type PageInputs = (RcKey<Vec<usize>>, usize, usize);
type ColumnInputs = (u64, u64);

/// A row handed to the view layer
#[derive(Debug, Clone, Copy)]
pub struct RenderedRow<'a> {
    /// Index into the displayed rows; the key used by row and cell selection
    pub display_index: usize,
    /// Index into the raw rows
    pub source_index: usize,
    pub record: &'a Record,
    /// Absolute top offset when windowing
    pub offset: Option<f64>,
}

pub struct GridState {
    options: GridOptions,
    data: Rc<Vec<Record>>,
    columns: Rc<Vec<ColumnDef>>,
    search_paths: Vec<String>,
    layout: ColumnLayout,

    search_input: String,
    search: String,
    pending_search: Debounced<String>,
    filters: FilterSet,
    sort: SortSpec,
    pagination: Pagination,
    window: VirtualWindow,

    rows: RowSelection,
    /// Set when a recompute dropped the row selection; reported after the
    /// next event
    row_selection_reset: bool,
    expanded: BTreeSet<usize>,
    cells: CellSelection,
    editing: Option<CellId>,

    accessor: ValueAccessor,
    data_revision: u64,
    columns_revision: u64,

    filter_memo: Memo<FilterInputs, Rc<Vec<usize>>>,
    sort_memo: Memo<SortInputs, Rc<Vec<usize>>>,
    page_memo: Memo<PageInputs, Rc<Vec<usize>>>,
    column_memo: Memo<ColumnInputs, Rc<Vec<ColumnDef>>>,

    filtered: Rc<Vec<usize>>,
    sorted: Rc<Vec<usize>>,
    displayed: Rc<Vec<usize>>,
    viewport: ViewportWindow,
    visible_columns: Rc<Vec<ColumnDef>>,

    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: usize,
}

impl fmt::Debug for GridState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridState")
            .field("rows", &self.data.len())
            .field("columns", &self.columns.len())
            .field("search", &self.search)
            .field("filters", &self.filters.len())
            .field("sort", &self.sort)
            .field("page", &self.pagination.current_page)
            .field("displayed", &self.displayed.len())
            .finish_non_exhaustive()
    }
}

impl GridState {
    pub fn new(columns: Vec<ColumnDef>, data: Vec<Record>, options: GridOptions) -> Self {
        let layout = ColumnLayout::new(&columns);
        let mut state = Self {
            search_paths: searchable_paths(&columns),
            layout,
            columns: Rc::new(columns),
            data: Rc::new(data),
            search_input: String::new(),
            search: String::new(),
            pending_search: Debounced::new(options.search_debounce),
            filters: FilterSet::new(),
            sort: SortSpec::new(),
            pagination: Pagination::new(options.page_size),
            window: VirtualWindow::new(options.row_height, options.overscan),
            rows: RowSelection::new(options.multi_select),
            row_selection_reset: false,
            expanded: BTreeSet::new(),
            cells: CellSelection::new(),
            editing: None,
            accessor: ValueAccessor::new(),
            data_revision: 0,
            columns_revision: 0,
            filter_memo: Memo::default(),
            sort_memo: Memo::default(),
            page_memo: Memo::default(),
            column_memo: Memo::default(),
            filtered: Rc::default(),
            sorted: Rc::default(),
            displayed: Rc::default(),
            viewport: ViewportWindow::default(),
            visible_columns: Rc::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
            options,
        };
        state.pagination.available_page_sizes = state.options.page_sizes.clone();
        state.recompute();
        state
    }

    // Subscriptions

    pub fn subscribe(&mut self, subscriber: impl FnMut(&GridEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: GridEvent) {
        tracing::trace!(event = event.kind(), "grid event");
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
        if std::mem::take(&mut self.row_selection_reset) {
            self.emit_row_selection();
        }
    }

    // Data and columns

    /// Replace the raw rows. Row-keyed caches are dropped; user state is kept.
    pub fn set_data(&mut self, data: Vec<Record>) {
        self.data = Rc::new(data);
        self.data_revision += 1;
        self.accessor.reset();
        self.recompute();
        let row_count = self.data.len();
        self.emit(GridEvent::DataReplaced { row_count });
    }

    /// Replace the column set and reconcile the layout with it. An identical
    /// column set keeps every derived view.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef>) {
        let layout_changed = self.layout.reconcile(&columns);
        if *self.columns != columns {
            self.search_paths = searchable_paths(&columns);
            self.columns = Rc::new(columns);
            self.columns_revision += 1;
        }
        self.recompute();
        self.emit(GridEvent::ColumnsReconciled { layout_changed });
    }

    // Search

    /// Record a keystroke in the search box; applied after the debounce delay
    pub fn set_global_search(&mut self, text: impl Into<String>) {
        self.set_global_search_at(text, Instant::now());
    }

    pub fn set_global_search_at(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input = text.clone();
        self.pending_search.schedule(text, now);
    }

    /// Apply the pending search term if its quiet period elapsed by `now`
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_search.poll(now) {
            Some(term) => self.apply_search(term),
            None => false,
        }
    }

    /// Apply the pending search term immediately
    pub fn flush_search(&mut self) -> bool {
        match self.pending_search.flush() {
            Some(term) => self.apply_search(term),
            None => false,
        }
    }

    /// Timer for the pending search term; await it, then call [`Self::tick`]
    pub fn search_timer(&self) -> Option<smol::Timer> {
        self.pending_search.timer()
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.pending_search.deadline()
    }

    fn apply_search(&mut self, term: String) -> bool {
        if term == self.search {
            return false;
        }
        tracing::debug!(term = %term, "applying search");
        self.search = term;
        self.pagination.reset();
        self.recompute();
        let term = self.search.clone();
        self.emit(GridEvent::SearchApplied { term });
        true
    }

    // Sort and filter

    /// Header click. Unknown and unsortable columns are ignored.
    pub fn set_sort(&mut self, column_id: &str, additive: bool) -> bool {
        if !self.columns.iter().any(|c| c.id == column_id && c.sortable) {
            tracing::debug!(column = column_id, "sort on unknown or unsortable column ignored");
            return false;
        }
        self.sort.toggle(column_id, additive);
        self.recompute();
        let keys = self.sort.keys().to_vec();
        self.emit(GridEvent::SortChanged { keys });
        true
    }

    /// Replace the whole sort sequence
    pub fn set_sort_spec(&mut self, spec: SortSpec) -> bool {
        if spec == self.sort {
            return false;
        }
        self.sort = spec;
        self.recompute();
        let keys = self.sort.keys().to_vec();
        self.emit(GridEvent::SortChanged { keys });
        true
    }

    /// Add or replace a column predicate; `null`/`""` values remove it
    pub fn set_filter(&mut self, predicate: FilterPredicate) -> bool {
        if !self.filters.set(predicate) {
            return false;
        }
        self.filters_changed();
        true
    }

    pub fn remove_filter(&mut self, column_id: &str) -> bool {
        if !self.filters.remove(column_id) {
            return false;
        }
        self.filters_changed();
        true
    }

    fn filters_changed(&mut self) {
        self.pagination.reset();
        self.recompute();
        let predicates = self.filters.iter().cloned().collect();
        self.emit(GridEvent::FiltersChanged { predicates });
    }

    /// Clear every predicate and the search term, and return to page 1
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.pending_search.cancel();
        self.search_input.clear();
        self.search.clear();
        self.pagination.reset();
        self.recompute();
        self.emit(GridEvent::FiltersCleared);
    }

    // Pagination

    pub fn set_page(&mut self, page: usize) -> bool {
        if !self.pagination.set_page(page, self.sorted.len()) {
            return false;
        }
        self.recompute();
        let page = self.pagination.current_page;
        self.emit(GridEvent::PageChanged { page });
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.pagination.current_page + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.set_page(self.pagination.current_page.saturating_sub(1))
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        if !self.pagination.set_page_size(page_size) {
            return false;
        }
        self.recompute();
        let page_size = self.pagination.page_size;
        self.emit(GridEvent::PageSizeChanged { page_size });
        true
    }

    // Rows

    /// Toggle a displayed row; indices past the displayed rows are ignored
    pub fn toggle_row_selection(&mut self, index: usize) -> bool {
        if index >= self.displayed.len() {
            return false;
        }
        self.rows.toggle(index);
        self.emit_row_selection();
        true
    }

    /// Select every displayed row, or none if they already all are
    pub fn select_all(&mut self) -> bool {
        let selected = self.rows.select_all(self.displayed.len());
        self.emit_row_selection();
        selected
    }

    pub fn clear_row_selection(&mut self) -> bool {
        if !self.rows.clear() {
            return false;
        }
        self.emit_row_selection();
        true
    }

    /// Select the rows touched by the cell selection, replacing the row
    /// selection
    pub fn select_rows_from_cells(&mut self) -> bool {
        let displayed = self.displayed.len();
        let rows = self.cells.selected_rows();
        if !self.rows.replace(rows.into_iter().filter(|&row| row < displayed)) {
            return false;
        }
        self.emit_row_selection();
        true
    }

    fn emit_row_selection(&mut self) {
        let selected = self.rows.selected().collect();
        self.emit(GridEvent::RowSelectionChanged { selected });
    }

    pub fn toggle_row_expansion(&mut self, index: usize) -> bool {
        let expanded = if self.expanded.remove(&index) {
            false
        } else {
            self.expanded.insert(index);
            true
        };
        self.emit(GridEvent::RowExpansionToggled { index, expanded });
        expanded
    }

    // Columns

    pub fn set_column_width(&mut self, column_id: &str, width: f32) -> Option<f32> {
        let column = self.columns.iter().find(|c| c.id == column_id)?;
        let width = self.layout.set_width(column, width)?;
        self.emit(GridEvent::ColumnWidthChanged {
            column_id: column_id.to_string(),
            width,
        });
        Some(width)
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) -> Option<bool> {
        let visible = self.layout.toggle_visibility(column_id)?;
        self.recompute();
        self.emit(GridEvent::ColumnVisibilityChanged {
            column_id: column_id.to_string(),
            visible,
        });
        Some(visible)
    }

    pub fn show_all_columns(&mut self) -> bool {
        if !self.layout.show_all() {
            return false;
        }
        self.recompute();
        self.emit(GridEvent::LayoutRestored);
        true
    }

    /// Move a column within the full column order
    pub fn reorder_column(&mut self, from: usize, to: usize) -> bool {
        if !self.layout.reorder(from, to) {
            return false;
        }
        self.recompute();
        self.emit(GridEvent::ColumnMoved { from, to });
        true
    }

    pub fn layout_snapshot(&self) -> ColumnLayoutSnapshot {
        self.layout.snapshot()
    }

    pub fn restore_layout(&mut self, snapshot: &ColumnLayoutSnapshot) -> bool {
        let columns = Rc::clone(&self.columns);
        let changed = self.layout.restore(snapshot, &columns);
        self.recompute();
        self.emit(GridEvent::LayoutRestored);
        changed
    }

    // Editing

    pub fn set_editing_cell(&mut self, cell: Option<CellId>) {
        if self.editing == cell {
            return;
        }
        self.editing = cell.clone();
        self.emit(GridEvent::EditingCellChanged { cell });
    }

    /// Commit a value for the cell being edited and leave edit mode
    pub fn commit_edit(&mut self, value: Value) -> bool {
        let Some(cell) = self.editing.take() else {
            return false;
        };
        self.emit(GridEvent::EditingCellChanged { cell: None });
        self.edit_cell(cell.row, &cell.column_id, value)
    }

    /// Report an edit of a displayed cell to subscribers
    pub fn edit_cell(&mut self, row_index: usize, column_id: &str, value: Value) -> bool {
        if !self.columns.iter().any(|c| c.id == column_id) {
            return false;
        }
        let Some(record) = self.displayed_record(row_index).cloned() else {
            return false;
        };
        self.emit(GridEvent::CellEdited {
            record,
            row_index,
            column_id: column_id.to_string(),
            value,
        });
        true
    }

    // Viewport

    pub fn set_scroll_top(&mut self, scroll_top: f64) -> bool {
        if !self.window.set_scroll_top(scroll_top) {
            return false;
        }
        self.update_viewport();
        true
    }

    pub fn set_viewport_height(&mut self, height: f64) -> bool {
        if !self.window.set_viewport_height(height) {
            return false;
        }
        self.update_viewport();
        true
    }

    pub fn set_viewport(&mut self, scroll_top: f64, height: f64) -> bool {
        let scrolled = self.window.set_scroll_top(scroll_top);
        let resized = self.window.set_viewport_height(height);
        if !(scrolled || resized) {
            return false;
        }
        self.update_viewport();
        true
    }

    // Cells

    pub fn start_cell_selection(&mut self, anchor: CellId, additive: bool) -> bool {
        let columns = Rc::clone(&self.visible_columns);
        let changed = self.cells.start_selection(anchor, additive, &columns);
        self.emit_cell_selection(changed)
    }

    pub fn extend_cell_selection(&mut self, target: &CellId) -> bool {
        let columns = Rc::clone(&self.visible_columns);
        let changed = self.cells.extend_selection(target, &columns);
        self.emit_cell_selection(changed)
    }

    pub fn end_cell_selection(&mut self) {
        self.cells.end_selection();
    }

    pub fn clear_cell_selection(&mut self) -> bool {
        let changed = self.cells.clear_selection();
        self.emit_cell_selection(changed)
    }

    pub fn toggle_cell(&mut self, cell: CellId) -> Option<bool> {
        let columns = Rc::clone(&self.visible_columns);
        let selected = self.cells.toggle_cell(cell, &columns)?;
        self.emit_cell_selection(true);
        Some(selected)
    }

    pub fn select_all_cells(&mut self) -> bool {
        let columns = Rc::clone(&self.visible_columns);
        let changed = self.cells.select_all_cells(self.displayed.len(), &columns);
        self.emit_cell_selection(changed)
    }

    fn emit_cell_selection(&mut self, changed: bool) -> bool {
        if changed {
            let selected = self.cells.len();
            self.emit(GridEvent::CellSelectionChanged { selected });
        }
        changed
    }

    /// Merge the bounding box of the current cell selection
    pub fn merge_selected_cells(&mut self) -> Option<u64> {
        let columns = Rc::clone(&self.visible_columns);
        let cells = self.cells.selected_cells(&columns);
        let region_id = self.cells.merge_cells(&cells, &columns)?;
        self.emit(GridEvent::CellsMerged { region_id });
        Some(region_id)
    }

    pub fn unmerge(&mut self, region_id: u64) -> bool {
        if !self.cells.unmerge(region_id) {
            return false;
        }
        self.emit(GridEvent::CellsUnmerged { region_id });
        true
    }

    pub fn merge_info(&self, row: usize, column_id: &str) -> Option<MergeInfo> {
        self.cells.merge_info(row, column_id, &self.visible_columns)
    }

    pub fn is_cell_selected(&self, cell: &CellId) -> bool {
        self.cells.is_cell_selected(cell, &self.visible_columns)
    }

    pub fn selected_cells(&self) -> Vec<CellId> {
        self.cells.selected_cells(&self.visible_columns)
    }

    // Pipeline

    /// Run every stage whose inputs changed.
    ///
    /// Row selection is keyed by displayed index, so it is dropped whenever
    /// the displayed rows change.
    pub fn recompute(&mut self) {
        let previous = Rc::clone(&self.displayed);
        let inputs = FilterInputs {
            data: self.data_revision,
            columns: self.columns_revision,
            search: self.search.clone(),
            filters: self.filters.revision(),
        };
        let query = FilterQuery::compile(&self.search, &self.filters, &self.columns, &self.search_paths);
        let (filtered, refiltered) = self
            .filter_memo
            .get_or_update(inputs, || Rc::new(query.apply(&self.data, &self.accessor)));
        if refiltered {
            tracing::debug!(rows = self.data.len(), kept = filtered.len(), "filter stage");
        }
        self.filtered = filtered;

        let sort_keys: Vec<(String, SortDirection)> = self
            .sort
            .keys()
            .iter()
            .filter_map(|key| {
                self.columns
                    .iter()
                    .find(|c| c.id == key.column_id && c.sortable)
                    .map(|c| (c.accessor_path.clone(), key.direction))
            })
            .collect();
        let sort_inputs = (RcKey(Rc::clone(&self.filtered)), sort_keys.clone());
        let (sorted, resorted) = self.sort_memo.get_or_update(sort_inputs, || {
            if sort_keys.is_empty() {
                Rc::clone(&self.filtered)
            } else {
                Rc::new(crate::sort_indices(
                    &self.data,
                    &self.filtered,
                    &sort_keys,
                    &self.accessor,
                ))
            }
        });
        if resorted {
            tracing::debug!(keys = self.sort.len(), rows = sorted.len(), "sort stage");
        }
        self.sorted = sorted;
        self.pagination.clamp_to(self.sorted.len());

        if self.options.paginate {
            let range = self.pagination.page_range(self.sorted.len());
            let page_inputs = (RcKey(Rc::clone(&self.sorted)), range.start, range.end);
            let (page, _) = self
                .page_memo
                .get_or_update(page_inputs, || Rc::new(self.sorted[range.clone()].to_vec()));
            self.displayed = page;
        } else {
            self.page_memo.clear();
            self.displayed = Rc::clone(&self.sorted);
        }
        if !Rc::ptr_eq(&previous, &self.displayed) && self.rows.clear() {
            tracing::debug!("displayed rows changed, row selection cleared");
            self.row_selection_reset = true;
        }
        self.update_viewport();

        let column_inputs = (self.columns_revision, self.layout.revision());
        let (visible, _) = self
            .column_memo
            .get_or_update(column_inputs, || Rc::new(self.layout.resolve(&self.columns)));
        self.visible_columns = visible;
    }

    fn update_viewport(&mut self) {
        self.viewport = if self.is_virtualized() {
            self.window.compute(self.sorted.len())
        } else {
            ViewportWindow::full(self.displayed.len())
        };
    }

    // Getters

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn data(&self) -> &Rc<Vec<Record>> {
        &self.data
    }

    pub fn columns(&self) -> &Rc<Vec<ColumnDef>> {
        &self.columns
    }

    pub fn visible_columns(&self) -> &Rc<Vec<ColumnDef>> {
        &self.visible_columns
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Raw row indices passing the search and predicates, in data order
    pub fn filtered_indices(&self) -> &Rc<Vec<usize>> {
        &self.filtered
    }

    /// Filtered raw row indices in sort order
    pub fn sorted_indices(&self) -> &Rc<Vec<usize>> {
        &self.sorted
    }

    /// Raw row indices of the displayed rows: the current page when
    /// paginating, otherwise every sorted row
    pub fn displayed_indices(&self) -> &Rc<Vec<usize>> {
        &self.displayed
    }

    pub fn displayed_record(&self, display_index: usize) -> Option<&Record> {
        let source = *self.displayed.get(display_index)?;
        self.data.get(source)
    }

    pub fn displayed_records(&self) -> Vec<&Record> {
        self.displayed
            .iter()
            .filter_map(|&i| self.data.get(i))
            .collect()
    }

    /// Rows to materialize right now
    pub fn rendered_rows(&self) -> Vec<RenderedRow<'_>> {
        let range = self.viewport.rows.start.min(self.displayed.len())
            ..self.viewport.rows.end.min(self.displayed.len());
        range
            .filter_map(|display_index| {
                let source_index = self.displayed[display_index];
                Some(RenderedRow {
                    display_index,
                    source_index,
                    record: self.data.get(source_index)?,
                    offset: self.viewport.offset_of(display_index),
                })
            })
            .collect()
    }

    pub fn viewport(&self) -> &ViewportWindow {
        &self.viewport
    }

    pub fn is_paginated(&self) -> bool {
        self.options.paginate
    }

    pub fn is_virtualized(&self) -> bool {
        self.options
            .virtualization
            .is_active(self.options.paginate, self.sorted.len())
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page
    }

    pub fn page_count(&self) -> usize {
        self.pagination.total_pages(self.sorted.len())
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Text currently in the search box
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Search term the filter stage is using
    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn row_selection(&self) -> &RowSelection {
        &self.rows
    }

    pub fn cell_selection(&self) -> &CellSelection {
        &self.cells
    }

    pub fn is_row_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn editing_cell(&self) -> Option<&CellId> {
        self.editing.as_ref()
    }

    /// Value of a displayed cell
    pub fn cell_value(&self, display_index: usize, column_id: &str) -> Option<Value> {
        let column = self.columns.iter().find(|c| c.id == column_id)?;
        let source = *self.displayed.get(display_index)?;
        let record = self.data.get(source)?;
        self.accessor.get(source, record, &column.accessor_path)
    }

    /// Width override, falling back to the column's declared width
    pub fn column_width(&self, column_id: &str) -> Option<f32> {
        self.layout.width_override(column_id).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.id == column_id)
                .and_then(|c| c.width)
        })
    }

    pub fn accessor_stats(&self) -> AccessorStats {
        self.accessor.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterOperator, SortKey, VirtualizationMode};
    use atlas_core::record;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::time::Duration;

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name"),
            ColumnDef::new("status"),
            ColumnDef::new("budget"),
            ColumnDef::new("notes").sortable(false),
        ]
    }

    fn data() -> Vec<Record> {
        vec![
            record(json!({"name": "Globex", "status": "active", "budget": 300})),
            record(json!({"name": "Acme", "status": "lead", "budget": 100})),
            record(json!({"name": "Initech", "status": "active", "budget": 200})),
        ]
    }

    fn names(state: &GridState) -> Vec<String> {
        state
            .displayed_records()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_three_click_sort_cycle() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        let unsorted = Rc::clone(state.sorted_indices());

        state.set_sort("name", false);
        assert_eq!(state.sort().keys(), &[SortKey::ascending("name")]);
        assert_eq!(names(&state), vec!["Acme", "Globex", "Initech"]);

        state.set_sort("name", false);
        assert_eq!(state.sort().keys(), &[SortKey::descending("name")]);
        assert_eq!(names(&state), vec!["Initech", "Globex", "Acme"]);

        state.set_sort("name", false);
        assert!(state.sort().is_empty());
        assert_eq!(names(&state), vec!["Globex", "Acme", "Initech"]);
        assert_eq!(*state.sorted_indices(), unsorted);
    }

    #[test]
    fn test_unsortable_column_is_ignored() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        assert!(!state.set_sort("notes", false));
        assert!(!state.set_sort("missing", false));
        assert!(state.sort().is_empty());
    }

    #[test]
    fn test_unchanged_inputs_keep_identity() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        let filtered = Rc::clone(state.filtered_indices());
        let displayed = Rc::clone(state.displayed_indices());
        let visible = Rc::clone(state.visible_columns());

        state.set_sort("budget", false);
        assert!(Rc::ptr_eq(&filtered, state.filtered_indices()));
        assert!(Rc::ptr_eq(&visible, state.visible_columns()));
        assert!(!Rc::ptr_eq(&displayed, state.displayed_indices()));

        let displayed = Rc::clone(state.displayed_indices());
        state.set_column_width("name", 220.0);
        state.recompute();
        assert!(Rc::ptr_eq(&displayed, state.displayed_indices()));
        assert!(Rc::ptr_eq(&visible, state.visible_columns()));
        assert_eq!(state.column_width("name"), Some(220.0));
    }

    #[test]
    fn test_filter_resets_page_but_sort_does_not() {
        let rows: Vec<Record> = (0..60)
            .map(|i| record(json!({"name": format!("c{i:02}"), "status": "active", "budget": i})))
            .collect();
        let mut state = GridState::new(columns(), rows, GridOptions::default().page_size(10));
        state.set_page(4);
        state.set_sort("budget", false);
        assert_eq!(state.current_page(), 4);

        state.set_filter(FilterPredicate::new("status", FilterOperator::Equal, json!("active")));
        assert_eq!(state.current_page(), 1);

        state.set_page(3);
        state.set_page_size(20);
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn test_search_waits_for_debounce() {
        let mut state = GridState::new(
            columns(),
            data(),
            GridOptions::default().search_debounce(Duration::from_millis(350)),
        );
        let start = Instant::now();
        state.set_global_search_at("a", start);
        state.set_global_search_at("acm", start + Duration::from_millis(200));
        assert_eq!(state.search_input(), "acm");
        assert!(!state.tick(start + Duration::from_millis(500)));
        assert_eq!(state.displayed_indices().len(), 3);

        assert!(state.tick(start + Duration::from_millis(550)));
        assert_eq!(state.search_term(), "acm");
        assert_eq!(names(&state), vec!["Acme"]);
    }

    #[test]
    fn test_clear_filters_drops_search_and_predicates() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        state.set_global_search("glo");
        state.flush_search();
        state.set_filter(FilterPredicate::new("status", FilterOperator::Equal, json!("active")));
        assert_eq!(names(&state), vec!["Globex"]);

        state.set_global_search("pending");
        state.clear_filters();
        assert!(state.filters().is_empty());
        assert_eq!(state.search_term(), "");
        assert!(state.search_deadline().is_none());
        assert_eq!(state.displayed_indices().len(), 3);
    }

    #[test]
    fn test_select_all_uses_displayed_rows() {
        let rows: Vec<Record> = (0..30).map(|i| record(json!({"name": i}))).collect();
        let mut state = GridState::new(columns(), rows, GridOptions::default().page_size(25));
        state.set_page(2);
        assert!(state.select_all());
        assert_eq!(state.row_selection().len(), 5);
        assert!(!state.toggle_row_selection(7));
    }

    #[test]
    fn test_virtualization_when_not_paginated() {
        let rows: Vec<Record> = (0..500).map(|i| record(json!({"name": i}))).collect();
        let options = GridOptions::default()
            .paginated(false)
            .row_height(20.0)
            .overscan(2)
            .virtualization(VirtualizationMode::Auto { threshold: 100 });
        let mut state = GridState::new(columns(), rows, options);
        state.set_viewport(200.0, 100.0);

        assert!(state.is_virtualized());
        assert_eq!(state.displayed_indices().len(), 500);
        let rendered = state.rendered_rows();
        assert_eq!(rendered.first().map(|r| r.display_index), Some(8));
        assert_eq!(rendered.last().map(|r| r.display_index), Some(17));
        assert_eq!(rendered[0].offset, Some(160.0));
        assert_eq!(state.viewport().total_content_height, 10_000.0);
    }

    #[test]
    fn test_paginated_grid_never_windows() {
        let rows: Vec<Record> = (0..500).map(|i| record(json!({"name": i}))).collect();
        let options = GridOptions::default().virtualization(VirtualizationMode::On);
        let state = GridState::new(columns(), rows, options);
        assert!(!state.is_virtualized());
        assert_eq!(state.rendered_rows().len(), 25);
        assert_eq!(state.rendered_rows()[0].offset, None);
    }

    #[test]
    fn test_edit_is_reported_not_applied() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        state.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        state.set_editing_cell(Some(CellId::new(1, "status")));
        assert!(state.commit_edit(json!("active")));
        assert!(state.editing_cell().is_none());
        assert_eq!(state.cell_value(1, "status"), Some(json!("lead")));

        let events = events.borrow();
        assert!(events.iter().any(|e| matches!(
            e,
            GridEvent::CellEdited { row_index: 1, column_id, value, record }
                if column_id == "status" && value == &json!("active") && record["name"] == json!("Acme")
        )));
    }

    #[test]
    fn test_column_changes_reconcile_layout() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        state.toggle_column_visibility("status");
        let before = Rc::clone(state.visible_columns());

        state.set_columns(columns());
        let ids: Vec<&str> = state.visible_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "budget", "notes"]);
        assert!(Rc::ptr_eq(&before, state.visible_columns()));

        let mut changed = columns();
        changed.push(ColumnDef::new("owner"));
        state.set_columns(changed);
        let ids: Vec<&str> = state.visible_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "budget", "notes", "owner"]);
        assert!(!Rc::ptr_eq(&before, state.visible_columns()));
        state.set_columns(columns());

        state.reorder_column(0, 2);
        let ids: Vec<&str> = state.visible_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["budget", "name", "notes"]);
    }

    #[test]
    fn test_merge_selected_cells() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        state.start_cell_selection(CellId::new(0, "name"), false);
        state.extend_cell_selection(&CellId::new(1, "status"));
        state.end_cell_selection();
        let region = state.merge_selected_cells().unwrap();

        let info = state.merge_info(1, "status").unwrap();
        assert_eq!(info.region_id, region);
        assert!(!info.is_origin);
        assert_eq!(state.selected_cells(), vec![CellId::new(0, "name")]);
        assert!(state.unmerge(region));
        assert!(state.merge_info(1, "status").is_none());
    }

    #[test]
    fn test_shrinking_data_clamps_page() {
        let rows: Vec<Record> = (0..100).map(|i| record(json!({"name": i}))).collect();
        let mut state = GridState::new(columns(), rows, GridOptions::default());
        state.set_page(4);
        state.set_data(data());
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.displayed_indices().len(), 3);
    }

    #[test]
    fn test_identical_columns_keep_derived_views() {
        let mut state = GridState::new(columns(), data(), GridOptions::default());
        state.set_sort("budget", false);
        let filtered = Rc::clone(state.filtered_indices());
        let sorted = Rc::clone(state.sorted_indices());
        let visible = Rc::clone(state.visible_columns());

        state.set_columns(columns());

        assert!(Rc::ptr_eq(&filtered, state.filtered_indices()));
        assert!(Rc::ptr_eq(&sorted, state.sorted_indices()));
        assert!(Rc::ptr_eq(&visible, state.visible_columns()));
    }

    #[test]
    fn test_view_changes_clear_row_selection() {
        let rows: Vec<Record> = (0..30).map(|i| record(json!({"name": i}))).collect();
        let mut state = GridState::new(columns(), rows, GridOptions::default().page_size(25));
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        state.subscribe(move |event: &GridEvent| sink.borrow_mut().push(event.kind()));

        state.toggle_row_selection(0);
        state.set_page(2);
        assert!(state.row_selection().is_empty());

        state.toggle_row_selection(1);
        state.set_sort("name", false);
        assert!(state.row_selection().is_empty());

        state.toggle_row_selection(0);
        state.set_column_width("name", 300.0);
        state.set_viewport(0.0, 400.0);
        assert!(state.row_selection().is_selected(0));

        assert_eq!(
            *events.borrow(),
            vec![
                "row_selection_changed",
                "page_changed",
                "row_selection_changed",
                "row_selection_changed",
                "sort_changed",
                "row_selection_changed",
                "row_selection_changed",
                "column_width_changed",
            ]
        );
    }

    #[test]
    fn test_select_rows_from_cells() {
        let options = GridOptions::default().multi_select(true);
        let mut state = GridState::new(columns(), data(), options);
        state.start_cell_selection(CellId::new(0, "name"), false);
        state.extend_cell_selection(&CellId::new(1, "budget"));
        state.end_cell_selection();

        assert!(state.select_rows_from_cells());
        assert_eq!(state.row_selection().selected().collect::<Vec<_>>(), vec![0, 1]);
        assert!(!state.select_rows_from_cells());

        state.clear_cell_selection();
        state.toggle_cell(CellId::new(7, "name"));
        assert!(state.select_rows_from_cells());
        assert!(state.row_selection().is_empty());
    }

    #[test]
    fn test_search_timer_releases_pending_term() {
        let options = GridOptions::default().search_debounce(Duration::from_millis(5));
        let mut state = GridState::new(columns(), data(), options);
        assert!(state.search_timer().is_none());

        state.set_global_search("acme");
        let timer = state.search_timer().unwrap();
        smol::block_on(timer);

        assert!(state.tick(Instant::now()));
        assert_eq!(state.search_term(), "acme");
        assert_eq!(names(&state), vec!["Acme"]);
        assert!(state.search_timer().is_none());
    }
}
