//! Row selection, cell selection and merged cell regions.
//!
//! Cells are addressed by displayed row index and column id. Rectangles are
//! computed against the current visible column order, so a merged region
//! follows its columns when they are reordered and is ignored while either
//! edge column is hidden.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ColumnDef;

/// Represents a cell position in the visible grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A rectangular region of cells, bounds inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRegion {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl CellRegion {
    /// Create a new cell region from two corner positions
    #[inline]
    pub fn new(anchor: CellPosition, end: CellPosition) -> Self {
        Self {
            start_row: anchor.row.min(end.row),
            end_row: anchor.row.max(end.row),
            start_col: anchor.col.min(end.col),
            end_col: anchor.col.max(end.col),
        }
    }

    #[inline]
    pub fn single(row: usize, col: usize) -> Self {
        Self::new(CellPosition::new(row, col), CellPosition::new(row, col))
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    #[inline]
    pub fn col_count(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.col_count()
    }

    pub fn intersects(&self, other: &CellRegion) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_col <= other.end_col
            && other.start_col <= self.end_col
    }

    /// Smallest region covering both
    pub fn union(&self, other: &CellRegion) -> CellRegion {
        CellRegion {
            start_row: self.start_row.min(other.start_row),
            end_row: self.end_row.max(other.end_row),
            start_col: self.start_col.min(other.start_col),
            end_col: self.end_col.max(other.end_col),
        }
    }

    /// Iterate over all cells in region (row-major order)
    pub fn iter(&self) -> impl Iterator<Item = CellPosition> + '_ {
        (self.start_row..=self.end_row).flat_map(move |row| {
            (self.start_col..=self.end_col).map(move |col| CellPosition { row, col })
        })
    }
}

/// Cell address, rendered as `"<row>-<column id>"`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    pub row: usize,
    pub column_id: String,
}

impl CellId {
    pub fn new(row: usize, column_id: impl Into<String>) -> Self {
        Self {
            row,
            column_id: column_id.into(),
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.column_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCellIdError(String);

impl fmt::Display for ParseCellIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cell id '{}'", self.0)
    }
}

impl std::error::Error for ParseCellIdError {}

impl FromStr for CellId {
    type Err = ParseCellIdError;

    /// Column ids may themselves contain `-`, so only the first one splits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, column_id) = s
            .split_once('-')
            .ok_or_else(|| ParseCellIdError(s.to_string()))?;
        let row = row
            .parse::<usize>()
            .map_err(|_| ParseCellIdError(s.to_string()))?;
        if column_id.is_empty() {
            return Err(ParseCellIdError(s.to_string()));
        }
        Ok(Self::new(row, column_id))
    }
}

fn column_position(columns: &[ColumnDef], id: &str) -> Option<usize> {
    columns.iter().position(|c| c.id == id)
}

fn position_of(columns: &[ColumnDef], cell: &CellId) -> Option<CellPosition> {
    column_position(columns, &cell.column_id).map(|col| CellPosition::new(cell.row, col))
}

/// A merged rectangle. Only its top-left cell renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRegion {
    pub id: u64,
    pub start_row: usize,
    pub end_row: usize,
    pub start_column_id: String,
    pub end_column_id: String,
}

impl MergedRegion {
    /// Bounds under the current visible column order
    pub fn bounds(&self, columns: &[ColumnDef]) -> Option<CellRegion> {
        let a = column_position(columns, &self.start_column_id)?;
        let b = column_position(columns, &self.end_column_id)?;
        Some(CellRegion::new(
            CellPosition::new(self.start_row, a),
            CellPosition::new(self.end_row, b),
        ))
    }
}

/// Answer to "is this cell part of a merge"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInfo {
    pub region_id: u64,
    pub is_origin: bool,
    pub row_span: usize,
    pub col_span: usize,
    pub origin: CellId,
}

/// Selected displayed rows
#[derive(Debug, Clone, Default)]
pub struct RowSelection {
    multi_select: bool,
    selected: BTreeSet<usize>,
}

impl RowSelection {
    pub fn new(multi_select: bool) -> Self {
        Self {
            multi_select,
            selected: BTreeSet::new(),
        }
    }

    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    /// Flip a row, returning whether it is now selected. In single-select
    /// mode selecting a row deselects every other row.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.selected.remove(&index) {
            return false;
        }
        if !self.multi_select {
            self.selected.clear();
        }
        self.selected.insert(index);
        true
    }

    /// Select all `count` displayed rows, or none if they already all are.
    /// Returns whether everything is now selected.
    pub fn select_all(&mut self, count: usize) -> bool {
        if self.all_selected(count) {
            self.selected.clear();
            return false;
        }
        self.selected = (0..count).collect();
        count > 0
    }

    pub fn all_selected(&self, count: usize) -> bool {
        count > 0 && (0..count).all(|i| self.selected.contains(&i))
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Replace the selection with `rows`; single-select keeps only the first.
    /// Returns whether the selection changed.
    pub fn replace(&mut self, rows: impl IntoIterator<Item = usize>) -> bool {
        let mut next: BTreeSet<usize> = rows.into_iter().collect();
        if !self.multi_select {
            next = next.into_iter().take(1).collect();
        }
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Cell selection with anchor/drag rectangles and merged regions
#[derive(Debug, Clone)]
pub struct CellSelection {
    selected: HashSet<CellId>,
    anchor: Option<CellId>,
    is_selecting: bool,
    /// Cells kept from before an additive drag started
    base: HashSet<CellId>,
    merges: Vec<MergedRegion>,
    next_region_id: u64,
}

impl Default for CellSelection {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
            anchor: None,
            is_selecting: false,
            base: HashSet::new(),
            merges: Vec::new(),
            next_region_id: 1,
        }
    }
}

impl CellSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor(&self) -> Option<&CellId> {
        self.anchor.as_ref()
    }

    pub fn is_selecting(&self) -> bool {
        self.is_selecting
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn regions(&self) -> &[MergedRegion] {
        &self.merges
    }

    /// Begin a drag at `anchor`. Without `additive` the previous selection is
    /// replaced.
    pub fn start_selection(&mut self, anchor: CellId, additive: bool, columns: &[ColumnDef]) -> bool {
        if column_position(columns, &anchor.column_id).is_none() {
            return false;
        }
        let anchor = self.canonical(anchor, columns);
        if additive {
            self.base = self.selected.clone();
        } else {
            self.base.clear();
            self.selected.clear();
        }
        self.selected.insert(anchor.clone());
        self.anchor = Some(anchor);
        self.is_selecting = true;
        true
    }

    /// Select the rectangle between the anchor and `target`. No-op unless a
    /// drag is in progress.
    pub fn extend_selection(&mut self, target: &CellId, columns: &[ColumnDef]) -> bool {
        if !self.is_selecting {
            return false;
        }
        let Some(anchor) = self.anchor.as_ref().and_then(|a| position_of(columns, a)) else {
            return false;
        };
        let Some(end) = position_of(columns, target) else {
            return false;
        };

        let region = CellRegion::new(anchor, end);
        let mut next = self.base.clone();
        for pos in region.iter() {
            let cell = CellId::new(pos.row, columns[pos.col].id.clone());
            next.insert(self.canonical(cell, columns));
        }
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    pub fn end_selection(&mut self) {
        self.is_selecting = false;
        self.base.clear();
    }

    /// Drop the selection and any drag in progress
    pub fn clear_selection(&mut self) -> bool {
        let changed = !self.selected.is_empty() || self.anchor.is_some() || self.is_selecting;
        self.selected.clear();
        self.base.clear();
        self.anchor = None;
        self.is_selecting = false;
        changed
    }

    /// Flip one cell (ctrl/cmd+click), returning whether it is now selected
    pub fn toggle_cell(&mut self, cell: CellId, columns: &[ColumnDef]) -> Option<bool> {
        column_position(columns, &cell.column_id)?;
        let cell = self.canonical(cell, columns);
        let selected = if self.selected.remove(&cell) {
            false
        } else {
            self.selected.insert(cell.clone());
            true
        };
        self.anchor = Some(cell);
        Some(selected)
    }

    pub fn select_all_cells(&mut self, row_count: usize, columns: &[ColumnDef]) -> bool {
        if row_count == 0 || columns.is_empty() {
            return self.clear_selection();
        }
        let mut next = HashSet::with_capacity(row_count * columns.len());
        for row in 0..row_count {
            for column in columns {
                next.insert(self.canonical(CellId::new(row, column.id.clone()), columns));
            }
        }
        self.anchor = Some(CellId::new(0, columns[0].id.clone()));
        self.is_selecting = false;
        self.base.clear();
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    pub fn is_cell_selected(&self, cell: &CellId, columns: &[ColumnDef]) -> bool {
        self.selected.contains(&self.canonical(cell.clone(), columns))
    }

    /// Selected cells whose column is visible, in row-major display order
    pub fn selected_cells(&self, columns: &[ColumnDef]) -> Vec<CellId> {
        let mut cells: Vec<(CellPosition, &CellId)> = self
            .selected
            .iter()
            .filter_map(|cell| position_of(columns, cell).map(|pos| (pos, cell)))
            .collect();
        cells.sort_by_key(|(pos, _)| (pos.row, pos.col));
        cells.into_iter().map(|(_, cell)| cell.clone()).collect()
    }

    /// Distinct rows touched by the selection, ascending
    pub fn selected_rows(&self) -> SmallVec<[usize; 8]> {
        let rows: BTreeSet<usize> = self.selected.iter().map(|c| c.row).collect();
        rows.into_iter().collect()
    }

    /// Merge the bounding box of `cells` into one region.
    ///
    /// Existing regions touched by the box are absorbed, growing the box until
    /// it covers them entirely. Returns `None` when the box is a single cell or
    /// no cell is addressable.
    pub fn merge_cells(&mut self, cells: &[CellId], columns: &[ColumnDef]) -> Option<u64> {
        let mut positions = cells.iter().filter_map(|c| position_of(columns, c));
        let first = positions.next()?;
        let mut bbox = positions.fold(CellRegion::single(first.row, first.col), |acc, pos| {
            acc.union(&CellRegion::single(pos.row, pos.col))
        });

        let mut absorbed: BTreeSet<u64> = BTreeSet::new();
        loop {
            let mut grown = false;
            for region in &self.merges {
                if absorbed.contains(&region.id) {
                    continue;
                }
                if let Some(bounds) = region.bounds(columns)
                    && bounds.intersects(&bbox)
                {
                    bbox = bbox.union(&bounds);
                    absorbed.insert(region.id);
                    grown = true;
                }
            }
            if !grown {
                break;
            }
        }

        if bbox.cell_count() < 2 {
            return None;
        }

        self.merges.retain(|r| !absorbed.contains(&r.id));
        let id = self.next_region_id;
        self.next_region_id += 1;
        self.merges.push(MergedRegion {
            id,
            start_row: bbox.start_row,
            end_row: bbox.end_row,
            start_column_id: columns[bbox.start_col].id.clone(),
            end_column_id: columns[bbox.end_col].id.clone(),
        });

        let origin = CellId::new(bbox.start_row, columns[bbox.start_col].id.clone());
        self.selected = self
            .selected
            .drain()
            .map(|cell| {
                match position_of(columns, &cell) {
                    Some(pos) if bbox.contains(pos.row, pos.col) => origin.clone(),
                    _ => cell,
                }
            })
            .collect();
        if let Some(anchor) = self.anchor.take() {
            self.anchor = Some(self.canonical(anchor, columns));
        }
        tracing::debug!(
            region = id,
            rows = bbox.row_count(),
            cols = bbox.col_count(),
            absorbed = absorbed.len(),
            "merged cells"
        );
        Some(id)
    }

    pub fn unmerge(&mut self, region_id: u64) -> bool {
        let before = self.merges.len();
        self.merges.retain(|r| r.id != region_id);
        self.merges.len() != before
    }

    /// Remove the region covering `cell`, returning its id
    pub fn unmerge_at(&mut self, cell: &CellId, columns: &[ColumnDef]) -> Option<u64> {
        let info = self.merge_info(cell.row, &cell.column_id, columns)?;
        self.unmerge(info.region_id);
        Some(info.region_id)
    }

    pub fn merge_info(&self, row: usize, column_id: &str, columns: &[ColumnDef]) -> Option<MergeInfo> {
        let col = column_position(columns, column_id)?;
        self.merges.iter().find_map(|region| {
            let bounds = region.bounds(columns)?;
            if !bounds.contains(row, col) {
                return None;
            }
            Some(MergeInfo {
                region_id: region.id,
                is_origin: row == bounds.start_row && col == bounds.start_col,
                row_span: bounds.row_count(),
                col_span: bounds.col_count(),
                origin: CellId::new(bounds.start_row, columns[bounds.start_col].id.clone()),
            })
        })
    }

    /// Forget every merge
    pub fn clear_merges(&mut self) -> bool {
        let changed = !self.merges.is_empty();
        self.merges.clear();
        changed
    }

    fn canonical(&self, cell: CellId, columns: &[ColumnDef]) -> CellId {
        match self.merge_info(cell.row, &cell.column_id, columns) {
            Some(info) if !info.is_origin => info.origin,
            _ => cell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<ColumnDef> {
        ["a", "x", "y", "z"].iter().map(|id| ColumnDef::new(*id)).collect()
    }

    fn cell(row: usize, col: &str) -> CellId {
        CellId::new(row, col)
    }

    #[test]
    fn test_cell_id_round_trips_through_text() {
        let id = cell(12, "due-date");
        assert_eq!(id.to_string(), "12-due-date");
        assert_eq!("12-due-date".parse::<CellId>(), Ok(id));
        assert!("abc".parse::<CellId>().is_err());
        assert!("3-".parse::<CellId>().is_err());
    }

    #[test]
    fn test_single_select_rows() {
        let mut rows = RowSelection::new(false);
        assert!(rows.toggle(1));
        assert!(rows.toggle(3));
        assert_eq!(rows.selected().collect::<Vec<_>>(), vec![3]);
        assert!(!rows.toggle(3));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_select_all_toggles_against_displayed_count() {
        let mut rows = RowSelection::new(true);
        rows.toggle(2);
        assert!(rows.select_all(25));
        assert_eq!(rows.len(), 25);
        assert!(!rows.select_all(25));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_drag_selects_rectangle() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.start_selection(cell(3, "y"), false, &cols);
        assert!(sel.extend_selection(&cell(1, "x"), &cols));
        sel.end_selection();

        assert_eq!(
            sel.selected_cells(&cols),
            vec![cell(1, "x"), cell(1, "y"), cell(2, "x"), cell(2, "y"), cell(3, "x"), cell(3, "y")]
        );
    }

    #[test]
    fn test_extend_without_anchor_is_noop() {
        let cols = columns();
        let mut sel = CellSelection::new();
        assert!(!sel.extend_selection(&cell(1, "x"), &cols));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_additive_drag_keeps_previous_cells() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.toggle_cell(cell(0, "a"), &cols);
        sel.start_selection(cell(2, "x"), true, &cols);
        sel.extend_selection(&cell(2, "z"), &cols);
        // shrinking the drag keeps the base selection
        sel.extend_selection(&cell(2, "y"), &cols);
        assert_eq!(
            sel.selected_cells(&cols),
            vec![cell(0, "a"), cell(2, "x"), cell(2, "y")]
        );
    }

    #[test]
    fn test_clear_selection_drops_drag_state() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.start_selection(cell(0, "a"), false, &cols);
        assert!(sel.clear_selection());
        assert!(!sel.is_selecting());
        assert!(!sel.extend_selection(&cell(2, "y"), &cols));
    }

    #[test]
    fn test_merge_reports_origin_and_spans() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.start_selection(cell(2, "x"), false, &cols);
        sel.extend_selection(&cell(4, "y"), &cols);
        sel.end_selection();
        let cells = sel.selected_cells(&cols);
        let id = sel.merge_cells(&cells, &cols).unwrap();

        for row in 2..=4 {
            for col in ["x", "y"] {
                let info = sel.merge_info(row, col, &cols).unwrap();
                assert_eq!(info.region_id, id);
                assert_eq!(info.is_origin, row == 2 && col == "x");
            }
        }
        let origin = sel.merge_info(2, "x", &cols).unwrap();
        assert_eq!((origin.row_span, origin.col_span), (3, 2));
        assert_eq!(sel.merge_info(5, "x", &cols), None);
        assert_eq!(sel.merge_info(2, "z", &cols), None);
    }

    #[test]
    fn test_non_origin_cells_address_the_origin() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.merge_cells(&[cell(0, "x"), cell(1, "y")], &cols).unwrap();
        sel.clear_selection();

        assert_eq!(sel.toggle_cell(cell(1, "y"), &cols), Some(true));
        assert_eq!(sel.selected_cells(&cols), vec![cell(0, "x")]);
        assert!(sel.is_cell_selected(&cell(0, "y"), &cols));
    }

    #[test]
    fn test_degenerate_merges_are_rejected() {
        let cols = columns();
        let mut sel = CellSelection::new();
        assert_eq!(sel.merge_cells(&[], &cols), None);
        assert_eq!(sel.merge_cells(&[cell(1, "a")], &cols), None);
        assert_eq!(sel.merge_cells(&[cell(1, "missing"), cell(2, "missing")], &cols), None);
        assert!(sel.regions().is_empty());
    }

    #[test]
    fn test_overlapping_merge_absorbs_existing_region() {
        let cols = columns();
        let mut sel = CellSelection::new();
        let first = sel.merge_cells(&[cell(0, "a"), cell(1, "x")], &cols).unwrap();
        let second = sel.merge_cells(&[cell(1, "x"), cell(3, "y")], &cols).unwrap();

        assert_ne!(first, second);
        assert_eq!(sel.regions().len(), 1);
        let info = sel.merge_info(0, "a", &cols).unwrap();
        assert!(info.is_origin);
        assert_eq!((info.row_span, info.col_span), (4, 3));
    }

    #[test]
    fn test_unmerge_restores_cells() {
        let cols = columns();
        let mut sel = CellSelection::new();
        let id = sel.merge_cells(&[cell(0, "x"), cell(0, "z")], &cols).unwrap();
        assert_eq!(sel.unmerge_at(&cell(0, "y"), &cols), Some(id));
        assert_eq!(sel.merge_info(0, "y", &cols), None);
        assert!(!sel.unmerge(id));
    }

    #[test]
    fn test_hidden_edge_column_suspends_region() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.merge_cells(&[cell(0, "x"), cell(1, "y")], &cols).unwrap();
        let without_x: Vec<ColumnDef> = cols.iter().filter(|c| c.id != "x").cloned().collect();
        assert_eq!(sel.merge_info(1, "y", &without_x), None);
        assert!(sel.merge_info(1, "y", &cols).is_some());
    }

    #[test]
    fn test_replace_respects_single_select() {
        let mut rows = RowSelection::new(false);
        assert!(rows.replace([4, 2, 7]));
        assert_eq!(rows.selected().collect::<Vec<_>>(), vec![2]);
        assert!(!rows.replace([2]));

        let mut rows = RowSelection::new(true);
        assert!(rows.replace([4, 2, 4]));
        assert_eq!(rows.selected().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_selected_rows_are_distinct_and_ascending() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.start_selection(cell(4, "x"), false, &cols);
        sel.extend_selection(&cell(2, "z"), &cols);
        sel.end_selection();
        sel.toggle_cell(cell(9, "a"), &cols);

        assert_eq!(sel.selected_rows().as_slice(), &[2, 3, 4, 9]);
    }

    #[test]
    fn test_clear_merges() {
        let cols = columns();
        let mut sel = CellSelection::new();
        sel.merge_cells(&[cell(0, "a"), cell(1, "x")], &cols).unwrap();
        sel.merge_cells(&[cell(4, "y"), cell(5, "z")], &cols).unwrap();

        assert!(sel.clear_merges());
        assert!(sel.regions().is_empty());
        assert_eq!(sel.merge_info(1, "x", &cols), None);
        assert!(!sel.clear_merges());
    }
}
