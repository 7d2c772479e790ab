//! Column definitions and the column order/visibility store.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_COLUMN_WIDTH: f32 = 40.0;
pub const DEFAULT_MAX_COLUMN_WIDTH: f32 = 1200.0;

/// Horizontal alignment of a column's cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A column of the grid.
///
/// `id` must be unique within a column set and stable across updates. Several
/// columns may read the same `accessor_path` as long as their ids differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: String,
    pub accessor_path: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Hidden when the column first appears
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default = "default_min_width")]
    pub min_width: f32,
    #[serde(default = "default_max_width")]
    pub max_width: f32,
    #[serde(default)]
    pub align: Align,
}

fn default_true() -> bool {
    true
}

fn default_min_width() -> f32 {
    DEFAULT_MIN_COLUMN_WIDTH
}

fn default_max_width() -> f32 {
    DEFAULT_MAX_COLUMN_WIDTH
}

impl ColumnDef {
    /// A sortable, filterable, resizable column reading the field named `id`
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            accessor_path: id.clone(),
            id,
            header: None,
            sortable: true,
            filterable: true,
            resizable: true,
            hidden: false,
            width: None,
            min_width: DEFAULT_MIN_COLUMN_WIDTH,
            max_width: DEFAULT_MAX_COLUMN_WIDTH,
            align: Align::Left,
        }
    }

    pub fn accessor(mut self, path: impl Into<String>) -> Self {
        self.accessor_path = path.into();
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn width_range(mut self, min: f32, max: f32) -> Self {
        self.min_width = min;
        self.max_width = max.max(min);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Header text, falling back to the id
    pub fn title(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }
}

/// Accessor paths searched by the global search box, one per distinct path
pub fn searchable_paths(columns: &[ColumnDef]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .filter(|c| c.filterable)
        .filter(|c| seen.insert(c.accessor_path.as_str()))
        .map(|c| c.accessor_path.clone())
        .collect()
}

/// Persistable form of a [`ColumnLayout`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayoutSnapshot {
    pub order: Vec<String>,
    pub hidden: Vec<String>,
    pub widths: BTreeMap<String, f32>,
}

/// Authoritative column order, hidden set and width overrides.
///
/// `revision` only moves when order or visibility change; width changes are
/// tracked separately so that the resolved visible column list keeps its
/// identity while a column is being resized.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    order: Vec<String>,
    hidden: BTreeSet<String>,
    widths: HashMap<String, f32>,
    revision: u64,
}

impl ColumnLayout {
    pub fn new(columns: &[ColumnDef]) -> Self {
        let mut layout = Self::default();
        layout.reconcile(columns);
        layout.revision = 0;
        layout
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.order.iter().any(|c| c == id) && !self.hidden.contains(id)
    }

    pub fn width_override(&self, id: &str) -> Option<f32> {
        self.widths.get(id).copied()
    }

    /// Reconcile with the caller's current column set.
    ///
    /// Surviving ids keep their relative order, new ids are appended in caller
    /// order, hidden flags of removed ids are dropped and new default-hidden
    /// columns start hidden. Returns `false`, leaving the revision untouched,
    /// when nothing changed.
    pub fn reconcile(&mut self, columns: &[ColumnDef]) -> bool {
        let present: HashSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        let known: HashSet<&str> = self.order.iter().map(String::as_str).collect();

        let mut order: Vec<String> = self
            .order
            .iter()
            .filter(|id| present.contains(id.as_str()))
            .cloned()
            .collect();
        let mut hidden: BTreeSet<String> = self
            .hidden
            .iter()
            .filter(|id| present.contains(id.as_str()))
            .cloned()
            .collect();

        for column in columns {
            if known.contains(column.id.as_str()) || order.contains(&column.id) {
                continue;
            }
            order.push(column.id.clone());
            if column.hidden {
                hidden.insert(column.id.clone());
            }
        }

        self.widths.retain(|id, _| present.contains(id.as_str()));

        if order == self.order && hidden == self.hidden {
            return false;
        }

        self.order = order;
        self.hidden = hidden;
        self.revision += 1;
        true
    }

    /// Flip a column's visibility, returning whether it is now visible
    pub fn toggle_visibility(&mut self, id: &str) -> Option<bool> {
        if !self.order.iter().any(|c| c == id) {
            return None;
        }
        let visible = if self.hidden.remove(id) {
            true
        } else {
            self.hidden.insert(id.to_string());
            false
        };
        self.revision += 1;
        Some(visible)
    }

    pub fn show_all(&mut self) -> bool {
        if self.hidden.is_empty() {
            return false;
        }
        self.hidden.clear();
        self.revision += 1;
        true
    }

    pub fn hide_all(&mut self) -> bool {
        if self.hidden.len() == self.order.len() {
            return false;
        }
        self.hidden = self.order.iter().cloned().collect();
        self.revision += 1;
        true
    }

    /// Move the column at `from` to `to` within the full order
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.order.len() || to >= self.order.len() {
            return false;
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
        self.revision += 1;
        true
    }

    /// Set a width override, clamped to the column's bounds.
    ///
    /// Returns the applied width, or `None` when the column is unknown, not
    /// resizable, or already at that width.
    pub fn set_width(&mut self, column: &ColumnDef, width: f32) -> Option<f32> {
        if !column.resizable || !self.order.contains(&column.id) || !width.is_finite() {
            return None;
        }
        let width = width.clamp(column.min_width, column.max_width);
        if self.widths.get(&column.id) == Some(&width) {
            return None;
        }
        self.widths.insert(column.id.clone(), width);
        Some(width)
    }

    /// Visible columns in display order
    pub fn resolve(&self, columns: &[ColumnDef]) -> Vec<ColumnDef> {
        let by_id: HashMap<&str, &ColumnDef> =
            columns.iter().map(|c| (c.id.as_str(), c)).collect();
        self.order
            .iter()
            .filter(|id| !self.hidden.contains(id.as_str()))
            .filter_map(|id| by_id.get(id.as_str()).map(|c| (*c).clone()))
            .collect()
    }

    pub fn snapshot(&self) -> ColumnLayoutSnapshot {
        ColumnLayoutSnapshot {
            order: self.order.clone(),
            hidden: self.hidden.iter().cloned().collect(),
            widths: self
                .widths
                .iter()
                .map(|(id, w)| (id.clone(), *w))
                .collect(),
        }
    }

    /// Apply a persisted layout, then reconcile it with `columns` so that
    /// columns unknown to the snapshot are appended and stale ids dropped.
    pub fn restore(&mut self, snapshot: &ColumnLayoutSnapshot, columns: &[ColumnDef]) -> bool {
        let previous_order = std::mem::take(&mut self.order);
        let previous_hidden = std::mem::take(&mut self.hidden);

        let mut seen = HashSet::new();
        self.order = snapshot
            .order
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        self.hidden = snapshot.hidden.iter().cloned().collect();
        self.widths = snapshot
            .widths
            .iter()
            .map(|(id, w)| (id.clone(), *w))
            .collect();
        self.reconcile(columns);

        let changed = self.order != previous_order || self.hidden != previous_hidden;
        if changed {
            self.revision += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(ids: &[&str]) -> Vec<ColumnDef> {
        ids.iter().map(|id| ColumnDef::new(*id)).collect()
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_same_column_set_is_a_no_op() {
        let mut layout = ColumnLayout::new(&cols(&["a", "b", "c"]));
        layout.toggle_visibility("b");
        let revision = layout.revision();

        assert!(!layout.reconcile(&cols(&["a", "b", "c"])));
        assert_eq!(layout.revision(), revision);
        assert_eq!(layout.order(), ids(&["a", "b", "c"]).as_slice());
        assert!(layout.hidden().contains("b"));
    }

    #[test]
    fn test_hide_all_then_show_one() {
        let mut layout = ColumnLayout::new(&cols(&["a", "b", "c"]));
        let revision = layout.revision();

        assert!(layout.hide_all());
        assert_eq!(layout.revision(), revision + 1);
        assert_eq!(layout.hidden().len(), 3);
        assert!(!layout.hide_all());
        assert_eq!(layout.revision(), revision + 1);

        layout.toggle_visibility("b");
        assert!(!layout.hidden().contains("b"));
        assert!(layout.hide_all());
    }

    #[test]
    fn test_reconcile_prunes_and_appends() {
        let mut layout = ColumnLayout::new(&cols(&["a", "b", "c"]));
        layout.toggle_visibility("b");

        assert!(layout.reconcile(&cols(&["a", "c", "d"])));
        assert_eq!(layout.order(), ids(&["a", "c", "d"]).as_slice());
        assert!(layout.hidden().is_empty());
    }

    #[test]
    fn test_reconcile_keeps_user_order() {
        let mut layout = ColumnLayout::new(&cols(&["a", "b", "c"]));
        layout.reorder(2, 0);
        assert_eq!(layout.order(), ids(&["c", "a", "b"]).as_slice());

        let mut next = cols(&["b", "c", "a"]);
        next.push(ColumnDef::new("notes").hidden(true));
        next.push(ColumnDef::new("e"));
        assert!(layout.reconcile(&next));

        assert_eq!(layout.order(), ids(&["c", "a", "b", "notes", "e"]).as_slice());
        assert!(layout.hidden().contains("notes"));
    }

    #[test]
    fn test_default_hidden_columns_start_hidden() {
        let columns = vec![ColumnDef::new("a"), ColumnDef::new("internal").hidden(true)];
        let layout = ColumnLayout::new(&columns);
        let visible: Vec<String> = layout.resolve(&columns).into_iter().map(|c| c.id).collect();
        assert_eq!(visible, ids(&["a"]));
    }

    #[test]
    fn test_reorder_out_of_range_is_ignored() {
        let mut layout = ColumnLayout::new(&cols(&["a", "b"]));
        assert!(!layout.reorder(0, 5));
        assert!(!layout.reorder(1, 1));
        assert!(layout.reorder(0, 1));
        assert_eq!(layout.order(), ids(&["b", "a"]).as_slice());
    }

    #[test]
    fn test_set_width_clamps_and_respects_resizable() {
        let columns = vec![
            ColumnDef::new("name").width_range(80.0, 300.0),
            ColumnDef::new("id").resizable(false),
        ];
        let mut layout = ColumnLayout::new(&columns);
        let revision = layout.revision();

        assert_eq!(layout.set_width(&columns[0], 20.0), Some(80.0));
        assert_eq!(layout.set_width(&columns[0], 80.0), None);
        assert_eq!(layout.set_width(&columns[1], 120.0), None);
        assert_eq!(layout.width_override("name"), Some(80.0));
        assert_eq!(layout.revision(), revision);
    }

    #[test]
    fn test_snapshot_restore() {
        let columns = cols(&["a", "b", "c"]);
        let mut layout = ColumnLayout::new(&columns);
        layout.reorder(0, 2);
        layout.toggle_visibility("c");
        layout.set_width(&columns[1], 150.0);
        let snapshot = layout.snapshot();

        let updated = cols(&["a", "b", "c", "d"]);
        let mut restored = ColumnLayout::new(&updated);
        assert!(restored.restore(&snapshot, &updated));
        assert_eq!(restored.order(), ids(&["b", "c", "a", "d"]).as_slice());
        assert!(restored.hidden().contains("c"));
        assert_eq!(restored.width_override("b"), Some(150.0));
    }

    #[test]
    fn test_searchable_paths_skip_unfilterable_and_duplicates() {
        let columns = vec![
            ColumnDef::new("name"),
            ColumnDef::new("name_upper").accessor("name"),
            ColumnDef::new("budget").filterable(false),
            ColumnDef::new("city").accessor("address.city"),
        ];
        assert_eq!(searchable_paths(&columns), ids(&["name", "address.city"]));
    }
}
