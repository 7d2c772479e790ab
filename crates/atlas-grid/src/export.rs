//! Snapshot of what the grid would export
//!
//! Exports cover every filtered and sorted row, not just the current page,
//! under the visible columns in display order.

use atlas_core::Value;

use crate::{ColumnDef, GridState, resolve_path};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportView {
    pub columns: Vec<ColumnDef>,
    /// One entry per column; `None` when the path did not resolve
    pub rows: Vec<Vec<Option<Value>>>,
}

impl ExportView {
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDef::title).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl GridState {
    pub fn export_view(&self) -> ExportView {
        let columns: Vec<ColumnDef> = self.visible_columns().as_ref().clone();
        let data = self.data();
        let rows = self
            .sorted_indices()
            .iter()
            .filter_map(|&index| data.get(index))
            .map(|record| {
                columns
                    .iter()
                    .map(|column| resolve_path(record, &column.accessor_path).cloned())
                    .collect()
            })
            .collect();
        ExportView { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridOptions;
    use atlas_core::record;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_export_ignores_pagination() {
        let columns = vec![
            ColumnDef::new("name").header("Client"),
            ColumnDef::new("budget"),
            ColumnDef::new("city").accessor("address.city"),
        ];
        let rows = (0..30)
            .map(|i| record(json!({"name": format!("c{i}"), "budget": 30 - i})))
            .collect();
        let mut state = GridState::new(columns, rows, GridOptions::default().page_size(10));
        state.set_sort("budget", false);
        state.toggle_column_visibility("budget");
        state.set_page(2);

        let view = state.export_view();
        assert_eq!(view.headers(), vec!["Client", "city"]);
        assert_eq!(view.rows.len(), 30);
        assert_eq!(view.rows[0], vec![Some(json!("c29")), None]);
    }
}
