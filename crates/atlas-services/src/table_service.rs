//! Table operations service
//!
//! Loads table data into a grid and performs capability-gated writes.

use std::sync::Arc;

use atlas_core::{Action, Capability, ID_FIELD, Record, RecordStore, Value};
use atlas_grid::GridState;

use crate::error::{ServiceError, ServiceResult};

/// Service for table-level operations
///
/// Handles:
/// - Loading a table into a grid
/// - Inserting records
/// - Deleting the rows selected in a grid
pub struct TableService<S: RecordStore + ?Sized> {
    store: Arc<S>,
    capability: Arc<dyn Capability>,
}

impl<S: RecordStore + ?Sized> TableService<S> {
    pub fn new(store: Arc<S>, capability: Arc<dyn Capability>) -> Self {
        Self { store, capability }
    }

    fn authorize(&self, action: Action, table: &str) -> ServiceResult<()> {
        if self.capability.allows(action, table) {
            return Ok(());
        }
        tracing::warn!(table, action = action.label(), "operation denied");
        Err(ServiceError::Unauthorized {
            action: action.label(),
            table: table.to_string(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_records(&self, table: &str) -> ServiceResult<Vec<Record>> {
        self.authorize(Action::Read, table)?;
        let rows = self
            .store
            .select(table)
            .await
            .map_err(|e| ServiceError::LoadFailed(e.to_string()))?;
        tracing::debug!(rows = rows.len(), "table loaded");
        Ok(rows)
    }

    /// Replace the grid's rows with the table's current contents. The grid is
    /// untouched when the load fails.
    pub async fn load_into(&self, table: &str, grid: &mut GridState) -> ServiceResult<usize> {
        let rows = self.load_records(table).await?;
        let count = rows.len();
        grid.set_data(rows);
        Ok(count)
    }

    #[tracing::instrument(skip(self, record))]
    pub async fn insert_record(&self, table: &str, record: Record) -> ServiceResult<Record> {
        self.authorize(Action::Write, table)?;
        self.store
            .insert(table, record)
            .await
            .map_err(|e| ServiceError::TableOperationFailed(e.to_string()))
    }

    /// Delete records by id, stopping at the first failure.
    /// Returns the number deleted.
    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_records(&self, table: &str, ids: &[Value]) -> ServiceResult<usize> {
        self.authorize(Action::Delete, table)?;
        for (deleted, id) in ids.iter().enumerate() {
            if let Err(e) = self.store.delete(table, id).await {
                tracing::error!(%id, error = %e, deleted, "delete failed");
                return Err(ServiceError::TableOperationFailed(e.to_string()));
            }
        }
        Ok(ids.len())
    }

    /// Ids of the rows selected in `grid`, in display order
    pub fn selected_record_ids(&self, grid: &GridState) -> ServiceResult<Vec<Value>> {
        let mut indices: Vec<usize> = grid.row_selection().selected().collect();
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| grid.displayed_record(index))
            .map(|record| {
                record
                    .get(ID_FIELD)
                    .cloned()
                    .ok_or_else(|| ServiceError::MissingRecordId(ID_FIELD.to_string()))
            })
            .collect()
    }

    /// Delete the rows selected in `grid`, then reload it and clear the
    /// selection
    pub async fn delete_selected(&self, table: &str, grid: &mut GridState) -> ServiceResult<usize> {
        let ids = self.selected_record_ids(grid)?;
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.delete_records(table, &ids).await?;
        grid.clear_row_selection();
        self.load_into(table, grid).await?;
        Ok(deleted)
    }
}
