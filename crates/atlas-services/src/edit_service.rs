//! Cell edit forwarding
//!
//! The grid only reports committed edits. [`EditForwarder`] turns those
//! reports into [`CellEdit`] patches on an unbounded channel so the grid never
//! awaits; [`EditPump`] drains the channel into the record store.

use std::collections::HashMap;
use std::sync::Arc;

use atlas_core::{Action, Capability, ID_FIELD, Record, RecordStore, Value};
use atlas_grid::{GridEvent, GridState, SubscriptionId};
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, unbounded};
use parking_lot::Mutex;
use uuid::Uuid;

pub type EditStream = UnboundedReceiver<CellEdit>;

/// A committed edit, resolved to a store patch
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    /// Correlates log lines for one edit
    pub id: Uuid,
    pub table: String,
    pub record_id: Value,
    pub column_id: String,
    pub value: Value,
    /// Top-level fields to merge into the stored record
    pub patch: Record,
}

/// Patch that sets `path` to `value` on `record`.
///
/// Store updates merge top-level fields only, so a nested path carries the
/// record's whole root value with the leaf replaced. Numeric segments index
/// into existing arrays the way cell reads do; an index past the end yields
/// `None` rather than growing the array.
pub fn build_patch(record: &Record, path: &str, value: Value) -> Option<Record> {
    let mut segments = path.split('.');
    let root = segments.next().filter(|s| !s.is_empty())?;
    let rest: Vec<&str> = segments.collect();
    if rest.iter().any(|s| s.is_empty()) {
        return None;
    }

    let mut patch = Record::new();
    if rest.is_empty() {
        patch.insert(root.to_string(), value);
        return Some(patch);
    }

    let mut root_value = record
        .get(root)
        .filter(|v| v.is_object() || v.is_array())
        .cloned()
        .unwrap_or_else(|| Value::Object(Record::new()));
    let mut cursor = &mut root_value;
    for (index, segment) in rest.iter().enumerate() {
        let last = index == rest.len() - 1;
        let current = cursor;
        if !current.is_object() && !current.is_array() {
            *current = Value::Object(Record::new());
        }
        cursor = match current {
            Value::Array(items) => {
                let slot = segment.parse::<usize>().ok().and_then(|i| items.get_mut(i))?;
                if last {
                    *slot = value;
                    break;
                }
                slot
            }
            Value::Object(map) => {
                if last {
                    map.insert((*segment).to_string(), value);
                    break;
                }
                map.entry((*segment).to_string())
                    .or_insert_with(|| Value::Object(Record::new()))
            }
            _ => return None,
        };
    }
    patch.insert(root.to_string(), root_value);
    Some(patch)
}

/// Subscription that forwards a grid's committed edits for one table
#[derive(Debug)]
pub struct EditForwarder {
    subscription: SubscriptionId,
    table: String,
}

impl EditForwarder {
    /// Subscribe to `grid`'s edits. Column accessor paths are captured now,
    /// so re-attach after replacing the column set.
    pub fn attach(grid: &mut GridState, table: impl Into<String>) -> (Self, EditStream) {
        let table = table.into();
        let (tx, rx) = unbounded();
        let paths: HashMap<String, String> = grid
            .columns()
            .iter()
            .map(|c| (c.id.clone(), c.accessor_path.clone()))
            .collect();

        let forward_table = table.clone();
        let subscription = grid.subscribe(move |event| {
            let GridEvent::CellEdited {
                record,
                column_id,
                value,
                ..
            } = event
            else {
                return;
            };

            let Some(record_id) = record.get(ID_FIELD).filter(|id| !id.is_null()) else {
                tracing::warn!(table = %forward_table, column_id = %column_id, "edited record has no id, dropped");
                return;
            };
            let path = paths.get(column_id).map(String::as_str).unwrap_or(column_id);
            let Some(patch) = build_patch(record, path, value.clone()) else {
                tracing::warn!(table = %forward_table, path, "edit path not writable, dropped");
                return;
            };

            let edit = CellEdit {
                id: Uuid::new_v4(),
                table: forward_table.clone(),
                record_id: record_id.clone(),
                column_id: column_id.clone(),
                value: value.clone(),
                patch,
            };
            tracing::debug!(edit = %edit.id, table = %edit.table, column_id = %edit.column_id, "edit forwarded");
            if tx.unbounded_send(edit).is_err() {
                tracing::debug!(table = %forward_table, "edit pump gone, edit dropped");
            }
        });

        (
            Self {
                subscription,
                table,
            },
            rx,
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Stop forwarding. The stream ends once drained.
    pub fn detach(self, grid: &mut GridState) -> bool {
        grid.unsubscribe(self.subscription)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied,
    Denied,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpStats {
    pub applied: usize,
    pub denied: usize,
    pub failed: usize,
}

impl PumpStats {
    pub fn total(&self) -> usize {
        self.applied + self.denied + self.failed
    }

    fn record(&mut self, outcome: &EditOutcome) {
        match outcome {
            EditOutcome::Applied => self.applied += 1,
            EditOutcome::Denied => self.denied += 1,
            EditOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Applies [`CellEdit`]s to the store. Failed edits are logged and counted;
/// nothing is retried or rolled back.
pub struct EditPump<S: RecordStore + ?Sized> {
    store: Arc<S>,
    capability: Arc<dyn Capability>,
    stats: Arc<Mutex<PumpStats>>,
}

impl<S: RecordStore + ?Sized> Clone for EditPump<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            capability: Arc::clone(&self.capability),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<S: RecordStore + ?Sized> EditPump<S> {
    pub fn new(store: Arc<S>, capability: Arc<dyn Capability>) -> Self {
        Self {
            store,
            capability,
            stats: Arc::new(Mutex::new(PumpStats::default())),
        }
    }

    /// Counters shared by every clone of this pump
    pub fn stats(&self) -> PumpStats {
        *self.stats.lock()
    }

    #[tracing::instrument(skip(self, edit), fields(edit = %edit.id, table = %edit.table))]
    pub async fn apply(&self, edit: CellEdit) -> EditOutcome {
        let outcome = if !self.capability.allows(Action::Write, &edit.table) {
            tracing::warn!(column_id = %edit.column_id, "edit denied");
            EditOutcome::Denied
        } else {
            match self
                .store
                .update(&edit.table, &edit.record_id, edit.patch)
                .await
            {
                Ok(()) => {
                    tracing::debug!(record_id = %edit.record_id, "edit applied");
                    EditOutcome::Applied
                }
                Err(e) => {
                    tracing::error!(record_id = %edit.record_id, error = %e, "edit failed");
                    EditOutcome::Failed(e.to_string())
                }
            }
        };
        self.stats.lock().record(&outcome);
        outcome
    }

    /// Apply edits in arrival order until the stream ends
    pub async fn run(&self, mut edits: EditStream) -> PumpStats {
        while let Some(edit) = edits.next().await {
            self.apply(edit).await;
        }
        let stats = self.stats();
        tracing::debug!(applied = stats.applied, denied = stats.denied, failed = stats.failed, "edit pump stopped");
        stats
    }
}

impl<S: RecordStore + ?Sized + 'static> EditPump<S> {
    /// Run on the tokio runtime
    pub fn spawn(&self, edits: EditStream) -> tokio::task::JoinHandle<PumpStats> {
        let pump = self.clone();
        tokio::spawn(async move { pump.run(edits).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::{AllowAll, MemoryRecordStore, record};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_top_level_patch() {
        let row = record(json!({"id": 1, "status": "lead"}));
        let patch = build_patch(&row, "status", json!("active")).unwrap();
        assert_eq!(patch, record(json!({"status": "active"})));
    }

    #[test]
    fn test_nested_patch_keeps_siblings() {
        let row = record(json!({"id": 1, "owner": {"name": "Dana", "email": "d@x.io"}}));
        let patch = build_patch(&row, "owner.name", json!("Lee")).unwrap();
        assert_eq!(patch, record(json!({"owner": {"name": "Lee", "email": "d@x.io"}})));
    }

    #[test]
    fn test_nested_patch_creates_missing_objects() {
        let row = record(json!({"id": 1, "address": "n/a"}));
        let patch = build_patch(&row, "address.geo.city", json!("Oslo")).unwrap();
        assert_eq!(patch, record(json!({"address": {"geo": {"city": "Oslo"}}})));
    }

    #[test]
    fn test_array_index_patch_keeps_other_items() {
        let row = record(json!({"id": 1, "tags": ["vip", "emea"]}));
        let patch = build_patch(&row, "tags.1", json!("apac")).unwrap();
        assert_eq!(patch, record(json!({"tags": ["vip", "apac"]})));

        let row = record(json!({"id": 1, "contacts": [{"name": "Dana", "phone": "1"}]}));
        let patch = build_patch(&row, "contacts.0.phone", json!("2")).unwrap();
        assert_eq!(patch, record(json!({"contacts": [{"name": "Dana", "phone": "2"}]})));
    }

    #[test]
    fn test_array_patch_rejects_bad_index() {
        let row = record(json!({"id": 1, "tags": ["vip", "emea"]}));
        assert_eq!(build_patch(&row, "tags.5", json!("apac")), None);
        assert_eq!(build_patch(&row, "tags.first", json!("apac")), None);
    }

    #[test]
    fn test_malformed_paths() {
        let row = Record::new();
        assert_eq!(build_patch(&row, "", json!(1)), None);
        assert_eq!(build_patch(&row, "a..b", json!(1)), None);
        assert_eq!(build_patch(&row, ".a", json!(1)), None);
    }

    #[test]
    fn test_apply_counts_outcomes() {
        let store = Arc::new(MemoryRecordStore::new().with_table("clients", vec![record(json!({"id": 1}))]));
        let pump = EditPump::new(store.clone(), Arc::new(AllowAll));
        let edit = CellEdit {
            id: Uuid::new_v4(),
            table: "clients".into(),
            record_id: json!(1),
            column_id: "status".into(),
            value: json!("active"),
            patch: record(json!({"status": "active"})),
        };

        let outcome = tokio_test::block_on(pump.apply(edit.clone()));
        assert_eq!(outcome, EditOutcome::Applied);

        let missing = CellEdit { record_id: json!(2), ..edit };
        let outcome = tokio_test::block_on(pump.apply(missing));
        assert!(matches!(outcome, EditOutcome::Failed(_)));
        assert_eq!(pump.stats(), PumpStats { applied: 1, denied: 0, failed: 1 });
        assert_eq!(store.records("clients")[0], record(json!({"id": 1, "status": "active"})));
    }
}
