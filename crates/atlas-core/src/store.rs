//! Record store abstraction over the hosted backend

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{AtlasError, ID_FIELD, Record, Result, Value, ValueExt};

/// CRUD + bulk upsert contract of the hosted backend.
///
/// The grid engine never calls this directly; services wire grid events to it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load every record of a table
    async fn select(&self, table: &str) -> Result<Vec<Record>>;

    /// Insert a record, returning it as stored (with any generated id)
    async fn insert(&self, table: &str, record: Record) -> Result<Record>;

    /// Apply a partial update to the record whose id equals `id`
    async fn update(&self, table: &str, id: &Value, patch: Record) -> Result<()>;

    /// Delete the record whose id equals `id`
    async fn delete(&self, table: &str, id: &Value) -> Result<()>;

    /// Insert or merge records, matching existing rows on `conflict_key`
    async fn upsert(&self, table: &str, records: Vec<Record>, conflict_key: &str) -> Result<()>;
}

/// A store operation, recorded by [`MemoryRecordStore`] for assertions
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    Select { table: String },
    Insert { table: String },
    Update { table: String, id: Value },
    Delete { table: String, id: Value },
    Upsert { table: String, count: usize },
}

/// In-process [`RecordStore`] backed by a map of tables.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<BTreeMap<String, Vec<Record>>>,
    should_fail: AtomicBool,
    log: Mutex<Vec<StoreOperation>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with records
    pub fn with_table(self, table: impl Into<String>, records: Vec<Record>) -> Self {
        self.tables.write().insert(table.into(), records);
        self
    }

    /// Make every subsequent operation fail with a store error
    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a table's records
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Names of all tables currently held
    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    /// Log of all operations executed, in order
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.log.lock().clone()
    }

    fn begin(&self, op: StoreOperation) -> Result<()> {
        self.log.lock().push(op);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(AtlasError::Store("backend unavailable".to_string()));
        }
        Ok(())
    }
}

fn matches_key(record: &Record, key: &str, value: &Value) -> bool {
    record.get(key).map(|v| v.strict_eq(value)).unwrap_or(false)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn select(&self, table: &str) -> Result<Vec<Record>> {
        self.begin(StoreOperation::Select {
            table: table.to_string(),
        })?;
        Ok(self.records(table))
    }

    async fn insert(&self, table: &str, mut record: Record) -> Result<Record> {
        self.begin(StoreOperation::Insert {
            table: table.to_string(),
        })?;
        let id = record
            .entry(ID_FIELD.to_string())
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()))
            .clone();

        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|r| matches_key(r, ID_FIELD, &id)) {
            return Err(AtlasError::InvalidRecord(format!(
                "duplicate id {} in {}",
                id, table
            )));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, id: &Value, patch: Record) -> Result<()> {
        self.begin(StoreOperation::Update {
            table: table.to_string(),
            id: id.clone(),
        })?;
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| matches_key(r, ID_FIELD, id)))
            .ok_or_else(|| AtlasError::NotFound(format!("{} {}", table, id)))?;
        row.extend(patch);
        Ok(())
    }

    async fn delete(&self, table: &str, id: &Value) -> Result<()> {
        self.begin(StoreOperation::Delete {
            table: table.to_string(),
            id: id.clone(),
        })?;
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| AtlasError::NotFound(table.to_string()))?;
        let before = rows.len();
        rows.retain(|r| !matches_key(r, ID_FIELD, id));
        if rows.len() == before {
            return Err(AtlasError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, records: Vec<Record>, conflict_key: &str) -> Result<()> {
        self.begin(StoreOperation::Upsert {
            table: table.to_string(),
            count: records.len(),
        })?;
        if let Some(bad) = records.iter().position(|r| !r.contains_key(conflict_key)) {
            return Err(AtlasError::InvalidRecord(format!(
                "record {} has no '{}' field",
                bad, conflict_key
            )));
        }

        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_string()).or_default();
        for record in records {
            let key = record.get(conflict_key).cloned().unwrap_or(Value::Null);
            match rows.iter_mut().find(|r| matches_key(r, conflict_key, &key)) {
                Some(existing) => existing.extend(record),
                None => rows.push(record),
            }
        }
        tracing::trace!(table, rows = rows.len(), "upsert applied");
        Ok(())
    }
}
