//! Backup and restore over a [`RecordStore`]

use std::sync::Arc;

use atlas_core::{Action, AtlasError, Capability, ID_FIELD, Record, RecordStore};
use atlas_settings::BackupSettings;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DecodeError, DecodedTable};

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Store error: {0}")]
    Store(#[from] AtlasError),

    #[error("Not allowed to {action} '{table}'")]
    Unauthorized { action: &'static str, table: String },

    #[error("Backup version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serialized snapshot of one or more tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub tables: IndexMap<String, Vec<Record>>,
}

impl BackupDocument {
    pub fn new(tables: IndexMap<String, Vec<Record>>) -> Self {
        Self {
            version: BACKUP_VERSION,
            created_at: Utc::now(),
            tables,
        }
    }

    /// Wrap decoded sheets; a flat table is restored into `default_table`
    pub fn from_decoded(table: DecodedTable, default_table: &str) -> Self {
        Self::new(table.into_sheets(default_table))
    }

    pub fn from_json(json: &str) -> Result<Self, BackupError> {
        let document: Self = serde_json::from_str(json)?;
        if document.version > BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: document.version,
                supported: BACKUP_VERSION,
            });
        }
        Ok(document)
    }

    pub fn to_json_pretty(&self) -> Result<String, BackupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRestoreReport {
    pub table: String,
    pub restored: usize,
    /// Rows dropped for lacking the conflict key
    pub skipped: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub tables: Vec<TableRestoreReport>,
}

impl RestoreReport {
    pub fn total_restored(&self) -> usize {
        self.tables.iter().map(|t| t.restored).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }
}

/// Progress of a running restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreProgress {
    pub table: String,
    pub rows_done: usize,
    pub rows_total: usize,
}

pub type RestoreProgressCallback = Box<dyn Fn(RestoreProgress) + Send + Sync>;

/// Moves whole tables between the store and [`BackupDocument`]s
pub struct BackupService<S: RecordStore + ?Sized> {
    store: Arc<S>,
    capability: Arc<dyn Capability>,
    batch_size: usize,
    tables: Vec<String>,
    progress: Option<RestoreProgressCallback>,
}

impl<S: RecordStore + ?Sized> BackupService<S> {
    pub fn new(store: Arc<S>, capability: Arc<dyn Capability>) -> Self {
        Self::from_settings(store, capability, &BackupSettings::default())
    }

    /// Service using the configured batch size and full-backup table list
    pub fn from_settings(
        store: Arc<S>,
        capability: Arc<dyn Capability>,
        settings: &BackupSettings,
    ) -> Self {
        Self {
            store,
            capability,
            batch_size: settings.batch_size.max(1),
            tables: settings.tables.clone(),
            progress: None,
        }
    }

    /// Rows per upsert call; zero is treated as one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress_callback(mut self, callback: RestoreProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Tables covered by [`Self::export_all`]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    fn authorize(&self, action: Action, table: &str) -> Result<(), BackupError> {
        if self.capability.allows(action, table) {
            return Ok(());
        }
        tracing::warn!(table, action = action.label(), "backup operation denied");
        Err(BackupError::Unauthorized {
            action: action.label(),
            table: table.to_string(),
        })
    }

    /// Snapshot `tables` in the given order
    pub async fn export(&self, tables: &[String]) -> Result<BackupDocument, BackupError> {
        for table in tables {
            self.authorize(Action::Read, table)?;
        }

        let mut snapshot = IndexMap::with_capacity(tables.len());
        for table in tables {
            let rows = self.store.select(table).await?;
            tracing::debug!(table = %table, rows = rows.len(), "table exported");
            snapshot.insert(table.clone(), rows);
        }

        let document = BackupDocument::new(snapshot);
        tracing::info!(
            tables = document.tables.len(),
            rows = document.row_count(),
            "backup created"
        );
        Ok(document)
    }

    /// Snapshot every configured table
    pub async fn export_all(&self) -> Result<BackupDocument, BackupError> {
        self.export(&self.tables).await
    }

    /// Upsert every table of `document`, matching existing rows on
    /// `conflict_key`. Authorization for every table is checked before the
    /// first write. A store failure aborts the restore; batches already
    /// written stay written.
    pub async fn restore(
        &self,
        document: &BackupDocument,
        conflict_key: &str,
    ) -> Result<RestoreReport, BackupError> {
        if document.version > BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion {
                found: document.version,
                supported: BACKUP_VERSION,
            });
        }
        for table in document.tables.keys() {
            self.authorize(Action::Restore, table)?;
        }

        let mut report = RestoreReport::default();
        for (table, rows) in &document.tables {
            let (keyed, skipped): (Vec<&Record>, Vec<&Record>) =
                rows.iter().partition(|row| row.contains_key(conflict_key));
            if !skipped.is_empty() {
                tracing::warn!(
                    table = %table,
                    skipped = skipped.len(),
                    conflict_key,
                    "rows without conflict key skipped"
                );
            }

            let mut table_report = TableRestoreReport {
                table: table.clone(),
                skipped: skipped.len(),
                ..Default::default()
            };
            for chunk in keyed.chunks(self.batch_size) {
                let batch: Vec<Record> = chunk.iter().map(|row| (*row).clone()).collect();
                self.store.upsert(table, batch, conflict_key).await.map_err(|e| {
                    tracing::error!(table = %table, error = %e, "restore batch failed");
                    e
                })?;
                table_report.restored += chunk.len();
                table_report.batches += 1;

                if let Some(callback) = &self.progress {
                    callback(RestoreProgress {
                        table: table.clone(),
                        rows_done: table_report.restored,
                        rows_total: keyed.len(),
                    });
                }
            }
            tracing::debug!(
                table = %table,
                restored = table_report.restored,
                batches = table_report.batches,
                "table restored"
            );
            report.tables.push(table_report);
        }

        tracing::info!(
            restored = report.total_restored(),
            skipped = report.total_skipped(),
            "restore complete"
        );
        Ok(report)
    }

    /// Restore decoded file contents keyed on the record id
    pub async fn import(
        &self,
        table: DecodedTable,
        default_table: &str,
    ) -> Result<RestoreReport, BackupError> {
        let document = BackupDocument::from_decoded(table, default_table);
        self.restore(&document, ID_FIELD).await
    }
}
