//! Common test fixtures

#![allow(dead_code)]

use std::sync::Arc;

use atlas_core::{MemoryRecordStore, Record, record};
use atlas_grid::{ColumnDef, GridOptions, GridState};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Route service logs to the test harness; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn client_rows() -> Vec<Record> {
    vec![
        record(json!({"id": 1, "name": "Acme", "status": "lead", "owner": {"name": "Dana", "email": "dana@acme.io"}})),
        record(json!({"id": 2, "name": "Globex", "status": "active", "owner": {"name": "Lee", "email": "lee@globex.io"}})),
        record(json!({"id": 3, "name": "Initech", "status": "churned", "owner": null})),
    ]
}

pub fn client_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("name").header("Client"),
        ColumnDef::new("status"),
        ColumnDef::new("owner").accessor("owner.name").header("Owner"),
    ]
}

pub fn client_grid() -> GridState {
    GridState::new(client_columns(), client_rows(), GridOptions::default())
}

pub fn client_store() -> Arc<MemoryRecordStore> {
    Arc::new(MemoryRecordStore::new().with_table("clients", client_rows()))
}
