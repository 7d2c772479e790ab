//! Shared fixtures for interchange tests

#![allow(dead_code)]

use std::sync::Arc;

use atlas_core::{MemoryRecordStore, Record, record};
use serde_json::json;

pub fn clients() -> Vec<Record> {
    (1..=7)
        .map(|i| {
            record(json!({
                "id": i,
                "name": format!("Client {i}"),
                "status": if i % 2 == 0 { "lead" } else { "active" },
            }))
        })
        .collect()
}

pub fn tasks() -> Vec<Record> {
    vec![
        record(json!({"id": "t1", "title": "Kickoff", "done": true})),
        record(json!({"id": "t2", "title": "Invoice", "done": false})),
    ]
}

pub fn seeded_store() -> Arc<MemoryRecordStore> {
    Arc::new(
        MemoryRecordStore::new()
            .with_table("clients", clients())
            .with_table("tasks", tasks()),
    )
}
