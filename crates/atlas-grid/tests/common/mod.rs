//! Shared fixtures for grid integration tests

use atlas_core::{Record, record};
use atlas_grid::ColumnDef;
use serde_json::{Value, json};

const COMPANIES: [&str; 5] = ["Globex", "Initech", "Umbrella", "Hooli", "Stark"];
const STATUSES: [&str; 3] = ["active", "lead", "churned"];
const OWNERS: [&str; 4] = ["Dana", "Ravi", "Mei", "Tomas"];

pub fn client_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id").resizable(false),
        ColumnDef::new("name").header("Client"),
        ColumnDef::new("status"),
        ColumnDef::new("budget"),
        ColumnDef::new("owner").accessor("owner.name").header("Owner"),
        ColumnDef::new("email").accessor("owner.email").hidden(true),
    ]
}

pub fn client_name(i: usize) -> String {
    if i % 7 == 0 {
        format!("Acme {i}")
    } else if i % 11 == 0 {
        format!("ACME Subsidiary {i}")
    } else {
        format!("{} {i}", COMPANIES[i % 5])
    }
}

/// `count` deterministic client records with tied and missing budgets
pub fn clients(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let budget = if i % 13 == 0 {
                Value::Null
            } else {
                json!(((i * 37) % 50) * 1000)
            };
            let email = if i % 17 == 0 {
                "sales@acme.io".to_string()
            } else {
                format!("owner{}@example.com", i % 4)
            };
            record(json!({
                "id": i + 1,
                "name": client_name(i),
                "status": STATUSES[i % 3],
                "budget": budget,
                "owner": {"name": OWNERS[i % 4], "email": email},
            }))
        })
        .collect()
}

pub fn text(record: &Record, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
