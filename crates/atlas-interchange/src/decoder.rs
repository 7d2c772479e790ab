//! Tabular file decoding
//!
//! Spreadsheet parsing lives outside Atlas. Hosts plug a [`TabularDecoder`] in
//! and hand the restore path a [`DecodedTable`]; JSON is handled here.

use atlas_core::{Record, Value};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("Row {index} of '{sheet}' is not an object")]
    InvalidRow { sheet: String, index: usize },
}

/// Decoded contents of a tabular file
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedTable {
    /// Named sheets, in file order
    Sheets(IndexMap<String, Vec<Record>>),
    /// A single unnamed sheet
    Flat(Vec<Record>),
}

impl DecodedTable {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Sheets(sheets) => sheets.values().map(Vec::len).sum(),
            Self::Flat(rows) => rows.len(),
        }
    }

    /// Sheets keyed by name; a flat table is named `default_name`
    pub fn into_sheets(self, default_name: &str) -> IndexMap<String, Vec<Record>> {
        match self {
            Self::Sheets(sheets) => sheets,
            Self::Flat(rows) => IndexMap::from([(default_name.to_string(), rows)]),
        }
    }
}

pub trait TabularDecoder: Send + Sync {
    /// Short name for logs, e.g. `"json"`
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedTable, DecodeError>;
}

/// Accepts a top-level array of objects, an object of arrays, or a backup
/// document with a `tables` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTableDecoder;

impl TabularDecoder for JsonTableDecoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedTable, DecodeError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let value: Value = serde_json::from_slice(bytes)?;

        match value {
            Value::Array(items) => Ok(DecodedTable::Flat(rows_from(items, "")?)),
            Value::Object(mut map) => {
                if let Some(Value::Object(_)) = map.get("tables")
                    && let Some(Value::Object(tables)) = map.remove("tables")
                {
                    map = tables;
                }
                let mut sheets = IndexMap::with_capacity(map.len());
                for (name, value) in map {
                    let Value::Array(items) = value else {
                        return Err(DecodeError::UnexpectedShape(format!(
                            "sheet '{}' is not an array",
                            name
                        )));
                    };
                    let rows = rows_from(items, &name)?;
                    sheets.insert(name, rows);
                }
                tracing::debug!(sheets = sheets.len(), "decoded json sheets");
                Ok(DecodedTable::Sheets(sheets))
            }
            other => Err(DecodeError::UnexpectedShape(format!(
                "expected an array or object, found {}",
                kind_of(&other)
            ))),
        }
    }
}

fn rows_from(items: Vec<Value>, sheet: &str) -> Result<Vec<Record>, DecodeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(DecodeError::InvalidRow {
                sheet: sheet.to_string(),
                index,
            }),
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
