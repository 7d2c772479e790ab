//! Core types for Atlas
//!
//! Rows are caller-defined, so they are carried as JSON objects. The grid never
//! interprets a value beyond the rules in [`ValueExt`].

use std::cmp::Ordering;

pub use serde_json::{Map, Number, Value};

/// A single CRM record (client, project, task, meeting, ...)
pub type Record = Map<String, Value>;

/// Field conventionally used as the primary key of a record
pub const ID_FIELD: &str = "id";

/// Build a [`Record`] from a `serde_json::json!` object literal.
///
/// Non-object values produce an empty record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Value semantics shared by filtering, sorting and export
pub trait ValueExt {
    /// `null` (a missing value is represented by `None` at the call site)
    fn is_nullish(&self) -> bool;

    /// Text used for search, substring filters, lexicographic sort and export.
    ///
    /// Whole floats render without a fractional part (`3.0` -> `"3"`), and
    /// `null` renders as the empty string.
    fn display_string(&self) -> String;

    /// Numeric coercion following JavaScript `Number()`. Returns NaN when the
    /// value has no numeric reading.
    fn to_number(&self) -> f64;

    /// Strict equality: no cross-type coercion, numbers compare by value.
    fn strict_eq(&self, other: &Value) -> bool;
}

impl ValueExt for Value {
    fn is_nullish(&self) -> bool {
        self.is_null()
    }

    fn display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(n),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.to_string(),
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => parse_number(s),
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            Value::Object(_) => f64::NAN,
        }
    }

    fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            },
            (a, b) => a == b,
        }
    }
}

/// Numeric coercion for an optional value; a missing value is NaN.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    value.map(ValueExt::to_number).unwrap_or(f64::NAN)
}

/// Compare two numbers, treating incomparable pairs (NaN) as equal.
pub fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_string() {
        assert_eq!(json!("Acme").display_string(), "Acme");
        assert_eq!(json!(3.0).display_string(), "3");
        assert_eq!(json!(2.5).display_string(), "2.5");
        assert_eq!(json!(42).display_string(), "42");
        assert_eq!(json!(true).display_string(), "true");
        assert_eq!(Value::Null.display_string(), "");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(json!("  12.5 ").to_number(), 12.5);
        assert_eq!(json!("").to_number(), 0.0);
        assert_eq!(json!(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert!(json!("abc").to_number().is_nan());
        assert!(json!({"a": 1}).to_number().is_nan());
        assert!(coerce_number(None).is_nan());
    }

    #[test]
    fn test_strict_eq() {
        assert!(json!(1).strict_eq(&json!(1.0)));
        assert!(json!("active").strict_eq(&json!("active")));
        assert!(!json!("1").strict_eq(&json!(1)));
        assert!(!json!("Active").strict_eq(&json!("active")));
        assert!(Value::Null.strict_eq(&Value::Null));
    }

    #[test]
    fn test_record_from_json() {
        let rec = record(json!({"id": 7, "name": "Acme"}));
        assert_eq!(rec.get("name"), Some(&json!("Acme")));
        assert!(record(json!([1, 2])).is_empty());
    }
}
