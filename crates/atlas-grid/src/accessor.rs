//! Dotted-path value lookup with a per-row memo.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use atlas_core::{Record, Value};

/// Resolve a dotted path (`"owner.address.city"`) against a record.
///
/// Object segments are looked up by key and array segments by numeric index.
/// Any missing or non-container intermediate resolves to `None`.
pub fn resolve_path<'a>(row: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Hit/miss counters of a [`ValueAccessor`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessorStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizing accessor.
///
/// Entries are keyed by the row's position in the current data set, so the
/// owner must call [`ValueAccessor::reset`] whenever the rows are replaced.
/// Rows are never patched in place, which keeps cached values exact.
#[derive(Debug, Default)]
pub struct ValueAccessor {
    cache: RefCell<HashMap<usize, HashMap<Rc<str>, Option<Value>>>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl ValueAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value at `path` for the row identified by `key`
    pub fn get(&self, key: usize, row: &Record, path: &str) -> Option<Value> {
        let mut cache = self.cache.borrow_mut();
        let paths = cache.entry(key).or_default();
        if let Some(value) = paths.get(path) {
            self.hits.set(self.hits.get() + 1);
            return value.clone();
        }

        self.misses.set(self.misses.get() + 1);
        let value = resolve_path(row, path).cloned();
        paths.insert(Rc::from(path), value.clone());
        value
    }

    /// Drop every cached entry
    pub fn reset(&self) {
        self.cache.borrow_mut().clear();
        self.hits.set(0);
        self.misses.set(0);
    }

    /// Number of rows with at least one cached path
    pub fn cached_rows(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn stats(&self) -> AccessorStats {
        AccessorStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
        }
    }
}
