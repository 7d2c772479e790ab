//! Stable multi-key sorting with null-last ordering

use std::cmp::Ordering;

use atlas_core::{Record, Value, ValueExt, compare_numbers};
use serde::{Deserialize, Serialize};

use crate::ValueAccessor;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Orient an ascending comparison result
    #[inline]
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// One entry of the active sort sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    pub fn ascending(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Ascending)
    }

    pub fn descending(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Descending)
    }
}

/// Ordered sort sequence; the first key has the highest precedence and no
/// column appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = SortKey>) -> Self {
        let mut spec = Self::new();
        for key in keys {
            spec.push(key);
        }
        spec
    }

    /// Header click cycle: absent -> asc -> desc -> absent.
    ///
    /// Non-additive clicks replace the whole sequence with the clicked column;
    /// additive clicks cycle that column in place and keep the others.
    pub fn toggle(&mut self, column_id: &str, additive: bool) {
        let next = match self.direction_of(column_id) {
            None => Some(SortDirection::Ascending),
            Some(SortDirection::Ascending) => Some(SortDirection::Descending),
            Some(SortDirection::Descending) => None,
        };

        if !additive {
            self.keys.clear();
            if let Some(direction) = next {
                self.keys.push(SortKey::new(column_id, direction));
            }
            return;
        }

        match (self.position_of(column_id), next) {
            (Some(index), Some(direction)) => self.keys[index].direction = direction,
            (Some(index), None) => {
                self.keys.remove(index);
            }
            (None, Some(direction)) => self.keys.push(SortKey::new(column_id, direction)),
            (None, None) => {}
        }
    }

    /// Append a key, replacing any existing key for the same column in place
    pub fn push(&mut self, key: SortKey) {
        match self.position_of(&key.column_id) {
            Some(index) => self.keys[index] = key,
            None => self.keys.push(key),
        }
    }

    pub fn remove(&mut self, column_id: &str) -> bool {
        match self.position_of(column_id) {
            Some(index) => {
                self.keys.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn direction_of(&self, column_id: &str) -> Option<SortDirection> {
        self.keys
            .iter()
            .find(|k| k.column_id == column_id)
            .map(|k| k.direction)
    }

    /// Zero-based precedence of a column, for header badges
    pub fn position_of(&self, column_id: &str) -> Option<usize> {
        self.keys.iter().position(|k| k.column_id == column_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Compare two cell values for one sort key.
///
/// Missing and `null` values sort after everything else in both directions.
/// Two numbers compare numerically, anything else by display text.
pub fn compare_sort_values(
    a: Option<&Value>,
    b: Option<&Value>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_nullish());
    let b = b.filter(|v| !v.is_nullish());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            if a.strict_eq(b) {
                return Ordering::Equal;
            }
            let ordering = match (a, b) {
                (Value::Number(x), Value::Number(y)) => compare_numbers(
                    x.as_f64().unwrap_or(f64::NAN),
                    y.as_f64().unwrap_or(f64::NAN),
                ),
                _ => a.display_string().cmp(&b.display_string()),
            };
            direction.apply(ordering)
        }
    }
}

/// Stable sort of `indices` (positions in `rows`) by the resolved
/// `(accessor path, direction)` keys.
///
/// Sort values are extracted once per row before sorting; ties on every key
/// keep the input order.
pub fn sort_indices(
    rows: &[Record],
    indices: &[usize],
    keys: &[(String, SortDirection)],
    accessor: &ValueAccessor,
) -> Vec<usize> {
    if keys.is_empty() {
        return indices.to_vec();
    }

    let mut decorated: Vec<(usize, usize, Vec<Option<Value>>)> = indices
        .iter()
        .enumerate()
        .filter_map(|(position, &index)| {
            let row = rows.get(index)?;
            let values = keys
                .iter()
                .map(|(path, _)| accessor.get(index, row, path))
                .collect();
            Some((position, index, values))
        })
        .collect();

    decorated.sort_by(|(pa, _, va), (pb, _, vb)| {
        keys.iter()
            .enumerate()
            .map(|(k, (_, direction))| compare_sort_values(va[k].as_ref(), vb[k].as_ref(), *direction))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| pa.cmp(pb))
    });

    decorated.into_iter().map(|(_, index, _)| index).collect()
}
