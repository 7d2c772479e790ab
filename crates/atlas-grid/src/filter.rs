//! Global search and per-column predicates
//!
//! Predicates are compiled once per (search, filter set, columns) tuple into a
//! [`FilterQuery`], which is then run over every row.

use std::cmp::Ordering;
use std::collections::HashMap;

use atlas_core::{Record, Value, ValueExt, coerce_number, compare_numbers};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ColumnDef, ValueAccessor};

/// Comparison operator of a [`FilterPredicate`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    /// Any operator name this engine does not know; always passes
    Unknown(String),
}

impl FilterOperator {
    pub fn parse(name: &str) -> Self {
        match name {
            "eq" => Self::Equal,
            "neq" => Self::NotEqual,
            "gt" => Self::GreaterThan,
            "gte" => Self::GreaterThanOrEqual,
            "lt" => Self::LessThan,
            "lte" => Self::LessThanOrEqual,
            "contains" => Self::Contains,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "neq",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::LessThan => "lt",
            Self::LessThanOrEqual => "lte",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Unknown(name) => name,
        }
    }

    /// Human readable label for filter chips
    pub fn label(&self) -> &str {
        match self {
            Self::Equal => "equals",
            Self::NotEqual => "does not equal",
            Self::GreaterThan => "greater than",
            Self::GreaterThanOrEqual => "at least",
            Self::LessThan => "less than",
            Self::LessThanOrEqual => "at most",
            Self::Contains => "contains",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
            Self::Unknown(name) => name,
        }
    }
}

impl From<String> for FilterOperator {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<FilterOperator> for String {
    fn from(op: FilterOperator) -> Self {
        op.as_str().to_string()
    }
}

/// A predicate on a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column_id: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterPredicate {
    pub fn new(column_id: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column_id: column_id.into(),
            operator,
            value,
        }
    }

    /// `null` and `""` mean "remove the filter on this column"
    pub fn is_clearing(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Active predicates, at most one per column
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    predicates: IndexMap<String, FilterPredicate>,
    revision: u64,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the predicate for its column. A clearing predicate
    /// removes the column's entry instead. Returns whether the set changed.
    pub fn set(&mut self, predicate: FilterPredicate) -> bool {
        if predicate.is_clearing() {
            return self.remove(&predicate.column_id);
        }
        if self.predicates.get(&predicate.column_id) == Some(&predicate) {
            return false;
        }
        self.predicates
            .insert(predicate.column_id.clone(), predicate);
        self.revision += 1;
        true
    }

    pub fn remove(&mut self, column_id: &str) -> bool {
        if self.predicates.shift_remove(column_id).is_some() {
            self.revision += 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) -> bool {
        if self.predicates.is_empty() {
            return false;
        }
        self.predicates.clear();
        self.revision += 1;
        true
    }

    pub fn get(&self, column_id: &str) -> Option<&FilterPredicate> {
        self.predicates.get(column_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterPredicate> {
        self.predicates.values()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Equal(Value),
    NotEqual(Value),
    Compare(Ordering, bool, f64),
    Contains(String),
    AnyOf(Vec<String>),
    StartsWith(String),
    EndsWith(String),
}

impl Matcher {
    fn compile(predicate: &FilterPredicate) -> Option<Self> {
        let needle = || predicate.value.display_string().to_lowercase();
        let target = || predicate.value.to_number();
        let matcher = match &predicate.operator {
            FilterOperator::Equal => Self::Equal(predicate.value.clone()),
            FilterOperator::NotEqual => Self::NotEqual(predicate.value.clone()),
            FilterOperator::GreaterThan => Self::Compare(Ordering::Greater, false, target()),
            FilterOperator::GreaterThanOrEqual => Self::Compare(Ordering::Greater, true, target()),
            FilterOperator::LessThan => Self::Compare(Ordering::Less, false, target()),
            FilterOperator::LessThanOrEqual => Self::Compare(Ordering::Less, true, target()),
            FilterOperator::Contains => {
                let needle = needle();
                if needle.contains('|') {
                    Self::AnyOf(
                        needle
                            .split('|')
                            .map(str::trim)
                            .filter(|alt| !alt.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                } else {
                    Self::Contains(needle)
                }
            }
            FilterOperator::StartsWith => Self::StartsWith(needle()),
            FilterOperator::EndsWith => Self::EndsWith(needle()),
            FilterOperator::Unknown(name) => {
                tracing::warn!(
                    operator = %name,
                    column = %predicate.column_id,
                    "unknown filter operator, predicate ignored"
                );
                return None;
            }
        };
        Some(matcher)
    }

    fn matches(&self, value: Option<&Value>) -> bool {
        let text = || {
            value
                .map(ValueExt::display_string)
                .unwrap_or_default()
                .to_lowercase()
        };
        match self {
            Self::Equal(expected) => value.is_some_and(|v| v.strict_eq(expected)),
            Self::NotEqual(expected) => !value.is_some_and(|v| v.strict_eq(expected)),
            Self::Compare(direction, inclusive, target) => {
                let actual = coerce_number(value);
                if actual.is_nan() || target.is_nan() {
                    return false;
                }
                let ord = compare_numbers(actual, *target);
                ord == *direction || (*inclusive && ord == Ordering::Equal)
            }
            Self::Contains(needle) => text().contains(needle.as_str()),
            Self::AnyOf(alternatives) => {
                let text = text();
                alternatives.iter().any(|alt| *alt == text)
            }
            Self::StartsWith(needle) => text().starts_with(needle.as_str()),
            Self::EndsWith(needle) => text().ends_with(needle.as_str()),
        }
    }
}

/// Compiled form of the global search term plus the active predicates
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    search: Option<String>,
    search_paths: Vec<String>,
    predicates: Vec<(String, Matcher)>,
}

impl FilterQuery {
    /// Compile a query against the current column set.
    ///
    /// Predicates whose column is unknown, or whose operator is unknown, pass
    /// every row.
    pub fn compile(
        search: &str,
        filters: &FilterSet,
        columns: &[ColumnDef],
        search_paths: &[String],
    ) -> Self {
        let by_id: HashMap<&str, &ColumnDef> =
            columns.iter().map(|c| (c.id.as_str(), c)).collect();

        let search = search.trim();
        let search = (!search.is_empty()).then(|| search.to_lowercase());

        let predicates = filters
            .iter()
            .filter_map(|predicate| {
                let Some(column) = by_id.get(predicate.column_id.as_str()) else {
                    tracing::debug!(column = %predicate.column_id, "filter on unknown column ignored");
                    return None;
                };
                Matcher::compile(predicate).map(|m| (column.accessor_path.clone(), m))
            })
            .collect();

        Self {
            search,
            search_paths: search_paths.to_vec(),
            predicates,
        }
    }

    /// Whether any row could be rejected
    pub fn is_active(&self) -> bool {
        self.search.is_some() || !self.predicates.is_empty()
    }

    pub fn matches(&self, key: usize, row: &Record, accessor: &ValueAccessor) -> bool {
        if let Some(term) = &self.search {
            let hit = self.search_paths.iter().any(|path| {
                accessor
                    .get(key, row, path)
                    .map(|v| v.display_string().to_lowercase().contains(term.as_str()))
                    .unwrap_or(false)
            });
            if !hit {
                return false;
            }
        }
        self.predicates
            .iter()
            .all(|(path, matcher)| matcher.matches(accessor.get(key, row, path).as_ref()))
    }

    /// Indices of the rows that pass, in input order
    pub fn apply(&self, rows: &[Record], accessor: &ValueAccessor) -> Vec<usize> {
        if !self.is_active() {
            return (0..rows.len()).collect();
        }
        rows.iter()
            .enumerate()
            .filter(|(key, row)| self.matches(*key, row, accessor))
            .map(|(key, _)| key)
            .collect()
    }
}
