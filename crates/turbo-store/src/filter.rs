//! Query filters, sorting and limits.

use crate::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// A single predicate on a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value.
    Eq(String, Value),
    /// Field is missing or differs from the value.
    Ne(String, Value),
    /// Field equals one of the values.
    In(String, Vec<Value>),
    /// Field is missing or equals none of the values.
    NotIn(String, Vec<Value>),
    /// Field is greater than or equal to the value.
    Gte(String, Value),
    /// Field is less than or equal to the value.
    Lte(String, Value),
    /// Field presence (a JSON `null` counts as absent).
    Exists(String, bool),
}

impl Condition {
    /// Check a document against this condition.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Eq(path, expected) => doc.field(path) == Some(expected),
            Condition::Ne(path, expected) => doc.field(path) != Some(expected),
            Condition::In(path, values) => doc
                .field(path)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Condition::NotIn(path, values) => doc
                .field(path)
                .map(|v| !values.contains(v))
                .unwrap_or(true),
            Condition::Gte(path, bound) => doc
                .field(path)
                .and_then(|v| compare_values(v, bound))
                .map(|ord| ord != Ordering::Less)
                .unwrap_or(false),
            Condition::Lte(path, bound) => doc
                .field(path)
                .and_then(|v| compare_values(v, bound))
                .map(|ord| ord != Ordering::Greater)
                .unwrap_or(false),
            Condition::Exists(path, wanted) => {
                let present = doc.field(path).map(|v| !v.is_null()).unwrap_or(false);
                present == *wanted
            }
        }
    }
}

/// A conjunction of conditions. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(path.into(), value.into()));
        self
    }

    pub fn ne(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Ne(path.into(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(
        mut self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In(
            path.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn not_in<V: Into<Value>>(
        mut self,
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::NotIn(
            path.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn gte(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte(path.into(), value.into()));
        self
    }

    pub fn lte(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte(path.into(), value.into()));
        self
    }

    pub fn exists(mut self, path: impl Into<String>, wanted: bool) -> Self {
        self.conditions.push(Condition::Exists(path.into(), wanted));
        self
    }

    /// Check a document against every condition.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// The conditions in this filter.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Sort on a single field. Documents missing the field sort last.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match (a.field(&self.field), b.field(&self.field)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
                match self.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// A filter with optional sort and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sort: None,
            limit: None,
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Compare two JSON values of the same kind.
///
/// Numbers compare numerically and strings lexically; any other pairing is
/// incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
