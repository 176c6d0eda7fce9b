//! Document store trait definitions

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::models::Document;

/// The fixed set of named collections an archive keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Lists,
    Topics,
    Messages,
    Processed,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Lists,
        Collection::Topics,
        Collection::Messages,
        Collection::Processed,
    ];

    /// Collection name (also the backing table name)
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Lists => "lists",
            Collection::Topics => "topics",
            Collection::Messages => "messages",
            Collection::Processed => "processed",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Equality filter over top-level document fields
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching documents whose `field` equals `value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Filter matching a single document by primary identifier
    pub fn by_id(id: &str) -> Self {
        Self::eq("_id", id)
    }

    /// Add another equality condition
    pub fn and_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether `doc` satisfies every condition
    ///
    /// A `null` condition matches documents where the field is null or absent.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field).unwrap_or(&Value::Null) == expected)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Compare two documents by the sort field
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(
            a.get(&self.field).unwrap_or(&Value::Null),
            b.get(&self.field).unwrap_or(&Value::Null),
        );
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

/// A find query: filter, optional sort, skip and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Cross-type ordering of JSON values
///
/// null < bool < number < string < array < object. Arrays and objects
/// compare equal among themselves; sorting on them is not meaningful.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Trait for document store operations
///
/// This is the seam to the document database: named collections of
/// schemaless records keyed by `_id`. Implementations must be safe to share
/// across threads; every call may block on I/O.
pub trait DocumentStore: Send + Sync {
    /// Find documents matching a query
    ///
    /// Results are sorted by `query.sort` when given, with ties (and unsorted
    /// results) in the store's natural order, which is stable between calls.
    fn find(&self, collection: Collection, query: &Query) -> Result<Vec<Document>>;

    /// Find the first document matching a filter
    fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let query = Query::new(filter.clone()).limit(1);
        Ok(self.find(collection, &query)?.into_iter().next())
    }

    /// Insert or replace the document with the given id
    ///
    /// The stored document becomes exactly `doc` (no merging). The `_id`
    /// field is set to `id`.
    fn upsert(&self, collection: Collection, id: &str, doc: Document) -> Result<()>;

    /// Count documents matching a filter
    fn count(&self, collection: Collection, filter: &Filter) -> Result<usize>;

    /// Release the underlying connection
    ///
    /// Calls made after `close` fail with a transport error.
    fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_filter_matches() {
        let d = doc(json!({ "_id": "t1", "source": "list-a", "end": 5 }));

        assert!(Filter::all().matches(&d));
        assert!(Filter::eq("source", "list-a").matches(&d));
        assert!(!Filter::eq("source", "list-b").matches(&d));
        assert!(Filter::by_id("t1").and_eq("end", 5).matches(&d));
        assert!(Filter::eq("missing", Value::Null).matches(&d));
    }

    #[test]
    fn test_sort_compare() {
        let a = doc(json!({ "end": 1 }));
        let b = doc(json!({ "end": 2 }));

        assert_eq!(Sort::ascending("end").compare(&a, &b), Ordering::Less);
        assert_eq!(Sort::descending("end").compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_compare_values_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!(9)), Ordering::Greater);
        assert_eq!(compare_values(&json!(1.5), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!(3)), Ordering::Greater);
    }
}
