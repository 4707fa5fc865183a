//! Equality queries over a single collection.

use crate::Fields;
use serde_json::Value;
use std::cmp::Ordering;

/// `field == value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Query builder: conjunction of equality filters, optional ordering on one
/// field, optional limit.
///
/// ```
/// use doc_store::{Direction, Query};
///
/// let q = Query::collection("posts")
///     .where_eq("userHandle", "alice")
///     .order_by("createdAt", Direction::Descending)
///     .limit(10);
/// assert_eq!(q.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document body satisfies every filter.
    pub fn matches(&self, data: &Fields) -> bool {
        self.filters
            .iter()
            .all(|f| data.get(&f.field) == Some(&f.value))
    }

    /// JSON object used for `data @> $filter` containment in PostgreSQL.
    pub(crate) fn containment(&self) -> Value {
        let mut map = Fields::new();
        for f in &self.filters {
            map.insert(f.field.clone(), f.value.clone());
        }
        Value::Object(map)
    }

    /// Order two documents by the query's sort field. Documents missing the
    /// field sort first in ascending order.
    pub(crate) fn compare(&self, a: &Fields, b: &Fields) -> Ordering {
        let Some(order) = &self.order else {
            return Ordering::Equal;
        };
        let ord = compare_values(a.get(&order.field), b.get(&order.field));
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

// Mixed-type ordering: null < bool < number < string < array < object.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn matches_requires_every_filter() {
        let q = Query::collection("likes")
            .where_eq("postId", "p1")
            .where_eq("userHandle", "bob");

        assert!(q.matches(&fields(json!({"postId": "p1", "userHandle": "bob"}))));
        assert!(!q.matches(&fields(json!({"postId": "p1", "userHandle": "alice"}))));
        assert!(!q.matches(&fields(json!({"postId": "p1"}))));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Query::collection("posts").matches(&Fields::new()));
    }

    #[test]
    fn compare_orders_timestamps_descending() {
        let q = Query::collection("posts").order_by("createdAt", Direction::Descending);
        let older = fields(json!({"createdAt": "2024-01-01T00:00:00.000Z"}));
        let newer = fields(json!({"createdAt": "2024-06-01T00:00:00.000Z"}));
        assert_eq!(q.compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn containment_object_contains_filters() {
        let q = Query::collection("comments").where_eq("postId", "p1");
        assert_eq!(q.containment(), json!({"postId": "p1"}));
    }
}
