//! Record trait and query filters

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Current time as unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A typed document that lives in a named collection
pub trait Record: Serialize + DeserializeOwned {
    /// Document id (empty until the store assigns one)
    fn id(&self) -> &str;

    /// Last modification time (unix ms)
    fn updated_at(&self) -> i64;

    /// Collection the record is stored in
    fn collection_name() -> &'static str;
}

/// A scalar value a filter can compare a document field against
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl IndexValue {
    fn compare(&self, field: &Value) -> Option<std::cmp::Ordering> {
        match (self, field) {
            (IndexValue::String(want), Value::String(have)) => Some(have.as_str().cmp(want.as_str())),
            (IndexValue::Int(want), Value::Number(have)) => have.as_i64().map(|h| h.cmp(want)),
            (IndexValue::Bool(want), Value::Bool(have)) => Some(have.cmp(want)),
            _ => None,
        }
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::String(value.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        IndexValue::String(value)
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        IndexValue::Int(value)
    }
}

impl From<bool> for IndexValue {
    fn from(value: bool) -> Self {
        IndexValue::Bool(value)
    }
}

/// Comparison operator for a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Gt,
}

/// Field filter applied to top-level document fields
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: IndexValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<IndexValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<IndexValue>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Check whether a document satisfies this filter
    ///
    /// A missing field or a field of a different type only satisfies `Ne`.
    pub fn matches(&self, doc: &Value) -> bool {
        use std::cmp::Ordering;

        let ordering = doc.get(&self.field).and_then(|field| self.value.compare(field));
        match (self.op, ordering) {
            (FilterOp::Eq, Some(Ordering::Equal)) => true,
            (FilterOp::Ne, Some(Ordering::Equal)) => false,
            (FilterOp::Ne, _) => true,
            (FilterOp::Lt, Some(Ordering::Less)) => true,
            (FilterOp::Gt, Some(Ordering::Greater)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_eq_string() {
        let doc = json!({"project_id": "uncategorized"});
        assert!(Filter::eq("project_id", "uncategorized").matches(&doc));
        assert!(!Filter::eq("project_id", "other").matches(&doc));
    }

    #[test]
    fn test_filter_eq_bool() {
        let doc = json!({"completed": false});
        assert!(Filter::eq("completed", false).matches(&doc));
        assert!(!Filter::eq("completed", true).matches(&doc));
    }

    #[test]
    fn test_filter_missing_field() {
        let doc = json!({"title": "A"});
        assert!(!Filter::eq("priority", "High").matches(&doc));
        assert!(Filter::new("priority", FilterOp::Ne, "High").matches(&doc));
    }

    #[test]
    fn test_filter_ordering() {
        let doc = json!({"updated_at": 100});
        assert!(Filter::new("updated_at", FilterOp::Gt, 50i64).matches(&doc));
        assert!(Filter::new("updated_at", FilterOp::Lt, 150i64).matches(&doc));
        assert!(!Filter::new("updated_at", FilterOp::Lt, 100i64).matches(&doc));
    }

    #[test]
    fn test_filter_type_mismatch() {
        let doc = json!({"completed": "false"});
        assert!(!Filter::eq("completed", false).matches(&doc));
    }
}
