pub mod memory;
pub mod pool;
pub mod postgres;
pub mod tables;

pub use memory::MemoryTableStore;
pub use pool::create_pool;
pub use postgres::PgTableStore;
pub use tables::Table;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::Result;

/// One flat record: column name -> scalar value
pub type Row = Map<String, Value>;

/// Shared store handle (one per process, cloned into every handler)
pub type Store = Arc<dyn TableStore>;

/// Row filter on a single column
///
/// Values compare as text. A row whose column is missing or null matches
/// neither variant, the same way `NULL = x` and `NULL <> x` are not true
/// in SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    Neq { column: String, value: String },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn neq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Neq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::Neq { column, .. } => column,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Filter::Eq { value, .. } | Filter::Neq { value, .. } => value,
        }
    }

    /// Evaluate the filter against an in-memory row
    pub fn matches(&self, row: &Row) -> bool {
        let Some(text) = row.get(self.column()).and_then(value_as_text) else {
            return false;
        };
        match self {
            Filter::Eq { value, .. } => text == *value,
            Filter::Neq { value, .. } => text != *value,
        }
    }
}

/// Text form of a scalar, `None` for null and nested values
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Name-addressed remote table store
///
/// Every call is a single round trip; nothing here groups calls into a
/// transaction.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Read the rows of `table` matching `filter`, or every row when `None`
    async fn select(&self, table: Table, filter: Option<&Filter>) -> Result<Vec<Row>>;

    /// Delete the rows of `table` matching `filter`, returning how many went
    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64>;

    /// Append `rows` to `table`
    async fn insert(&self, table: Table, rows: &[Row]) -> Result<()>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_filter() {
        let filter = Filter::eq("usuario", "ana");
        assert!(filter.matches(&row(json!({ "usuario": "ana" }))));
        assert!(!filter.matches(&row(json!({ "usuario": "bia" }))));
    }

    #[test]
    fn test_neq_filter_skips_null_and_missing() {
        let filter = Filter::neq("usuario", "");
        assert!(filter.matches(&row(json!({ "usuario": "ana" }))));
        assert!(!filter.matches(&row(json!({ "usuario": "" }))));
        assert!(!filter.matches(&row(json!({ "usuario": null }))));
        assert!(!filter.matches(&row(json!({ "nome": "Ana" }))));
    }

    #[test]
    fn test_numbers_compare_as_text() {
        let filter = Filter::eq("ano", "2024");
        assert!(filter.matches(&row(json!({ "ano": 2024 }))));
    }
}
