use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};

use super::{Filter, Row, Table, TableStore};
use crate::error::Result;

/// [`TableStore`] over a hosted PostgreSQL database
///
/// Tables are addressed by name and carry arbitrary column sets, so rows
/// travel as JSONB: reads go through `to_jsonb(t)` and writes through
/// `jsonb_populate_recordset`, which casts every value to the column's
/// declared type on the server.
#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
}

impl PgTableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Quote a column name as a SQL identifier
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `WHERE` predicate for a filter, comparing as text against `$1`
fn predicate(filter: &Filter) -> String {
    let op = match filter {
        Filter::Eq { .. } => "=",
        Filter::Neq { .. } => "<>",
    };
    format!("{}::text {} $1", quote_ident(filter.column()), op)
}

/// Union of the keys of `rows`, in first-seen order
fn column_union(rows: &[Row]) -> Vec<&str> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    columns
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn select(&self, table: Table, filter: Option<&Filter>) -> Result<Vec<Row>> {
        let records: Vec<Json<Value>> = match filter {
            Some(filter) => {
                let sql = format!(
                    "SELECT to_jsonb(t) FROM {} t WHERE {}",
                    table.as_str(),
                    predicate(filter)
                );
                sqlx::query_scalar(&sql)
                    .bind(filter.value())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT to_jsonb(t) FROM {} t", table.as_str());
                sqlx::query_scalar(&sql).fetch_all(&self.pool).await?
            }
        };

        Ok(records
            .into_iter()
            .filter_map(|Json(value)| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {}", table.as_str(), predicate(filter));
        let result = sqlx::query(&sql)
            .bind(filter.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert(&self, table: Table, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        // Only name the columns actually supplied so the rest keep their
        // database defaults (ids, timestamps).
        let columns = column_union(rows)
            .into_iter()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_recordset(NULL::{table}, $1)",
            table = table.as_str(),
            columns = columns,
        );

        let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());
        sqlx::query(&sql)
            .bind(Json(payload))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
