use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{Filter, Row, Table, TableStore};
use crate::error::{AppError, Result};

/// In-process [`TableStore`] with the same filter semantics as the
/// PostgreSQL store
///
/// Each call locks the whole store once, so single calls are atomic but
/// a delete followed by an insert is not. `with_delete_delay` stretches the
/// gap between them so readers can observe it.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    delete_delay: Option<Duration>,
    fail_inserts: AtomicBool,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` after every delete, before returning to the caller
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    /// Make every subsequent insert fail with [`AppError::Store`]
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of rows currently held for `table`, across all users
    pub fn row_count(&self, table: Table) -> usize {
        self.lock().map(|t| t.get(&table).map_or(0, Vec::len)).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Table, Vec<Row>>>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn select(&self, table: Table, filter: Option<&Filter>) -> Result<Vec<Row>> {
        let tables = self.lock()?;
        let rows = tables.get(&table).map(Vec::as_slice).unwrap_or_default();

        Ok(rows
            .iter()
            .filter(|row| filter.map_or(true, |f| f.matches(row)))
            .cloned()
            .collect())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64> {
        let removed = {
            let mut tables = self.lock()?;
            let rows = tables.entry(table).or_default();
            let before = rows.len();
            rows.retain(|row| !filter.matches(row));
            (before - rows.len()) as u64
        };

        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }

        Ok(removed)
    }

    async fn insert(&self, table: Table, rows: &[Row]) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Store(format!("insert into {} rejected", table)));
        }

        let mut tables = self.lock()?;
        tables.entry(table).or_default().extend(rows.iter().cloned());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}
