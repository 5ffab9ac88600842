//! Per-user table synchronization
//!
//! Every write replaces a user's whole row set for one table: delete the
//! rows matching `usuario = user`, then insert the supplied rows. The two
//! steps are separate store calls with no transaction around them, so a
//! concurrent reader can see the table empty in between, and a failed
//! insert leaves it empty until the caller saves again.

use std::collections::BTreeMap;

use crate::constants::{ERR_EMPTY_USER, USER_COLUMN};
use crate::db::{Filter, Store, Table};
use crate::error::{AppError, Result};
use crate::models::{normalize_roster, Frame};

/// Snapshot of every data table for one user
pub type UserData = BTreeMap<Table, Frame>;

#[derive(Clone)]
pub struct TableSynchronizer {
    store: Store,
}

impl TableSynchronizer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Load all eight data tables for `usuario`
    ///
    /// A user without rows gets an empty frame (with the table's default
    /// columns) for every table; that's indistinguishable from an unknown
    /// user.
    pub async fn load_all(&self, usuario: &str) -> Result<UserData> {
        if usuario.is_empty() {
            return Err(AppError::InvalidInput(ERR_EMPTY_USER.to_string()));
        }

        let mut data = UserData::new();
        for table in Table::DATA {
            let frame = self.load_table(table, usuario).await?;
            data.insert(table, frame);
        }

        tracing::debug!(usuario, tables = data.len(), "Loaded user data");
        Ok(data)
    }

    /// Load one table's rows for `usuario`
    pub async fn load_table(&self, table: Table, usuario: &str) -> Result<Frame> {
        let rows = self
            .store
            .select(table, Some(&Filter::eq(USER_COLUMN, usuario)))
            .await?;

        let frame = Frame::from_records(rows).normalize_with(table.numeric_columns());
        if frame.is_empty() {
            return Ok(Frame::with_columns(table.default_columns()));
        }
        Ok(frame)
    }

    /// Replace `usuario`'s rows in `table` with `data`
    ///
    /// Rows are inserted as given: nothing stamps or checks their
    /// `usuario` column.
    pub async fn save(&self, table: Table, data: &Frame, usuario: &str) -> Result<()> {
        let deleted = self
            .store
            .delete(table, &Filter::eq(USER_COLUMN, usuario))
            .await?;
        self.store.insert(table, &data.to_records()).await?;

        tracing::debug!(
            %table,
            usuario,
            deleted,
            inserted = data.len(),
            "Replaced user rows"
        );
        Ok(())
    }

    /// Load the full users roster, normalized
    pub async fn load_users(&self) -> Result<Frame> {
        let rows = self.store.select(Table::Usuarios, None).await?;
        Ok(normalize_roster(Frame::from_records(rows)))
    }

    /// Replace the whole users roster with `data`
    ///
    /// Unlike [`save`](Self::save) this is not scoped to one user: every row
    /// with a non-empty `usuario` is deleted first.
    pub async fn save_users(&self, data: &Frame) -> Result<()> {
        let deleted = self
            .store
            .delete(Table::Usuarios, &Filter::neq(USER_COLUMN, ""))
            .await?;
        self.store.insert(Table::Usuarios, &data.to_records()).await?;

        tracing::info!(deleted, inserted = data.len(), "Replaced users roster");
        Ok(())
    }
}
