use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::constants::ERR_USERS_TABLE_READ_ONLY;
use crate::db::Table;
use crate::error::{AppError, Result};
use crate::models::Frame;
use crate::routes::auth::AuthSession;
use crate::routes::validation::claim_rows;
use crate::sync::UserData;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SaveTableResponse {
    pub success: bool,
    pub table: Table,
    pub rows: usize,
}

/// Parse a data table name from the path; the users roster is not a data table
fn data_table(name: &str) -> Result<Table> {
    match name.parse::<Table>()? {
        Table::Usuarios => Err(AppError::InvalidInput(ERR_USERS_TABLE_READ_ONLY.to_string())),
        table => Ok(table),
    }
}

/// All data tables of the session user
///
/// GET /api/data
pub async fn load_all_data(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<UserData>> {
    let data = state.sync.load_all(&session.usuario).await?;
    Ok(Json(data))
}

/// One data table of the session user
///
/// GET /api/data/:table
pub async fn load_table_data(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(table): Path<String>,
) -> Result<Json<Frame>> {
    let table = data_table(&table)?;
    let frame = state.sync.load_table(table, &session.usuario).await?;
    Ok(Json(frame))
}

/// Replace one data table of the session user with the uploaded rows
///
/// PUT /api/data/:table
///
/// The replacement is a delete followed by an insert, not a transaction:
/// if the insert fails the user's rows for the table stay deleted and the
/// request answers 500.
pub async fn save_table_data(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(table): Path<String>,
    Json(mut frame): Json<Frame>,
) -> Result<Json<SaveTableResponse>> {
    let table = data_table(&table)?;
    claim_rows(&mut frame, &session.usuario)?;

    state.sync.save(table, &frame, &session.usuario).await?;

    Ok(Json(SaveTableResponse {
        success: true,
        table,
        rows: frame.len(),
    }))
}
