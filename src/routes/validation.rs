use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::constants::{ERR_FOREIGN_ROW, USER_COLUMN};
use crate::error::AppError;
use crate::models::Frame;

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Make every row of an uploaded frame belong to `usuario`
///
/// Rows without a `usuario` cell are stamped with the session user; rows
/// naming anyone else are rejected.
pub fn claim_rows(frame: &mut Frame, usuario: &str) -> Result<(), AppError> {
    for row in &frame.rows {
        match row.get(USER_COLUMN) {
            None | Some(Value::Null) => {}
            Some(Value::String(owner)) if owner == usuario => {}
            Some(_) => {
                tracing::warn!(usuario, "Rejected upload containing rows of another user");
                return Err(AppError::InvalidInput(ERR_FOREIGN_ROW.to_string()));
            }
        }
    }

    frame.drop_column(USER_COLUMN);
    frame.ensure_column(USER_COLUMN, Value::String(usuario.to_string()));
    Ok(())
}
