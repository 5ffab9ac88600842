use serde_json::Value;

use crate::constants::REPORT_STATUS_FINAL;
use crate::db::{Row, Table};
use crate::error::{AppError, Result};
use crate::models::{Frame, MonthlyReport};
use crate::sync::TableSynchronizer;

/// Store `report` as `usuario`'s report for its month
///
/// A finalized report is never overwritten. A draft for the same month is
/// replaced. The whole `relatorios_historicos` table for the user is then
/// written back with [`TableSynchronizer::save`].
pub async fn save_monthly_report(
    sync: &TableSynchronizer,
    usuario: &str,
    report: &MonthlyReport,
) -> Result<Frame> {
    let history = sync.load_table(Table::RelatoriosHistoricos, usuario).await?;
    let previous = history.len();
    let history = merge_report(history, usuario, report)?;

    sync.save(Table::RelatoriosHistoricos, &history, usuario).await?;

    tracing::info!(
        usuario,
        mes = %report.mes,
        status = %report.status,
        previous,
        "Saved monthly report"
    );
    Ok(history)
}

/// Apply a report to the loaded history without touching the store
fn merge_report(mut history: Frame, usuario: &str, report: &MonthlyReport) -> Result<Frame> {
    history.ensure_column("mes", Value::String(String::new()));
    history.ensure_column("status", Value::String(String::new()));
    // ids are assigned by the database on reinsert
    history.drop_column("id");

    let is_month = |row: &Row| row.get("mes").and_then(Value::as_str) == Some(report.mes.as_str());

    let finalized = history.rows.iter().any(|row| {
        is_month(row) && row.get("status").and_then(Value::as_str) == Some(REPORT_STATUS_FINAL)
    });
    if finalized {
        return Err(AppError::ReportAlreadyFinalized);
    }

    history.retain(|row| !is_month(row));
    history.push(report.to_row(usuario));
    Ok(history)
}
