use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{REPORT_STATUS_DRAFT, USER_COLUMN};
use crate::db::Row;

/// Figures captured by a monthly executive report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    /// Reference month, `YYYY-MM`
    pub mes: String,
    pub patrimonio: f64,
    pub saldo_fixo: f64,
    pub saldo_variavel: f64,
    pub perc_meta: f64,
    pub texto_executivo: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    REPORT_STATUS_DRAFT.to_string()
}

impl MonthlyReport {
    /// Row for `relatorios_historicos`, tagged with its owner
    pub fn to_row(&self, usuario: &str) -> Row {
        let value = json!({
            USER_COLUMN: usuario,
            "mes": self.mes,
            "patrimonio": self.patrimonio,
            "saldo_fixo": self.saldo_fixo,
            "saldo_variavel": self.saldo_variavel,
            "perc_meta": self.perc_meta,
            "texto_executivo": self.texto_executivo,
            "status": self.status,
        });
        match value {
            Value::Object(row) => row,
            _ => Row::new(),
        }
    }
}
