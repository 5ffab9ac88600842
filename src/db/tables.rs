use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::NUMERIC_COLUMNS;
use crate::error::AppError;

/// Remote tables known to the dashboard
///
/// The set is closed: table names reach SQL only through [`Table::as_str`],
/// never from request input directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Key/value settings (meta_patrimonio, rendimento_mensal, ...)
    Config,
    /// Variable income and expense entries
    Historico,
    /// Investment positions
    Investimentos,
    /// Goals and projects
    SonhosProjetos,
    /// Recurring fixed income and expenses
    FluxoFixo,
    /// Spending categories with monthly budgets
    Categorias,
    /// Quick expense log
    ControleGastos,
    /// Monthly executive reports
    RelatoriosHistoricos,
    /// Users roster, keyed by `usuario` directly
    Usuarios,
}

impl Table {
    /// Per-user data tables, in load order. Excludes the users roster.
    pub const DATA: [Table; 8] = [
        Table::Config,
        Table::Historico,
        Table::Investimentos,
        Table::SonhosProjetos,
        Table::FluxoFixo,
        Table::Categorias,
        Table::ControleGastos,
        Table::RelatoriosHistoricos,
    ];

    /// Table name in the database
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Config => "config",
            Table::Historico => "historico",
            Table::Investimentos => "investimentos",
            Table::SonhosProjetos => "sonhos_projetos",
            Table::FluxoFixo => "fluxo_fixo",
            Table::Categorias => "categorias",
            Table::ControleGastos => "controle_gastos",
            Table::RelatoriosHistoricos => "relatorios_historicos",
            Table::Usuarios => "usuarios",
        }
    }

    /// Columns an empty table is presented with
    pub fn default_columns(self) -> &'static [&'static str] {
        match self {
            Table::FluxoFixo => &[
                "nome",
                "valor",
                "tipo",
                "categoria",
                "data_inicio",
                "data_fim",
                "recorrencia",
                "observacao",
            ],
            Table::Historico => &[
                "data",
                "tipo",
                "valor",
                "categoria",
                "subcategoria",
                "descricao",
                "responsavel",
                "fixo",
            ],
            Table::Investimentos => &[
                "instituicao",
                "ativo",
                "tipo",
                "valor_atual",
                "data_entrada",
                "rendimento_mensal",
                "categoria",
                "observacao",
            ],
            Table::SonhosProjetos => &[
                "nome",
                "descricao",
                "valor_alvo",
                "valor_atual",
                "data_alvo",
                "prioridade",
                "status",
                "categoria",
            ],
            Table::Categorias => &["nome", "tipo", "orcamento_mensal", "cor"],
            Table::Config => &["chave", "valor", "descricao"],
            Table::RelatoriosHistoricos => &[
                "mes",
                "patrimonio",
                "saldo_fixo",
                "saldo_variavel",
                "perc_meta",
                "texto_executivo",
                "status",
            ],
            Table::ControleGastos => &["data", "descricao", "valor"],
            Table::Usuarios => &["usuario", "senha", "nome", "perfil", "ativo"],
        }
    }
}

impl Table {
    /// Columns coerced to numbers on load
    ///
    /// `config` is a key/value table whose `valor` also holds text settings.
    pub fn numeric_columns(self) -> &'static [&'static str] {
        match self {
            Table::Config => &[],
            _ => &NUMERIC_COLUMNS,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Table::DATA
            .iter()
            .chain(std::iter::once(&Table::Usuarios))
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| AppError::UnknownTable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tables() {
        assert_eq!("historico".parse::<Table>().unwrap(), Table::Historico);
        assert_eq!(" Fluxo_Fixo ".parse::<Table>().unwrap(), Table::FluxoFixo);
        assert_eq!("usuarios".parse::<Table>().unwrap(), Table::Usuarios);
    }

    #[test]
    fn test_parse_unknown_table() {
        assert!(matches!(
            "pg_shadow".parse::<Table>(),
            Err(AppError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_data_tables_exclude_users() {
        assert_eq!(Table::DATA.len(), 8);
        assert!(!Table::DATA.contains(&Table::Usuarios));
    }

    #[test]
    fn test_serde_name_matches_table_name() {
        for table in Table::DATA {
            let json = serde_json::to_value(table).unwrap();
            assert_eq!(json, table.as_str());
        }
    }
}
