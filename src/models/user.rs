use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{PROFILE_ADMIN, PROFILE_USER, STATUS_ACTIVE, STATUS_INACTIVE};
use crate::db::{Row, Table};
use crate::models::Frame;

/// One entry of the users roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub usuario: String,
    /// bcrypt hash
    pub senha: String,
    pub nome: String,
    pub perfil: String,
    pub ativo: String,
}

/// Roster entry as returned to administrators (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub usuario: String,
    pub nome: String,
    pub perfil: String,
    pub ativo: String,
}

impl UserAccount {
    /// Read an account from an already normalized roster row
    pub fn from_row(row: &Row) -> Self {
        let text = |key: &str| cell_text(row.get(key));
        Self {
            usuario: text("usuario"),
            senha: text("senha"),
            nome: text("nome"),
            perfil: text("perfil"),
            ativo: text("ativo"),
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("usuario".into(), Value::String(self.usuario.clone()));
        row.insert("senha".into(), Value::String(self.senha.clone()));
        row.insert("nome".into(), Value::String(self.nome.clone()));
        row.insert("perfil".into(), Value::String(self.perfil.clone()));
        row.insert("ativo".into(), Value::String(self.ativo.clone()));
        row
    }

    pub fn is_active(&self) -> bool {
        self.ativo == STATUS_ACTIVE
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            usuario: self.usuario.clone(),
            nome: self.nome.clone(),
            perfil: self.perfil.clone(),
            ativo: self.ativo.clone(),
        }
    }

    /// Usernames are matched trimmed and lowercased
    pub fn normalize_username(usuario: &str) -> String {
        usuario.trim().to_lowercase()
    }

    pub fn validate_profile(perfil: &str) -> bool {
        perfil == PROFILE_USER || perfil == PROFILE_ADMIN
    }

    pub fn validate_status(ativo: &str) -> bool {
        ativo == STATUS_ACTIVE || ativo == STATUS_INACTIVE
    }
}

/// Text of a roster cell; null and missing read as empty
fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Clean up a roster read from the users table
///
/// Column names are trimmed and lowercased, the five roster columns always
/// exist, usernames/profiles/statuses are lowercased and a blank profile
/// becomes `user`.
pub fn normalize_roster(mut frame: Frame) -> Frame {
    frame.drop_empty_rows();
    frame.lowercase_columns();
    for column in Table::Usuarios.default_columns() {
        frame.ensure_column(column, Value::String(String::new()));
    }

    for row in &mut frame.rows {
        let mut account = UserAccount::from_row(row);
        account.usuario = UserAccount::normalize_username(&account.usuario);
        account.senha = account.senha.trim().to_string();
        account.nome = account.nome.trim().to_string();
        account.perfil = account.perfil.trim().to_lowercase();
        if account.perfil.is_empty() {
            account.perfil = PROFILE_USER.to_string();
        }
        account.ativo = account.ativo.trim().to_lowercase();

        // Keep any extra columns the table carries
        row.extend(account.to_row());
    }

    frame
}
