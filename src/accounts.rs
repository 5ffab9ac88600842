//! Users roster management on top of [`TableSynchronizer`]
//!
//! The roster is always read whole and written back whole with
//! `save_users`, so two administrators editing at once will lose one
//! another's changes.

use std::collections::HashSet;

use crate::constants::{
    ERR_ROSTER_BLANK_USER, ERR_USER_AND_PASSWORD_REQUIRED, PROFILE_USER, STATUS_ACTIVE,
};
use crate::error::{AppError, Result};
use crate::models::{normalize_roster, Frame, UserAccount};
use crate::security::{hash_password, is_password_hash, verify_password};
use crate::sync::TableSynchronizer;

/// New account request
#[derive(Debug, Clone)]
pub struct NewUser {
    pub usuario: String,
    pub nome: String,
    pub senha: String,
    pub perfil: String,
}

/// Partial update of an account; `None` fields are left as they are
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub perfil: Option<String>,
    pub ativo: Option<String>,
    /// New plaintext password, hashed before it is stored
    pub senha: Option<String>,
}

/// Every account in the roster
pub async fn list_users(sync: &TableSynchronizer) -> Result<Vec<UserAccount>> {
    let roster = sync.load_users().await?;
    Ok(roster.rows.iter().map(UserAccount::from_row).collect())
}

async fn save_roster(sync: &TableSynchronizer, accounts: &[UserAccount]) -> Result<()> {
    let frame = Frame::from_records(accounts.iter().map(UserAccount::to_row).collect());
    sync.save_users(&frame).await
}

/// Replace the whole roster with an uploaded one
///
/// The roster is normalized, then every row must have a unique non-blank
/// username, a bcrypt hash in `senha` and a known profile and status.
/// Nothing is written unless all rows pass.
pub async fn replace_roster(sync: &TableSynchronizer, roster: Frame) -> Result<Frame> {
    let roster = normalize_roster(roster);

    let mut seen = HashSet::new();
    for account in roster.rows.iter().map(UserAccount::from_row) {
        if account.usuario.is_empty() {
            return Err(AppError::InvalidInput(ERR_ROSTER_BLANK_USER.to_string()));
        }
        if !seen.insert(account.usuario.clone()) {
            return Err(AppError::InvalidInput(format!(
                "Duplicate username in roster: {}",
                account.usuario
            )));
        }
        if !is_password_hash(&account.senha) {
            return Err(AppError::InvalidInput(format!(
                "Password of {} is not a bcrypt hash",
                account.usuario
            )));
        }
        if !UserAccount::validate_profile(&account.perfil) {
            return Err(AppError::InvalidInput(format!("Invalid profile: {}", account.perfil)));
        }
        if !UserAccount::validate_status(&account.ativo) {
            return Err(AppError::InvalidInput(format!("Invalid status: {}", account.ativo)));
        }
    }

    sync.save_users(&roster).await?;
    Ok(roster)
}

/// Check a username/password pair and return the account
pub async fn authenticate(sync: &TableSynchronizer, usuario: &str, senha: &str) -> Result<UserAccount> {
    let usuario = UserAccount::normalize_username(usuario);
    let senha = senha.trim().to_string();

    let account = list_users(sync)
        .await?
        .into_iter()
        .find(|a| a.usuario == usuario)
        .ok_or(AppError::InvalidCredentials)?;

    // bcrypt is CPU-bound; keep it off the async workers
    let hash = account.senha.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&senha, &hash)).await?;
    if !valid {
        tracing::info!(usuario = %account.usuario, "Rejected login: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    if !account.is_active() {
        tracing::info!(usuario = %account.usuario, "Rejected login: inactive account");
        return Err(AppError::UserInactive);
    }

    Ok(account)
}

/// Add an account to the roster with a freshly hashed password
pub async fn create_user(sync: &TableSynchronizer, new_user: NewUser, cost: u32) -> Result<UserAccount> {
    let usuario = UserAccount::normalize_username(&new_user.usuario);
    let senha = new_user.senha.trim().to_string();
    if usuario.is_empty() || senha.is_empty() {
        return Err(AppError::InvalidInput(ERR_USER_AND_PASSWORD_REQUIRED.to_string()));
    }

    let perfil = match new_user.perfil.trim().to_lowercase() {
        p if p.is_empty() => PROFILE_USER.to_string(),
        p if UserAccount::validate_profile(&p) => p,
        p => return Err(AppError::InvalidInput(format!("Invalid profile: {}", p))),
    };

    let mut accounts = list_users(sync).await?;
    if accounts.iter().any(|a| a.usuario == usuario) {
        return Err(AppError::UserAlreadyExists);
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&senha, cost)).await??;
    let account = UserAccount {
        usuario,
        senha: hash,
        nome: new_user.nome.trim().to_string(),
        perfil,
        ativo: STATUS_ACTIVE.to_string(),
    };
    accounts.push(account.clone());
    save_roster(sync, &accounts).await?;

    tracing::info!(usuario = %account.usuario, perfil = %account.perfil, "Created user");
    Ok(account)
}

/// Change an account's profile, status and/or password
///
/// Every field is validated before the roster is touched, and the result
/// is written back with a single `save_users`.
pub async fn update_user(
    sync: &TableSynchronizer,
    usuario: &str,
    update: UserUpdate,
    cost: u32,
) -> Result<UserAccount> {
    let perfil = update.perfil.map(|p| p.trim().to_lowercase());
    if let Some(ref p) = perfil {
        if !UserAccount::validate_profile(p) {
            return Err(AppError::InvalidInput(format!("Invalid profile: {}", p)));
        }
    }
    let ativo = update.ativo.map(|a| a.trim().to_lowercase());
    if let Some(ref a) = ativo {
        if !UserAccount::validate_status(a) {
            return Err(AppError::InvalidInput(format!("Invalid status: {}", a)));
        }
    }
    let senha = update.senha.map(|s| s.trim().to_string());
    if senha.as_deref() == Some("") {
        return Err(AppError::InvalidInput(ERR_USER_AND_PASSWORD_REQUIRED.to_string()));
    }

    let usuario = UserAccount::normalize_username(usuario);
    let mut accounts = list_users(sync).await?;
    let index = accounts
        .iter()
        .position(|a| a.usuario == usuario)
        .ok_or(AppError::UserNotFound)?;

    let hash = match senha {
        Some(senha) => Some(tokio::task::spawn_blocking(move || hash_password(&senha, cost)).await??),
        None => None,
    };

    let account = &mut accounts[index];
    if let Some(p) = perfil {
        account.perfil = p;
    }
    if let Some(a) = ativo {
        account.ativo = a;
    }
    let password_reset = hash.is_some();
    if let Some(hash) = hash {
        account.senha = hash;
    }
    let updated = account.clone();
    save_roster(sync, &accounts).await?;

    tracing::info!(usuario = %updated.usuario, password_reset, "Updated user");
    Ok(updated)
}

/// Reset an account's password
pub async fn update_password(sync: &TableSynchronizer, usuario: &str, senha: &str, cost: u32) -> Result<()> {
    let update = UserUpdate {
        senha: Some(senha.to_string()),
        ..Default::default()
    };
    update_user(sync, usuario, update, cost).await.map(|_| ())
}
