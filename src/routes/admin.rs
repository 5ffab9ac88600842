use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::accounts::{self, NewUser, UserUpdate};
use crate::error::Result;
use crate::models::{Frame, UserSummary};
use crate::routes::auth::AdminSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub usuario: String,
    #[serde(default)]
    pub nome: String,
    pub senha: String,
    #[serde(default)]
    pub perfil: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub perfil: Option<String>,
    pub ativo: Option<String>,
    /// New password; omitted leaves the current one
    pub senha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplaceUsersResponse {
    pub success: bool,
    pub users: usize,
}

/// Users roster without password hashes
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> Result<Json<Vec<UserSummary>>> {
    let users = accounts::list_users(&state.sync).await?;
    Ok(Json(users.iter().map(|u| u.summary()).collect()))
}

/// Create an account
///
/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>)> {
    let account = accounts::create_user(
        &state.sync,
        NewUser {
            usuario: payload.usuario,
            nome: payload.nome,
            senha: payload.senha,
            perfil: payload.perfil,
        },
        state.config.password_hash_cost,
    )
    .await?;

    tracing::info!(admin = %admin.usuario, usuario = %account.usuario, "Admin created user");
    Ok((StatusCode::CREATED, Json(account.summary())))
}

/// Change an account's profile, status or password
///
/// PATCH /api/admin/users/:usuario
pub async fn update_user(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(usuario): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserSummary>> {
    let account = accounts::update_user(
        &state.sync,
        &usuario,
        UserUpdate {
            perfil: payload.perfil,
            ativo: payload.ativo,
            senha: payload.senha,
        },
        state.config.password_hash_cost,
    )
    .await?;

    tracing::info!(admin = %admin.usuario, usuario = %account.usuario, "Admin updated user");
    Ok(Json(account.summary()))
}

/// Replace the whole users roster
///
/// PUT /api/admin/users
///
/// Every existing account is deleted before the uploaded roster is
/// inserted. Rows must have unique usernames and already carry bcrypt
/// hashes in `senha`; an invalid roster answers 400 and changes nothing.
pub async fn replace_users(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Json(roster): Json<Frame>,
) -> Result<Json<ReplaceUsersResponse>> {
    let roster = accounts::replace_roster(&state.sync, roster).await?;

    tracing::warn!(admin = %admin.usuario, users = roster.len(), "Users roster replaced");
    Ok(Json(ReplaceUsersResponse {
        success: true,
        users: roster.len(),
    }))
}
