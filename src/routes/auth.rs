use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::accounts;
use crate::constants::PROFILE_ADMIN;
use crate::error::{AppError, Result};
use crate::routes::validation::timestamp_to_rfc3339;
use crate::security::{issue_session_token, verify_session_token, SessionClaims};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub usuario: String,
    pub senha: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: String,
    pub nome: String,
    pub perfil: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

/// Exchange a username and password for a session token
///
/// Unknown users and wrong passwords both answer 401; inactive accounts
/// answer 403.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let account = accounts::authenticate(&state.sync, &payload.usuario, &payload.senha).await?;

    let expires_at = Utc::now().timestamp() + state.config.session_ttl_secs;
    let claims = SessionClaims {
        usuario: account.usuario.clone(),
        perfil: account.perfil.clone(),
        expires_at,
    };
    let token = issue_session_token(&claims, &state.config.session_secret)?;

    tracing::info!(usuario = %account.usuario, "User logged in");

    Ok(Json(LoginResponse {
        token,
        usuario: account.usuario,
        nome: account.nome,
        perfil: account.perfil,
        expires_at: timestamp_to_rfc3339(expires_at),
    }))
}

/// Session of the caller, taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct AuthSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = verify_session_token(
            token.trim(),
            &state.config.session_secret,
            Utc::now().timestamp(),
        )
        .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession(claims))
    }
}

/// Session of a caller whose profile is `admin`
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthSession(claims) = AuthSession::from_request_parts(parts, state).await?;
        if claims.perfil != PROFILE_ADMIN {
            tracing::warn!(usuario = %claims.usuario, "Non-admin tried an admin route");
            return Err(AppError::Forbidden);
        }
        Ok(AdminSession(claims))
    }
}
