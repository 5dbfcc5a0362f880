use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Role, SessionContext};
use crate::routes::validation::{bearer_token, require_session};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub token: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

impl SessionResponse {
    fn new(context: SessionContext, token: String) -> Self {
        Self {
            success: true,
            token,
            email: context.email,
            role: context.role,
        }
    }
}

/// Create an account and return its first session token
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>> {
    let (context, token) = state
        .sessions
        .sign_up(&payload.email, &payload.password)
        .await?;

    Ok(Json(SessionResponse::new(context, token)))
}

/// Exchange credentials for a session token
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>> {
    let (context, token) = state
        .sessions
        .sign_in(&payload.email, &payload.password)
        .await?;

    Ok(Json(SessionResponse::new(context, token)))
}

/// Revoke the presented session token
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SignOutResponse>> {
    let token = bearer_token(&headers).ok_or(AppError::NotSignedIn)?;
    state.sessions.sign_out(token).await?;

    Ok(Json(SignOutResponse { success: true }))
}

/// Resolve the presented token to its identity and role claim
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionContext>> {
    let context = require_session(&state, &headers).await?;
    Ok(Json(context))
}
