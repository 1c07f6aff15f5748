//! Signup and login endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub token: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub is_admin: bool,
}

/// POST /api/signup — register a regular user and sign them in.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn signup<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let user = state.accounts.signup(&req.username, &req.password).await?;
    let token = state
        .tokens
        .issue(user.id, user.is_admin)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created",
            token,
        }),
    ))
}

/// POST /api/login — exchange credentials for a token.
#[tracing::instrument(skip(state, req), fields(username = %req.username))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.accounts.login(&req.username, &req.password).await?;
    let token = state
        .tokens
        .issue(user.id, user.is_admin)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        is_admin: user.is_admin,
    }))
}
