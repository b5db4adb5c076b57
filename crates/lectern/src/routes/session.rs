//! Ending the caller's own session.

use axum::{Json, extract::State, http::HeaderMap};
use quizhall_common::QuizError;
use serde::Serialize;

use super::ApiError;
use crate::auth::{Caller, session_token};
use crate::state::AppState;

#[derive(Serialize)]
pub struct LogoutResponse {
    message: String,
}

/// Revoke the session token the request was made with
pub async fn logout(
    State(state): State<AppState>,
    caller: Caller,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let username = caller.require()?;
    let token = session_token(&headers).ok_or(QuizError::Unauthenticated)?;

    state
        .sessions
        .revoke(token)
        .await
        .map_err(QuizError::from)?;

    tracing::info!(username = %username, "Session revoked");

    Ok(Json(LogoutResponse {
        message: format!("Goodbye {username}!"),
    }))
}
