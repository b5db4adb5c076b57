//! Session issuing for operators.
//!
//! Account management lives outside Lectern; an operator holding the admin
//! token mints session tokens for already-authenticated usernames.

use axum::{Json, extract::{State, rejection::JsonRejection}, http::HeaderMap};
use quizhall_common::QuizError;
use quizhall_common::constants::headers::X_ADMIN_TOKEN;
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IssueRequest {
    #[serde(default)]
    username: String,
}

#[derive(Serialize)]
pub struct IssueResponse {
    token: String,
    expires_in_secs: u64,
}

/// Mint a session token for `username`
pub async fn issue_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let presented = headers
        .get(X_ADMIN_TOKEN)
        .and_then(|value| value.to_str().ok());

    if !admin_authorized(state.config.admin_token.as_deref(), presented) {
        tracing::warn!("Rejected session request with bad admin token");
        return Err(QuizError::Forbidden.into());
    }

    let Json(request) = payload?;
    let username = request.username.trim();
    if username.is_empty() {
        return Err(QuizError::MissingField("username").into());
    }

    let token = state
        .sessions
        .issue(username)
        .await
        .map_err(QuizError::from)?;

    Ok(Json(IssueResponse {
        token,
        expires_in_secs: state.config.session.ttl_secs,
    }))
}

/// Admin routes stay closed unless a non-empty token is configured
fn admin_authorized(configured: Option<&str>, presented: Option<&str>) -> bool {
    match (configured, presented) {
        (Some(expected), Some(given)) => !expected.is_empty() && expected == given,
        _ => false,
    }
}
