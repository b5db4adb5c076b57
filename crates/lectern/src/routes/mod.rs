//! HTTP route handlers for Lectern.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use quizhall_common::QuizError;
use serde::Serialize;
use serde_json::json;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Caller;
use crate::state::AppState;

mod admin;
mod health;
mod quiz;
mod session;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/", get(home))

        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))

        // Quiz authoring and attempts
        .nest("/api/quiz", quiz_routes())
        .route("/api/logout", post(session::logout))

        // Session issuing (disabled unless an admin token is configured)
        .nest("/admin", admin_routes())

        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))

        // Add shared state
        .with_state(state)
}

fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(quiz::create_quiz))
        .route("/all", get(quiz::list_quizzes))
        .route("/results", get(quiz::list_results))
        .route("/{quiz_id}", get(quiz::get_quiz).post(quiz::submit_attempt))
}

fn admin_routes() -> Router<AppState> {
    Router::new().route("/sessions", post(admin::issue_session))
}

/// Error returned by handlers.
///
/// Client faults carry their reason; server faults are logged with their
/// cause and reported opaquely.
#[derive(Debug)]
pub struct ApiError(pub QuizError);

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(QuizError::MalformedRequest(format!(
            "invalid JSON. ({})",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(QuizError::MalformedRequest(format!(
            "invalid query. ({})",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_client_fault() {
            tracing::debug!(status = status.as_u16(), reason = %self.0, "Client error");
            self.0.to_string()
        } else {
            tracing::error!(status = status.as_u16(), error = ?self.0, "Server error");
            "Internal server error".to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

/// Greeting for anonymous and signed-in callers
async fn home(caller: Caller) -> Json<MessageResponse> {
    let message = match caller.username() {
        Some(name) => format!("Welcome {name}!"),
        None => "Welcome! Please login.".to_string(),
    };
    Json(MessageResponse { message })
}
