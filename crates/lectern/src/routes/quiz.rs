//! Quiz authoring, listing and attempt endpoints.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use quizhall_common::{AnswerText, NewQuiz, Participation, QuestionId, Quiz, QuizError, QuizId};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::auth::Caller;
use crate::quiz::{AttemptReport, FetchMode, QuizView};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreatedResponse {
    id: QuizId,
}

/// Publish a new quiz
pub async fn create_quiz(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<NewQuiz>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(submission) = payload?;
    let id = state.quizzes.create_quiz(&caller, submission).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    /// Only quizzes by this author
    creator: Option<String>,
}

/// List published quizzes
pub async fn list_quizzes(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<Quiz>>, ApiError> {
    let quizzes = state.quizzes.list_quizzes(params.creator.as_deref()).await?;
    Ok(Json(quizzes))
}

/// The caller's attempt history
pub async fn list_results(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Participation>>, ApiError> {
    Ok(Json(state.quizzes.list_results(&caller).await?))
}

#[derive(Deserialize)]
pub struct FetchQuery {
    #[serde(default)]
    mode: FetchMode,
}

/// Fetch one quiz (redacted unless its creator asks for `mode=edit`)
pub async fn get_quiz(
    State(state): State<AppState>,
    caller: Caller,
    Path(quiz_id): Path<String>,
    params: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Json<QuizView>, ApiError> {
    let quiz_id = parse_quiz_id(&quiz_id)?;
    let Query(params) = params?;
    let view = state.quizzes.fetch_quiz(&caller, quiz_id, params.mode).await?;
    Ok(Json(view))
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    /// Answer keyed by question ID, as text or a bare number
    #[serde(default)]
    answers: HashMap<QuestionId, AnswerText>,
}

/// Submit an attempt
pub async fn submit_attempt(
    State(state): State<AppState>,
    caller: Caller,
    Path(quiz_id): Path<String>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<AttemptReport>, ApiError> {
    let quiz_id = parse_quiz_id(&quiz_id)?;
    let Json(request) = payload?;
    let answers: HashMap<QuestionId, String> = request
        .answers
        .into_iter()
        .map(|(id, answer)| (id, answer.into()))
        .collect();

    tracing::debug!(
        quiz_id = quiz_id,
        username = ?caller.username(),
        answers = answers.len(),
        "Submitting attempt"
    );

    let report = state
        .quizzes
        .submit_attempt(&caller, quiz_id, &answers)
        .await?;
    Ok(Json(report))
}

fn parse_quiz_id(raw: &str) -> Result<QuizId, QuizError> {
    raw.parse()
        .map_err(|_| QuizError::MalformedRequest(format!("invalid quiz id '{raw}'")))
}
