//! Common error types for Quizhall components.

use thiserror::Error;

use crate::types::QuizId;

/// Storage collaborator failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend connection/operation error
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded
    #[error("stored value could not be decoded: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors surfaced by the quiz lifecycle operations
#[derive(Debug, Error)]
pub enum QuizError {
    /// A required field was empty or absent
    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Please enter a valid type for Grading Type. (1 or 2)")]
    InvalidGradingType,

    #[error("Please enter a valid type for question. (1 or 2)")]
    InvalidQuestionType,

    #[error("Please enter a valid number as answer for question.")]
    InvalidAnswer,

    /// A question entry had fields of the wrong shape
    #[error("Malformed question: {0}")]
    MalformedQuestion(String),

    /// The request body or path could not be decoded
    #[error("Bad request: {0}")]
    MalformedRequest(String),

    #[error("Login required.")]
    Unauthenticated,

    #[error("Access denied.")]
    Forbidden,

    #[error("No attempts left for this quiz.")]
    AttemptLimitReached,

    #[error("Quiz {0} not found.")]
    QuizNotFound(QuizId),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The quiz row was written but one of its questions was not
    #[error("Quiz {quiz_id} saved without all of its questions")]
    PartialWrite {
        quiz_id: QuizId,
        #[source]
        source: StoreError,
    },
}

impl QuizError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_)
            | Self::InvalidGradingType
            | Self::InvalidQuestionType
            | Self::InvalidAnswer
            | Self::MalformedQuestion(_)
            | Self::MalformedRequest(_) => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::AttemptLimitReached => 403,
            Self::QuizNotFound(_) => 404,
            Self::Store(_) => 500,
            Self::PartialWrite { .. } => 500,
        }
    }

    /// Returns true if the caller caused this error and should be told why
    pub fn is_client_fault(&self) -> bool {
        self.status_code() < 500
    }
}
