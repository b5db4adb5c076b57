//! # Quizhall Common
//!
//! Shared types, grading rules, and validation used across Quizhall components.
//!
//! ## Modules
//! - `types` - Quiz, question and participation records
//! - `grading` - Answer checking, grading policies and scoring
//! - `submission` - Author submissions and their validation
//! - `error` - Common error types
//! - `constants` - Shared configuration constants

pub mod constants;
pub mod error;
pub mod grading;
pub mod submission;
pub mod types;

pub use error::{QuizError, StoreError};
pub use grading::{AnswerResult, AnswerStats, Scorecard, Verdict};
pub use submission::{AnswerText, NewQuiz};
pub use types::*;
