//! Persistence collaborators.
//!
//! The store is the single source of truth and the only synchronization
//! point between requests. Two backends exist:
//! - `RedisStore` for deployments
//! - `MemoryStore` for development and tests

mod memory;
mod redis;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use quizhall_common::{Participation, Question, QuestionId, Quiz, QuizId, StoreError};

/// A participation that was accepted under the quiz's attempt limit
#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub participation: Participation,
    /// Attempts left for the same quiz and user after this one
    pub remaining: u32,
}

/// Storage operations the quiz service relies on
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Persist quiz metadata (questions are inserted separately) and return its new ID
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StoreError>;

    /// Persist one question under `question.quiz_id`
    async fn insert_question(&self, question: &Question) -> Result<QuestionId, StoreError>;

    /// Quiz metadata without questions
    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, StoreError>;

    /// Questions of a quiz, in authoring order
    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StoreError>;

    async fn count_participations(&self, quiz_id: QuizId, username: &str)
    -> Result<u32, StoreError>;

    /// Atomically check the attempt count for `(participation.quiz_id,
    /// participation.username)` against `allowed` and append the record.
    ///
    /// Returns `None` without writing anything when no attempts are left.
    async fn record_participation(
        &self,
        participation: Participation,
        allowed: u32,
    ) -> Result<Option<RecordedAttempt>, StoreError>;

    /// Quiz metadata in creation order, optionally only one author's
    async fn list_quizzes(&self, creator: Option<&str>) -> Result<Vec<Quiz>, StoreError>;

    /// Every attempt a user has made, oldest first
    async fn list_participations(&self, username: &str) -> Result<Vec<Participation>, StoreError>;

    /// Backend health check
    async fn ping(&self) -> Result<(), StoreError>;
}
