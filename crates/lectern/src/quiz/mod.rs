//! Quiz lifecycle: authoring, reading, and attempting quizzes.
//!
//! A quiz is published once by its creator and then only read or attempted.
//! There is no edit, retraction or archival.

mod tracker;

pub use tracker::{AttemptReport, ParticipationTracker};

use std::collections::HashMap;
use std::sync::Arc;

use quizhall_common::{NewQuiz, Participation, QuestionId, Quiz, QuizError, QuizId};
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::store::QuizStore;

/// Why a quiz is being fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// About to attempt it; answers are always hidden
    #[default]
    Take,
    /// Reviewing it; answers are shown to the creator only
    Edit,
}

/// A quiz as shown to one caller
#[derive(Debug, Clone, Serialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Set for authenticated callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

/// Quiz lifecycle service
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    tracker: ParticipationTracker,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        let tracker = ParticipationTracker::new(store.clone());
        Self { store, tracker }
    }

    /// Validate and publish a quiz authored by `caller`
    pub async fn create_quiz(&self, caller: &Caller, submission: NewQuiz) -> Result<QuizId, QuizError> {
        let creator = caller.require()?;

        let mut quiz = submission.validate()?;
        quiz.creator = creator.to_string();

        let quiz_id = self.store.insert_quiz(&quiz).await.inspect_err(|e| {
            tracing::error!(creator = %creator, error = %e, "Failed to save quiz");
        })?;

        for mut question in quiz.questions {
            question.quiz_id = quiz_id;
            if let Err(source) = self.store.insert_question(&question).await {
                tracing::error!(
                    quiz_id = quiz_id,
                    error = %source,
                    "Quiz saved but a question was not"
                );
                return Err(QuizError::PartialWrite { quiz_id, source });
            }
        }

        tracing::info!(quiz_id = quiz_id, creator = %creator, name = %quiz.name, "Quiz published");
        Ok(quiz_id)
    }

    /// Load a quiz, redacted unless its creator is editing it
    pub async fn fetch_quiz(
        &self,
        caller: &Caller,
        quiz_id: QuizId,
        mode: FetchMode,
    ) -> Result<QuizView, QuizError> {
        let mut quiz = self.load(quiz_id).await?;

        let is_creator = caller.username().is_some_and(|name| quiz.is_creator(name));
        if mode == FetchMode::Take || !is_creator {
            quiz.redact();
        }

        let remaining_attempts = match caller.username() {
            Some(username) => Some(self.tracker.remaining_attempts(&quiz, username).await?),
            None => None,
        };

        Ok(QuizView {
            quiz,
            remaining_attempts,
        })
    }

    /// Grade and record an attempt by `caller`
    pub async fn submit_attempt(
        &self,
        caller: &Caller,
        quiz_id: QuizId,
        answers: &HashMap<QuestionId, String>,
    ) -> Result<AttemptReport, QuizError> {
        let username = caller.require()?;
        let quiz = self.load(quiz_id).await?;
        self.tracker.record_attempt(&quiz, username, answers).await
    }

    /// Published quizzes without questions, optionally one author's only
    pub async fn list_quizzes(&self, creator: Option<&str>) -> Result<Vec<Quiz>, QuizError> {
        let mut quizzes = self.store.list_quizzes(creator).await?;
        for quiz in &mut quizzes {
            quiz.redact();
        }
        Ok(quizzes)
    }

    /// The caller's own attempt history
    pub async fn list_results(&self, caller: &Caller) -> Result<Vec<Participation>, QuizError> {
        let username = caller.require()?;
        Ok(self.store.list_participations(username).await?)
    }

    async fn load(&self, quiz_id: QuizId) -> Result<Quiz, QuizError> {
        let mut quiz = self
            .store
            .get_quiz(quiz_id)
            .await?
            .ok_or(QuizError::QuizNotFound(quiz_id))?;
        quiz.questions = self.store.list_questions(quiz_id).await?;
        Ok(quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, RecordedAttempt};
    use async_trait::async_trait;
    use quizhall_common::{Question, StoreError};
    use serde_json::json;

    fn alice() -> Caller {
        Caller::User("alice".into())
    }

    fn bob() -> Caller {
        Caller::User("bob".into())
    }

    fn geo() -> NewQuiz {
        serde_json::from_value(json!({
            "name": "Geo",
            "grading_type": 1,
            "pass_fail": false,
            "not_fail_text": "Thanks for playing",
            "fail_text": "Better luck next time",
            "allowed_participations": 1,
            "questions": [{
                "type": 1,
                "statement": "Capital of Australia?",
                "option1": "A",
                "option2": "B",
                "option3": "C",
                "option4": "D",
                "answer": "2"
            }]
        }))
        .unwrap()
    }

    fn service() -> (QuizService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (QuizService::new(store.clone()), store)
    }

    async fn question_id(service: &QuizService, quiz_id: QuizId) -> QuestionId {
        let view = service.fetch_quiz(&alice(), quiz_id, FetchMode::Edit).await.unwrap();
        view.quiz.questions[0].id
    }

    #[tokio::test]
    async fn test_geo_end_to_end() {
        let (service, _) = service();
        let quiz_id = service.create_quiz(&alice(), geo()).await.unwrap();
        let qid = question_id(&service, quiz_id).await;

        let answers = HashMap::from([(qid, "2".to_string())]);
        let report = service.submit_attempt(&bob(), quiz_id, &answers).await.unwrap();
        assert_eq!(report.score, 100.0);
        assert!(report.passed);
        assert_eq!(report.stats.correct, 1);
        assert_eq!(report.result, "Thanks for playing");
        assert_eq!(report.remaining_attempts, 0);

        let again = service.submit_attempt(&bob(), quiz_id, &answers).await;
        assert!(matches!(again, Err(QuizError::AttemptLimitReached)));
    }

    #[tokio::test]
    async fn test_missing_answer_key_scores_zero() {
        let (service, _) = service();
        let quiz_id = service.create_quiz(&alice(), geo()).await.unwrap();

        let report = service
            .submit_attempt(&bob(), quiz_id, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(report.stats.no_answer, 1);
        assert_eq!(report.score, 0.0);
    }

    #[tokio::test]
    async fn test_creator_comes_from_caller() {
        let (service, store) = service();
        let submission: NewQuiz = serde_json::from_value(json!({
            "name": "Spoofed",
            "creator": "mallory",
            "grading_type": 2,
            "allowed_participations": 3,
            "questions": [{"type": "2", "statement": "Largest ocean?", "answer": "Pacific"}]
        }))
        .unwrap();
        let quiz_id = service.create_quiz(&alice(), submission).await.unwrap();

        let stored = store.get_quiz(quiz_id).await.unwrap().unwrap();
        assert_eq!(stored.creator, "alice");
    }

    #[tokio::test]
    async fn test_anonymous_callers_cannot_write() {
        let (service, store) = service();
        let err = service.create_quiz(&Caller::Anonymous, geo()).await.unwrap_err();
        assert!(matches!(err, QuizError::Unauthenticated));
        assert!(store.list_quizzes(None).await.unwrap().is_empty());

        let quiz_id = service.create_quiz(&alice(), geo()).await.unwrap();
        let err = service
            .submit_attempt(&Caller::Anonymous, quiz_id, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Unauthenticated));
        assert!(matches!(
            service.list_results(&Caller::Anonymous).await,
            Err(QuizError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_invalid_submission_writes_nothing() {
        let (service, store) = service();
        let mut submission = geo();
        submission.grading_type = 5;
        let err = service.create_quiz(&alice(), submission).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidGradingType));
        assert!(store.list_quizzes(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_redaction() {
        let (service, _) = service();
        let quiz_id = service.create_quiz(&alice(), geo()).await.unwrap();

        let edit = service.fetch_quiz(&alice(), quiz_id, FetchMode::Edit).await.unwrap();
        assert_eq!(edit.quiz.questions[0].answer(), "2");
        assert_eq!(edit.quiz.fail_text, "Better luck next time");
        assert_eq!(edit.remaining_attempts, Some(1));

        let take = service.fetch_quiz(&alice(), quiz_id, FetchMode::Take).await.unwrap();
        assert_eq!(take.quiz.questions[0].answer(), "");
        assert!(take.quiz.not_fail_text.is_empty());

        let other = service.fetch_quiz(&bob(), quiz_id, FetchMode::Edit).await.unwrap();
        assert_eq!(other.quiz.questions[0].answer(), "");
        assert!(other.quiz.fail_text.is_empty());

        let anonymous = service
            .fetch_quiz(&Caller::Anonymous, quiz_id, FetchMode::Take)
            .await
            .unwrap();
        assert_eq!(anonymous.remaining_attempts, None);
        let json = serde_json::to_value(&anonymous).unwrap();
        assert!(json["questions"][0].get("answer").is_none());
        assert!(json.get("fail_text").is_none());
        assert!(json.get("remaining_attempts").is_none());
        assert_eq!(json["name"], "Geo");
    }

    #[tokio::test]
    async fn test_unknown_quiz() {
        let (service, _) = service();
        let err = service
            .fetch_quiz(&bob(), 42, FetchMode::Take)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::QuizNotFound(42)));

        let err = service
            .submit_attempt(&bob(), 42, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::QuizNotFound(42)));
    }

    #[tokio::test]
    async fn test_listings() {
        let (service, _) = service();
        let first = service.create_quiz(&alice(), geo()).await.unwrap();
        service.create_quiz(&bob(), geo()).await.unwrap();

        let all = service.list_quizzes(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|q| q.questions.is_empty() && q.fail_text.is_empty()));

        let alices = service.list_quizzes(Some("alice")).await.unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].id, first);

        service.submit_attempt(&bob(), first, &HashMap::new()).await.unwrap();
        let results = service.list_results(&bob()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].quiz_id, first);
        assert!(service.list_results(&alice()).await.unwrap().is_empty());
    }

    /// Accepts the quiz row, then fails every question insert
    struct FailingQuestions(MemoryStore);

    #[async_trait]
    impl QuizStore for FailingQuestions {
        async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StoreError> {
            self.0.insert_quiz(quiz).await
        }
        async fn insert_question(&self, _question: &Question) -> Result<QuestionId, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }
        async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, StoreError> {
            self.0.get_quiz(quiz_id).await
        }
        async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StoreError> {
            self.0.list_questions(quiz_id).await
        }
        async fn count_participations(
            &self,
            quiz_id: QuizId,
            username: &str,
        ) -> Result<u32, StoreError> {
            self.0.count_participations(quiz_id, username).await
        }
        async fn record_participation(
            &self,
            participation: Participation,
            allowed: u32,
        ) -> Result<Option<RecordedAttempt>, StoreError> {
            self.0.record_participation(participation, allowed).await
        }
        async fn list_quizzes(&self, creator: Option<&str>) -> Result<Vec<Quiz>, StoreError> {
            self.0.list_quizzes(creator).await
        }
        async fn list_participations(
            &self,
            username: &str,
        ) -> Result<Vec<Participation>, StoreError> {
            self.0.list_participations(username).await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_partial_write_is_a_server_fault() {
        let store = Arc::new(FailingQuestions(MemoryStore::new()));
        let service = QuizService::new(store.clone());

        let err = service.create_quiz(&alice(), geo()).await.unwrap_err();
        assert!(matches!(err, QuizError::PartialWrite { quiz_id: 1, .. }));
        assert!(!err.is_client_fault());

        // The quiz row stays behind without questions
        let stored = store.get_quiz(1).await.unwrap().unwrap();
        assert_eq!(stored.name, "Geo");
        assert!(store.list_questions(1).await.unwrap().is_empty());
    }
}
