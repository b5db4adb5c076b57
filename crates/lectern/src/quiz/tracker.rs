//! Attempt limits and scored attempt records.

use std::collections::HashMap;
use std::sync::Arc;

use quizhall_common::grading::{AnswerStats, grade};
use quizhall_common::{Participation, QuestionId, Quiz, QuizError};
use serde::Serialize;

use crate::store::QuizStore;

/// Result of one accepted attempt
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub participation_id: u64,
    pub quiz_id: u64,
    pub stats: AnswerStats,
    /// Percentage score (0-100)
    pub score: f64,
    pub passed: bool,
    pub result: String,
    pub remaining_attempts: u32,
}

/// Participation tracking service
pub struct ParticipationTracker {
    store: Arc<dyn QuizStore>,
}

impl ParticipationTracker {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    /// Attempts `username` has left on `quiz`
    pub async fn remaining_attempts(&self, quiz: &Quiz, username: &str) -> Result<u32, QuizError> {
        let used = self.store.count_participations(quiz.id, username).await?;
        Ok(quiz.allowed_participations.saturating_sub(used))
    }

    /// Grade an attempt and record it if the user still has attempts left.
    ///
    /// `quiz` must carry its questions. The store re-checks the limit when
    /// appending, so concurrent attempts cannot exceed it.
    pub async fn record_attempt(
        &self,
        quiz: &Quiz,
        username: &str,
        answers: &HashMap<QuestionId, String>,
    ) -> Result<AttemptReport, QuizError> {
        if self.remaining_attempts(quiz, username).await? == 0 {
            tracing::debug!(quiz_id = quiz.id, username = %username, "Attempt limit reached");
            return Err(QuizError::AttemptLimitReached);
        }

        let card = grade(quiz, answers);
        let score = card.score();
        let verdict = quiz.verdict(score);
        let participation = Participation::new(quiz.id, username.to_string(), score, verdict);

        let recorded = self
            .store
            .record_participation(participation, quiz.allowed_participations)
            .await
            .inspect_err(|e| {
                tracing::error!(quiz_id = quiz.id, username = %username, error = %e, "Failed to save participation");
            })?;

        let Some(recorded) = recorded else {
            tracing::warn!(
                quiz_id = quiz.id,
                username = %username,
                "Concurrent attempt used up the last slot"
            );
            return Err(QuizError::AttemptLimitReached);
        };

        let participation = recorded.participation;
        tracing::info!(
            quiz_id = quiz.id,
            username = %username,
            participation_id = participation.id,
            score = participation.score,
            passed = participation.pass_fail,
            "Attempt recorded"
        );

        Ok(AttemptReport {
            participation_id: participation.id,
            quiz_id: quiz.id,
            stats: card.stats,
            score: participation.score,
            passed: participation.pass_fail,
            result: participation.result,
            remaining_attempts: recorded.remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use quizhall_common::{GradingPolicy, Question, QuestionKind, ShortAnswer};

    async fn stored_quiz(store: &MemoryStore, allowed: u32) -> Quiz {
        let mut quiz = Quiz {
            id: 0,
            creator: "alice".into(),
            name: "Oceans".into(),
            questions: vec![],
            grading_type: GradingPolicy::OnlyCorrect,
            pass_fail: true,
            passing_score: 60.0,
            not_fail_text: "Passed".into(),
            fail_text: "Failed".into(),
            allowed_participations: allowed,
        };
        quiz.id = store.insert_quiz(&quiz).await.unwrap();

        let mut q = Question::new(
            "Largest ocean?",
            QuestionKind::ShortAnswer(ShortAnswer {
                answer: "Pacific".into(),
            }),
        );
        q.quiz_id = quiz.id;
        q.id = store.insert_question(&q).await.unwrap();
        quiz.questions.push(q);
        quiz
    }

    #[tokio::test]
    async fn test_remaining_attempts_count_down() {
        let store = Arc::new(MemoryStore::new());
        let quiz = stored_quiz(&store, 3).await;
        let tracker = ParticipationTracker::new(store.clone());
        let answers = HashMap::new();

        for expected_left in [2, 1, 0] {
            let before = tracker.remaining_attempts(&quiz, "bob").await.unwrap();
            let report = tracker.record_attempt(&quiz, "bob", &answers).await.unwrap();
            assert_eq!(report.remaining_attempts, expected_left);
            assert_eq!(
                tracker.remaining_attempts(&quiz, "bob").await.unwrap(),
                before - 1
            );
        }

        let err = tracker.record_attempt(&quiz, "bob", &answers).await.unwrap_err();
        assert!(matches!(err, QuizError::AttemptLimitReached));
        assert_eq!(store.count_participations(quiz.id, "bob").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_pass_fail_texts() {
        let store = Arc::new(MemoryStore::new());
        let quiz = stored_quiz(&store, 2).await;
        let tracker = ParticipationTracker::new(store.clone());
        let id = quiz.questions[0].id;

        let wrong = HashMap::from([(id, "Atlantic".to_string())]);
        let report = tracker.record_attempt(&quiz, "bob", &wrong).await.unwrap();
        assert!(!report.passed);
        assert_eq!(report.result, "Failed");
        assert_eq!(report.stats.wrong, 1);

        let right = HashMap::from([(id, " pacific ".to_string())]);
        let report = tracker.record_attempt(&quiz, "bob", &right).await.unwrap();
        assert!(report.passed);
        assert_eq!(report.score, 100.0);
        assert_eq!(report.result, "Passed");

        let history = store.list_participations("bob").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].id, report.participation_id);
    }

    #[tokio::test]
    async fn test_concurrent_attempts_respect_limit() {
        let store = Arc::new(MemoryStore::new());
        let quiz = Arc::new(stored_quiz(&store, 3).await);
        let tracker = Arc::new(ParticipationTracker::new(store.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let tracker = tracker.clone();
            let quiz = quiz.clone();
            handles.push(tokio::spawn(async move {
                tracker.record_attempt(&quiz, "bob", &HashMap::new()).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(QuizError::AttemptLimitReached) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(store.count_participations(quiz.id, "bob").await.unwrap(), 3);
    }
}
