//! In-process store for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use quizhall_common::{Participation, Question, QuestionId, Quiz, QuizId, StoreError};
use tokio::sync::Mutex;

use super::{QuizStore, RecordedAttempt};

#[derive(Default)]
struct Tables {
    quizzes: Vec<Quiz>,
    questions: HashMap<QuizId, Vec<Question>>,
    participations: Vec<Participation>,
    next_question_id: QuestionId,
}

/// Store backed by in-memory tables behind one lock
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.quizzes.len() as QuizId + 1;

        let mut row = quiz.clone();
        row.id = id;
        row.questions.clear();
        tables.quizzes.push(row);

        Ok(id)
    }

    async fn insert_question(&self, question: &Question) -> Result<QuestionId, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_question_id += 1;
        let id = tables.next_question_id;

        let mut row = question.clone();
        row.id = id;
        tables.questions.entry(question.quiz_id).or_default().push(row);

        Ok(id)
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.quizzes.iter().find(|q| q.id == quiz_id).cloned())
    }

    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.questions.get(&quiz_id).cloned().unwrap_or_default())
    }

    async fn count_participations(
        &self,
        quiz_id: QuizId,
        username: &str,
    ) -> Result<u32, StoreError> {
        let tables = self.tables.lock().await;
        Ok(count_attempts(&tables, quiz_id, username))
    }

    async fn record_participation(
        &self,
        mut participation: Participation,
        allowed: u32,
    ) -> Result<Option<RecordedAttempt>, StoreError> {
        let mut tables = self.tables.lock().await;

        let used = count_attempts(&tables, participation.quiz_id, &participation.username);
        if used >= allowed {
            return Ok(None);
        }

        participation.id = tables.participations.len() as u64 + 1;
        tables.participations.push(participation.clone());

        Ok(Some(RecordedAttempt {
            participation,
            remaining: allowed - used - 1,
        }))
    }

    async fn list_quizzes(&self, creator: Option<&str>) -> Result<Vec<Quiz>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .quizzes
            .iter()
            .filter(|q| creator.is_none_or(|c| q.creator == c))
            .cloned()
            .collect())
    }

    async fn list_participations(&self, username: &str) -> Result<Vec<Participation>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .participations
            .iter()
            .filter(|p| p.username == username)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn count_attempts(tables: &Tables, quiz_id: QuizId, username: &str) -> u32 {
    tables
        .participations
        .iter()
        .filter(|p| p.quiz_id == quiz_id && p.username == username)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizhall_common::{GradingPolicy, QuestionKind, ShortAnswer, Verdict};

    fn quiz(creator: &str) -> Quiz {
        Quiz {
            id: 0,
            creator: creator.into(),
            name: "Rivers".into(),
            questions: vec![],
            grading_type: GradingPolicy::OnlyCorrect,
            pass_fail: false,
            passing_score: 0.0,
            not_fail_text: String::new(),
            fail_text: String::new(),
            allowed_participations: 2,
        }
    }

    fn attempt(quiz_id: QuizId, username: &str) -> Participation {
        let verdict = Verdict {
            passed: true,
            message: String::new(),
        };
        Participation::new(quiz_id, username.into(), 100.0, verdict)
    }

    #[tokio::test]
    async fn test_questions_keep_order_and_owner() {
        let store = MemoryStore::new();
        let quiz_id = store.insert_quiz(&quiz("alice")).await.unwrap();

        for statement in ["Longest river?", "Widest river?"] {
            let mut q = Question::new(statement, QuestionKind::ShortAnswer(ShortAnswer::default()));
            q.quiz_id = quiz_id;
            store.insert_question(&q).await.unwrap();
        }

        let questions = store.list_questions(quiz_id).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].statement, "Longest river?");
        assert!(questions.iter().all(|q| q.quiz_id == quiz_id));
        assert_ne!(questions[0].id, questions[1].id);
    }

    #[tokio::test]
    async fn test_record_participation_enforces_limit() {
        let store = MemoryStore::new();

        let first = store.record_participation(attempt(1, "bob"), 2).await.unwrap();
        assert_eq!(first.unwrap().remaining, 1);
        let second = store.record_participation(attempt(1, "bob"), 2).await.unwrap();
        assert_eq!(second.unwrap().remaining, 0);
        assert!(store.record_participation(attempt(1, "bob"), 2).await.unwrap().is_none());

        // Other users and quizzes are counted separately
        assert!(store.record_participation(attempt(1, "carol"), 2).await.unwrap().is_some());
        assert!(store.record_participation(attempt(2, "bob"), 2).await.unwrap().is_some());

        assert_eq!(store.count_participations(1, "bob").await.unwrap(), 2);
        assert_eq!(store.list_participations("bob").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_quizzes_by_creator() {
        let store = MemoryStore::new();
        store.insert_quiz(&quiz("alice")).await.unwrap();
        store.insert_quiz(&quiz("bob")).await.unwrap();
        store.insert_quiz(&quiz("alice")).await.unwrap();

        assert_eq!(store.list_quizzes(None).await.unwrap().len(), 3);
        let mine = store.list_quizzes(Some("alice")).await.unwrap();
        assert_eq!(mine.iter().map(|q| q.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_ping_and_missing_quiz() {
        let store = MemoryStore::new();
        tokio_test::block_on(async {
            tokio_test::assert_ok!(store.ping().await);
            let missing = tokio_test::assert_ok!(store.get_quiz(42).await);
            assert!(missing.is_none());
            assert!(tokio_test::assert_ok!(store.list_questions(42).await).is_empty());
        });
    }
}
