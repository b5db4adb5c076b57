//! Redis-backed quiz store.
//!
//! Layout (prefixes in `quizhall_common::constants::redis_keys`):
//! - `quiz:{id}` quiz metadata as JSON
//! - `quiz:{id}:questions` list of question JSON in authoring order
//! - `quizhall:quizzes` / `creator:{user}` lists of quiz IDs
//! - `attempts:{quiz}:{user}` / `results:{user}` lists of participation JSON
//!
//! IDs come from `INCR` sequences. A participation ID drawn for an attempt
//! that is then rejected is simply skipped.

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, RedisError, Script};
use async_trait::async_trait;
use quizhall_common::constants::redis_keys::{
    ATTEMPTS_PREFIX, CREATOR_PREFIX, PARTICIPATION_SEQ, QUESTION_SEQ, QUIZ_INDEX, QUIZ_PREFIX,
    QUIZ_SEQ, RESULTS_PREFIX,
};
use quizhall_common::{Participation, Question, QuestionId, Quiz, QuizId, StoreError};

use super::{QuizStore, RecordedAttempt};

/// Check the attempt count and append in one server-side step.
/// Returns the attempts left after recording, or -1 when none were left.
const RECORD_ATTEMPT_LUA: &str = r#"
local used = redis.call('LLEN', KEYS[1])
local allowed = tonumber(ARGV[1])
if used >= allowed then
    return -1
end
redis.call('RPUSH', KEYS[1], ARGV[2])
redis.call('RPUSH', KEYS[2], ARGV[2])
return allowed - used - 1
"#;

/// Quiz store on a shared Redis connection manager
pub struct RedisStore {
    /// Redis connection manager (auto-reconnecting)
    redis: ConnectionManager,
    record_attempt: Script,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            record_attempt: Script::new(RECORD_ATTEMPT_LUA),
        }
    }
}

fn backend(err: RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn quiz_key(quiz_id: QuizId) -> String {
    format!("{QUIZ_PREFIX}{quiz_id}")
}

fn questions_key(quiz_id: QuizId) -> String {
    format!("{QUIZ_PREFIX}{quiz_id}:questions")
}

fn creator_key(username: &str) -> String {
    format!("{CREATOR_PREFIX}{username}")
}

fn attempts_key(quiz_id: QuizId, username: &str) -> String {
    format!("{ATTEMPTS_PREFIX}{quiz_id}:{username}")
}

fn results_key(username: &str) -> String {
    format!("{RESULTS_PREFIX}{username}")
}

fn decode_all<T: serde::de::DeserializeOwned>(rows: Vec<String>) -> Result<Vec<T>, StoreError> {
    rows.iter()
        .map(|row| serde_json::from_str(row).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl QuizStore for RedisStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<QuizId, StoreError> {
        let mut conn = self.redis.clone();
        let id: QuizId = conn.incr(QUIZ_SEQ, 1).await.map_err(backend)?;

        let mut row = quiz.clone();
        row.id = id;
        row.questions.clear();
        let data = serde_json::to_string(&row)?;

        let _: () = ::redis::pipe()
            .atomic()
            .set(quiz_key(id), data)
            .ignore()
            .rpush(QUIZ_INDEX, id)
            .ignore()
            .rpush(creator_key(&row.creator), id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        tracing::debug!(quiz_id = id, creator = %row.creator, "Quiz stored");
        Ok(id)
    }

    async fn insert_question(&self, question: &Question) -> Result<QuestionId, StoreError> {
        let mut conn = self.redis.clone();
        let id: QuestionId = conn.incr(QUESTION_SEQ, 1).await.map_err(backend)?;

        let mut row = question.clone();
        row.id = id;
        let data = serde_json::to_string(&row)?;

        let _: () = conn
            .rpush(questions_key(question.quiz_id), data)
            .await
            .map_err(backend)?;

        Ok(id)
    }

    async fn get_quiz(&self, quiz_id: QuizId) -> Result<Option<Quiz>, StoreError> {
        let mut conn = self.redis.clone();
        let data: Option<String> = conn.get(quiz_key(quiz_id)).await.map_err(backend)?;

        match data {
            Some(d) => Ok(Some(serde_json::from_str(&d)?)),
            None => Ok(None),
        }
    }

    async fn list_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, StoreError> {
        let mut conn = self.redis.clone();
        let rows: Vec<String> = conn
            .lrange(questions_key(quiz_id), 0, -1)
            .await
            .map_err(backend)?;

        let mut questions: Vec<Question> = decode_all(rows)?;
        for question in &mut questions {
            question.quiz_id = quiz_id;
        }
        Ok(questions)
    }

    async fn count_participations(
        &self,
        quiz_id: QuizId,
        username: &str,
    ) -> Result<u32, StoreError> {
        let mut conn = self.redis.clone();
        conn.llen(attempts_key(quiz_id, username))
            .await
            .map_err(backend)
    }

    async fn record_participation(
        &self,
        mut participation: Participation,
        allowed: u32,
    ) -> Result<Option<RecordedAttempt>, StoreError> {
        let mut conn = self.redis.clone();
        participation.id = conn.incr(PARTICIPATION_SEQ, 1).await.map_err(backend)?;
        let data = serde_json::to_string(&participation)?;

        let remaining: i64 = self
            .record_attempt
            .key(attempts_key(participation.quiz_id, &participation.username))
            .key(results_key(&participation.username))
            .arg(allowed)
            .arg(data)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        if remaining < 0 {
            return Ok(None);
        }

        Ok(Some(RecordedAttempt {
            participation,
            remaining: remaining as u32,
        }))
    }

    async fn list_quizzes(&self, creator: Option<&str>) -> Result<Vec<Quiz>, StoreError> {
        let mut conn = self.redis.clone();
        let index = match creator {
            Some(username) => creator_key(username),
            None => QUIZ_INDEX.to_string(),
        };

        let ids: Vec<QuizId> = conn.lrange(index, 0, -1).await.map_err(backend)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.into_iter().map(quiz_key).collect();
        let rows: Vec<Option<String>> = ::redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        decode_all(rows.into_iter().flatten().collect())
    }

    async fn list_participations(&self, username: &str) -> Result<Vec<Participation>, StoreError> {
        let mut conn = self.redis.clone();
        let rows: Vec<String> = conn
            .lrange(results_key(username), 0, -1)
            .await
            .map_err(backend)?;

        decode_all(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
