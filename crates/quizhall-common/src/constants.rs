//! Shared constants for Quizhall components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default Lectern HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default session token validity (24 hours)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Multiple-choice questions carry at most this many options
pub const MAX_OPTIONS: usize = 4;

/// Mark deducted for a wrong answer under the negative-mark policy
pub const NEGATIVE_MARK: f64 = -0.25;

/// Redis key prefixes
pub mod redis_keys {
    /// Quiz ID sequence
    pub const QUIZ_SEQ: &str = "quizhall:seq:quiz";

    /// Question ID sequence
    pub const QUESTION_SEQ: &str = "quizhall:seq:question";

    /// Participation ID sequence
    pub const PARTICIPATION_SEQ: &str = "quizhall:seq:participation";

    /// Quiz record: quiz:{quiz_id}, questions: quiz:{quiz_id}:questions
    pub const QUIZ_PREFIX: &str = "quiz:";

    /// Every published quiz ID, in creation order
    pub const QUIZ_INDEX: &str = "quizhall:quizzes";

    /// Quiz IDs per author: creator:{username}
    pub const CREATOR_PREFIX: &str = "creator:";

    /// Attempts per quiz and user: attempts:{quiz_id}:{username}
    pub const ATTEMPTS_PREFIX: &str = "attempts:";

    /// Attempts per user across quizzes: results:{username}
    pub const RESULTS_PREFIX: &str = "results:";

    /// Session token digest: session:{sha256(token)}
    pub const SESSION_PREFIX: &str = "session:";
}

/// HTTP header names
pub mod headers {
    /// Session token header
    pub const X_SESSION_TOKEN: &str = "X-Session-Token";

    /// Admin token header (session issuing)
    pub const X_ADMIN_TOKEN: &str = "X-Admin-Token";
}
