//! Answer checking and score aggregation.
//!
//! Each question yields an [`AnswerResult`]; the quiz's [`GradingPolicy`]
//! turns results into marks, and a [`Scorecard`] turns marks into a
//! percentage. Questions whose author left the answer empty are ungraded
//! and do not count towards the denominator.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::NEGATIVE_MARK;
use crate::types::{GradingPolicy, QuestionId, Quiz};

/// Outcome of comparing one submitted answer with the canonical answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerResult {
    Wrong,
    NoAnswer,
    Correct,
    QuestionAnswerNotProvided,
}

impl AnswerResult {
    /// Marks contributed under the given policy
    pub fn mark(self, policy: GradingPolicy) -> f64 {
        match (self, policy) {
            (Self::Correct, _) => 1.0,
            (Self::Wrong, GradingPolicy::WithNegativeMark) => NEGATIVE_MARK,
            (Self::Wrong, GradingPolicy::OnlyCorrect) => 0.0,
            (Self::NoAnswer | Self::QuestionAnswerNotProvided, _) => 0.0,
        }
    }

    /// Whether the result counts towards the score denominator
    pub fn is_graded(self) -> bool {
        self != Self::QuestionAnswerNotProvided
    }
}

impl fmt::Display for AnswerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wrong => "Wrong",
            Self::NoAnswer => "NoAnswer",
            Self::Correct => "Correct",
            Self::QuestionAnswerNotProvided => "QuestionAnswerNotProvided",
        };
        f.write_str(name)
    }
}

/// Classify a submission against a canonical answer.
///
/// Both sides are trimmed; comparison ignores case.
pub fn check_answer(canonical: &str, submitted: &str) -> AnswerResult {
    let canonical = canonical.trim();
    let submitted = submitted.trim();

    if canonical.is_empty() {
        return AnswerResult::QuestionAnswerNotProvided;
    }
    if submitted.is_empty() {
        return AnswerResult::NoAnswer;
    }

    if submitted.to_lowercase() == canonical.to_lowercase() {
        AnswerResult::Correct
    } else {
        AnswerResult::Wrong
    }
}

/// Per-category tally of one attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerStats {
    pub correct: u32,
    pub wrong: u32,
    pub no_answer: u32,
    pub answer_not_provided: u32,
}

impl AnswerStats {
    pub fn record(&mut self, result: AnswerResult) {
        match result {
            AnswerResult::Correct => self.correct += 1,
            AnswerResult::Wrong => self.wrong += 1,
            AnswerResult::NoAnswer => self.no_answer += 1,
            AnswerResult::QuestionAnswerNotProvided => self.answer_not_provided += 1,
        }
    }

    /// Questions that carry a canonical answer
    pub fn graded(&self) -> u32 {
        self.correct + self.wrong + self.no_answer
    }
}

/// Running marks for one attempt
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scorecard {
    pub stats: AnswerStats,
    pub total_mark: f64,
}

impl Scorecard {
    pub fn record(&mut self, result: AnswerResult, policy: GradingPolicy) {
        self.stats.record(result);
        self.total_mark += result.mark(policy);
    }

    /// Percentage score, clamped to 0-100.
    ///
    /// An attempt with no graded questions scores 0.
    pub fn score(&self) -> f64 {
        let graded = self.stats.graded();
        if graded == 0 {
            return 0.0;
        }
        (self.total_mark / f64::from(graded) * 100.0).clamp(0.0, 100.0)
    }
}

/// Grade every question of `quiz`; a question with no entry in `answers`
/// counts as an empty submission.
pub fn grade(quiz: &Quiz, answers: &HashMap<QuestionId, String>) -> Scorecard {
    let mut card = Scorecard::default();
    for question in &quiz.questions {
        let submitted = answers.get(&question.id).map(String::as_str).unwrap_or("");
        card.record(question.check(submitted), quiz.grading_type);
    }
    card
}

/// Pass/fail outcome with the message shown to the taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}
