//! Core types shared across Quizhall components.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_OPTIONS;
use crate::error::QuizError;
use crate::grading::{AnswerResult, Verdict, check_answer};

/// Storage-assigned quiz identifier
pub type QuizId = u64;

/// Storage-assigned question identifier
pub type QuestionId = u64;

/// Storage-assigned participation identifier
pub type ParticipationId = u64;

/// How a per-question result turns into marks.
///
/// Encoded on the wire as `1` (only correct answers count) or `2`
/// (wrong answers cost a quarter mark).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GradingPolicy {
    OnlyCorrect,
    WithNegativeMark,
}

impl GradingPolicy {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::OnlyCorrect),
            2 => Some(Self::WithNegativeMark),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::OnlyCorrect => 1,
            Self::WithNegativeMark => 2,
        }
    }
}

impl TryFrom<u8> for GradingPolicy {
    type Error = QuizError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_code(value.into()).ok_or(QuizError::InvalidGradingType)
    }
}

impl From<GradingPolicy> for u8 {
    fn from(policy: GradingPolicy) -> Self {
        policy.code()
    }
}

/// Question type discriminant (`1` multiple choice, `2` short answer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
}

impl QuestionType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::MultipleChoice),
            2 => Some(Self::ShortAnswer),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::MultipleChoice => 1,
            Self::ShortAnswer => 2,
        }
    }
}

/// Behaviour every question variant provides
pub trait QuestionVariant {
    fn question_type(&self) -> QuestionType;

    /// Canonical answer; empty when the author left the question ungraded
    fn answer(&self) -> &str;

    /// Variant-specific field rules (the statement is checked by [`Question`])
    fn validate(&self) -> Result<(), QuizError>;

    /// Remove the canonical answer before showing the question to a taker
    fn redact(&mut self);

    fn check(&self, submitted: &str) -> AnswerResult {
        check_answer(self.answer(), submitted)
    }
}

/// Up to four options; the answer is the 1-based option number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipleChoice {
    pub options: [String; MAX_OPTIONS],
    pub answer: String,
}

impl MultipleChoice {
    /// The answer as a 1-based option number, if it names one
    pub fn option_number(&self) -> Option<usize> {
        self.answer
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=MAX_OPTIONS).contains(n))
    }
}

impl QuestionVariant for MultipleChoice {
    fn question_type(&self) -> QuestionType {
        QuestionType::MultipleChoice
    }

    fn answer(&self) -> &str {
        &self.answer
    }

    fn validate(&self) -> Result<(), QuizError> {
        if self.options[0].trim().is_empty() {
            return Err(QuizError::MissingField("option1"));
        }
        if self.options[1].trim().is_empty() {
            return Err(QuizError::MissingField("option2"));
        }

        if !self.answer.trim().is_empty() && self.option_number().is_none() {
            return Err(QuizError::InvalidAnswer);
        }
        Ok(())
    }

    fn redact(&mut self) {
        self.answer.clear();
    }
}

/// Free-text answer compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortAnswer {
    pub answer: String,
}

impl QuestionVariant for ShortAnswer {
    fn question_type(&self) -> QuestionType {
        QuestionType::ShortAnswer
    }

    fn answer(&self) -> &str {
        &self.answer
    }

    fn validate(&self) -> Result<(), QuizError> {
        Ok(())
    }

    fn redact(&mut self) {
        self.answer.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice(MultipleChoice),
    ShortAnswer(ShortAnswer),
}

impl QuestionKind {
    pub fn variant(&self) -> &dyn QuestionVariant {
        match self {
            Self::MultipleChoice(q) => q,
            Self::ShortAnswer(q) => q,
        }
    }

    pub fn variant_mut(&mut self) -> &mut dyn QuestionVariant {
        match self {
            Self::MultipleChoice(q) => q,
            Self::ShortAnswer(q) => q,
        }
    }
}

/// A single quiz question.
///
/// Serialized flat as `{id, type, statement, option1..option4, answer}`.
/// The owning quiz ID never leaves the process; stores restore it from
/// the key the question was read under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "QuestionRecord", try_from = "QuestionRecord")]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub statement: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn new(statement: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: 0,
            quiz_id: 0,
            statement: statement.into(),
            kind,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.kind.variant().question_type()
    }

    pub fn answer(&self) -> &str {
        self.kind.variant().answer()
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.statement.trim().is_empty() {
            return Err(QuizError::MissingField("statement"));
        }
        self.kind.variant().validate()
    }

    pub fn check(&self, submitted: &str) -> AnswerResult {
        self.kind.variant().check(submitted)
    }

    pub fn redact(&mut self) {
        self.kind.variant_mut().redact();
    }
}

#[derive(Serialize, Deserialize)]
struct QuestionRecord {
    #[serde(default)]
    id: QuestionId,
    #[serde(rename = "type")]
    question_type: u8,
    statement: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    option1: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    option2: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    option3: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    option4: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    answer: String,
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        let question_type = question.question_type().code();
        let (options, answer) = match question.kind {
            QuestionKind::MultipleChoice(mc) => (mc.options, mc.answer),
            QuestionKind::ShortAnswer(sa) => (Default::default(), sa.answer),
        };
        let [option1, option2, option3, option4] = options;

        Self {
            id: question.id,
            question_type,
            statement: question.statement,
            option1,
            option2,
            option3,
            option4,
            answer,
        }
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuizError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let kind = match QuestionType::from_code(record.question_type.into()) {
            Some(QuestionType::MultipleChoice) => QuestionKind::MultipleChoice(MultipleChoice {
                options: [record.option1, record.option2, record.option3, record.option4],
                answer: record.answer,
            }),
            Some(QuestionType::ShortAnswer) => QuestionKind::ShortAnswer(ShortAnswer {
                answer: record.answer,
            }),
            None => return Err(QuizError::InvalidQuestionType),
        };

        Ok(Self {
            id: record.id,
            quiz_id: 0,
            statement: record.statement,
            kind,
        })
    }
}

/// A published quiz with its grading configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,

    /// Username of the author, taken from the authenticated caller
    pub creator: String,

    pub name: String,

    /// Ordered questions (stored separately, absent in listings)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,

    pub grading_type: GradingPolicy,

    /// Whether attempts are judged against `passing_score`
    pub pass_fail: bool,

    /// Passing threshold as a percentage
    pub passing_score: f64,

    /// Message for attempts that did not fail
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub not_fail_text: String,

    /// Message for failed attempts
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fail_text: String,

    /// Maximum attempts per user
    pub allowed_participations: u32,
}

impl Quiz {
    pub fn is_creator(&self, username: &str) -> bool {
        self.creator == username
    }

    /// Strip canonical answers and pass/fail texts for a taker
    pub fn redact(&mut self) {
        for question in &mut self.questions {
            question.redact();
        }
        self.not_fail_text.clear();
        self.fail_text.clear();
    }

    /// Pass/fail outcome and message for a percentage score
    pub fn verdict(&self, score: f64) -> Verdict {
        if self.pass_fail && score < self.passing_score {
            Verdict {
                passed: false,
                message: self.fail_text.clone(),
            }
        } else {
            Verdict {
                passed: true,
                message: self.not_fail_text.clone(),
            }
        }
    }
}

/// One recorded attempt at a quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    /// Assigned by the store when the attempt is recorded
    pub id: ParticipationId,
    pub quiz_id: QuizId,
    pub username: String,
    pub result: String,
    /// Percentage score (0-100)
    pub score: f64,
    pub pass_fail: bool,
    /// Unix timestamp of the attempt
    pub created_at: i64,
}

impl Participation {
    pub fn new(quiz_id: QuizId, username: String, score: f64, verdict: Verdict) -> Self {
        Self {
            id: 0,
            quiz_id,
            username,
            result: verdict.message,
            score,
            pass_fail: verdict.passed,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_question() -> Question {
        Question::new(
            "Which city is the capital of Australia?",
            QuestionKind::MultipleChoice(MultipleChoice {
                options: [
                    "Sydney".into(),
                    "Canberra".into(),
                    "Melbourne".into(),
                    "Perth".into(),
                ],
                answer: "2".into(),
            }),
        )
    }

    fn quiz(pass_fail: bool) -> Quiz {
        Quiz {
            id: 1,
            creator: "alice".into(),
            name: "Geo".into(),
            questions: vec![geo_question()],
            grading_type: GradingPolicy::OnlyCorrect,
            pass_fail,
            passing_score: 50.0,
            not_fail_text: "Well done".into(),
            fail_text: "Try again".into(),
            allowed_participations: 1,
        }
    }

    #[test]
    fn test_multiple_choice_rules() {
        assert!(geo_question().validate().is_ok());

        let mut q = geo_question();
        q.statement = "  ".into();
        assert!(matches!(q.validate(), Err(QuizError::MissingField("statement"))));

        for bad in ["0", "5", "two", "1.5"] {
            let mut q = geo_question();
            if let QuestionKind::MultipleChoice(mc) = &mut q.kind {
                mc.answer = bad.into();
            }
            assert!(matches!(q.validate(), Err(QuizError::InvalidAnswer)), "{bad}");
        }

        let mut q = geo_question();
        if let QuestionKind::MultipleChoice(mc) = &mut q.kind {
            mc.options[1].clear();
            mc.answer.clear();
        }
        assert!(matches!(q.validate(), Err(QuizError::MissingField("option2"))));
    }

    #[test]
    fn test_short_answer_has_no_option_rules() {
        let q = Question::new("Largest ocean?", QuestionKind::ShortAnswer(ShortAnswer::default()));
        assert!(q.validate().is_ok());
        assert_eq!(q.question_type(), QuestionType::ShortAnswer);
    }

    #[test]
    fn test_question_wire_shape() {
        let mut q = geo_question();
        q.id = 9;
        q.quiz_id = 4;
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["option2"], "Canberra");
        assert_eq!(json["answer"], "2");
        assert!(json.get("quiz_id").is_none());

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, 9);
        assert_eq!(back.quiz_id, 0);
        assert_eq!(back.kind, q.kind);
    }

    #[test]
    fn test_unknown_stored_type_is_rejected() {
        let raw = serde_json::json!({"id": 1, "type": 3, "statement": "?"});
        assert!(serde_json::from_value::<Question>(raw).is_err());
    }

    #[test]
    fn test_redact_strips_answers_and_texts() {
        let mut quiz = quiz(true);
        quiz.redact();
        assert_eq!(quiz.questions[0].answer(), "");
        assert!(quiz.fail_text.is_empty());
        assert!(quiz.not_fail_text.is_empty());

        let json = serde_json::to_value(&quiz).unwrap();
        assert!(json["questions"][0].get("answer").is_none());
        assert!(json.get("fail_text").is_none());
        assert_eq!(json["grading_type"], 1);
    }

    #[test]
    fn test_verdict() {
        let graded = quiz(true);
        assert!(graded.verdict(50.0).passed);
        let fail = graded.verdict(49.9);
        assert!(!fail.passed);
        assert_eq!(fail.message, "Try again");

        let ungraded = quiz(false);
        let v = ungraded.verdict(0.0);
        assert!(v.passed);
        assert_eq!(v.message, "Well done");
    }
}
