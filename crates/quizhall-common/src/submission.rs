//! Author submissions and their validation.
//!
//! Questions arrive loosely typed because each question type carries its own
//! field set. The `type` discriminant is read first, then the entry is decoded
//! into that type's schema and validated. The first failing rule wins.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::QuizError;
use crate::types::{
    GradingPolicy, MultipleChoice, Question, QuestionKind, QuestionType, Quiz, ShortAnswer,
};

/// A quiz as submitted by its author, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuiz {
    #[serde(default)]
    pub name: String,

    /// Raw question entries, decoded per type during validation
    #[serde(default)]
    pub questions: Vec<Value>,

    #[serde(default)]
    pub grading_type: i64,

    #[serde(default)]
    pub pass_fail: bool,

    #[serde(default)]
    pub passing_score: f64,

    #[serde(default)]
    pub not_fail_text: String,

    #[serde(default)]
    pub fail_text: String,

    #[serde(default, alias = "allowed_participation")]
    pub allowed_participations: u32,
}

impl NewQuiz {
    /// Validate the submission and build the in-memory quiz.
    ///
    /// The returned quiz has no ID and no creator yet.
    pub fn validate(self) -> Result<Quiz, QuizError> {
        if self.name.trim().is_empty() {
            return Err(QuizError::MissingField("name"));
        }
        if self.questions.is_empty() {
            return Err(QuizError::MissingField("questions"));
        }
        let grading_type =
            GradingPolicy::from_code(self.grading_type).ok_or(QuizError::InvalidGradingType)?;
        if self.allowed_participations == 0 {
            return Err(QuizError::MissingField("allowed_participations"));
        }

        let questions = self
            .questions
            .iter()
            .map(decode_question)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz {
            id: 0,
            creator: String::new(),
            name: self.name,
            questions,
            grading_type,
            pass_fail: self.pass_fail,
            passing_score: self.passing_score,
            not_fail_text: self.not_fail_text,
            fail_text: self.fail_text,
            allowed_participations: self.allowed_participations,
        })
    }
}

/// Decode and validate one raw question entry
pub fn decode_question(entry: &Value) -> Result<Question, QuizError> {
    let mut question = match question_type(entry)? {
        QuestionType::MultipleChoice => {
            let fields = MultipleChoiceFields::deserialize(entry)
                .map_err(|e| QuizError::MalformedQuestion(e.to_string()))?;
            Question::new(
                fields.statement,
                QuestionKind::MultipleChoice(MultipleChoice {
                    options: [fields.option1, fields.option2, fields.option3, fields.option4],
                    answer: fields.answer,
                }),
            )
        }
        QuestionType::ShortAnswer => {
            let fields = ShortAnswerFields::deserialize(entry)
                .map_err(|e| QuizError::MalformedQuestion(e.to_string()))?;
            Question::new(
                fields.statement,
                QuestionKind::ShortAnswer(ShortAnswer {
                    answer: fields.answer,
                }),
            )
        }
    };

    question.validate()?;

    // "02", "+2" and " 2 " all name option 2; store the plain number
    if let QuestionKind::MultipleChoice(choice) = &mut question.kind {
        if let Some(n) = choice.option_number() {
            choice.answer = n.to_string();
        }
    }
    Ok(question)
}

/// Read the `type` discriminant: a JSON number or a numeric string
fn question_type(entry: &Value) -> Result<QuestionType, QuizError> {
    let code = match entry.get("type") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    code.and_then(QuestionType::from_code)
        .ok_or(QuizError::InvalidQuestionType)
}

#[derive(Deserialize)]
struct MultipleChoiceFields {
    #[serde(default)]
    statement: String,
    #[serde(default)]
    option1: String,
    #[serde(default)]
    option2: String,
    #[serde(default)]
    option3: String,
    #[serde(default)]
    option4: String,
    #[serde(default, deserialize_with = "answer_text")]
    answer: String,
}

#[derive(Deserialize)]
struct ShortAnswerFields {
    #[serde(default)]
    statement: String,
    #[serde(default, deserialize_with = "answer_text")]
    answer: String,
}

/// An answer as a client sent it: text, a bare number, or null
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerText(pub String);

impl<'de> Deserialize<'de> for AnswerText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        answer_text(deserializer).map(Self)
    }
}

impl From<AnswerText> for String {
    fn from(answer: AnswerText) -> Self {
        answer.0
    }
}

/// Answers may be sent as text or as a bare number (`"answer": 2`)
fn answer_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}
