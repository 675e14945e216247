//! Quiz normalization and grading.
//!
//! Generation and grading sit on opposite sides of the error-handling split:
//! normalization of model output is tolerant (anything unusable collapses to
//! an empty quiz), while grading of a client submission is strict (malformed
//! payloads are reported back as client errors, never silently defaulted).

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::models::{GradedSubmission, ItemResult, QuizItem};

pub const CHOICE_KEYS: [&str; 4] = ["A", "B", "C", "D"];
pub const MAX_QUIZ_ITEMS: usize = 10;

/// Grading failures are surfaced to the caller as client errors, unlike
/// generation failures which degrade silently.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("submission must contain a 'quiz' array and an 'answers' object")]
    MalformedPayload,

    #[error("quiz item at index {0} is not an object")]
    InvalidQuizItem(usize),

    #[error("quiz item at index {0} has a non-string answer")]
    InvalidCorrectAnswer(usize),

    #[error("submitted answer for index {0} is not a string")]
    InvalidSelectedAnswer(usize),
}

/// Normalize a coerced model response (a JSON array) into quiz items.
///
/// At most the first [`MAX_QUIZ_ITEMS`] entries are considered. Each item's
/// options are rebuilt to exactly the keys A-D (missing ones become empty
/// strings), the answer is uppercased and trimmed, and items whose question
/// is empty after trimming are dropped. Any type violation inside the array
/// discards the whole quiz: a response that malformed is not worth salvaging
/// item by item.
pub fn normalize_quiz(value: &Value) -> Vec<QuizItem> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut quiz = Vec::new();
    for item in items.iter().take(MAX_QUIZ_ITEMS) {
        let Some(normalized) = normalize_item(item) else {
            warn!("Discarding quiz: model response contained a malformed item");
            return Vec::new();
        };
        if let Some(item) = normalized {
            quiz.push(item);
        }
    }
    quiz
}

/// Outer `None` = type violation (poisons the whole quiz); inner `None` =
/// empty question (only this item is dropped).
fn normalize_item(item: &Value) -> Option<Option<QuizItem>> {
    let obj = item.as_object()?;

    let question = match obj.get("question") {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return None,
    }
    .trim();

    let empty = serde_json::Map::new();
    let raw_options = match obj.get("options") {
        None => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return None,
    };

    let mut options = BTreeMap::new();
    for key in CHOICE_KEYS {
        let text = match raw_options.get(key) {
            None => "",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return None,
        };
        options.insert(key.to_string(), text.trim().to_string());
    }

    let answer = match obj.get("answer") {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return None,
    }
    .trim()
    .to_uppercase();

    if question.is_empty() {
        return Some(None);
    }

    Some(Some(QuizItem {
        question: question.to_string(),
        options,
        answer,
    }))
}

/// Grade a stateless submission: the client sends the original quiz back
/// together with an `answers` map of string-encoded index to choice key.
/// Matching is purely positional.
pub fn grade(payload: &Value) -> Result<GradedSubmission, GradeError> {
    let obj = payload.as_object().ok_or(GradeError::MalformedPayload)?;
    let quiz = obj
        .get("quiz")
        .and_then(Value::as_array)
        .ok_or(GradeError::MalformedPayload)?;
    let answers = obj
        .get("answers")
        .and_then(Value::as_object)
        .ok_or(GradeError::MalformedPayload)?;

    let mut results = Vec::with_capacity(quiz.len());
    let mut score = 0;

    for (index, item) in quiz.iter().enumerate() {
        let item = item
            .as_object()
            .ok_or(GradeError::InvalidQuizItem(index))?;

        let correct = match item.get("answer") {
            None => String::new(),
            Some(Value::String(s)) => s.trim().to_uppercase(),
            Some(_) => return Err(GradeError::InvalidCorrectAnswer(index)),
        };

        let selected = match answers.get(&index.to_string()) {
            None => String::new(),
            Some(Value::String(s)) => s.to_uppercase(),
            Some(_) => return Err(GradeError::InvalidSelectedAnswer(index)),
        };

        let ok = selected == correct;
        if ok {
            score += 1;
        }
        results.push(ItemResult {
            index,
            selected,
            correct,
            ok,
        });
    }

    Ok(GradedSubmission {
        score,
        total: results.len(),
        results,
    })
}
