//! Study-assistant generation: summaries, flowcharts, quizzes. Everything in
//! this module follows the tolerance policy — a model call or parse that
//! fails degrades to the mode's empty/default output with a log line, never
//! to an HTTP error.

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::coercion::{self, ExpectedShape};
use crate::model_client::GenerativeProvider;
use crate::models::QuizItem;
use crate::quiz;
use crate::summarizer::{self, SummaryMode, truncate_chars};

/// Cap on the document prefix handed to the model, in characters.
pub const MODEL_INPUT_CHARS: usize = 12_000;

const NO_SUMMARY: &str = "No summary available.";

#[derive(Clone)]
pub struct AssistantService {
    provider: GenerativeProvider,
}

impl AssistantService {
    pub fn new(provider: GenerativeProvider) -> Self {
        Self { provider }
    }

    /// Summarize extracted text: generative model first, local extractive
    /// fallback when the primary path yields no text at all. Never fails.
    pub async fn summarize(&self, text: &str, mode: SummaryMode) -> String {
        let prompt = summary_prompt(text, mode);

        let primary = match self.provider.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_string()),
            Ok(_) => {
                warn!(mode = ?mode, "Model returned an empty summary, using local fallback");
                None
            }
            Err(e) => {
                warn!(mode = ?mode, error = %e, "Model summarization failed, using local fallback");
                None
            }
        };

        finish_summary(primary, text, mode)
    }

    /// Generate a conceptual flowchart as a JSON value. The parsed model
    /// object is passed through untouched: edge endpoints are not validated
    /// against node ids, extra keys survive.
    pub async fn flowchart(&self, text: &str) -> Value {
        let prompt = flowchart_prompt(text);

        let reply = match self.provider.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!("Model returned an empty flowchart response");
                return empty_flowchart();
            }
            Err(e) => {
                warn!(error = %e, "Flowchart generation failed upstream");
                return empty_flowchart();
            }
        };

        match coercion::coerce(&reply, ExpectedShape::ObjectWithKey("nodes")) {
            Ok(value) => {
                info!(
                    node_count = value["nodes"].as_array().map(|n| n.len()).unwrap_or(0),
                    "Flowchart generated"
                );
                value
            }
            Err(e) => {
                warn!(cause = %e, "Flowchart response could not be coerced");
                empty_flowchart()
            }
        }
    }

    /// Generate a multiple-choice quiz of at most ten items. Any failure on
    /// the way (call, coercion, malformed items) yields an empty quiz.
    pub async fn generate_quiz(&self, text: &str) -> Vec<QuizItem> {
        let prompt = quiz_prompt(text);

        let reply = match self.provider.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Quiz generation failed upstream");
                return Vec::new();
            }
        };

        match coercion::coerce(&reply, ExpectedShape::Array) {
            Ok(value) => {
                let items = quiz::normalize_quiz(&value);
                info!(question_count = items.len(), "Quiz generated");
                items
            }
            Err(e) => {
                warn!(cause = %e, "Quiz response could not be coerced");
                Vec::new()
            }
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }
}

/// Resolve the final summary from an optional primary result. Split out of
/// the async path so the fallback ordering is testable without a network.
pub(crate) fn finish_summary(primary: Option<String>, text: &str, mode: SummaryMode) -> String {
    if let Some(summary) = primary {
        return summary;
    }
    let fallback = summarizer::summarize(text, mode);
    if fallback.trim().is_empty() {
        NO_SUMMARY.to_string()
    } else {
        fallback
    }
}

pub(crate) fn empty_flowchart() -> Value {
    json!({"nodes": [], "edges": []})
}

fn summary_prompt(text: &str, mode: SummaryMode) -> String {
    let instructions = match mode {
        SummaryMode::Quick => {
            "Analyze the document and list ONLY the main topics or key sections \
             as concise bullet points with one-line student-friendly explanations."
        }
        SummaryMode::Detailed => {
            "Provide a detailed, topic-wise student-friendly summary of this document. \
             Use headings and bullet points, be clear and structured."
        }
    };
    format!("{}\n\n{}", instructions, truncate_chars(text, MODEL_INPUT_CHARS))
}

fn flowchart_prompt(text: &str) -> String {
    format!(
        "Create a step-by-step conceptual flowchart based on the document below. \
         Output ONLY a valid JSON with this structure:\n\
         {{\"nodes\": [{{\"id\": \"1\", \"label\": \"Start\"}}, ...], \
         \"edges\": [{{\"source\": \"1\", \"target\": \"2\"}}, ...]}}\n\
         Do not include any commentary, markdown, or text outside the JSON.\n\n{}",
        truncate_chars(text, MODEL_INPUT_CHARS)
    )
}

fn quiz_prompt(text: &str) -> String {
    format!(
        "Create a 10-question multiple-choice quiz from the text below. \
         Output as strict JSON array: \
         [{{\"question\":\"...\",\"options\":{{\"A\":\"..\",\"B\":\"..\",\"C\":\"..\",\"D\":\"..\"}},\"answer\":\"B\"}},...]\n\n{}",
        truncate_chars(text, MODEL_INPUT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_summary_wins_when_present() {
        let result = finish_summary(
            Some("Model summary.".to_string()),
            "Some source text that would otherwise be summarized locally.",
            SummaryMode::Quick,
        );
        assert_eq!(result, "Model summary.");
    }

    #[test]
    fn missing_primary_falls_back_to_local_summarizer() {
        let text = "Photosynthesis converts light into chemical energy. \
                    Chlorophyll absorbs the light in the chloroplasts.";
        let result = finish_summary(None, text, SummaryMode::Quick);
        assert_ne!(result, NO_SUMMARY);
        assert!(result.contains("Photosynthesis"));
    }

    #[test]
    fn both_paths_empty_yields_placeholder() {
        let result = finish_summary(None, "   ", SummaryMode::Detailed);
        assert_eq!(result, NO_SUMMARY);
    }

    #[test]
    fn prompts_truncate_long_documents() {
        let text = "x".repeat(MODEL_INPUT_CHARS * 2);
        for prompt in [
            summary_prompt(&text, SummaryMode::Quick),
            flowchart_prompt(&text),
            quiz_prompt(&text),
        ] {
            assert!(prompt.len() < MODEL_INPUT_CHARS + 1_000);
        }
    }

    #[test]
    fn empty_flowchart_shape() {
        let value = empty_flowchart();
        assert!(value["nodes"].as_array().is_some_and(|n| n.is_empty()));
        assert!(value["edges"].as_array().is_some_and(|e| e.is_empty()));
    }
}
