//! Conversational tutoring. Unlike the assistant generators, mentor calls do
//! not degrade silently: a failed model call is surfaced to the client as a
//! server error. Empty-but-successful replies fall back to a friendly stock
//! line.

use anyhow::Result;
use tracing::info;

use crate::model_client::GenerativeProvider;
use crate::summarizer::truncate_chars;

/// Context passed to the contextual mentor is capped to this many characters.
pub const CONTEXT_CHARS: usize = 4_000;

const CHAT_FALLBACK: &str = "I'm here to help!";
const CONTEXTUAL_FALLBACK: &str = "Let's explore that together!";

#[derive(Clone)]
pub struct MentorService {
    provider: GenerativeProvider,
}

impl MentorService {
    pub fn new(provider: GenerativeProvider) -> Self {
        Self { provider }
    }

    /// General chat: friendly, plain-language tutoring answers.
    pub async fn chat(&self, message: &str) -> Result<String> {
        info!(message_length = message.len(), "Mentor chat request");
        let prompt = chat_prompt(message);
        let reply = self.provider.generate(&prompt).await?;
        Ok(or_fallback(reply, CHAT_FALLBACK))
    }

    /// Context-grounded chat, e.g. over a previously generated summary or
    /// the text of an uploaded document.
    pub async fn contextual(&self, message: &str, context: &str) -> Result<String> {
        info!(
            message_length = message.len(),
            context_length = context.len(),
            "Contextual mentor request"
        );
        let prompt = contextual_prompt(message, context);
        let reply = self.provider.generate(&prompt).await?;
        Ok(or_fallback(reply, CONTEXTUAL_FALLBACK))
    }
}

fn or_fallback(reply: String, fallback: &str) -> String {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn chat_prompt(message: &str) -> String {
    format!(
        "You are a friendly virtual mentor who helps students understand concepts. \
         Use short, clear, and supportive language. Avoid jargon unless explained simply.\n\n\
         Student: {message}\nMentor:"
    )
}

fn contextual_prompt(message: &str, context: &str) -> String {
    format!(
        "You are a helpful AI Mentor. Use the provided context to explain answers \
         in simple, educational terms.\n\n\
         Context:\n{}\n\nStudent: {}\nMentor:",
        truncate_chars(context, CONTEXT_CHARS),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_replies_get_stock_lines() {
        assert_eq!(or_fallback("  ".to_string(), CHAT_FALLBACK), CHAT_FALLBACK);
        assert_eq!(
            or_fallback("\n".to_string(), CONTEXTUAL_FALLBACK),
            CONTEXTUAL_FALLBACK
        );
        assert_eq!(
            or_fallback(" Try recursion. ".to_string(), CHAT_FALLBACK),
            "Try recursion."
        );
    }

    #[test]
    fn contextual_prompt_caps_context() {
        let context = "c".repeat(CONTEXT_CHARS * 3);
        let prompt = contextual_prompt("what is this?", &context);
        assert!(prompt.len() < CONTEXT_CHARS + 500);
    }
}
