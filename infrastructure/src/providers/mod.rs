//! Language-model provider adapters.
//!
//! Each gateway owns model discovery and the working-model cache for its
//! provider and implements the `AnswerGateway` port.

pub mod gemini;
pub mod image;
pub mod openai;

pub use gemini::{GEMINI_API_BASE, GeminiGateway};
pub use image::{ImageFetcher, InlineImage};
pub use openai::{OPENAI_API_BASE, OpenAiGateway};

use serde_json::Value;

/// Pull the provider-reported message out of an error response body.
///
/// Both providers wrap errors as `{"error": {"message": ...}}`; anything
/// else collapses to a generic message.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "API request failed".to_string())
}
