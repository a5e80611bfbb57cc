//! Answer gateway port
//!
//! Defines the interface for obtaining one plain-text answer from a language
//! model provider. Implementations (adapters) live in the infrastructure
//! layer and own model discovery, caching and candidate fallback internally.

use async_trait::async_trait;
use solver_domain::{ImageRef, ProviderKind};
use thiserror::Error;

/// Errors that can occur during a provider call
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every candidate model was tried and failed; carries the last error.
    #[error("All {provider} models failed. Last error: {message}")]
    AllModelsFailed { provider: String, message: String },
}

impl GatewayError {
    /// The provider's reported error text, or the transport error message.
    pub fn message(&self) -> &str {
        match self {
            GatewayError::Network(m)
            | GatewayError::RequestFailed(m)
            | GatewayError::MalformedResponse(m)
            | GatewayError::AllModelsFailed { message: m, .. } => m,
        }
    }
}

/// Gateway to one language-model provider.
///
/// A call resolves a concrete model internally (preferring the last known
/// working one) and returns the extracted answer text. It only fails once
/// every candidate model has been exhausted.
#[async_trait]
pub trait AnswerGateway: Send + Sync {
    /// Which provider this gateway talks to.
    fn provider(&self) -> ProviderKind;

    /// Ask one question, with any attached images, and return the answer text.
    async fn answer(
        &self,
        api_key: &str,
        prompt: &str,
        images: &[ImageRef],
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_failed_display() {
        let error = GatewayError::AllModelsFailed {
            provider: "Gemini".to_string(),
            message: "quota exceeded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "All Gemini models failed. Last error: quota exceeded"
        );
    }

    #[test]
    fn test_message_accessor() {
        let error = GatewayError::RequestFailed("bad key".to_string());
        assert_eq!(error.message(), "bad key");
    }
}
