//! Settings store port
//!
//! Key-value settings exposed as get/set by string key with JSON-serializable
//! values. The core consumes exactly three keys: the two provider credentials
//! and the UI-visibility flag.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// The settings keys consumed by the pipeline.
pub mod keys {
    /// Credential for the OpenAI provider.
    pub const OPENAI_API_KEY: &str = "openaiApiKey";
    /// Credential for the Gemini provider.
    pub const GEMINI_API_KEY: &str = "geminiApiKey";
    /// Governs visibility of the injected control and answer annotations.
    pub const SHOW_UI: &str = "showUI";
}

/// Errors raised by the settings store
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings read failed: {0}")]
    Read(String),

    #[error("Settings write failed: {0}")]
    Write(String),
}

/// Key-value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Fetch one value; `None` when the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    /// Store one value.
    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    /// Fetch a string value; non-string values count as unset.
    async fn get_string(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    /// Fetch a boolean value; non-boolean values count as unset.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>, SettingsError> {
        Ok(self.get(key).await?.and_then(|v| v.as_bool()))
    }
}
