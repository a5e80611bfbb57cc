//! TOML-file settings store.
//!
//! Persists the pipeline settings under their literal key names in one TOML
//! file. The two credential keys can be overridden by environment variables,
//! which take precedence over the file and are never written back.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use solver_application::ports::settings::{SettingsError, SettingsStore, keys};
use tracing::debug;

pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<toml::Table, SettingsError> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SettingsError::Read(e.to_string()))?;
        toml::from_str(&text).map_err(|e| SettingsError::Read(e.to_string()))
    }

    async fn store(&self, table: &toml::Table) -> Result<(), SettingsError> {
        let text =
            toml::to_string_pretty(table).map_err(|e| SettingsError::Write(e.to_string()))?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| SettingsError::Write(e.to_string()))
    }
}

/// Environment variable overriding a credential key, when set and non-empty.
fn env_override(key: &str) -> Option<String> {
    let var = match key {
        keys::OPENAI_API_KEY => "OPENAI_API_KEY",
        keys::GEMINI_API_KEY => "GEMINI_API_KEY",
        _ => return None,
    };
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

/// JSON to TOML; `null` has no TOML counterpart and maps to `None`.
fn json_to_toml(value: &Value) -> Option<toml::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(toml::Value::Integer)
            .or_else(|| n.as_f64().map(toml::Value::Float)),
        Value::String(s) => Some(toml::Value::String(s.clone())),
        Value::Array(items) => Some(toml::Value::Array(
            items.iter().filter_map(json_to_toml).collect(),
        )),
        Value::Object(map) => Some(toml::Value::Table(
            map.iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        if let Some(value) = env_override(key) {
            debug!("Settings key {} taken from environment", key);
            return Ok(Some(Value::String(value)));
        }
        Ok(self.load().await?.get(key).map(toml_to_json))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut table = self.load().await?;
        match json_to_toml(&value) {
            Some(value) => {
                table.insert(key.to_string(), value);
            }
            None => {
                table.remove(key);
            }
        }
        self.store(&table).await
    }
}
