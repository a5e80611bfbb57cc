//! Gemini gateway.
//!
//! Discovers callable models from the live API (v1 first, then v1beta),
//! remembers the last model that answered, and walks the candidate list when
//! the remembered one stops working.

pub mod types;

use async_trait::async_trait;
use solver_application::ports::answer_gateway::{AnswerGateway, GatewayError};
use solver_domain::{ApiVersion, GeminiModel, ImageRef, ProviderKind};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::api_error_message;
use super::image::ImageFetcher;
use types::{
    Content, GenerateRequest, GenerateResponse, InlineDataPart, ListModelsResponse, Part,
};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Used when live discovery fails on every API version. Deliberately not
/// cached, so discovery is retried on the next call.
fn fallback_models() -> Vec<GeminiModel> {
    vec![
        GeminiModel::new("gemini-1.5-flash", ApiVersion::V1),
        GeminiModel::new("gemini-1.5-pro", ApiVersion::V1),
    ]
}

/// One model attempt: the model either answered or refused with a message.
/// Transport and decode failures are not attempts and abort the whole call.
enum Attempt {
    Answered(String),
    Refused(String),
}

pub struct GeminiGateway {
    client: reqwest::Client,
    base_url: String,
    fetcher: ImageFetcher,
    working: Mutex<Option<GeminiModel>>,
    discovered: Mutex<Option<Vec<GeminiModel>>>,
}

impl GeminiGateway {
    pub fn new() -> Self {
        Self::with_base_url(GEMINI_API_BASE)
    }

    /// Point the gateway at a different host. Used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::new();
        Self {
            fetcher: ImageFetcher::new(client.clone()),
            client,
            base_url: base_url.into(),
            working: Mutex::new(None),
            discovered: Mutex::new(None),
        }
    }

    /// List models supporting `generateContent`, preferring the stable API
    /// version. A successful listing is cached; the fallback list is not.
    async fn candidate_models(&self, api_key: &str) -> Vec<GeminiModel> {
        if let Some(models) = self.discovered.lock().await.clone() {
            debug!("Using cached Gemini model list ({} models)", models.len());
            return models;
        }

        for version in ApiVersion::ALL {
            let url = format!("{}/{}/models?key={}", self.base_url, version, api_key);
            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("Failed to list models from {}: {}", version, e);
                    continue;
                }
            };
            if !response.status().is_success() {
                warn!(
                    "Model listing from {} returned {}",
                    version,
                    response.status()
                );
                continue;
            }
            let listing: ListModelsResponse = match response.json().await {
                Ok(l) => l,
                Err(e) => {
                    warn!("Failed to decode model listing from {}: {}", version, e);
                    continue;
                }
            };

            let models: Vec<GeminiModel> = listing
                .models
                .into_iter()
                .filter(|m| {
                    m.supported_generation_methods
                        .iter()
                        .any(|method| method == "generateContent")
                })
                .map(|m| {
                    let name = m.name.rsplit('/').next().unwrap_or_default().to_string();
                    GeminiModel::new(name, version)
                })
                .collect();

            info!("Found {} supported Gemini models ({})", models.len(), version);
            *self.discovered.lock().await = Some(models.clone());
            return models;
        }

        warn!("Could not fetch Gemini model list, using fallback models");
        fallback_models()
    }

    async fn build_parts(&self, prompt: &str, images: &[ImageRef]) -> Vec<Part> {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        for image in images {
            let inline = self.fetcher.inline(image).await;
            parts.push(Part::InlineData {
                inline_data: InlineDataPart {
                    mime_type: inline.mime_type,
                    data: inline.data,
                },
            });
        }
        parts
    }

    async fn try_model(
        &self,
        api_key: &str,
        model: &GeminiModel,
        parts: &[Part],
    ) -> Result<Attempt, GatewayError> {
        let url = format!(
            "{}/{}/models/{}:generateContent?key={}",
            self.base_url, model.version, model.name, api_key
        );
        debug!("Trying Gemini model: {}", model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: parts.to_vec(),
            }],
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Refused(api_error_message(&body)));
        }

        let data: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let answer = data
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| {
                GatewayError::MalformedResponse("response carried no candidate text".to_string())
            })?;
        Ok(Attempt::Answered(answer))
    }
}

impl Default for GeminiGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerGateway for GeminiGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn answer(
        &self,
        api_key: &str,
        prompt: &str,
        images: &[ImageRef],
    ) -> Result<String, GatewayError> {
        let parts = self.build_parts(prompt, images).await;

        // The remembered model is tried alone before any discovery traffic.
        let cached = self.working.lock().await.clone();
        if let Some(model) = cached {
            match self.try_model(api_key, &model, &parts).await? {
                Attempt::Answered(answer) => return Ok(answer),
                Attempt::Refused(message) => {
                    warn!("Cached model {} failed ({}), trying others", model, message);
                    *self.working.lock().await = None;
                }
            }
        }

        let models = self.candidate_models(api_key).await;
        let mut last_error = None;

        for model in &models {
            match self.try_model(api_key, model, &parts).await? {
                Attempt::Answered(answer) => {
                    info!("Cached working Gemini model: {}", model);
                    *self.working.lock().await = Some(model.clone());
                    return Ok(answer);
                }
                Attempt::Refused(message) => {
                    warn!("Gemini model {} failed: {}", model, message);
                    last_error = Some(message);
                }
            }
        }

        // Full miss: drop both caches so the next call rediscovers.
        *self.working.lock().await = None;
        *self.discovered.lock().await = None;
        Err(GatewayError::AllModelsFailed {
            provider: ProviderKind::Gemini.display_name().to_string(),
            message: last_error.unwrap_or_else(|| "no models available".to_string()),
        })
    }
}
