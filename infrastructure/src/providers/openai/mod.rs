//! OpenAI gateway.
//!
//! Keeps a fixed list of known chat models, enriched per call by a
//! best-effort listing of the account's `gpt-*` models, and remembers the
//! last model that answered.

pub mod types;

use async_trait::async_trait;
use solver_application::ports::answer_gateway::{AnswerGateway, GatewayError};
use solver_domain::{ImageRef, ProviderKind};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::api_error_message;
use super::image::ImageFetcher;
use types::{ChatRequest, ChatResponse, ContentPart, ImageUrl, Message, ModelList};

pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Known chat models, most capable first.
const DEFAULT_MODELS: [&str; 6] = [
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-16k",
];

const TEMPERATURE: f32 = 0.7;

enum Attempt {
    Answered(String),
    Refused(String),
}

pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
    fetcher: ImageFetcher,
    working: Mutex<Option<String>>,
}

impl OpenAiGateway {
    pub fn new() -> Self {
        Self::with_base_url(OPENAI_API_BASE)
    }

    /// Point the gateway at a different host. Used by tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::new();
        Self {
            fetcher: ImageFetcher::new(client.clone()),
            client,
            base_url: base_url.into(),
            working: Mutex::new(None),
        }
    }

    /// Candidate models for this call: the account's `gpt-*` models (sorted)
    /// first, then the defaults that were not already listed. Listing may be
    /// forbidden for some keys, in which case only the defaults are used.
    async fn candidate_models(&self, api_key: &str) -> Vec<String> {
        let defaults: Vec<String> = DEFAULT_MODELS.iter().map(|m| m.to_string()).collect();

        let url = format!("{}/v1/models", self.base_url);
        let response = match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not fetch OpenAI model list, using defaults: {}", e);
                return defaults;
            }
        };
        if !response.status().is_success() {
            warn!(
                "OpenAI model listing returned {}, using defaults",
                response.status()
            );
            return defaults;
        }
        let listing: ModelList = match response.json().await {
            Ok(l) => l,
            Err(e) => {
                warn!("Failed to decode OpenAI model list, using defaults: {}", e);
                return defaults;
            }
        };

        let mut models: Vec<String> = listing
            .data
            .into_iter()
            .map(|m| m.id)
            .filter(|id| id.starts_with("gpt-"))
            .collect();
        models.sort();
        info!("Found {} OpenAI models", models.len());

        for name in defaults {
            if !models.contains(&name) {
                models.push(name);
            }
        }
        models
    }

    async fn build_content(&self, prompt: &str, images: &[ImageRef]) -> Vec<ContentPart> {
        let mut content = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        for image in images {
            let inline = self.fetcher.inline(image).await;
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: inline.data_uri(),
                },
            });
        }
        content
    }

    async fn try_model(
        &self,
        api_key: &str,
        model: &str,
        content: &[ContentPart],
    ) -> Result<Attempt, GatewayError> {
        debug!("Trying OpenAI model: {}", model);
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user",
                content: content.to_vec(),
            }],
            temperature: TEMPERATURE,
        };
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::Refused(api_error_message(&body)));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        let answer = data
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(|text| text.trim().to_string())
            .ok_or_else(|| {
                GatewayError::MalformedResponse("response carried no message content".to_string())
            })?;
        Ok(Attempt::Answered(answer))
    }
}

impl Default for OpenAiGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerGateway for OpenAiGateway {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn answer(
        &self,
        api_key: &str,
        prompt: &str,
        images: &[ImageRef],
    ) -> Result<String, GatewayError> {
        let content = self.build_content(prompt, images).await;

        let cached = self.working.lock().await.clone();
        if let Some(model) = cached {
            match self.try_model(api_key, &model, &content).await? {
                Attempt::Answered(answer) => return Ok(answer),
                Attempt::Refused(message) => {
                    warn!(
                        "Cached OpenAI model {} failed ({}), trying others",
                        model, message
                    );
                    *self.working.lock().await = None;
                }
            }
        }

        let models = self.candidate_models(api_key).await;
        let mut last_error = None;

        for model in &models {
            match self.try_model(api_key, model, &content).await? {
                Attempt::Answered(answer) => {
                    info!("Cached working OpenAI model: {}", model);
                    *self.working.lock().await = Some(model.clone());
                    return Ok(answer);
                }
                Attempt::Refused(message) => {
                    warn!("OpenAI model {} failed: {}", model, message);
                    last_error = Some(message);
                }
            }
        }

        *self.working.lock().await = None;
        Err(GatewayError::AllModelsFailed {
            provider: ProviderKind::OpenAi.display_name().to_string(),
            message: last_error.unwrap_or_else(|| "no models available".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn answer_body(text: &str) -> serde_json::Value {
        json!({
            "choices": [
                {"message": {"role": "assistant", "content": text}}
            ]
        })
    }

    #[tokio::test]
    async fn test_sends_bearer_auth_and_extracts_answer() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1/models"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::header("authorization", "Bearer sk-test"))
            .and(matchers::body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("  Paris  ")))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        let answer = gateway
            .answer("sk-test", "Capital of France?", &[])
            .await
            .unwrap();
        assert_eq!(answer, "Paris");
    }

    #[tokio::test]
    async fn test_walks_candidate_list_and_caches_the_survivor() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1/models"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"error": {"message": "model not found"}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("ok")))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        assert_eq!(gateway.answer("k", "q1", &[]).await.unwrap(), "ok");
        // Second call goes straight to the cached model, no listing traffic.
        assert_eq!(gateway.answer("k", "q2", &[]).await.unwrap(), "ok");

        server.verify().await;
    }

    #[tokio::test]
    async fn test_failed_cached_model_is_not_retried_alone() {
        let server = MockServer::start().await;

        // Listing runs on both calls; the cached-model attempt precedes it.
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1/models"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;
        // gpt-4o answers once, then starts refusing.
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("first")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        // Hit exactly twice on the second call: the cached-model attempt and
        // the candidate walk; never a second lone retry of the cached model.
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"error": {"message": "model retired"}}"#),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("second")))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        assert_eq!(gateway.answer("k", "q1", &[]).await.unwrap(), "first");
        assert_eq!(gateway.answer("k", "q2", &[]).await.unwrap(), "second");

        server.verify().await;
    }

    #[tokio::test]
    async fn test_discovered_models_are_tried_before_defaults() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "gpt-zzz"},
                    {"id": "text-davinci-003"},
                    {"id": "gpt-aaa"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({"model": "gpt-aaa"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("first")))
            .expect(1)
            .mount(&server)
            .await;
        // The defaults would only be reached after every discovered model.
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("late")))
            .expect(0)
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        assert_eq!(gateway.answer("k", "q", &[]).await.unwrap(), "first");

        server.verify().await;
    }

    #[tokio::test]
    async fn test_total_failure_reports_last_error() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"error": {"message": "Invalid API key"}}"#),
            )
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        let error = gateway.answer("bad", "q", &[]).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "All OpenAI models failed. Last error: Invalid API key"
        );
    }

    #[tokio::test]
    async fn test_inline_image_becomes_data_uri() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_string_contains("data:image/png;base64,aGk="))
            .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("France")))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = OpenAiGateway::with_base_url(server.uri());
        let images = [ImageRef::inline("image/png", "aGk=")];
        let answer = gateway.answer("k", "Which flag?", &images).await.unwrap();
        assert_eq!(answer, "France");
    }
}
