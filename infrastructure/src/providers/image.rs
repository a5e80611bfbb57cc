//! Image payload resolution.
//!
//! Remote image references are fetched and base64-encoded before a provider
//! call. Fetching is best effort: when a download fails the raw URL is kept
//! as the payload so the provider call still goes out.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::CONTENT_TYPE;
use solver_domain::ImageRef;
use tracing::{debug, warn};

/// Fallback MIME type when the origin does not declare one.
const DEFAULT_MIME: &str = "image/jpeg";

/// A provider-ready image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Render as a `data:` URI, the shape OpenAI expects.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Downloads remote images and encodes them for inline transport.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Resolve one image reference to an inline payload.
    pub async fn inline(&self, image: &ImageRef) -> InlineImage {
        match image {
            ImageRef::Inline { mime_type, data } => InlineImage {
                mime_type: mime_type.clone(),
                data: data.clone(),
            },
            ImageRef::Remote { url } => match self.fetch(url).await {
                Ok(inline) => inline,
                Err(e) => {
                    warn!("Failed to convert image to base64, using URL: {}", e);
                    InlineImage {
                        mime_type: DEFAULT_MIME.to_string(),
                        data: url.clone(),
                    }
                }
            },
        }
    }

    async fn fetch(&self, url: &str) -> Result<InlineImage, reqwest::Error> {
        debug!("Fetching image: {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
            .unwrap_or_else(|| DEFAULT_MIME.to_string());
        let bytes = response.bytes().await?;
        Ok(InlineImage {
            mime_type,
            data: BASE64.encode(&bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[tokio::test]
    async fn test_inline_passes_through_untouched() {
        let fetcher = ImageFetcher::new(reqwest::Client::new());
        let image = ImageRef::inline("image/png", "aGVsbG8=");

        let inline = fetcher.inline(&image).await;
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "aGVsbG8=");
        assert_eq!(inline.data_uri(), "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn test_remote_is_fetched_and_encoded() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/cat.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(b"hi".to_vec()),
            )
            .mount(&server)
            .await;

        let fetcher = ImageFetcher::new(reqwest::Client::new());
        let image = ImageRef::remote(format!("{}/cat.png", server.uri()));

        let inline = fetcher.inline(&image).await;
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "aGk=");
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_raw_url() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing.png", server.uri());
        let fetcher = ImageFetcher::new(reqwest::Client::new());

        let inline = fetcher.inline(&ImageRef::remote(url.clone())).await;
        assert_eq!(inline.mime_type, "image/jpeg");
        assert_eq!(inline.data, url);
    }
}
