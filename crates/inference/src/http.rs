//! HTTP Inference Client
//!
//! Concrete `InferenceService` implementation over a JSON HTTP API. Each
//! logical operation maps to one endpoint; responses carry either the typed
//! payload or an error body that is classified into the taxonomy by status
//! code and message string.

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use museboard_core::{BeliefModel, Clarification, Modality};

use crate::service::InferenceService;
use crate::types::{
    classify_message, parse_http_error, GeneratedAudio, GeneratedImage, GeneratedVideo,
    ImageRequest, InferenceError, InferenceResult, MusicRequest, RefineRequest, SpeechRequest,
    VideoRequest,
};

/// Default request timeout. Generation calls can be slow; retries and
/// cancellation-by-staleness live above this layer.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the HTTP inference client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceClientConfig {
    /// Base URL of the inference API, without a trailing slash.
    pub base_url: String,
    /// API key sent as a bearer token, if the backend requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for InferenceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// JSON HTTP implementation of `InferenceService`.
pub struct HttpInferenceClient {
    client: reqwest::Client,
    config: InferenceClientConfig,
}

impl HttpInferenceClient {
    pub fn new(config: InferenceClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and decode a JSON response, classifying failures.
    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> InferenceResult<Resp> {
        let url = self.endpoint(path);
        debug!(url = %url, "inference request");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                InferenceError::Network {
                    message: e.to_string(),
                }
            } else {
                // Transport errors without a status code still carry a
                // classifiable message (proxy resets, mid-body drops).
                classify_message(&e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| InferenceError::Network {
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(parse_http_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| InferenceError::Parse {
            message: format!("{} response: {}", path, e),
        })
    }
}

/// Decode a base64 media payload, surfacing decode failures as parse errors.
fn decode_media(data: &str, context: &str) -> InferenceResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| InferenceError::Parse {
            message: format!("{}: invalid base64 payload: {}", context, e),
        })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ParseRequestBody<'a> {
    prompt: &'a str,
    modality: Modality,
}

#[derive(Debug, Serialize)]
struct ClarifyRequestBody<'a> {
    prompt: &'a str,
    excluded: &'a [String],
    modality: Modality,
}

#[derive(Debug, Deserialize)]
struct ClarifyResponseBody {
    #[serde(default)]
    clarifications: Vec<Clarification>,
}

#[derive(Debug, Deserialize)]
struct RefineResponseBody {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct MediaPayload {
    /// Base64-encoded asset bytes.
    data: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ImageResponseBody {
    #[serde(default)]
    images: Vec<MediaPayload>,
}

#[derive(Debug, Serialize)]
struct TextRequestBody<'a> {
    prompt: &'a str,
    modality: Modality,
}

#[derive(Debug, Deserialize)]
struct TextResponseBody {
    content: String,
}

#[derive(Debug, Deserialize)]
struct MediaResponseBody {
    asset: MediaPayload,
}

// ---------------------------------------------------------------------------
// Trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl InferenceService for HttpInferenceClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn parse_structure(
        &self,
        prompt: &str,
        modality: Modality,
    ) -> InferenceResult<BeliefModel> {
        self.post_json("v1/parse", &ParseRequestBody { prompt, modality })
            .await
    }

    async fn generate_clarifications(
        &self,
        prompt: &str,
        excluded: &[String],
        modality: Modality,
    ) -> InferenceResult<Vec<Clarification>> {
        let body: ClarifyResponseBody = self
            .post_json(
                "v1/clarify",
                &ClarifyRequestBody {
                    prompt,
                    excluded,
                    modality,
                },
            )
            .await?;
        Ok(body.clarifications)
    }

    async fn refine(&self, request: RefineRequest) -> InferenceResult<String> {
        let body: RefineResponseBody = self.post_json("v1/refine", &request).await?;
        Ok(body.prompt)
    }

    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> InferenceResult<Option<GeneratedImage>> {
        let body: ImageResponseBody = self.post_json("v1/images", &request).await?;
        match body.images.into_iter().next() {
            Some(payload) => Ok(Some(GeneratedImage {
                data: decode_media(&payload.data, "image")?,
                mime_type: payload.mime_type,
            })),
            None => Ok(None),
        }
    }

    async fn generate_text(&self, prompt: &str, modality: Modality) -> InferenceResult<String> {
        let body: TextResponseBody = self
            .post_json("v1/text", &TextRequestBody { prompt, modality })
            .await?;
        Ok(body.content)
    }

    async fn generate_video(&self, request: VideoRequest) -> InferenceResult<GeneratedVideo> {
        let body: MediaResponseBody = self.post_json("v1/videos", &request).await?;
        Ok(GeneratedVideo {
            data: decode_media(&body.asset.data, "video")?,
            mime_type: body.asset.mime_type,
        })
    }

    async fn generate_speech(&self, request: SpeechRequest) -> InferenceResult<GeneratedAudio> {
        let body: MediaResponseBody = self.post_json("v1/speech", &request).await?;
        Ok(GeneratedAudio {
            data: decode_media(&body.asset.data, "speech")?,
            mime_type: body.asset.mime_type,
        })
    }

    async fn generate_music(&self, request: MusicRequest) -> InferenceResult<GeneratedAudio> {
        let body: MediaResponseBody = self.post_json("v1/music", &request).await?;
        Ok(GeneratedAudio {
            data: decode_media(&body.asset.data, "music")?,
            mime_type: body.asset.mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let client = HttpInferenceClient::new(InferenceClientConfig {
            base_url: "https://api.example.com/".into(),
            ..Default::default()
        });
        assert_eq!(client.endpoint("v1/parse"), "https://api.example.com/v1/parse");
    }

    #[test]
    fn test_decode_media_rejects_bad_base64() {
        let err = decode_media("not-base64!!", "image").unwrap_err();
        assert!(matches!(err, InferenceError::Parse { .. }));

        let ok = decode_media("aGVsbG8=", "image").unwrap();
        assert_eq!(ok, b"hello");
    }

    #[test]
    fn test_image_response_decoding() {
        let body: ImageResponseBody = serde_json::from_str(
            r#"{"images":[{"data":"aGVsbG8=","mime_type":"image/png"}]}"#,
        )
        .unwrap();
        assert_eq!(body.images.len(), 1);
        assert_eq!(body.images[0].mime_type, "image/png");

        // An attempt may legitimately come back empty.
        let empty: ImageResponseBody = serde_json::from_str(r#"{"images":[]}"#).unwrap();
        assert!(empty.images.is_empty());
    }

    #[test]
    fn test_refine_request_serialization() {
        let request = RefineRequest {
            prompt: "a dog in a park".into(),
            answers: vec![crate::types::ClarificationAnswer {
                question: "What breed?".into(),
                answer: "corgi".into(),
            }],
            attribute_edits: vec![crate::types::AttributeEdit {
                entity: "Dog".into(),
                attribute: "existence".into(),
                value: "false".into(),
            }],
            relationship_edits: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["prompt"], "a dog in a park");
        assert_eq!(json["attribute_edits"][0]["value"], "false");
    }
}
