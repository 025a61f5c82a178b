//! Museboard Inference Boundary
//!
//! Defines the narrow contract between the orchestration core and the
//! remote inference service: the `InferenceService` trait, the error
//! taxonomy with retryability classification, the request/artifact wire
//! types, and a concrete HTTP/JSON client.
//!
//! The remote service is treated as opaque: every operation either returns
//! a typed payload or fails with a message-bearing error. Classification
//! into retryable / quota / credential-required / permanent happens here,
//! from HTTP status codes and message strings alone.

pub mod http;
pub mod service;
pub mod types;

pub use http::{HttpInferenceClient, InferenceClientConfig};
pub use service::InferenceService;
pub use types::{
    classify_message, parse_http_error, AttributeEdit, ClarificationAnswer, GeneratedAudio,
    GeneratedImage, GeneratedVideo, ImageRequest, InferenceError, InferenceResult, MusicRequest,
    RefineRequest, RelationshipEdit, SpeechRequest, VideoRequest, CREDENTIAL_MARKER,
};
