//! Inference Service Trait
//!
//! The narrow contract the orchestration core holds against the remote
//! inference service. Implementations: `HttpInferenceClient` for the real
//! backend, scripted mocks in the orchestrator's tests.

use async_trait::async_trait;

use museboard_core::{BeliefModel, Clarification, Modality};

use crate::types::{
    GeneratedAudio, GeneratedImage, GeneratedVideo, ImageRequest, InferenceResult, MusicRequest,
    RefineRequest, SpeechRequest, VideoRequest,
};

/// Remote inference operations.
///
/// Every method is a slow, fallible network call. Implementations must not
/// retry internally; retry/backoff policy belongs to the orchestration
/// layer so it can interleave with staleness checks and progress reporting.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Returns the service name for logging.
    fn name(&self) -> &'static str;

    /// Parse a prompt into a structured belief model for the given modality.
    async fn parse_structure(
        &self,
        prompt: &str,
        modality: Modality,
    ) -> InferenceResult<BeliefModel>;

    /// Generate clarifying questions for a prompt, excluding questions the
    /// user has already answered or skipped this session.
    async fn generate_clarifications(
        &self,
        prompt: &str,
        excluded: &[String],
        modality: Modality,
    ) -> InferenceResult<Vec<Clarification>>;

    /// Fold clarification answers and structural edits into a refined
    /// prompt. Returns the refined prompt text.
    async fn refine(&self, request: RefineRequest) -> InferenceResult<String>;

    /// One best-effort image attempt. May legitimately produce no image;
    /// the orchestrator compensates with additional attempts.
    async fn generate_image(
        &self,
        request: ImageRequest,
    ) -> InferenceResult<Option<GeneratedImage>>;

    /// Generate a story or comic script as a single text artifact.
    async fn generate_text(&self, prompt: &str, modality: Modality) -> InferenceResult<String>;

    /// Generate a video asset.
    async fn generate_video(&self, request: VideoRequest) -> InferenceResult<GeneratedVideo>;

    /// Generate narrated speech.
    async fn generate_speech(&self, request: SpeechRequest) -> InferenceResult<GeneratedAudio>;

    /// Generate a music asset.
    async fn generate_music(&self, request: MusicRequest) -> InferenceResult<GeneratedAudio>;

    /// Check that the service is reachable.
    async fn health_check(&self) -> InferenceResult<()> {
        Ok(())
    }
}
