//! Generation Dispatcher
//!
//! Selects exactly one remote generation call for the session's modality,
//! wraps it in the generation retry policy, and prepends the result to the
//! history if the generation epoch is still current. Failures are scoped to
//! the modality that produced them, except the credential-required
//! condition, which sets a dedicated session-wide flag: retrying cannot
//! help until the user supplies a billing-enabled credential.

use futures_util::future::join_all;
use tracing::{debug, warn};

use museboard_core::{AudioMode, Modality};
use museboard_inference::{
    ImageRequest, InferenceError, InferenceResult, MusicRequest, SpeechRequest, VideoRequest,
};

use super::StudioService;
use crate::config::IMAGE_COMPLETION_ROUNDS;
use crate::models::generation::{GenerationBatch, GenerationItem};
use crate::models::settings::ImageSettings;
use crate::services::progress::ProgressSink;
use crate::services::retry::execute_with_retry;

impl StudioService {
    /// Run one generation action under a fresh generation epoch.
    pub(super) async fn run_generation(&self, prompt: &str, modality: Modality) {
        let token = self.registry.bump_generation(modality);
        debug!(epoch = token.value, %modality, "generation started");

        let settings = {
            let mut state = self.state.write().await;
            state.generating = true;
            state.generation_errors.remove(&modality);
            state.settings.clone()
        };

        let gated = self.progress.gated(self.registry.clone(), token);

        let result: InferenceResult<Vec<GenerationItem>> = if modality.is_image_kind() {
            self.generate_images_best_effort(prompt, modality, &settings.image, &gated)
                .await
        } else if modality.is_text_kind() {
            execute_with_retry(
                "text generation",
                &self.config.generation_retry,
                &gated,
                |_| self.inference.generate_text(prompt, modality),
            )
            .await
            .map(|content| vec![GenerationItem::text(content)])
        } else if modality.is_video_kind() {
            let request = VideoRequest {
                prompt: prompt.to_string(),
                resolution: settings.video.resolution.clone(),
                aspect_ratio: settings.video.aspect_ratio.clone(),
                multiframe: modality == Modality::VideoMultiframe,
            };
            gated.report("waiting for video encode");
            execute_with_retry(
                "video generation",
                &self.config.generation_retry,
                &gated,
                |_| self.inference.generate_video(request.clone()),
            )
            .await
            .map(|video| vec![GenerationItem::video(video)])
        } else {
            match settings.audio.mode {
                AudioMode::Speech => {
                    let request = SpeechRequest {
                        prompt: prompt.to_string(),
                        voice: settings.audio.voice.clone(),
                    };
                    execute_with_retry(
                        "speech generation",
                        &self.config.generation_retry,
                        &gated,
                        |_| self.inference.generate_speech(request.clone()),
                    )
                    .await
                }
                AudioMode::Music => {
                    let request = MusicRequest {
                        prompt: prompt.to_string(),
                    };
                    execute_with_retry(
                        "music generation",
                        &self.config.generation_retry,
                        &gated,
                        |_| self.inference.generate_music(request.clone()),
                    )
                    .await
                }
            }
            .map(|audio| vec![GenerationItem::audio(audio)])
        };

        let mut state = self.state.write().await;
        if !self.registry.is_current(&token) {
            debug!(epoch = token.value, %modality, "stale generation discarded");
            return;
        }
        state.generating = false;

        match result {
            Ok(items) => {
                debug!(epoch = token.value, %modality, items = items.len(), "generation published");
                state
                    .history
                    .insert(0, GenerationBatch::new(prompt, modality, items));
            }
            Err(err) if err.is_credential() => {
                warn!(%modality, "generation requires a billing-enabled credential");
                state.requires_credential = true;
            }
            Err(err) => {
                warn!(%modality, error = %err, "generation failed");
                state.generation_errors.insert(modality, err.to_string());
            }
        }
    }

    /// Best-effort image completion.
    ///
    /// The caller wants N images but each underlying attempt independently
    /// yields zero or one. Round 1 issues N parallel attempts; round 2
    /// requests only the shortfall. Partial success is success; zero images
    /// after both rounds is a failure carrying the last error seen.
    pub(super) async fn generate_images_best_effort(
        &self,
        prompt: &str,
        modality: Modality,
        settings: &ImageSettings,
        progress: &ProgressSink,
    ) -> InferenceResult<Vec<GenerationItem>> {
        let requested = settings.count.max(1) as usize;
        let request = ImageRequest {
            prompt: prompt.to_string(),
            size: settings.size.clone(),
            style: settings.style.clone(),
            reference_images: if modality == Modality::ImageToImage {
                settings.reference_images.clone()
            } else {
                Vec::new()
            },
        };

        let mut items: Vec<GenerationItem> = Vec::with_capacity(requested);
        let mut last_error: Option<InferenceError> = None;

        for round in 0..IMAGE_COMPLETION_ROUNDS {
            let shortfall = requested - items.len();
            if shortfall == 0 {
                break;
            }
            if round > 0 {
                progress.report(&format!(
                    "retrying {} of {} images that did not come back",
                    shortfall, requested
                ));
            }

            let attempts = (0..shortfall).map(|_| {
                execute_with_retry(
                    "image generation",
                    &self.config.generation_retry,
                    progress,
                    |_| self.inference.generate_image(request.clone()),
                )
            });

            for outcome in join_all(attempts).await {
                match outcome {
                    Ok(Some(image)) => items.push(GenerationItem::image(image)),
                    // An empty attempt is not an error; the shortfall round
                    // compensates.
                    Ok(None) => {}
                    Err(err) if err.is_credential() => return Err(err),
                    Err(err) => last_error = Some(err),
                }
            }
        }

        if items.is_empty() {
            Err(last_error.unwrap_or(InferenceError::Other {
                message: format!("no images were produced for {} attempts", requested),
            }))
        } else {
            if items.len() < requested {
                debug!(
                    produced = items.len(),
                    requested, "accepting partial image batch"
                );
            }
            Ok(items)
        }
    }
}
