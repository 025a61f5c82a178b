//! Studio Service
//!
//! The orchestration facade the presentation layer talks to. Every user
//! action enters here, bumps the relevant epoch(s), and dispatches the
//! analysis pipeline and/or the generation dispatcher; every completion
//! re-checks its epoch token before touching session state.
//!
//! The service is `Send + Sync` and safe to share behind an `Arc`; all
//! mutation happens under the session lock with no suspension point between
//! the currentness check and the write.

mod analysis;
mod generation;
mod refinement;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use museboard_core::{BeliefModel, Clarification, Entity, Modality};
use museboard_inference::InferenceService;

use crate::config::StudioConfig;
use crate::models::generation::GenerationBatch;
use crate::models::session::SessionState;
use crate::models::settings::{AudioSettings, GenerationSettings, ImageSettings, VideoSettings};
use crate::services::epoch::EpochRegistry;
use crate::services::progress::ProgressSink;
use crate::utils::error::{AppError, AppResult};

/// Orchestration facade for one user session.
pub struct StudioService {
    inference: Arc<dyn InferenceService>,
    registry: Arc<EpochRegistry>,
    state: RwLock<SessionState>,
    config: StudioConfig,
    progress: ProgressSink,
}

impl StudioService {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        config: StudioConfig,
        progress: ProgressSink,
    ) -> Self {
        Self::with_modality(inference, config, progress, Modality::Image)
    }

    pub fn with_modality(
        inference: Arc<dyn InferenceService>,
        config: StudioConfig,
        progress: ProgressSink,
        modality: Modality,
    ) -> Self {
        Self {
            inference,
            registry: Arc::new(EpochRegistry::new(modality)),
            state: RwLock::new(SessionState::new(modality)),
            config,
            progress,
        }
    }

    // -----------------------------------------------------------------
    // Facade entry points
    // -----------------------------------------------------------------

    /// Submit a prompt: analyze it (unless this exact prompt/modality pair
    /// was already analyzed) and generate content, concurrently.
    pub async fn submit(&self, prompt: &str) -> AppResult<()> {
        let prompt = validated_prompt(prompt)?;
        let modality = self.registry.modality();

        let needs_analysis = {
            let mut state = self.state.write().await;
            state.prompt = prompt.clone();
            !state.is_analyzed(&prompt, modality)
        };
        info!(%modality, needs_analysis, "submit");

        tokio::join!(
            async {
                if needs_analysis {
                    self.run_analysis(&prompt, modality).await;
                }
            },
            self.run_generation(&prompt, modality),
        );
        Ok(())
    }

    /// Analyze a prompt without triggering generation.
    pub async fn analyze_only(&self, prompt: &str) -> AppResult<()> {
        let prompt = validated_prompt(prompt)?;
        let modality = self.registry.modality();
        self.state.write().await.prompt = prompt.clone();
        self.run_analysis(&prompt, modality).await;
        Ok(())
    }

    /// Switch the target modality. Clears the outgoing modality's error
    /// slot and re-analyzes the current prompt for the new modality if it
    /// has not been analyzed yet. Work in flight for the old modality keeps
    /// running but can no longer publish.
    pub async fn change_modality(&self, modality: Modality) -> AppResult<()> {
        let previous = self.registry.modality();
        if previous == modality {
            return Ok(());
        }
        info!(from = %previous, to = %modality, "modality change");
        self.registry.set_modality(modality);

        let (prompt, needs_analysis) = {
            let mut state = self.state.write().await;
            state.modality = modality;
            state.generation_errors.remove(&previous);
            let prompt = state.prompt.clone();
            let needs = !prompt.is_empty() && !state.is_analyzed(&prompt, modality);
            (prompt, needs)
        };

        if needs_analysis {
            self.run_analysis(&prompt, modality).await;
        }
        Ok(())
    }

    /// Re-run only the clarification branch against the current excluded
    /// list, under a fresh analysis epoch.
    pub async fn refresh_clarifications(&self) -> AppResult<()> {
        let modality = self.registry.modality();
        let prompt = self.state.read().await.prompt.clone();
        if prompt.is_empty() {
            return Err(AppError::validation("no prompt to refresh clarifications for"));
        }
        self.run_clarifications_only(&prompt, modality).await;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Pending-update accumulator
    // -----------------------------------------------------------------

    pub async fn record_attribute_edit(&self, entity: &str, attribute: &str, value: &str) {
        self.state
            .write()
            .await
            .pending
            .record_attribute_edit(entity, attribute, value);
    }

    pub async fn record_relationship_edit(&self, source: &str, target: &str, label: &str) {
        self.state
            .write()
            .await
            .pending
            .record_relationship_edit(source, target, label);
    }

    pub async fn record_clarification_answer(&self, question: &str, answer: &str) {
        self.state
            .write()
            .await
            .pending
            .record_clarification_answer(question, answer);
    }

    /// Dismiss the current clarification batch: its questions move to the
    /// skipped list and are never asked again this session.
    pub async fn skip_clarifications(&self) {
        let mut state = self.state.write().await;
        let questions: Vec<String> = state
            .clarifications
            .drain(..)
            .map(|c| c.question)
            .collect();
        for question in questions {
            if !state.skipped_questions.contains(&question) {
                state.skipped_questions.push(question);
            }
        }
    }

    /// Append a user-created entity to the belief model without a remote
    /// round trip.
    pub async fn add_entity(&self, name: &str, description: &str) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("entity name must not be empty"));
        }
        let mut state = self.state.write().await;
        let model = state.belief_model.get_or_insert_with(BeliefModel::new);
        model.try_add_entity(
            Entity::new(name)
                .with_description(description)
                .with_explicit(false),
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------

    pub async fn set_image_settings(&self, settings: ImageSettings) {
        self.state.write().await.settings.image = settings;
    }

    pub async fn set_video_settings(&self, settings: VideoSettings) {
        self.state.write().await.settings.video = settings;
    }

    pub async fn set_audio_settings(&self, settings: AudioSettings) {
        self.state.write().await.settings.audio = settings;
    }

    pub async fn set_settings(&self, settings: GenerationSettings) {
        self.state.write().await.settings = settings;
    }

    // -----------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------

    /// A point-in-time snapshot of the full session state.
    pub async fn session(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn belief_model(&self) -> Option<BeliefModel> {
        self.state.read().await.belief_model.clone()
    }

    pub async fn clarifications(&self) -> Vec<Clarification> {
        self.state.read().await.clarifications.clone()
    }

    pub async fn history(&self) -> Vec<GenerationBatch> {
        self.state.read().await.history.clone()
    }

    pub async fn prompt(&self) -> String {
        self.state.read().await.prompt.clone()
    }

    pub fn modality(&self) -> Modality {
        self.registry.modality()
    }

    pub async fn generation_error(&self, modality: Modality) -> Option<String> {
        self.state
            .read()
            .await
            .generation_errors
            .get(&modality)
            .cloned()
    }

    pub async fn requires_credential(&self) -> bool {
        self.state.read().await.requires_credential
    }

    /// Clear the credential flag once the user has supplied a credential.
    pub async fn acknowledge_credential(&self) {
        self.state.write().await.requires_credential = false;
    }

    /// The epoch registry, exposed for diagnostics.
    pub fn registry(&self) -> &Arc<EpochRegistry> {
        &self.registry
    }
}

fn validated_prompt(prompt: &str) -> AppResult<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("prompt must not be empty"));
    }
    Ok(trimmed.to_string())
}

// Compile-time assertion that the facade can be shared across tasks.
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_studio_service() {
        assert_send_sync::<StudioService>();
    }
};
