//! Analysis Pipeline
//!
//! Launches the structure parse and the clarification generation
//! concurrently for one prompt/modality/excluded-questions set. The two
//! branches complete in either order; each applies its own currentness
//! check before publishing, and a failure in one never aborts the other.
//! Results land wholesale: the belief model and the clarification list each
//! replace their predecessor entirely.

use tracing::{debug, warn};

use museboard_core::Modality;

use super::StudioService;
use crate::services::retry::execute_with_retry;

impl StudioService {
    /// Run the full analysis pipeline under a fresh analysis epoch.
    ///
    /// Returns once both branches have settled (published, failed, or been
    /// discarded as stale), so refinement can await a finished analysis.
    pub(super) async fn run_analysis(&self, prompt: &str, modality: Modality) {
        let token = self.registry.bump_analysis(modality);
        debug!(epoch = token.value, %modality, "analysis started");

        let excluded = {
            let mut state = self.state.write().await;
            state.parsing = true;
            state.clarifying = true;
            state.parse_error = None;
            state.clarification_error = None;
            state.excluded_questions()
        };

        let gated = self.progress.gated(self.registry.clone(), token);

        let parse = execute_with_retry(
            "structure analysis",
            &self.config.analysis_retry,
            &gated,
            |_| self.inference.parse_structure(prompt, modality),
        );
        let clarify = execute_with_retry(
            "clarification generation",
            &self.config.analysis_retry,
            &gated,
            |_| {
                self.inference
                    .generate_clarifications(prompt, &excluded, modality)
            },
        );

        let (parse_result, clarify_result) = tokio::join!(parse, clarify);

        let parse_ok = parse_result.is_ok();
        let clarify_ok = clarify_result.is_ok();

        // Publish the parse branch.
        {
            let mut state = self.state.write().await;
            if self.registry.is_current(&token) {
                state.parsing = false;
                match parse_result {
                    Ok(mut model) => {
                        model.normalize();
                        state.belief_model = Some(model);
                    }
                    Err(err) => {
                        warn!(%modality, error = %err, "structure analysis failed");
                        state.parse_error = Some(err.to_string());
                    }
                }
            } else {
                debug!(epoch = token.value, "stale structure analysis discarded");
            }
        }

        // Publish the clarification branch.
        {
            let mut state = self.state.write().await;
            if self.registry.is_current(&token) {
                state.clarifying = false;
                match clarify_result {
                    Ok(clarifications) => {
                        state.clarifications = clarifications
                            .into_iter()
                            .filter(|c| {
                                let ok = c.is_well_formed();
                                if !ok {
                                    warn!(question = %c.question, "dropping malformed clarification");
                                }
                                ok
                            })
                            .collect();
                    }
                    Err(err) => {
                        warn!(%modality, error = %err, "clarification generation failed");
                        state.clarification_error = Some(err.to_string());
                    }
                }
            } else {
                debug!(epoch = token.value, "stale clarifications discarded");
            }
        }

        // Only a fully successful, still-current analysis lets an identical
        // re-submission skip this work later.
        if parse_ok && clarify_ok {
            let mut state = self.state.write().await;
            if self.registry.is_current(&token) {
                state.analyzed = Some((prompt.to_string(), modality));
                debug!(epoch = token.value, %modality, "analysis complete");
            }
        }
    }

    /// Re-run only the clarification branch under a fresh analysis epoch.
    pub(super) async fn run_clarifications_only(&self, prompt: &str, modality: Modality) {
        let token = self.registry.bump_analysis(modality);
        debug!(epoch = token.value, %modality, "clarification refresh started");

        let excluded = {
            let mut state = self.state.write().await;
            // The bump above supersedes any full analysis in flight; its
            // parse can no longer publish, so drop its spinner too.
            state.parsing = false;
            state.clarifying = true;
            state.clarification_error = None;
            state.excluded_questions()
        };

        let gated = self.progress.gated(self.registry.clone(), token);
        let result = execute_with_retry(
            "clarification refresh",
            &self.config.analysis_retry,
            &gated,
            |_| {
                self.inference
                    .generate_clarifications(prompt, &excluded, modality)
            },
        )
        .await;

        let mut state = self.state.write().await;
        if !self.registry.is_current(&token) {
            debug!(epoch = token.value, "stale clarification refresh discarded");
            return;
        }
        state.clarifying = false;
        match result {
            Ok(clarifications) => {
                state.clarifications = clarifications
                    .into_iter()
                    .filter(|c| c.is_well_formed())
                    .collect();
            }
            Err(err) => {
                warn!(%modality, error = %err, "clarification refresh failed");
                state.clarification_error = Some(err.to_string());
            }
        }
    }
}
