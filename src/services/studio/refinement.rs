//! Refinement Merge
//!
//! Folds every pending clarification answer and structural edit into a
//! single remote refine call, then re-enters the analysis pipeline with the
//! refined prompt under a fresh epoch.
//!
//! The pending maps are snapshot-and-cleared with no suspension point in
//! between, so a same-tick edit is either wholly in this refinement or
//! wholly in the next one. The snapshot is never restored: a failed refine
//! consumes the edits and surfaces an error instead of re-queuing them.
//!
//! The refine result is gated on the analysis epoch observed at snapshot
//! time. A resubmission, modality change, or clarification refresh during
//! the round trip makes the token stale, and the result (success or
//! failure) is silently discarded instead of clobbering the newer state.

use tracing::{debug, info, warn};

use super::StudioService;
use crate::services::retry::execute_with_retry;
use crate::utils::error::AppResult;

impl StudioService {
    /// Apply all accumulated answers and edits as one refinement.
    ///
    /// No-op when nothing is pending. This is a user-blocking foreground
    /// action, so it runs under the low-ceiling generation retry policy.
    pub async fn apply_pending_updates(&self) -> AppResult<()> {
        let (request, modality, token) = {
            let mut state = self.state.write().await;
            let snapshot = state.pending.take();
            let prompt = state.prompt.clone();
            (
                snapshot.into_refine_request(prompt),
                state.modality,
                self.registry.current_analysis_token(),
            )
        };

        if request.is_empty() {
            debug!("no pending updates to apply");
            return Ok(());
        }

        let answered: Vec<String> = request
            .answers
            .iter()
            .map(|a| a.question.clone())
            .collect();
        info!(
            answers = request.answers.len(),
            attribute_edits = request.attribute_edits.len(),
            relationship_edits = request.relationship_edits.len(),
            "applying pending updates"
        );

        let result = execute_with_retry(
            "prompt refinement",
            &self.config.generation_retry,
            &self.progress,
            |_| self.inference.refine(request.clone()),
        )
        .await;

        match result {
            Ok(refined) => {
                let published = {
                    let mut state = self.state.write().await;
                    if self.registry.is_current(&token) {
                        state.prompt = refined.clone();
                        for question in answered {
                            state.push_answered(question);
                        }
                        // Content generated from the old prompt is now
                        // stale, pending regeneration.
                        state.mark_history_outdated();
                        state.analyzed = None;
                        true
                    } else {
                        debug!(epoch = token.value, "stale refinement discarded");
                        false
                    }
                };
                if published {
                    // Bumps a fresh analysis epoch, superseding any
                    // analysis still running from before the refinement.
                    self.run_analysis(&refined, modality).await;
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "prompt refinement failed");
                let mut state = self.state.write().await;
                if !self.registry.is_current(&token) {
                    debug!(epoch = token.value, "stale refinement failure discarded");
                    return Ok(());
                }
                if err.is_credential() {
                    state.requires_credential = true;
                } else {
                    state.generation_errors.insert(modality, err.to_string());
                }
                Ok(())
            }
        }
    }
}
