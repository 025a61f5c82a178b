//! Session State
//!
//! The single owned state of one orchestration session. Mutated only by the
//! facade's currentness-gated publish steps and by the pending-update
//! accumulator; the presentation layer sees it through read accessors on
//! `StudioService`.
//!
//! Pending edits use explicit composite keys instead of joined strings, so
//! `("a:b", "c")` and `("a", "b:c")` can never collide. Recording the same
//! key twice keeps the last value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use museboard_core::{BeliefModel, Clarification, Modality};
use museboard_inference::{
    AttributeEdit, ClarificationAnswer, RefineRequest, RelationshipEdit,
};

use crate::models::generation::GenerationBatch;
use crate::models::settings::GenerationSettings;

/// Composite key for a pending attribute edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeKey {
    pub entity: String,
    pub attribute: String,
}

/// Composite key for a pending relationship relabel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub source: String,
    pub target: String,
}

/// Accumulated user input awaiting the next refinement merge.
#[derive(Debug, Clone, Default)]
pub struct PendingUpdates {
    attribute_edits: HashMap<AttributeKey, String>,
    relationship_edits: HashMap<RelationshipKey, String>,
    clarification_answers: HashMap<String, String>,
}

impl PendingUpdates {
    pub fn record_attribute_edit(
        &mut self,
        entity: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.attribute_edits.insert(
            AttributeKey {
                entity: entity.into(),
                attribute: attribute.into(),
            },
            value.into(),
        );
    }

    pub fn record_relationship_edit(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.relationship_edits.insert(
            RelationshipKey {
                source: source.into(),
                target: target.into(),
            },
            label.into(),
        );
    }

    pub fn record_clarification_answer(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) {
        self.clarification_answers
            .insert(question.into(), answer.into());
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_edits.is_empty()
            && self.relationship_edits.is_empty()
            && self.clarification_answers.is_empty()
    }

    /// Snapshot the accumulated edits and leave the maps empty. There is no
    /// suspension point between the two, so an edit recorded afterwards
    /// lands cleanly in the next snapshot.
    pub fn take(&mut self) -> PendingUpdates {
        std::mem::take(self)
    }

    /// Fold the snapshot into one refine request for `prompt`.
    pub fn into_refine_request(self, prompt: impl Into<String>) -> RefineRequest {
        let mut answers: Vec<ClarificationAnswer> = self
            .clarification_answers
            .into_iter()
            .map(|(question, answer)| ClarificationAnswer { question, answer })
            .collect();
        answers.sort_by(|a, b| a.question.cmp(&b.question));

        let mut attribute_edits: Vec<AttributeEdit> = self
            .attribute_edits
            .into_iter()
            .map(|(key, value)| AttributeEdit {
                entity: key.entity,
                attribute: key.attribute,
                value,
            })
            .collect();
        attribute_edits.sort_by(|a, b| (&a.entity, &a.attribute).cmp(&(&b.entity, &b.attribute)));

        let mut relationship_edits: Vec<RelationshipEdit> = self
            .relationship_edits
            .into_iter()
            .map(|(key, label)| RelationshipEdit {
                source: key.source,
                target: key.target,
                label,
            })
            .collect();
        relationship_edits.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        RefineRequest {
            prompt: prompt.into(),
            answers,
            attribute_edits,
            relationship_edits,
        }
    }
}

/// The long-lived state of one orchestration session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub modality: Modality,
    pub prompt: String,

    pub belief_model: Option<BeliefModel>,
    pub clarifications: Vec<Clarification>,
    pub answered_questions: Vec<String>,
    pub skipped_questions: Vec<String>,

    /// The `(prompt, modality)` pair most recently analyzed successfully;
    /// an identical re-submission skips re-analysis.
    pub analyzed: Option<(String, Modality)>,

    pub pending: PendingUpdates,
    pub history: Vec<GenerationBatch>,
    pub settings: GenerationSettings,

    /// Generation errors, scoped per modality.
    pub generation_errors: HashMap<Modality, String>,
    pub parse_error: Option<String>,
    pub clarification_error: Option<String>,

    pub parsing: bool,
    pub clarifying: bool,
    pub generating: bool,

    /// Set when a generation failure requires the user to supply a
    /// billing-enabled credential. Distinct from the generic error slots.
    pub requires_credential: bool,
}

impl SessionState {
    pub fn new(modality: Modality) -> Self {
        Self {
            modality,
            prompt: String::new(),
            belief_model: None,
            clarifications: Vec::new(),
            answered_questions: Vec::new(),
            skipped_questions: Vec::new(),
            analyzed: None,
            pending: PendingUpdates::default(),
            history: Vec::new(),
            settings: GenerationSettings::default(),
            generation_errors: HashMap::new(),
            parse_error: None,
            clarification_error: None,
            parsing: false,
            clarifying: false,
            generating: false,
            requires_credential: false,
        }
    }

    /// Questions never to ask again this session: answered plus skipped.
    pub fn excluded_questions(&self) -> Vec<String> {
        self.answered_questions
            .iter()
            .chain(self.skipped_questions.iter())
            .cloned()
            .collect()
    }

    /// Whether this exact `(prompt, modality)` pair has already been
    /// analyzed successfully.
    pub fn is_analyzed(&self, prompt: &str, modality: Modality) -> bool {
        matches!(
            &self.analyzed,
            Some((p, m)) if p.as_str() == prompt && *m == modality
        )
    }

    /// Mark every existing batch as superseded by a refined prompt.
    pub fn mark_history_outdated(&mut self) {
        for batch in &mut self.history {
            batch.outdated = true;
        }
    }

    /// Record an answered question, keeping the list duplicate-free.
    pub fn push_answered(&mut self, question: String) {
        if !self.answered_questions.contains(&question) {
            self.answered_questions.push(question);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::GenerationItem;

    #[test]
    fn test_pending_last_write_wins() {
        let mut pending = PendingUpdates::default();
        pending.record_attribute_edit("Dog", "color", "brown");
        pending.record_attribute_edit("Dog", "color", "black");
        pending.record_clarification_answer("What breed?", "corgi");
        pending.record_clarification_answer("What breed?", "husky");

        let request = pending.take().into_refine_request("a dog");
        assert_eq!(request.attribute_edits.len(), 1);
        assert_eq!(request.attribute_edits[0].value, "black");
        assert_eq!(request.answers.len(), 1);
        assert_eq!(request.answers[0].answer, "husky");
    }

    #[test]
    fn test_composite_keys_do_not_collide() {
        let mut pending = PendingUpdates::default();
        pending.record_attribute_edit("a:b", "c", "1");
        pending.record_attribute_edit("a", "b:c", "2");
        let request = pending.take().into_refine_request("p");
        assert_eq!(request.attribute_edits.len(), 2);
    }

    #[test]
    fn test_take_leaves_maps_empty_for_next_round() {
        let mut pending = PendingUpdates::default();
        pending.record_relationship_edit("Dog", "Park", "runs in");
        let snapshot = pending.take();
        assert!(!snapshot.is_empty());
        assert!(pending.is_empty());

        // An edit recorded after the snapshot belongs to the next round.
        pending.record_attribute_edit("Dog", "existence", "false");
        assert_eq!(
            pending.take().into_refine_request("p").attribute_edits.len(),
            1
        );
    }

    #[test]
    fn test_excluded_questions_union() {
        let mut session = SessionState::new(Modality::Image);
        session.answered_questions.push("q1".into());
        session.skipped_questions.push("q2".into());
        let excluded = session.excluded_questions();
        assert!(excluded.contains(&"q1".to_string()));
        assert!(excluded.contains(&"q2".to_string()));
    }

    #[test]
    fn test_is_analyzed_matches_exact_pair() {
        let mut session = SessionState::new(Modality::Image);
        session.analyzed = Some(("a dog".into(), Modality::Image));
        assert!(session.is_analyzed("a dog", Modality::Image));
        assert!(!session.is_analyzed("a dog", Modality::Story));
        assert!(!session.is_analyzed("a cat", Modality::Image));
    }

    #[test]
    fn test_mark_history_outdated() {
        let mut session = SessionState::new(Modality::Story);
        session.history.push(GenerationBatch::new(
            "a dog",
            Modality::Story,
            vec![GenerationItem::text("tale")],
        ));
        session.mark_history_outdated();
        assert!(session.history.iter().all(|b| b.outdated));
    }

    #[test]
    fn test_push_answered_deduplicates() {
        let mut session = SessionState::new(Modality::Image);
        session.push_answered("q1".into());
        session.push_answered("q1".into());
        assert_eq!(session.answered_questions.len(), 1);
    }
}
