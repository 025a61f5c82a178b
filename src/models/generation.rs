//! Generation History
//!
//! One `GenerationBatch` per generation invocation, tagged with the prompt
//! and modality that produced it. History is prepend-only within the core:
//! batches are never overwritten or merged, only marked outdated when a
//! refinement supersedes their prompt. Explicit deletion is a presentation
//! concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use museboard_core::Modality;
use museboard_inference::{GeneratedAudio, GeneratedImage, GeneratedVideo};

/// One generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationArtifact {
    Image(GeneratedImage),
    Text { content: String },
    Video(GeneratedVideo),
    Audio(GeneratedAudio),
}

/// One artifact with a stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationItem {
    pub id: String,
    pub artifact: GenerationArtifact,
}

impl GenerationItem {
    pub fn new(artifact: GenerationArtifact) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            artifact,
        }
    }

    pub fn image(image: GeneratedImage) -> Self {
        Self::new(GenerationArtifact::Image(image))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(GenerationArtifact::Text {
            content: content.into(),
        })
    }

    pub fn video(video: GeneratedVideo) -> Self {
        Self::new(GenerationArtifact::Video(video))
    }

    pub fn audio(audio: GeneratedAudio) -> Self {
        Self::new(GenerationArtifact::Audio(audio))
    }
}

/// The items produced by one generation invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationBatch {
    pub id: String,
    pub prompt: String,
    pub modality: Modality,
    pub created_at: DateTime<Utc>,
    /// Set when a later refinement changed the prompt this batch was
    /// generated from.
    #[serde(default)]
    pub outdated: bool,
    pub items: Vec<GenerationItem>,
}

impl GenerationBatch {
    pub fn new(prompt: impl Into<String>, modality: Modality, items: Vec<GenerationItem>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            modality,
            created_at: Utc::now(),
            outdated: false,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_starts_current() {
        let batch = GenerationBatch::new("a dog", Modality::Story, vec![GenerationItem::text("x")]);
        assert!(!batch.outdated);
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.modality, Modality::Story);
    }

    #[test]
    fn test_items_have_distinct_ids() {
        let a = GenerationItem::text("one");
        let b = GenerationItem::text("one");
        assert_ne!(a.id, b.id);
    }
}
