//! Museboard Orchestration Core
//!
//! The backend core for an iterative creative-intent application: a user
//! describes an image/story/video/audio intent, the prompt is decomposed
//! into a belief model plus clarifying questions by a remote inference
//! service, the user edits and answers, and generation is triggered.
//!
//! Everything here exists to keep that loop coherent under slow, fallible,
//! concurrently-outstanding remote calls:
//! - epoch registry: staleness control for analysis and generation results
//! - retrying remote-call wrapper: backoff + jitter with error classification
//! - analysis pipeline: concurrent parse + clarification, currentness-gated
//! - generation dispatcher: modality-selected calls, best-effort images
//! - pending-update accumulator and refinement merge
//! - `StudioService`: the facade the presentation layer talks to

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::StudioConfig;
pub use models::generation::{GenerationArtifact, GenerationBatch, GenerationItem};
pub use models::session::{AttributeKey, PendingUpdates, RelationshipKey, SessionState};
pub use models::settings::{AudioSettings, GenerationSettings, ImageSettings, VideoSettings};
pub use services::epoch::{EpochKind, EpochRegistry, EpochToken};
pub use services::progress::ProgressSink;
pub use services::retry::{backoff_delay, execute_with_retry, RetryPolicy};
pub use services::studio::StudioService;
pub use utils::error::{AppError, AppResult};

// Re-export the domain and inference-boundary crates for downstream callers.
pub use museboard_core as core;
pub use museboard_inference as inference;
