//! Museboard Core Types
//!
//! Dependency-light domain vocabulary shared by the orchestration core and
//! the inference boundary: output modalities, the belief model produced by
//! structure analysis, clarification questions, and the core error type.
//! These types are kept free of runtime/network dependencies (only serde +
//! thiserror) so both the application crate and the inference crate can
//! depend on them without pulling in heavier stacks.

pub mod belief;
pub mod clarification;
pub mod error;
pub mod modality;

pub use belief::{Attribute, BeliefModel, Entity, Relationship, EXISTENCE_ATTRIBUTE};
pub use clarification::Clarification;
pub use error::{CoreError, CoreResult};
pub use modality::{AudioMode, Modality};
