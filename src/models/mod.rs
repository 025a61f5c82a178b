//! Data Models
//!
//! Session state, generation history, and per-modality settings.

pub mod generation;
pub mod session;
pub mod settings;
