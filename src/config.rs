//! Studio Configuration
//!
//! Tunables for the orchestration core: one retry policy per remote-call
//! kind, plus the image completion round limit. Analysis calls tolerate
//! more retries with a longer initial delay because they run in the
//! background of the editing loop; generation and refinement calls are
//! user-blocking foreground actions and fail faster.

use serde::{Deserialize, Serialize};

use crate::services::retry::RetryPolicy;

/// Number of best-effort image rounds: one full round plus one shortfall
/// round.
pub const IMAGE_COMPLETION_ROUNDS: u32 = 2;

/// Configuration for `StudioService`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Retry policy for analysis-class calls (parse, clarifications).
    #[serde(default = "RetryPolicy::analysis")]
    pub analysis_retry: RetryPolicy,

    /// Retry policy for generation-class calls (media, text, refine).
    #[serde(default = "RetryPolicy::generation")]
    pub generation_retry: RetryPolicy,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            analysis_retry: RetryPolicy::analysis(),
            generation_retry: RetryPolicy::generation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_differ_per_call_kind() {
        let config = StudioConfig::default();
        assert!(config.analysis_retry.max_retries > config.generation_retry.max_retries);
        assert!(config.analysis_retry.initial_delay_ms > config.generation_retry.initial_delay_ms);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StudioConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.analysis_retry.max_retries, 4);
    }
}
