//! Inference Types
//!
//! Error taxonomy, request types, and generated-artifact types for the
//! remote inference service.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Marker string the remote service includes in errors that require the
/// caller to supply a billing-enabled credential before the operation can
/// proceed. Matched case-insensitively against error bodies.
pub const CREDENTIAL_MARKER: &str = "selection required";

/// Error type for remote inference operations.
///
/// The orchestration layer keys its retry behavior entirely off this enum:
/// `is_retryable()` gates the backoff loop, `is_quota()` selects the more
/// aggressive quota multiplier, and `CredentialRequired` is a terminal
/// condition that sets a dedicated session flag instead of a generic error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// The caller must select a billing-enabled credential before this
    /// operation can succeed. Never retried.
    CredentialRequired { message: String },

    /// Rate limit / resource exhaustion.
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    /// The service is temporarily unavailable or overloaded.
    Unavailable { message: String },

    /// A network or connection error occurred.
    Network { message: String },

    /// The service returned an HTTP server error.
    Server {
        message: String,
        status: Option<u16>,
    },

    /// Invalid request (bad parameters). Not retried.
    InvalidRequest { message: String },

    /// The service returned an unexpected or unparseable response.
    Parse { message: String },

    /// Any other error. Not retried.
    Other { message: String },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CredentialRequired { message } => {
                write!(f, "credential required: {}", message)
            }
            Self::RateLimited { message, .. } => write!(f, "rate limited: {}", message),
            Self::Unavailable { message } => write!(f, "service unavailable: {}", message),
            Self::Network { message } => write!(f, "network error: {}", message),
            Self::Server { message, status } => {
                if let Some(code) = status {
                    write!(f, "server error (HTTP {}): {}", code, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            Self::InvalidRequest { message } => write!(f, "invalid request: {}", message),
            Self::Parse { message } => write!(f, "parse error: {}", message),
            Self::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for InferenceError {}

impl InferenceError {
    /// Whether this error is transient and the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::RateLimited { .. }
                | InferenceError::Unavailable { .. }
                | InferenceError::Network { .. }
                | InferenceError::Server { .. }
        )
    }

    /// Whether this is a rate-limit / quota error deserving the more
    /// aggressive backoff multiplier.
    pub fn is_quota(&self) -> bool {
        matches!(self, InferenceError::RateLimited { .. })
    }

    /// Whether this error requires out-of-band credential action.
    pub fn is_credential(&self) -> bool {
        matches!(self, InferenceError::CredentialRequired { .. })
    }

    /// For rate-limited errors, the suggested wait time in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if let InferenceError::RateLimited { retry_after, .. } = self {
            retry_after.map(|s| s as u64)
        } else {
            None
        }
    }
}

/// Convenience alias for inference operation results.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Classify a raw error message string into the taxonomy.
///
/// The service contract exposes no structured error codes, only a message;
/// this is the single place that message inspection happens.
pub fn classify_message(message: &str) -> InferenceError {
    let lower = message.to_lowercase();

    if lower.contains(CREDENTIAL_MARKER) {
        return InferenceError::CredentialRequired {
            message: message.to_string(),
        };
    }

    const QUOTA_MARKERS: [&str; 4] = [
        "rate limit",
        "resource exhausted",
        "quota",
        "too many requests",
    ];
    if QUOTA_MARKERS.iter().any(|m| lower.contains(m)) {
        return InferenceError::RateLimited {
            message: message.to_string(),
            retry_after: None,
        };
    }

    const TRANSIENT_MARKERS: [&str; 6] = [
        "unavailable",
        "internal error",
        "gateway timeout",
        "timed out",
        "overloaded",
        "connection",
    ];
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        return InferenceError::Unavailable {
            message: message.to_string(),
        };
    }

    InferenceError::Other {
        message: message.to_string(),
    }
}

/// Classify an HTTP error response into the taxonomy.
///
/// The credential marker takes precedence over the status code: some
/// backends surface it inside a 400 or 403 body.
pub fn parse_http_error(status: u16, body: &str) -> InferenceError {
    if body.to_lowercase().contains(CREDENTIAL_MARKER) {
        return InferenceError::CredentialRequired {
            message: body.to_string(),
        };
    }

    match status {
        429 => InferenceError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400..=499 => InferenceError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => InferenceError::Server {
            message: body.to_string(),
            status: Some(status),
        },
        _ => InferenceError::Other {
            message: format!("unexpected HTTP {}: {}", status, body),
        },
    }
}

// ---------------------------------------------------------------------------
// Refinement wire types
// ---------------------------------------------------------------------------

/// A clarification question with the answer the user chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationAnswer {
    pub question: String,
    pub answer: String,
}

/// One attribute set operation. Setting `existence` to `"false"` instructs
/// the remote service to remove the entity and its references from the
/// narrative entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEdit {
    pub entity: String,
    pub attribute: String,
    pub value: String,
}

/// One relationship relabel operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdit {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// One refine call: the original prompt plus every accumulated answer and
/// structural edit, folded into a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineRequest {
    pub prompt: String,
    #[serde(default)]
    pub answers: Vec<ClarificationAnswer>,
    #[serde(default)]
    pub attribute_edits: Vec<AttributeEdit>,
    #[serde(default)]
    pub relationship_edits: Vec<RelationshipEdit>,
}

impl RefineRequest {
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
            && self.attribute_edits.is_empty()
            && self.relationship_edits.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Generation request types
// ---------------------------------------------------------------------------

/// One best-effort image attempt. The service may return zero or one image
/// per attempt; the orchestrator issues several attempts in parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Base64-encoded reference images (image-to-image only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_images: Vec<String>,
}

/// A video generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Multi-frame mode renders a sequence of keyframes instead of one clip.
    #[serde(default)]
    pub multiframe: bool,
}

/// A narrated speech request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// A music composition request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicRequest {
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Generated artifacts
// ---------------------------------------------------------------------------

/// A single generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// A single generated video asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// A single generated audio asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAudio {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(InferenceError::RateLimited {
            message: "slow down".into(),
            retry_after: Some(30),
        }
        .is_retryable());
        assert!(InferenceError::Unavailable {
            message: "overloaded".into(),
        }
        .is_retryable());
        assert!(InferenceError::Network {
            message: "connection reset".into(),
        }
        .is_retryable());
        assert!(InferenceError::Server {
            message: "oops".into(),
            status: Some(503),
        }
        .is_retryable());

        assert!(!InferenceError::CredentialRequired {
            message: "selection required".into(),
        }
        .is_retryable());
        assert!(!InferenceError::InvalidRequest {
            message: "bad prompt".into(),
        }
        .is_retryable());
        assert!(!InferenceError::Other {
            message: "unknown".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_quota_classification() {
        assert!(InferenceError::RateLimited {
            message: "quota".into(),
            retry_after: None,
        }
        .is_quota());
        assert!(!InferenceError::Unavailable {
            message: "down".into(),
        }
        .is_quota());
    }

    #[test]
    fn test_classify_message_markers() {
        assert!(matches!(
            classify_message("Resource exhausted: per-minute quota hit"),
            InferenceError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_message("503 Service Unavailable"),
            InferenceError::Unavailable { .. }
        ));
        assert!(matches!(
            classify_message("upstream connection refused"),
            InferenceError::Unavailable { .. }
        ));
        assert!(matches!(
            classify_message("billing account selection required before video generation"),
            InferenceError::CredentialRequired { .. }
        ));
        assert!(matches!(
            classify_message("prompt rejected by safety filter"),
            InferenceError::Other { .. }
        ));
    }

    #[test]
    fn test_parse_http_error_status_mapping() {
        assert!(matches!(
            parse_http_error(429, "slow down"),
            InferenceError::RateLimited { .. }
        ));
        assert!(matches!(
            parse_http_error(503, "maintenance"),
            InferenceError::Server {
                status: Some(503),
                ..
            }
        ));
        assert!(matches!(
            parse_http_error(400, "missing field: prompt"),
            InferenceError::InvalidRequest { .. }
        ));
        // Credential marker wins over the status code.
        assert!(matches!(
            parse_http_error(400, "billing Selection Required for this model"),
            InferenceError::CredentialRequired { .. }
        ));
    }

    #[test]
    fn test_retry_after_hint() {
        let err = InferenceError::RateLimited {
            message: "quota".into(),
            retry_after: Some(12),
        };
        assert_eq!(err.retry_after_secs(), Some(12));
        assert_eq!(
            InferenceError::Network {
                message: "reset".into()
            }
            .retry_after_secs(),
            None
        );
    }

    #[test]
    fn test_refine_request_is_empty() {
        let mut req = RefineRequest {
            prompt: "a dog".into(),
            ..Default::default()
        };
        assert!(req.is_empty());
        req.attribute_edits.push(AttributeEdit {
            entity: "Dog".into(),
            attribute: "existence".into(),
            value: "false".into(),
        });
        assert!(!req.is_empty());
    }
}
