//! Retrying Remote Call Wrapper
//!
//! Executes a single remote operation, classifying failures via
//! `InferenceError` and retrying transient ones with exponential backoff
//! plus bounded random jitter. Rate-limit errors back off more aggressively
//! than generic transient errors because remote quota windows are typically
//! wider than generic outages.
//!
//! The backoff sleeps are the only suspension points this module adds; a
//! caller whose context has gone stale simply discards the final result.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use museboard_inference::{InferenceError, InferenceResult};

use crate::services::progress::ProgressSink;

/// Retry/backoff tunables for one remote-call kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Backoff multiplier for generic transient errors.
    pub multiplier: f64,
    /// Backoff multiplier for rate-limit/quota errors.
    pub quota_multiplier: f64,
    /// Upper bound on the random jitter added to each delay, in
    /// milliseconds.
    pub jitter_ms: u64,
    /// Ceiling on any single computed delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Policy for analysis-class calls (structure parse, clarifications).
    pub fn analysis() -> Self {
        Self {
            max_retries: 4,
            initial_delay_ms: 2000,
            multiplier: 2.0,
            quota_multiplier: 2.5,
            jitter_ms: 250,
            max_delay_ms: 60_000,
        }
    }

    /// Policy for generation-class calls (media, text, refinement).
    pub fn generation() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1500,
            multiplier: 2.0,
            quota_multiplier: 2.5,
            jitter_ms: 250,
            max_delay_ms: 45_000,
        }
    }

    /// A policy that never sleeps and never retries. Test use only, but
    /// kept here so integration tests can construct fast configs.
    pub fn immediate() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            multiplier: 1.0,
            quota_multiplier: 1.0,
            jitter_ms: 0,
            max_delay_ms: 0,
        }
    }
}

/// The delay (excluding jitter) before retry number `attempt + 1`, where
/// `attempt` counts failures so far starting at zero.
///
/// Pure so backoff growth is unit-testable without sleeping.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32, quota: bool) -> Duration {
    let multiplier = if quota {
        policy.quota_multiplier
    } else {
        policy.multiplier
    };
    let ms = policy.initial_delay_ms as f64 * multiplier.powi(attempt as i32);
    Duration::from_millis((ms as u64).min(policy.max_delay_ms))
}

/// Run `op` with retries per `policy`, reporting each retry through
/// `progress`.
///
/// `op` receives the zero-based attempt number. Non-retryable errors
/// (credential-required, invalid request, parse, unclassified) propagate
/// immediately without sleeping. On exhaustion, a quota-class failure
/// surfaces a distinct "quota exhausted" message; anything else reports the
/// attempt count alongside the last error.
pub async fn execute_with_retry<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    progress: &ProgressSink,
    mut op: F,
) -> InferenceResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = InferenceResult<T>>,
{
    let mut quota_seen = false;
    let mut attempt: u32 = 0;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(label, attempt, "remote call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                warn!(label, error = %err, "remote call failed (not retryable)");
                return Err(err);
            }
            Err(err) => {
                let quota = err.is_quota();
                quota_seen |= quota;

                if attempt >= policy.max_retries {
                    warn!(label, attempts = attempt + 1, error = %err, "retries exhausted");
                    return Err(if quota_seen {
                        InferenceError::RateLimited {
                            message: format!(
                                "{}: quota exhausted, try again later ({})",
                                label, err
                            ),
                            retry_after: err.retry_after_secs().map(|s| s as u32),
                        }
                    } else {
                        InferenceError::Other {
                            message: format!(
                                "{} failed after {} attempts: {}",
                                label,
                                attempt + 1,
                                err
                            ),
                        }
                    });
                }

                let mut delay = backoff_delay(policy, attempt, quota);
                // A server-provided hint is a floor, never a shortcut.
                if let Some(hint) = err.retry_after_secs() {
                    delay = delay.max(Duration::from_secs(hint));
                }
                let jitter = if policy.jitter_ms > 0 {
                    rand::thread_rng().gen_range(0..=policy.jitter_ms)
                } else {
                    0
                };

                progress.report(&format!(
                    "{} hit a transient error, retrying in {:.1}s (attempt {} of {})",
                    label,
                    delay.as_secs_f64(),
                    attempt + 2,
                    policy.max_retries + 1,
                ));
                debug!(label, attempt, delay_ms = delay.as_millis() as u64, quota, "backing off");

                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 1,
            multiplier: 2.0,
            quota_multiplier: 2.5,
            jitter_ms: 0,
            max_delay_ms: 10,
        }
    }

    #[test]
    fn test_backoff_growth() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            quota_multiplier: 2.5,
            jitter_ms: 0,
            max_delay_ms: 60_000,
        };
        // Delay before the retry following the 3rd consecutive failure.
        let third = backoff_delay(&policy, 2, false);
        assert!(third >= Duration::from_millis(4000));
        assert!(third < Duration::from_millis(policy.max_delay_ms));
    }

    #[test]
    fn test_quota_backoff_is_more_aggressive() {
        let policy = RetryPolicy::analysis();
        assert!(backoff_delay(&policy, 2, true) > backoff_delay(&policy, 2, false));
    }

    #[test]
    fn test_backoff_respects_ceiling() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            quota_multiplier: 2.5,
            jitter_ms: 0,
            max_delay_ms: 5000,
        };
        assert_eq!(backoff_delay(&policy, 9, false), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);

        let result = execute_with_retry("test call", &test_policy(), &ProgressSink::noop(), |_| {
            let calls = Arc::clone(&calls_op);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(InferenceError::Unavailable {
                        message: "overloaded".into(),
                    })
                } else {
                    Ok(42u32)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);

        let result: InferenceResult<u32> =
            execute_with_retry("test call", &test_policy(), &ProgressSink::noop(), |_| {
                let calls = Arc::clone(&calls_op);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(InferenceError::InvalidRequest {
                        message: "bad prompt".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(InferenceError::InvalidRequest { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credential_error_never_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);

        let result: InferenceResult<u32> =
            execute_with_retry("video generation", &test_policy(), &ProgressSink::noop(), |_| {
                let calls = Arc::clone(&calls_op);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(InferenceError::CredentialRequired {
                        message: "billing selection required".into(),
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(InferenceError::CredentialRequired { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempt_count() {
        let result: InferenceResult<u32> =
            execute_with_retry("test call", &test_policy(), &ProgressSink::noop(), |_| async {
                Err(InferenceError::Network {
                    message: "connection reset".into(),
                })
            })
            .await;

        match result {
            Err(InferenceError::Other { message }) => {
                assert!(message.contains("after 4 attempts"), "got: {message}");
            }
            other => panic!("expected exhaustion error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_quota_exhaustion_gets_distinct_message() {
        let result: InferenceResult<u32> =
            execute_with_retry("test call", &test_policy(), &ProgressSink::noop(), |_| async {
                Err(InferenceError::RateLimited {
                    message: "resource exhausted".into(),
                    retry_after: None,
                })
            })
            .await;

        match result {
            Err(InferenceError::RateLimited { message, .. }) => {
                assert!(message.contains("quota exhausted"), "got: {message}");
            }
            other => panic!("expected quota exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_progress_notice_per_retry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = ProgressSink::new(move |msg: &str| {
            sink_seen.lock().unwrap().push(msg.to_string());
        });

        let _: InferenceResult<u32> =
            execute_with_retry("clarifications", &test_policy(), &sink, |_| async {
                Err(InferenceError::Unavailable {
                    message: "503".into(),
                })
            })
            .await;

        let seen = seen.lock().unwrap();
        // max_retries sleeps, one notice each.
        assert_eq!(seen.len(), 3);
        assert!(seen[0].contains("clarifications"));
        assert!(seen[0].contains("attempt 2 of 4"));
    }
}
