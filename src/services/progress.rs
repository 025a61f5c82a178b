//! Progress Reporting
//!
//! A single-argument string callback handed into every orchestration entry
//! point. Consumers (the presentation layer) may display-and-auto-clear or
//! ignore the notices; the core only promises human-readable text.
//!
//! `gated` binds a sink to an epoch token so retry notices stop the moment
//! the issuing context goes stale, instead of flickering status for work
//! whose result will be discarded anyway.

use std::fmt;
use std::sync::Arc;

use crate::services::epoch::{EpochRegistry, EpochToken};

/// Cloneable wrapper around the progress callback.
#[derive(Clone)]
pub struct ProgressSink {
    inner: Arc<dyn Fn(&str) + Send + Sync>,
}

impl ProgressSink {
    pub fn new(callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(callback),
        }
    }

    /// A sink that drops every notice.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Emit one notice.
    pub fn report(&self, message: &str) {
        (self.inner)(message);
    }

    /// Derive a sink that forwards notices only while `token` is current.
    pub fn gated(&self, registry: Arc<EpochRegistry>, token: EpochToken) -> ProgressSink {
        let inner = Arc::clone(&self.inner);
        ProgressSink::new(move |message: &str| {
            if registry.is_current(&token) {
                inner(message);
            }
        })
    }
}

// The callback itself is opaque; only the wrapper is debuggable.
impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressSink")
    }
}
