//! Epoch Registry
//!
//! Two independent monotonically increasing counters (analysis, generation)
//! plus the current modality tag: the single source of truth for whether a
//! completed remote operation's result is still wanted.
//!
//! Bumping is the only cancellation mechanism in the system. In-flight
//! network calls are never aborted; instead every completion captures an
//! `EpochToken` at launch and re-checks it against the registry before
//! touching shared state. A stale completion no-ops. This trades promptness
//! (a stale call keeps consuming network resources until it finishes) for
//! the guarantee that visible state is never corrupted by obsolete results.

use std::sync::{Mutex, MutexGuard};

use museboard_core::Modality;

/// Which counter a token was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochKind {
    Analysis,
    Generation,
}

/// A captured epoch value. Passed explicitly into every async task so the
/// currentness check is a pure comparison, not an ambient read of shared
/// mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochToken {
    pub kind: EpochKind,
    pub value: u64,
    pub modality: Modality,
}

#[derive(Debug)]
struct Counters {
    analysis: u64,
    generation: u64,
    modality: Modality,
}

/// Registry of the two epoch counters and the current modality.
#[derive(Debug)]
pub struct EpochRegistry {
    inner: Mutex<Counters>,
}

impl EpochRegistry {
    pub fn new(modality: Modality) -> Self {
        Self {
            inner: Mutex::new(Counters {
                analysis: 0,
                generation: 0,
                modality,
            }),
        }
    }

    // The registry holds no invariants a panicking writer could break
    // mid-update, so a poisoned lock is recovered rather than propagated.
    fn counters(&self) -> MutexGuard<'_, Counters> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Invalidate all in-flight analysis work and issue a new token.
    pub fn bump_analysis(&self, modality: Modality) -> EpochToken {
        let mut counters = self.counters();
        counters.analysis += 1;
        EpochToken {
            kind: EpochKind::Analysis,
            value: counters.analysis,
            modality,
        }
    }

    /// Invalidate all in-flight generation work and issue a new token.
    pub fn bump_generation(&self, modality: Modality) -> EpochToken {
        let mut counters = self.counters();
        counters.generation += 1;
        EpochToken {
            kind: EpochKind::Generation,
            value: counters.generation,
            modality,
        }
    }

    /// Token for the current analysis epoch, without bumping it. Ties
    /// follow-on work (e.g. a refinement round trip) to the analysis state
    /// the caller observed: any later bump or modality change fails the
    /// token's currentness check.
    pub fn current_analysis_token(&self) -> EpochToken {
        let counters = self.counters();
        EpochToken {
            kind: EpochKind::Analysis,
            value: counters.analysis,
            modality: counters.modality,
        }
    }

    /// Retag the registry's current modality. Every outstanding token issued
    /// for another modality fails its currentness check from here on, even
    /// if its counter value still matches.
    pub fn set_modality(&self, modality: Modality) {
        self.counters().modality = modality;
    }

    pub fn modality(&self) -> Modality {
        self.counters().modality
    }

    /// Whether a completion holding this token may still publish.
    pub fn is_current(&self, token: &EpochToken) -> bool {
        let counters = self.counters();
        let value_matches = match token.kind {
            EpochKind::Analysis => counters.analysis == token.value,
            EpochKind::Generation => counters.generation == token.value,
        };
        value_matches && counters.modality == token.modality
    }

    /// Current analysis counter value (diagnostics and tests).
    pub fn analysis_value(&self) -> u64 {
        self.counters().analysis
    }

    /// Current generation counter value (diagnostics and tests).
    pub fn generation_value(&self) -> u64 {
        self.counters().generation
    }
}
