//! In-process saga instance store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::CorrelationId;

use crate::instance::SagaInstance;
use crate::machine::{SagaSignal, SideEffect, transition};

/// Outcome of applying a signal through the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// No instance is registered for the correlation id.
    Unknown,

    /// The instance was already finalized; the signal was a no-op.
    Ignored,

    /// The signal finalized the instance. The returned snapshot reflects
    /// the terminal phase; the effect, if any, is for the caller to
    /// execute.
    Finalized {
        instance: SagaInstance,
        effect: Option<SideEffect>,
    },
}

/// Saga instances keyed by correlation id, held in process memory.
///
/// The single mutex is the mutual-exclusion point for the
/// response-vs-timeout race: whichever signal takes the lock first
/// finalizes the instance, and the loser observes a terminal phase.
/// Finalized instances are retained so duplicate or late signals keep
/// resolving to no-ops. A process restart loses in-flight instances; a
/// durable store keyed the same way is the hardening path for that.
#[derive(Clone, Default)]
pub struct InMemorySagaStore {
    state: Arc<Mutex<HashMap<CorrelationId, SagaInstance>>>,
}

impl InMemorySagaStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new instance unless one already exists for its
    /// correlation id. Returns false on a duplicate.
    pub fn create(&self, instance: SagaInstance) -> bool {
        let mut state = self.state.lock().unwrap();
        match state.entry(instance.correlation_id()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(instance);
                true
            }
        }
    }

    /// Applies a signal to the instance under the store lock.
    pub fn apply(&self, correlation_id: CorrelationId, signal: &SagaSignal) -> SignalOutcome {
        let mut state = self.state.lock().unwrap();
        let Some(instance) = state.get_mut(&correlation_id) else {
            return SignalOutcome::Unknown;
        };

        if instance.is_finalized() {
            return SignalOutcome::Ignored;
        }

        let t = transition(instance.phase(), signal);
        instance.set_phase(t.next);
        if let Some(SideEffect::PublishCancellation { reason }) = &t.effect {
            instance.set_cancellation_reason(reason.clone());
        }

        SignalOutcome::Finalized {
            instance: instance.clone(),
            effect: t.effect,
        }
    }

    /// Returns a snapshot of the instance for a correlation id.
    pub fn get(&self, correlation_id: CorrelationId) -> Option<SagaInstance> {
        self.state.lock().unwrap().get(&correlation_id).cloned()
    }

    /// Returns the number of stored instances, finalized included.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().len()
    }

    /// True when no instances are stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().is_empty()
    }

    /// Returns the number of instances still awaiting their response.
    pub fn pending_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .values()
            .filter(|instance| !instance.is_finalized())
            .count()
    }
}
