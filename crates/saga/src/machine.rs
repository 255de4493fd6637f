//! Saga state machine.

use serde::{Deserialize, Serialize};

/// Cancellation reason when the reservation response reports failure
/// without its own reason.
pub const REASON_RESERVATION_FAILED: &str = "stock reservation failed";
/// Cancellation reason for a transport or processing fault.
pub const REASON_SERVICE_FAULT: &str = "inventory service error";
/// Cancellation reason when no response arrived within the timeout.
pub const REASON_TIMEOUT: &str = "stock reservation timed out";

/// The phase of a saga instance.
///
/// Phase transitions:
/// ```text
/// ReservationPending ──┬──► Completed
///                      └──► Cancelled
/// ```
///
/// Both terminal phases are "finalized": any further signal is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaPhase {
    /// A reservation request has been issued; awaiting the response.
    #[default]
    ReservationPending,

    /// Stock was reserved; the saga ended without compensation.
    Completed,

    /// The reservation failed, faulted or timed out; an `OrderCancelled`
    /// compensation was emitted.
    Cancelled,
}

impl SagaPhase {
    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaPhase::Completed | SagaPhase::Cancelled)
    }

    /// Returns the phase name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaPhase::ReservationPending => "ReservationPending",
            SagaPhase::Completed => "Completed",
            SagaPhase::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SagaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A signal delivered to a pending saga instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaSignal {
    /// The Inventory service answered the reservation request.
    ResponseReceived {
        success: bool,
        reason: Option<String>,
    },

    /// A transport or processing fault occurred while awaiting the
    /// response.
    Faulted { detail: String },

    /// The response timeout expired.
    TimedOut,
}

/// A side effect the caller must execute after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Publish an `OrderCancelled` compensation with this reason.
    PublishCancellation { reason: String },
}

/// The outcome of applying a signal to a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SagaPhase,
    pub effect: Option<SideEffect>,
}

/// Pure transition function of the saga.
///
/// Signals arriving on a terminal phase return it unchanged with no
/// effect, which is what makes the response-vs-timeout race safe: the
/// losing signal becomes a no-op.
pub fn transition(phase: SagaPhase, signal: &SagaSignal) -> Transition {
    if phase.is_terminal() {
        return Transition {
            next: phase,
            effect: None,
        };
    }

    match signal {
        SagaSignal::ResponseReceived { success: true, .. } => Transition {
            next: SagaPhase::Completed,
            effect: None,
        },
        SagaSignal::ResponseReceived {
            success: false,
            reason,
        } => Transition {
            next: SagaPhase::Cancelled,
            effect: Some(SideEffect::PublishCancellation {
                reason: reason
                    .clone()
                    .unwrap_or_else(|| REASON_RESERVATION_FAILED.to_string()),
            }),
        },
        SagaSignal::Faulted { .. } => Transition {
            next: SagaPhase::Cancelled,
            effect: Some(SideEffect::PublishCancellation {
                reason: REASON_SERVICE_FAULT.to_string(),
            }),
        },
        SagaSignal::TimedOut => Transition {
            next: SagaPhase::Cancelled,
            effect: Some(SideEffect::PublishCancellation {
                reason: REASON_TIMEOUT.to_string(),
            }),
        },
    }
}
