//! Order-placement saga.
//!
//! One saga instance coordinates the reservation of stock for one placed
//! order. The instance is created from an `OrderPlaced` event, issues a
//! `ReserveStockRequest`, and waits for the response under a timeout.
//! Exactly one of four exits fires: success, business failure, transport
//! fault, or timeout; the last three compensate by publishing
//! `OrderCancelled`.
//!
//! The transition table is a pure function over (phase, signal) so the
//! state machine is testable without any transport or clock.

pub mod coordinator;
pub mod instance;
pub mod listener;
pub mod machine;
pub mod store;

pub use coordinator::SagaCoordinator;
pub use instance::SagaInstance;
pub use machine::{
    REASON_RESERVATION_FAILED, REASON_SERVICE_FAULT, REASON_TIMEOUT, SagaPhase, SagaSignal,
    SideEffect, Transition, transition,
};
pub use store::{InMemorySagaStore, SignalOutcome};
