//! Order service: placement, transactional outbox and publisher.
//!
//! Placing an order runs a synchronous availability pre-check against the
//! Inventory service, then persists the order together with an unprocessed
//! outbox record in one atomic unit. The outbox publisher relays those
//! records to the broker at least once; everything after that point belongs
//! to the saga.

pub mod availability;
pub mod error;
pub mod memory;
pub mod order;
pub mod outbox;
pub mod postgres;
pub mod publisher;
pub mod service;
pub mod store;

pub use availability::{
    AvailabilityCallError, AvailabilityClient, AvailabilityOutcome, StaticAvailabilityClient,
};
pub use error::{OrderError, PlaceOrderError, StoreError};
pub use memory::InMemoryOrderStore;
pub use order::{Money, Order};
pub use outbox::{OutboxPayload, OutboxRecord};
pub use postgres::PgOrderStore;
pub use publisher::OutboxPublisher;
pub use service::{OrderPlacementService, PlaceOrder};
pub use store::OrderStore;
