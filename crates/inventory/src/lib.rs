//! Inventory service: stock ledger, availability queries and reservation.
//!
//! The ledger records quantity per (product, warehouse). The availability
//! handler answers the Order service's synchronous pre-check; the
//! reservation handler serves `ReserveStockRequest` messages by running the
//! multi-warehouse stock-reduction algorithm. The invariant throughout is
//! that no stock line ever goes negative, including under concurrent
//! reservations.

pub mod availability;
pub mod error;
pub mod ledger;
pub mod listener;
pub mod memory;
pub mod postgres;
pub mod reduction;
pub mod reservation;

pub use availability::{Availability, AvailabilityReport, AvailabilityService};
pub use error::{InventoryError, LedgerError};
pub use ledger::{StockLedger, StockLine, StockReduction};
pub use memory::InMemoryStockLedger;
pub use postgres::PgStockLedger;
pub use reduction::{Deduction, ReductionPlan, plan_reduction};
pub use reservation::ReservationHandler;
