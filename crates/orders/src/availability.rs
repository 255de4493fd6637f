//! Availability pre-check client seam.
//!
//! In the real deployment the pre-check is a remote call into the
//! Inventory service; the Order service only sees this trait. The
//! composition root decides what backs it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::ProductId;
use thiserror::Error;

/// Answer of an availability pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityOutcome {
    /// Total stock covers the requested quantity.
    Available { total: u64 },
    /// Demand exceeds supply.
    Insufficient { requested: u32, available: u64 },
    /// The Inventory service knows no stock lines for the product.
    ProductNotFound,
}

/// Failure of the pre-check call itself, as opposed to a negative answer.
#[derive(Debug, Error)]
pub enum AvailabilityCallError {
    /// Network failure or the service is down.
    #[error("availability service unreachable: {0}")]
    Unreachable(String),
}

/// Client for the Inventory service's availability query.
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    /// Checks whether `quantity` units of the product are on hand.
    async fn check(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<AvailabilityOutcome, AvailabilityCallError>;
}

#[derive(Debug)]
struct StaticState {
    outcome: AvailabilityOutcome,
    unreachable: bool,
}

/// Availability client returning a configured answer, for tests.
#[derive(Clone)]
pub struct StaticAvailabilityClient {
    state: Arc<Mutex<StaticState>>,
}

impl StaticAvailabilityClient {
    /// Creates a client that reports the given total as available.
    pub fn available(total: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(StaticState {
                outcome: AvailabilityOutcome::Available { total },
                unreachable: false,
            })),
        }
    }

    /// Replaces the configured answer.
    pub fn set_outcome(&self, outcome: AvailabilityOutcome) {
        self.state.lock().unwrap().outcome = outcome;
    }

    /// Makes the next calls fail as if the service were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }
}

#[async_trait]
impl AvailabilityClient for StaticAvailabilityClient {
    async fn check(
        &self,
        _product_id: &ProductId,
        _quantity: u32,
    ) -> Result<AvailabilityOutcome, AvailabilityCallError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(AvailabilityCallError::Unreachable(
                "connection refused".to_string(),
            ));
        }
        Ok(state.outcome)
    }
}
