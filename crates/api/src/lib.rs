//! HTTP surface and composition root for the order-fulfillment services.
//!
//! Deployed for real, the Order and Inventory services run as separate
//! processes connected only by a message broker. This crate wires both
//! over the in-memory broker so the whole pipeline (pre-check, outbox,
//! publisher, saga, reservation) runs in one process, which is the
//! deployment the binary and the integration tests use.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::routing::{get, post};
use inventory::{
    Availability, AvailabilityService, InMemoryStockLedger, InventoryError, ReservationHandler,
    StockLedger,
};
use messaging::{BrokerError, InMemoryBroker, MessageBroker, topics};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{
    AvailabilityCallError, AvailabilityClient, AvailabilityOutcome, InMemoryOrderStore,
    OrderPlacementService, OrderStore, OutboxPublisher,
};
use saga::SagaCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use common::ProductId;
use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/inventory/availability", get(routes::availability::check))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-process availability client backing the Order service's pre-check.
///
/// In the split deployment this is an HTTP call across services; here it
/// goes straight to the Inventory query handler. The failure mapping is
/// the same either way: a storage fault means the answer is unknown, not
/// negative.
pub struct LocalAvailabilityClient {
    service: AvailabilityService,
}

impl LocalAvailabilityClient {
    pub fn new(service: AvailabilityService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AvailabilityClient for LocalAvailabilityClient {
    async fn check(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<AvailabilityOutcome, AvailabilityCallError> {
        match self.service.check(product_id, quantity).await {
            Ok(report) => Ok(match report.availability {
                Availability::Available { total } => AvailabilityOutcome::Available { total },
                Availability::Insufficient { requested, total } => {
                    AvailabilityOutcome::Insufficient {
                        requested,
                        available: total,
                    }
                }
            }),
            Err(InventoryError::ProductNotFound(_)) => Ok(AvailabilityOutcome::ProductNotFound),
            Err(error) => Err(AvailabilityCallError::Unreachable(error.to_string())),
        }
    }
}

/// Everything the single-process deployment runs on.
///
/// The concrete in-memory handles stay accessible so the binary can seed
/// stock and tests can drive the publisher and inspect both sides.
pub struct AppServices {
    pub state: Arc<AppState>,
    pub publisher: Arc<OutboxPublisher>,
    pub coordinator: Arc<SagaCoordinator>,
    pub broker: InMemoryBroker,
    pub ledger: InMemoryStockLedger,
    pub order_store: InMemoryOrderStore,
}

/// Wires both services over an in-memory broker and spawns the listener
/// loops.
///
/// Every subscription is opened before this returns, so an order placed
/// right afterwards cannot publish past a listener that is still starting
/// up. The outbox publisher is returned unstarted: the binary spawns its
/// interval loop, tests drive `run_once` directly.
pub async fn wire_in_memory(config: &Config) -> Result<AppServices, BrokerError> {
    let broker = InMemoryBroker::new();
    let broker_dyn: Arc<dyn MessageBroker> = Arc::new(broker.clone());

    // Inventory side.
    let ledger = InMemoryStockLedger::new();
    let ledger_dyn: Arc<dyn StockLedger> = Arc::new(ledger.clone());
    let availability = AvailabilityService::new(Arc::clone(&ledger_dyn));
    let reservation = ReservationHandler::new(Arc::clone(&ledger_dyn));

    // Order side.
    let order_store = InMemoryOrderStore::new();
    let store_dyn: Arc<dyn OrderStore> = Arc::new(order_store.clone());
    let placement = OrderPlacementService::new(
        Arc::clone(&store_dyn),
        Arc::new(LocalAvailabilityClient::new(availability.clone())),
    );
    let publisher = Arc::new(
        OutboxPublisher::new(Arc::clone(&store_dyn), Arc::clone(&broker_dyn))
            .with_interval(config.outbox_interval())
            .with_batch_size(config.outbox_batch_size),
    );

    // Saga between them.
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::clone(&broker_dyn)).with_timeout(config.reservation_timeout()),
    );

    let requests = broker_dyn.subscribe(topics::RESERVE_STOCK_REQUEST).await?;
    tokio::spawn(inventory::listener::run_reservation_listener(
        reservation,
        Arc::clone(&broker_dyn),
        requests,
    ));

    let placed = broker_dyn.subscribe(topics::ORDER_PLACED).await?;
    tokio::spawn(saga::listener::run_order_placed_listener(
        Arc::clone(&coordinator),
        placed,
    ));

    let responses = broker_dyn.subscribe(topics::RESERVE_STOCK_RESPONSE).await?;
    tokio::spawn(saga::listener::run_response_listener(
        Arc::clone(&coordinator),
        responses,
    ));

    let state = Arc::new(AppState {
        placement,
        order_store: store_dyn,
        availability,
    });

    Ok(AppServices {
        state,
        publisher,
        coordinator,
        broker,
        ledger,
        order_store,
    })
}
