//! Order placement and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId, ProductId};
use inventory::AvailabilityService;
use orders::{Money, Order, OrderPlacementService, OrderStore, PlaceOrder};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub placement: OrderPlacementService,
    pub order_store: Arc<dyn OrderStore>,
    pub availability: AvailabilityService,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    /// Identity of the placing user; defaults to the customer id when the
    /// gateway does not forward one.
    pub created_by: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub created_by: String,
    pub created_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            customer_id: order.customer_id().to_string(),
            product_id: order.product_id().to_string(),
            quantity: order.quantity(),
            unit_price_cents: order.unit_price().cents(),
            total_cents: order.total_price().cents(),
            created_by: order.created_by().to_string(),
            created_at: order.created_at().to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — place an order after the synchronous availability
/// pre-check.
///
/// Everything that can fail here fails before anything is persisted; once
/// this returns 201 the order exists and any later reservation failure is
/// only visible as an `OrderCancelled` event, not to this caller.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let customer_id = CustomerId::from_uuid(
        uuid::Uuid::parse_str(&req.customer_id)
            .map_err(|e| ApiError::BadRequest(format!("invalid customerId: {e}")))?,
    );
    let created_by = req
        .created_by
        .unwrap_or_else(|| customer_id.to_string());

    let order = state
        .placement
        .place_order(PlaceOrder {
            customer_id,
            product_id: ProductId::new(req.product_id),
            quantity: req.quantity,
            unit_price: Money::from_cents(req.unit_price_cents),
            created_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders/:id — load a placed order.
///
/// The saga never reports back to the placing caller; this query is the
/// channel for observing an order after placement.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .order_store
        .get_order(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;

    Ok(Json(OrderResponse::from(&order)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
