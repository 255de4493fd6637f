//! Availability query endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::ProductId;
use inventory::{Availability, InventoryError};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub is_available: bool,
    pub product_id: String,
    pub product_name: String,
    pub available_quantity: u64,
    pub message: String,
}

/// GET /inventory/availability?productId=&quantity= — synchronous stock
/// pre-check. 200 when the requested quantity is on hand, 400 otherwise.
#[tracing::instrument(skip(state))]
pub async fn check(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityParams>,
) -> Result<(StatusCode, Json<AvailabilityResponse>), ApiError> {
    let product_id = ProductId::new(params.product_id);

    match state.availability.check(&product_id, params.quantity).await {
        Ok(report) => {
            let (status, message) = match report.availability {
                Availability::Available { .. } => (StatusCode::OK, "available".to_string()),
                Availability::Insufficient { .. } => {
                    (StatusCode::BAD_REQUEST, "insufficient stock".to_string())
                }
            };
            let is_available = report.is_available();
            let product_id_str = report.product_id.to_string();
            let available_quantity = report.total();
            Ok((
                status,
                Json(AvailabilityResponse {
                    is_available,
                    product_id: product_id_str,
                    product_name: report.product_name,
                    available_quantity,
                    message,
                }),
            ))
        }
        Err(InventoryError::ProductNotFound(_)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(AvailabilityResponse {
                is_available: false,
                product_id: product_id.to_string(),
                product_name: product_id.to_string(),
                available_quantity: 0,
                message: "product not found".to_string(),
            }),
        )),
        Err(InventoryError::InvalidQuantity) => Err(ApiError::BadRequest(
            "quantity must be greater than zero".to_string(),
        )),
        Err(error) => Err(ApiError::Internal(error.to_string())),
    }
}
