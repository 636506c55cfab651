use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

/// A signed stock correction for one specification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdjustStockInput {
    /// Positive puts goods in, negative takes them out.
    pub delta: i32,
}

/// Adjust a specification's stock by a signed delta
#[utoipa::path(
    post,
    path = "/api/v1/stock/specifications/{id}/adjust",
    request_body = AdjustStockInput,
    params(("id" = String, Path, description = "Specification id")),
    responses(
        (status = 200, description = "Stock adjusted", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Specification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn adjust_specification_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AdjustStockInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .stock
        .adjust_specification_stock(&id, payload.delta)
        .await
        .map_err(map_service_error)?;

    info!("Stock adjusted: {} by {}", id, payload.delta);

    Ok(success_response(updated))
}

/// Components whose summed specification stock is below their threshold
#[utoipa::path(
    get,
    path = "/api/v1/stock/components/low",
    responses(
        (status = 200, description = "Low components fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "stock"
)]
pub async fn low_stock_components(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let levels = state
        .services
        .stock
        .low_stock_components()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(levels))
}

/// Stock level of one component, with its low flag
#[utoipa::path(
    get,
    path = "/api/v1/stock/components/{id}/low",
    params(("id" = String, Path, description = "Component id")),
    responses(
        (status = 200, description = "Stock level fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Component not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn component_stock_level(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let level = state
        .services
        .stock
        .component_stock_level(&id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(level))
}

/// Creates the router for stock endpoints
pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/specifications/:id/adjust",
            post(adjust_specification_stock),
        )
        .route("/components/low", get(low_stock_components))
        .route("/components/:id/low", get(component_stock_level))
}
