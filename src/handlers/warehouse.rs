use super::common::{created_response, map_service_error, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::warehouse::{IssueMaterialInput, UpdateWarehouseRecordInput},
};
use axum::{
    extract::{Json, Path, State},
    routing::get,
    Router,
};
use tracing::info;

/// Issue material to a batch stage
#[utoipa::path(
    post,
    path = "/api/v1/warehouse-records",
    request_body = IssueMaterialInput,
    responses(
        (status = 201, description = "Material issued", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Stage or specification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouse"
)]
pub async fn issue_material(
    State(state): State<AppState>,
    Json(payload): Json<IssueMaterialInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let record = state
        .services
        .warehouse
        .issue_material(payload)
        .await
        .map_err(map_service_error)?;

    info!("Material issued: record {}", record.id);

    Ok(created_response(record))
}

/// Get an issue record by id
#[utoipa::path(
    get,
    path = "/api/v1/warehouse-records/{id}",
    params(("id" = i32, Path, description = "Warehouse record id")),
    responses(
        (status = 200, description = "Record fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouse"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let record = state
        .services
        .warehouse
        .get_record(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(record))
}

/// Correct an issue record, moving the consumption difference through stock
#[utoipa::path(
    put,
    path = "/api/v1/warehouse-records/{id}",
    request_body = UpdateWarehouseRecordInput,
    params(("id" = i32, Path, description = "Warehouse record id")),
    responses(
        (status = 200, description = "Record updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Record or specification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "warehouse"
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateWarehouseRecordInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .warehouse
        .update_record(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// All issues of one batch stage
#[utoipa::path(
    get,
    path = "/api/v1/warehouse-records/stage/{stage_id}",
    params(("stage_id" = i32, Path, description = "Batch stage id")),
    responses(
        (status = 200, description = "Records fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "warehouse"
)]
pub async fn records_for_stage(
    State(state): State<AppState>,
    Path(stage_id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let records = state
        .services
        .warehouse
        .records_for_stage(stage_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(records))
}

/// Issue history of one component
#[utoipa::path(
    get,
    path = "/api/v1/warehouse-records/component/{component_id}",
    params(("component_id" = String, Path, description = "Component id")),
    responses(
        (status = 200, description = "Records fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "warehouse"
)]
pub async fn records_for_component(
    State(state): State<AppState>,
    Path(component_id): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let records = state
        .services
        .warehouse
        .records_for_component(&component_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(records))
}

/// Creates the router for warehouse record endpoints
pub fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(issue_material))
        .route("/:id", get(get_record).put(update_record))
        .route("/stage/:stage_id", get(records_for_stage))
        .route("/component/:component_id", get(records_for_component))
}
