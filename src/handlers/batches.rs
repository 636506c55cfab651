use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::batches::{
        BatchListFilter, CompleteBatchInput, CreateBatchInput, UpdateBatchInput, UpdateStageInput,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tracing::info;

/// Create a production batch with its fanned-out stages
#[utoipa::path(
    post,
    path = "/api/v1/batches",
    request_body = CreateBatchInput,
    responses(
        (status = 201, description = "Batch created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Monthly serial window exhausted", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn create_batch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBatchInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .batches
        .create_batch(payload)
        .await
        .map_err(map_service_error)?;

    info!("Batch created: {}", detail.batch.id);

    Ok(created_response(detail))
}

/// List batches with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/batches",
    params(BatchListFilter, PaginationParams),
    responses(
        (status = 200, description = "Batches fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(filter): Query<BatchListFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .batches
        .list_batches(&filter, pagination.page, pagination.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}

/// Get a batch by id
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let batch = state
        .services
        .batches
        .get_batch(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(batch))
}

/// Update a batch
#[utoipa::path(
    put,
    path = "/api/v1/batches/{id}",
    request_body = UpdateBatchInput,
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBatchInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .batches
        .update_batch(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Flip every unstarted batch whose start has passed to ongoing
#[utoipa::path(
    post,
    path = "/api/v1/batches/refresh-statuses",
    responses(
        (status = 200, description = "Due batches transitioned", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "batches"
)]
pub async fn refresh_statuses(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let transitioned = state
        .services
        .batches
        .refresh_statuses()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(json!({ "transitioned": transitioned })))
}

/// Complete a batch, optionally booking its output into product inventory
#[utoipa::path(
    post,
    path = "/api/v1/batches/{id}/complete",
    request_body = CompleteBatchInput,
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Batch completed", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Product of the batch is gone", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn complete_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CompleteBatchInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let completed = state
        .services
        .batches
        .complete_batch(id, payload)
        .await
        .map_err(map_service_error)?;

    info!("Batch completed: {}", id);

    Ok(success_response(completed))
}

/// Delete a batch
#[utoipa::path(
    delete,
    path = "/api/v1/batches/{id}",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 400, description = "Batch does not exist", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .batches
        .delete_batch(id)
        .await
        .map_err(map_service_error)?;

    info!("Batch deleted: {}", id);

    Ok(no_content_response())
}

/// List a batch's stages in fan-out order
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}/stages",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Stages fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn batch_stages(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let stages = state
        .services
        .batches
        .batch_stages(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(stages))
}

/// Update one stage of a batch
#[utoipa::path(
    put,
    path = "/api/v1/batches/stages/{stage_id}",
    request_body = UpdateStageInput,
    params(("stage_id" = i32, Path, description = "Batch stage id")),
    responses(
        (status = 200, description = "Stage updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Stage not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn update_stage(
    State(state): State<AppState>,
    Path(stage_id): Path<i32>,
    Json(payload): Json<UpdateStageInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .batches
        .update_stage(stage_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Compute the cost roll-up report for a batch
#[utoipa::path(
    get,
    path = "/api/v1/batches/{id}/cost-report",
    params(("id" = i32, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Cost report computed", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Batch not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Subtree not ready for costing", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn batch_cost_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let report = state
        .services
        .reports
        .batch_cost_report(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Creates the router for batch endpoints
pub fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_batch).get(list_batches))
        .route("/refresh-statuses", post(refresh_statuses))
        .route(
            "/:id",
            get(get_batch).put(update_batch).delete(delete_batch),
        )
        .route("/:id/complete", post(complete_batch))
        .route("/:id/stages", get(batch_stages))
        .route("/:id/cost-report", get(batch_cost_report))
        .route("/stages/:stage_id", put(update_stage))
}
