use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginationParams,
};
use crate::{
    common::DateRangeParams,
    errors::ApiError,
    handlers::AppState,
    services::works::{CreateWorkInput, UpdateWorkInput, WorkListFilter},
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use tracing::info;

/// Record a day's work against a batch stage
#[utoipa::path(
    post,
    path = "/api/v1/works",
    request_body = CreateWorkInput,
    responses(
        (status = 201, description = "Work recorded", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Batch stage not found", body = crate::errors::ErrorResponse)
    ),
    tag = "works"
)]
pub async fn create_work(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .works
        .create_work(payload)
        .await
        .map_err(map_service_error)?;

    info!("Work recorded: {}", detail.work.id);

    Ok(created_response(detail))
}

/// List work entries with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/works",
    params(WorkListFilter, PaginationParams),
    responses(
        (status = 200, description = "Works fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "works"
)]
pub async fn list_works(
    State(state): State<AppState>,
    Query(filter): Query<WorkListFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .works
        .list_works(&filter, pagination.page, pagination.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}

/// Unclaimed works of an employee in a date range (the payroll feed)
#[utoipa::path(
    get,
    path = "/api/v1/works/unchecked/{employee_id}",
    params(
        ("employee_id" = i32, Path, description = "Employee id"),
        DateRangeParams
    ),
    responses(
        (status = 200, description = "Unchecked works fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse)
    ),
    tag = "works"
)]
pub async fn unchecked_works(
    State(state): State<AppState>,
    Path(employee_id): Path<i32>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&params)?;
    let (start_date, end_date) = params.to_date_range()?;

    let works = state
        .services
        .works
        .unchecked_for_employee(employee_id, start_date, end_date)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(works))
}

/// Get a work entry with its consumption lines
#[utoipa::path(
    get,
    path = "/api/v1/works/{id}",
    params(("id" = i32, Path, description = "Work id")),
    responses(
        (status = 200, description = "Work fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Work not found", body = crate::errors::ErrorResponse)
    ),
    tag = "works"
)]
pub async fn get_work(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .works
        .get_work(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Update a work entry
#[utoipa::path(
    put,
    path = "/api/v1/works/{id}",
    request_body = UpdateWorkInput,
    params(("id" = i32, Path, description = "Work id")),
    responses(
        (status = 200, description = "Work updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work not found", body = crate::errors::ErrorResponse)
    ),
    tag = "works"
)]
pub async fn update_work(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateWorkInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .works
        .update_work(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Delete a work entry and its consumption lines
#[utoipa::path(
    delete,
    path = "/api/v1/works/{id}",
    params(("id" = i32, Path, description = "Work id")),
    responses(
        (status = 204, description = "Work deleted"),
        (status = 400, description = "Work does not exist", body = crate::errors::ErrorResponse)
    ),
    tag = "works"
)]
pub async fn delete_work(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .works
        .delete_work(id)
        .await
        .map_err(map_service_error)?;

    info!("Work deleted: {}", id);

    Ok(no_content_response())
}

/// Creates the router for work log endpoints
pub fn work_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_work).get(list_works))
        .route("/unchecked/:employee_id", get(unchecked_works))
        .route(
            "/:id",
            get(get_work).put(update_work).delete(delete_work),
        )
}
