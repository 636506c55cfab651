use super::common::{
    created_response, map_service_error, no_content_response, success_response, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::payroll::{
        ConfirmPaymentInput, CreateSalaryInput, SalaryListFilter, UpdateSalaryInput,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use tracing::info;

/// Create a salary statement and claim the unchecked works of its period
#[utoipa::path(
    post,
    path = "/api/v1/salaries",
    request_body = CreateSalaryInput,
    responses(
        (status = 201, description = "Statement created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "salaries"
)]
pub async fn create_statement(
    State(state): State<AppState>,
    Json(payload): Json<CreateSalaryInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let statement = state
        .services
        .payroll
        .create_statement(payload)
        .await
        .map_err(map_service_error)?;

    info!(
        "Salary statement created: {} for employee {}",
        statement.salary.id, statement.salary.employee_id
    );

    Ok(created_response(statement))
}

/// List salary statements with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/salaries",
    params(SalaryListFilter, PaginationParams),
    responses(
        (status = 200, description = "Statements fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "salaries"
)]
pub async fn list_statements(
    State(state): State<AppState>,
    Query(filter): Query<SalaryListFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .payroll
        .list_statements(&filter, pagination.page, pagination.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}

/// Get a statement with its work lines and recomputed totals
#[utoipa::path(
    get,
    path = "/api/v1/salaries/{id}",
    params(("id" = i32, Path, description = "Salary statement id")),
    responses(
        (status = 200, description = "Statement fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Statement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "salaries"
)]
pub async fn get_statement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let statement = state
        .services
        .payroll
        .statement(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(statement))
}

/// Update a statement's period, rates, deduction or bonus
#[utoipa::path(
    put,
    path = "/api/v1/salaries/{id}",
    request_body = UpdateSalaryInput,
    params(("id" = i32, Path, description = "Salary statement id")),
    responses(
        (status = 200, description = "Statement updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Statement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "salaries"
)]
pub async fn update_statement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSalaryInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .payroll
        .update_statement(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Mark a statement paid and stamp the employee's last pay check
#[utoipa::path(
    post,
    path = "/api/v1/salaries/{id}/confirm-payment",
    request_body = ConfirmPaymentInput,
    params(("id" = i32, Path, description = "Salary statement id")),
    responses(
        (status = 200, description = "Payment confirmed", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Statement not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Employee of the statement is gone", body = crate::errors::ErrorResponse)
    ),
    tag = "salaries"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ConfirmPaymentInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let paid = state
        .services
        .payroll
        .confirm_payment(id, payload)
        .await
        .map_err(map_service_error)?;

    info!("Salary statement paid: {}", paid.id);

    Ok(success_response(paid))
}

/// Delete a statement and release its claimed works
#[utoipa::path(
    delete,
    path = "/api/v1/salaries/{id}",
    params(("id" = i32, Path, description = "Salary statement id")),
    responses(
        (status = 204, description = "Statement deleted"),
        (status = 400, description = "Statement does not exist", body = crate::errors::ErrorResponse)
    ),
    tag = "salaries"
)]
pub async fn delete_statement(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .payroll
        .delete_statement(id)
        .await
        .map_err(map_service_error)?;

    info!("Salary statement deleted: {}", id);

    Ok(no_content_response())
}

/// Creates the router for payroll endpoints
pub fn salary_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_statement).get(list_statements))
        .route(
            "/:id",
            get(get_statement)
                .put(update_statement)
                .delete(delete_statement),
        )
        .route("/:id/confirm-payment", post(confirm_payment))
}
