use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginationParams,
};
use crate::{
    common::DateRangeParams,
    errors::ApiError,
    handlers::AppState,
    services::procurement::{
        AddInstockItemInput, CreatePurchaseFormInput, FormListFilter, ReceiptInput,
        UpdateInstockItemInput, UpdatePurchaseFormInput,
    },
    PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

/// Paid flag toggle for a purchase form.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetPaidInput {
    pub paid: bool,
}

/// Create a purchase form with its ordered items
#[utoipa::path(
    post,
    path = "/api/v1/instock/forms",
    request_body = CreatePurchaseFormInput,
    responses(
        (status = 201, description = "Purchase form created", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Vendor or specification not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Display id allocation kept colliding", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn create_form(
    State(state): State<AppState>,
    Json(payload): Json<CreatePurchaseFormInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .procurement
        .create_form(payload)
        .await
        .map_err(map_service_error)?;

    info!("Purchase form created: {}", detail.form.display_form_id);

    Ok(created_response(detail))
}

/// List purchase forms with optional filtering
#[utoipa::path(
    get,
    path = "/api/v1/instock/forms",
    params(FormListFilter, PaginationParams),
    responses(
        (status = 200, description = "Forms fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "instock"
)]
pub async fn list_forms(
    State(state): State<AppState>,
    Query(filter): Query<FormListFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .procurement
        .list_forms(&filter, pagination.page, pagination.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit,
    )))
}

/// Every form that has left the ongoing state
#[utoipa::path(
    get,
    path = "/api/v1/instock/forms/historical",
    responses(
        (status = 200, description = "Historical forms fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "instock"
)]
pub async fn historical_forms(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let forms = state
        .services
        .procurement
        .historical_forms()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(forms))
}

/// Get a purchase form with its items
#[utoipa::path(
    get,
    path = "/api/v1/instock/forms/{id}",
    params(("id" = i32, Path, description = "Purchase form id")),
    responses(
        (status = 200, description = "Form fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Form not found", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let detail = state
        .services
        .procurement
        .get_form(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Update a purchase form, scoped by form and vendor
#[utoipa::path(
    put,
    path = "/api/v1/instock/forms/{id}/vendor/{vendor_id}",
    request_body = UpdatePurchaseFormInput,
    params(
        ("id" = i32, Path, description = "Purchase form id"),
        ("vendor_id" = i32, Path, description = "Vendor id the form must belong to")
    ),
    responses(
        (status = 200, description = "Form updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "No such form for this vendor", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn update_form(
    State(state): State<AppState>,
    Path((id, vendor_id)): Path<(i32, i32)>,
    Json(payload): Json<UpdatePurchaseFormInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .procurement
        .update_form(id, vendor_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Flip a form's paid flag
#[utoipa::path(
    put,
    path = "/api/v1/instock/forms/{id}/paid",
    request_body = SetPaidInput,
    params(("id" = i32, Path, description = "Purchase form id")),
    responses(
        (status = 200, description = "Paid flag updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 404, description = "Form not found", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn set_form_paid(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SetPaidInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .procurement
        .set_form_paid(id, payload.paid)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Append an item to an existing form
#[utoipa::path(
    post,
    path = "/api/v1/instock/items",
    request_body = AddInstockItemInput,
    responses(
        (status = 201, description = "Item added", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Form not found", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Json(payload): Json<AddInstockItemInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let item = state
        .services
        .procurement
        .add_item(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(item))
}

/// Update an item; warehouse quantity changes move through stock
#[utoipa::path(
    put,
    path = "/api/v1/instock/items/{id}",
    request_body = UpdateInstockItemInput,
    params(("id" = i32, Path, description = "Instock item id")),
    responses(
        (status = 200, description = "Item updated", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or specification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInstockItemInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let updated = state
        .services
        .procurement
        .update_item(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(updated))
}

/// Outstanding deliveries: items of ongoing forms not yet fully received
#[utoipa::path(
    get,
    path = "/api/v1/instock/items/open",
    responses(
        (status = 200, description = "Open items fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "instock"
)]
pub async fn open_items(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = state
        .services
        .procurement
        .open_items()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(items))
}

/// Book a delivery against an item
#[utoipa::path(
    post,
    path = "/api/v1/instock/receipts",
    request_body = ReceiptInput,
    responses(
        (status = 201, description = "Delivery booked", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or specification not found", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<ReceiptInput>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let item = state
        .services
        .procurement
        .receive(payload)
        .await
        .map_err(map_service_error)?;

    info!("Delivery booked: item {} balance {}", item.instock_item_id, item.warehouse_quantity);

    Ok(created_response(item))
}

/// Receipt ledger of one item
#[utoipa::path(
    get,
    path = "/api/v1/instock/items/{id}/records",
    params(("id" = i32, Path, description = "Instock item id")),
    responses(
        (status = 200, description = "Records fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "instock"
)]
pub async fn records_for_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let records = state
        .services
        .procurement
        .records_for_item(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(records))
}

/// Receipt ledger of a whole form
#[utoipa::path(
    get,
    path = "/api/v1/instock/forms/{id}/records",
    params(("id" = i32, Path, description = "Purchase form id")),
    responses(
        (status = 200, description = "Records fetched", body = crate::ApiResponse<serde_json::Value>)
    ),
    tag = "instock"
)]
pub async fn records_for_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let records = state
        .services
        .procurement
        .records_for_form(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(records))
}

/// Receipts booked inside a date range
#[utoipa::path(
    get,
    path = "/api/v1/instock/records",
    params(DateRangeParams),
    responses(
        (status = 200, description = "Records fetched", body = crate::ApiResponse<serde_json::Value>),
        (status = 400, description = "Invalid date range", body = crate::errors::ErrorResponse)
    ),
    tag = "instock"
)]
pub async fn records_in_range(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&params)?;
    let (from, to) = params.to_datetime_range()?;

    let records = state
        .services
        .procurement
        .records_in_range(from, to)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(records))
}

/// Creates the router for procurement endpoints
pub fn instock_routes() -> Router<AppState> {
    Router::new()
        .route("/forms", post(create_form).get(list_forms))
        .route("/forms/historical", get(historical_forms))
        .route("/forms/:id", get(get_form))
        .route("/forms/:id/vendor/:vendor_id", put(update_form))
        .route("/forms/:id/paid", put(set_form_paid))
        .route("/forms/:id/records", get(records_for_form))
        .route("/items", post(add_item))
        .route("/items/open", get(open_items))
        .route("/items/:id", put(update_item))
        .route("/items/:id/records", get(records_for_item))
        .route("/receipts", post(receive))
        .route("/records", get(records_in_range))
}
