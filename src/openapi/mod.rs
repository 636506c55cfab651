use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workshop API",
        version = "1.0.0",
        description = r#"
# Workshop Manufacturing Operations API

A backend for running a small factory floor: production batches and their
process stages, piecework and hourly work logs, warehouse material issue,
purchasing with delivery tracking, and payroll statements.

## Features

- **Batch Management**: Date-derived batch ids, stage pipelines, status roll-up
- **Work Logs**: Piecework and hourly work entries with per-work material specifications
- **Warehouse**: Material issue against batch stages with stock and low-stock tracking
- **Purchasing**: Purchase forms, instock items, delivery receipts and ledgers
- **Payroll**: Salary statements that claim work entries and track payment
- **Cost Reports**: Per-batch labor and material cost roll-ups

## Error Handling

The API uses consistent error response formats with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "request_id": "2b5e8d1c",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints support pagination with the following query parameters:
- `page`: Page number (default: 1)
- `limit`: Items per page (default: 20)
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "batches", description = "Production batch endpoints"),
        (name = "works", description = "Work log endpoints"),
        (name = "warehouse", description = "Material issue endpoints"),
        (name = "stock", description = "Stock level endpoints"),
        (name = "instock", description = "Purchasing and delivery endpoints"),
        (name = "salaries", description = "Payroll endpoints")
    ),
    paths(
        // Batches
        crate::handlers::batches::create_batch,
        crate::handlers::batches::list_batches,
        crate::handlers::batches::get_batch,
        crate::handlers::batches::update_batch,
        crate::handlers::batches::refresh_statuses,
        crate::handlers::batches::complete_batch,
        crate::handlers::batches::delete_batch,
        crate::handlers::batches::batch_stages,
        crate::handlers::batches::update_stage,
        crate::handlers::batches::batch_cost_report,

        // Works
        crate::handlers::works::create_work,
        crate::handlers::works::list_works,
        crate::handlers::works::unchecked_works,
        crate::handlers::works::get_work,
        crate::handlers::works::update_work,
        crate::handlers::works::delete_work,

        // Warehouse
        crate::handlers::warehouse::issue_material,
        crate::handlers::warehouse::get_record,
        crate::handlers::warehouse::update_record,
        crate::handlers::warehouse::records_for_stage,
        crate::handlers::warehouse::records_for_component,

        // Stock
        crate::handlers::stock::adjust_specification_stock,
        crate::handlers::stock::low_stock_components,
        crate::handlers::stock::component_stock_level,

        // Purchasing
        crate::handlers::procurement::create_form,
        crate::handlers::procurement::list_forms,
        crate::handlers::procurement::historical_forms,
        crate::handlers::procurement::get_form,
        crate::handlers::procurement::update_form,
        crate::handlers::procurement::set_form_paid,
        crate::handlers::procurement::add_item,
        crate::handlers::procurement::update_item,
        crate::handlers::procurement::open_items,
        crate::handlers::procurement::receive,
        crate::handlers::procurement::records_for_item,
        crate::handlers::procurement::records_for_form,
        crate::handlers::procurement::records_in_range,

        // Payroll
        crate::handlers::payroll::create_statement,
        crate::handlers::payroll::list_statements,
        crate::handlers::payroll::get_statement,
        crate::handlers::payroll::update_statement,
        crate::handlers::payroll::confirm_payment,
        crate::handlers::payroll::delete_statement,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::common::DateRangeParams,

            // Batch types
            crate::services::batches::CreateBatchInput,
            crate::services::batches::UpdateBatchInput,
            crate::services::batches::CompleteBatchInput,
            crate::services::batches::UpdateStageInput,
            crate::services::batches::BatchListFilter,

            // Work log types
            crate::services::works::CreateWorkInput,
            crate::services::works::UpdateWorkInput,
            crate::services::works::WorkSpecificationInput,
            crate::services::works::WorkListFilter,

            // Warehouse and stock types
            crate::services::warehouse::IssueMaterialInput,
            crate::services::warehouse::UpdateWarehouseRecordInput,
            crate::handlers::stock::AdjustStockInput,

            // Purchasing types
            crate::services::procurement::CreatePurchaseFormInput,
            crate::services::procurement::CreateInstockItemInput,
            crate::services::procurement::UpdatePurchaseFormInput,
            crate::services::procurement::AddInstockItemInput,
            crate::services::procurement::UpdateInstockItemInput,
            crate::services::procurement::ReceiptInput,
            crate::services::procurement::FormListFilter,
            crate::handlers::procurement::SetPaidInput,

            // Payroll types
            crate::services::payroll::CreateSalaryInput,
            crate::services::payroll::UpdateSalaryInput,
            crate::services::payroll::ConfirmPaymentInput,
            crate::services::payroll::SalaryListFilter,

            // Cost report types
            crate::services::reports::CostReportRow,
            crate::services::reports::WorkCostDetail,
            crate::services::reports::BatchCostReport,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
