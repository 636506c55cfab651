mod common;

use axum::{
    body,
    http::{Method, StatusCode},
    response::Response,
};
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use workshop_api::entities::{product, specification};

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn seed_widget_catalog(app: &TestApp) {
    app.seed_product("P-100", "Widget").await;
    app.seed_process("PR-1", "P-100", "Cutting", 1, 2.0).await;
    app.seed_process("PR-2", "P-100", "Assembly", 2, 1.5).await;
    app.seed_employee(7, "Ana").await;
    app.seed_component("CU-03", "Copper", None).await;
    let vendor_id = app.seed_vendor("Acme Metals").await;
    app.seed_specification("CU-03-A", "CU-03", vendor_id, 500)
        .await;
}

#[tokio::test]
async fn batch_lifecycle_over_http() {
    let app = TestApp::new().await;
    seed_widget_catalog(&app).await;

    // Create: the id derives from the start month, stages fan out from
    // the product's process list.
    let created = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": "P-100",
                "plan_amount": 200,
                "start": "2024-03-05T08:00:00"
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(created.headers().get("x-request-id").is_some());

    let detail = response_json(created).await;
    assert_eq!(detail["batch"]["id"], 240301);
    assert_eq!(detail["batch"]["status"], "unstarted");
    assert_eq!(detail["stages"].as_array().map(Vec::len), Some(2));
    assert_eq!(detail["stages"][0]["process_id"], "PR-1");
    assert_eq!(detail["stages"][0]["unit_pay"], 2.0);
    assert_eq!(detail["stages"][1]["process_id"], "PR-2");
    let stage_one = detail["stages"][0]["id"].as_i64().expect("stage id");
    let stage_two = detail["stages"][1]["id"].as_i64().expect("stage id");

    // The fresh batch shows up in the unfinished listing.
    let listed = app
        .request(
            Method::GET,
            "/api/v1/batches?unfinished=true&page=1&limit=10",
            None,
        )
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let page = response_json(listed).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], 240301);

    // Stage progress: both stages run to completion with some loss.
    for (stage_id, start, end) in [(stage_one, 200, 190), (stage_two, 190, 180)] {
        let updated = app
            .request(
                Method::PUT,
                &format!("/api/v1/batches/stages/{}", stage_id),
                Some(json!({
                    "status": "finished",
                    "start_amount": start,
                    "end_amount": end
                })),
            )
            .await;
        assert_eq!(updated.status(), StatusCode::OK);
    }

    // A day of piecework on the first stage, with its material lines.
    let work = app
        .request(
            Method::POST,
            "/api/v1/works",
            Some(json!({
                "batch_process_id": stage_one,
                "employee_id": 7,
                "employee_name": "Ana",
                "work_date": "2024-03-06",
                "unit_pay": 2.0,
                "complete_unit": 50,
                "hour_pay": 0.0,
                "complete_hour": 0,
                "plan_unit": 60,
                "product_name": "Widget",
                "process_name": "Cutting",
                "specifications": [{
                    "specification_id": "CU-03-A",
                    "component_name": "Copper",
                    "plan_amount": 120,
                    "actual_amount": 100,
                    "specification_net_price": 4.5,
                    "specification_gross_price": 5.0
                }]
            })),
        )
        .await;
    assert_eq!(work.status(), StatusCode::CREATED);
    let work_body = response_json(work).await;
    assert_eq!(work_body["work"]["check"], false);
    assert_eq!(work_body["specifications"][0]["actual_amount"], 100);

    // Warehouse baseline for the stage; the issue debits spec stock.
    let issued = app
        .request(
            Method::POST,
            "/api/v1/warehouse-records",
            Some(json!({
                "batch_process_id": stage_one,
                "component_id": "CU-03",
                "specification_id": "CU-03-A",
                "component_name": "Copper",
                "consumption": 2,
                "specification_net_price": 4.5,
                "specification_gross_price": 5.0
            })),
        )
        .await;
    assert_eq!(issued.status(), StatusCode::CREATED);

    let spec = specification::Entity::find_by_id("CU-03-A".to_string())
        .one(&*app.state.db)
        .await
        .expect("load specification")
        .expect("specification exists");
    assert_eq!(spec.stock, 498);

    // Completion stamps the batch and rolls finished goods into the
    // product inventory.
    let completed = app
        .request(
            Method::POST,
            "/api/v1/batches/240301/complete",
            Some(json!({ "actual_amount": 180 })),
        )
        .await;
    assert_eq!(completed.status(), StatusCode::OK);
    let completed_body = response_json(completed).await;
    assert_eq!(completed_body["status"], "finished");
    assert_eq!(completed_body["actual_amount"], 180);

    let widget = product::Entity::find_by_id("P-100".to_string())
        .one(&*app.state.db)
        .await
        .expect("load product")
        .expect("product exists");
    assert_eq!(widget.inventory, 180);

    // Cost report: one row per stage plus the batch total.
    let report = app
        .request(Method::GET, "/api/v1/batches/240301/cost-report", None)
        .await;
    assert_eq!(report.status(), StatusCode::OK);
    let report_body = response_json(report).await;
    assert_eq!(report_body["batch_id"], 240301);

    let rows = report_body["rows"].as_array().expect("report rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["scope"], "1 - Cutting");
    assert_eq!(rows[0]["standard_component_cost"], 2000.0);
    assert_eq!(rows[0]["actual_component_cost"], 500.0);
    assert_eq!(rows[0]["actual_labor_cost"], 100.0);
    assert_eq!(rows[1]["scope"], "2 - Assembly");
    assert_eq!(rows[1]["standard_labor_cost"], 285.0);
    assert_eq!(rows[2]["scope"], "batch 240301 total");
    assert_eq!(rows[2]["start_amount"], 200);
    assert_eq!(rows[2]["end_amount"], 180);
    assert_eq!(rows[2]["standard_labor_cost"], 685.0);
    assert_eq!(rows[2]["actual_labor_cost"], 100.0);

    assert_eq!(report_body["work_details"][0]["employee_name"], "Ana");
    assert_eq!(report_body["work_details"][0]["actual_unit_labor_cost"], 2.0);
    assert_eq!(report_body["standard_unit_consumption"]["Copper"], 2);
    assert_eq!(report_body["actual_consumption"]["Copper"], 100);

    // The unclaimed work feeds the payroll view.
    let unchecked = app
        .request(
            Method::GET,
            "/api/v1/works/unchecked/7?start_date=2024-03-01&end_date=2024-03-31",
            None,
        )
        .await;
    assert_eq!(unchecked.status(), StatusCode::OK);
    let unchecked_body = response_json(unchecked).await;
    assert_eq!(unchecked_body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn batch_errors_surface_as_structured_responses() {
    let app = TestApp::new().await;
    seed_widget_catalog(&app).await;

    // Unknown product
    let missing = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": "P-999",
                "plan_amount": 10,
                "start": "2024-03-05T08:00:00"
            })),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let missing_body = response_json(missing).await;
    assert_eq!(missing_body["error"], "Not Found");
    assert!(missing_body["message"]
        .as_str()
        .expect("message")
        .contains("P-999"));
    assert!(missing_body["request_id"].is_string());

    // Validation failure
    let invalid = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": "P-100",
                "plan_amount": 0,
                "start": "2024-03-05T08:00:00"
            })),
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    // Unknown batch
    let not_found = app.request(Method::GET, "/api/v1/batches/999999", None).await;
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

    // Deleting twice: the second call reports the stale id.
    let created = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": "P-100",
                "plan_amount": 10,
                "start": "2024-03-05T08:00:00"
            })),
        )
        .await;
    let id = response_json(created).await["batch"]["id"]
        .as_i64()
        .expect("batch id");

    let first_delete = app
        .request(Method::DELETE, &format!("/api/v1/batches/{}", id), None)
        .await;
    assert_eq!(first_delete.status(), StatusCode::NO_CONTENT);

    let second_delete = app
        .request(Method::DELETE, &format!("/api/v1/batches/{}", id), None)
        .await;
    assert_eq!(second_delete.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_statuses_starts_due_batches() {
    let app = TestApp::new().await;
    seed_widget_catalog(&app).await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/batches",
            Some(json!({
                "product_id": "P-100",
                "plan_amount": 50,
                "start": "2024-03-05T08:00:00"
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let refreshed = app
        .request(Method::POST, "/api/v1/batches/refresh-statuses", None)
        .await;
    assert_eq!(refreshed.status(), StatusCode::OK);
    assert_eq!(response_json(refreshed).await["transitioned"], 1);

    // Idempotent: nothing left to start.
    let again = app
        .request(Method::POST, "/api/v1/batches/refresh-statuses", None)
        .await;
    assert_eq!(response_json(again).await["transitioned"], 0);
}

#[tokio::test]
async fn status_and_health_report_ok() {
    let app = TestApp::new().await;

    let status = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(status.status(), StatusCode::OK);
    let status_body = response_json(status).await;
    assert_eq!(status_body["success"], true);
    assert_eq!(status_body["data"]["service"], "workshop-api");

    let health = app.request(Method::GET, "/api/v1/health", None).await;
    assert_eq!(health.status(), StatusCode::OK);
    let health_body = response_json(health).await;
    assert_eq!(health_body["data"]["checks"]["database"], "healthy");
}
