mod common;

use axum::{
    body,
    http::{Method, StatusCode},
    response::Response,
};
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use workshop_api::entities::specification;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn spec_stock(app: &TestApp, id: &str) -> i32 {
    specification::Entity::find_by_id(id.to_string())
        .one(&*app.state.db)
        .await
        .expect("load specification")
        .expect("specification exists")
        .stock
}

#[tokio::test]
async fn purchase_form_lifecycle_over_http() {
    let app = TestApp::new().await;
    app.seed_component("CU-03", "Copper", None).await;
    let vendor_id = app.seed_vendor("Acme Metals").await;
    app.seed_specification("CU-03-A", "CU-03", vendor_id, 0).await;

    // Order 100 units; the display id is scoped per vendor and year.
    let created = app
        .request(
            Method::POST,
            "/api/v1/instock/forms",
            Some(json!({
                "vendor_id": vendor_id,
                "create_time": "2024-01-05T10:00:00",
                "amount": 500.0,
                "items": [{
                    "specification_id": "CU-03-A",
                    "order_quantity": 100,
                    "unit_cost": 5.0
                }]
            })),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let detail = response_json(created).await;
    assert_eq!(
        detail["form"]["display_form_id"],
        format!("20240105-{:03}-0001", vendor_id)
    );
    assert_eq!(detail["form"]["form_status"], "ongoing");
    assert_eq!(detail["form"]["paid"], false);
    assert_eq!(detail["items"][0]["warehouse_quantity"], 0);
    let form_id = detail["form"]["form_id"].as_i64().expect("form id");
    let item_id = detail["items"][0]["instock_item_id"]
        .as_i64()
        .expect("item id");

    let listed = app
        .request(Method::GET, "/api/v1/instock/forms?page=1&limit=10", None)
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(response_json(listed).await["total"], 1);

    // The open board shows the outstanding delivery.
    let open = app
        .request(Method::GET, "/api/v1/instock/items/open", None)
        .await;
    let open_body = response_json(open).await;
    assert_eq!(open_body.as_array().map(Vec::len), Some(1));
    assert_eq!(open_body[0]["vendor_id"], vendor_id);
    assert_eq!(open_body[0]["item"]["order_quantity"], 100);

    // Two partial deliveries run the balance to the ordered quantity.
    let first = app
        .request(
            Method::POST,
            "/api/v1/instock/receipts",
            Some(json!({
                "instock_item_id": item_id,
                "amount": 40,
                "operator": "zhang"
            })),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(response_json(first).await["warehouse_quantity"], 40);

    let second = app
        .request(
            Method::POST,
            "/api/v1/instock/receipts",
            Some(json!({
                "instock_item_id": item_id,
                "amount": 60,
                "operator": "zhang"
            })),
        )
        .await;
    assert_eq!(response_json(second).await["warehouse_quantity"], 100);

    assert_eq!(spec_stock(&app, "CU-03-A").await, 100);

    // The ledger keeps both movements with running balances.
    let item_ledger = app
        .request(
            Method::GET,
            &format!("/api/v1/instock/items/{}/records", item_id),
            None,
        )
        .await;
    let item_records = response_json(item_ledger).await;
    assert_eq!(item_records.as_array().map(Vec::len), Some(2));
    assert_eq!(item_records[0]["amount_in"], 40);
    assert_eq!(item_records[0]["balance"], 40);
    assert_eq!(item_records[1]["amount_in"], 60);
    assert_eq!(item_records[1]["balance"], 100);
    assert_eq!(item_records[0]["operator"], "zhang");

    let form_ledger = app
        .request(
            Method::GET,
            &format!("/api/v1/instock/forms/{}/records", form_id),
            None,
        )
        .await;
    assert_eq!(
        response_json(form_ledger).await.as_array().map(Vec::len),
        Some(2)
    );

    let ranged = app
        .request(
            Method::GET,
            "/api/v1/instock/records?start_date=2020-01-01&end_date=2030-12-31",
            None,
        )
        .await;
    assert_eq!(ranged.status(), StatusCode::OK);
    assert_eq!(response_json(ranged).await.as_array().map(Vec::len), Some(2));

    // Fully received: off the open board.
    let open_after = app
        .request(Method::GET, "/api/v1/instock/items/open", None)
        .await;
    assert_eq!(
        response_json(open_after).await.as_array().map(Vec::len),
        Some(0)
    );

    let paid = app
        .request(
            Method::PUT,
            &format!("/api/v1/instock/forms/{}/paid", form_id),
            Some(json!({ "paid": true })),
        )
        .await;
    assert_eq!(response_json(paid).await["paid"], true);

    let finished = app
        .request(
            Method::PUT,
            &format!("/api/v1/instock/forms/{}/vendor/{}", form_id, vendor_id),
            Some(json!({ "form_status": "finished" })),
        )
        .await;
    assert_eq!(response_json(finished).await["form_status"], "finished");

    let historical = app
        .request(Method::GET, "/api/v1/instock/forms/historical", None)
        .await;
    assert_eq!(
        response_json(historical).await.as_array().map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn procurement_errors_are_mapped_to_statuses() {
    let app = TestApp::new().await;
    app.seed_component("CU-03", "Copper", None).await;
    let vendor_id = app.seed_vendor("Acme Metals").await;
    app.seed_specification("CU-03-A", "CU-03", vendor_id, 0).await;

    // Unknown vendor
    let unknown_vendor = app
        .request(
            Method::POST,
            "/api/v1/instock/forms",
            Some(json!({ "vendor_id": 9999, "amount": 0.0 })),
        )
        .await;
    assert_eq!(unknown_vendor.status(), StatusCode::NOT_FOUND);

    // Receipt against a missing item
    let missing_item = app
        .request(
            Method::POST,
            "/api/v1/instock/receipts",
            Some(json!({ "instock_item_id": 12345, "amount": 5 })),
        )
        .await;
    assert_eq!(missing_item.status(), StatusCode::NOT_FOUND);
    let body = response_json(missing_item).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["timestamp"].is_string());

    // Zero-amount receipt fails validation before touching the ledger.
    let zero_amount = app
        .request(
            Method::POST,
            "/api/v1/instock/receipts",
            Some(json!({ "instock_item_id": 1, "amount": 0 })),
        )
        .await;
    assert_eq!(zero_amount.status(), StatusCode::BAD_REQUEST);

    // Vendor scoping: the right form id under the wrong vendor is a miss.
    let created = app
        .request(
            Method::POST,
            "/api/v1/instock/forms",
            Some(json!({ "vendor_id": vendor_id, "amount": 100.0 })),
        )
        .await;
    let form_id = response_json(created).await["form"]["form_id"]
        .as_i64()
        .expect("form id");

    let wrong_vendor = app
        .request(
            Method::PUT,
            &format!("/api/v1/instock/forms/{}/vendor/{}", form_id, vendor_id + 1),
            Some(json!({ "amount": 1.0 })),
        )
        .await;
    assert_eq!(wrong_vendor.status(), StatusCode::NOT_FOUND);
}
