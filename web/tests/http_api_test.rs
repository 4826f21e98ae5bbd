//! End-to-end tests of the HTTP API over the in-memory store.

#![allow(clippy::unwrap_used)]

use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum_test::TestServer;
use kiosk_core::{BottleSize, Order, OrderStatus, Product, ProductId, SlotAssignment, Variant};
use kiosk_testing::{ADMIN_PASSWORD, ADMIN_USERNAME, MockPaymentGateway, ProductBuilder, TestKiosk};
use kiosk_web::{AppState, build_router};
use serde_json::{Value, json};

struct Api {
    server: TestServer,
    harness: TestKiosk,
}

impl Api {
    fn new(harness: TestKiosk) -> Self {
        let server = TestServer::new(build_router(AppState::new(harness.kiosk.clone()))).unwrap();
        Self { server, harness }
    }

    async fn product(&self, builder: ProductBuilder) -> Product {
        self.harness.kiosk.catalog.create(builder.build()).await.unwrap()
    }

    async fn login(&self) -> (HeaderName, HeaderValue) {
        let response = self
            .server
            .post("/api/admin/login")
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .await;
        response.assert_status_ok();
        let token = response.json::<Value>()["token"].as_str().unwrap().to_string();
        (header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
    }
}

fn error_code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_reports_empty_catalog_as_degraded() {
    let api = Api::new(TestKiosk::new());

    let response = api.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "degraded");
}

#[tokio::test]
async fn test_public_catalog_hides_unavailable_products() {
    let api = Api::new(TestKiosk::new());
    let visible = api.product(ProductBuilder::new("Cedar Smoke")).await;
    let hidden = api.product(ProductBuilder::new("Prototype").unavailable()).await;

    let listed: Vec<Product> = api.server.get("/api/products").await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, visible.id);

    api.server
        .get(&format!("/api/products/{}", hidden.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spray_order_settles_through_checkout_and_verify() {
    let api = Api::new(TestKiosk::new());
    let product = api.product(ProductBuilder::new("Neroli Tide").spray(10)).await;

    let response = api
        .server
        .post("/api/orders/spray")
        .json(&json!({ "product_id": product.id, "payment_method": "upi" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let order: Order = response.json();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount, product.prices.spray);

    api.server
        .post(&format!("/api/orders/{}/checkout", order.id))
        .await
        .assert_status_ok();

    let proof = MockPaymentGateway::proof_for(order.id);
    let settled: Order = api
        .server
        .post(&format!("/api/orders/{}/verify", order.id))
        .json(&proof)
        .await
        .json();
    assert_eq!(settled.status, OrderStatus::Completed);

    // A repeated verify does not decrement twice
    api.server
        .post(&format!("/api/orders/{}/verify", order.id))
        .json(&proof)
        .await
        .assert_status_ok();
    let stock = api.harness.kiosk.catalog.get(product.id).await.unwrap().stock;
    assert_eq!(stock.get(Variant::Spray), 9);
}

#[tokio::test]
async fn test_declined_payment_answers_402_and_fails_order() {
    let api = Api::new(TestKiosk::with_gateway(MockPaymentGateway::declining("card declined")));
    let product = api.product(ProductBuilder::new("Velvet Oud").ml30(2)).await;

    let order: Order = api
        .server
        .post("/api/orders/bottles")
        .json(&json!({
            "items": [{ "product_id": product.id, "bottle_size": "30ml" }],
            "payment_method": "card",
        }))
        .await
        .json();

    let response = api
        .server
        .post(&format!("/api/orders/{}/verify", order.id))
        .json(&MockPaymentGateway::proof_for(order.id))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert_eq!(error_code(&response.json()), "PAYMENT_FAILED");

    let failed: Order = api.server.get(&format!("/api/orders/{}", order.id)).await.json();
    assert_eq!(failed.status, OrderStatus::Failed);
    let stock = api.harness.kiosk.catalog.get(product.id).await.unwrap().stock;
    assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml30)), 2);
}

#[tokio::test]
async fn test_verify_rejects_proof_for_another_order() {
    let api = Api::new(TestKiosk::new());
    let cheap = api.product(ProductBuilder::new("Cheap").spray(5)).await;
    let pricey = api.product(ProductBuilder::new("Pricey").ml100(20)).await;

    let spray: Order = api
        .server
        .post("/api/orders/spray")
        .json(&json!({ "product_id": cheap.id, "payment_method": "upi" }))
        .await
        .json();
    let bottle: Order = api
        .server
        .post("/api/orders/bottles")
        .json(&json!({
            "items": [{ "product_id": pricey.id, "bottle_size": "100ml" }],
            "payment_method": "upi",
        }))
        .await
        .json();

    let response = api
        .server
        .post(&format!("/api/orders/{}/verify", bottle.id))
        .json(&MockPaymentGateway::proof_for(spray.id))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "PROOF_MISMATCH");

    let pending: Order = api.server.get(&format!("/api/orders/{}", bottle.id)).await.json();
    assert_eq!(pending.status, OrderStatus::Pending);
    let stock = api.harness.kiosk.catalog.get(pricey.id).await.unwrap().stock;
    assert_eq!(stock.get(Variant::Bottle(BottleSize::Ml100)), 20);
}

#[tokio::test]
async fn test_spray_order_rejects_a_foreign_price() {
    let api = Api::new(TestKiosk::new());
    let product = api.product(ProductBuilder::new("Neroli Tide").spray(10)).await;

    let response = api
        .server
        .post("/api/orders/spray")
        .json(&json!({ "product_id": product.id, "payment_method": "upi", "amount": 1 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "PRICE_MISMATCH");

    let response = api
        .server
        .post("/api/orders/spray")
        .json(&json!({ "product_id": product.id, "payment_method": "upi", "amount": product.prices.spray }))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_out_of_stock_order_is_rejected_up_front() {
    let api = Api::new(TestKiosk::new());
    let product = api.product(ProductBuilder::new("Empty").empty()).await;

    let response = api
        .server
        .post("/api/orders/spray")
        .json(&json!({ "product_id": product.id, "payment_method": "wallet" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&response.json()), "OUT_OF_STOCK");
}

#[tokio::test]
async fn test_admin_routes_require_a_session() {
    let api = Api::new(TestKiosk::new());

    api.server.get("/api/admin/slots").await.assert_status(StatusCode::UNAUTHORIZED);

    let response = api
        .server
        .post("/api/admin/login")
        .json(&json!({ "username": ADMIN_USERNAME, "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Invalid credentials");

    let (name, value) = api.login().await;
    api.server
        .get("/api/admin/slots")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status_ok();

    api.server
        .post("/api/admin/logout")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    api.server
        .get("/api/admin/slots")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bottle_slots_cannot_reserve_more_than_stock() {
    let api = Api::new(TestKiosk::new());
    let product = api.product(ProductBuilder::new("Cedar Smoke").ml30(5)).await;
    let (name, value) = api.login().await;

    let response = api
        .server
        .post("/api/admin/slots/bottle/3")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "product_id": product.id, "bottle_size": "30ml", "slot_quantity": 5 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let row: SlotAssignment = response.json();
    assert_eq!(row.slot_quantity, 5);

    let response = api
        .server
        .post("/api/admin/slots/bottle/7")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "product_id": product.id, "bottle_size": "30ml", "slot_quantity": 1 }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_code(&response.json()), "INSUFFICIENT_AVAILABLE");

    let available: Value = api
        .server
        .get(&format!("/api/admin/products/{}/available/30ml", product.id))
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(available["available"], 0);

    let response = api
        .server
        .put(&format!("/api/admin/products/{}/stock", product.id))
        .add_header(name, value)
        .json(&json!({ "variant": "30ml", "quantity": 4 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "BELOW_RESERVED");
}

#[tokio::test]
async fn test_stock_ceiling_and_slot_validation() {
    let api = Api::new(TestKiosk::new());
    let product = api.product(ProductBuilder::new("Neroli Tide")).await;
    let (name, value) = api.login().await;

    let response = api
        .server
        .put(&format!("/api/admin/products/{}/stock", product.id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "variant": "100ml", "quantity": 25 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "LIMIT_EXCEEDED");

    let response = api
        .server
        .put("/api/admin/slots/spray/6")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "product_id": product.id }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "INVALID_SLOT");

    // Bottles cannot go into a spray slot
    let response = api
        .server
        .post("/api/admin/slots/spray/2")
        .add_header(name, value)
        .json(&json!({ "product_id": product.id, "bottle_size": "30ml", "slot_quantity": 1 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response.json()), "VARIANT_MISMATCH");
}

#[tokio::test]
async fn test_spray_slot_replacement_and_removal() {
    let api = Api::new(TestKiosk::new());
    let first = api.product(ProductBuilder::new("First")).await;
    let second = api.product(ProductBuilder::new("Second")).await;
    let (name, value) = api.login().await;

    for product in [&first, &second] {
        api.server
            .put("/api/admin/slots/spray/2")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "product_id": product.id }))
            .await
            .assert_status_ok();
    }

    let rows: Vec<SlotAssignment> = api
        .server
        .get("/api/admin/slots/spray/2")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, second.id);

    api.server
        .delete(&format!("/api/admin/slots/spray/2/products/{}", first.id))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    api.server
        .delete(&format!("/api/admin/slots/spray/2/products/{}", second.id))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let cleared: Value = api
        .server
        .delete("/api/admin/slots/spray/2")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(cleared["removed"], 0);
}

#[tokio::test]
async fn test_admin_catalog_crud() {
    let api = Api::new(TestKiosk::new());
    let (name, value) = api.login().await;

    let response = api
        .server
        .post("/api/admin/products")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "name": "Amber Dusk",
            "prices": { "spray": 500, "ml30": 3000, "ml60": 5000, "ml100": 8000 },
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Product = response.json();
    assert_eq!(created.stock.get(Variant::Spray), 100);

    let updated: Product = api
        .server
        .patch(&format!("/api/admin/products/{}", created.id))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "description": "Amber and tonka" }))
        .await
        .json();
    assert_eq!(updated.description, "Amber and tonka");
    assert_eq!(updated.name, "Amber Dusk");

    api.server
        .delete(&format!("/api/admin/products/{}", created.id))
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    api.server
        .delete(&format!("/api/admin/products/{}", created.id))
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(api.harness.kiosk.catalog.get(ProductId::new(1)).await.is_err());
}

#[tokio::test]
async fn test_responses_carry_correlation_id() {
    let api = Api::new(TestKiosk::new());

    let response = api.server.get("/health").await;
    assert!(response.headers().contains_key(kiosk_web::CORRELATION_ID_HEADER));
}
