//! Integration tests for the HTTP surface.

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::identity::{BUYER_ID_HEADER, SELLER_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
use common::{BuyerId, SellerId};
use document_store::InMemoryDocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;
use workflow::{InMemoryGateway, PaymentSettings};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    api::create_app(api::create_default_state(), get_metrics_handle())
}

fn setup_with_gateway() -> (Router, InMemoryGateway) {
    let gateway = InMemoryGateway::new();
    let state = api::create_state(
        Arc::new(InMemoryDocumentStore::new()),
        api::Collaborators {
            gateway: Arc::new(gateway.clone()),
            ..api::Collaborators::default()
        },
        PaymentSettings::default(),
    );
    (api::create_app(state, get_metrics_handle()), gateway)
}

enum Caller {
    Anonymous,
    Buyer(BuyerId),
    Seller(SellerId),
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    caller: &Caller,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match caller {
        Caller::Anonymous => builder,
        Caller::Buyer(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "BUYER")
            .header(BUYER_ID_HEADER, id.to_string()),
        Caller::Seller(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "SELLER")
            .header(SELLER_ID_HEADER, id.to_string()),
    };
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register_product(app: &Router, seller: &Caller, stock: u32) -> String {
    let (status, product) = call(
        app,
        "POST",
        "/inventory/products",
        seller,
        Some(json!({ "name": "Brass lamp", "price": 2500, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["status"], "ACTIVE");
    product["id"].as_str().unwrap().to_string()
}

async fn stock_of(app: &Router, product_id: &str) -> (u64, String) {
    let (status, product) = call(
        app,
        "GET",
        &format!("/inventory/products/{product_id}"),
        &Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        product["stock"].as_u64().unwrap(),
        product["status"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = call(&app, "GET", "/health", &Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["components"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
}

#[tokio::test]
async fn test_missing_identity_is_401() {
    let app = setup();

    let (status, json) = call(&app, "GET", "/cart", &Caller::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "UNAUTHORIZED");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/cart")
                .header(BUYER_ID_HEADER, "not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let seller_only = Caller::Seller(SellerId::new());
    let (status, _) = call(&app, "POST", "/orders/checkout", &seller_only, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_path_id_is_400() {
    let app = setup();
    let (status, json) = call(
        &app,
        "GET",
        "/inventory/products/not-a-uuid",
        &Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = setup();
    let (status, json) = call(
        &app,
        "GET",
        &format!("/inventory/products/{}", uuid::Uuid::new_v4()),
        &Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_negative_price_is_422() {
    let app = setup();
    let (status, json) = call(
        &app,
        "POST",
        "/inventory/products",
        &Caller::Seller(SellerId::new()),
        Some(json!({ "name": "Brass lamp", "price": -1, "stock": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_checkout_and_cancel_round_trip() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 5).await;

    let (status, cart) = call(
        &app,
        "POST",
        "/cart/items",
        &buyer,
        Some(json!({ "product_id": product_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total"], 7500);

    let (status, order) = call(
        &app,
        "POST",
        "/orders/checkout",
        &buyer,
        Some(json!({ "shipping_address": "12 Canal Road" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "CONFIRMED");
    assert_eq!(order["total"], 7500);
    assert_eq!(stock_of(&app, &product_id).await, (2, "ACTIVE".to_string()));

    let (_, cart) = call(&app, "GET", "/cart", &buyer, None).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    let order_id = order["id"].as_str().unwrap();
    let (status, cancelled) = call(
        &app,
        "POST",
        &format!("/orders/{order_id}/cancel"),
        &buyer,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(stock_of(&app, &product_id).await, (5, "ACTIVE".to_string()));
}

#[tokio::test]
async fn test_empty_checkout_is_422() {
    let app = setup();
    let buyer = Caller::Buyer(BuyerId::new());
    let (status, json) = call(&app, "POST", "/orders/checkout", &buyer, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "EMPTY_CART");
}

#[tokio::test]
async fn test_cart_quantity_updates() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 10).await;
    call(
        &app,
        "POST",
        "/cart/items",
        &buyer,
        Some(json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;

    let (status, cart) = call(
        &app,
        "PUT",
        &format!("/cart/items/{product_id}"),
        &buyer,
        Some(json!({ "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total"], 10000);

    let (status, json) = call(
        &app,
        "PUT",
        &format!("/cart/items/{product_id}"),
        &buyer,
        Some(json!({ "quantity": 11 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "INSUFFICIENT_STOCK");

    let (status, cart) = call(
        &app,
        "PUT",
        &format!("/cart/items/{product_id}"),
        &buyer,
        Some(json!({ "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["total"], 0);
}

#[tokio::test]
async fn test_request_approval_flow() {
    let app = setup();
    let seller_id = SellerId::new();
    let seller = Caller::Seller(seller_id);
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 6).await;

    let (status, request) = call(
        &app,
        "POST",
        "/requests",
        &buyer,
        Some(json!({ "product_id": product_id, "quantity": 2, "message": "Gift wrap please" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "PENDING");
    let request_id = request["id"].as_str().unwrap().to_string();

    let (_, incoming) = call(
        &app,
        "GET",
        "/requests/incoming?status=PENDING",
        &seller,
        None,
    )
    .await;
    assert_eq!(incoming.as_array().unwrap().len(), 1);

    let intruder = Caller::Seller(SellerId::new());
    let (status, json) = call(
        &app,
        "POST",
        &format!("/requests/{request_id}/approve"),
        &intruder,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["kind"], "UNAUTHORIZED");

    let (status, approved) = call(
        &app,
        "POST",
        &format!("/requests/{request_id}/approve"),
        &seller,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "APPROVED");

    let (_, cart) = call(&app, "GET", "/cart", &buyer, None).await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["request_id"], request_id.as_str());
    assert_eq!(stock_of(&app, &product_id).await.0, 6);

    let (status, json) = call(
        &app,
        "POST",
        &format!("/requests/{request_id}/approve"),
        &seller,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "INVALID_STATE");

    let (status, _) = call(
        &app,
        "GET",
        &format!("/requests/{request_id}"),
        &Caller::Seller(seller_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(
        &app,
        "GET",
        &format!("/requests/{request_id}"),
        &Caller::Buyer(BuyerId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approve_beyond_stock_is_422() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 10).await;

    let (_, request) = call(
        &app,
        "POST",
        "/requests",
        &buyer,
        Some(json!({ "product_id": product_id, "quantity": 10 })),
    )
    .await;
    let request_id = request["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        "PUT",
        &format!("/inventory/products/{product_id}/stock"),
        &seller,
        Some(json!({ "stock": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = call(
        &app,
        "POST",
        &format!("/requests/{request_id}/approve"),
        &seller,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "INSUFFICIENT_STOCK");

    let (_, mine) = call(&app, "GET", "/requests?status=PENDING", &buyer, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reject_with_and_without_reason() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 10).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, request) = call(
            &app,
            "POST",
            "/requests",
            &buyer,
            Some(json!({ "product_id": product_id, "quantity": 1 })),
        )
        .await;
        ids.push(request["id"].as_str().unwrap().to_string());
    }

    let (status, rejected) = call(
        &app,
        "POST",
        &format!("/requests/{}/reject", ids[0]),
        &seller,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "REJECTED");
    assert!(rejected["message"].is_null());

    let (status, rejected) = call(
        &app,
        "POST",
        &format!("/requests/{}/reject", ids[1]),
        &seller,
        Some(json!({ "reason": "Out of season" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["message"], "[Rejected: Out of season]");
}

#[tokio::test]
async fn test_order_status_moves_forward_only() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 3).await;
    call(
        &app,
        "POST",
        "/cart/items",
        &buyer,
        Some(json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;
    let (_, order) = call(&app, "POST", "/orders/checkout", &buyer, None).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, shipped) = call(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        &seller,
        Some(json!({ "status": "SHIPPED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shipped["status"], "SHIPPED");

    let (status, json) = call(
        &app,
        "PUT",
        &format!("/orders/{order_id}/status"),
        &seller,
        Some(json!({ "status": "CONFIRMED" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "INVALID_STATE");

    let (_, listed) = call(&app, "GET", "/orders?status=SHIPPED", &buyer, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_capture_settles_stock() {
    let (app, gateway) = setup_with_gateway();
    let seller_id = SellerId::new();
    let seller = Caller::Seller(seller_id);
    let buyer = Caller::Buyer(BuyerId::new());
    let product_id = register_product(&app, &seller, 10).await;

    let (status, payment) = call(
        &app,
        "POST",
        "/payments",
        &buyer,
        Some(json!({
            "cart_id": uuid::Uuid::new_v4(),
            "items": [{
                "product_id": product_id,
                "product_name": "Brass lamp",
                "quantity": 2,
                "price": 2500,
                "seller_id": seller_id,
            }],
            "amount": 5000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["status"], "CREATED");
    assert_eq!(payment["currency"], "INR");

    let gateway_order_id = payment["gateway_order_id"].as_str().unwrap();
    let gateway_payment_id = gateway.record_payment(gateway_order_id, "captured");
    let payment_id = payment["id"].as_str().unwrap();

    let (status, confirmed) = call(
        &app,
        "POST",
        &format!("/payments/{payment_id}/confirm"),
        &buyer,
        Some(json!({ "gateway_payment_id": gateway_payment_id, "signature": "sig" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "SUCCESS");
    assert_eq!(stock_of(&app, &product_id).await.0, 8);

    let (status, json) = call(
        &app,
        "POST",
        &format!("/payments/{payment_id}/confirm"),
        &buyer,
        Some(json!({ "gateway_payment_id": gateway_payment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "INVALID_STATE");
    assert_eq!(stock_of(&app, &product_id).await.0, 8);

    let (status, _) = call(
        &app,
        "GET",
        &format!("/payments/{payment_id}"),
        &Caller::Buyer(BuyerId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_payment_over_ceiling_is_422_and_recorded() {
    let app = setup();
    let buyer = Caller::Buyer(BuyerId::new());

    let (status, json) = call(
        &app,
        "POST",
        "/payments",
        &buyer,
        Some(json!({
            "cart_id": uuid::Uuid::new_v4(),
            "items": [],
            "amount": 1_000_000_001_i64,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "AMOUNT_TOO_LARGE");

    let (_, payments) = call(&app, "GET", "/payments", &buyer, None).await;
    let payments = payments.as_array().unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["status"], "FAILED");
}

#[tokio::test]
async fn test_internal_availability_route() {
    let app = setup();
    let seller = Caller::Seller(SellerId::new());
    let product_id = register_product(&app, &seller, 3).await;

    let (status, json) = call(
        &app,
        "GET",
        &format!("/inventory/products/{product_id}/availability?quantity=3"),
        &Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], true);

    let (_, json) = call(
        &app,
        "GET",
        &format!("/inventory/products/{product_id}/availability?quantity=4"),
        &Caller::Anonymous,
        None,
    )
    .await;
    assert_eq!(json["available"], false);
}
