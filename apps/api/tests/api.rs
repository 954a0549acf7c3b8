//! End-to-end tests against the full router on an in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use orderdesk_api::{router, ApiConfig, AppState};
use orderdesk_core::VendorInput;
use orderdesk_db::{Database, DbConfig};

async fn test_app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.vendors()
        .insert(&VendorInput {
            id: Some("V001".to_string()),
            name: "Juan Perez".to_string(),
            route: Some("Ruta Norte".to_string()),
        })
        .await
        .unwrap();

    let config = ApiConfig {
        jwt_secret: "integration-secret".to_string(),
        fonts_dir: "/nonexistent/fonts".into(),
        ..ApiConfig::default()
    };

    router(Arc::new(AppState::new(db, config)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "vendor_id": "V001", "name": "juan perez" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Creates one product (100.00, stock 50) and one client; returns their ids.
async fn seed_catalog(app: &Router, token: &str) -> (String, String) {
    let (status, product) = send(
        app,
        Method::POST,
        "/api/products",
        Some(token),
        Some(json!({ "code": "AGUA-5G", "name": "Agua 5 galones", "price_cents": 10000, "stock": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, client) = send(
        app,
        Method::POST,
        "/api/clients",
        Some(token),
        Some(json!({ "name": "Colmado La Esquina", "rnc": "101234567" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        product["id"].as_str().unwrap().to_string(),
        client["id"].as_str().unwrap().to_string(),
    )
}

async fn issue_invoice(app: &Router, token: &str, product_id: &str, client_id: &str) -> Value {
    let (status, detail) = send(
        app,
        Method::POST,
        "/api/transactions/invoices",
        Some(token),
        Some(json!({
            "client_id": client_id,
            "lines": [{ "product_id": product_id, "quantity": 2 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    detail
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["pending_migrations"], 0);
}

#[tokio::test]
async fn login_rejects_wrong_name() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "vendor_id": "V001", "name": "Someone Else" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn login_returns_session_with_settings() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "vendor_id": "V001", "name": "Juan Perez" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["vendor"]["id"], "V001");
    assert_eq!(body["session"]["settings"]["tax_mode"], "additive");
    assert_eq!(body["session"]["settings"]["tax_rate_bps"], 1800);
}

#[tokio::test]
async fn malformed_login_body_is_a_validation_error() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "vendor_id": 5 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = test_app().await;

    let (status, _) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/products", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = test_app().await;
    let token = login(&app).await;

    let (status, _) = send(&app, Method::GET, "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_product_code_conflicts() {
    let app = test_app().await;
    let token = login(&app).await;
    seed_catalog(&app, &token).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({ "code": "AGUA-5G", "name": "Otra agua", "price_cents": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn malformed_catalog_ids_are_bad_requests() {
    let app = test_app().await;
    let token = login(&app).await;

    for path in ["/api/products/not-a-uuid", "/api/clients/123"] {
        let (status, body) = send(&app, Method::GET, path, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/clients/550e8400-e29b-41d4-a716-446655440000",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_search_finds_by_code_and_name() {
    let app = test_app().await;
    let token = login(&app).await;
    seed_catalog(&app, &token).await;

    let (status, body) = send(&app, Method::GET, "/api/products?q=agua&limit=10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, Method::GET, "/api/products?q=leche", Some(&token), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invoice_then_full_payment() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;

    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    let tx = &invoice["transaction"];
    assert_eq!(tx["control_number"], "FAC-000001");
    assert_eq!(tx["vendor_id"], "V001");
    assert_eq!(tx["subtotal_cents"], 20000);
    assert_eq!(tx["tax_cents"], 3600);
    assert_eq!(tx["total_cents"], 23600);
    assert_eq!(tx["status"], "pending");

    let invoice_id = tx["id"].as_str().unwrap();
    let (status, receipt) = send(
        &app,
        Method::POST,
        &format!("/api/transactions/{invoice_id}/payments"),
        Some(&token),
        Some(json!({ "amounts": { "cash": 20000, "transfer": 3600 } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["transaction"]["control_number"], "REC-000001");
    assert_eq!(receipt["references"][0]["total_cents"], 23600);

    let (_, detail) = send(
        &app,
        Method::GET,
        &format!("/api/transactions/{invoice_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["transaction"]["pending_cents"], 0);
    assert_eq!(detail["transaction"]["status"], "paid");

    let (_, client) = send(&app, Method::GET, &format!("/api/clients/{client_id}"), Some(&token), None).await;
    assert_eq!(client["debit_cents"], 0);

    let (_, list) = send(
        &app,
        Method::GET,
        "/api/transactions?kind=payment",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn overpayment_is_rejected_without_side_effects() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;
    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    let invoice_id = invoice["transaction"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/transactions/{invoice_id}/payments"),
        Some(&token),
        Some(json!({ "amounts": { "cash": 30000 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PAYMENT_ERROR");

    let (_, detail) = send(
        &app,
        Method::GET,
        &format!("/api/transactions/{invoice_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["transaction"]["pending_cents"], 23600);
    assert!(detail["references"].as_array().unwrap().is_empty());

    let (_, list) = send(&app, Method::GET, "/api/transactions?kind=payment", Some(&token), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn negative_tender_is_rejected() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;
    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    let invoice_id = invoice["transaction"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/transactions/{invoice_id}/payments"),
        Some(&token),
        Some(json!({ "amounts": { "cash": -5, "card": 0, "transfer": 0, "check": 0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PAYMENT_ERROR");
    assert_eq!(body["message"], "cash amount cannot be negative");

    let (_, detail) = send(
        &app,
        Method::GET,
        &format!("/api/transactions/{invoice_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(detail["transaction"]["pending_cents"], 23600);
}

#[tokio::test]
async fn amounts_beyond_i64_are_rejected_not_wrapped() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;
    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    let invoice_id = invoice["transaction"]["id"].as_str().unwrap();

    let (status, preview) = send(
        &app,
        Method::POST,
        "/api/calc/payment",
        Some(&token),
        Some(json!({ "amounts": { "cash": i64::MAX, "card": 1 }, "pending": 10000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["valid"], false);
    assert_eq!(preview["remaining"], 10000);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/transactions/{invoice_id}/payments"),
        Some(&token),
        Some(json!({ "amounts": { "cash": i64::MAX, "card": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "PAYMENT_ERROR");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/calc/totals",
        Some(&token),
        Some(json!({ "lines": [{ "unit_price": i64::MAX / 2, "quantity": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&token),
        Some(json!({ "code": "ORO", "name": "Lingote", "price_cents": i64::MAX / 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn referenced_client_cannot_be_deleted() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;
    issue_invoice(&app, &token, &product_id, &client_id).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/api/clients/{client_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/products/{product_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn inclusive_settings_apply_to_new_invoices() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;

    let (_, mut settings) = send(&app, Method::GET, "/api/settings", Some(&token), None).await;
    settings["tax_mode"] = json!("inclusive");
    let (status, _) = send(&app, Method::PUT, "/api/settings", Some(&token), Some(settings)).await;
    assert_eq!(status, StatusCode::OK);

    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    assert_eq!(invoice["transaction"]["subtotal_cents"], 16949);
    assert_eq!(invoice["transaction"]["tax_cents"], 3051);
    assert_eq!(invoice["transaction"]["total_cents"], 20000);
    assert_eq!(invoice["transaction"]["tax_mode"], "inclusive");
}

#[tokio::test]
async fn calc_endpoints() {
    let app = test_app().await;
    let token = login(&app).await;

    let (status, totals) = send(
        &app,
        Method::POST,
        "/api/calc/totals",
        Some(&token),
        Some(json!({ "lines": [{ "unit_price": 10000, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(totals, json!({ "subtotal": 10000, "tax": 1800, "total": 11800 }));

    let (_, totals) = send(
        &app,
        Method::POST,
        "/api/calc/totals",
        Some(&token),
        Some(json!({
            "lines": [{ "unit_price": 11800, "quantity": 1 }],
            "tax_mode": "inclusive",
            "tax_rate": 18.0
        })),
    )
    .await;
    assert_eq!(totals, json!({ "subtotal": 10000, "tax": 1800, "total": 11800 }));

    let (status, preview) = send(
        &app,
        Method::POST,
        "/api/calc/payment",
        Some(&token),
        Some(json!({ "amounts": { "cash": 5000, "card": 2500 }, "pending": 10000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["valid"], true);
    assert_eq!(preview["remaining"], 2500);

    let (_, preview) = send(
        &app,
        Method::POST,
        "/api/calc/payment",
        Some(&token),
        Some(json!({ "amounts": { "cash": 12000 }, "pending": 10000 })),
    )
    .await;
    assert_eq!(preview["valid"], false);
    assert_eq!(preview["remaining"], 10000);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/calc/payment",
        Some(&token),
        Some(json!({ "amounts": { "cash": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pdf_without_fonts_is_unavailable() {
    let app = test_app().await;
    let token = login(&app).await;
    let (product_id, client_id) = seed_catalog(&app, &token).await;
    let invoice = issue_invoice(&app, &token, &product_id, &client_id).await;
    let invoice_id = invoice["transaction"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/facturas/pdf/{invoice_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "UNAVAILABLE");

    let (status, _) = send(&app, Method::GET, "/api/transactions/missing/pdf", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
