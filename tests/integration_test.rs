//! Integration tests for the payment and health routes.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use farmeely_api::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use farmeely_api::app::{AppState, PaymentSettings};
use farmeely_api::domain::{HealthResponse, HealthStatus};
use farmeely_api::test_utils::{MockDatabaseClient, MockPaymentGateway};

fn create_test_state() -> (Arc<AppState>, Arc<MockPaymentGateway>) {
    let db = Arc::new(MockDatabaseClient::new());
    let gateway = Arc::new(MockPaymentGateway::new());
    let state = Arc::new(AppState::with_settings(
        db as _,
        Arc::clone(&gateway) as _,
        PaymentSettings::new("https://app.farmeely.com/"),
    ));
    (state, gateway)
}

async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_initialize_payment_success() {
    let (state, gateway) = create_test_state();
    let router = create_router(state);

    let (status, body) = post_json(
        router,
        "/api/paystack/initialize",
        json!({
            "email": "ada@farmeely.com",
            "amount": 500,
            "reference": "wallet_funding_1718000000000_abc123xyz",
            "metadata": {"user_id": "user_1"}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["data"]["reference"],
        "wallet_funding_1718000000000_abc123xyz"
    );
    assert!(body["data"]["access_code"].as_str().unwrap().starts_with("ac_"));

    let intents = gateway.initialized_intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, 50_000);
    assert_eq!(
        intents[0].callback_url,
        "https://app.farmeely.com/dashboard/wallet/verify"
    );
}

#[tokio::test]
async fn test_initialize_payment_rounds_fractional_amount() {
    let (state, gateway) = create_test_state();
    let router = create_router(state);

    let (status, _) = post_json(
        router,
        "/api/paystack/initialize",
        json!({"email": "ada@farmeely.com", "amount": 1234.5, "reference": "ref_frac"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.initialized_intents()[0].amount, 123_450);
}

#[tokio::test]
async fn test_initialize_payment_rejects_invalid_input() {
    for payload in [
        json!({"email": "not-an-email", "amount": 500, "reference": "ref_1"}),
        json!({"email": "ada@farmeely.com", "amount": 0, "reference": "ref_1"}),
        json!({"email": "ada@farmeely.com", "amount": -5, "reference": "ref_1"}),
        json!({"email": "ada@farmeely.com", "amount": 500, "reference": ""}),
        json!({"email": "ada@farmeely.com", "amount": 500}),
    ] {
        let (state, gateway) = create_test_state();
        let router = create_router(state);
        let (status, body) = post_json(router, "/api/paystack/initialize", payload).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["message"].is_string());
        assert!(gateway.initialized_intents().is_empty());
    }
}

#[tokio::test]
async fn test_initialize_payment_gateway_decline() {
    let (state, gateway) = create_test_state();
    gateway.decline_initialize("Duplicate Transaction Reference");
    let router = create_router(state);

    let (status, body) = post_json(
        router,
        "/api/paystack/initialize",
        json!({"email": "ada@farmeely.com", "amount": 500, "reference": "ref_dup"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Duplicate Transaction Reference"})
    );
}

#[tokio::test]
async fn test_initialize_payment_upstream_failure_is_generic() {
    let db = Arc::new(MockDatabaseClient::new());
    let gateway = Arc::new(MockPaymentGateway::failing("connection reset by peer"));
    let router = create_router(Arc::new(AppState::new(db as _, gateway as _)));

    let (status, body) = post_json(
        router,
        "/api/paystack/initialize",
        json!({"email": "ada@farmeely.com", "amount": 500, "reference": "ref_net"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Failed to initialize payment"})
    );
}

#[tokio::test]
async fn test_verify_payment_success_converts_amount() {
    let (state, gateway) = create_test_state();
    gateway.set_transaction("ref_ok", 500_000, "success", None);
    let router = create_router(state);

    let (status, body) =
        post_json(router, "/api/paystack/verify", json!({"reference": "ref_ok"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["reference"], "ref_ok");
    assert_eq!(body["data"]["amount"], 5000.0);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["customer"]["email"], "ada@farmeely.com");
    assert!(body["data"]["paid_at"].is_string());
}

#[tokio::test]
async fn test_verify_payment_hides_metadata() {
    let (state, gateway) = create_test_state();
    gateway.set_transaction("ref_owned", 500_000, "success", Some(json!({"user_id": "user_1"})));
    gateway.set_transaction("ref_lost", 500_000, "failed", Some(json!({"user_id": "user_1"})));
    let router = create_router(state);

    let (status, body) = post_json(
        router.clone(),
        "/api/paystack/verify",
        json!({"reference": "ref_owned"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reference"], "ref_owned");
    assert!(body["data"].get("metadata").is_none());

    let (status, body) =
        post_json(router, "/api/paystack/verify", json!({"reference": "ref_lost"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["reference"], "ref_lost");
    assert!(body["data"].get("metadata").is_none());
}

#[tokio::test]
async fn test_verify_payment_not_successful() {
    let (state, gateway) = create_test_state();
    gateway.set_transaction("ref_abandoned", 500_000, "abandoned", None);
    let router = create_router(state);

    let (status, body) = post_json(
        router,
        "/api/paystack/verify",
        json!({"reference": "ref_abandoned"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "Payment verification failed");
    assert_eq!(body["data"]["status"], "abandoned");
}

#[tokio::test]
async fn test_verify_unknown_reference_has_null_data() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let (status, body) =
        post_json(router, "/api/paystack/verify", json!({"reference": "ref_missing"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["message"], "Transaction reference not found");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_verify_payment_upstream_failure() {
    let db = Arc::new(MockDatabaseClient::new());
    let gateway = Arc::new(MockPaymentGateway::failing("timeout"));
    let router = create_router(Arc::new(AppState::new(db as _, gateway as _)));

    let (status, body) =
        post_json(router, "/api/paystack/verify", json!({"reference": "ref_x"})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({"status": "error", "message": "Failed to verify payment"})
    );
}

#[tokio::test]
async fn test_verify_payment_missing_reference() {
    let (state, gateway) = create_test_state();
    let router = create_router(state);

    let (status, body) = post_json(router, "/api/paystack/verify", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(gateway.verify_calls(), 0);
}

#[tokio::test]
async fn test_repeated_verification_is_served_from_cache() {
    let (state, gateway) = create_test_state();
    gateway.set_transaction("ref_cached", 100_000, "success", None);
    let router = create_router(state);

    let (first, _) = post_json(
        router.clone(),
        "/api/paystack/verify",
        json!({"reference": "ref_cached"}),
    )
    .await;
    let (second, body) = post_json(
        router,
        "/api/paystack/verify",
        json!({"reference": "ref_cached"}),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 1000.0);
    assert_eq!(gateway.verify_calls(), 1);
}

#[tokio::test]
async fn test_post_bad_request_malformed_json() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/paystack/initialize")
        .header("Content-Type", "application/json")
        .body(Body::from("{ invalid json }"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_check() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let (status, body) = get(router, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.database, HealthStatus::Healthy);
    assert_eq!(health.payment_gateway, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_health_check_degraded_when_gateway_down() {
    let db = Arc::new(MockDatabaseClient::new());
    let gateway = Arc::new(MockPaymentGateway::failing("down"));
    let router = create_router(Arc::new(AppState::new(db as _, gateway as _)));

    let (status, body) = get(router.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["payment_gateway"], "unhealthy");

    let (ready, _) = get(router, "/health/ready").await;
    assert_eq!(ready, StatusCode::OK);
}

#[tokio::test]
async fn test_liveness() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let (status, _) = get(router, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_unhealthy() {
    let db = Arc::new(MockDatabaseClient::new());
    db.set_healthy(false);
    let gateway = Arc::new(MockPaymentGateway::new());
    let router = create_router(Arc::new(AppState::new(db as _, gateway as _)));

    let (status, _) = get(router, "/health/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_swagger_ui_available() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let request = Request::builder()
        .method("GET")
        .uri("/swagger-ui/")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    // Swagger UI redirects or returns 200
    assert!(response.status().is_success() || response.status().is_redirection());
}

#[tokio::test]
async fn test_openapi_spec_available() {
    let (state, _gateway) = create_test_state();
    let router = create_router(state);

    let (status, doc) = get(router, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc.get("openapi").is_some());
    assert!(doc["paths"].get("/api/paystack/initialize").is_some());
    assert!(doc["paths"].get("/api/groups/{id}/join").is_some());
    assert!(doc["components"]["securitySchemes"].get("bearer").is_some());
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_requests() {
    let (state, gateway) = create_test_state();
    gateway.set_transaction("ref_rl", 100_000, "success", None);
    let router = create_router_with_rate_limit(
        state,
        RateLimitConfig {
            requests_per_second: 1,
            burst_size: 1,
        },
    );

    let (first, _) = post_json(
        router.clone(),
        "/api/paystack/verify",
        json!({"reference": "ref_rl"}),
    )
    .await;
    let (second, body) = post_json(
        router.clone(),
        "/api/paystack/verify",
        json!({"reference": "ref_rl"}),
    )
    .await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["type"], "rate_limited");
    assert!(body["retry_after"].as_u64().unwrap() >= 1);

    // Health probes are outside the limiter
    let (health, _) = get(router, "/health/live").await;
    assert_eq!(health, StatusCode::OK);
}
