//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - GET  /, /api - Service info
/// - Payments (`X-API-Key` when configured):
///   - POST /payments/create
///   - GET  /payments/{payment_id}
///   - POST /payments/{payment_id}/refund
/// - Webhooks (signature header per provider):
///   - POST /webhooks/{provider}
pub fn create_router(state: AppState) -> Router {
    let payment_routes = Router::new()
        .route("/create", post(handlers::create_payment))
        .route("/{payment_id}", get(handlers::get_payment))
        .route("/{payment_id}/refund", post(handlers::refund_payment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_api_key,
        ));

    // Raw body is needed for signature checks
    let webhook_routes = Router::new().route("/{provider}", post(handlers::provider_webhook));

    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::service_info))
        .route("/api", get(handlers::service_info))
        .nest("/payments", payment_routes)
        .nest("/webhooks", webhook_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Single allowed origin when configured, any origin otherwise
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(_)) => {
            warn!("CORS_ORIGIN is not a valid header value; allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::http::{HeaderName, StatusCode};
    use axum_test::TestServer;
    use pay_core::ProviderRegistry;
    use pay_fiobanka::{FioBankaConfig, FioBankaProvider};
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const API_KEY: &str = "test-api-key";

    fn registry() -> ProviderRegistry {
        // Statement queries fail fast: nothing listens on port 1
        let config = FioBankaConfig::new("fio-token", "2001234567/2010")
            .with_api_base_url("http://127.0.0.1:1");
        ProviderRegistry::new().with_provider(Arc::new(FioBankaProvider::new(config).unwrap()))
    }

    fn server_with(config: AppConfig) -> TestServer {
        TestServer::new(create_router(AppState::new(registry(), config))).unwrap()
    }

    fn server() -> TestServer {
        server_with(AppConfig::default())
    }

    fn payment(method: &str, amount: f64) -> Value {
        json!({
            "orderId": "4200",
            "applicationId": "shop",
            "amount": amount,
            "currency": "CZK",
            "paymentMethod": method,
            "callbackUrl": "https://shop.example/cb",
            "customer": {"email": "jan@example.cz", "name": "Jan Novak"}
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = server().get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "payments-microservice");
    }

    #[tokio::test]
    async fn test_service_info_lists_registered_providers() {
        let body: Value = server().get("/").await.json();
        assert_eq!(body["providers"], json!(["fiobanka"]));
        assert_eq!(body["endpoints"]["createPayment"], "POST /payments/create");
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let server = server();

        let created = server.post("/payments/create").json(&payment("fiobanka", 199.5)).await;
        created.assert_status_ok();
        let created: Value = created.json();
        let payment_id = created["data"]["paymentId"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["status"], "PENDING");
        assert_eq!(created["data"]["providerTransactionId"], "4200");
        assert!(created["data"]["redirectUrl"]
            .as_str()
            .unwrap()
            .contains("size=300x300"));

        // Provider unreachable: the record is still served
        let fetched = server.get(&format!("/payments/{}", payment_id)).await;
        fetched.assert_status_ok();
        let fetched: Value = fetched.json();
        assert_eq!(fetched["data"]["orderId"], "4200");
        assert_eq!(fetched["data"]["paymentMethod"], "fiobanka");
        assert!(fetched["data"]["providerStatus"].is_null());
        assert!(fetched["data"]["providerError"].is_string());

        let refund = server
            .post(&format!("/payments/{}/refund", payment_id))
            .json(&json!({"amount": 50.0, "reason": "partial"}))
            .await;
        refund.assert_status_ok();
        let refund: Value = refund.json();
        assert_eq!(refund["data"]["status"], "PROCESSING");
        assert_eq!(refund["data"]["amount"], 50.0);
        assert_eq!(refund["data"]["paymentId"], payment_id.as_str());
    }

    #[tokio::test]
    async fn test_unregistered_method_is_bad_request() {
        let response = server().post("/payments/create").json(&payment("stripe", 10.0)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], 400);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_bad_request() {
        let response = server().post("/payments/create").json(&payment("fiobanka", 0.0)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_amount_is_bad_request() {
        let server = server();
        let response = server.post("/payments/create").json(&payment("fiobanka", 7e28)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);

        server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let response = server().get("/payments/does-not-exist").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_webhooks() {
        let server = server();
        let fio_header = HeaderName::from_static("x-fio-signature");

        server
            .post("/webhooks/fiobanka")
            .add_header(fio_header.clone(), HeaderValue::from_static("present"))
            .text("{}")
            .await
            .assert_status_ok();

        server
            .post("/webhooks/fiobanka")
            .text("{}")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/webhooks/bitcoin")
            .text("{}")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Known provider without configuration
        server
            .post("/webhooks/comgate")
            .text("{}")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_key_guards_payments_only() {
        let server = server_with(AppConfig {
            api_key: Some(SecretString::new(API_KEY.to_string())),
            ..AppConfig::default()
        });
        let api_key_header = HeaderName::from_static("x-api-key");

        server
            .post("/payments/create")
            .json(&payment("fiobanka", 10.0))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/payments/create")
            .add_header(api_key_header.clone(), HeaderValue::from_static("wrong"))
            .json(&payment("fiobanka", 10.0))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post("/payments/create")
            .add_header(api_key_header, HeaderValue::from_static(API_KEY))
            .json(&payment("fiobanka", 10.0))
            .await
            .assert_status_ok();

        server.get("/health").await.assert_status_ok();
    }
}
