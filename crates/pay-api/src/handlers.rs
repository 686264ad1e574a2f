//! # Request Handlers
//!
//! Axum request handlers for the payment API. Every failure leaves as
//! `{success: false, error, code}` with the status of the underlying
//! [`PaymentError`].

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use pay_core::signing::constant_time_compare;
use pay_core::{
    CreatePaymentRequest, Decimal, PaymentError, PaymentRecord, ProviderId, RefundPaymentRequest,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

const SERVICE_NAME: &str = "payments-microservice";

/// Error leaving a handler
#[derive(Debug)]
pub struct ApiError(pub PaymentError);

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let body = json!({
            "success": false,
            "error": self.0.to_string(),
            "code": code,
        });
        (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": message, "code": 401 })),
    )
        .into_response()
}

/// Refund body; the path carries the payment id
#[derive(Debug, Default, Deserialize)]
pub struct RefundBody {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub reason: Option<String>,
}

// =============================================================================
// Middleware
// =============================================================================

/// Require `X-API-Key` when an API key is configured
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.config.api_key.as_ref() else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if constant_time_compare(presented, expected.expose_secret()) {
        next.run(request).await
    } else {
        warn!("Rejected request without a valid API key: {}", request.uri().path());
        unauthorized("Invalid or missing API key")
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}

/// Service description and endpoint list
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let providers: Vec<&str> = state.registry.providers().iter().map(ProviderId::as_str).collect();
    Json(json!({
        "success": true,
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "providers": providers,
        "endpoints": {
            "health": "GET /health",
            "createPayment": "POST /payments/create",
            "getPaymentStatus": "GET /payments/{paymentId}",
            "refundPayment": "POST /payments/{paymentId}/refund",
            "webhooks": "POST /webhooks/{provider}",
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Create a payment with the provider behind `paymentMethod`
#[instrument(skip(state, request), fields(order_id = %request.order_id, method = %request.payment_method.as_str()))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult {
    request.validate()?;
    let provider = state.registry.resolve(request.payment_method)?;

    let response = provider.create_payment(&request).await?;

    let record = PaymentRecord::from_created(&request, &response);
    state.store.insert(record.clone()).await.map_err(|e| {
        error!("Failed to store payment record: {}", e);
        e
    })?;

    info!(
        "Created payment {} via {} (provider id {})",
        record.payment_id,
        provider.provider_id(),
        record.provider_transaction_id
    );

    Ok(Json(json!({
        "success": true,
        "data": {
            "paymentId": record.payment_id,
            "status": record.status,
            "redirectUrl": record.redirect_url,
            "providerTransactionId": record.provider_transaction_id,
        }
    })))
}

async fn stored(state: &AppState, payment_id: &str) -> Result<PaymentRecord, ApiError> {
    state
        .store
        .get(payment_id)
        .await?
        .ok_or_else(|| ApiError(PaymentError::PaymentNotFound {
            payment_id: payment_id.to_string(),
        }))
}

/// Stored record plus the provider's current view of it
#[instrument(skip(state))]
pub async fn get_payment(State(state): State<AppState>, Path(payment_id): Path<String>) -> ApiResult {
    let record = stored(&state, &payment_id).await?;
    let provider = state.registry.resolve(record.payment_method)?;

    let (provider_status, provider_error) =
        match provider.get_payment_status(&record.provider_transaction_id).await {
            Ok(status) => (status, None),
            Err(e) => {
                warn!("Live status unavailable for {}: {}", payment_id, e);
                (Value::Null, Some(e.to_string()))
            }
        };

    let mut data = serde_json::to_value(&record)
        .map_err(|e| PaymentError::Serialization(e.to_string()))?;
    data["providerStatus"] = provider_status;
    if let Some(message) = provider_error {
        data["providerError"] = Value::String(message);
    }

    Ok(Json(json!({ "success": true, "data": data })))
}

/// Refund a stored payment, fully when no amount is given
#[instrument(skip(state, body))]
pub async fn refund_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    body: Option<Json<RefundBody>>,
) -> ApiResult {
    let RefundBody { amount, reason } = body.map(|Json(b)| b).unwrap_or_default();
    let record = stored(&state, &payment_id).await?;
    let provider = state.registry.resolve(record.payment_method)?;

    let request = RefundPaymentRequest {
        payment_id: record.provider_transaction_id.clone(),
        amount,
        reason,
    };
    let refund = provider.refund_payment(&request).await?;

    info!(
        "Refund {} for payment {}: status={}, amount={}",
        refund.refund_id, payment_id, refund.status, refund.amount
    );

    let mut data = serde_json::to_value(&refund)
        .map_err(|e| PaymentError::Serialization(e.to_string()))?;
    data["paymentId"] = Value::String(payment_id);
    data["refundedAt"] = Value::String(Utc::now().to_rfc3339());

    Ok(Json(json!({ "success": true, "data": data })))
}

/// Verify a provider notification by its route name and signature header
#[instrument(skip(state, headers, body))]
pub async fn provider_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let id: ProviderId = provider.parse()?;
    let signature = headers
        .get(id.signature_header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !state.registry.verify_webhook(id.as_str(), &body, signature)? {
        return Ok(unauthorized("Invalid webhook signature"));
    }

    info!("Accepted {} webhook ({} bytes)", id, body.len());
    Ok(Json(json!({ "success": true })).into_response())
}
