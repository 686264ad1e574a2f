//! # Stripe Payment Intents
//!
//! Stripe adapter built on the PaymentIntents and Refunds APIs.
//! Intent statuses are passed through in Stripe's own vocabulary.

use crate::config::StripeConfig;
use crate::webhook::verify_envelope;
use async_trait::async_trait;
use chrono::Utc;
use pay_core::amount::{from_minor_units, to_minor_units};
use pay_core::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentError, PaymentProvider, PaymentResult,
    PaymentStatus, ProviderId, RefundPaymentRequest, RefundPaymentResponse,
};
use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const PROVIDER: &str = "stripe";

/// Stripe PaymentIntents adapter
pub struct StripeProvider {
    config: StripeConfig,
    client: Client,
}

impl StripeProvider {
    /// Create a new Stripe adapter
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Send an authenticated request and decode the JSON answer
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PaymentResult<T> {
        let response = request
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::rejection(PROVIDER, error_response.error.message));
            }
            return Err(PaymentError::rejection(
                PROVIDER,
                format!("HTTP {}: {}", status, body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })
    }

    async fn create_intent(&self, request: &CreatePaymentRequest) -> PaymentResult<StripePaymentIntent> {
        request.validate()?;

        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), to_minor_units(request.amount)?.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("description".to_string(), request.description()),
            ("metadata[orderId]".to_string(), request.order_id.clone()),
            ("metadata[callbackUrl]".to_string(), request.callback_url.clone()),
        ];
        if !request.application_id.is_empty() {
            form_params.push((
                "metadata[applicationId]".to_string(),
                request.application_id.clone(),
            ));
        }
        for (key, value) in request.metadata_tags() {
            form_params.push((format!("metadata[{}]", key), value));
        }

        let builder = self.client.post(self.url("/v1/payment_intents")).form(&form_params);
        self.send(builder).await
    }

    async fn create_refund(&self, request: &RefundPaymentRequest) -> PaymentResult<StripeRefund> {
        request.validate()?;

        // Status and refund are two separate calls; a change in between is not detected.
        let intent = self.get_payment_status(&request.payment_id).await?;
        let charge_id = latest_charge(&intent).ok_or_else(|| {
            PaymentError::RefundPrecondition(format!(
                "Charge ID not found in payment intent {}",
                request.payment_id
            ))
        })?;

        let mut form_params: Vec<(String, String)> = vec![("charge".to_string(), charge_id)];
        if let Some(amount) = request.amount {
            form_params.push(("amount".to_string(), to_minor_units(amount)?.to_string()));
        }
        if let Some(ref reason) = request.reason {
            form_params.push(("metadata[reason]".to_string(), reason.clone()));
        }

        let builder = self.client.post(self.url("/v1/refunds")).form(&form_params);
        self.send(builder).await
    }
}

/// `latest_charge` is either an id or, when expanded, a charge object
fn latest_charge(intent: &Value) -> Option<String> {
    match intent.get("latest_charge")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(charge) => charge.get("id")?.as_str().map(String::from),
        _ => None,
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, request), fields(provider = PROVIDER, order_id = %request.order_id))]
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> PaymentResult<CreatePaymentResponse> {
        let intent = self.create_intent(request).await.map_err(|e| {
            error!("Stripe createPayment error: {}", e);
            e
        })?;

        info!("Created Stripe payment intent: id={}, status={}", intent.id, intent.status);

        Ok(CreatePaymentResponse {
            payment_id: intent.id.clone(),
            redirect_url: None,
            status: PaymentStatus::from(intent.status),
            provider_transaction_id: intent.id,
        })
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn get_payment_status(&self, provider_transaction_id: &str) -> PaymentResult<Value> {
        let builder = self
            .client
            .get(self.url(&format!("/v1/payment_intents/{}", provider_transaction_id)));
        self.send(builder).await.map_err(|e| {
            error!("Stripe getPaymentStatus error: {}", e);
            e
        })
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, payment_id = %request.payment_id))]
    async fn refund_payment(
        &self,
        request: &RefundPaymentRequest,
    ) -> PaymentResult<RefundPaymentResponse> {
        let refund = self.create_refund(request).await.map_err(|e| {
            error!("Stripe refundPayment error: {}", e);
            e
        })?;

        info!("Created Stripe refund: id={}, status={}", refund.id, refund.status);

        Ok(RefundPaymentResponse {
            refund_id: refund.id,
            status: refund.status,
            amount: from_minor_units(refund.amount),
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        match verify_envelope(
            payload,
            signature,
            self.config.webhook_secret.expose_secret(),
            self.config.webhook_tolerance_secs,
            Utc::now().timestamp(),
        ) {
            Ok(event) => {
                debug!("Verified Stripe webhook: id={}, type={}", event.id, event.event_type);
                true
            }
            Err(e) => {
                warn!("Stripe webhook verification error: {}", e);
                false
            }
        }
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::Stripe
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeRefund {
    id: String,
    status: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::compute_signature;
    use pay_core::{Customer, Decimal, PaymentMethod};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEBHOOK_SECRET: &str = "whsec_test";

    fn provider(server: &MockServer) -> StripeProvider {
        let config =
            StripeConfig::new("sk_test_abc", WEBHOOK_SECRET).with_api_base_url(server.uri());
        StripeProvider::new(config).unwrap()
    }

    fn request() -> CreatePaymentRequest {
        CreatePaymentRequest::new(
            "O1",
            "19.99".parse::<Decimal>().unwrap(),
            "EUR",
            PaymentMethod::Card,
            Customer::new("anna@example.com"),
        )
        .with_callback_url("https://shop.example/cb")
    }

    #[test]
    fn test_latest_charge_forms() {
        assert_eq!(latest_charge(&json!({"latest_charge": "ch_1"})), Some("ch_1".into()));
        assert_eq!(
            latest_charge(&json!({"latest_charge": {"id": "ch_2"}})),
            Some("ch_2".into())
        );
        assert_eq!(latest_charge(&json!({"latest_charge": null})), None);
        assert_eq!(latest_charge(&json!({})), None);
    }

    #[tokio::test]
    async fn test_create_payment_passes_status_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("amount=1999"))
            .and(body_string_contains("currency=eur"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "status": "requires_payment_method"
            })))
            .mount(&server)
            .await;

        let response = provider(&server).create_payment(&request()).await.unwrap();

        assert_eq!(response.payment_id, "pi_1");
        assert_eq!(response.provider_transaction_id, "pi_1");
        assert_eq!(response.redirect_url, None);
        assert_eq!(response.status.as_str(), "requires_payment_method");
    }

    #[tokio::test]
    async fn test_non_string_metadata_sent_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(body_string_contains("metadata%5Bqty%5D=2"))
            .and(body_string_contains("metadata%5Bgift%5D=true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_2",
                "status": "requires_payment_method"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = request()
            .with_metadata("qty", json!(2))
            .with_metadata("gift", true);
        let response = provider(&server).create_payment(&request).await.unwrap();
        assert_eq!(response.payment_id, "pi_2");
    }

    #[tokio::test]
    async fn test_provider_error_message_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).create_payment(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::ProviderRejection { ref message, .. } if message == "Your card was declined."
        ));
    }

    #[tokio::test]
    async fn test_refund_requires_charge() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "status": "requires_payment_method",
                "latest_charge": null
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .refund_payment(&RefundPaymentRequest::full("pi_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::RefundPrecondition(_)));
    }

    #[tokio::test]
    async fn test_partial_refund_normalizes_amount() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/payment_intents/pi_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "status": "succeeded",
                "latest_charge": "ch_1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/refunds"))
            .and(body_string_contains("charge=ch_1"))
            .and(body_string_contains("amount=500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "re_1",
                "status": "pending",
                "amount": 500
            })))
            .mount(&server)
            .await;

        let request = RefundPaymentRequest::partial("pi_1", "5".parse().unwrap());
        let response = provider(&server).refund_payment(&request).await.unwrap();

        assert_eq!(response.refund_id, "re_1");
        assert_eq!(response.status, "pending");
        assert_eq!(response.amount, "5.00".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn test_webhook_signature() {
        let server = MockServer::start().await;
        let provider = provider(&server);
        let payload = br#"{"id":"evt_1","type":"charge.refunded"}"#;
        let now = Utc::now().timestamp();
        let header = format!("t={},v1={}", now, compute_signature(WEBHOOK_SECRET, now, payload));

        assert!(provider.verify_webhook_signature(payload, &header));
        assert!(!provider.verify_webhook_signature(br#"{"id":"evt_2","type":"charge.refunded"}"#, &header));
        assert!(!provider.verify_webhook_signature(payload, "garbage"));
        assert!(!provider.verify_webhook_signature(b"\xff\xfe", &header));
    }
}
