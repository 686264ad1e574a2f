//! # PayU Orders
//!
//! PayU REST v2.1 adapter. Every business call is preceded by its own
//! OAuth client-credentials exchange; tokens are not cached.

use crate::config::PayUConfig;
use async_trait::async_trait;
use pay_core::amount::{parse_minor_units, to_minor_string};
use pay_core::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentError, PaymentProvider, PaymentResult,
    PaymentStatus, ProviderId, RefundPaymentRequest, RefundPaymentResponse, SignedParams,
    SortedKeySigner, REFUND_PROCESSING,
};
use reqwest::{redirect, Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

const PROVIDER: &str = "payu";
const DEFAULT_CUSTOMER_IP: &str = "127.0.0.1";
const SIGNER: SortedKeySigner = SortedKeySigner::SHA256_SIGNATURE;

/// PayU adapter
pub struct PayUProvider {
    config: PayUConfig,
    client: Client,
}

impl PayUProvider {
    pub fn new(config: PayUConfig) -> PaymentResult<Self> {
        // Order creation answers 302 with the JSON body; the redirect is for the buyer, not us.
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PayUConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Client-credentials token exchange
    async fn access_token(&self) -> PaymentResult<String> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
        ];

        let response = self
            .client
            .post(self.url("/pl/standard/user/oauth/authorize"))
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!("PayU getAccessToken error: HTTP {}", status);
            return Err(PaymentError::rejection(
                PROVIDER,
                format!("OAuth token request failed: HTTP {}", status),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Serialization(format!("Invalid PayU token response: {}", e.without_url())))?;
        Ok(token.access_token)
    }

    /// Fetch a token, send the request with it and decode the JSON answer
    async fn send(&self, request: RequestBuilder) -> PaymentResult<Value> {
        let token = self.access_token().await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        let value: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() && status != StatusCode::FOUND {
            let message = value
                .as_ref()
                .and_then(status_message)
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
            return Err(PaymentError::rejection(PROVIDER, message));
        }

        let value = value.ok_or_else(|| {
            PaymentError::Serialization("PayU response is not JSON".to_string())
        })?;

        match value.pointer("/status/statusCode").and_then(Value::as_str) {
            Some(code) if !is_success_code(code) => Err(PaymentError::rejection(
                PROVIDER,
                status_message(&value).unwrap_or_else(|| code.to_string()),
            )),
            _ => Ok(value),
        }
    }

    /// Order payload with its `signature` field attached
    fn order_payload(&self, request: &CreatePaymentRequest) -> PaymentResult<Value> {
        let total = to_minor_string(request.amount)?;
        let (first_name, last_name) = request.customer.split_name();
        let customer_ip = request
            .metadata
            .get("customerIp")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CUSTOMER_IP);

        let mut payload = json!({
            "notifyUrl": request.callback_url,
            "customerIp": customer_ip,
            "merchantPosId": self.config.pos_id,
            "description": request.description(),
            "currencyCode": request.currency,
            "totalAmount": total,
            "extOrderId": request.order_id,
            "buyer": {
                "email": request.customer.email,
                "firstName": first_name,
                "lastName": last_name,
                "phone": request.customer.phone.clone().unwrap_or_default(),
            },
            "products": [{
                "name": format!("Order {}", request.order_id),
                "unitPrice": total,
                "quantity": "1",
            }],
        });

        let signature = SIGNER.sign(
            &SignedParams::from_json(&payload),
            self.config.client_secret.expose_secret(),
        );
        payload[SIGNER.hash_field()] = Value::String(signature);
        Ok(payload)
    }

    async fn create_order(&self, request: &CreatePaymentRequest) -> PaymentResult<CreatePaymentResponse> {
        request.validate()?;
        let payload = self.order_payload(request)?;

        let builder = self.client.post(self.url("/api/v2_1/orders")).json(&payload);
        let value = self.send(builder).await?;

        let order_id = value
            .get("orderId")
            .and_then(Value::as_str)
            .ok_or_else(|| PaymentError::Serialization("PayU response has no orderId".to_string()))?
            .to_string();

        Ok(CreatePaymentResponse {
            payment_id: order_id.clone(),
            redirect_url: value.get("redirectUri").and_then(Value::as_str).map(String::from),
            status: PaymentStatus::Pending,
            provider_transaction_id: order_id,
        })
    }

    async fn create_refund(&self, request: &RefundPaymentRequest) -> PaymentResult<RefundPaymentResponse> {
        request.validate()?;

        // Status and refund are two separate calls; a change in between is not detected.
        let order = self.get_payment_status(&request.payment_id).await?;
        let refund_amount = match request.amount {
            Some(amount) => to_minor_string(amount)?,
            None => refundable_amount(&order).ok_or_else(|| {
                PaymentError::RefundPrecondition(format!(
                    "No totalAmount reported for order {}",
                    request.payment_id
                ))
            })?,
        };

        let payload = json!({
            "orderId": request.payment_id,
            "refund": {
                "amount": refund_amount,
                "description": request.reason.clone().unwrap_or_else(|| "Refund".to_string()),
            },
        });

        let builder = self
            .client
            .post(self.url(&format!("/api/v2_1/orders/{}/refunds", request.payment_id)))
            .json(&payload);
        let value = self.send(builder).await?;

        let refund_id = value
            .pointer("/refund/refundId")
            .or_else(|| value.get("refundId"))
            .or_else(|| value.get("orderId"))
            .and_then(Value::as_str)
            .unwrap_or(request.payment_id.as_str())
            .to_string();
        let status = value
            .pointer("/refund/status")
            .or_else(|| value.pointer("/status/statusCode"))
            .and_then(Value::as_str)
            .unwrap_or(REFUND_PROCESSING)
            .to_string();

        Ok(RefundPaymentResponse {
            refund_id,
            status,
            amount: parse_minor_units(&refund_amount)?,
        })
    }
}

fn is_success_code(code: &str) -> bool {
    code == "SUCCESS" || code.starts_with("WARNING_CONTINUE")
}

fn status_message(value: &Value) -> Option<String> {
    let status = value.get("status")?;
    status
        .get("statusDesc")
        .or_else(|| status.get("statusCode"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// `totalAmount` at the top level or on the first order of a retrieve response
fn refundable_amount(order: &Value) -> Option<String> {
    order
        .get("totalAmount")
        .or_else(|| order.pointer("/orders/0/totalAmount"))
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// `OpenPayu-Signature` is either a bare digest or
/// `sender=...;signature=...;algorithm=...;content=DOCUMENT`
fn signature_value(header: &str) -> &str {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == "signature")
        .map(|(_, value)| value)
        .unwrap_or_else(|| header.trim())
}

#[async_trait]
impl PaymentProvider for PayUProvider {
    #[instrument(skip(self, request), fields(provider = PROVIDER, order_id = %request.order_id))]
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> PaymentResult<CreatePaymentResponse> {
        let response = self.create_order(request).await.map_err(|e| {
            error!("PayU createPayment error: {}", e);
            e
        })?;
        info!("Created PayU order: id={}", response.payment_id);
        Ok(response)
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn get_payment_status(&self, provider_transaction_id: &str) -> PaymentResult<Value> {
        let builder = self
            .client
            .get(self.url(&format!("/api/v2_1/orders/{}", provider_transaction_id)));
        self.send(builder).await.map_err(|e| {
            error!("PayU getPaymentStatus error: {}", e);
            e
        })
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, payment_id = %request.payment_id))]
    async fn refund_payment(
        &self,
        request: &RefundPaymentRequest,
    ) -> PaymentResult<RefundPaymentResponse> {
        let response = self.create_refund(request).await.map_err(|e| {
            error!("PayU refundPayment error: {}", e);
            e
        })?;
        info!("Created PayU refund: id={}, amount={}", response.refund_id, response.amount);
        Ok(response)
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let secret = self.config.client_secret.expose_secret();
        if secret.is_empty() || signature.trim().is_empty() {
            warn!("PayU webhook verification error: missing secret or signature");
            return false;
        }

        let document: Value = match serde_json::from_slice(payload) {
            Ok(document) => document,
            Err(e) => {
                warn!("PayU webhook verification error: {}", e);
                return false;
            }
        };

        let valid = SIGNER.verify(&SignedParams::from_json(&document), secret, signature_value(signature));
        debug!("PayU webhook signature valid={}", valid);
        valid
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::PayU
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}
