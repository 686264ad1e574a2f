//! # ComGate Payments
//!
//! Form-encoded adapter for the ComGate HTTP API. Every request carries an
//! MD5 `hash` over its sorted fields plus the merchant secret.

use crate::config::ComGateConfig;
use crate::form;
use async_trait::async_trait;
use pay_core::amount::{parse_minor_units, to_minor_string};
use pay_core::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentError, PaymentProvider, PaymentResult,
    PaymentStatus, ProviderId, RefundPaymentRequest, RefundPaymentResponse, SignedParams,
    SortedKeySigner, REFUND_PROCESSING,
};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const PROVIDER: &str = "comgate";
const SIGNER: SortedKeySigner = SortedKeySigner::MD5_HASH;

/// ComGate adapter
pub struct ComGateProvider {
    config: ComGateConfig,
    client: Client,
}

impl ComGateProvider {
    pub fn new(config: ComGateConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaymentError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> PaymentResult<Self> {
        Self::new(ComGateConfig::from_env()?)
    }

    fn secret(&self) -> &str {
        self.config.secret_key.expose_secret()
    }

    /// Fields for a new payment, hash attached
    fn create_params(&self, request: &CreatePaymentRequest) -> PaymentResult<SignedParams> {
        let mut params = SignedParams::new();
        params
            .insert("merchant", self.config.merchant_id.as_str())
            .insert("test", if self.config.test_mode { "true" } else { "false" })
            .insert("price", to_minor_string(request.amount)?)
            .insert("curr", request.currency.as_str())
            .insert("label", request.description())
            .insert("refId", request.order_id.as_str())
            .insert("method", "ALL")
            .insert("email", request.customer.email.as_str())
            .insert("name", request.customer.name.clone().unwrap_or_default())
            .insert("prepareOnly", "true")
            .insert("callback", request.callback_url.as_str());
        SIGNER.attach(&mut params, self.secret());
        Ok(params)
    }

    /// POST a signed form and return the decoded answer; non-zero `code` is a rejection
    async fn post(&self, endpoint: &str, params: &SignedParams) -> PaymentResult<SignedParams> {
        let body: Vec<(&str, &str)> = params.iter().collect();

        let response = self
            .client
            .post(format!("{}/{}", self.config.api_base_url, endpoint))
            .form(&body)
            .send()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::transport(PROVIDER, e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(PaymentError::rejection(
                PROVIDER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let answer = form::parse(&text);
        match answer.get("code") {
            Some("0") => Ok(answer),
            Some(code) => Err(PaymentError::rejection(
                PROVIDER,
                answer
                    .get("message")
                    .map(String::from)
                    .unwrap_or_else(|| format!("code {}", code)),
            )),
            None => Err(PaymentError::Serialization(format!(
                "ComGate response has no code: {}",
                text
            ))),
        }
    }

    async fn create(&self, request: &CreatePaymentRequest) -> PaymentResult<CreatePaymentResponse> {
        request.validate()?;
        let params = self.create_params(request)?;
        let answer = self.post("create", &params).await?;

        let trans_id = answer
            .get("transId")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PaymentError::Serialization("ComGate response has no transId".to_string()))?
            .to_string();

        let redirect_url = answer
            .get("redirect")
            .filter(|url| !url.is_empty())
            .map(String::from)
            .unwrap_or_else(|| self.config.redirect_url(&trans_id));

        Ok(CreatePaymentResponse {
            payment_id: trans_id.clone(),
            redirect_url: Some(redirect_url),
            status: PaymentStatus::Pending,
            provider_transaction_id: trans_id,
        })
    }

    async fn status(&self, trans_id: &str) -> PaymentResult<SignedParams> {
        let mut params = SignedParams::new()
            .with("merchant", self.config.merchant_id.as_str())
            .with("transId", trans_id);
        SIGNER.attach(&mut params, self.secret());
        self.post("status", &params).await
    }

    async fn refund(&self, request: &RefundPaymentRequest) -> PaymentResult<RefundPaymentResponse> {
        request.validate()?;

        // Without an explicit amount the full price is read first; the two calls are not atomic.
        let amount = match request.amount {
            Some(amount) => to_minor_string(amount)?,
            None => self
                .status(&request.payment_id)
                .await?
                .get("price")
                .filter(|price| !price.is_empty())
                .map(String::from)
                .ok_or_else(|| {
                    PaymentError::RefundPrecondition(format!(
                        "No price reported for transaction {}",
                        request.payment_id
                    ))
                })?,
        };

        let mut params = SignedParams::new()
            .with("merchant", self.config.merchant_id.as_str())
            .with("transId", request.payment_id.as_str())
            .with("amount", amount.as_str());
        SIGNER.attach(&mut params, self.secret());
        let answer = self.post("refund", &params).await?;

        Ok(RefundPaymentResponse {
            refund_id: answer
                .get("transId")
                .filter(|id| !id.is_empty())
                .unwrap_or(request.payment_id.as_str())
                .to_string(),
            status: REFUND_PROCESSING.to_string(),
            amount: parse_minor_units(&amount)?,
        })
    }
}

/// Webhook body as parameters: form-encoded, or a flat JSON object
fn webhook_params(payload: &[u8]) -> Option<SignedParams> {
    let text = std::str::from_utf8(payload).ok()?;
    if text.trim_start().starts_with('{') {
        serde_json::from_str::<Value>(text)
            .ok()
            .map(|document| SignedParams::from_json(&document))
    } else {
        Some(form::parse(text))
    }
}

#[async_trait]
impl PaymentProvider for ComGateProvider {
    #[instrument(skip(self, request), fields(provider = PROVIDER, order_id = %request.order_id))]
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> PaymentResult<CreatePaymentResponse> {
        let response = self.create(request).await.map_err(|e| {
            error!("ComGate createPayment error: {}", e);
            e
        })?;
        info!("Created ComGate payment: transId={}", response.payment_id);
        Ok(response)
    }

    #[instrument(skip(self), fields(provider = PROVIDER))]
    async fn get_payment_status(&self, provider_transaction_id: &str) -> PaymentResult<Value> {
        self.status(provider_transaction_id)
            .await
            .map(|answer| form::to_json(&answer))
            .map_err(|e| {
                error!("ComGate getPaymentStatus error: {}", e);
                e
            })
    }

    #[instrument(skip(self, request), fields(provider = PROVIDER, payment_id = %request.payment_id))]
    async fn refund_payment(
        &self,
        request: &RefundPaymentRequest,
    ) -> PaymentResult<RefundPaymentResponse> {
        self.refund(request).await.map_err(|e| {
            error!("ComGate refundPayment error: {}", e);
            e
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        if self.secret().is_empty() || signature.trim().is_empty() {
            warn!("ComGate webhook verification error: missing secret or signature");
            return false;
        }
        match webhook_params(payload) {
            Some(params) => SIGNER.verify(&params, self.secret(), signature),
            None => {
                warn!("ComGate webhook verification error: unreadable payload");
                false
            }
        }
    }

    fn provider_id(&self) -> ProviderId {
        ProviderId::ComGate
    }
}
