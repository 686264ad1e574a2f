//! # Stripe Webhook Signatures
//!
//! Verification of the `Stripe-Signature` envelope:
//! `t=<unix ts>,v1=<hex hmac>[,v1=...]`, where each `v1` is
//! HMAC-SHA256 over `"{t}.{payload}"` keyed by the endpoint secret.

use pay_core::signing::{constant_time_compare, hmac_sha256_hex};
use pay_core::{PaymentError, PaymentResult};
use serde::Deserialize;

/// Parsed `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> PaymentResult<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse().ok(),
                "v1" => signatures.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            PaymentError::InvalidRequest("Missing timestamp in signature".to_string())
        })?;

        if signatures.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "No v1 signature found".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Minimal event envelope, enough to reject payloads that are not Stripe events
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Compute the `v1` signature for a payload at a timestamp
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut signed_payload = format!("{}.", timestamp).into_bytes();
    signed_payload.extend_from_slice(payload);
    hmac_sha256_hex(secret, &signed_payload)
}

/// Verify a signed envelope against the clock value `now`
pub fn verify_envelope(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> PaymentResult<StripeEvent> {
    if secret.is_empty() {
        return Err(PaymentError::Configuration(
            "Webhook secret not configured".to_string(),
        ));
    }

    let header = SignatureHeader::parse(header)?;

    if now.abs_diff(header.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(PaymentError::InvalidRequest(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, header.timestamp, payload);
    let valid = header
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected));

    if !valid {
        return Err(PaymentError::InvalidRequest("Signature mismatch".to_string()));
    }

    serde_json::from_slice(payload)
        .map_err(|e| PaymentError::Serialization(format!("Failed to parse webhook: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_parse_signature_header() {
        let header = "t=1234567890,v1=abc123,v1=def456";
        let parsed = SignatureHeader::parse(header).unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);
    }

    #[test]
    fn test_parse_rejects_incomplete_header() {
        assert!(SignatureHeader::parse("v1=abc").is_err());
        assert!(SignatureHeader::parse("t=123").is_err());
        assert!(SignatureHeader::parse("").is_err());
    }

    #[test]
    fn test_valid_envelope_accepted() {
        let now = 1_700_000_000;
        let sig = compute_signature(SECRET, now, PAYLOAD);
        let header = format!("t={},v1={}", now, sig);

        let event = verify_envelope(PAYLOAD, &header, SECRET, 300, now + 10).unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, "payment_intent.succeeded");
    }

    #[test]
    fn test_altered_payload_rejected() {
        let now = 1_700_000_000;
        let sig = compute_signature(SECRET, now, PAYLOAD);
        let header = format!("t={},v1={}", now, sig);

        let mut altered = PAYLOAD.to_vec();
        altered[8] ^= 0x01;
        assert!(verify_envelope(&altered, &header, SECRET, 300, now).is_err());
    }

    #[test]
    fn test_expired_timestamp_rejected() {
        let ts = 1_700_000_000;
        let sig = compute_signature(SECRET, ts, PAYLOAD);
        let header = format!("t={},v1={}", ts, sig);
        assert!(verify_envelope(PAYLOAD, &header, SECRET, 300, ts + 301).is_err());
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        let now = 1_700_000_000;
        for ts in [i64::MIN, i64::MAX] {
            let sig = compute_signature(SECRET, ts, PAYLOAD);
            let header = format!("t={},v1={}", ts, sig);
            assert!(matches!(
                verify_envelope(PAYLOAD, &header, SECRET, 300, now),
                Err(PaymentError::InvalidRequest(_))
            ));
        }
        assert!(verify_envelope(b"{}", "t=-9223372036854775808,v1=00", "whsec_x", 300, now).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected_without_leaking_it() {
        let now = 1_700_000_000;
        let sig = compute_signature("whsec_other", now, PAYLOAD);
        let header = format!("t={},v1={}", now, sig);
        let err = verify_envelope(PAYLOAD, &header, SECRET, 300, now).err().unwrap();
        assert!(!err.to_string().contains(SECRET));
    }
}
