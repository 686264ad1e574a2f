//! # Request Signing
//!
//! Canonicalization and keyed-hash routines shared by the adapters.
//!
//! ## Sorted-key scheme
//!
//! ```text
//! params (minus the hash field, minus absent values)
//!   -> sort keys lexicographically
//!   -> "k1=v1&k2=v2&..."
//!   -> append secret
//!   -> MD5 (ComGate) | SHA-256 (PayU)
//!   -> lowercase hex
//! ```
//!
//! Secrets are taken as `&str` and never appear in returned values or errors.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Parameter set to be canonicalized.
///
/// Backed by a `BTreeMap`, so iteration is always in sorted key order no
/// matter how entries were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedParams {
    entries: BTreeMap<String, String>,
}

impl SignedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert only when a value is present; absent values never take part in the hash
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.entries.insert(key.into(), value.into());
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Flatten a JSON document into dotted keys.
    ///
    /// `{"buyer": {"email": "a"}, "products": [{"name": "x"}]}` becomes
    /// `buyer.email=a`, `products.0.name=x`. Nulls are dropped.
    pub fn from_json(value: &Value) -> Self {
        let mut params = Self::new();
        flatten_into(&mut params, None, value);
        params
    }

    /// `key=value` pairs in sorted order joined with `&`, skipping `exclude`
    pub fn canonical_string(&self, exclude: &str) -> String {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != exclude)
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignedParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

fn flatten_into(params: &mut SignedParams, prefix: Option<String>, value: &Value) {
    let key = |suffix: &str| match &prefix {
        Some(p) => format!("{}.{}", p, suffix),
        None => suffix.to_string(),
    };
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(params, Some(key(k)), v);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(params, Some(key(&i.to_string())), v);
            }
        }
        Value::String(s) => {
            if let Some(p) = prefix {
                params.insert(p, s.clone());
            }
        }
        Value::Bool(_) | Value::Number(_) => {
            if let Some(p) = prefix {
                params.insert(p, value.to_string());
            }
        }
    }
}

/// Digest used by a sorted-key signer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    fn hex_digest(&self, input: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => format!("{:x}", md5::compute(input)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}

/// Sorted-key keyed-hash signer
#[derive(Debug, Clone, Copy)]
pub struct SortedKeySigner {
    algorithm: HashAlgorithm,
    hash_field: &'static str,
}

impl SortedKeySigner {
    /// ComGate: MD5, hash carried in `hash`
    pub const MD5_HASH: SortedKeySigner = SortedKeySigner {
        algorithm: HashAlgorithm::Md5,
        hash_field: "hash",
    };

    /// PayU: SHA-256, hash carried in `signature`
    pub const SHA256_SIGNATURE: SortedKeySigner = SortedKeySigner {
        algorithm: HashAlgorithm::Sha256,
        hash_field: "signature",
    };

    pub const fn new(algorithm: HashAlgorithm, hash_field: &'static str) -> Self {
        Self {
            algorithm,
            hash_field,
        }
    }

    /// Name of the field the hash travels in
    pub fn hash_field(&self) -> &'static str {
        self.hash_field
    }

    /// Lowercase hex hash of the canonical string plus `secret`
    pub fn sign(&self, params: &SignedParams, secret: &str) -> String {
        let mut input = params.canonical_string(self.hash_field);
        input.push_str(secret);
        self.algorithm.hex_digest(input.as_bytes())
    }

    /// Sign and store the hash in the hash field
    pub fn attach(&self, params: &mut SignedParams, secret: &str) {
        let hash = self.sign(params, secret);
        params.insert(self.hash_field, hash);
    }

    /// Byte-for-byte equality against a recomputed hash (not constant-time)
    pub fn verify(&self, params: &SignedParams, secret: &str, signature: &str) -> bool {
        self.sign(params, secret).as_bytes() == signature.trim().as_bytes()
    }
}

/// HMAC-SHA256 of `message` keyed by `secret`, lowercase hex
pub fn hmac_sha256_hex(secret: &str, message: &[u8]) -> String {
    // new_from_slice only fails for fixed-size-key MACs; HMAC accepts any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Length-checked comparison that does not short-circuit on the first mismatch
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
