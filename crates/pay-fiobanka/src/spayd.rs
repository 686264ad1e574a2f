//! # Short Payment Descriptor
//!
//! `SPD*1.0*ACC:...*AM:...*CC:...*MSG:...*VS:...`, the payload Czech
//! banking apps read from a payment QR code.

use pay_core::amount::format_major;
use pay_core::Decimal;
use std::fmt;

/// Longest variable symbol a Czech transfer accepts
pub const VARIABLE_SYMBOL_LEN: usize = 10;

/// Payment descriptor rendered into the QR code
#[derive(Debug, Clone, PartialEq)]
pub struct Spayd {
    pub account: String,
    pub amount: Decimal,
    pub currency: String,
    pub message: String,
    pub variable_symbol: String,
}

impl fmt::Display for Spayd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SPD*1.0*ACC:{}*AM:{}*CC:{}*MSG:{}*VS:{}",
            field(&self.account),
            format_major(self.amount),
            self.currency.to_uppercase(),
            field(&self.message),
            self.variable_symbol
        )
    }
}

impl Spayd {
    /// QR image URL for this descriptor on `qr_api_url`
    pub fn qr_code_url(&self, qr_api_url: &str) -> String {
        let data: String = url::form_urlencoded::byte_serialize(self.to_string().as_bytes()).collect();
        format!(
            "{}/?size=300x300&data={}",
            qr_api_url.trim_end_matches('/'),
            data
        )
    }
}

// `*` separates fields
fn field(value: &str) -> String {
    value.replace('*', " ")
}

/// Numeric variable symbol for an order id.
///
/// An id that is already a number of at most ten digits without a leading
/// zero is used as is. Any other id maps to `0` followed by nine digits of
/// its MD5 digest, so the two forms never meet and distinct numeric ids
/// never share a symbol.
pub fn variable_symbol(order_id: &str) -> String {
    if is_plain_number(order_id) {
        return order_id.to_string();
    }

    let digest = md5::compute(order_id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.0[..8]);
    let hashed = u64::from_be_bytes(head) % 10u64.pow(VARIABLE_SYMBOL_LEN as u32 - 1);
    format!("0{:0width$}", hashed, width = VARIABLE_SYMBOL_LEN - 1)
}

fn is_plain_number(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= VARIABLE_SYMBOL_LEN
        && !value.starts_with('0')
        && value.bytes().all(|b| b.is_ascii_digit())
}
