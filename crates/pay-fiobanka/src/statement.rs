//! Fio account statement (`transactions.json`) as far as payment matching needs it.
//!
//! Each transaction is an object of numbered columns,
//! `{"column1": {"value": 100.0, "name": "Objem", "id": 1}, ...}`;
//! `column1` is the amount and `column5` the variable symbol.

use pay_core::amount::parse_major_units;
use pay_core::{Decimal, PaymentError, PaymentResult};
use serde::Deserialize;
use serde_json::Value;

const AMOUNT_COLUMN: &str = "column1";
const VARIABLE_SYMBOL_COLUMN: &str = "column5";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub account_statement: AccountStatement,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatement {
    #[serde(default)]
    pub transaction_list: TransactionList,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionList {
    /// Null when the window holds no movements
    #[serde(default)]
    pub transaction: Option<Vec<Value>>,
}

impl Statement {
    pub fn parse(body: &str) -> PaymentResult<Self> {
        serde_json::from_str(body)
            .map_err(|e| PaymentError::Serialization(format!("Invalid Fio statement: {}", e)))
    }

    /// First transaction carrying `variable_symbol`
    pub fn find_by_variable_symbol(&self, variable_symbol: &str) -> Option<&Value> {
        self.account_statement
            .transaction_list
            .transaction
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|tx| column_text(tx, VARIABLE_SYMBOL_COLUMN).as_deref() == Some(variable_symbol))
    }
}

/// Amount of a matched transaction, major units
pub fn transaction_amount(transaction: &Value) -> Option<Decimal> {
    column_text(transaction, AMOUNT_COLUMN).and_then(|text| parse_major_units(&text).ok())
}

fn column_text(transaction: &Value, column: &str) -> Option<String> {
    match transaction.get(column)?.get("value")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
