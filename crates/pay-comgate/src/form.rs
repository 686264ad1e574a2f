//! Form-encoded bodies as ComGate sends them: `code=0&message=OK&transId=...`

use pay_core::SignedParams;
use serde_json::{Map, Value};

/// Decode `key=value&...`; values are URL-decoded and split on the first `=` only
pub fn parse(body: &str) -> SignedParams {
    url::form_urlencoded::parse(body.trim().as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Decoded form as a JSON object
pub fn to_json(params: &SignedParams) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect::<Map<String, Value>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let params = parse("code=0&message=OK&transId=AB12-CD34-EF56\n");
        assert_eq!(params.get("code"), Some("0"));
        assert_eq!(params.get("message"), Some("OK"));
        assert_eq!(params.get("transId"), Some("AB12-CD34-EF56"));
    }

    #[test]
    fn test_values_are_decoded_and_split_once() {
        let params = parse("message=Invalid%20merchant%3D1&redirect=https%3A%2F%2Fpay.example%2F%3Fa%3Db&empty=");
        assert_eq!(params.get("message"), Some("Invalid merchant=1"));
        assert_eq!(params.get("redirect"), Some("https://pay.example/?a=b"));
        assert_eq!(params.get("empty"), Some(""));

        let params = parse("label=a=b=c");
        assert_eq!(params.get("label"), Some("a=b=c"));
    }

    #[test]
    fn test_to_json() {
        let value = to_json(&parse("code=0&transId=T1"));
        assert_eq!(value["transId"], "T1");
    }
}
