use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Asynchronous payment notification posted by the Alif gateway.
///
/// Alif has used both snake_case and camelCase keys across API versions, so both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlifCallbackPayload {
    #[serde(alias = "orderId")]
    pub order_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(
        default,
        alias = "transactionId",
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AlifCallbackPayload {
    /// The supplied token, if any. Blank strings count as absent.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Transaction ids arrive either as JSON strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_camel_case_keys_and_string_amounts() {
        let payload: AlifCallbackPayload = serde_json::from_value(json!({
            "orderId": "SAKINA_1_abc",
            "amount": "1000.00",
            "status": "approved",
            "transactionId": "TX1"
        }))
        .unwrap();

        assert_eq!(payload.order_id, "SAKINA_1_abc");
        assert_eq!(payload.amount, Decimal::from(1000));
        assert_eq!(payload.transaction_id.as_deref(), Some("TX1"));
        assert_eq!(payload.token(), None);
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let payload: AlifCallbackPayload = serde_json::from_value(json!({
            "order_id": "SAKINA_1_abc",
            "amount": 10.5,
            "status": "paid",
            "token": "   "
        }))
        .unwrap();

        assert_eq!(payload.token(), None);
    }

    #[test]
    fn numeric_transaction_id_is_kept_as_text() {
        let payload: AlifCallbackPayload = serde_json::from_value(json!({
            "order_id": "SAKINA_1_abc",
            "amount": 1000,
            "status": "approved",
            "transaction_id": 123456789
        }))
        .unwrap();

        assert_eq!(payload.transaction_id.as_deref(), Some("123456789"));

        let payload: AlifCallbackPayload = serde_json::from_value(json!({
            "order_id": "SAKINA_1_abc",
            "amount": 1000,
            "status": "approved",
            "transaction_id": null
        }))
        .unwrap();

        assert_eq!(payload.transaction_id, None);
    }
}
