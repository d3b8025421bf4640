//! Provider-side order view, rebuilt from step-2 responses and callbacks.
//!
//! Orders are never persisted here; the struct only correlates what the
//! provider reports with the user carried in `merchant_data`.

use bigdecimal::{BigDecimal, Signed};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use flittpay_signature::{stringify_value, Params};

/// Order status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Approved,
    Declined,
    Failed,
    /// Any other provider status (created, processing, expired, reversed, ...).
    Other(String),
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => OrderStatus::Pending,
            "approved" => OrderStatus::Approved,
            "declined" => OrderStatus::Declined,
            "failed" => OrderStatus::Failed,
            _ => OrderStatus::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Declined => "declined",
            OrderStatus::Failed => "failed",
            OrderStatus::Other(s) => s,
        }
    }
}

/// The amount field is not a non-negative whole number of minor units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount: {0}")]
pub struct InvalidAmount(pub String);

/// Converts a provider amount in minor units (tetri, cents) to major units.
///
/// Accepts numbers and numeric strings; the division by 100 is exact.
/// Fractional and negative minor amounts are rejected, since the ledger
/// only stores two decimal places and never goes below zero.
pub fn minor_to_major(value: &Value) -> Result<BigDecimal, InvalidAmount> {
    let text = stringify_value(value).ok_or_else(|| InvalidAmount(value.to_string()))?;
    let minor = BigDecimal::from_str(text.trim()).map_err(|_| InvalidAmount(text.clone()))?;
    if minor.is_negative() || minor.normalized().as_bigint_and_exponent().1 > 0 {
        return Err(InvalidAmount(text));
    }
    let (digits, scale) = minor.into_bigint_and_exponent();
    Ok(BigDecimal::new(digits, scale + 2))
}

/// Order fields extracted from a provider payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOrder {
    pub order_id: Option<String>,
    /// Amount in minor units, exactly as the provider sent it.
    pub amount: Option<Value>,
    pub currency: Option<String>,
    pub status: Option<OrderStatus>,
    pub response_status: Option<String>,
    /// Internal user id echoed back by the provider.
    pub merchant_data: Option<String>,
    /// Provider-side payment id, exposed as `transaction_id`.
    pub payment_id: Option<Value>,
}

fn text_field(params: &Params, key: &str) -> Option<String> {
    params.get(key).and_then(stringify_value)
}

fn raw_field(params: &Params, key: &str) -> Option<Value> {
    params.get(key).filter(|v| !v.is_null()).cloned()
}

impl PaymentOrder {
    /// Reads the order fields from a normalized provider payload.
    pub fn from_provider(params: &Params) -> Self {
        Self {
            order_id: text_field(params, "order_id"),
            amount: raw_field(params, "amount"),
            currency: text_field(params, "currency"),
            status: text_field(params, "order_status").map(OrderStatus::from),
            response_status: text_field(params, "response_status"),
            merchant_data: text_field(params, "merchant_data"),
            payment_id: raw_field(params, "payment_id"),
        }
    }

    /// True when the provider reports a successful response for an approved order.
    pub fn is_approved(&self) -> bool {
        self.response_status.as_deref() == Some("success")
            && self.status == Some(OrderStatus::Approved)
    }

    /// The credited amount in major units.
    pub fn major_amount(&self) -> Result<BigDecimal, InvalidAmount> {
        match &self.amount {
            Some(value) => minor_to_major(value),
            None => Err(InvalidAmount("missing".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"declined\"").unwrap(),
            OrderStatus::Declined
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"processing\"").unwrap(),
            OrderStatus::Other("processing".into())
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Other("expired".into())).unwrap(),
            "\"expired\""
        );
    }

    #[test]
    fn test_minor_to_major() {
        assert_eq!(minor_to_major(&json!(10000)).unwrap(), BigDecimal::from(100));
        assert_eq!(minor_to_major(&json!("10000")).unwrap(), BigDecimal::from(100));
        assert_eq!(
            minor_to_major(&json!(1234)).unwrap(),
            BigDecimal::from_str("12.34").unwrap()
        );
        assert_eq!(
            minor_to_major(&json!(5)).unwrap(),
            BigDecimal::from_str("0.05").unwrap()
        );
    }

    #[test]
    fn test_minor_to_major_rejects_garbage() {
        assert!(minor_to_major(&json!("ten")).is_err());
        assert!(minor_to_major(&json!("")).is_err());
        assert!(minor_to_major(&Value::Null).is_err());
    }

    #[test]
    fn test_minor_to_major_rejects_fractional_and_negative() {
        assert_eq!(minor_to_major(&json!("100.5")), Err(InvalidAmount("100.5".into())));
        assert!(minor_to_major(&json!(100.5)).is_err());
        assert!(minor_to_major(&json!("-100")).is_err());
        assert!(minor_to_major(&json!(-1)).is_err());

        // Integral spellings are still whole minor units.
        assert_eq!(minor_to_major(&json!(300.0)).unwrap(), BigDecimal::from(3));
        assert_eq!(minor_to_major(&json!("0")).unwrap(), BigDecimal::from(0));
    }

    #[test]
    fn test_from_provider_approved() {
        let order = PaymentOrder::from_provider(&params(json!({
            "order_id": "order_1",
            "order_status": "approved",
            "response_status": "success",
            "amount": 10000,
            "currency": "GEL",
            "merchant_data": "u1",
            "payment_id": 802345
        })));

        assert!(order.is_approved());
        assert_eq!(order.order_id.as_deref(), Some("order_1"));
        assert_eq!(order.merchant_data.as_deref(), Some("u1"));
        assert_eq!(order.payment_id, Some(json!(802345)));
        assert_eq!(order.major_amount().unwrap(), BigDecimal::from(100));
    }

    #[test]
    fn test_not_approved_cases() {
        let declined = PaymentOrder::from_provider(&params(json!({
            "order_status": "declined",
            "response_status": "success"
        })));
        assert!(!declined.is_approved());

        let failed_response = PaymentOrder::from_provider(&params(json!({
            "order_status": "approved",
            "response_status": "failure"
        })));
        assert!(!failed_response.is_approved());
    }

    #[test]
    fn test_empty_merchant_data_is_absent() {
        let order = PaymentOrder::from_provider(&params(json!({"merchant_data": ""})));
        assert!(order.merchant_data.is_none());
        assert!(order.major_amount().is_err());
    }
}
