//! Payment flow controller.
//!
//! Orchestrates the 3-D Secure handshake, the hosted checkout redirect and
//! order status queries. Every operation validates its input before the
//! gateway is touched, so a bad request never reaches the provider.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use flittpay_signature::{stringify_value, Params};

use crate::config::FlowSettings;
use crate::error::AppError;
use crate::gateway::{GatewayError, PaymentGateway};
use crate::ledger::LedgerStore;
use crate::models::PaymentOrder;
use crate::reconcile::{apply_payment_credit, CreditOutcome};

/// Protocol version sent with status queries.
const STATUS_API_VERSION: &str = "1.0.1";

/// Client IP reported when the caller supplies none.
const DEFAULT_CLIENT_IP: &str = "127.0.0.1";

/// Body of `POST /payment/3dsecure/step1`.
///
/// Text fields are raw JSON so that numeric card data or user ids reach
/// validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct SecureAuthRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<Value>,
    /// Amount in minor units.
    pub amount: Option<Value>,
    pub currency: Option<Value>,
    pub order_desc: Option<Value>,
    pub order_id: Option<Value>,
    pub card_number: Option<Value>,
    pub cvv2: Option<Value>,
    pub expiry_date: Option<Value>,
    pub client_ip: Option<Value>,
    pub server_callback_url: Option<Value>,
}

/// Body of `POST /payment/3dsecure/step2`.
#[derive(Debug, Default, Deserialize)]
pub struct SecureCompletionRequest {
    pub order_id: Option<Value>,
    pub pares: Option<Value>,
    pub md: Option<Value>,
}

/// Body of `POST /payment/checkout-url`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<Value>,
    /// Amount in minor units.
    pub amount: Option<Value>,
    pub currency: Option<Value>,
    pub order_desc: Option<Value>,
    pub order_id: Option<Value>,
    pub server_callback_url: Option<Value>,
}

/// Result of 3-D Secure step 1.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SecureAuthOutcome {
    /// The cardholder must be redirected to the issuer's ACS with `pareq`/`md`.
    RequiresAuthentication {
        success: bool,
        requires_3ds: bool,
        acs_url: String,
        pareq: Value,
        md: Value,
        order_id: String,
    },
    /// 3-D Secure is disabled for the card; the provider already decided.
    Completed {
        success: bool,
        requires_3ds: bool,
        data: Params,
    },
}

/// Result of 3-D Secure step 2.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SecureCompletion {
    Approved {
        success: bool,
        order_status: Value,
        order_id: Value,
        amount: Value,
        currency: Value,
        transaction_id: Value,
    },
    NotApproved {
        success: bool,
        order_status: Value,
        data: Params,
    },
}

/// Result of the checkout-URL flow.
#[derive(Debug, Serialize, PartialEq)]
pub struct CheckoutSession {
    pub success: bool,
    pub checkout_url: String,
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<Value>,
}

/// Orchestrates provider calls and the post-approval ledger credit.
pub struct PaymentFlow {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn LedgerStore>,
    settings: FlowSettings,
}

/// Reads a string or number field as trimmed text.
///
/// `None` for absent, null, blank and non-scalar values.
pub fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        v @ (Value::String(_) | Value::Number(_)) => stringify_value(&v)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Returns a trimmed, non-empty string or a validation error naming `field`.
fn require_text(field: &'static str, value: Option<Value>) -> Result<String, AppError> {
    scalar_text(value).ok_or_else(|| AppError::missing(field))
}

/// Validates a positive whole amount in minor units.
///
/// Accepts JSON numbers and numeric strings; the value is forwarded as a number.
fn require_minor_amount(field: &'static str, value: Option<Value>) -> Result<Value, AppError> {
    let value = value
        .filter(|v| stringify_value(v).is_some())
        .ok_or_else(|| AppError::missing(field))?;

    let minor = match &value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match minor {
        Some(0) => Err(AppError::invalid(field, format!("{} must be greater than 0", field))),
        Some(m) => Ok(Value::from(m)),
        None => Err(AppError::invalid(
            field,
            format!("{} must be a whole number of minor units", field),
        )),
    }
}

/// Order id used when the caller supplies none.
///
/// Millisecond timestamps can collide under concurrent requests; the
/// provider then rejects the duplicate order id.
pub fn generate_order_id() -> String {
    format!("order_{}", Utc::now().timestamp_millis())
}

impl PaymentFlow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn LedgerStore>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            gateway,
            ledger,
            settings,
        }
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    fn insert_optional(params: &mut Params, key: &str, value: Option<String>) {
        if let Some(v) = value {
            params.insert(key.to_string(), Value::String(v));
        }
    }

    /// 3-D Secure step 1: submit card data, get an ACS redirect or a final outcome.
    ///
    /// The user id travels in `merchant_data` so the provider echoes it back
    /// in step 2 and in callbacks.
    pub async fn initiate_secure_authentication(
        &self,
        request: SecureAuthRequest,
    ) -> Result<SecureAuthOutcome, AppError> {
        let user_id = require_text("userId", request.user_id)?;
        let amount = require_minor_amount("amount", request.amount)?;
        let card_number = require_text("card_number", request.card_number)?;
        let cvv2 = require_text("cvv2", request.cvv2)?;
        let expiry_date = require_text("expiry_date", request.expiry_date)?;

        let order_id = scalar_text(request.order_id).unwrap_or_else(generate_order_id);

        let mut params = Params::new();
        params.insert("amount".into(), amount);
        params.insert("card_number".into(), Value::String(card_number));
        params.insert(
            "client_ip".into(),
            Value::String(
                scalar_text(request.client_ip).unwrap_or_else(|| DEFAULT_CLIENT_IP.to_string()),
            ),
        );
        params.insert(
            "currency".into(),
            Value::String(
                scalar_text(request.currency).unwrap_or_else(|| self.settings.currency.clone()),
            ),
        );
        params.insert("cvv2".into(), Value::String(cvv2));
        params.insert("expiry_date".into(), Value::String(expiry_date));
        params.insert("merchant_data".into(), Value::String(user_id.clone()));
        params.insert(
            "order_desc".into(),
            Value::String(
                scalar_text(request.order_desc)
                    .unwrap_or_else(|| self.settings.order_description.clone()),
            ),
        );
        params.insert("order_id".into(), Value::String(order_id.clone()));
        Self::insert_optional(&mut params, "response_url", self.settings.response_url.clone());
        Self::insert_optional(
            &mut params,
            "server_callback_url",
            scalar_text(request.server_callback_url)
                .or_else(|| self.settings.server_callback_url.clone()),
        );

        info!(order_id = %order_id, user_id = %user_id, "Initiating 3-D Secure payment");

        let data = self.gateway.initiate_3ds(params).await?.into_success()?;

        match data.get("acs_url").and_then(stringify_value) {
            Some(acs_url) => Ok(SecureAuthOutcome::RequiresAuthentication {
                success: true,
                requires_3ds: true,
                acs_url,
                pareq: data.get("pareq").cloned().unwrap_or(Value::Null),
                md: data.get("md").cloned().unwrap_or(Value::Null),
                order_id,
            }),
            None => Ok(SecureAuthOutcome::Completed {
                success: true,
                requires_3ds: false,
                data,
            }),
        }
    }

    /// 3-D Secure step 2: submit the ACS result and credit the ledger on approval.
    ///
    /// The credit is best-effort: the provider already captured the payment,
    /// so a ledger failure is logged for manual reconciliation and the
    /// approval is still reported.
    pub async fn complete_secure_authentication(
        &self,
        request: SecureCompletionRequest,
    ) -> Result<SecureCompletion, AppError> {
        let order_id = require_text("order_id", request.order_id)?;
        let pares = require_text("pares", request.pares)?;
        let md = require_text("md", request.md)?;

        let mut params = Params::new();
        params.insert("md".into(), Value::String(md));
        params.insert("order_id".into(), Value::String(order_id.clone()));
        params.insert("pares".into(), Value::String(pares));

        let data = self.gateway.complete_3ds(params).await?.into_success()?;
        let order = PaymentOrder::from_provider(&data);

        if !order.is_approved() {
            info!(
                order_id = %order_id,
                order_status = ?order.status,
                "3-D Secure payment not approved"
            );
            return Ok(SecureCompletion::NotApproved {
                success: false,
                order_status: data.get("order_status").cloned().unwrap_or(Value::Null),
                data,
            });
        }

        if let CreditOutcome::Applied { amount, .. } =
            apply_payment_credit(self.ledger.as_ref(), &order, "3dsecure_step2").await
        {
            info!(order_id = %order_id, amount = %amount, "3-D Secure payment credited");
        }

        let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
        Ok(SecureCompletion::Approved {
            success: true,
            order_status: field("order_status"),
            order_id: field("order_id"),
            amount: field("amount"),
            currency: field("currency"),
            transaction_id: field("payment_id"),
        })
    }

    /// Queries the provider for an order and returns its body untouched.
    pub async fn check_order_status(&self, order_id: Option<Value>) -> Result<Value, AppError> {
        let order_id = require_text("order_id", order_id)?;

        let mut params = Params::new();
        params.insert("order_id".into(), Value::String(order_id));
        params.insert("version".into(), Value::String(STATUS_API_VERSION.to_string()));

        let reply = self.gateway.order_status(params).await?;
        Ok(reply.raw)
    }

    /// Hosted checkout: returns the provider page the browser should be sent to.
    pub async fn create_checkout_url(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, AppError> {
        let user_id = require_text("userId", request.user_id)?;
        let amount = require_minor_amount("amount", request.amount)?;
        let order_id = scalar_text(request.order_id).unwrap_or_else(generate_order_id);

        let mut params = Params::new();
        params.insert("amount".into(), amount);
        params.insert(
            "currency".into(),
            Value::String(
                scalar_text(request.currency).unwrap_or_else(|| self.settings.currency.clone()),
            ),
        );
        params.insert("merchant_data".into(), Value::String(user_id.clone()));
        params.insert(
            "order_desc".into(),
            Value::String(
                scalar_text(request.order_desc)
                    .unwrap_or_else(|| self.settings.order_description.clone()),
            ),
        );
        params.insert("order_id".into(), Value::String(order_id.clone()));
        Self::insert_optional(&mut params, "response_url", self.settings.response_url.clone());
        Self::insert_optional(
            &mut params,
            "server_callback_url",
            scalar_text(request.server_callback_url)
                .or_else(|| self.settings.server_callback_url.clone()),
        );

        info!(order_id = %order_id, user_id = %user_id, "Creating checkout URL");

        let data = self.gateway.checkout_url(params).await?.into_success()?;
        let checkout_url = data
            .get("checkout_url")
            .and_then(stringify_value)
            .ok_or(GatewayError::MissingField("checkout_url"))?;

        Ok(CheckoutSession {
            success: true,
            checkout_url,
            order_id,
            payment_id: data.get("payment_id").filter(|v| !v.is_null()).cloned(),
        })
    }
}
