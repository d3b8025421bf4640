//! Callback verification and ledger reconciliation.
//!
//! The provider posts signed order updates asynchronously. A verified
//! approval credits the user named in `merchant_data`. The same credit path
//! serves 3-D Secure step 2.

use bigdecimal::BigDecimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use flittpay_signature::{stringify_value, verify, Params, SIGNATURE_FIELD};

use crate::config::MerchantSettings;
use crate::error::AppError;
use crate::ledger::LedgerStore;
use crate::models::PaymentOrder;

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackAck {
    /// Signature verified; any credit was attempted.
    Ok,
    /// No signature to check; nothing was done.
    Ignored,
}

/// JSON body of the acknowledgement: `{"status": "ok"}`.
#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub status: CallbackAck,
}

/// What the shared credit path did with a confirmed payment.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Applied { user_id: String, amount: BigDecimal },
    /// The payload named no user; nothing to credit.
    SkippedNoUser,
    /// Amount or ledger failure, logged for manual reconciliation.
    Failed,
}

/// Credits the user of an approved order.
///
/// Never fails the caller: the payment is already captured by the provider,
/// so problems are logged with enough context to reconcile by hand.
pub async fn apply_payment_credit(
    ledger: &dyn LedgerStore,
    order: &PaymentOrder,
    source: &'static str,
) -> CreditOutcome {
    let order_id = order.order_id.as_deref().unwrap_or("");
    let raw_amount = order
        .amount
        .as_ref()
        .map(Value::to_string)
        .unwrap_or_default();

    let Some(user_id) = order.merchant_data.as_deref() else {
        warn!(order_id, source, "Approved payment carries no merchant_data, skipping credit");
        return CreditOutcome::SkippedNoUser;
    };

    let amount = match order.major_amount() {
        Ok(amount) => amount,
        Err(e) => {
            error!(
                user_id,
                order_id,
                amount = %raw_amount,
                source,
                "Cannot credit approved payment: {}",
                e
            );
            return CreditOutcome::Failed;
        }
    };

    match ledger.credit(user_id, &amount).await {
        Ok(record) => {
            info!(
                user_id,
                order_id,
                amount = %amount,
                balance = %record.amount,
                source,
                "Balance credited"
            );
            CreditOutcome::Applied {
                user_id: user_id.to_string(),
                amount,
            }
        }
        Err(e) => {
            error!(
                user_id,
                order_id,
                amount = %amount,
                source,
                "Failed to credit approved payment: {}",
                e
            );
            CreditOutcome::Failed
        }
    }
}

fn carries_signature(payload: &Params) -> bool {
    payload.get(SIGNATURE_FIELD).and_then(stringify_value).is_some()
}

/// Verifies provider callbacks and applies approved payments.
pub struct CallbackReconciler {
    merchant: MerchantSettings,
    ledger: Arc<dyn LedgerStore>,
}

impl CallbackReconciler {
    pub fn new(merchant: MerchantSettings, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { merchant, ledger }
    }

    /// Handles one callback payload.
    ///
    /// Orders are not de-duplicated: a redelivered callback, or a callback
    /// following a credited step 2, credits again.
    pub async fn handle(&self, payload: Params) -> Result<CallbackAck, AppError> {
        if !carries_signature(&payload) {
            info!(order_id = ?payload.get("order_id"), "Callback without signature ignored");
            return Ok(CallbackAck::Ignored);
        }

        let secret = self.merchant.require_secret()?;

        if let Err(e) = verify(&payload, secret) {
            warn!(order_id = ?payload.get("order_id"), "Rejected callback: {}", e);
            return Err(AppError::InvalidSignature);
        }

        let order = PaymentOrder::from_provider(&payload);
        if order.is_approved() {
            apply_payment_credit(self.ledger.as_ref(), &order, "callback").await;
        } else {
            info!(
                order_id = ?order.order_id,
                order_status = ?order.status,
                "Callback for non-approved order"
            );
        }

        Ok(CallbackAck::Ok)
    }
}
