//! Shared application state

use std::sync::Arc;

use crate::config::{Config, PaymentFlowKind};
use crate::flow::PaymentFlow;
use crate::gateway::PaymentGateway;
use crate::ledger::LedgerStore;
use crate::reconcile::CallbackReconciler;

/// Handles shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub flow: Arc<PaymentFlow>,
    pub reconciler: Arc<CallbackReconciler>,
}

impl AppState {
    /// Wires the flow controller and the reconciler around one ledger and gateway.
    pub fn new(
        config: &Config,
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let flow = PaymentFlow::new(gateway, ledger.clone(), config.flow.clone());
        let reconciler = CallbackReconciler::new(config.merchant.clone(), ledger.clone());

        Self {
            ledger,
            flow: Arc::new(flow),
            reconciler: Arc::new(reconciler),
        }
    }

    /// The payment flow whose routes are mounted.
    pub fn flow_kind(&self) -> PaymentFlowKind {
        self.flow.settings().kind
    }
}
