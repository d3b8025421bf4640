//! Provider gateway: signed calls to the Flitt API.
//!
//! The gateway owns the merchant credentials. Callers hand it bare business
//! parameters; it adds `merchant_id`, signs, posts `{"request": {...}}` and
//! normalizes whatever shape comes back.

pub mod flitt;
pub mod response;

use async_trait::async_trait;
use flittpay_signature::Params;

use crate::error::AppError;

pub use flitt::FlittGateway;
pub use response::{ProviderFailure, ProviderOutcome, ProviderReply};

/// Provider endpoints used by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEndpoint {
    /// 3-D Secure step 1: submit card data, receive ACS redirect or outcome.
    SecureStep1,
    /// 3-D Secure step 2: submit PaRes after ACS authentication.
    SecureStep2,
    /// Hosted checkout page URL.
    CheckoutUrl,
    /// Order status lookup.
    OrderStatus,
}

impl ProviderEndpoint {
    /// Path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            ProviderEndpoint::SecureStep1 => "3dsecure_step1",
            ProviderEndpoint::SecureStep2 => "3dsecure_step2",
            ProviderEndpoint::CheckoutUrl => "checkout/url",
            ProviderEndpoint::OrderStatus => "status/order_id",
        }
    }

    /// Full URL under `api_base`, tolerating a trailing slash.
    pub fn url(self, api_base: &str) -> String {
        format!("{}/{}", api_base.trim_end_matches('/'), self.path())
    }
}

/// Transport-level failures talking to the provider.
///
/// Business failures (`response_status: failure`) are not errors at this
/// level; they come back as [`ProviderOutcome::Failure`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: &'static str },

    #[error("request to {endpoint} failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },

    #[error("{endpoint} answered HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("provider response is missing {0}")]
    MissingField(&'static str),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout { .. })
    }
}

/// Outbound operations against the payment provider.
///
/// Implementations sign every call; `send` is the only required method.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn send(
        &self,
        endpoint: ProviderEndpoint,
        params: Params,
    ) -> Result<ProviderReply, AppError>;

    async fn initiate_3ds(&self, params: Params) -> Result<ProviderReply, AppError> {
        self.send(ProviderEndpoint::SecureStep1, params).await
    }

    async fn complete_3ds(&self, params: Params) -> Result<ProviderReply, AppError> {
        self.send(ProviderEndpoint::SecureStep2, params).await
    }

    async fn checkout_url(&self, params: Params) -> Result<ProviderReply, AppError> {
        self.send(ProviderEndpoint::CheckoutUrl, params).await
    }

    async fn order_status(&self, params: Params) -> Result<ProviderReply, AppError> {
        self.send(ProviderEndpoint::OrderStatus, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            ProviderEndpoint::SecureStep1.url("https://pay.flitt.com/api"),
            "https://pay.flitt.com/api/3dsecure_step1"
        );
        assert_eq!(
            ProviderEndpoint::OrderStatus.url("https://pay.flitt.com/api/"),
            "https://pay.flitt.com/api/status/order_id"
        );
        assert_eq!(
            ProviderEndpoint::CheckoutUrl.url("http://127.0.0.1:9000"),
            "http://127.0.0.1:9000/checkout/url"
        );
    }

    #[test]
    fn test_only_timeouts_report_timeout() {
        assert!(GatewayError::Timeout { endpoint: "x" }.is_timeout());
        assert!(!GatewayError::Decode("x".into()).is_timeout());
    }
}
