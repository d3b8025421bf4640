//! HTTP client for the Flitt payment API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use flittpay_signature::{Params, SignedRequest};

use super::{GatewayError, PaymentGateway, ProviderEndpoint, ProviderReply};
use crate::config::{GatewaySettings, MerchantSettings};
use crate::error::AppError;

/// Longest slice of an unexpected body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Signs and posts requests to the Flitt API.
#[derive(Clone)]
pub struct FlittGateway {
    http: Client,
    api_base: String,
    merchant: MerchantSettings,
}

impl FlittGateway {
    /// Builds a client whose every call is bounded by `settings.timeout`.
    pub fn new(settings: &GatewaySettings, merchant: MerchantSettings) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                endpoint: "client",
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_base: settings.api_base.clone(),
            merchant,
        })
    }
}

/// Numeric merchant ids go out as JSON numbers, anything else as a string.
fn merchant_id_value(merchant_id: &str) -> Value {
    match merchant_id.trim().parse::<u64>() {
        Ok(id) => Value::from(id),
        Err(_) => Value::String(merchant_id.to_string()),
    }
}

fn transport_error(endpoint: ProviderEndpoint, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout {
            endpoint: endpoint.path(),
        }
    } else {
        GatewayError::Transport {
            endpoint: endpoint.path(),
            message: e.to_string(),
        }
    }
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl PaymentGateway for FlittGateway {
    async fn send(
        &self,
        endpoint: ProviderEndpoint,
        mut params: Params,
    ) -> Result<ProviderReply, AppError> {
        let credentials = self.merchant.require()?;
        params.insert(
            "merchant_id".to_string(),
            merchant_id_value(credentials.merchant_id),
        );

        let request = SignedRequest::sign(params, credentials.secret_key);
        let url = endpoint.url(&self.api_base);

        debug!(
            endpoint = endpoint.path(),
            order_id = ?request.params.get("order_id"),
            "Calling payment provider"
        );

        let response = self
            .http
            .post(&url)
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let parsed = ProviderReply::parse(&body);

        if !status.is_success() {
            // A decodable failure body still carries the provider's error code.
            return match parsed {
                Ok(reply) if reply.is_failure() => Ok(reply),
                _ => {
                    warn!(
                        endpoint = endpoint.path(),
                        status = status.as_u16(),
                        "Payment provider returned an error status"
                    );
                    Err(GatewayError::Status {
                        endpoint: endpoint.path(),
                        status: status.as_u16(),
                        body: truncate_body(&body),
                    }
                    .into())
                }
            };
        }

        Ok(parsed?)
    }
}
