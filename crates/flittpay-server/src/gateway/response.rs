//! Normalization of provider responses.
//!
//! The provider sometimes wraps its payload as `{"response": {...}}` and
//! sometimes returns the fields flat. Both decode into the same
//! [`ProviderReply`], so call sites never inspect the shape themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use flittpay_signature::{stringify_value, Params};

use super::GatewayError;
use crate::error::AppError;

/// The two body shapes the provider uses.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Nested { response: Params },
    Flat(Params),
}

impl Envelope {
    fn into_inner(self) -> Params {
        match self {
            Envelope::Nested { response } => response,
            Envelope::Flat(params) => params,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ResponseStatus {
    Success,
    Failure,
}

/// Business failure reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderFailure {
    pub error_code: Value,
    pub error_message: Value,
    pub request_id: Value,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = stringify_value(&self.error_code).unwrap_or_else(|| "?".to_string());
        let message = stringify_value(&self.error_message).unwrap_or_default();
        write!(f, "[{}] {}", code, message)
    }
}

/// Decoded provider answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// Anything not explicitly marked `response_status: failure`.
    Success(Params),
    Failure(ProviderFailure),
}

/// A provider answer together with the untouched body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    /// The body exactly as received, for verbatim forwarding.
    pub raw: Value,
    pub outcome: ProviderOutcome,
}

impl ProviderReply {
    /// Decodes a response body.
    pub fn parse(body: &[u8]) -> Result<Self, GatewayError> {
        let raw: Value =
            serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        Self::from_value(raw)
    }

    /// Normalizes an already-parsed body.
    pub fn from_value(raw: Value) -> Result<Self, GatewayError> {
        let data = Envelope::deserialize(&raw)
            .map_err(|_| GatewayError::Decode("expected a JSON object".to_string()))?
            .into_inner();

        let status = data
            .get("response_status")
            .and_then(|s| ResponseStatus::deserialize(s).ok());

        let outcome = if status == Some(ResponseStatus::Failure) {
            let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
            ProviderOutcome::Failure(ProviderFailure {
                error_code: field("error_code"),
                error_message: field("error_message"),
                request_id: field("request_id"),
            })
        } else {
            ProviderOutcome::Success(data)
        };

        Ok(Self { raw, outcome })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ProviderOutcome::Failure(_))
    }

    /// Returns the normalized fields, turning a provider failure into a decline error.
    pub fn into_success(self) -> Result<Params, AppError> {
        match self.outcome {
            ProviderOutcome::Success(data) => Ok(data),
            ProviderOutcome::Failure(failure) => Err(AppError::ProviderDecline(failure)),
        }
    }
}
