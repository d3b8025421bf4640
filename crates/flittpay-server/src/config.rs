//! Process configuration, read from the environment at startup.
//!
//! Business logic never reads the environment itself: the values below are
//! handed to the gateway, flow controller and reconciler at construction.

use std::fmt;
use std::time::Duration;

use crate::error::AppError;

/// Default provider API base URL.
pub const DEFAULT_API_BASE: &str = "https://pay.flitt.com/api";

/// Default timeout for outbound provider calls, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Upper bound accepted for `FLITT_TIMEOUT_SECS`.
const MAX_TIMEOUT_SECS: u64 = 120;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} must be between 1 and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        max: u64,
    },
}

/// Which product flow the payment routes expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFlowKind {
    /// Card data collected here, 3-D Secure step1/step2.
    #[default]
    ThreeDSecure,
    /// Provider-hosted checkout page reached via a redirect URL.
    Checkout,
}

impl PaymentFlowKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "3dsecure" | "3ds" | "three_d_secure" => Some(Self::ThreeDSecure),
            "checkout" | "checkout_url" => Some(Self::Checkout),
            _ => None,
        }
    }
}

/// Merchant credentials used to sign requests and verify callbacks.
///
/// Either value may be missing; requests that need them then fail with a
/// configuration error instead of falling back to a test secret.
#[derive(Clone, Default)]
pub struct MerchantSettings {
    pub merchant_id: Option<String>,
    pub secret_key: Option<String>,
}

/// Borrowed view of complete merchant credentials.
#[derive(Debug, Clone, Copy)]
pub struct MerchantCredentials<'a> {
    pub merchant_id: &'a str,
    pub secret_key: &'a str,
}

impl MerchantSettings {
    pub fn new(merchant_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            merchant_id: Some(merchant_id.into()),
            secret_key: Some(secret_key.into()),
        }
    }

    /// Returns both credentials or a configuration error.
    pub fn require(&self) -> Result<MerchantCredentials<'_>, AppError> {
        match (self.merchant_id.as_deref(), self.secret_key.as_deref()) {
            (Some(merchant_id), Some(secret_key)) => Ok(MerchantCredentials {
                merchant_id,
                secret_key,
            }),
            _ => Err(AppError::Configuration(
                "Flitt merchant configuration missing".to_string(),
            )),
        }
    }

    /// Returns the secret alone; callbacks only need the secret.
    pub fn require_secret(&self) -> Result<&str, AppError> {
        self.secret_key.as_deref().ok_or_else(|| {
            AppError::Configuration("Flitt secret key missing".to_string())
        })
    }

    pub fn is_complete(&self) -> bool {
        self.merchant_id.is_some() && self.secret_key.is_some()
    }
}

impl fmt::Debug for MerchantSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantSettings")
            .field("merchant_id", &self.merchant_id)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings for the outbound provider client.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Defaults applied to outbound payment requests.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub kind: PaymentFlowKind,
    pub currency: String,
    pub order_description: String,
    pub response_url: Option<String>,
    pub server_callback_url: Option<String>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            kind: PaymentFlowKind::default(),
            currency: "GEL".to_string(),
            order_description: "Payment".to_string(),
            response_url: None,
            server_callback_url: None,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub merchant: MerchantSettings,
    pub gateway: GatewaySettings,
    pub flow: FlowSettings,
}

impl Config {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary lookup function.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v,
            })?,
            None => 5000,
        };

        let timeout_secs = match get("FLITT_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v.trim().parse().map_err(|_| ConfigError::Invalid {
                    name: "FLITT_TIMEOUT_SECS",
                    value: v.clone(),
                })?;
                if secs == 0 || secs > MAX_TIMEOUT_SECS {
                    return Err(ConfigError::OutOfRange {
                        name: "FLITT_TIMEOUT_SECS",
                        value: secs,
                        max: MAX_TIMEOUT_SECS,
                    });
                }
                secs
            }
            None => DEFAULT_TIMEOUT_SECS,
        };

        let kind = match get("PAYMENT_FLOW") {
            Some(v) => PaymentFlowKind::parse(&v).ok_or(ConfigError::Invalid {
                name: "PAYMENT_FLOW",
                value: v,
            })?,
            None => PaymentFlowKind::default(),
        };

        let defaults = FlowSettings::default();

        Ok(Self {
            port,
            database_url: get("DATABASE_URL"),
            merchant: MerchantSettings {
                merchant_id: get("FLITT_MERCHANT_ID"),
                secret_key: get("FLITT_SECRET_KEY"),
            },
            gateway: GatewaySettings {
                api_base: get("FLITT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            flow: FlowSettings {
                kind,
                currency: get("PAYMENT_CURRENCY").unwrap_or(defaults.currency),
                order_description: defaults.order_description,
                response_url: get("PAYMENT_RESPONSE_URL"),
                server_callback_url: get("PAYMENT_CALLBACK_URL"),
            },
        })
    }
}
