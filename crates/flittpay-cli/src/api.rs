// Thin blocking client for a running flittpay server

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub struct ApiClient {
    base: String,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base, path)
    }

    /// The lookup URL, with `user_id` percent-encoded as one path segment.
    fn balance_url(&self, user_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("/balance"))
            .with_context(|| format!("Invalid server URL '{}'", self.base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Server URL '{}' cannot take a path", self.base))?
            .push(user_id);
        Ok(url)
    }

    pub fn balance(&self, user_id: &str) -> Result<Value> {
        let url = self.balance_url(user_id)?;
        read(self.agent.get(url.as_str()).call())
    }

    pub fn topup(&self, user_id: &str, amount: &str) -> Result<Value> {
        self.post("/balance/topup", json!({"userId": user_id, "amount": amount}))
    }

    pub fn withdraw(&self, user_id: &str, amount: &str) -> Result<Value> {
        self.post("/balance/withdraw", json!({"userId": user_id, "amount": amount}))
    }

    pub fn order_status(&self, order_id: &str) -> Result<Value> {
        self.post("/payment/status", json!({"order_id": order_id}))
    }

    fn post(&self, path: &str, body: Value) -> Result<Value> {
        read(self.agent.post(&self.url(path)).send_json(body))
    }
}

/// Turns a server reply into JSON, surfacing the server's `message` on errors.
fn read(response: Result<ureq::Response, ureq::Error>) -> Result<Value> {
    match response {
        Ok(response) => Ok(response.into_json()?),
        Err(ureq::Error::Status(code, response)) => {
            let body: Value = response.into_json().unwrap_or(Value::Null);
            Err(anyhow!("Server returned {}: {}", code, error_message(&body)))
        }
        Err(e) => Err(anyhow!("Request failed: {}", e)),
    }
}

fn error_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error_message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
