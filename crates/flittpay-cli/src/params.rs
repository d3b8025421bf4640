// Parameter parsing for the sign and verify commands
//
// Parameters come from --param key=value flags and/or a JSON payload file.
// Flitt parameter sets are flat, so keys are taken literally.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::path::Path;

use flittpay_signature::Params;

/// Parses a list of key=value strings into a flat parameter set.
///
/// - `amount=10000` -> `{ "amount": "10000" }`
/// - `order_desc=a=b` -> `{ "order_desc": "a=b" }` (split on the first `=`)
///
/// Values stay strings: the signing string is identical for `10000` and
/// `"10000"`, so typing them buys nothing.
pub fn parse_params(args: Vec<String>) -> Result<Params> {
    let mut params = Params::new();

    for arg in args {
        let (key, value) = parse_key_value(&arg)?;
        if params.contains_key(&key) {
            return Err(anyhow!("Duplicate parameter '{}'", key));
        }
        params.insert(key, Value::String(value));
    }

    Ok(params)
}

/// Parses a single "key=value" string.
fn parse_key_value(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid parameter format: '{}'. Expected 'key=value'", arg))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Empty key in parameter: '{}'", arg));
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Extracts the flat parameter set from a JSON payload.
///
/// Accepts a flat object or one wrapped as `{"request": {...}}` or
/// `{"response": {...}}`.
pub fn params_from_json(value: Value) -> Result<Params> {
    let Value::Object(mut map) = value else {
        return Err(anyhow!("Payload must be a JSON object"));
    };

    if map.len() == 1 {
        for wrapper in ["request", "response"] {
            if let Some(Value::Object(_)) = map.get(wrapper) {
                if let Some(Value::Object(inner)) = map.remove(wrapper) {
                    return Ok(inner);
                }
            }
        }
    }

    Ok(map)
}

/// Reads a payload file; see [`params_from_json`].
pub fn load_payload(path: &Path) -> Result<Params> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse '{}' as JSON", path.display()))?;
    params_from_json(value)
}

/// Merges file parameters with flag parameters; flags win.
pub fn merge(mut base: Params, overrides: Params) -> Params {
    for (key, value) in overrides {
        base.insert(key, value);
    }
    base
}

/// Replaces the leading secret of a signing string with asterisks.
pub fn mask_secret(signing_string: &str, secret: &str) -> String {
    match signing_string.strip_prefix(secret) {
        Some(rest) if !secret.is_empty() => format!("****{}", rest),
        _ => signing_string.to_string(),
    }
}
