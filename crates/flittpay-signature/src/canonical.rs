// Canonical signing string for Flitt parameter sets
//
// The provider signs `secret|v1|v2|...` where the values follow the
// lexicographic order of their keys. Absent, null and empty values leave
// no slot at all, not even a bare `|`.

use serde_json::{Number, Value};

use crate::types::Params;

/// Separator placed between the secret and every present value.
const SEPARATOR: char = '|';

/// Builds the string that gets hashed for a parameter set.
///
/// Keys are ordered by their UTF-8 bytes regardless of how the map iterates,
/// so the result does not depend on insertion order or on serde_json's
/// `preserve_order` feature.
///
/// # Arguments
/// * `params` - The parameters to sign (must not contain the signature itself)
/// * `secret` - The merchant's shared secret key
pub fn signing_string(params: &Params, secret: &str) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));

    let mut out = String::from(secret);
    for key in keys {
        if let Some(value) = params.get(key).and_then(stringify_value) {
            out.push(SEPARATOR);
            out.push_str(&value);
        }
    }
    out
}

/// Renders a parameter value the way it contributes to the signing string.
///
/// Returns `None` for values that must be skipped (null and empty strings).
/// Numbers and their string spellings render identically, so `100`, `100.0`
/// and `"100"` all become `100`.
pub fn stringify_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(stringify_number(n)),
        Value::Bool(b) => Some(b.to_string()),
        // Nested structures are rare in this API; compact JSON keeps them stable.
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn stringify_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_keys_are_sorted() {
        let p = params(json!({"zebra": "z", "alpha": "a", "middle": "m"}));
        assert_eq!(signing_string(&p, "key"), "key|a|m|z");
    }

    #[test]
    fn test_empty_and_null_leave_no_slot() {
        let p = params(json!({"a": "", "b": null, "c": "kept"}));
        assert_eq!(signing_string(&p, "key"), "key|kept");
    }

    #[test]
    fn test_only_secret_when_nothing_present() {
        assert_eq!(signing_string(&Params::new(), "key"), "key");
        let p = params(json!({"a": "", "b": null}));
        assert_eq!(signing_string(&p, "key"), "key");
    }

    #[test]
    fn test_number_and_string_render_identically() {
        let numeric = params(json!({"amount": 100}));
        let textual = params(json!({"amount": "100"}));
        let float = params(json!({"amount": 100.0}));
        assert_eq!(signing_string(&numeric, "k"), signing_string(&textual, "k"));
        assert_eq!(signing_string(&numeric, "k"), signing_string(&float, "k"));
    }

    #[test]
    fn test_zero_is_present() {
        // Only null and "" are skipped; a zero amount still occupies a slot.
        let p = params(json!({"amount": 0, "fee": "0"}));
        assert_eq!(signing_string(&p, "k"), "k|0|0");
    }

    #[test]
    fn test_fractional_and_bool_values() {
        assert_eq!(stringify_value(&json!(12.5)).as_deref(), Some("12.5"));
        assert_eq!(stringify_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(stringify_value(&json!(-3)).as_deref(), Some("-3"));
    }

    #[test]
    fn test_byte_order_not_case_folded() {
        // Uppercase letters sort before lowercase in byte order.
        let p = params(json!({"b": "lower", "B": "upper"}));
        assert_eq!(signing_string(&p, "k"), "k|upper|lower");
    }
}
