// Request signing for the Flitt API
//
// sha1 over the merchant secret followed by every present parameter value,
// in key order, separated by `|`.

use crate::canonical::signing_string;
use crate::hash::sha1_hex;
use crate::types::Params;

/// Computes the signature of a parameter set.
///
/// The result is a pure function of the key/value pairs and the secret:
/// map iteration order does not matter, and null or empty values are ignored.
///
/// # Arguments
/// * `params` - Parameters to sign, without a `signature` entry
/// * `secret` - The merchant's shared secret key
///
/// # Returns
/// The 40-character lowercase hex SHA-1 digest
pub fn sign(params: &Params, secret: &str) -> String {
    sha1_hex(signing_string(params, secret).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn params(value: Value) -> Params {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn test_sign_known_value() {
        let p = params(json!({
            "order_id": "order_1",
            "amount": 10000,
            "currency": "GEL",
            "merchant_id": 1549901
        }));
        assert_eq!(sign(&p, "test"), "95dfe4869ce15360495c3628391dd94827fbf787");
    }

    #[test]
    fn test_sign_is_insertion_order_independent() {
        let mut forward = Params::new();
        forward.insert("amount".into(), json!(500));
        forward.insert("currency".into(), json!("GEL"));
        forward.insert("order_id".into(), json!("o-9"));

        let mut backward = Params::new();
        backward.insert("order_id".into(), json!("o-9"));
        backward.insert("currency".into(), json!("GEL"));
        backward.insert("amount".into(), json!(500));

        assert_eq!(sign(&forward, "k"), sign(&backward, "k"));
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let p = params(json!({"order_id": "o"}));
        assert_ne!(sign(&p, "one"), sign(&p, "two"));
    }

    #[test]
    fn test_absent_equals_empty_equals_null() {
        let absent = params(json!({"order_id": "o"}));
        let empty = params(json!({"order_id": "o", "merchant_data": ""}));
        let null = params(json!({"order_id": "o", "merchant_data": null}));
        assert_eq!(sign(&absent, "k"), sign(&empty, "k"));
        assert_eq!(sign(&absent, "k"), sign(&null, "k"));
    }
}
