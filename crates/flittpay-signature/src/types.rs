//! Type definitions for signed Flitt requests.
//!
//! Every request sent to the provider is wrapped as
//! `{"request": {...params, "signature": "<sha1>"}}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::sign::sign;

/// A flat parameter set as exchanged with the provider.
pub type Params = Map<String, Value>;

/// Name of the field carrying the signature in requests and callbacks.
pub const SIGNATURE_FIELD: &str = "signature";

/// Parameters together with the signature computed over them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedRequest {
    /// The signed parameters, without the signature itself.
    pub params: Params,
    /// Lowercase hex SHA-1 over the canonical signing string.
    pub signature: String,
}

impl SignedRequest {
    /// Signs `params` with `secret`.
    ///
    /// A stray `signature` entry in `params` is dropped first so that it can
    /// neither leak into the signing string nor shadow the real signature.
    pub fn sign(mut params: Params, secret: &str) -> Self {
        params.remove(SIGNATURE_FIELD);
        let signature = sign(&params, secret);
        Self { params, signature }
    }

    /// Returns the flat parameter map including the `signature` field.
    pub fn into_flat(self) -> Params {
        let mut flat = self.params;
        flat.insert(SIGNATURE_FIELD.to_string(), Value::String(self.signature));
        flat
    }

    /// Builds the JSON body posted to the provider.
    pub fn to_payload(&self) -> Value {
        json!({ "request": self.clone().into_flat() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let params = json!({"order_id": "order_1", "merchant_id": 1549901})
            .as_object()
            .cloned()
            .unwrap();
        let request = SignedRequest::sign(params, "test");
        let payload = request.to_payload();

        assert_eq!(payload["request"]["order_id"], "order_1");
        assert_eq!(payload["request"]["merchant_id"], 1549901);
        assert_eq!(payload["request"]["signature"], request.signature);
        assert_eq!(payload.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_stray_signature_is_not_signed() {
        let clean = json!({"order_id": "o"}).as_object().cloned().unwrap();
        let dirty = json!({"order_id": "o", "signature": "forged"})
            .as_object()
            .cloned()
            .unwrap();

        let a = SignedRequest::sign(clean, "k");
        let b = SignedRequest::sign(dirty, "k");
        assert_eq!(a, b);
        assert!(!b.params.contains_key(SIGNATURE_FIELD));
    }

    #[test]
    fn test_into_flat_appends_signature() {
        let params = json!({"a": "1"}).as_object().cloned().unwrap();
        let request = SignedRequest::sign(params, "k");
        let signature = request.signature.clone();
        let flat = request.into_flat();
        assert_eq!(flat["a"], "1");
        assert_eq!(flat[SIGNATURE_FIELD], signature);
    }
}
