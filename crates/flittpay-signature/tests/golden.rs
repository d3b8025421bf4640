// Golden vector integration test for Flitt signatures
//
// Validates the implementation against the vectors in
// fixtures/signature_vectors.json. Any difference means requests would be
// rejected by the provider, so every field is checked.

use flittpay_signature::{sign, signing_string, verify, Params, SignedRequest};
use serde::Deserialize;
use std::fs;

/// One entry of the golden vector file
#[derive(Deserialize)]
struct GoldenVector {
    name: String,
    secret: String,
    params: Params,
    signing_string: String,
    signature: String,
}

fn load_golden_vectors() -> Vec<GoldenVector> {
    let path = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../fixtures/signature_vectors.json"
    );
    let content = fs::read_to_string(path).expect("Failed to read signature_vectors.json");
    serde_json::from_str(&content).expect("Failed to parse signature_vectors.json")
}

#[test]
fn test_golden_signing_strings() {
    for golden in load_golden_vectors() {
        assert_eq!(
            signing_string(&golden.params, &golden.secret),
            golden.signing_string,
            "signing string mismatch for vector '{}'",
            golden.name
        );
    }
}

#[test]
fn test_golden_signatures() {
    for golden in load_golden_vectors() {
        assert_eq!(
            sign(&golden.params, &golden.secret),
            golden.signature,
            "signature mismatch for vector '{}'",
            golden.name
        );
    }
}

#[test]
fn test_golden_vectors_verify_as_callbacks() {
    for golden in load_golden_vectors() {
        let payload = SignedRequest::sign(golden.params, &golden.secret).into_flat();
        assert_eq!(payload["signature"], golden.signature.as_str());
        verify(&payload, &golden.secret)
            .unwrap_or_else(|e| panic!("vector '{}' failed to verify: {}", golden.name, e));
    }
}
