// Signature verification for inbound Flitt payloads
//
// Callbacks carry their signature inline next to the signed fields.

use thiserror::Error;

use crate::canonical::stringify_value;
use crate::sign::sign;
use crate::types::{Params, SIGNATURE_FIELD};

/// Reasons an inbound payload fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The payload has no `signature` field, or it is null or empty.
    #[error("payload carries no signature")]
    Missing,

    /// A signature is present but does not match the recomputed one.
    #[error("signature mismatch: received {received}")]
    Mismatch {
        /// The signature found in the payload.
        received: String,
    },
}

/// Verifies a payload that carries its own `signature` field.
///
/// This function:
/// 1. Extracts the `signature` field
/// 2. Signs every remaining field with `secret`
/// 3. Compares both signatures by exact string equality
///
/// # Returns
/// Ok(()) if the signature matches, `SignatureError::Missing` when there is
/// nothing to check, `SignatureError::Mismatch` otherwise
pub fn verify(payload: &Params, secret: &str) -> Result<(), SignatureError> {
    let received = payload
        .get(SIGNATURE_FIELD)
        .and_then(stringify_value)
        .ok_or(SignatureError::Missing)?;

    let mut unsigned = payload.clone();
    unsigned.remove(SIGNATURE_FIELD);

    if sign(&unsigned, secret) != received {
        return Err(SignatureError::Mismatch { received });
    }

    Ok(())
}
