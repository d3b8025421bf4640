// flittpay signature - canonical signing for Flitt requests and callbacks

pub mod canonical;
pub mod hash;
pub mod sign;
pub mod types;
pub mod verify;

pub use canonical::{signing_string, stringify_value};
pub use hash::sha1_hex;
pub use sign::sign;
pub use types::{Params, SignedRequest, SIGNATURE_FIELD};
pub use verify::{verify, SignatureError};
