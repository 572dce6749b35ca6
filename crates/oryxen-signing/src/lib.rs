//! Request canonicalization and signing for Oryxen.
//!
//! The Pacifica API verifies a detached Ed25519 signature over a canonical
//! JSON rendering of each request. The rendering must match the server's
//! canonicalizer byte for byte:
//! 1. Merge the signature header with the payload under `data`
//! 2. Sort object keys recursively (arrays keep their order)
//! 3. Serialize with compact separators
//!
//! The signature travels base58-encoded.

pub mod canonical;
pub mod error;
pub mod keys;
pub mod message;
pub mod signer;

pub use canonical::{canonicalize, to_canonical_string};
pub use error::{SigningError, SigningResult};
pub use keys::{AgentKeypair, KeySource};
pub use message::{
    prepare_message, SignatureHeader, BIND_AGENT_WALLET, CREATE_MARKET_ORDER,
    DEFAULT_EXPIRY_WINDOW_MS,
};
pub use signer::{
    decode_signature, encode_signature, sign_request, verify_signature, MessageSigner,
    SignedRequest, SIGNATURE_LEN,
};
