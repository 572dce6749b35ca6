//! Request signing and signature encoding.

use crate::error::{SigningError, SigningResult};
use crate::message::{prepare_message, SignatureHeader};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Serialize;

/// Length of a raw Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Anything that can produce a detached Ed25519 signature.
///
/// Local agent keys implement this directly; a custodial wallet can be
/// adapted behind the same trait.
pub trait MessageSigner {
    /// Base58 public key the signature verifies against.
    fn public_key_base58(&self) -> String;

    /// Sign raw message bytes.
    fn sign_message(&self, message: &[u8]) -> SigningResult<[u8; SIGNATURE_LEN]>;
}

/// A signed request ready to be merged into an HTTP body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub header: SignatureHeader,
    /// Canonical signing input.
    pub message: String,
    /// Base58-encoded signature over `message`.
    pub signature: String,
}

/// Canonicalize `header` + `payload` and sign the result.
///
/// # Errors
/// `SigningError::Serialization` for payloads that are not JSON objects, or
/// any error surfaced by the signer.
pub fn sign_request<S, P>(
    signer: &S,
    header: SignatureHeader,
    payload: &P,
) -> SigningResult<SignedRequest>
where
    S: MessageSigner + ?Sized,
    P: Serialize + ?Sized,
{
    let message = prepare_message(&header, payload)?;
    // NOTE: do not log the signature alongside the message.
    let raw = signer.sign_message(message.as_bytes())?;

    Ok(SignedRequest {
        header,
        message,
        signature: encode_signature(&raw),
    })
}

/// Encode raw signature bytes as base58.
pub fn encode_signature(signature: &[u8]) -> String {
    bs58::encode(signature).into_string()
}

/// Decode a base58 signature back to its 64 raw bytes.
pub fn decode_signature(encoded: &str) -> SigningResult<[u8; SIGNATURE_LEN]> {
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        SigningError::InvalidSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            v.len()
        ))
    })
}

/// Verify a base58 signature over `message` against a base58 public key.
pub fn verify_signature(
    public_key_base58: &str,
    message: &[u8],
    signature_base58: &str,
) -> SigningResult<()> {
    let key_bytes: [u8; 32] = bs58::decode(public_key_base58)
        .into_vec()?
        .try_into()
        .map_err(|_| SigningError::InvalidKey("public key must be 32 bytes".to_string()))?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|e| SigningError::InvalidKey(e.to_string()))?;

    let signature = Signature::from_bytes(&decode_signature(signature_base58)?);
    verifying_key
        .verify(message, &signature)
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))
}
