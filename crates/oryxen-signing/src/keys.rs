//! Agent keypair loading and generation.
//!
//! Security notes:
//! - Secret bytes live in `ed25519_dalek::SigningKey`, which zeroizes on drop.
//! - Intermediate buffers are wrapped in `Zeroizing`.
//! - Never log secret key material.

use crate::error::{SigningError, SigningResult};
use crate::signer::MessageSigner;
use ed25519_dalek::{Signer as _, SigningKey, SECRET_KEY_LENGTH};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;
use zeroize::Zeroizing;

/// Solana keypair encoding: 32-byte seed followed by the 32-byte public key.
const KEYPAIR_LENGTH: usize = 64;

/// Source of a base58-encoded secret key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

impl KeySource {
    /// Read the secret and build a keypair.
    ///
    /// If `expected_public_key` is given, the derived public key must match it.
    ///
    /// # Errors
    /// Returns `SigningError` if the variable or file is missing, the base58
    /// is malformed, the key bytes are invalid or the public key differs.
    pub fn load(&self, expected_public_key: Option<&str>) -> SigningResult<AgentKeypair> {
        let secret = match self {
            Self::EnvVar { var_name } => Zeroizing::new(
                std::env::var(var_name)
                    .map_err(|_| SigningError::EnvVarNotFound(var_name.clone()))?,
            ),
            Self::File { path } => Zeroizing::new(std::fs::read_to_string(path)?),
        };

        let keypair = AgentKeypair::from_base58(&secret)?;

        if let Some(expected) = expected_public_key {
            let actual = keypair.public_key_base58();
            if actual != expected {
                return Err(SigningError::PublicKeyMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        debug!(public_key = %keypair.public_key_base58(), "Loaded keypair");
        Ok(keypair)
    }
}

/// Ed25519 keypair used to sign requests locally.
///
/// An agent keypair is bound to a master account once; afterwards it signs
/// routine operations such as orders without the master key.
pub struct AgentKeypair {
    signing_key: SigningKey,
}

impl AgentKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a base58 secret: either a 32-byte seed or a 64-byte Solana keypair.
    pub fn from_base58(encoded: &str) -> SigningResult<Self> {
        let bytes = Zeroizing::new(bs58::decode(encoded.trim()).into_vec()?);

        match bytes.len() {
            SECRET_KEY_LENGTH => {
                let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
                seed.copy_from_slice(&bytes);
                Ok(Self::from_seed(&seed))
            }
            KEYPAIR_LENGTH => {
                let mut keypair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
                keypair.copy_from_slice(&bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
                Ok(Self { signing_key })
            }
            n => Err(SigningError::InvalidKey(format!(
                "expected {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH} bytes, got {n}"
            ))),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 public key (Solana address form).
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_key_bytes()).into_string()
    }

    /// Base58 of the 64-byte keypair encoding, for persisting a generated key.
    pub fn secret_base58(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(bs58::encode(bytes.as_slice()).into_string())
    }
}

impl MessageSigner for AgentKeypair {
    fn public_key_base58(&self) -> String {
        AgentKeypair::public_key_base58(self)
    }

    fn sign_message(&self, message: &[u8]) -> SigningResult<[u8; 64]> {
        Ok(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for AgentKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKeypair")
            .field("public_key", &self.public_key_base58())
            .finish_non_exhaustive()
    }
}
