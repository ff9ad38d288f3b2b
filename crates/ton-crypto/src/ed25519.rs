//! Ed25519 signatures.
//!
//! Wallets sign message-body hashes with these keys; the transport uses
//! them as the client identity during the handshake.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors from Ed25519 operations.
#[derive(Debug, Error)]
pub enum Ed25519Error {
    /// The key material has the wrong length or is malformed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature verification failed.
    #[error("Signature verification failed")]
    VerificationFailed,
}

/// An Ed25519 keypair.
///
/// The seed is zeroized on drop. The derived `SigningKey` keeps its own
/// copy internally; it is skipped because it does not implement `Zeroize`.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Ed25519Keypair {
    /// The 32-byte public key.
    #[zeroize(skip)]
    pub public_key: [u8; 32],
    private_key: [u8; 32],
    #[zeroize(skip)]
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Build a keypair from a 32-byte seed.
    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(&private_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        Ed25519Keypair {
            public_key: signing_key.verifying_key().to_bytes(),
            private_key: signing_key.to_bytes(),
            signing_key,
        }
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a signature made with this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), Ed25519Error> {
        verify_signature(&self.public_key, message, signature)
    }

    /// The 32-byte seed.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.private_key
    }
}

impl Clone for Ed25519Keypair {
    fn clone(&self) -> Self {
        Self::from_private_key(self.private_key)
    }
}

impl std::fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Verify a signature against a public key.
pub fn verify_signature(
    public_key: &[u8; 32],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), Ed25519Error> {
    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| Ed25519Error::InvalidKey(e.to_string()))?;
    let signature = Signature::from_bytes(signature);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| Ed25519Error::VerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = Ed25519Keypair::generate();
        let message = b"hello";
        let signature = keypair.sign(message);
        assert!(keypair.verify(message, &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_message() {
        let keypair = Ed25519Keypair::generate();
        let signature = keypair.sign(b"hello");
        assert!(matches!(
            keypair.verify(b"other", &signature),
            Err(Ed25519Error::VerificationFailed)
        ));
    }

    #[test]
    fn test_from_private_key_deterministic() {
        let seed = [7u8; 32];
        let a = Ed25519Keypair::from_private_key(seed);
        let b = Ed25519Keypair::from_private_key(seed);
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(a.sign(b"x"), b.sign(b"x"));
    }

    #[test]
    fn test_debug_redacts_seed() {
        let keypair = Ed25519Keypair::from_private_key([9u8; 32]);
        let rendered = format!("{:?}", keypair);
        assert!(rendered.contains("redacted"));
    }
}
