//! X25519 ECDH over Ed25519 identity keys.
//!
//! The transport handshake derives its shared secret from the two sides'
//! Ed25519 keys: the private seed is hashed and clamped into an X25519
//! scalar, the public key is mapped from the Edwards curve to Montgomery
//! form, then standard X25519 ECDH runs on the converted keys.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha512};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

/// Errors from key conversion and exchange.
#[derive(Debug, Error)]
pub enum X25519Error {
    /// The key material is malformed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The exchange produced an all-zero (weak) shared secret.
    #[error("Weak key: ECDH produced an all-zero shared secret")]
    WeakKey,
}

/// Standard X25519 ECDH on already-converted keys.
pub fn ecdh(private_key: &[u8; 32], their_public_key: &[u8; 32]) -> [u8; 32] {
    let secret = StaticSecret::from(*private_key);
    let public = PublicKey::from(*their_public_key);
    *secret.diffie_hellman(&public).as_bytes()
}

/// Convert an Ed25519 seed to an X25519 private scalar.
///
/// SHA512 the seed, take the first 32 bytes and clamp per RFC 7748.
pub fn ed25519_to_x25519_private(ed25519_private_key: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    hasher.update(ed25519_private_key);
    let hash = hasher.finalize();

    let mut x25519_private = [0u8; 32];
    x25519_private.copy_from_slice(&hash[..32]);

    x25519_private[0] &= 248;
    x25519_private[31] &= 127;
    x25519_private[31] |= 64;

    x25519_private
}

/// Convert an Ed25519 public key to an X25519 public key.
///
/// Decompresses the Edwards point and maps it to the birationally
/// equivalent Montgomery point, u = (1 + y) / (1 - y).
pub fn ed25519_to_x25519_public(ed25519_public_key: &[u8; 32]) -> Result<[u8; 32], X25519Error> {
    let compressed = CompressedEdwardsY::from_slice(ed25519_public_key)
        .map_err(|_| X25519Error::InvalidKey("Invalid Ed25519 public key length".into()))?;

    let edwards_point = compressed
        .decompress()
        .ok_or_else(|| X25519Error::InvalidKey("Failed to decompress Ed25519 public key".into()))?;

    Ok(edwards_point.to_montgomery().to_bytes())
}

/// ECDH between an Ed25519 private seed and an Ed25519 public key.
///
/// Both keys are converted to their X25519 forms first. An all-zero
/// result (small-order public key) is rejected.
pub fn ecdh_ed25519(
    my_ed25519_private: &[u8; 32],
    their_ed25519_public: &[u8; 32],
) -> Result<[u8; 32], X25519Error> {
    let x25519_private = ed25519_to_x25519_private(my_ed25519_private);
    let x25519_public = ed25519_to_x25519_public(their_ed25519_public)?;

    let shared = ecdh(&x25519_private, &x25519_public);
    if shared.iter().all(|&b| b == 0) {
        return Err(X25519Error::WeakKey);
    }

    Ok(shared)
}
