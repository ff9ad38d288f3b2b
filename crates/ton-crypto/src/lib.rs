//! Cryptographic primitives for the TON client.
//!
//! - **Ed25519**: wallet and transport identity keys, message signing
//! - **X25519**: ECDH over converted Ed25519 keys for the transport handshake
//! - **AES-256-CTR**: session encryption of transport frames
//! - **SHA256**: digests, cell hashes, key ids
//!
//! Key ids (SHA256 of the TL-serialized public key) identify liteserver
//! keys during the handshake.

pub mod aes_ctr;
pub mod ed25519;
pub mod keys;
pub mod sha256;
pub mod x25519;

pub use aes_ctr::AesCtrCipher;
pub use ed25519::{Ed25519Error, Ed25519Keypair, verify_signature};
pub use keys::{TL_PREFIX_ED25519, calculate_key_id};
pub use sha256::{sha256, sha256_multi};
pub use x25519::{X25519Error, ecdh_ed25519, ed25519_to_x25519_private, ed25519_to_x25519_public};

/// Generate 32 random bytes from the OS random source.
pub fn random_bytes_32() -> [u8; 32] {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Fill a buffer with random bytes from the OS random source.
pub fn fill_random(dest: &mut [u8]) {
    use rand::RngCore;
    rand::rngs::OsRng.fill_bytes(dest);
}
