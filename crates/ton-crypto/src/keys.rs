//! Key id calculation.
//!
//! A key id is the SHA256 of the TL-serialized public key. The transport
//! handshake opens with the server's key id so the server knows which of
//! its keys the client expects.

use crate::sha256::sha256_multi;

/// TL constructor prefix for `pub.ed25519 key:int256 = PublicKey`,
/// little-endian.
pub const TL_PREFIX_ED25519: [u8; 4] = [0xC6, 0xB4, 0x13, 0x48];

/// Key id of an Ed25519 public key: `SHA256(prefix || key)`.
pub fn calculate_key_id(public_key: &[u8; 32]) -> [u8; 32] {
    sha256_multi(&[&TL_PREFIX_ED25519, public_key])
}
