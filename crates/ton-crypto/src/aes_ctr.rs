//! AES-256-CTR session cipher.
//!
//! Transport frames are encrypted with a stateful keystream: each call
//! continues where the previous one stopped, so one cipher instance per
//! direction is required.

use aes::cipher::{KeyIvInit, StreamCipher};
use thiserror::Error;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Errors from cipher construction.
#[derive(Debug, Error)]
pub enum AesCtrError {
    /// The provided key is not 32 bytes.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The provided IV is not 16 bytes.
    #[error("Invalid IV: {0}")]
    InvalidIv(String),
}

/// A stateful AES-256-CTR cipher.
///
/// Encryption and decryption are the same keystream XOR; which one a
/// given instance performs depends only on which traffic direction it
/// was keyed for.
pub struct AesCtrCipher {
    cipher: Aes256Ctr,
}

impl AesCtrCipher {
    /// Create a cipher from a 32-byte key and 16-byte IV.
    pub fn new(key: [u8; 32], iv: [u8; 16]) -> Self {
        AesCtrCipher {
            cipher: Aes256Ctr::new(&key.into(), &iv.into()),
        }
    }

    /// Create a cipher from byte slices, validating lengths.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Result<Self, AesCtrError> {
        let key: [u8; 32] = key
            .try_into()
            .map_err(|_| AesCtrError::InvalidKey(format!("Expected 32 bytes, got {}", key.len())))?;
        let iv: [u8; 16] = iv
            .try_into()
            .map_err(|_| AesCtrError::InvalidIv(format!("Expected 16 bytes, got {}", iv.len())))?;

        Ok(Self::new(key, iv))
    }

    /// Apply the keystream in place, advancing the cipher state.
    pub fn apply(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }

    /// Encrypt and return a copy.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut output = data.to_vec();
        self.cipher.apply_keystream(&mut output);
        output
    }

    /// Decrypt and return a copy.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        self.encrypt(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let key = [0x42u8; 32];
        let iv = [0x24u8; 16];

        let mut enc = AesCtrCipher::new(key, iv);
        let ciphertext = enc.encrypt(b"hello transport");

        let mut dec = AesCtrCipher::new(key, iv);
        assert_eq!(dec.decrypt(&ciphertext), b"hello transport");
    }

    #[test]
    fn test_keystream_is_stateful() {
        let key = [1u8; 32];
        let iv = [2u8; 16];

        // One cipher over two chunks must equal one pass over the whole.
        let mut chunked = AesCtrCipher::new(key, iv);
        let mut a = chunked.encrypt(b"first");
        a.extend(chunked.encrypt(b"second"));

        let mut whole = AesCtrCipher::new(key, iv);
        let b = whole.encrypt(b"firstsecond");

        assert_eq!(a, b);
    }

    #[test]
    fn test_from_slices_validates_lengths() {
        assert!(AesCtrCipher::from_slices(&[0u8; 16], &[0u8; 16]).is_err());
        assert!(AesCtrCipher::from_slices(&[0u8; 32], &[0u8; 8]).is_err());
        assert!(AesCtrCipher::from_slices(&[0u8; 32], &[0u8; 16]).is_ok());
    }
}
