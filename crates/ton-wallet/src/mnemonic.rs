//! TON mnemonic validation and key derivation
//!
//! TON uses a modified BIP39-like mnemonic system with HMAC-based validation
//! instead of a standard BIP39 checksum. The phrase keys an HMAC-SHA512 over
//! the password to produce a 64-byte entropy block; a cheap PBKDF2 probe of
//! that entropy decides whether the phrase is valid, and a full-strength
//! PBKDF2 pass turns it into an Ed25519 seed. Password-protected phrases
//! additionally carry a fast-seed marker: a single PBKDF2 round over the
//! passwordless entropy whose first output byte must be 1.

use crate::error::{WalletError, WalletResult};
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use ton_crypto::Ed25519Keypair;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Required number of words in a phrase
const WORD_COUNT: usize = 24;

/// Number of PBKDF2 iterations for seed derivation
const SEED_ITERATIONS: u32 = 100_000;

/// Salt for Ed25519 seed derivation
const SEED_SALT: &[u8] = b"TON default seed";

/// Salt for the validation probe
const VALIDATION_SALT: &[u8] = b"TON seed version";

/// Iterations for the validation probe
const VALIDATION_ITERATIONS: u32 = SEED_ITERATIONS / 256;

/// Salt for the single-round password-flavor probe
const PASSWORD_SALT: &[u8] = b"TON fast seed version";

/// A validated mnemonic phrase.
///
/// Construction validates the phrase (and password, if any), so every
/// `Mnemonic` in existence can derive a keypair. The entropy block is
/// captured at construction time; the password is not retained.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    words: Vec<String>,
    entropy: [u8; 64],
}

impl Mnemonic {
    /// Parse and validate a whitespace-separated phrase.
    ///
    /// Words are lowercased before validation. Pass an empty string for
    /// an unprotected phrase.
    pub fn from_phrase(phrase: &str, password: &str) -> WalletResult<Self> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        Self::from_words(&words, password)
    }

    /// Validate a 24-word phrase and capture its entropy.
    ///
    /// A password-protected phrase must be marked as password-flavored
    /// (the single-round probe of the passwordless entropy yields a first
    /// byte of 1) and must NOT decode without the password; otherwise an
    /// attacker holding only the words could silently drop it.
    pub fn from_words(words: &[String], password: &str) -> WalletResult<Self> {
        if words.len() != WORD_COUNT {
            return Err(WalletError::WrongWordCount(words.len()));
        }
        for word in words {
            if word.is_empty() || !word.bytes().all(|b| b.is_ascii_lowercase()) {
                return Err(WalletError::InvalidWord(word.clone()));
            }
        }

        let phrase = words.join(" ");

        if !password.is_empty() {
            let mut bare = derive_entropy(&phrase, b"")?;
            let password_flavored = is_password_seed(&bare);
            let valid_without = is_basic_seed(&bare);
            bare.zeroize();
            if !password_flavored || valid_without {
                return Err(WalletError::InvalidMnemonic(
                    "phrase does not take a password".to_string(),
                ));
            }
        }

        let entropy = derive_entropy(&phrase, password.as_bytes())?;
        if !is_basic_seed(&entropy) {
            return Err(WalletError::InvalidMnemonic(
                "phrase failed the seed check".to_string(),
            ));
        }

        Ok(Self {
            words: words.to_vec(),
            entropy,
        })
    }

    /// The words of the phrase.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Derive the wallet keypair from the captured entropy.
    pub fn to_keypair(&self) -> Ed25519Keypair {
        let mut seed = [0u8; 64];
        pbkdf2_hmac::<Sha512>(&self.entropy, SEED_SALT, SEED_ITERATIONS, &mut seed);

        let mut private_key = [0u8; 32];
        private_key.copy_from_slice(&seed[..32]);
        seed.zeroize();

        let keypair = Ed25519Keypair::from_private_key(private_key);
        private_key.zeroize();
        keypair
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the words or entropy.
        f.debug_struct("Mnemonic")
            .field("words", &format_args!("[{} redacted]", self.words.len()))
            .finish()
    }
}

fn derive_entropy(phrase: &str, password: &[u8]) -> WalletResult<[u8; 64]> {
    let mut mac = Hmac::<Sha512>::new_from_slice(phrase.as_bytes())
        .map_err(|e| WalletError::Derivation(e.to_string()))?;
    mac.update(password);

    let mut entropy = [0u8; 64];
    entropy.copy_from_slice(&mac.finalize().into_bytes());
    Ok(entropy)
}

/// The seed-version probe: one cheap PBKDF2 block whose first byte
/// must be zero for the entropy to count as a valid seed.
fn is_basic_seed(entropy: &[u8; 64]) -> bool {
    let mut probe = [0u8; 64];
    pbkdf2_hmac::<Sha512>(
        entropy,
        VALIDATION_SALT,
        VALIDATION_ITERATIONS.max(1),
        &mut probe,
    );
    let valid = probe[0] == 0;
    probe.zeroize();
    valid
}

/// The fast-seed probe: a single PBKDF2 round whose first byte is 1 for
/// phrases generated to require a password.
fn is_password_seed(entropy: &[u8; 64]) -> bool {
    let mut probe = [0u8; 64];
    pbkdf2_hmac::<Sha512>(entropy, PASSWORD_SALT, 1, &mut probe);
    let flagged = probe[0] == 1;
    probe.zeroize();
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "apple banana cherry damson elder fig grape honey iris \
                        jasmine kiwi lemon mango nutmeg olive peach quince raisin \
                        sage thyme ugli vanilla walnut";

    fn phrase(last: &str) -> String {
        format!("{} {}", BASE, last)
    }

    #[test]
    fn test_valid_phrase_without_password() {
        let m = Mnemonic::from_phrase(&phrase("arch"), "").unwrap();
        assert_eq!(m.words().len(), 24);
        assert_eq!(m.words()[23], "arch");
    }

    #[test]
    fn test_invalid_phrase_rejected() {
        let err = Mnemonic::from_phrase(&phrase("zebra"), "").unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_password_protected_phrase() {
        // Valid with its password, rejected without.
        Mnemonic::from_phrase(&phrase("wulek"), "hunter2").unwrap();
        let err = Mnemonic::from_phrase(&phrase("wulek"), "").unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_password_needs_fast_seed_flag() {
        // The seed check happens to pass with this password, but the
        // single-round probe of the passwordless entropy does not mark
        // the phrase as password-flavored, so it must be rejected.
        let err = Mnemonic::from_phrase(&phrase("toad"), "hunter2").unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_password_on_unprotected_phrase_rejected() {
        // The phrase decodes without a password, so supplying one must fail.
        let err = Mnemonic::from_phrase(&phrase("arch"), "hunter2").unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_wrong_word_count() {
        let err = Mnemonic::from_phrase("one two three", "").unwrap_err();
        assert!(matches!(err, WalletError::WrongWordCount(3)));
    }

    #[test]
    fn test_malformed_word_rejected() {
        let bad = format!("{} ar2ch", BASE);
        let err = Mnemonic::from_phrase(&bad, "").unwrap_err();
        assert!(matches!(err, WalletError::InvalidWord(_)));
    }

    #[test]
    fn test_uppercase_is_normalized() {
        let m = Mnemonic::from_phrase(&phrase("ARCH"), "").unwrap();
        assert_eq!(m.words()[23], "arch");
    }

    #[test]
    fn test_keypair_derivation_is_deterministic() {
        let m = Mnemonic::from_phrase(&phrase("arch"), "").unwrap();
        let kp = m.to_keypair();
        assert_eq!(
            hex(&kp.public_key),
            "054503273c15ef2121ea4c62db1bbfd488c4a2b8e144ff82ff4792d420fc440d"
        );
        let again = m.to_keypair();
        assert_eq!(kp.public_key, again.public_key);
    }

    #[test]
    fn test_debug_redacts_words() {
        let m = Mnemonic::from_phrase(&phrase("arch"), "").unwrap();
        let printed = format!("{:?}", m);
        assert!(!printed.contains("apple"));
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
