//! TON wallet contracts: mnemonic key derivation, message building and
//! signing.
//!
//! A [`Mnemonic`] validates a 24-word phrase and derives the Ed25519
//! keypair; [`open_wallet`] binds the keypair to a wallet contract
//! revision. The [`Wallet`] trait covers the whole signing path: unsigned
//! transfer body, signature, and the external message that carries it
//! on chain (with the state init attached when deploying).

pub mod codes;
pub mod contract;
pub mod error;
pub mod message;
pub mod mnemonic;
pub mod v3r2;

pub use contract::{open_wallet, Wallet, WalletVersion};
pub use error::{WalletError, WalletResult};
pub use message::{build_comment, build_internal_message, Transfer};
pub use mnemonic::Mnemonic;
pub use v3r2::WalletV3R2;
