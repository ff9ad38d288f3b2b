//! Jetton purchase client.
//!
//! Encodes the sale contract's buy payload and drives the whole
//! submission: derive the wallet from a seed phrase, wrap the payload in
//! a transfer, sign, submit over a liteserver session and wait for
//! inclusion.
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use ton_purchase::{buy_tokens, connect, ProofCheckPolicy, WalletVersion};
//!
//! # async fn run() -> Result<(), ton_purchase::PurchaseError> {
//! let client = connect("global.config.json", ProofCheckPolicy::Fast)?;
//! let cancel = CancellationToken::new();
//! let receipt = buy_tokens(
//!     &cancel,
//!     &client,
//!     "word1 word2 ... word24",
//!     WalletVersion::V3R2,
//!     100,
//!     "0.05",
//!     "EQAbc...",
//! )
//! .await?;
//! println!("sent at seqno {}", receipt.seqno);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod buy;
pub mod error;
pub mod payload;

pub use api::{connect, TonApi};
pub use buy::{buy_tokens, parse_ton_amount, PurchaseReceipt};
pub use error::{PurchaseError, PurchaseResult};
pub use payload::{
    encode_buy_payload, encode_buy_payload_str, encode_buy_payload_with, BUY_OP, PAYLOAD_TTL_SECS,
};

pub use ton_liteclient::ProofCheckPolicy;
pub use ton_wallet::WalletVersion;
