//! Error types for ton-purchase

use thiserror::Error;

/// Purchase error type
#[derive(Error, Debug)]
pub enum PurchaseError {
    /// The global config is missing or unparseable. Surfaced before any
    /// network activity.
    #[error("Configuration error: {0}")]
    Config(#[from] ton_liteclient::ConfigError),

    /// The seed phrase or wallet version could not produce an identity.
    #[error("Identity derivation failed: {0}")]
    Identity(#[from] ton_wallet::WalletError),

    /// Address parsing or cell construction failed.
    #[error("Encoding failed: {0}")]
    Encoding(#[from] ton_cell::CellError),

    /// The native-coin amount string is not a valid decimal amount.
    #[error("Invalid coin amount {0:?}")]
    InvalidAmount(String),

    /// The liteserver round trip failed.
    #[error("Submission failed: {0}")]
    Submission(#[from] ton_liteclient::LiteError),

    /// The liteserver refused the external message.
    #[error("Message rejected by liteserver: status {0}")]
    Rejected(i32),

    /// The caller cancelled the inclusion wait. The message may still
    /// land on chain.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias
pub type PurchaseResult<T> = Result<T, PurchaseError>;
