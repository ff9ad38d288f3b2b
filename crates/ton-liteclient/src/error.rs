//! Error types for the liteserver client.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading and validating the global network config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config document is not valid JSON or misses required fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A liteserver public key is not a valid 32-byte Ed25519 key.
    #[error("invalid liteserver key: {0}")]
    InvalidKey(String),
}

/// Errors from the ADNL transport and liteserver protocol.
#[derive(Debug, Error)]
pub enum LiteError {
    /// I/O error on the underlying TCP stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The ADNL handshake could not be completed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// A packet violated the ADNL framing rules.
    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    /// A decrypted packet failed its SHA-256 checksum.
    #[error("packet checksum mismatch")]
    ChecksumMismatch,

    /// The peer announced a frame larger than the allowed maximum.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A TL value could not be read or written.
    #[error("TL error: {0}")]
    Tl(String),

    /// The response carried an unexpected TL constructor.
    #[error("unexpected TL constructor: 0x{0:08x}")]
    UnexpectedConstructor(u32),

    /// The answer's query id does not match the query we sent.
    #[error("query id mismatch")]
    QueryIdMismatch,

    /// A query did not complete within the configured timeout.
    #[error("query timed out")]
    QueryTimeout,

    /// The liteserver returned a `liteServer.error` answer.
    #[error("liteserver error {code}: {message}")]
    Server { code: i32, message: String },

    /// No configured endpoint accepted a connection.
    #[error("no liteserver endpoint could be reached")]
    NoEndpoints,

    /// Proof checking policy requested that this client does not implement.
    #[error("proof check policy {0:?} is not supported")]
    UnsupportedProofPolicy(crate::client::ProofCheckPolicy),

    /// Configuration problem surfaced while building the client.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for liteclient results.
pub type LiteResult<T> = std::result::Result<T, LiteError>;
