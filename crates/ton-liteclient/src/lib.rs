//! Liteserver connectivity for the TON client.
//!
//! This crate covers the full path from a global-config JSON document to
//! typed liteserver queries:
//!
//! - [`config`]: parsing the global config (endpoints, trust anchors)
//! - [`handshake`], [`packet`], [`connection`]: ADNL over TCP
//! - [`tl`], [`types`]: the liteserver TL subset this client speaks
//! - [`pool`]: endpoint selection and sticky sessions
//! - [`client`]: the high-level [`TonClient`]
//!
//! # Example
//!
//! ```rust,no_run
//! use ton_liteclient::{GlobalConfig, ProofCheckPolicy, TonClient};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GlobalConfig::from_file("global-config.json")?;
//!     let client = TonClient::from_config(&config, ProofCheckPolicy::Fast)?;
//!
//!     let info = client.get_masterchain_info().await?;
//!     println!("last masterchain block: {}", info.last);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod packet;
pub mod pool;
pub mod tl;
pub mod types;

pub use client::{ProofCheckPolicy, TonClient};
pub use config::GlobalConfig;
pub use connection::AdnlConnection;
pub use error::{ConfigError, LiteError, LiteResult};
pub use pool::{ConnectionPool, Endpoint, LiteSession};
pub use tl::compute_method_id;
pub use types::{AccountId, BlockIdExt, MasterchainInfo, RunMethodResult, SendMsgStatus};
