//! High-level liteserver client.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::config::GlobalConfig;
use crate::error::{LiteError, LiteResult};
use crate::pool::{ConnectionPool, LiteSession};
use crate::tl::{
    TlReader, TlWriter, LITE_CURRENT_TIME, LITE_ERROR, LITE_GET_MASTERCHAIN_INFO, LITE_GET_TIME,
    LITE_MASTERCHAIN_INFO, LITE_QUERY, LITE_RUN_RESULT, LITE_RUN_SMC_METHOD, LITE_SEND_MESSAGE,
    LITE_SEND_MSG_STATUS, LITE_WAIT_MASTERCHAIN_SEQNO,
};
use crate::types::{AccountId, BlockIdExt, MasterchainInfo, RunMethodResult, SendMsgStatus};

/// Default timeout for liteserver queries.
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How many fresh endpoints to try when a session's transport fails.
const MAX_RECONNECT_ATTEMPTS: usize = 3;

/// Block proof checking policy.
///
/// `Fast` trusts the connected liteserver. `Full` would verify proof
/// chains back to the config's init block; this client records the
/// anchor but does not implement verification, so `Full` is rejected
/// at construction time instead of silently downgrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProofCheckPolicy {
    #[default]
    Fast,
    Full,
}

/// Client for submitting messages and reading chain state.
///
/// Owns a pool of endpoints, one live sticky session at a time, and a
/// bounded reconnect-and-retry loop for transport failures. Liteserver
/// level errors propagate verbatim; deciding whether a rejected message
/// should be resubmitted is the caller's business.
pub struct TonClient {
    pool: ConnectionPool,
    session: Mutex<Option<LiteSession>>,
    query_timeout: Duration,
}

impl TonClient {
    /// Builds a client from a parsed global config.
    pub fn from_config(config: &GlobalConfig, policy: ProofCheckPolicy) -> LiteResult<Self> {
        if policy == ProofCheckPolicy::Full {
            return Err(LiteError::UnsupportedProofPolicy(policy));
        }

        let pool = ConnectionPool::from_config(config, DEFAULT_QUERY_TIMEOUT)?;
        Ok(Self {
            pool,
            session: Mutex::new(None),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        })
    }

    /// Builds a client from a config file on disk.
    pub fn from_config_file(path: impl AsRef<std::path::Path>, policy: ProofCheckPolicy) -> LiteResult<Self> {
        let config = GlobalConfig::from_file(path)?;
        Self::from_config(&config, policy)
    }

    /// Sets the query timeout.
    pub fn set_query_timeout(&mut self, timeout: Duration) {
        self.query_timeout = timeout;
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Gets the last known masterchain block and zero state.
    pub async fn get_masterchain_info(&self) -> LiteResult<MasterchainInfo> {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_GET_MASTERCHAIN_INFO);

        let response = self.query(writer.as_bytes()).await?;
        let mut reader = Self::expect_constructor(&response, LITE_MASTERCHAIN_INFO)?;
        MasterchainInfo::deserialize(&mut reader)
    }

    /// Gets the liteserver's wall clock as unix seconds.
    pub async fn get_time(&self) -> LiteResult<u32> {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_GET_TIME);

        let response = self.query(writer.as_bytes()).await?;
        let mut reader = Self::expect_constructor(&response, LITE_CURRENT_TIME)?;
        reader.read_u32()
    }

    /// Submits a serialized external message.
    ///
    /// Returns the raw status code; 1 means the server accepted the
    /// message for broadcast. Other codes are surfaced unchanged.
    pub async fn send_message(&self, boc: &[u8]) -> LiteResult<i32> {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_SEND_MESSAGE);
        writer.write_bytes(boc);

        let response = self.query(writer.as_bytes()).await?;
        let mut reader = Self::expect_constructor(&response, LITE_SEND_MSG_STATUS)?;
        let status = SendMsgStatus::deserialize(&mut reader)?;

        debug!("sendMessage status: {}", status.status);
        Ok(status.status)
    }

    /// Runs a TVM get method against an account.
    ///
    /// Mode 4 requests the result stack without proofs.
    pub async fn run_get_method(
        &self,
        block: &BlockIdExt,
        account: &AccountId,
        method_id: u64,
        params: &[u8],
    ) -> LiteResult<RunMethodResult> {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_RUN_SMC_METHOD);
        writer.write_u32(4);
        block.serialize(&mut writer);
        account.serialize(&mut writer);
        writer.write_i64(method_id as i64);
        writer.write_bytes(params);

        let response = self.query(writer.as_bytes()).await?;
        let mut reader = Self::expect_constructor(&response, LITE_RUN_RESULT)?;
        RunMethodResult::deserialize(&mut reader)
    }

    /// Gets masterchain info once the given seqno is available.
    ///
    /// `waitMasterchainSeqno` is a query prefix: the server holds the
    /// combined query until the seqno appears or `timeout_ms` expires.
    pub async fn wait_masterchain_seqno(
        &self,
        seqno: u32,
        timeout_ms: u32,
    ) -> LiteResult<MasterchainInfo> {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_WAIT_MASTERCHAIN_SEQNO);
        writer.write_u32(seqno);
        writer.write_u32(timeout_ms);
        writer.write_u32(LITE_GET_MASTERCHAIN_INFO);

        // Allow the server-side wait plus network slack.
        let timeout = self.query_timeout + Duration::from_millis(u64::from(timeout_ms));
        let response = self.query_with_timeout(writer.as_bytes(), timeout).await?;
        let mut reader = Self::expect_constructor(&response, LITE_MASTERCHAIN_INFO)?;
        MasterchainInfo::deserialize(&mut reader)
    }

    // ========================================================================
    // Query plumbing
    // ========================================================================

    async fn query(&self, data: &[u8]) -> LiteResult<Vec<u8>> {
        self.query_with_timeout(data, self.query_timeout).await
    }

    /// Wraps `data` in `liteServer.query` and sends it over the current
    /// session, reconnecting to a fresh endpoint on transport failure.
    async fn query_with_timeout(&self, data: &[u8], timeout: Duration) -> LiteResult<Vec<u8>> {
        let wrapped = wrap_lite_query(data);
        trace!("liteserver query: {} bytes", wrapped.len());

        let mut last_err = None;
        for attempt in 0..MAX_RECONNECT_ATTEMPTS {
            let session = match self.current_session().await {
                Ok(s) => s,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            match session.query_with_timeout(&wrapped, timeout).await {
                Ok(response) => return Ok(response),
                Err(e) if is_transport_error(&e) => {
                    warn!("transport failure on attempt {}: {}", attempt + 1, e);
                    self.drop_session().await;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or(LiteError::NoEndpoints))
    }

    async fn current_session(&self) -> LiteResult<LiteSession> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = self.pool.connect_any().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn drop_session(&self) {
        let mut guard = self.session.lock().await;
        *guard = None;
    }

    /// Checks the answer's constructor, decoding `liteServer.error`.
    fn expect_constructor(response: &[u8], expected: u32) -> LiteResult<TlReader<'_>> {
        let mut reader = TlReader::new(response);
        let constructor = reader.read_u32()?;

        if constructor == LITE_ERROR {
            let code = reader.read_i32()?;
            let message = reader.read_string()?;
            return Err(LiteError::Server { code, message });
        }
        if constructor != expected {
            return Err(LiteError::UnexpectedConstructor(constructor));
        }
        Ok(reader)
    }
}

impl std::fmt::Debug for TonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TonClient")
            .field("endpoints", &self.pool.endpoints().len())
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

/// Wraps a query in the `liteServer.query` TL envelope.
fn wrap_lite_query(data: &[u8]) -> Vec<u8> {
    let mut writer = TlWriter::new();
    writer.write_u32(LITE_QUERY);
    writer.write_bytes(data);
    writer.finish()
}

/// Transport errors justify moving to another endpoint; everything else
/// is a protocol-level answer that retrying would not change.
fn is_transport_error(err: &LiteError) -> bool {
    matches!(
        err,
        LiteError::Io(_)
            | LiteError::QueryTimeout
            | LiteError::HandshakeFailed(_)
            | LiteError::ChecksumMismatch
            | LiteError::InvalidPacket(_)
            | LiteError::PacketTooLarge { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lite_query() {
        let wrapped = wrap_lite_query(&[0x01, 0x02, 0x03, 0x04]);

        let mut reader = TlReader::new(&wrapped);
        assert_eq!(reader.read_u32().unwrap(), LITE_QUERY);
        assert_eq!(reader.read_bytes().unwrap(), vec![0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_full_policy_rejected() {
        let config = GlobalConfig::from_json(r#"{"liteservers": []}"#).unwrap();
        let result = TonClient::from_config(&config, ProofCheckPolicy::Full);
        assert!(matches!(
            result,
            Err(LiteError::UnsupportedProofPolicy(ProofCheckPolicy::Full))
        ));
    }

    #[test]
    fn test_fast_policy_accepted() {
        let config = GlobalConfig::from_json(r#"{"liteservers": []}"#).unwrap();
        assert!(TonClient::from_config(&config, ProofCheckPolicy::Fast).is_ok());
    }

    #[test]
    fn test_error_answer_decoded() {
        let mut writer = TlWriter::new();
        writer.write_u32(LITE_ERROR);
        writer.write_i32(-400);
        writer.write_bytes(b"cannot apply external message");
        let response = writer.finish();

        let err = TonClient::expect_constructor(&response, LITE_MASTERCHAIN_INFO).unwrap_err();
        match err {
            LiteError::Server { code, message } => {
                assert_eq!(code, -400);
                assert!(message.contains("external message"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_classification() {
        assert!(is_transport_error(&LiteError::QueryTimeout));
        assert!(!is_transport_error(&LiteError::Server {
            code: -400,
            message: String::new()
        }));
    }
}
