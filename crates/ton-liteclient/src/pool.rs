//! Liteserver endpoint pool and sticky sessions.
//!
//! A `LiteSession` pins all of its queries to one server, so reads that
//! must observe a mutually consistent state can share a session instead
//! of racing across differently-synced liteservers.

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::GlobalConfig;
use crate::connection::AdnlConnection;
use crate::error::{LiteError, LiteResult};

/// One liteserver endpoint from the global config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: SocketAddrV4,
    pub public_key: [u8; 32],
}

/// Pool of configured endpoints.
///
/// Holds no live connections itself; `connect_any` dials endpoints on
/// demand and hands out sessions.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    endpoints: Vec<Endpoint>,
    connect_timeout: Duration,
}

impl ConnectionPool {
    /// Builds a pool from a parsed global config.
    ///
    /// Entries with undecodable keys are rejected rather than skipped.
    pub fn from_config(config: &GlobalConfig, connect_timeout: Duration) -> LiteResult<Self> {
        let mut endpoints = Vec::with_capacity(config.liteservers.len());
        for entry in &config.liteservers {
            endpoints.push(Endpoint {
                addr: entry.socket_addr(),
                public_key: entry.public_key()?,
            });
        }

        Ok(Self {
            endpoints,
            connect_timeout,
        })
    }

    /// Returns the configured endpoints.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Opens a session to any reachable endpoint.
    ///
    /// Endpoints are tried in random order; the first completed handshake
    /// wins. Fails with `NoEndpoints` when every dial attempt failed.
    pub async fn connect_any(&self) -> LiteResult<LiteSession> {
        let mut order: Vec<&Endpoint> = self.endpoints.iter().collect();
        order.shuffle(&mut rand::thread_rng());

        for endpoint in order {
            let addr = SocketAddr::V4(endpoint.addr);
            match AdnlConnection::connect_with_timeout(
                addr,
                &endpoint.public_key,
                self.connect_timeout,
            )
            .await
            {
                Ok(conn) => {
                    debug!("session established with {}", addr);
                    return Ok(LiteSession::new(*endpoint, conn));
                }
                Err(e) => {
                    warn!("liteserver {} unreachable: {}", addr, e);
                }
            }
        }

        Err(LiteError::NoEndpoints)
    }

    /// Opens a session to one specific endpoint.
    pub async fn connect_to(&self, endpoint: &Endpoint) -> LiteResult<LiteSession> {
        let addr = SocketAddr::V4(endpoint.addr);
        let conn =
            AdnlConnection::connect_with_timeout(addr, &endpoint.public_key, self.connect_timeout)
                .await?;
        Ok(LiteSession::new(*endpoint, conn))
    }
}

/// A sticky session bound to one liteserver.
///
/// Cheap to clone; clones share the underlying connection.
#[derive(Debug, Clone)]
pub struct LiteSession {
    endpoint: Endpoint,
    connection: Arc<Mutex<AdnlConnection>>,
}

impl LiteSession {
    fn new(endpoint: Endpoint, connection: AdnlConnection) -> Self {
        Self {
            endpoint,
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    /// The endpoint this session is bound to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends a raw liteserver query over this session.
    pub async fn query(&self, data: &[u8]) -> LiteResult<Vec<u8>> {
        let mut conn = self.connection.lock().await;
        conn.query(data).await
    }

    /// Sends a query with a custom timeout.
    pub async fn query_with_timeout(
        &self,
        data: &[u8],
        timeout: Duration,
    ) -> LiteResult<Vec<u8>> {
        let mut conn = self.connection.lock().await;
        conn.query_with_timeout(data, timeout).await
    }

    /// Keepalive ping.
    pub async fn ping(&self) -> LiteResult<()> {
        let mut conn = self.connection.lock().await;
        conn.ping().await
    }

    /// Shuts the underlying connection down.
    pub async fn shutdown(&self) -> LiteResult<()> {
        let mut conn = self.connection.lock().await;
        conn.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn test_config() -> GlobalConfig {
        GlobalConfig::from_json(
            r#"{
                "liteservers": [
                    {"ip": 16843009, "port": 1111, "id": {"key": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="}},
                    {"ip": 33686018, "port": 2222, "id": {"key": "AgICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgI="}}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_pool_from_config() {
        let pool = ConnectionPool::from_config(&test_config(), Duration::from_secs(5)).unwrap();
        assert_eq!(pool.endpoints().len(), 2);

        let first = &pool.endpoints()[0];
        assert_eq!(first.addr, SocketAddrV4::new(Ipv4Addr::new(1, 1, 1, 1), 1111));
        assert_eq!(first.public_key, [1u8; 32]);
    }

    #[test]
    fn test_pool_rejects_bad_key() {
        let config = GlobalConfig::from_json(
            r#"{"liteservers": [{"ip": 0, "port": 1, "id": {"key": "dG9vc2hvcnQ="}}]}"#,
        )
        .unwrap();
        let result = ConnectionPool::from_config(&config, Duration::from_secs(5));
        assert!(matches!(result, Err(LiteError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_pool_has_no_endpoints() {
        let config = GlobalConfig::from_json(r#"{"liteservers": []}"#).unwrap();
        let pool = ConnectionPool::from_config(&config, Duration::from_millis(10)).unwrap();
        let result = pool.connect_any().await;
        assert!(matches!(result, Err(LiteError::NoEndpoints)));
    }
}
