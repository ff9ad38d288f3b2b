//! ADNL TCP connection to a single liteserver.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use ton_crypto::AesCtrCipher;

use crate::error::{LiteError, LiteResult};
use crate::handshake::{build_handshake, HANDSHAKE_PACKET_SIZE, SessionCiphers};
use crate::packet::{
    create_ping, decode_packet, encode_packet, encrypt_packet, generate_query_id, parse_pong,
    unwrap_adnl_answer, wrap_adnl_query, MAX_PACKET_SIZE, MIN_PACKET_SIZE,
};

/// Default timeout for connect and query operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One encrypted ADNL session over TCP.
///
/// Methods take `&mut self`; concurrent access is arbitrated by the owner
/// (the pool wraps connections in an async mutex).
pub struct AdnlConnection {
    stream: TcpStream,
    recv_cipher: AesCtrCipher,
    send_cipher: AesCtrCipher,
    timeout: Duration,
}

impl AdnlConnection {
    /// Connects and performs the handshake with the default timeout.
    pub async fn connect(addr: SocketAddr, server_pubkey: &[u8; 32]) -> LiteResult<Self> {
        Self::connect_with_timeout(addr, server_pubkey, DEFAULT_TIMEOUT).await
    }

    /// Connects and performs the handshake within `op_timeout`.
    pub async fn connect_with_timeout(
        addr: SocketAddr,
        server_pubkey: &[u8; 32],
        op_timeout: Duration,
    ) -> LiteResult<Self> {
        debug!("connecting to liteserver at {}", addr);

        let stream = timeout(op_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| LiteError::HandshakeFailed("connection timeout".into()))?
            .map_err(LiteError::Io)?;
        stream.set_nodelay(true)?;

        let (handshake_packet, ciphers) = build_handshake(server_pubkey)?;
        Self::complete_handshake(stream, handshake_packet, ciphers, op_timeout).await
    }

    async fn complete_handshake(
        mut stream: TcpStream,
        handshake_packet: [u8; HANDSHAKE_PACKET_SIZE],
        ciphers: SessionCiphers,
        op_timeout: Duration,
    ) -> LiteResult<Self> {
        timeout(op_timeout, stream.write_all(&handshake_packet))
            .await
            .map_err(|_| LiteError::HandshakeFailed("send timeout".into()))?
            .map_err(LiteError::Io)?;

        trace!("handshake packet sent ({} bytes)", handshake_packet.len());

        let mut conn = Self {
            stream,
            recv_cipher: ciphers.recv_cipher,
            send_cipher: ciphers.send_cipher,
            timeout: op_timeout,
        };

        // The server confirms the session with an empty packet.
        let confirm = timeout(op_timeout, conn.recv_packet())
            .await
            .map_err(|_| LiteError::HandshakeFailed("confirmation timeout".into()))??;
        if !confirm.is_empty() {
            debug!("unexpected handshake confirmation: {} bytes", confirm.len());
        }

        debug!("handshake completed");
        Ok(conn)
    }

    /// Sends a query and waits for the matching answer.
    ///
    /// The payload is wrapped in `adnl.message.query` with a fresh query id
    /// and the answer's id is checked against it.
    pub async fn query(&mut self, data: &[u8]) -> LiteResult<Vec<u8>> {
        self.query_with_timeout(data, self.timeout).await
    }

    /// Sends a query with a custom timeout.
    pub async fn query_with_timeout(
        &mut self,
        data: &[u8],
        query_timeout: Duration,
    ) -> LiteResult<Vec<u8>> {
        let query_id = generate_query_id();
        trace!("sending query {:02x?}...", &query_id[..4]);

        let wrapped = wrap_adnl_query(data, &query_id);
        self.send_packet(&wrapped).await?;

        let response = timeout(query_timeout, self.recv_packet())
            .await
            .map_err(|_| LiteError::QueryTimeout)??;

        let (_id, answer) = unwrap_adnl_answer(&response, Some(&query_id))?;
        trace!("received answer: {} bytes", answer.len());
        Ok(answer)
    }

    /// Round-trips a `tcp.ping`.
    pub async fn ping(&mut self) -> LiteResult<()> {
        let (ping, random_id) = create_ping();

        trace!("sending ping");
        self.send_packet(&ping).await?;

        let response = timeout(self.timeout, self.recv_packet())
            .await
            .map_err(|_| LiteError::QueryTimeout)??;

        let pong_id = parse_pong(&response)?;
        if pong_id != random_id {
            return Err(LiteError::InvalidPacket("pong id mismatch".into()));
        }
        trace!("received pong");
        Ok(())
    }

    /// Encrypts and sends one frame.
    async fn send_packet(&mut self, payload: &[u8]) -> LiteResult<()> {
        let packet = encode_packet(payload);
        let encrypted = encrypt_packet(&packet, &mut self.send_cipher);

        self.stream.write_all(&encrypted).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Receives and decrypts one frame.
    async fn recv_packet(&mut self) -> LiteResult<Vec<u8>> {
        let mut size_buf = [0u8; 4];
        self.stream.read_exact(&mut size_buf).await?;
        let decrypted_size = self.recv_cipher.decrypt(&size_buf);

        let size = u32::from_le_bytes([
            decrypted_size[0],
            decrypted_size[1],
            decrypted_size[2],
            decrypted_size[3],
        ]) as usize;

        if size > MAX_PACKET_SIZE {
            return Err(LiteError::PacketTooLarge {
                size,
                max: MAX_PACKET_SIZE,
            });
        }
        if size < MIN_PACKET_SIZE {
            return Err(LiteError::InvalidPacket(format!("frame too small: {} bytes", size)));
        }

        let mut encrypted_body = vec![0u8; size];
        self.stream.read_exact(&mut encrypted_body).await?;
        let decrypted_body = self.recv_cipher.decrypt(&encrypted_body);

        let mut frame = Vec::with_capacity(4 + size);
        frame.extend_from_slice(&decrypted_size);
        frame.extend_from_slice(&decrypted_body);
        decode_packet(&frame)
    }

    /// Sets the default timeout for subsequent operations.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Returns the peer address.
    pub fn peer_addr(&self) -> LiteResult<SocketAddr> {
        self.stream.peer_addr().map_err(LiteError::Io)
    }

    /// Gracefully shuts down the stream.
    pub async fn shutdown(&mut self) -> LiteResult<()> {
        self.stream.shutdown().await.map_err(LiteError::Io)
    }
}

impl std::fmt::Debug for AdnlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdnlConnection")
            .field("peer_addr", &self.stream.peer_addr().ok())
            .field("timeout", &self.timeout)
            .finish()
    }
}
