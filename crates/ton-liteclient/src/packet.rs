//! ADNL packet framing.
//!
//! After the handshake every frame on the wire is:
//!
//! ```text
//! +----------+----------+----------------------+-------------+
//! |  size    |  nonce   |      payload         |  checksum   |
//! | 4 bytes  | 32 bytes |      N bytes         |  32 bytes   |
//! | (LE u32) | (random) |                      |  (SHA256)   |
//! +----------+----------+----------------------+-------------+
//! ```
//!
//! The size counts nonce + payload + checksum. The checksum is
//! SHA256(nonce || payload). The whole frame, size included, is
//! encrypted with the session's AES-CTR cipher.

use ton_crypto::{fill_random, sha256, AesCtrCipher};

use crate::error::{LiteError, LiteResult};
use crate::tl::{TlReader, TlWriter, ADNL_MESSAGE_ANSWER, ADNL_MESSAGE_QUERY, TCP_PING, TCP_PONG};

/// Size of the per-packet random nonce.
pub const NONCE_SIZE: usize = 32;

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 32;

/// Framing overhead per packet.
pub const PACKET_OVERHEAD: usize = NONCE_SIZE + CHECKSUM_SIZE;

/// Largest frame the client will accept (10 MB).
pub const MAX_PACKET_SIZE: usize = 10 * 1024 * 1024;

/// Smallest valid frame (empty payload).
pub const MIN_PACKET_SIZE: usize = PACKET_OVERHEAD;

/// Encodes a payload into an unencrypted ADNL frame with a random nonce.
pub fn encode_packet(payload: &[u8]) -> Vec<u8> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce);
    encode_packet_with_nonce(payload, &nonce)
}

/// Encodes a payload with a caller-chosen nonce.
pub fn encode_packet_with_nonce(payload: &[u8], nonce: &[u8; NONCE_SIZE]) -> Vec<u8> {
    let checksum = ton_crypto::sha256_multi(&[nonce, payload]);

    let inner_size = NONCE_SIZE + payload.len() + CHECKSUM_SIZE;
    let mut packet = Vec::with_capacity(4 + inner_size);
    packet.extend_from_slice(&(inner_size as u32).to_le_bytes());
    packet.extend_from_slice(nonce);
    packet.extend_from_slice(payload);
    packet.extend_from_slice(&checksum);
    packet
}

/// Encrypts a full frame (size prefix included) with the session cipher.
pub fn encrypt_packet(packet: &[u8], cipher: &mut AesCtrCipher) -> Vec<u8> {
    cipher.encrypt(packet)
}

/// Decrypts a full frame. CTR decryption is the same keystream operation.
pub fn decrypt_packet(packet: &[u8], cipher: &mut AesCtrCipher) -> Vec<u8> {
    cipher.decrypt(packet)
}

/// Validates a decrypted frame and extracts its payload.
pub fn decode_packet(packet: &[u8]) -> LiteResult<Vec<u8>> {
    if packet.len() < 4 {
        return Err(LiteError::InvalidPacket("frame shorter than size prefix".into()));
    }

    let size = u32::from_le_bytes([packet[0], packet[1], packet[2], packet[3]]) as usize;

    if size > MAX_PACKET_SIZE {
        return Err(LiteError::PacketTooLarge {
            size,
            max: MAX_PACKET_SIZE,
        });
    }
    if size < MIN_PACKET_SIZE {
        return Err(LiteError::InvalidPacket(format!("frame too small: {} bytes", size)));
    }
    if packet.len() < 4 + size {
        return Err(LiteError::InvalidPacket("truncated frame".into()));
    }

    let inner = &packet[4..4 + size];
    let nonce = &inner[..NONCE_SIZE];
    let payload_end = size - CHECKSUM_SIZE;
    let payload = &inner[NONCE_SIZE..payload_end];
    let checksum = &inner[payload_end..];

    let expected = ton_crypto::sha256_multi(&[nonce, payload]);
    if checksum != expected {
        return Err(LiteError::ChecksumMismatch);
    }

    Ok(payload.to_vec())
}

/// Builds a `tcp.ping` message with a random id, returning both.
pub fn create_ping() -> (Vec<u8>, u64) {
    let random_id: u64 = rand::random();
    (create_ping_with_id(random_id), random_id)
}

/// Builds a `tcp.ping` message with the given id.
pub fn create_ping_with_id(random_id: u64) -> Vec<u8> {
    let mut writer = TlWriter::new();
    writer.write_u32(TCP_PING);
    writer.write_u64(random_id);
    writer.finish()
}

/// Parses a `tcp.pong`, returning its random id.
pub fn parse_pong(data: &[u8]) -> LiteResult<u64> {
    let mut reader = TlReader::new(data);
    let constructor = reader.read_u32()?;
    if constructor != TCP_PONG {
        return Err(LiteError::UnexpectedConstructor(constructor));
    }
    reader.read_u64()
}

/// Wraps a query payload in `adnl.message.query`.
pub fn wrap_adnl_query(query: &[u8], query_id: &[u8; 32]) -> Vec<u8> {
    let mut writer = TlWriter::with_capacity(4 + 32 + query.len() + 4);
    writer.write_u32(ADNL_MESSAGE_QUERY);
    writer.write_int256(query_id);
    writer.write_bytes(query);
    writer.finish()
}

/// Unwraps an `adnl.message.answer`, checking the query id if given.
pub fn unwrap_adnl_answer(
    data: &[u8],
    expected_query_id: Option<&[u8; 32]>,
) -> LiteResult<([u8; 32], Vec<u8>)> {
    let mut reader = TlReader::new(data);

    let constructor = reader.read_u32()?;
    if constructor != ADNL_MESSAGE_ANSWER {
        return Err(LiteError::UnexpectedConstructor(constructor));
    }

    let query_id = reader.read_int256()?;
    if let Some(expected) = expected_query_id
        && &query_id != expected
    {
        return Err(LiteError::QueryIdMismatch);
    }

    let answer = reader.read_bytes()?;
    Ok((query_id, answer))
}

/// Draws a random 32-byte query id.
pub fn generate_query_id() -> [u8; 32] {
    ton_crypto::random_bytes_32()
}
