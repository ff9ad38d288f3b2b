//! ADNL TCP handshake.
//!
//! The client opens a session by sending one 256-byte packet:
//!
//! ```text
//! +------------------+------------------+----------+---------------------+
//! | server key id    | client pubkey    | checksum | encrypted params    |
//! | 32 bytes         | 32 bytes         | 32 bytes | 160 bytes           |
//! +------------------+------------------+----------+---------------------+
//! ```
//!
//! The 160 session parameter bytes are random: rx key (32), tx key (32),
//! rx iv (16), tx iv (16), plus 64 reserved bytes. They are encrypted with
//! AES-CTR keyed from the ECDH shared secret and the parameter checksum.
//! The server proves it decrypted them by answering with an empty packet.

use ton_crypto::{
    aes_ctr::AesCtrCipher, calculate_key_id, ecdh_ed25519, fill_random, Ed25519Keypair,
};

use crate::error::{LiteError, LiteResult};

/// Total size of the handshake packet.
pub const HANDSHAKE_PACKET_SIZE: usize = 256;

/// Size of the random session parameter block.
const SESSION_PARAMS_SIZE: usize = 160;

/// Per-direction AES-CTR session ciphers.
///
/// Directions are from the client's point of view: `recv` decrypts
/// server-to-client traffic, `send` encrypts client-to-server traffic.
pub struct SessionCiphers {
    pub recv_cipher: AesCtrCipher,
    pub send_cipher: AesCtrCipher,
}

/// Builds a handshake packet for the given server key.
///
/// Generates an ephemeral client keypair and random session parameters,
/// returning the packet to send and the ciphers the session will use.
pub fn build_handshake(server_pubkey: &[u8; 32]) -> LiteResult<([u8; HANDSHAKE_PACKET_SIZE], SessionCiphers)> {
    let client = Ed25519Keypair::generate();

    let mut params = [0u8; SESSION_PARAMS_SIZE];
    fill_random(&mut params);

    build_handshake_with(server_pubkey, &client, &params)
}

/// Deterministic handshake construction with caller-supplied key material.
fn build_handshake_with(
    server_pubkey: &[u8; 32],
    client: &Ed25519Keypair,
    params: &[u8; SESSION_PARAMS_SIZE],
) -> LiteResult<([u8; HANDSHAKE_PACKET_SIZE], SessionCiphers)> {
    let shared_secret = ecdh_ed25519(client.private_key_bytes(), server_pubkey)
        .map_err(|e| LiteError::HandshakeFailed(format!("key agreement failed: {}", e)))?;

    let checksum = ton_crypto::sha256(params);

    // Handshake cipher: key from secret[0..16] ++ checksum[16..32],
    // iv from checksum[0..4] ++ secret[20..32].
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(&shared_secret[..16]);
    key[16..].copy_from_slice(&checksum[16..]);

    let mut iv = [0u8; 16];
    iv[..4].copy_from_slice(&checksum[..4]);
    iv[4..].copy_from_slice(&shared_secret[20..]);

    let mut cipher = AesCtrCipher::new(key, iv);
    let encrypted_params = cipher.encrypt(params);

    let mut packet = [0u8; HANDSHAKE_PACKET_SIZE];
    packet[0..32].copy_from_slice(&calculate_key_id(server_pubkey));
    packet[32..64].copy_from_slice(&client.public_key);
    packet[64..96].copy_from_slice(&checksum);
    packet[96..256].copy_from_slice(&encrypted_params);

    Ok((packet, session_ciphers(params)))
}

/// Derives the per-direction session ciphers from the parameter block.
fn session_ciphers(params: &[u8; SESSION_PARAMS_SIZE]) -> SessionCiphers {
    let mut recv_key = [0u8; 32];
    let mut send_key = [0u8; 32];
    let mut recv_iv = [0u8; 16];
    let mut send_iv = [0u8; 16];

    recv_key.copy_from_slice(&params[0..32]);
    send_key.copy_from_slice(&params[32..64]);
    recv_iv.copy_from_slice(&params[64..80]);
    send_iv.copy_from_slice(&params[80..96]);

    SessionCiphers {
        recv_cipher: AesCtrCipher::new(recv_key, recv_iv),
        send_cipher: AesCtrCipher::new(send_key, send_iv),
    }
}
