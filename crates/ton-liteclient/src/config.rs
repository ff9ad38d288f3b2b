//! Global network config loading.
//!
//! The standard TON global config is a JSON document listing liteserver
//! endpoints and the trusted validator init block. Only the parts this
//! client consumes are modelled; unknown fields are ignored by serde.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;

use base64::Engine;
use serde::Deserialize;

use crate::error::ConfigError;

/// Parsed global network config.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Liteserver endpoints.
    pub liteservers: Vec<LiteserverEntry>,
    /// Validator trust anchors.
    #[serde(default)]
    pub validator: Option<ValidatorConfig>,
}

/// One liteserver entry from the config.
#[derive(Debug, Clone, Deserialize)]
pub struct LiteserverEntry {
    /// IPv4 address packed as a signed 32-bit integer.
    pub ip: i64,
    /// TCP port.
    pub port: u16,
    /// Server identity.
    pub id: LiteserverId,
}

/// Liteserver identity record (`pub.ed25519`).
#[derive(Debug, Clone, Deserialize)]
pub struct LiteserverId {
    /// Base64-encoded Ed25519 public key.
    pub key: String,
}

/// Validator section with the trusted init and zero state blocks.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub init_block: Option<ConfigBlockId>,
    #[serde(default)]
    pub zero_state: Option<ConfigBlockId>,
}

/// Block reference as it appears in the config JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigBlockId {
    pub workchain: i32,
    pub seqno: u32,
    /// Base64-encoded root hash.
    pub root_hash: String,
    /// Base64-encoded file hash.
    pub file_hash: String,
}

impl GlobalConfig {
    /// Loads and parses a config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }
}

impl LiteserverEntry {
    /// Returns the endpoint's socket address.
    ///
    /// The config stores the IPv4 address as a signed 32-bit integer;
    /// its big-endian bytes are the dotted-quad octets.
    pub fn socket_addr(&self) -> SocketAddrV4 {
        let octets = (self.ip as u32).to_be_bytes();
        SocketAddrV4::new(Ipv4Addr::from(octets), self.port)
    }

    /// Decodes the server's Ed25519 public key.
    pub fn public_key(&self) -> Result<[u8; 32], ConfigError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.id.key)
            .map_err(|e| ConfigError::InvalidKey(format!("bad base64: {}", e)))?;

        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| ConfigError::InvalidKey(format!("{} bytes, want 32", b.len())))?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "liteservers": [
            {
                "ip": 84478511,
                "port": 19949,
                "id": {
                    "@type": "pub.ed25519",
                    "key": "n4VDnSCUuSpjnCyUk9e3QOOd6o0ItSWYbTnW3Wnn8wk="
                }
            }
        ],
        "validator": {
            "@type": "validator.config.global",
            "zero_state": {
                "workchain": -1,
                "shard": -9223372036854775808,
                "seqno": 0,
                "root_hash": "F6OpKZKqvqeFp6CQmFomXNMfMj2EnaUSOXN+Mh+wVWk=",
                "file_hash": "XplPz01CXAps5qeSWUtxcyBfdAo5zVb1N979KLSKD24="
            }
        }
    }"#;

    #[test]
    fn test_parse_sample_config() {
        let config = GlobalConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.liteservers.len(), 1);

        let ls = &config.liteservers[0];
        assert_eq!(ls.port, 19949);

        // 84478511 = 0x05090A2F -> 5.9.10.47
        assert_eq!(ls.socket_addr().ip(), &Ipv4Addr::new(5, 9, 10, 47));

        let key = ls.public_key().unwrap();
        assert_eq!(key.len(), 32);
        assert_ne!(key, [0u8; 32]);
    }

    #[test]
    fn test_parse_zero_state() {
        let config = GlobalConfig::from_json(SAMPLE).unwrap();
        let validator = config.validator.unwrap();
        let zero = validator.zero_state.unwrap();
        assert_eq!(zero.workchain, -1);
        assert_eq!(zero.seqno, 0);
    }

    #[test]
    fn test_negative_ip_wraps_to_high_octets() {
        let entry = LiteserverEntry {
            ip: -2018135749,
            port: 53312,
            id: LiteserverId { key: String::new() },
        };
        // -2018135749 as u32 = 0x87B5B13B -> 135.181.177.59
        assert_eq!(entry.socket_addr().ip(), &Ipv4Addr::new(135, 181, 177, 59));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = GlobalConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = GlobalConfig::from_file("/nonexistent/ton-config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_short_key_rejected() {
        let entry = LiteserverEntry {
            ip: 0,
            port: 1,
            id: LiteserverId {
                key: base64::engine::general_purpose::STANDARD.encode([1u8; 16]),
            },
        };
        assert!(matches!(
            entry.public_key(),
            Err(ConfigError::InvalidKey(_))
        ));
    }
}
