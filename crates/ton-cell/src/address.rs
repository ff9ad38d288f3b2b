//! TON message address types.
//!
//! An account is identified by a signed workchain id and a 256-bit hash.
//! Two textual forms are in circulation: the raw `workchain:hex` form and
//! the 48-character user-friendly base64 form carrying flag and checksum
//! bytes. Both parse into the same [`MsgAddress`].

use crate::{CellError, CellResult};

/// A message address.
///
/// # Example
///
/// ```
/// use ton_cell::MsgAddress;
///
/// let addr = MsgAddress::from_string(
///     "0:0000000000000000000000000000000000000000000000000000000000000000",
/// ).unwrap();
/// assert_eq!(addr.workchain(), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MsgAddress {
    /// No address (addr_none$00).
    #[default]
    Null,

    /// Standard internal address (addr_std$10).
    Internal {
        /// Workchain id (-1 for masterchain, 0 for basechain).
        workchain: i32,
        /// 256-bit account id.
        address: [u8; 32],
    },
}

impl MsgAddress {
    /// Parse an address from a string.
    ///
    /// Accepts the raw form `workchain:hex64` and the user-friendly
    /// 48-character base64 form (both URL-safe and standard alphabets).
    /// Anything else, including a wrong-length account id or a failed
    /// checksum, is an [`CellError::InvalidAddress`].
    pub fn from_string(s: &str) -> CellResult<Self> {
        let s = s.trim();

        if s.is_empty() {
            return Err(CellError::InvalidAddress("Empty address".to_string()));
        }

        if let Some((workchain_str, address_str)) = s.split_once(':') {
            let workchain: i32 = workchain_str.parse().map_err(|_| {
                CellError::InvalidAddress(format!("Invalid workchain: {}", workchain_str))
            })?;

            let address_bytes = hex_decode(address_str)?;
            if address_bytes.len() != 32 {
                return Err(CellError::InvalidAddress(format!(
                    "Account id must be 32 bytes, got {}",
                    address_bytes.len()
                )));
            }

            let mut address = [0u8; 32];
            address.copy_from_slice(&address_bytes);
            return Ok(MsgAddress::Internal { workchain, address });
        }

        if s.len() == 48 {
            return Self::from_user_friendly(s);
        }

        Err(CellError::InvalidAddress(format!(
            "Unrecognized address format: {}",
            s
        )))
    }

    /// Parse the user-friendly base64 form.
    ///
    /// Layout: 1 tag byte (bounceable/testnet flags), 1 workchain byte,
    /// 32 address bytes, 2 bytes CRC-16/XMODEM over the first 34.
    fn from_user_friendly(s: &str) -> CellResult<Self> {
        let standard_b64: String = s
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();

        let bytes =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &standard_b64)
                .map_err(|e| CellError::InvalidBase64(e.to_string()))?;

        if bytes.len() != 36 {
            return Err(CellError::InvalidAddress(format!(
                "User-friendly address must be 36 bytes, got {}",
                bytes.len()
            )));
        }

        let expected_crc = ((bytes[34] as u16) << 8) | (bytes[35] as u16);
        let actual_crc = crc16_xmodem(&bytes[0..34]);
        if expected_crc != actual_crc {
            return Err(CellError::InvalidAddress(format!(
                "CRC16 mismatch: expected {:04x}, got {:04x}",
                expected_crc, actual_crc
            )));
        }

        let workchain = bytes[1] as i8 as i32;
        let mut address = [0u8; 32];
        address.copy_from_slice(&bytes[2..34]);

        Ok(MsgAddress::Internal { workchain, address })
    }

    /// Raw string form `workchain:hex64`.
    pub fn to_raw_string(&self) -> String {
        match self {
            MsgAddress::Null => String::new(),
            MsgAddress::Internal { workchain, address } => {
                format!("{}:{}", workchain, hex_encode(address))
            }
        }
    }

    /// User-friendly base64 form (URL-safe alphabet, no padding).
    ///
    /// Returns `None` for a null address.
    pub fn to_user_friendly(&self, bounceable: bool, testnet: bool) -> Option<String> {
        match self {
            MsgAddress::Internal { workchain, address } => {
                let mut data = Vec::with_capacity(36);

                let mut tag: u8 = if bounceable { 0x11 } else { 0x51 };
                if testnet {
                    tag |= 0x80;
                }
                data.push(tag);
                data.push(*workchain as i8 as u8);
                data.extend_from_slice(address);

                let crc = crc16_xmodem(&data);
                data.push((crc >> 8) as u8);
                data.push(crc as u8);

                Some(base64::Engine::encode(
                    &base64::engine::general_purpose::URL_SAFE_NO_PAD,
                    &data,
                ))
            }
            MsgAddress::Null => None,
        }
    }

    /// Workchain id, if internal.
    pub fn workchain(&self) -> Option<i32> {
        match self {
            MsgAddress::Internal { workchain, .. } => Some(*workchain),
            MsgAddress::Null => None,
        }
    }

    /// The 256-bit account id, if internal.
    pub fn hash_part(&self) -> Option<&[u8; 32]> {
        match self {
            MsgAddress::Internal { address, .. } => Some(address),
            MsgAddress::Null => None,
        }
    }

    /// Whether this is the null address.
    pub fn is_null(&self) -> bool {
        matches!(self, MsgAddress::Null)
    }

    /// Whether this is an internal address.
    pub fn is_internal(&self) -> bool {
        matches!(self, MsgAddress::Internal { .. })
    }

    /// Whether this address lives on the masterchain (workchain -1).
    pub fn is_masterchain(&self) -> bool {
        matches!(self, MsgAddress::Internal { workchain: -1, .. })
    }
}

impl std::fmt::Display for MsgAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_raw_string())
    }
}

fn hex_decode(s: &str) -> CellResult<Vec<u8>> {
    if !s.len().is_multiple_of(2) {
        return Err(CellError::InvalidAddress(
            "Hex string must have even length".to_string(),
        ));
    }

    let mut result = Vec::with_capacity(s.len() / 2);
    for i in (0..s.len()).step_by(2) {
        let byte = u8::from_str_radix(&s[i..i + 2], 16)
            .map_err(|_| CellError::InvalidAddress(format!("Invalid hex: {}", &s[i..i + 2])))?;
        result.push(byte);
    }
    Ok(result)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// CRC16-XMODEM checksum (poly 0x1021), used by the user-friendly form.
fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
