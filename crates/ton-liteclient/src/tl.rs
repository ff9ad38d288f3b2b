//! TL (Type Language) primitives for the liteserver protocol.
//!
//! All integers are little-endian. `bytes` values carry a length prefix
//! (one byte below 254, otherwise 0xFE plus a 3-byte length) and are padded
//! to a 4-byte boundary.

use crc::{Crc, CRC_16_XMODEM};

use crate::error::{LiteError, LiteResult};

// ============================================================================
// Constructor ids (CRC32 of the TL schema lines)
// ============================================================================

/// tcp.ping random_id:long = tcp.Pong
pub const TCP_PING: u32 = 0x9a2b084d;

/// tcp.pong random_id:long = tcp.Pong
pub const TCP_PONG: u32 = 0x4f15c5d8;

/// adnl.message.query query_id:int256 query:bytes = adnl.Message
pub const ADNL_MESSAGE_QUERY: u32 = 0x7af98bb4;

/// adnl.message.answer query_id:int256 answer:bytes = adnl.Message
pub const ADNL_MESSAGE_ANSWER: u32 = 0x1684ac0f;

/// liteServer.query data:bytes = Object
pub const LITE_QUERY: u32 = 0xdf068c79;

/// liteServer.waitMasterchainSeqno seqno:int timeout_ms:int = Object
pub const LITE_WAIT_MASTERCHAIN_SEQNO: u32 = 0xbca8b453;

/// liteServer.getMasterchainInfo = liteServer.MasterchainInfo
pub const LITE_GET_MASTERCHAIN_INFO: u32 = 0x89b5e62e;

/// liteServer.masterchainInfo last:tonNode.blockIdExt state_root_hash:int256
/// init:tonNode.zeroStateIdExt = liteServer.MasterchainInfo
pub const LITE_MASTERCHAIN_INFO: u32 = 0x85832881;

/// liteServer.getTime = liteServer.CurrentTime
pub const LITE_GET_TIME: u32 = 0x16ad5a34;

/// liteServer.currentTime now:int = liteServer.CurrentTime
pub const LITE_CURRENT_TIME: u32 = 0xe953000d;

/// liteServer.sendMessage body:bytes = liteServer.SendMsgStatus
pub const LITE_SEND_MESSAGE: u32 = 0x690ad482;

/// liteServer.sendMsgStatus status:int = liteServer.SendMsgStatus
pub const LITE_SEND_MSG_STATUS: u32 = 0x3950e597;

/// liteServer.runSmcMethod mode:# id:tonNode.blockIdExt
/// account:liteServer.accountId method_id:long params:bytes
/// = liteServer.RunMethodResult
pub const LITE_RUN_SMC_METHOD: u32 = 0x5cc65dd2;

/// liteServer.runMethodResult (mode-gated fields, see `RunMethodResult`)
pub const LITE_RUN_RESULT: u32 = 0xa39a616b;

/// liteServer.error code:int message:string = liteServer.Error
pub const LITE_ERROR: u32 = 0xbba9e148;

/// Computes a TVM get-method id from its name.
///
/// Method ids are the CRC-16/XMODEM of the name with bit 16 set.
pub fn compute_method_id(name: &str) -> u64 {
    const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
    u64::from(XMODEM.checksum(name.as_bytes())) | 0x10000
}

// ============================================================================
// Writer
// ============================================================================

/// Incremental TL message builder.
#[derive(Default)]
pub struct TlWriter {
    buffer: Vec<u8>,
}

impl TlWriter {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Writes raw bytes without a length prefix.
    pub fn write_raw(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Writes a 256-bit value (32 raw bytes).
    pub fn write_int256(&mut self, value: &[u8; 32]) -> &mut Self {
        self.buffer.extend_from_slice(value);
        self
    }

    /// Writes TL-prefixed bytes with padding to a 4-byte boundary.
    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();

        let written = if len < 254 {
            self.buffer.push(len as u8);
            self.buffer.extend_from_slice(data);
            1 + len
        } else {
            self.buffer.push(0xFE);
            self.buffer.push((len & 0xFF) as u8);
            self.buffer.push(((len >> 8) & 0xFF) as u8);
            self.buffer.push(((len >> 16) & 0xFF) as u8);
            self.buffer.extend_from_slice(data);
            4 + len
        };

        let padding = (4 - (written % 4)) % 4;
        self.buffer.extend(std::iter::repeat_n(0, padding));
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Cursor over a TL-encoded byte slice.
#[derive(Debug)]
pub struct TlReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> TlReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn read_raw(&mut self, len: usize) -> LiteResult<&'a [u8]> {
        if self.remaining_len() < len {
            return Err(LiteError::Tl(format!(
                "need {} bytes, have {}",
                len,
                self.remaining_len()
            )));
        }
        let result = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(result)
    }

    pub fn read_u32(&mut self) -> LiteResult<u32> {
        let bytes = self.read_raw(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> LiteResult<i32> {
        let bytes = self.read_raw(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> LiteResult<u64> {
        let bytes = self.read_raw(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> LiteResult<i64> {
        let bytes = self.read_raw(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(buf))
    }

    pub fn read_int256(&mut self) -> LiteResult<[u8; 32]> {
        let bytes = self.read_raw(32)?;
        let mut result = [0u8; 32];
        result.copy_from_slice(bytes);
        Ok(result)
    }

    /// Reads TL-prefixed bytes, consuming the padding as well.
    pub fn read_bytes(&mut self) -> LiteResult<Vec<u8>> {
        if self.remaining_len() < 1 {
            return Err(LiteError::Tl("need at least 1 byte".into()));
        }

        let first = self.data[self.offset];

        let (header, len) = if first < 254 {
            (1usize, first as usize)
        } else {
            if self.remaining_len() < 4 {
                return Err(LiteError::Tl("truncated long length prefix".into()));
            }
            let len = (self.data[self.offset + 1] as usize)
                | ((self.data[self.offset + 2] as usize) << 8)
                | ((self.data[self.offset + 3] as usize) << 16);
            (4usize, len)
        };

        let total = header + len;
        let consumed = total + (4 - (total % 4)) % 4;

        if self.remaining_len() < consumed {
            return Err(LiteError::Tl(format!(
                "need {} bytes, have {}",
                consumed,
                self.remaining_len()
            )));
        }

        let start = self.offset + header;
        let result = self.data[start..start + len].to_vec();
        self.offset += consumed;
        Ok(result)
    }

    /// Reads a TL string (bytes interpreted as UTF-8, lossy).
    pub fn read_string(&mut self) -> LiteResult<String> {
        let bytes = self.read_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_u32_little_endian() {
        let mut writer = TlWriter::new();
        writer.write_u32(0x12345678);
        assert_eq!(writer.finish(), vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_writer_bytes_short() {
        let mut writer = TlWriter::new();
        writer.write_bytes(b"Hi");
        let result = writer.finish();

        assert_eq!(result[0], 2);
        assert_eq!(&result[1..3], b"Hi");
        assert_eq!(result.len() % 4, 0);
    }

    #[test]
    fn test_writer_bytes_long() {
        let data: Vec<u8> = (0..300).map(|i| i as u8).collect();
        let mut writer = TlWriter::new();
        writer.write_bytes(&data);
        let result = writer.finish();

        assert_eq!(result[0], 0xFE);
        assert_eq!(result[1], 0x2C);
        assert_eq!(result[2], 0x01);
        assert_eq!(result[3], 0x00);
        assert_eq!(&result[4..304], &data[..]);
        assert_eq!(result.len() % 4, 0);
    }

    #[test]
    fn test_bytes_roundtrip_all_lengths() {
        for len in 0..300 {
            let original: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let mut writer = TlWriter::new();
            writer.write_bytes(&original);
            let data = writer.finish();

            let mut reader = TlReader::new(&data);
            let decoded = reader.read_bytes().unwrap();
            assert_eq!(decoded, original, "length {}", len);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_reader_truncated() {
        let data = [0x01, 0x02];
        let mut reader = TlReader::new(&data);
        assert!(matches!(reader.read_u32(), Err(LiteError::Tl(_))));
    }

    #[test]
    fn test_int256_roundtrip() {
        let value = [42u8; 32];
        let mut writer = TlWriter::new();
        writer.write_int256(&value);
        let data = writer.finish();

        let mut reader = TlReader::new(&data);
        assert_eq!(reader.read_int256().unwrap(), value);
    }

    #[test]
    fn test_compute_method_id_seqno() {
        // crc16("seqno") = 0x4c97, method id sets bit 16
        assert_eq!(compute_method_id("seqno"), 0x14c97);
    }

    #[test]
    fn test_compute_method_id_has_marker_bit() {
        assert_ne!(compute_method_id("get_wallet_data") & 0x10000, 0);
    }
}
