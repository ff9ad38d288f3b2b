//! Embedded wallet contract code.

use std::sync::{Arc, OnceLock};

use ton_cell::{Cell, CellBuilder};

use crate::error::WalletResult;

/// Compiled V3R2 wallet code: a single cell, 888 data bits, no references.
const WALLET_V3R2_CODE: [u8; 111] = [
    0xff, 0x00, 0x20, 0xdd, 0x20, 0x82, 0x01, 0x4c, 0x97, 0xba, 0x21, 0x82,
    0x01, 0x33, 0x9c, 0xba, 0xb1, 0x9f, 0x71, 0xb0, 0xed, 0x44, 0xd0, 0xd3,
    0x1f, 0xd3, 0x1f, 0x31, 0xd7, 0x0b, 0xff, 0xe3, 0x04, 0xe0, 0xa4, 0xf2,
    0x60, 0x83, 0x08, 0xd7, 0x18, 0x20, 0xd3, 0x1f, 0xd3, 0x1f, 0xd3, 0x1f,
    0xf8, 0x23, 0x13, 0xbb, 0xf2, 0x63, 0xed, 0x44, 0xd0, 0xd3, 0x1f, 0xd3,
    0x1f, 0xd3, 0xff, 0xd1, 0x51, 0x32, 0xba, 0xf2, 0xa1, 0x51, 0x44, 0xba,
    0xf2, 0xa2, 0x04, 0xf9, 0x01, 0x54, 0x10, 0x55, 0xf9, 0x10, 0xf2, 0xa3,
    0xf8, 0x00, 0x93, 0x20, 0xd7, 0x4a, 0x96, 0xd3, 0x07, 0xd4, 0x02, 0xfb,
    0x00, 0xe8, 0xd1, 0x01, 0xa4, 0xc8, 0xcb, 0x1f, 0xcb, 0x1f, 0xcb, 0xff,
    0xc9, 0xed, 0x54,
];

/// SHA-256 hash of the V3R2 code cell.
pub const WALLET_V3R2_CODE_HASH: [u8; 32] = [
    0x84, 0xda, 0xfa, 0x44, 0x9f, 0x98, 0xa6, 0x98, 0x77, 0x89, 0xba, 0x23,
    0x23, 0x58, 0x07, 0x2b, 0xc0, 0xf7, 0x6d, 0xc4, 0x52, 0x40, 0x02, 0xa5,
    0xd0, 0x91, 0x8b, 0x9a, 0x75, 0xd2, 0xd5, 0x99,
];

static V3R2_CODE: OnceLock<Arc<Cell>> = OnceLock::new();

/// Returns the V3R2 wallet code cell, building it on first use.
pub fn wallet_v3r2_code() -> WalletResult<Arc<Cell>> {
    if let Some(cell) = V3R2_CODE.get() {
        return Ok(cell.clone());
    }

    let mut builder = CellBuilder::new();
    builder.store_bytes(&WALLET_V3R2_CODE)?;
    let cell = Arc::new(builder.build()?);

    Ok(V3R2_CODE.get_or_init(|| cell).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_cell_shape() {
        let code = wallet_v3r2_code().unwrap();
        assert_eq!(code.bit_len(), 888);
        assert_eq!(code.reference_count(), 0);
    }

    #[test]
    fn test_code_hash_is_pinned() {
        let code = wallet_v3r2_code().unwrap();
        assert_eq!(code.hash(), WALLET_V3R2_CODE_HASH);
    }

    #[test]
    fn test_code_cell_is_shared() {
        let a = wallet_v3r2_code().unwrap();
        let b = wallet_v3r2_code().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
