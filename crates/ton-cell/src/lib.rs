//! TON cell model and bag-of-cells codec.
//!
//! Everything a client sends to or reads from the chain is built out of
//! cells: up to 1023 bits of data plus up to 4 references to child cells,
//! forming a DAG identified by its root hash.
//!
//! This crate covers the ordinary-cell subset needed to construct message
//! bodies, state inits and get-method stacks:
//!
//! - [`Cell`]: immutable cell with its representation hash computed at build time
//! - [`CellBuilder`]: MSB-first bit writer
//! - [`CellSlice`]: positional reader
//! - [`MsgAddress`]: raw and user-friendly TON address forms
//! - [`BagOfCells`]: the standard serialization envelope
//!
//! Exotic cells (pruned branches, Merkle proofs) are not modelled; the
//! deserializer rejects them.
//!
//! # Example
//!
//! ```
//! use ton_cell::{CellBuilder, CellSlice, BagOfCells};
//!
//! let mut builder = CellBuilder::new();
//! builder.store_u32(0x12345678).unwrap();
//! builder.store_coins(1_000_000_000).unwrap();
//! let cell = builder.build().unwrap();
//!
//! let mut slice = CellSlice::new(&cell);
//! assert_eq!(slice.load_u32().unwrap(), 0x12345678);
//! assert_eq!(slice.load_coins().unwrap(), 1_000_000_000);
//!
//! let bytes = BagOfCells::from_root(cell).serialize().unwrap();
//! let root = BagOfCells::deserialize(&bytes).unwrap();
//! ```

use sha2::{Digest, Sha256};
use thiserror::Error;

mod address;
mod boc;
mod builder;
mod cell;
mod slice;

pub use address::MsgAddress;
pub use boc::BagOfCells;
pub use builder::CellBuilder;
pub use cell::Cell;
pub use slice::CellSlice;

/// Errors from cell construction, reading and BoC codec operations.
#[derive(Debug, Error)]
pub enum CellError {
    /// The cell data exceeds the maximum of 1023 bits.
    #[error("Cell data too long: {0} bits (max 1023)")]
    DataTooLong(usize),

    /// The cell has too many references (max 4).
    #[error("Too many cell references: {0} (max 4)")]
    TooManyRefs(usize),

    /// Invalid BoC format.
    #[error("Invalid BoC format: {0}")]
    InvalidBoc(String),

    /// Cell not found in BoC.
    #[error("Cell not found: index {0}")]
    CellNotFound(usize),

    /// CRC32 checksum mismatch.
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// Unexpected end of data.
    #[error("Unexpected end of data")]
    UnexpectedEof,

    /// Not enough bits available.
    #[error("Not enough bits: need {need}, have {have}")]
    NotEnoughBits { need: usize, have: usize },

    /// Not enough references available.
    #[error("Not enough refs: need {need}, have {have}")]
    NotEnoughRefs { need: usize, have: usize },

    /// Invalid address format.
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    /// Invalid base64 encoding.
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Expected single root but found multiple or none.
    #[error("Expected single root, found {0}")]
    NotSingleRoot(usize),

    /// Invalid bit length.
    #[error("Invalid bit length: {0}")]
    InvalidBitLength(usize),
}

/// Result type for cell operations.
pub type CellResult<T> = Result<T, CellError>;

/// Maximum number of bits in a cell's data.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have.
pub const MAX_CELL_REFS: usize = 4;

/// BoC magic number for generic BoC.
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Compute SHA256 hash of the input data.
fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute CRC32-C checksum (Castagnoli polynomial, as used in BoC trailers).
fn crc32c(data: &[u8]) -> u32 {
    const CRC32C: crc::Crc<u32> = crc::Crc::<u32>::new(&crc::CRC_32_ISCSI);
    CRC32C.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_empty_cell() {
        let cell = CellBuilder::new().build().unwrap();
        assert_eq!(cell.bit_len(), 0);
        assert_eq!(cell.reference_count(), 0);
    }

    #[test]
    fn test_store_and_load_various_integers() {
        let mut builder = CellBuilder::new();
        builder.store_u8(0xFF).unwrap();
        builder.store_u16(0xABCD).unwrap();
        builder.store_u32(0x12345678).unwrap();
        builder.store_u64(0xDEADBEEFCAFEBABE).unwrap();
        builder.store_i8(-42).unwrap();
        builder.store_i32(-100000).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert_eq!(slice.load_u8().unwrap(), 0xFF);
        assert_eq!(slice.load_u16().unwrap(), 0xABCD);
        assert_eq!(slice.load_u32().unwrap(), 0x12345678);
        assert_eq!(slice.load_u64().unwrap(), 0xDEADBEEFCAFEBABE);
        assert_eq!(slice.load_i8().unwrap(), -42);
        assert_eq!(slice.load_i32().unwrap(), -100000);
    }

    #[test]
    fn test_store_and_load_coins() {
        for amount in [0u128, 1, 255, 256, 1_000_000_000, u64::MAX as u128 * 1000] {
            let mut builder = CellBuilder::new();
            builder.store_coins(amount).unwrap();
            let cell = builder.build().unwrap();

            let mut slice = CellSlice::new(&cell);
            assert_eq!(slice.load_coins().unwrap(), amount);
        }
    }

    #[test]
    fn test_nested_cells_with_references() {
        let mut inner_builder = CellBuilder::new();
        inner_builder.store_u32(0xDEADBEEF).unwrap();
        let inner_cell = Arc::new(inner_builder.build().unwrap());

        let mut outer_builder = CellBuilder::new();
        outer_builder.store_u32(0xCAFEBABE).unwrap();
        outer_builder.store_ref(inner_cell.clone()).unwrap();
        let outer_cell = outer_builder.build().unwrap();

        let mut slice = CellSlice::new(&outer_cell);
        assert_eq!(slice.load_u32().unwrap(), 0xCAFEBABE);

        let inner_ref = slice.load_ref().unwrap();
        let mut inner_slice = CellSlice::new(inner_ref);
        assert_eq!(inner_slice.load_u32().unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_boc_serialize_deserialize_roundtrip() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();
        builder.store_bytes(&[1, 2, 3, 4]).unwrap();
        let cell = builder.build().unwrap();
        let original_hash = cell.hash();

        let boc = BagOfCells::from_root(cell);
        let serialized = boc.serialize().unwrap();

        let boc2 = BagOfCells::deserialize(&serialized).unwrap();
        let root = boc2.single_root().unwrap();

        assert_eq!(root.hash(), original_hash);
    }

    #[test]
    fn test_cell_hash_deterministic() {
        let mut builder1 = CellBuilder::new();
        builder1.store_u32(0x12345678).unwrap();
        let cell1 = builder1.build().unwrap();

        let mut builder2 = CellBuilder::new();
        builder2.store_u32(0x12345678).unwrap();
        let cell2 = builder2.build().unwrap();

        assert_eq!(cell1.hash(), cell2.hash());
    }

    #[test]
    fn test_cell_depth() {
        let cell0 = CellBuilder::new().build().unwrap();
        assert_eq!(cell0.depth(), 0);

        let mut builder1 = CellBuilder::new();
        builder1.store_ref(Arc::new(cell0)).unwrap();
        let cell1 = builder1.build().unwrap();
        assert_eq!(cell1.depth(), 1);

        let mut builder2 = CellBuilder::new();
        builder2.store_ref(Arc::new(cell1)).unwrap();
        let cell2 = builder2.build().unwrap();
        assert_eq!(cell2.depth(), 2);
    }
}
