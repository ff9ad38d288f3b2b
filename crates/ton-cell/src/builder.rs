//! CellBuilder for constructing cells bit by bit.

use std::sync::Arc;

use crate::{Cell, CellError, CellResult, MAX_CELL_BITS, MAX_CELL_REFS, MsgAddress};

/// Builder for constructing cells.
///
/// All integers are stored big-endian, most significant bit first, which is
/// the layout every TL-B schema assumes.
///
/// # Example
///
/// ```
/// use ton_cell::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_bytes(&[1, 2, 3, 4]).unwrap();
/// let cell = builder.build().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        CellBuilder {
            data: Vec::with_capacity(128),
            bit_len: 0,
            references: Vec::new(),
        }
    }

    /// Store a single bit.
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        if self.bit_len >= MAX_CELL_BITS {
            return Err(CellError::DataTooLong(self.bit_len + 1));
        }

        let byte_index = self.bit_len / 8;
        let bit_index = 7 - (self.bit_len % 8);

        if byte_index >= self.data.len() {
            self.data.push(0);
        }

        if bit {
            self.data[byte_index] |= 1 << bit_index;
        }

        self.bit_len += 1;
        Ok(self)
    }

    /// Store multiple bits.
    pub fn store_bits(&mut self, bits: &[bool]) -> CellResult<&mut Self> {
        for &bit in bits {
            self.store_bit(bit)?;
        }
        Ok(self)
    }

    /// Store an unsigned 8-bit integer.
    pub fn store_u8(&mut self, value: u8) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 8)
    }

    /// Store an unsigned 16-bit integer.
    pub fn store_u16(&mut self, value: u16) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 16)
    }

    /// Store an unsigned 32-bit integer.
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 32)
    }

    /// Store an unsigned 64-bit integer.
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint(value, 64)
    }

    /// Store a signed 8-bit integer.
    pub fn store_i8(&mut self, value: i8) -> CellResult<&mut Self> {
        self.store_int(value as i64, 8)
    }

    /// Store a signed 32-bit integer.
    pub fn store_i32(&mut self, value: i32) -> CellResult<&mut Self> {
        self.store_int(value as i64, 32)
    }

    /// Store an unsigned integer with a specific bit width, MSB first.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        if bits == 0 {
            return Ok(self);
        }
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if self.bit_len + bits > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(self.bit_len + bits));
        }

        for i in (0..bits).rev() {
            self.store_bit(((value >> i) & 1) == 1)?;
        }

        Ok(self)
    }

    /// Store a signed integer in two's complement, MSB first.
    pub fn store_int(&mut self, value: i64, bits: usize) -> CellResult<&mut Self> {
        if bits == 0 {
            return Ok(self);
        }
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }

        // Two's complement falls out of the unsigned bit pattern.
        self.store_uint(value as u64, bits)
    }

    /// Store a byte array.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        for &byte in bytes {
            self.store_u8(byte)?;
        }
        Ok(self)
    }

    /// Store a reference to another cell.
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(self.references.len() + 1));
        }

        self.references.push(cell);
        Ok(self)
    }

    /// Store a coin amount as VarUInteger 16.
    ///
    /// The economical encoding used for nanoton values: 4 bits of byte
    /// length, then the magnitude big-endian in that many bytes. Zero is
    /// four 0 bits. Values needing more than 15 bytes (>= 2^120) do not fit.
    pub fn store_coins(&mut self, amount: u128) -> CellResult<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = ((128 - amount.leading_zeros()).div_ceil(8)).max(1) as usize;
        if byte_len > 15 {
            return Err(CellError::DataTooLong(byte_len * 8 + 4));
        }

        self.store_uint(byte_len as u64, 4)?;
        for i in (0..byte_len).rev() {
            self.store_u8((amount >> (i * 8)) as u8)?;
        }

        Ok(self)
    }

    /// Store a message address.
    ///
    /// Internal addresses use the addr_std$10 form with no anycast.
    pub fn store_address(&mut self, addr: &MsgAddress) -> CellResult<&mut Self> {
        match addr {
            MsgAddress::Null => {
                // addr_none$00
                self.store_uint(0b00, 2)
            }
            MsgAddress::Internal { workchain, address } => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_int(*workchain as i64, 8)?;
                self.store_bytes(address)
            }
        }
    }

    /// Number of bits that can still be stored.
    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    /// Current number of bits stored.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Current number of references.
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Finalize into a cell, computing its hash.
    pub fn build(self) -> CellResult<Cell> {
        Cell::new(self.data, self.bit_len, self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_bit() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_bit(false).unwrap();
        builder.store_bit(true).unwrap();

        assert_eq!(builder.bit_len(), 3);

        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), &[0b10100000]);
    }

    #[test]
    fn test_store_uint() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b10101, 5).unwrap();

        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), &[0b10101000]);
    }

    #[test]
    fn test_store_u32() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0x12345678).unwrap();

        let cell = builder.build().unwrap();
        assert_eq!(cell.data(), &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_store_coins_layout() {
        // 1 nanoton: length nibble 1, then 0x01
        let mut builder = CellBuilder::new();
        builder.store_coins(1).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 12);
        assert_eq!(cell.data(), &[0x10, 0x10]);
    }

    #[test]
    fn test_store_coins_overflow() {
        let mut builder = CellBuilder::new();
        // 2^120 needs 16 bytes, one past the VarUInteger 16 limit.
        assert!(builder.store_coins(1u128 << 120).is_err());
    }

    #[test]
    fn test_bit_capacity() {
        let mut builder = CellBuilder::new();
        for _ in 0..MAX_CELL_BITS {
            builder.store_bit(false).unwrap();
        }
        assert!(builder.store_bit(true).is_err());
    }

    #[test]
    fn test_ref_capacity() {
        let mut builder = CellBuilder::new();
        let child = Arc::new(Cell::empty());
        for _ in 0..MAX_CELL_REFS {
            builder.store_ref(child.clone()).unwrap();
        }
        assert!(builder.store_ref(child).is_err());
    }
}
