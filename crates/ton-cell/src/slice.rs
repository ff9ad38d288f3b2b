//! CellSlice for reading data back out of cells.

use crate::{Cell, CellError, CellResult, MsgAddress};

/// A positional reader over a cell's bits and references.
///
/// # Example
///
/// ```
/// use ton_cell::{CellBuilder, CellSlice};
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// let cell = builder.build().unwrap();
///
/// let mut slice = CellSlice::new(&cell);
/// assert_eq!(slice.load_u32().unwrap(), 0x12345678);
/// ```
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_offset: usize,
    bits_remaining: usize,
    ref_offset: usize,
}

impl<'a> CellSlice<'a> {
    /// Create a new slice positioned at the start of a cell.
    pub fn new(cell: &'a Cell) -> Self {
        CellSlice {
            cell,
            bit_offset: 0,
            bits_remaining: cell.bit_len(),
            ref_offset: 0,
        }
    }

    /// Load a single bit.
    pub fn load_bit(&mut self) -> CellResult<bool> {
        if self.bits_remaining == 0 {
            return Err(CellError::NotEnoughBits { need: 1, have: 0 });
        }

        let bit = self.bit_at(self.bit_offset);
        self.bit_offset += 1;
        self.bits_remaining -= 1;
        Ok(bit)
    }

    /// Load an unsigned 8-bit integer.
    pub fn load_u8(&mut self) -> CellResult<u8> {
        self.load_uint(8).map(|v| v as u8)
    }

    /// Load an unsigned 16-bit integer.
    pub fn load_u16(&mut self) -> CellResult<u16> {
        self.load_uint(16).map(|v| v as u16)
    }

    /// Load an unsigned 32-bit integer.
    pub fn load_u32(&mut self) -> CellResult<u32> {
        self.load_uint(32).map(|v| v as u32)
    }

    /// Load an unsigned 64-bit integer.
    pub fn load_u64(&mut self) -> CellResult<u64> {
        self.load_uint(64)
    }

    /// Load a signed 8-bit integer.
    pub fn load_i8(&mut self) -> CellResult<i8> {
        self.load_int(8).map(|v| v as i8)
    }

    /// Load a signed 32-bit integer.
    pub fn load_i32(&mut self) -> CellResult<i32> {
        self.load_int(32).map(|v| v as i32)
    }

    /// Load an unsigned integer of the given bit width, MSB first.
    pub fn load_uint(&mut self, bits: usize) -> CellResult<u64> {
        if bits == 0 {
            return Ok(0);
        }
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }
        if bits > self.bits_remaining {
            return Err(CellError::NotEnoughBits {
                need: bits,
                have: self.bits_remaining,
            });
        }

        let mut result: u64 = 0;
        for _ in 0..bits {
            result = (result << 1) | (self.load_bit()? as u64);
        }

        Ok(result)
    }

    /// Load a signed integer of the given bit width (two's complement).
    pub fn load_int(&mut self, bits: usize) -> CellResult<i64> {
        if bits == 0 {
            return Ok(0);
        }
        if bits > 64 {
            return Err(CellError::InvalidBitLength(bits));
        }

        let unsigned = self.load_uint(bits)?;

        if bits < 64 && (unsigned & (1u64 << (bits - 1))) != 0 {
            // Sign extend.
            let mask = !((1u64 << bits) - 1);
            Ok((unsigned | mask) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Load a byte array.
    pub fn load_bytes(&mut self, count: usize) -> CellResult<Vec<u8>> {
        let bits_needed = count * 8;
        if bits_needed > self.bits_remaining {
            return Err(CellError::NotEnoughBits {
                need: bits_needed,
                have: self.bits_remaining,
            });
        }

        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.load_u8()?);
        }
        Ok(result)
    }

    /// Load the next child reference.
    pub fn load_ref(&mut self) -> CellResult<&'a Cell> {
        let reference = self
            .cell
            .reference(self.ref_offset)
            .ok_or(CellError::NotEnoughRefs { need: 1, have: 0 })?;
        self.ref_offset += 1;
        Ok(reference.as_ref())
    }

    /// Load a coin amount (VarUInteger 16).
    pub fn load_coins(&mut self) -> CellResult<u128> {
        let byte_len = self.load_uint(4)? as usize;
        if byte_len == 0 {
            return Ok(0);
        }

        let mut result: u128 = 0;
        for _ in 0..byte_len {
            result = (result << 8) | (self.load_u8()? as u128);
        }

        Ok(result)
    }

    /// Load a message address.
    ///
    /// Only addr_none$00 and addr_std$10 are produced by this client;
    /// the other constructors are rejected.
    pub fn load_address(&mut self) -> CellResult<MsgAddress> {
        let tag = self.load_uint(2)? as u8;

        match tag {
            0b00 => Ok(MsgAddress::Null),
            0b10 => {
                let anycast = self.load_bit()?;
                if anycast {
                    // anycast_info$_ depth:(#<= 30) rewrite_pfx:(bits depth)
                    let depth = self.load_uint(5)?;
                    self.skip_bits(depth as usize)?;
                }

                let workchain = self.load_int(8)? as i32;
                let address_bytes = self.load_bytes(32)?;
                let mut address = [0u8; 32];
                address.copy_from_slice(&address_bytes);

                Ok(MsgAddress::Internal { workchain, address })
            }
            other => Err(CellError::InvalidAddress(format!(
                "Unsupported address constructor: {:02b}",
                other
            ))),
        }
    }

    /// Number of bits remaining.
    pub fn bits_left(&self) -> usize {
        self.bits_remaining
    }

    /// Number of references remaining.
    pub fn refs_left(&self) -> usize {
        self.cell.reference_count() - self.ref_offset
    }

    /// Skip a number of bits.
    pub fn skip_bits(&mut self, count: usize) -> CellResult<()> {
        if count > self.bits_remaining {
            return Err(CellError::NotEnoughBits {
                need: count,
                have: self.bits_remaining,
            });
        }

        self.bit_offset += count;
        self.bits_remaining -= count;
        Ok(())
    }

    /// Whether both bits and refs are exhausted.
    pub fn is_empty(&self) -> bool {
        self.bits_remaining == 0 && self.refs_left() == 0
    }

    /// The underlying cell.
    pub fn cell(&self) -> &'a Cell {
        self.cell
    }

    fn bit_at(&self, index: usize) -> bool {
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);

        match self.cell.data().get(byte_index) {
            Some(byte) => (byte >> bit_index) & 1 == 1,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellBuilder;

    #[test]
    fn test_load_bit_exhaustion() {
        let mut builder = CellBuilder::new();
        builder.store_bit(true).unwrap();
        builder.store_bit(false).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert!(slice.load_bit().unwrap());
        assert!(!slice.load_bit().unwrap());
        assert!(matches!(
            slice.load_bit(),
            Err(CellError::NotEnoughBits { need: 1, have: 0 })
        ));
    }

    #[test]
    fn test_load_int_negative() {
        let mut builder = CellBuilder::new();
        builder.store_int(-15, 8).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert_eq!(slice.load_int(8).unwrap(), -15);
    }

    #[test]
    fn test_address_roundtrip() {
        let addr = MsgAddress::Internal {
            workchain: -1,
            address: [0x5A; 32],
        };

        let mut builder = CellBuilder::new();
        builder.store_address(&addr).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert_eq!(slice.load_address().unwrap(), addr);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_null_address_roundtrip() {
        let mut builder = CellBuilder::new();
        builder.store_address(&MsgAddress::Null).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert_eq!(slice.load_address().unwrap(), MsgAddress::Null);
    }

    #[test]
    fn test_unknown_address_constructor() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b01, 2).unwrap();
        let cell = builder.build().unwrap();

        let mut slice = CellSlice::new(&cell);
        assert!(matches!(
            slice.load_address(),
            Err(CellError::InvalidAddress(_))
        ));
    }
}
