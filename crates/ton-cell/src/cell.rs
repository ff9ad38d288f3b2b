//! Ordinary cell implementation.
//!
//! The representation hash and tree depth are computed once when the cell
//! is built; after that a cell is immutable and cheap to share via `Arc`.

use std::sync::Arc;

use crate::{CellError, CellResult, MAX_CELL_BITS, MAX_CELL_REFS, sha256};

/// A TON cell: a bounded bit string plus up to four child references.
///
/// The hash covers the full subtree, so equal hashes mean structurally
/// identical cell trees. Two cells with the same data but different
/// children hash differently.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Raw data bytes (the last byte may be partially used).
    data: Vec<u8>,
    /// Number of meaningful bits in `data`.
    bit_len: usize,
    /// Child cells.
    references: Vec<Arc<Cell>>,
    /// Representation hash, computed at construction.
    hash: [u8; 32],
    /// Tree depth: 0 for a leaf, 1 + max child depth otherwise.
    depth: u16,
}

impl Cell {
    /// Create a cell from raw parts, computing hash and depth.
    ///
    /// Callers normally go through [`crate::CellBuilder`]; this is also the
    /// entry point for the BoC deserializer.
    pub(crate) fn new(
        data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
    ) -> CellResult<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(CellError::DataTooLong(bit_len));
        }
        if references.len() > MAX_CELL_REFS {
            return Err(CellError::TooManyRefs(references.len()));
        }

        let depth = references
            .iter()
            .map(|r| r.depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut cell = Cell {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = sha256(&cell.representation());
        Ok(cell)
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        // Empty parts always satisfy the limits.
        match Self::new(Vec::new(), 0, Vec::new()) {
            Ok(cell) => cell,
            Err(_) => unreachable!(),
        }
    }

    /// The representation hash identifying this cell and its subtree.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Depth of the cell tree rooted here.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Raw data bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of meaningful bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Child cells.
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Number of child cells.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Get a child cell by index.
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Descriptor bytes (d1, d2) as used in BoC and hashing.
    ///
    /// d1 = refs_count (exotic and level bits are always 0 here),
    /// d2 = ceil(bits / 8) + floor(bits / 8), so an odd d2 marks a
    /// non-byte-aligned cell.
    pub fn descriptors(&self) -> (u8, u8) {
        let d1 = self.references.len() as u8;
        let d2 = (self.bit_len.div_ceil(8) + self.bit_len / 8) as u8;
        (d1, d2)
    }

    /// Data bytes with the completion tag applied.
    ///
    /// A non-byte-aligned cell pads its last byte with a single 1 bit
    /// followed by zeros.
    pub fn data_with_completion_tag(&self) -> Vec<u8> {
        if self.bit_len == 0 {
            return Vec::new();
        }

        let remainder = self.bit_len % 8;
        if remainder == 0 {
            self.data.clone()
        } else {
            let mut result = self.data.clone();
            if let Some(last) = result.last_mut() {
                *last |= 1 << (7 - remainder);
            }
            result
        }
    }

    /// The byte string that is hashed to produce the representation hash:
    /// descriptors, tagged data, child depths (big-endian u16), child hashes.
    pub fn representation(&self) -> Vec<u8> {
        let mut repr = Vec::with_capacity(2 + self.data.len() + self.references.len() * 34);

        let (d1, d2) = self.descriptors();
        repr.push(d1);
        repr.push(d2);
        repr.extend_from_slice(&self.data_with_completion_tag());

        for reference in &self.references {
            repr.extend_from_slice(&reference.depth.to_be_bytes());
        }
        for reference in &self.references {
            repr.extend_from_slice(&reference.hash);
        }

        repr
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellBuilder;

    #[test]
    fn test_empty_cell_hash() {
        // Representation of an empty cell is just the two zero descriptors.
        let cell = Cell::empty();
        assert_eq!(cell.hash(), sha256(&[0, 0]));
    }

    #[test]
    fn test_descriptors_alignment() {
        let mut builder = CellBuilder::new();
        builder.store_u8(0xAB).unwrap();
        let aligned = builder.build().unwrap();
        assert_eq!(aligned.descriptors(), (0, 2));

        let mut builder = CellBuilder::new();
        builder.store_uint(0b101, 3).unwrap();
        let unaligned = builder.build().unwrap();
        assert_eq!(unaligned.descriptors(), (0, 1));
    }

    #[test]
    fn test_completion_tag() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b101, 3).unwrap();
        let cell = builder.build().unwrap();
        // 101 then tag bit: 1011_0000
        assert_eq!(cell.data_with_completion_tag(), vec![0b1011_0000]);
    }

    #[test]
    fn test_hash_depends_on_children() {
        let mut child_builder = CellBuilder::new();
        child_builder.store_u8(1).unwrap();
        let child = Arc::new(child_builder.build().unwrap());

        let plain = CellBuilder::new().build().unwrap();

        let mut with_child = CellBuilder::new();
        with_child.store_ref(child).unwrap();
        let with_child = with_child.build().unwrap();

        assert_ne!(plain.hash(), with_child.hash());
    }

    #[test]
    fn test_equality_by_hash() {
        let mut a = CellBuilder::new();
        a.store_u32(7).unwrap();
        let mut b = CellBuilder::new();
        b.store_u32(7).unwrap();
        assert_eq!(a.build().unwrap(), b.build().unwrap());
    }
}
