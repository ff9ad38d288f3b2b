//! Bag of Cells (BoC) serialization.
//!
//! The wire envelope for cell trees: cells are deduplicated by hash,
//! written in topological order and optionally protected by a CRC32-C
//! trailer. This is the form `sendMessage` and embedded contract code use.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{BOC_GENERIC_MAGIC, Cell, CellError, CellResult, crc32c};

/// A serialized collection of cells with one or more roots.
#[derive(Debug, Clone)]
pub struct BagOfCells {
    roots: Vec<Arc<Cell>>,
}

impl BagOfCells {
    /// Create a BoC with the given root cells.
    pub fn new(roots: Vec<Arc<Cell>>) -> Self {
        BagOfCells { roots }
    }

    /// Create a BoC with a single root cell.
    pub fn from_root(root: Cell) -> Self {
        BagOfCells {
            roots: vec![Arc::new(root)],
        }
    }

    /// All root cells.
    pub fn roots(&self) -> &[Arc<Cell>] {
        &self.roots
    }

    /// The single root cell; errors if there is not exactly one.
    pub fn single_root(&self) -> CellResult<&Arc<Cell>> {
        if self.roots.len() != 1 {
            return Err(CellError::NotSingleRoot(self.roots.len()));
        }
        Ok(&self.roots[0])
    }

    /// Serialize with a CRC32-C trailer.
    pub fn serialize(&self) -> CellResult<Vec<u8>> {
        self.serialize_with_options(true)
    }

    /// Serialize the BoC, optionally appending the CRC32-C trailer.
    pub fn serialize_with_options(&self, with_crc: bool) -> CellResult<Vec<u8>> {
        if self.roots.is_empty() {
            return Err(CellError::InvalidBoc("No root cells".to_string()));
        }

        // Parents before children, deduplicated by hash: node
        // deserializers rebuild from the last index downward, so every
        // reference must point to a higher index than the referencing
        // cell and the root sits at index 0.
        let cells = self.collect_cells_topological();
        let cell_count = cells.len();

        let hash_to_index: HashMap<[u8; 32], usize> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| (c.hash(), i))
            .collect();

        let root_indices: Vec<usize> = self
            .roots
            .iter()
            .filter_map(|r| hash_to_index.get(&r.hash()).copied())
            .collect();

        let mut cell_data: Vec<Vec<u8>> = Vec::with_capacity(cell_count);
        let mut total_cells_size = 0usize;
        for cell in &cells {
            let serialized = Self::serialize_cell(cell, &hash_to_index)?;
            total_cells_size += serialized.len();
            cell_data.push(serialized);
        }

        let size_bytes = Self::bytes_needed(cell_count);
        let off_bytes = Self::bytes_needed(total_cells_size);

        let mut result = Vec::new();
        result.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());

        // Flags: has_idx (bit 7) | has_crc (bit 6) | has_cache_bits (bit 5)
        // | reserved (bits 4-3) | size_bytes (bits 2-0). No index written.
        let flags: u8 = (if with_crc { 1 << 6 } else { 0 }) | (size_bytes as u8);
        result.push(flags);
        result.push(off_bytes as u8);

        Self::write_uint(&mut result, cell_count as u64, size_bytes);
        Self::write_uint(&mut result, self.roots.len() as u64, size_bytes);
        Self::write_uint(&mut result, 0, size_bytes); // absent count
        Self::write_uint(&mut result, total_cells_size as u64, off_bytes);

        for idx in &root_indices {
            Self::write_uint(&mut result, *idx as u64, size_bytes);
        }

        for data in cell_data {
            result.extend_from_slice(&data);
        }

        if with_crc {
            let crc = crc32c(&result);
            result.extend_from_slice(&crc.to_le_bytes());
        }

        Ok(result)
    }

    /// Serialize to a standard base64 string.
    pub fn serialize_to_base64(&self) -> CellResult<String> {
        let bytes = self.serialize()?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &bytes,
        ))
    }

    /// Deserialize from bytes (generic BoC format).
    pub fn deserialize(data: &[u8]) -> CellResult<Self> {
        if data.len() < 6 {
            return Err(CellError::UnexpectedEof);
        }

        let magic = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        if magic != BOC_GENERIC_MAGIC {
            return Err(CellError::InvalidBoc(format!(
                "Invalid magic: {:08x}, expected {:08x}",
                magic, BOC_GENERIC_MAGIC
            )));
        }

        let mut offset = 4;
        let flags = data[offset];
        offset += 1;
        let has_idx = (flags & 0x80) != 0;
        let has_crc = (flags & 0x40) != 0;
        let size_bytes = (flags & 0x07) as usize;

        let off_bytes = data[offset] as usize;
        offset += 1;

        if size_bytes == 0 || size_bytes > 4 || off_bytes == 0 || off_bytes > 8 {
            return Err(CellError::InvalidBoc(format!(
                "Implausible size parameters: size_bytes={}, off_bytes={}",
                size_bytes, off_bytes
            )));
        }

        let cells_count = Self::read_uint(data, &mut offset, size_bytes)? as usize;
        let roots_count = Self::read_uint(data, &mut offset, size_bytes)? as usize;
        let _absent_count = Self::read_uint(data, &mut offset, size_bytes)?;
        let total_cells_size = Self::read_uint(data, &mut offset, off_bytes)? as usize;

        let mut root_indices = Vec::with_capacity(roots_count);
        for _ in 0..roots_count {
            root_indices.push(Self::read_uint(data, &mut offset, size_bytes)? as usize);
        }

        if has_idx {
            let index_len = cells_count
                .checked_mul(off_bytes)
                .ok_or_else(|| CellError::InvalidBoc("Index overflow".to_string()))?;
            if offset + index_len > data.len() {
                return Err(CellError::UnexpectedEof);
            }
            offset += index_len;
        }

        let data_end = if has_crc {
            if data.len() < 4 {
                return Err(CellError::UnexpectedEof);
            }
            let data_end = data.len() - 4;
            let expected_crc = u32::from_le_bytes([
                data[data_end],
                data[data_end + 1],
                data[data_end + 2],
                data[data_end + 3],
            ]);
            let actual_crc = crc32c(&data[..data_end]);
            if expected_crc != actual_crc {
                return Err(CellError::CrcMismatch {
                    expected: expected_crc,
                    actual: actual_crc,
                });
            }
            data_end
        } else {
            data.len()
        };

        if offset + total_cells_size > data_end {
            return Err(CellError::UnexpectedEof);
        }

        let cells_data = &data[offset..offset + total_cells_size];
        let cells = Self::parse_cells(cells_data, cells_count, size_bytes)?;

        let roots: Vec<Arc<Cell>> = root_indices
            .iter()
            .map(|&idx| cells.get(idx).cloned().ok_or(CellError::CellNotFound(idx)))
            .collect::<CellResult<Vec<_>>>()?;

        Ok(BagOfCells { roots })
    }

    /// Deserialize from a base64 string (standard or URL-safe alphabet).
    pub fn deserialize_from_base64(base64_str: &str) -> CellResult<Self> {
        let normalized: String = base64_str
            .trim()
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();

        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &normalized)
            .map_err(|e| CellError::InvalidBase64(e.to_string()))?;

        Self::deserialize(&bytes)
    }

    /// Collect all distinct cells with parents before children.
    ///
    /// The post-order walk pushes a cell only after its whole subtree,
    /// so reversing the list puts every cell before everything it
    /// references, including cells shared between branches.
    fn collect_cells_topological(&self) -> Vec<Arc<Cell>> {
        let mut cells: Vec<Arc<Cell>> = Vec::new();
        let mut visited: HashMap<[u8; 32], usize> = HashMap::new();

        for root in &self.roots {
            Self::collect_cell_recursive(root, &mut cells, &mut visited);
        }

        cells.reverse();
        cells
    }

    fn collect_cell_recursive(
        cell: &Arc<Cell>,
        cells: &mut Vec<Arc<Cell>>,
        visited: &mut HashMap<[u8; 32], usize>,
    ) {
        let hash = cell.hash();
        if visited.contains_key(&hash) {
            return;
        }

        for reference in cell.references() {
            Self::collect_cell_recursive(reference, cells, visited);
        }

        visited.insert(hash, cells.len());
        cells.push(cell.clone());
    }

    fn serialize_cell(
        cell: &Cell,
        hash_to_index: &HashMap<[u8; 32], usize>,
    ) -> CellResult<Vec<u8>> {
        let mut result = Vec::new();

        let (d1, d2) = cell.descriptors();
        result.push(d1);
        result.push(d2);
        result.extend_from_slice(&cell.data_with_completion_tag());

        let ref_size = Self::bytes_needed(hash_to_index.len());
        for reference in cell.references() {
            let idx = hash_to_index
                .get(&reference.hash())
                .ok_or_else(|| CellError::InvalidBoc("Reference not found".to_string()))?;
            Self::write_uint(&mut result, *idx as u64, ref_size);
        }

        Ok(result)
    }

    fn parse_cells(data: &[u8], cell_count: usize, size_bytes: usize) -> CellResult<Vec<Arc<Cell>>> {
        let mut offset = 0;

        // First pass: raw data and reference indices per cell.
        let mut cell_infos: Vec<(Vec<u8>, usize, Vec<usize>)> = Vec::with_capacity(cell_count);

        for _ in 0..cell_count {
            if offset + 2 > data.len() {
                return Err(CellError::UnexpectedEof);
            }

            let d1 = data[offset];
            let d2 = data[offset + 1];
            offset += 2;

            let refs_count = (d1 & 0x07) as usize;
            if (d1 & 0x08) != 0 {
                return Err(CellError::InvalidBoc(
                    "Exotic cells are not supported".to_string(),
                ));
            }

            let data_len = (d2 as usize).div_ceil(2);
            if offset + data_len > data.len() {
                return Err(CellError::UnexpectedEof);
            }

            let cell_data = data[offset..offset + data_len].to_vec();
            offset += data_len;

            let mut ref_indices = Vec::with_capacity(refs_count);
            for _ in 0..refs_count {
                ref_indices.push(Self::read_uint(data, &mut offset, size_bytes)? as usize);
            }

            // Odd d2 means the last byte carries a completion tag.
            let bit_len = if d2.is_multiple_of(2) {
                data_len * 8
            } else {
                Self::find_bit_len(&cell_data)
            };

            cell_infos.push((cell_data, bit_len, ref_indices));
        }

        // Serializers differ in direction: some write roots first (refs
        // point to higher indices), some children first. Detect from the
        // first cell that has references and build in dependency order.
        let refs_point_higher = cell_infos
            .iter()
            .enumerate()
            .find_map(|(i, (_, _, refs))| {
                if refs.is_empty() {
                    None
                } else {
                    Some(refs.iter().all(|&r| r > i))
                }
            })
            .unwrap_or(false);

        let iteration_order: Vec<usize> = if refs_point_higher {
            (0..cell_count).rev().collect()
        } else {
            (0..cell_count).collect()
        };

        let mut cells: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
        for i in iteration_order {
            let (data, bit_len, ref_indices) = &cell_infos[i];
            let clean_data = Self::remove_completion_tag(data, *bit_len);

            let references: Vec<Arc<Cell>> = ref_indices
                .iter()
                .map(|&idx| cells.get(idx).and_then(|c| c.clone()).ok_or(CellError::CellNotFound(idx)))
                .collect::<CellResult<Vec<_>>>()?;

            cells[i] = Some(Arc::new(Cell::new(clean_data, *bit_len, references)?));
        }

        cells
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.ok_or(CellError::CellNotFound(i)))
            .collect()
    }

    /// Recover the bit length of a tagged (non-byte-aligned) cell.
    ///
    /// The completion tag is the lowest set bit of the last non-zero byte.
    fn find_bit_len(data: &[u8]) -> usize {
        for i in (0..data.len()).rev() {
            let byte = data[i];
            if byte != 0 {
                let trailing_zeros = byte.trailing_zeros() as usize;
                return (i + 1) * 8 - trailing_zeros - 1;
            }
        }
        0
    }

    fn remove_completion_tag(data: &[u8], bit_len: usize) -> Vec<u8> {
        if data.is_empty() || bit_len == 0 {
            return Vec::new();
        }

        let byte_len = bit_len.div_ceil(8);
        let mut result = data[..byte_len.min(data.len())].to_vec();

        let remainder = bit_len % 8;
        if remainder != 0
            && let Some(last) = result.last_mut()
        {
            let mask = !((1u8 << (8 - remainder)) - 1);
            *last &= mask;
        }

        result
    }

    fn bytes_needed(n: usize) -> usize {
        if n == 0 {
            1
        } else {
            ((64 - (n as u64).leading_zeros()) + 7) as usize / 8
        }
    }

    fn write_uint(buf: &mut Vec<u8>, value: u64, bytes: usize) {
        for i in (0..bytes).rev() {
            buf.push((value >> (i * 8)) as u8);
        }
    }

    fn read_uint(data: &[u8], offset: &mut usize, bytes: usize) -> CellResult<u64> {
        if *offset + bytes > data.len() {
            return Err(CellError::UnexpectedEof);
        }

        let mut result: u64 = 0;
        for i in 0..bytes {
            result = (result << 8) | (data[*offset + i] as u64);
        }
        *offset += bytes;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellBuilder;

    #[test]
    fn test_empty_cell_boc() {
        let cell = CellBuilder::new().build().unwrap();
        let boc = BagOfCells::from_root(cell);

        let serialized = boc.serialize().unwrap();
        let deserialized = BagOfCells::deserialize(&serialized).unwrap();

        let root = deserialized.single_root().unwrap();
        assert_eq!(root.bit_len(), 0);
        assert_eq!(root.reference_count(), 0);
    }

    #[test]
    fn test_cell_with_refs_boc() {
        let mut child1_builder = CellBuilder::new();
        child1_builder.store_u32(0x11111111).unwrap();
        let child1 = Arc::new(child1_builder.build().unwrap());

        let mut child2_builder = CellBuilder::new();
        child2_builder.store_u32(0x22222222).unwrap();
        let child2 = Arc::new(child2_builder.build().unwrap());

        let mut parent_builder = CellBuilder::new();
        parent_builder.store_u32(0xCAFEBABE).unwrap();
        parent_builder.store_ref(child1).unwrap();
        parent_builder.store_ref(child2).unwrap();
        let parent = parent_builder.build().unwrap();
        let original_hash = parent.hash();

        let boc = BagOfCells::from_root(parent);
        let serialized = boc.serialize().unwrap();
        let deserialized = BagOfCells::deserialize(&serialized).unwrap();

        let root = deserialized.single_root().unwrap();
        assert_eq!(root.hash(), original_hash);
        assert_eq!(root.reference_count(), 2);
    }

    #[test]
    fn test_serialized_root_first_refs_forward() {
        // root -> mid -> leaf, root -> leaf: the leaf is shared, so the
        // ordering must hold across branches, not just down one path.
        let mut leaf_builder = CellBuilder::new();
        leaf_builder.store_u32(0x11111111).unwrap();
        let leaf = Arc::new(leaf_builder.build().unwrap());

        let mut mid_builder = CellBuilder::new();
        mid_builder.store_u32(0x22222222).unwrap();
        mid_builder.store_ref(leaf.clone()).unwrap();
        let mid = Arc::new(mid_builder.build().unwrap());

        let mut root_builder = CellBuilder::new();
        root_builder.store_u32(0xCAFEBABE).unwrap();
        root_builder.store_ref(mid).unwrap();
        root_builder.store_ref(leaf).unwrap();
        let root = root_builder.build().unwrap();
        let root_hash = root.hash();

        let bytes = BagOfCells::from_root(root)
            .serialize_with_options(false)
            .unwrap();

        // Header: magic(4) flags(1) off_bytes(1) then counts. Small
        // trees use one byte per count and offset.
        assert_eq!(bytes[4] & 0x07, 1, "size_bytes");
        assert_eq!(bytes[5], 1, "off_bytes");
        let cell_count = bytes[6] as usize;
        assert_eq!(cell_count, 3);
        assert_eq!(bytes[10], 0, "root index");

        // Walk the cell records: every reference must point to a higher
        // index than the referencing cell.
        let mut offset = 11;
        for index in 0..cell_count {
            let d1 = bytes[offset];
            let d2 = bytes[offset + 1];
            let refs = (d1 & 0x07) as usize;
            offset += 2 + (d2 as usize).div_ceil(2);
            for _ in 0..refs {
                let target = bytes[offset] as usize;
                assert!(
                    target > index,
                    "cell {} references {} (backward)",
                    index,
                    target
                );
                offset += 1;
            }
        }
        assert_eq!(offset, bytes.len());

        // The first cell record is the root itself.
        assert_eq!(&bytes[13..17], &0xCAFEBABEu32.to_be_bytes());

        let parsed = BagOfCells::deserialize(&bytes).unwrap();
        assert_eq!(parsed.single_root().unwrap().hash(), root_hash);
    }

    #[test]
    fn test_unaligned_cell_roundtrip() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b1011, 4).unwrap();
        let cell = builder.build().unwrap();
        let original_hash = cell.hash();

        let serialized = BagOfCells::from_root(cell).serialize().unwrap();
        let deserialized = BagOfCells::deserialize(&serialized).unwrap();

        let root = deserialized.single_root().unwrap();
        assert_eq!(root.bit_len(), 4);
        assert_eq!(root.hash(), original_hash);
    }

    #[test]
    fn test_base64_roundtrip() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let cell = builder.build().unwrap();
        let original_hash = cell.hash();

        let boc = BagOfCells::from_root(cell);
        let base64 = boc.serialize_to_base64().unwrap();

        let deserialized = BagOfCells::deserialize_from_base64(&base64).unwrap();
        let root = deserialized.single_root().unwrap();
        assert_eq!(root.hash(), original_hash);
    }

    #[test]
    fn test_corrupted_crc_rejected() {
        let mut builder = CellBuilder::new();
        builder.store_u32(0xDEADBEEF).unwrap();
        let cell = builder.build().unwrap();

        let mut serialized = BagOfCells::from_root(cell).serialize().unwrap();
        let last = serialized.len() - 1;
        serialized[last] ^= 0xFF;

        assert!(matches!(
            BagOfCells::deserialize(&serialized),
            Err(CellError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let data = [0u8; 16];
        assert!(matches!(
            BagOfCells::deserialize(&data),
            Err(CellError::InvalidBoc(_))
        ));
    }

    #[test]
    fn test_exotic_cell_rejected() {
        // Hand-built BoC whose single cell has the exotic bit set in d1.
        let mut data = Vec::new();
        data.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());
        data.push(0x01); // flags: no crc, size_bytes 1
        data.push(0x01); // off_bytes
        data.push(1); // cells
        data.push(1); // roots
        data.push(0); // absent
        data.push(2); // total cells size
        data.push(0); // root index
        data.push(0x08); // d1: exotic, no refs
        data.push(0x00); // d2

        assert!(matches!(
            BagOfCells::deserialize(&data),
            Err(CellError::InvalidBoc(_))
        ));
    }

    #[test]
    fn test_bytes_needed() {
        assert_eq!(BagOfCells::bytes_needed(0), 1);
        assert_eq!(BagOfCells::bytes_needed(255), 1);
        assert_eq!(BagOfCells::bytes_needed(256), 2);
        assert_eq!(BagOfCells::bytes_needed(65536), 3);
    }
}
