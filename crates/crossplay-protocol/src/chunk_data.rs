use crate::binary::{self, CodecError};
use crate::packet::*;
use crossplay_world::chunk::{
    ChunkColumn, SubChunk, BIOME_ARRAY_LEN, NIBBLE_ARRAY_LEN, SECTION_COUNT, SECTION_VOLUME,
};
use crossplay_world::translate::BlockTranslator;
use std::collections::HashMap;
use tracing::debug;

pub const BITS_PER_BLOCK: u8 = 8;
/// Largest palette addressable with `BITS_PER_BLOCK`.
pub const MAX_PALETTE_LEN: usize = 1 << BITS_PER_BLOCK;
/// Palette indices per packed 64-bit long.
const CELLS_PER_LONG: usize = 64 / BITS_PER_BLOCK as usize;
/// Packed data array length of one section, counted in longs.
pub const DATA_ARRAY_LONGS: usize = SECTION_VOLUME / CELLS_PER_LONG;

/// Serialized column, ready for `ChunkDataPacket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    /// Bit `n` is set when sub-section `n` is present in `data`.
    pub bitmask: u16,
    pub data: Vec<u8>,
    pub biomes: Vec<u8>,
    pub ground_up: bool,
}

/// Insertion-ordered palette for one section.
#[derive(Debug, Default)]
pub struct Palette {
    entries: Vec<u32>,
    lookup: HashMap<u32, u8>,
    overflowed: usize,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `value`, adding it if it is new. Once the palette
    /// is full, new values map to index 0.
    pub fn index_of(&mut self, value: u32) -> u8 {
        if let Some(&index) = self.lookup.get(&value) {
            return index;
        }
        if self.entries.len() == MAX_PALETTE_LEN {
            self.overflowed += 1;
            return 0;
        }
        let index = self.entries.len() as u8;
        self.entries.push(value);
        self.lookup.insert(value, index);
        index
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups that did not fit in the palette.
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }
}

/// Writes one row of 16 palette indices, reversing each run of 8.
fn pack_row(row: &[u8; 16], out: &mut Vec<u8>) {
    for run in row.chunks(CELLS_PER_LONG) {
        out.extend(run.iter().rev());
    }
}

/// Byte offset of cell (x, y, z) in a packed section data array.
fn packed_offset(x: usize, y: usize, z: usize) -> usize {
    let row = (y << 8) | (z << 4);
    let run = x - x % CELLS_PER_LONG;
    row + run + (CELLS_PER_LONG - 1 - x % CELLS_PER_LONG)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkSerializer {
    translator: BlockTranslator,
}

impl ChunkSerializer {
    pub fn new(translator: BlockTranslator) -> Self {
        ChunkSerializer { translator }
    }

    pub fn translator(&self) -> &BlockTranslator {
        &self.translator
    }

    /// Serializes `column`. Sky light is only written when `overworld` is set.
    pub fn serialize(&self, column: &ChunkColumn, overworld: bool) -> ChunkPayload {
        let mut bitmask = 0u16;
        let mut data = Vec::new();

        for (section_y, section) in column.sub_chunks() {
            let section = match section {
                Some(section) if !section.is_empty() => section,
                _ => continue,
            };
            bitmask |= 1 << section_y;

            let overflowed = self.write_section(section, overworld, &mut data);
            if overflowed > 0 {
                debug!(
                    chunk_x = column.x(),
                    chunk_z = column.z(),
                    section = section_y,
                    overflowed,
                    "section palette overflow, extra values mapped to index 0"
                );
            }
        }

        ChunkPayload {
            bitmask,
            data,
            biomes: column.biomes().to_vec(),
            ground_up: true,
        }
    }

    /// Appends one section and returns how many cells overflowed the palette.
    fn write_section(&self, section: &SubChunk, overworld: bool, out: &mut Vec<u8>) -> usize {
        let mut palette = Palette::new();
        let mut packed = Vec::with_capacity(SECTION_VOLUME);

        for y in 0..16 {
            for z in 0..16 {
                let mut row = [0u8; 16];
                for (x, cell) in row.iter_mut().enumerate() {
                    let (id, data) = self
                        .translator
                        .to_desktop(section.block_id(x, y, z), section.block_data(x, y, z));
                    *cell = palette.index_of(((id as u32) << 4) | data as u32);
                }
                pack_row(&row, &mut packed);
            }
        }

        binary::write_byte(out, BITS_PER_BLOCK);
        binary::write_varint(out, palette.len() as u32);
        for &entry in palette.entries() {
            binary::write_varint(out, entry);
        }
        binary::write_varint(out, (packed.len() / CELLS_PER_LONG) as u32);
        out.extend_from_slice(&packed);
        out.extend_from_slice(section.block_light_array());
        if overworld {
            out.extend_from_slice(section.sky_light_array());
        }

        palette.overflowed()
    }
}

/// A section read back from a serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    pub palette: Vec<u32>,
    pub packed: Vec<u8>,
    pub block_light: Vec<u8>,
    pub sky_light: Option<Vec<u8>>,
}

impl ChunkSection {
    /// Palette value `(id << 4) | data` of the cell at (x, y, z).
    pub fn value_at(&self, x: usize, y: usize, z: usize) -> Option<u32> {
        let index = *self.packed.get(packed_offset(x, y, z))?;
        self.palette.get(index as usize).copied()
    }

    /// Desktop (id, data) of the cell at (x, y, z).
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<(u8, u8)> {
        self.value_at(x, y, z)
            .map(|value| ((value >> 4) as u8, (value & 0x0F) as u8))
    }
}

/// Splits `data` back into the sections named by `bitmask`.
pub fn decode_sections(
    data: &[u8],
    bitmask: u16,
    overworld: bool,
) -> Result<Vec<(usize, ChunkSection)>> {
    let mut buffer = PacketBuffer::from_bytes(data.to_vec());
    let mut sections = Vec::new();

    for section_y in 0..SECTION_COUNT {
        if bitmask & (1 << section_y) == 0 {
            continue;
        }
        let bits_per_block = buffer.read_u8()?;
        if bits_per_block != BITS_PER_BLOCK {
            return Err(CodecError::InvalidValue(format!(
                "unsupported bits per block {}",
                bits_per_block
            )));
        }
        let palette_len = buffer.read_varint()?;
        if palette_len < 0 || palette_len as usize > MAX_PALETTE_LEN {
            return Err(CodecError::InvalidValue(format!(
                "palette length {} out of range",
                palette_len
            )));
        }
        let mut palette = Vec::with_capacity(palette_len as usize);
        for _ in 0..palette_len {
            palette.push(buffer.read_varint()? as u32);
        }
        let longs = buffer.read_varint()?;
        if longs as usize != DATA_ARRAY_LONGS {
            return Err(CodecError::InvalidValue(format!(
                "data array of {} longs, expected {}",
                longs, DATA_ARRAY_LONGS
            )));
        }
        let packed = buffer.read_bytes_raw(SECTION_VOLUME)?;
        let block_light = buffer.read_bytes_raw(NIBBLE_ARRAY_LEN)?;
        let sky_light = if overworld {
            Some(buffer.read_bytes_raw(NIBBLE_ARRAY_LEN)?)
        } else {
            None
        };

        sections.push((
            section_y,
            ChunkSection {
                palette,
                packed,
                block_light,
                sky_light,
            },
        ));
    }

    if buffer.remaining() != 0 {
        return Err(CodecError::InvalidValue(format!(
            "{} trailing bytes after sections",
            buffer.remaining()
        )));
    }
    Ok(sections)
}

/// Chunk Data (clientbound). Block entities are never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDataPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub ground_up: bool,
    pub bitmask: i32,
    pub data: Vec<u8>,
    /// Present only for ground-up chunks.
    pub biomes: Option<Vec<u8>>,
}

impl ChunkDataPacket {
    pub fn from_payload(chunk_x: i32, chunk_z: i32, payload: ChunkPayload) -> Self {
        ChunkDataPacket {
            chunk_x,
            chunk_z,
            ground_up: payload.ground_up,
            bitmask: payload.bitmask as i32,
            data: payload.data,
            biomes: payload.ground_up.then_some(payload.biomes),
        }
    }

    /// Checks if a section is present in the packet
    pub fn has_section(&self, y: u8) -> bool {
        y < SECTION_COUNT as u8 && (self.bitmask & (1 << y)) != 0
    }
}

impl Packet for ChunkDataPacket {
    fn packet_id() -> i32 {
        0x20
    }

    fn read_from_buffer(buffer: &mut PacketBuffer) -> Result<Self> {
        let chunk_x = buffer.read_i32()?;
        let chunk_z = buffer.read_i32()?;
        let ground_up = buffer.read_bool()?;
        let bitmask = buffer.read_varint()?;

        let size = buffer.read_varint()?;
        let biome_len = if ground_up { BIOME_ARRAY_LEN } else { 0 };
        if size < 0 || (size as usize) < biome_len {
            return Err(CodecError::InvalidValue(format!("chunk data size {}", size)));
        }
        let data = buffer.read_bytes_raw(size as usize - biome_len)?;
        let biomes = if ground_up {
            Some(buffer.read_bytes_raw(BIOME_ARRAY_LEN)?)
        } else {
            None
        };

        let block_entities = buffer.read_varint()?;
        if block_entities != 0 {
            return Err(CodecError::InvalidValue(format!(
                "{} block entities, none expected",
                block_entities
            )));
        }

        Ok(ChunkDataPacket {
            chunk_x,
            chunk_z,
            ground_up,
            bitmask,
            data,
            biomes,
        })
    }

    fn write_to_buffer(&self, buffer: &mut PacketBuffer) {
        buffer.write_varint(Self::packet_id());

        buffer.write_i32(self.chunk_x);
        buffer.write_i32(self.chunk_z);
        buffer.write_bool(self.ground_up);
        buffer.write_varint(self.bitmask);

        let biomes = self.biomes.as_deref().unwrap_or_default();
        buffer.write_varint((self.data.len() + biomes.len()) as i32);
        buffer.write_bytes_raw(&self.data);
        buffer.write_bytes_raw(biomes);

        // Block entities
        buffer.write_varint(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_column() -> ChunkColumn {
        let mut column = ChunkColumn::new(3, -2);
        for x in 0..16 {
            for z in 0..16 {
                column.set_block(x, 0, z, 7, 0).unwrap();
                column.set_block(x, 1, z, 3, 0).unwrap();
                column.set_block(x, 2, z, 2, 0).unwrap();
                column.set_biome(x, z, 1);
            }
        }
        column.set_block(5, 40, 9, 35, 14).unwrap();
        column
    }

    #[test]
    fn test_bitmask_skips_empty_sections() {
        let payload = ChunkSerializer::default().serialize(&sample_column(), true);
        assert_eq!(payload.bitmask, 0b0000_0000_0000_0101);
        assert!(payload.ground_up);
        assert_eq!(payload.biomes.len(), BIOME_ARRAY_LEN);
        assert!(payload.biomes.iter().all(|&biome| biome == 1));
    }

    #[test]
    fn test_empty_column_has_no_data() {
        let payload = ChunkSerializer::default().serialize(&ChunkColumn::new(0, 0), true);
        assert_eq!(payload.bitmask, 0);
        assert!(payload.data.is_empty());
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let serializer = ChunkSerializer::default();
        let column = sample_column();
        let first = serializer.serialize(&column, true);
        let second = serializer.serialize(&column, true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_palette_is_insertion_ordered_and_compact() {
        let payload = ChunkSerializer::default().serialize(&sample_column(), true);
        let sections = decode_sections(&payload.data, payload.bitmask, true).unwrap();
        assert_eq!(sections.len(), 2);

        let (section_y, bottom) = &sections[0];
        assert_eq!(*section_y, 0);
        // air at (0,3,0) is the first cell after the three filled layers
        assert_eq!(bottom.palette, vec![7 << 4, 3 << 4, 2 << 4, 0]);

        let (section_y, upper) = &sections[1];
        assert_eq!(*section_y, 2);
        assert_eq!(upper.palette, vec![0, (35 << 4) | 14]);
        assert_eq!(upper.block_at(5, 8, 9), Some((35, 14)));
        assert_eq!(upper.block_at(6, 8, 9), Some((0, 0)));
    }

    #[test]
    fn test_palette_has_no_duplicates() {
        let mut column = ChunkColumn::new(0, 0);
        for y in 0..16 {
            for x in 0..16 {
                column.set_block(x, y, 0, (x % 4) as u8 + 1, 0).unwrap();
            }
        }
        let payload = ChunkSerializer::default().serialize(&column, false);
        let sections = decode_sections(&payload.data, payload.bitmask, false).unwrap();
        let palette = &sections[0].1.palette;
        let mut deduplicated = palette.clone();
        deduplicated.sort_unstable();
        deduplicated.dedup();
        assert_eq!(deduplicated.len(), palette.len());
        assert_eq!(palette.len(), 5);
    }

    #[test]
    fn test_sky_light_only_in_overworld() {
        let serializer = ChunkSerializer::default();
        let column = sample_column();
        let overworld = serializer.serialize(&column, true);
        let nether = serializer.serialize(&column, false);

        assert_eq!(
            overworld.data.len() - nether.data.len(),
            2 * NIBBLE_ARRAY_LEN
        );
        // bpb, palette length, entries, long count (2 bytes), data, block light
        let bottom = 1 + 1 + 4 + 2 + SECTION_VOLUME + NIBBLE_ARRAY_LEN;
        let upper = 1 + 1 + (1 + 2) + 2 + SECTION_VOLUME + NIBBLE_ARRAY_LEN;
        assert_eq!(nether.data.len(), bottom + upper);

        let sections = decode_sections(&nether.data, nether.bitmask, false).unwrap();
        assert!(sections.iter().all(|(_, section)| section.sky_light.is_none()));
        let sections = decode_sections(&overworld.data, overworld.bitmask, true).unwrap();
        assert!(sections
            .iter()
            .all(|(_, section)| section.sky_light.as_ref().map(Vec::len) == Some(NIBBLE_ARRAY_LEN)));
    }

    #[test]
    fn test_runs_of_eight_are_reversed() {
        let mut column = ChunkColumn::new(0, 0);
        for x in 0..16 {
            column.set_block(x, 0, 0, x as u8 + 1, 0).unwrap();
        }
        let payload = ChunkSerializer::default().serialize(&column, false);
        let sections = decode_sections(&payload.data, payload.bitmask, false).unwrap();
        let section = &sections[0].1;

        // palette index n belongs to block n + 1, in x order
        let expected: Vec<u8> = (0..8u8).rev().chain((8..16u8).rev()).collect();
        assert_eq!(&section.packed[..16], expected.as_slice());
        for x in 0..16 {
            assert_eq!(section.block_at(x, 0, 0), Some((x as u8 + 1, 0)));
        }
    }

    #[test]
    fn test_blocks_are_translated() {
        let mut column = ChunkColumn::new(0, 0);
        column.set_block(0, 0, 0, 95, 0).unwrap();
        let payload = ChunkSerializer::default().serialize(&column, true);
        let sections = decode_sections(&payload.data, payload.bitmask, true).unwrap();
        assert_eq!(sections[0].1.block_at(0, 0, 0), Some((166, 0)));
    }

    #[test]
    fn test_light_arrays_copied() {
        let mut column = ChunkColumn::new(0, 0);
        column.set_block(1, 1, 1, 1, 0).unwrap();
        let section = column.section_mut(0).unwrap();
        section.set_block_light(1, 1, 1, 14);
        section.set_sky_light(1, 1, 1, 9);
        let expected_block = section.block_light_array().to_vec();
        let expected_sky = section.sky_light_array().to_vec();

        let payload = ChunkSerializer::default().serialize(&column, true);
        let sections = decode_sections(&payload.data, payload.bitmask, true).unwrap();
        assert_eq!(sections[0].1.block_light, expected_block);
        assert_eq!(sections[0].1.sky_light.as_deref(), Some(expected_sky.as_slice()));
    }

    #[test]
    fn test_palette_overflow_maps_to_zero() {
        let mut palette = Palette::new();
        for value in 0..MAX_PALETTE_LEN as u32 {
            assert_eq!(palette.index_of(value + 1) as u32, value);
        }
        assert_eq!(palette.index_of(10_000), 0);
        assert_eq!(palette.len(), MAX_PALETTE_LEN);
        assert_eq!(palette.overflowed(), 1);
        assert_eq!(palette.index_of(3), 2);
    }

    #[test]
    fn test_packet_layout() {
        let payload = ChunkSerializer::default().serialize(&sample_column(), false);
        let data_len = payload.data.len();
        let packet = ChunkDataPacket::from_payload(3, -2, payload.clone());
        let bytes = packet.to_bytes();

        let mut buffer = PacketBuffer::from_bytes(bytes);
        assert_eq!(buffer.read_varint().unwrap(), 0x20);
        assert_eq!(buffer.read_i32().unwrap(), 3);
        assert_eq!(buffer.read_i32().unwrap(), -2);
        assert!(buffer.read_bool().unwrap());
        assert_eq!(buffer.read_varint().unwrap(), 0b101);
        assert_eq!(
            buffer.read_varint().unwrap() as usize,
            data_len + BIOME_ARRAY_LEN
        );

        let mut buffer = PacketBuffer::from_bytes(packet.to_bytes());
        buffer.read_varint().unwrap();
        let decoded = ChunkDataPacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(decoded.biomes, Some(payload.biomes));
        assert!(decoded.has_section(2));
        assert!(!decoded.has_section(1));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let payload = ChunkSerializer::default().serialize(&sample_column(), true);
        let truncated = &payload.data[..payload.data.len() - 1];
        assert_matches!(
            decode_sections(truncated, payload.bitmask, true),
            Err(CodecError::UnexpectedEof { .. })
        );
    }
}
