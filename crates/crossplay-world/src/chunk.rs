use std::collections::HashMap;
use thiserror::Error;

/// Number of vertical sub-chunks in a column.
pub const SECTION_COUNT: usize = 16;
/// Cells in one 16x16x16 sub-chunk.
pub const SECTION_VOLUME: usize = 16 * 16 * 16;
/// Nibble arrays (block data, light) hold two cells per byte.
pub const NIBBLE_ARRAY_LEN: usize = SECTION_VOLUME / 2;
/// One biome id per horizontal cell.
pub const BIOME_ARRAY_LEN: usize = 16 * 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("{what} array must be exactly {expected} bytes, got {actual}")]
    InvalidArrayLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("coordinates ({x}, {y}, {z}) are outside the chunk")]
    OutOfBounds { x: usize, y: usize, z: usize },
}

/// Cell index inside a sub-chunk. Same y-z-x order the Desktop client uses,
/// so light arrays can be sent without reordering.
#[inline]
fn cell_index(x: usize, y: usize, z: usize) -> usize {
    (y << 8) | (z << 4) | x
}

#[inline]
fn get_nibble(array: &[u8], index: usize) -> u8 {
    let byte = array[index >> 1];
    if index & 1 == 0 {
        byte & 0x0F
    } else {
        byte >> 4
    }
}

#[inline]
fn set_nibble(array: &mut [u8], index: usize, value: u8) {
    let byte = &mut array[index >> 1];
    if index & 1 == 0 {
        *byte = (*byte & 0xF0) | (value & 0x0F);
    } else {
        *byte = (*byte & 0x0F) | ((value & 0x0F) << 4);
    }
}

fn check_len(what: &'static str, array: &[u8], expected: usize) -> Result<(), ChunkError> {
    if array.len() != expected {
        return Err(ChunkError::InvalidArrayLength {
            what,
            expected,
            actual: array.len(),
        });
    }
    Ok(())
}

/// A 16x16x16 cube of native block ids, block data, block light and sky light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChunk {
    ids: Vec<u8>,
    data: Vec<u8>,
    block_light: Vec<u8>,
    sky_light: Vec<u8>,
}

impl Default for SubChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl SubChunk {
    /// An all-air sub-chunk with no block light and full sky light.
    pub fn new() -> Self {
        SubChunk {
            ids: vec![0; SECTION_VOLUME],
            data: vec![0; NIBBLE_ARRAY_LEN],
            block_light: vec![0; NIBBLE_ARRAY_LEN],
            sky_light: vec![0xFF; NIBBLE_ARRAY_LEN],
        }
    }

    /// Builds a sub-chunk from raw storage arrays, all in y-z-x order.
    pub fn from_arrays(
        ids: Vec<u8>,
        data: Vec<u8>,
        block_light: Vec<u8>,
        sky_light: Vec<u8>,
    ) -> Result<Self, ChunkError> {
        check_len("block id", &ids, SECTION_VOLUME)?;
        check_len("block data", &data, NIBBLE_ARRAY_LEN)?;
        check_len("block light", &block_light, NIBBLE_ARRAY_LEN)?;
        check_len("sky light", &sky_light, NIBBLE_ARRAY_LEN)?;

        Ok(SubChunk {
            ids,
            data,
            block_light,
            sky_light,
        })
    }

    /// True when every cell is air. Empty sub-chunks are never sent.
    pub fn is_empty(&self) -> bool {
        self.ids.iter().all(|&id| id == 0)
    }

    pub fn block_id(&self, x: usize, y: usize, z: usize) -> u8 {
        self.ids[cell_index(x, y, z)]
    }

    pub fn block_data(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.data, cell_index(x, y, z))
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u8, data: u8) {
        let index = cell_index(x, y, z);
        self.ids[index] = id;
        set_nibble(&mut self.data, index, data);
    }

    pub fn block_light(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.block_light, cell_index(x, y, z))
    }

    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        set_nibble(&mut self.block_light, cell_index(x, y, z), level);
    }

    pub fn sky_light(&self, x: usize, y: usize, z: usize) -> u8 {
        get_nibble(&self.sky_light, cell_index(x, y, z))
    }

    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        set_nibble(&mut self.sky_light, cell_index(x, y, z), level);
    }

    /// Raw block light nibbles, 2048 bytes.
    pub fn block_light_array(&self) -> &[u8] {
        &self.block_light
    }

    /// Raw sky light nibbles, 2048 bytes.
    pub fn sky_light_array(&self) -> &[u8] {
        &self.sky_light
    }
}

/// One vertical stack of sub-chunks at a fixed (x, z), plus its biome ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkColumn {
    x: i32,
    z: i32,
    sections: [Option<SubChunk>; SECTION_COUNT],
    biomes: [u8; BIOME_ARRAY_LEN],
}

impl ChunkColumn {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkColumn {
            x,
            z,
            sections: Default::default(),
            biomes: [1; BIOME_ARRAY_LEN], // plains
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn section(&self, section_y: usize) -> Option<&SubChunk> {
        self.sections.get(section_y)?.as_ref()
    }

    /// Returns the sub-chunk at `section_y`, allocating an empty one if absent.
    pub fn section_mut(&mut self, section_y: usize) -> Option<&mut SubChunk> {
        let slot = self.sections.get_mut(section_y)?;
        Some(slot.get_or_insert_with(SubChunk::new))
    }

    /// Every sub-chunk slot in ascending vertical order; absent slots are `None`.
    pub fn sub_chunks(&self) -> impl Iterator<Item = (usize, Option<&SubChunk>)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(index, section)| (index, section.as_ref()))
    }

    /// Sets a block at column coordinates (`y` in 0..256).
    pub fn set_block(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        id: u8,
        data: u8,
    ) -> Result<(), ChunkError> {
        if x >= 16 || z >= 16 || y >= SECTION_COUNT * 16 {
            return Err(ChunkError::OutOfBounds { x, y, z });
        }
        if let Some(section) = self.section_mut(y >> 4) {
            section.set_block(x, y & 15, z, id, data);
        }
        Ok(())
    }

    /// Block id at column coordinates; air outside the column or in absent sections.
    pub fn block_id(&self, x: usize, y: usize, z: usize) -> u8 {
        if x >= 16 || z >= 16 {
            return 0;
        }
        self.section(y >> 4)
            .map(|section| section.block_id(x, y & 15, z))
            .unwrap_or(0)
    }

    pub fn set_biome(&mut self, x: usize, z: usize, biome_id: u8) {
        if x < 16 && z < 16 {
            self.biomes[(z << 4) | x] = biome_id;
        }
    }

    pub fn biome(&self, x: usize, z: usize) -> Option<u8> {
        if x < 16 && z < 16 {
            Some(self.biomes[(z << 4) | x])
        } else {
            None
        }
    }

    pub fn biomes(&self) -> &[u8; BIOME_ARRAY_LEN] {
        &self.biomes
    }
}

/// Read access to the engine's loaded chunks. Lookups never generate terrain:
/// a chunk that is not loaded is simply `None`.
pub trait ChunkProvider {
    fn chunk(&self, x: i32, z: i32) -> Option<&ChunkColumn>;
}

/// Chunk provider backed by a hash map of loaded columns.
#[derive(Debug, Default)]
pub struct MemoryChunkProvider {
    chunks: HashMap<(i32, i32), ChunkColumn>,
}

impl MemoryChunkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: ChunkColumn) -> Option<ChunkColumn> {
        self.chunks.insert((column.x(), column.z()), column)
    }

    pub fn remove(&mut self, x: i32, z: i32) -> Option<ChunkColumn> {
        self.chunks.remove(&(x, z))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ChunkProvider for MemoryChunkProvider {
    fn chunk(&self, x: i32, z: i32) -> Option<&ChunkColumn> {
        self.chunks.get(&(x, z))
    }
}
