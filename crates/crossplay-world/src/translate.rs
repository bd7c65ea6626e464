/// Translation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToDesktop,
    ToNative,
}

/// (native id, desktop id) pairs that are the same block under a different id.
const ID_REMAP: &[(u8, u8)] = &[
    (95, 166),  // invisible bedrock -> barrier
    (125, 158), // dropper
    (126, 157), // activator rail
    (157, 125), // double wooden slab
    (158, 126), // wooden slab
    (188, 210), // repeating command block
    (189, 211), // chain command block
    (198, 208), // grass path
    (208, 198), // end rod
    (240, 199), // chorus plant
    (241, 95),  // stained glass
    (244, 207), // beetroot
    (251, 218), // observer
    (252, 255), // structure block
    (236, 251), // concrete
    (237, 252), // concrete powder
    // Glazed terracotta: the native ids are not in colour order.
    (220, 235),
    (221, 236),
    (222, 237),
    (223, 238),
    (224, 239),
    (225, 240),
    (226, 241),
    (227, 242),
    (228, 243),
    (229, 244),
    (219, 245),
    (231, 246),
    (232, 247),
    (233, 248),
    (234, 249),
    (235, 250),
];

/// Native-only blocks that convert one way and have no reverse mapping.
const NATIVE_ONE_WAY: &[(u8, (u8, u8))] = &[
    (243, (3, 2)),  // podzol -> dirt:podzol
    (246, (49, 0)), // glowing obsidian
    (247, (49, 0)), // nether reactor core
];

/// Native ids with no Desktop counterpart.
const NATIVE_ONLY: &[u8] = &[
    190, 191, 192, 199, 202, 204, 205, 210, 211, 212, 230, 238, 239, 242, 245, 248, 249, 250, 253,
    254, 255,
];

/// Desktop ids with no native counterpart.
const DESKTOP_ONLY: &[u8] = &[253, 254];

const NATIVE_FENCE: u8 = 85;
const NATIVE_SHULKER_BOX: u8 = 218;
const DESKTOP_SHULKER_BOX_FIRST: u8 = 219;
const DESKTOP_SHULKER_BOX_LAST: u8 = 234;
const DESKTOP_SHULKER_FACING_UP: u8 = 1;

/// Native fence data (wood type) -> Desktop fence id.
const FENCE_IDS: [u8; 6] = [85, 188, 189, 190, 192, 191];

/// Swaps the quartz (6) and nether brick (7) slab variants, keeping the
/// upper-half bit.
fn remap_stone_slab(data: u8) -> u8 {
    match data & 0x07 {
        6 => (data & 0x08) | 7,
        7 => (data & 0x08) | 6,
        _ => data,
    }
}

/// Trapdoor facing is numbered in the opposite order and the open/top-half
/// bits are swapped. The remap is its own inverse.
fn remap_trapdoor(data: u8) -> u8 {
    let facing = 3 - (data & 0x03);
    let bit2 = (data >> 2) & 1;
    let bit3 = (data >> 3) & 1;
    facing | (bit3 << 2) | (bit2 << 3)
}

/// Pure block translator. Total over the native id space: anything without a
/// counterpart becomes the fallback block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTranslator {
    fallback: (u8, u8),
}

impl Default for BlockTranslator {
    fn default() -> Self {
        BlockTranslator { fallback: (0, 0) }
    }
}

impl BlockTranslator {
    pub fn new(fallback_id: u8, fallback_data: u8) -> Self {
        BlockTranslator {
            fallback: (fallback_id, fallback_data & 0x0F),
        }
    }

    pub fn fallback(&self) -> (u8, u8) {
        self.fallback
    }

    pub fn translate(&self, id: u8, data: u8, direction: Direction) -> (u8, u8) {
        match direction {
            Direction::ToDesktop => self.to_desktop(id, data),
            Direction::ToNative => self.to_native(id, data),
        }
    }

    pub fn to_desktop(&self, id: u8, data: u8) -> (u8, u8) {
        let data = data & 0x0F;
        match id {
            43 | 44 => (id, remap_stone_slab(data)),
            96 | 167 => (id, remap_trapdoor(data)),
            NATIVE_FENCE => match FENCE_IDS.get(data as usize) {
                Some(&fence) => (fence, 0),
                None => (NATIVE_FENCE, 0),
            },
            NATIVE_SHULKER_BOX => (DESKTOP_SHULKER_BOX_FIRST + data, DESKTOP_SHULKER_FACING_UP),
            _ => {
                if let Some(&(_, desktop)) = ID_REMAP.iter().find(|(native, _)| *native == id) {
                    return (desktop, data);
                }
                if let Some(&(_, block)) = NATIVE_ONE_WAY.iter().find(|(native, _)| *native == id)
                {
                    return block;
                }
                if NATIVE_ONLY.contains(&id) {
                    return self.fallback;
                }
                (id, data)
            }
        }
    }

    pub fn to_native(&self, id: u8, data: u8) -> (u8, u8) {
        let data = data & 0x0F;
        match id {
            43 | 44 => (id, remap_stone_slab(data)),
            96 | 167 => (id, remap_trapdoor(data)),
            NATIVE_FENCE => (NATIVE_FENCE, 0),
            DESKTOP_SHULKER_BOX_FIRST..=DESKTOP_SHULKER_BOX_LAST => {
                (NATIVE_SHULKER_BOX, id - DESKTOP_SHULKER_BOX_FIRST)
            }
            _ => {
                if let Some(wood) = FENCE_IDS.iter().position(|&fence| fence == id) {
                    return (NATIVE_FENCE, wood as u8);
                }
                if let Some(&(native, _)) = ID_REMAP.iter().find(|(_, desktop)| *desktop == id) {
                    return (native, data);
                }
                if DESKTOP_ONLY.contains(&id) || NATIVE_ONLY.contains(&id) {
                    return self.fallback;
                }
                (id, data)
            }
        }
    }
}
