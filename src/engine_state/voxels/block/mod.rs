//! # Block Module
//!
//! Block identifiers, block faces and the texture atlas lookup used by the mesher.
//!
//! A block is stored in a chunk as a bare [`BlockId`]. `0` is air; `1..=3` are the
//! opaque terrain materials described by [`BlockType`]. Ids outside that range can
//! only come from persisted records; they are treated as solid and textured as dirt.

use block_side::FaceKind;
use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to store a block in a chunk.
pub type BlockId = u8;

/// Side length of one atlas slot in UV space. The atlas is a 2x2 grid.
pub const ATLAS_SLOT_SIZE: f32 = 0.5;

/// Lower-left UV corner of each atlas slot.
///
/// Slot order: grass top, dirt, stone, grass side.
pub static ATLAS_SLOT_ORIGINS: [[f32; 2]; 4] = [
    [0.0, 0.5], // grass top
    [0.5, 0.5], // dirt
    [0.0, 0.0], // stone
    [0.5, 0.0], // grass side
];

const SLOT_DIRT: usize = 1;

/// Maps each block type to an atlas slot per face kind.
///
/// The outer array is indexed by `BlockType as usize`, the inner one by
/// `FaceKind as usize` in the order [Top, Bottom, Side].
pub static BLOCK_TYPE_TO_ATLAS_SLOTS: [[usize; 3]; 4] = [
    [SLOT_DIRT, SLOT_DIRT, SLOT_DIRT], // AIR (never meshed)
    [0, 1, 3],                         // GRASS
    [1, 1, 1],                         // DIRT
    [2, 2, 2],                         // STONE
];

/// Returns `true` if the id occupies space (anything other than air).
#[inline]
pub fn is_solid(id: BlockId) -> bool {
    id != BlockType::AIR as BlockId
}

/// Looks up the lower-left UV corner for a face of the given block.
pub fn atlas_origin(id: BlockId, face_kind: FaceKind) -> [f32; 2] {
    let slot = match BlockType::from_id(id) {
        Some(block_type) => BLOCK_TYPE_TO_ATLAS_SLOTS[block_type as usize][face_kind as usize],
        None => SLOT_DIRT,
    };
    ATLAS_SLOT_ORIGINS[slot]
}
