//! # Block Type Module
//!
//! The terrain materials known to the engine.

use num_derive::FromPrimitive;

use super::BlockId;

/// Enumerates all block types produced by terrain generation.
///
/// The discriminants are the on-disk and on-wire ids, so the order must not change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// Empty space. Not solid, never rendered.
    AIR = 0,

    /// Surface block. Green top, grass-on-dirt sides, dirt bottom.
    GRASS = 1,

    /// The two layers directly under the surface.
    DIRT = 2,

    /// Everything deeper than the dirt layers.
    STONE = 3,
}

impl BlockType {
    /// Converts a stored id back to a `BlockType`.
    ///
    /// Returns `None` for ids that no generator produces.
    pub fn from_id(id: BlockId) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The id stored in chunk data for this type.
    pub fn id(self) -> BlockId {
        self as BlockId
    }
}
