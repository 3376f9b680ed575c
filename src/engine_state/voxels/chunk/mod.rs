//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense 16x128x16 grid of block ids that
//! is the unit of generation, meshing and persistence.
//!
//! ## Storage
//!
//! Blocks are kept in a flat byte array addressed by `x + z * 16 + y * 16 * 16`.
//! The same array is what persistence stores, byte for byte, so a chunk can be
//! rebuilt from a record without any conversion.
//!
//! ## Boundaries
//!
//! Reads outside the chunk return air and writes outside it are ignored. The
//! mesher relies on this: faces on the outer ring of a chunk are emitted whenever
//! the cell beyond the border would be air *in this chunk's view*, even when the
//! neighbouring chunk has a solid block there. Neighbouring chunks are never
//! consulted, which leaves visible seams at chunk borders.

use thiserror::Error;

use super::block::{is_solid, block_type::BlockType, BlockId};
use super::terrain::HeightField;
use crate::engine_state::meshing::{self, MeshBuffers};

mod chunk_coord;
mod chunk_creation;
pub mod chunk_iteration;

pub use chunk_coord::ChunkCoord;
pub use chunk_creation::ChunkCreationIterator;

/// Width and depth of a chunk in blocks.
pub const CHUNK_DIMENSION: i32 = 16;
/// Height of a chunk in blocks.
pub const CHUNK_HEIGHT: i32 = 128;
/// Number of blocks in one horizontal layer.
pub const CHUNK_PLANE_SIZE: usize = (CHUNK_DIMENSION * CHUNK_DIMENSION) as usize;
/// Total number of blocks in a chunk, and the length of a persisted record.
pub const CHUNK_VOLUME: usize = CHUNK_PLANE_SIZE * CHUNK_HEIGHT as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk data has {actual} bytes, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A 16x128x16 column of blocks.
///
/// The `dirty` flag tracks whether the blocks changed since the mesh was last sent
/// to the renderer. It starts set, is set again by every in-bounds
/// [`set_block`](Chunk::set_block), and is cleared by whoever emits the mesh.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkCoord,
    blocks: Vec<BlockId>,
    dirty: bool,
}

impl Chunk {
    pub(crate) fn with_blocks(position: ChunkCoord, blocks: Vec<BlockId>) -> Self {
        Chunk {
            position,
            blocks,
            dirty: true,
        }
    }

    /// Creates a chunk filled with air.
    pub fn empty(position: ChunkCoord) -> Self {
        Self::with_blocks(position, vec![BlockType::AIR.id(); CHUNK_VOLUME])
    }

    /// Generates a chunk from terrain. Runs once for chunks that have no persisted record.
    pub fn generate(position: ChunkCoord, height_field: &dyn HeightField) -> Self {
        chunk_creation::generate_from_height_field(position, height_field)
    }

    /// Rebuilds a chunk from a persisted record. Generation is skipped entirely.
    pub fn from_bytes(position: ChunkCoord, bytes: Vec<u8>) -> Result<Self, ChunkError> {
        if bytes.len() != CHUNK_VOLUME {
            return Err(ChunkError::InvalidLength {
                expected: CHUNK_VOLUME,
                actual: bytes.len(),
            });
        }
        Ok(Self::with_blocks(position, bytes))
    }

    /// Raw block array in storage order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.blocks
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.blocks.clone()
    }

    /// Storage index of a local coordinate, or `None` if it lies outside the chunk.
    #[inline]
    pub fn index(x: i32, y: i32, z: i32) -> Option<usize> {
        if !(0..CHUNK_DIMENSION).contains(&x)
            || !(0..CHUNK_HEIGHT).contains(&y)
            || !(0..CHUNK_DIMENSION).contains(&z)
        {
            return None;
        }
        Some((x + z * CHUNK_DIMENSION) as usize + y as usize * CHUNK_PLANE_SIZE)
    }

    /// Block at a local coordinate. Out-of-bounds reads return air.
    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        match Self::index(x, y, z) {
            Some(index) => self.blocks[index],
            None => BlockType::AIR.id(),
        }
    }

    #[inline]
    pub fn is_block_solid(&self, x: i32, y: i32, z: i32) -> bool {
        is_solid(self.get_block(x, y, z))
    }

    /// Writes a block and marks the chunk dirty.
    ///
    /// Out-of-bounds writes change nothing, leave `dirty` untouched and return `false`.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        match Self::index(x, y, z) {
            Some(index) => {
                self.blocks[index] = id;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the current mesh as delivered.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn solid_count(&self) -> usize {
        self.blocks.iter().filter(|id| is_solid(**id)).count()
    }

    /// `true` if the chunk holds no solid blocks at all.
    pub fn is_empty(&self) -> bool {
        !self.blocks.iter().any(|id| is_solid(*id))
    }

    /// Extracts culled-face mesh buffers for the current block data.
    pub fn generate_geometry(&self) -> MeshBuffers {
        meshing::culled::generate_geometry(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        let mut chunk = Chunk::empty(ChunkCoord::new(1, -1));
        chunk.set_block(3, 4, 5, BlockType::STONE.id());
        chunk
    }

    #[test]
    fn index_layout_is_x_then_z_then_y() {
        assert_eq!(Chunk::index(0, 0, 0), Some(0));
        assert_eq!(Chunk::index(1, 0, 0), Some(1));
        assert_eq!(Chunk::index(0, 0, 1), Some(16));
        assert_eq!(Chunk::index(0, 1, 0), Some(256));
        assert_eq!(Chunk::index(15, 127, 15), Some(CHUNK_VOLUME - 1));
    }

    #[test]
    fn out_of_bounds_reads_are_air() {
        let chunk = sample_chunk();
        for (x, y, z) in [
            (-1, 4, 5),
            (16, 4, 5),
            (3, -1, 5),
            (3, 128, 5),
            (3, 4, -1),
            (3, 4, 16),
            (i32::MIN, i32::MAX, 0),
        ] {
            assert_eq!(chunk.get_block(x, y, z), 0);
        }
        assert_eq!(chunk.get_block(3, 4, 5), BlockType::STONE.id());
    }

    #[test]
    fn out_of_bounds_writes_do_nothing() {
        let mut chunk = sample_chunk();
        chunk.clear_dirty();
        let before = chunk.to_bytes();

        assert!(!chunk.set_block(16, 0, 0, 3));
        assert!(!chunk.set_block(0, 128, 0, 3));
        assert!(!chunk.set_block(0, 0, -1, 3));

        assert_eq!(chunk.as_bytes(), before.as_slice());
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn dirty_lifecycle() {
        let mut chunk = Chunk::empty(ChunkCoord::ORIGIN);
        assert!(chunk.is_dirty());

        chunk.clear_dirty();
        assert!(!chunk.is_dirty());

        assert!(chunk.set_block(0, 0, 0, BlockType::DIRT.id()));
        assert!(chunk.is_dirty());
    }

    #[test]
    fn from_bytes_checks_length() {
        let bytes = sample_chunk().to_bytes();
        let restored = Chunk::from_bytes(ChunkCoord::new(1, -1), bytes.clone()).unwrap();
        assert_eq!(restored.as_bytes(), bytes.as_slice());
        assert!(restored.is_dirty());

        assert_eq!(
            Chunk::from_bytes(ChunkCoord::ORIGIN, vec![0; 10]).unwrap_err(),
            ChunkError::InvalidLength {
                expected: CHUNK_VOLUME,
                actual: 10
            }
        );
    }

    #[test]
    fn emptiness() {
        let mut chunk = Chunk::empty(ChunkCoord::ORIGIN);
        assert!(chunk.is_empty());
        chunk.set_block(15, 127, 15, 1);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.solid_count(), 1);
    }
}
