//! # Chunk Creation Module
//!
//! A builder that fills a chunk's block array in storage order.
//!
//! Blocks are addressed as `x + z * 16 + y * 16 * 16`, so the builder walks x fastest,
//! then z, then y. Callers push exactly [`CHUNK_VOLUME`] blocks and then take the
//! finished chunk with [`ChunkCreationIterator::return_chunk`].

use crate::engine_state::voxels::{
    block::{block_type::BlockType, BlockId},
    terrain::{block_for_height, HeightField},
};

use super::{Chunk, ChunkCoord, CHUNK_DIMENSION, CHUNK_HEIGHT, CHUNK_PLANE_SIZE, CHUNK_VOLUME};

pub struct ChunkCreationIterator {
    position: ChunkCoord,
    blocks: Vec<BlockId>,
    /// Number of non-air blocks pushed so far
    solid_count: usize,
}

impl ChunkCreationIterator {
    pub fn new(position: ChunkCoord) -> Self {
        ChunkCreationIterator {
            position,
            blocks: Vec::with_capacity(CHUNK_VOLUME),
            solid_count: 0,
        }
    }

    /// Local (x, y, z) of the next block to be pushed.
    pub fn next_local_position(&self) -> (i32, i32, i32) {
        let index = self.blocks.len() as i32;
        let plane = CHUNK_PLANE_SIZE as i32;
        (
            index % CHUNK_DIMENSION,
            index / plane,
            (index % plane) / CHUNK_DIMENSION,
        )
    }

    pub fn push_block_type(&mut self, block_type: BlockType) {
        if self.blocks.len() == CHUNK_VOLUME {
            return;
        }
        if block_type != BlockType::AIR {
            self.solid_count += 1;
        }
        self.blocks.push(block_type.id());
    }

    pub fn solid_count(&self) -> usize {
        self.solid_count
    }

    /// Finalizes the chunk. Cells that were never pushed are air.
    pub fn return_chunk(mut self) -> Chunk {
        self.blocks.resize(CHUNK_VOLUME, BlockType::AIR.id());
        Chunk::with_blocks(self.position, self.blocks)
    }
}

/// Fills a chunk from a height field, translating local columns to world columns.
///
/// Heights are sampled once per column; each cell then follows the layering rule
/// of [`block_for_height`], which is what `HeightField::block_at` returns.
pub fn generate_from_height_field(position: ChunkCoord, height_field: &dyn HeightField) -> Chunk {
    let (origin_x, origin_z) = position.world_origin();

    let mut column_heights = [0i32; CHUNK_PLANE_SIZE];
    for z in 0..CHUNK_DIMENSION {
        for x in 0..CHUNK_DIMENSION {
            column_heights[(x + z * CHUNK_DIMENSION) as usize] =
                height_field.height_at(origin_x + x, origin_z + z);
        }
    }

    let mut cci = ChunkCreationIterator::new(position);
    for y in 0..CHUNK_HEIGHT {
        for column_height in column_heights.iter() {
            cci.push_block_type(block_for_height(y, *column_height));
        }
    }

    cci.return_chunk()
}
