//! # Chunk Iteration Module
//!
//! Iterates the solid blocks of a chunk in meshing order: x outermost, then y,
//! then z innermost. The mesher's vertex stream follows this order, so it is part
//! of the output contract.

use cgmath::Point3;

use crate::engine_state::voxels::block::{is_solid, BlockId};

use super::{Chunk, CHUNK_DIMENSION, CHUNK_HEIGHT};

/// An iterator over all non-air blocks in a chunk, yielding local positions and ids.
pub struct ChunkBlockIterator<'a> {
    chunk_ref: &'a Chunk,
    local_x: i32,
    local_y: i32,
    local_z: i32,
}

impl<'a> ChunkBlockIterator<'a> {
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            local_x: 0,
            local_y: 0,
            local_z: 0,
        }
    }

    fn advance(&mut self) {
        self.local_z += 1;
        if self.local_z == CHUNK_DIMENSION {
            self.local_z = 0;
            self.local_y += 1;
            if self.local_y == CHUNK_HEIGHT {
                self.local_y = 0;
                self.local_x += 1;
            }
        }
    }
}

impl<'a> Iterator for ChunkBlockIterator<'a> {
    type Item = (Point3<i32>, BlockId);

    fn next(&mut self) -> Option<Self::Item> {
        while self.local_x < CHUNK_DIMENSION {
            let position = Point3::new(self.local_x, self.local_y, self.local_z);
            let block = self.chunk_ref.get_block(position.x, position.y, position.z);
            self.advance();

            if is_solid(block) {
                return Some((position, block));
            }
        }
        None
    }
}

impl Chunk {
    pub fn solid_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }
}
