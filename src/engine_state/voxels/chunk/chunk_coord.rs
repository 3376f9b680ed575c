//! Chunk coordinates and world-to-chunk conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CHUNK_DIMENSION;

/// Position of a chunk on the horizontal chunk grid.
///
/// Chunk `(x, z)` covers world columns `x * 16 .. x * 16 + 16` and
/// `z * 16 .. z * 16 + 16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const ORIGIN: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    pub fn new(x: i32, z: i32) -> Self {
        ChunkCoord { x, z }
    }

    /// The chunk containing the given world column (floor division).
    pub fn from_world(world_x: i32, world_z: i32) -> Self {
        ChunkCoord {
            x: world_x.div_euclid(CHUNK_DIMENSION),
            z: world_z.div_euclid(CHUNK_DIMENSION),
        }
    }

    /// The chunk containing a continuous world position such as a player's.
    pub fn from_world_position(world_x: f32, world_z: f32) -> Self {
        let dimension = CHUNK_DIMENSION as f32;
        ChunkCoord {
            x: (world_x / dimension).floor() as i32,
            z: (world_z / dimension).floor() as i32,
        }
    }

    /// Converts a world column to coordinates local to this chunk.
    ///
    /// The result is only inside `[0, 16)` when the column belongs to this chunk.
    pub fn to_local(self, world_x: i32, world_z: i32) -> (i32, i32) {
        (
            world_x - self.x * CHUNK_DIMENSION,
            world_z - self.z * CHUNK_DIMENSION,
        )
    }

    /// World coordinate of this chunk's local (0, 0) column.
    pub fn world_origin(self) -> (i32, i32) {
        (self.x * CHUNK_DIMENSION, self.z * CHUNK_DIMENSION)
    }

    /// Persistence and protocol key, `"{x},{z}"`.
    pub fn key(self) -> String {
        format!("{},{}", self.x, self.z)
    }

    pub fn chebyshev_distance(self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Every chunk in the `(2 * radius + 1)` square centred on `self`, row by row.
    pub fn chunks_in_radius(self, radius: i32) -> Vec<ChunkCoord> {
        let mut coords = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                coords.push(ChunkCoord::new(self.x + dx, self.z + dz));
            }
        }
        coords
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}
