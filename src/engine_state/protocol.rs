//! # Protocol Module
//!
//! Messages exchanged between the consumer (renderer side) and the world controller.
//! The consumer never touches chunk state directly; everything goes through these
//! requests and responses.
//!
//! ## Wire format
//!
//! Messages serialise to JSON tagged by `type`:
//!
//! ```text
//! {"type":"LOAD_CHUNK","x":0,"z":-1}
//! {"type":"SET_BLOCK","x":3,"y":10,"z":-7,"id":0}
//! {"type":"REFRESH_AREA","x":12.5,"z":-40.0}
//!
//! {"type":"CHUNK_DATA","data":{"x":0,"z":-1,"key":"0,-1","geometry":{...}}}
//! {"type":"BLOCK_BROKEN","data":{"id":1}}
//! ```

use serde::{Deserialize, Serialize};

use super::meshing::MeshBuffers;
use super::voxels::{block::BlockId, chunk::ChunkCoord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldRequest {
    /// Make the chunk resident and send its mesh. `x`/`z` are chunk coordinates.
    LoadChunk { x: i32, z: i32 },
    /// Write one block. `x`/`y`/`z` are world block coordinates.
    SetBlock { x: i32, y: i32, z: i32, id: BlockId },
    /// Load every chunk within the load radius of a world position.
    RefreshArea { x: f32, z: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldResponse {
    ChunkData(ChunkData),
    /// A solid block was replaced by air. Carries the id of the block that was removed.
    BlockBroken { id: BlockId },
}

/// A freshly meshed chunk. Geometry positions are local to the chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    pub x: i32,
    pub z: i32,
    pub key: String,
    pub geometry: MeshBuffers,
}

impl ChunkData {
    pub fn new(position: ChunkCoord, geometry: MeshBuffers) -> Self {
        ChunkData {
            x: position.x,
            z: position.z,
            key: position.key(),
            geometry,
        }
    }

    pub fn position(&self) -> ChunkCoord {
        ChunkCoord::new(self.x, self.z)
    }
}
