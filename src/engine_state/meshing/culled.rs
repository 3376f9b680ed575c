//! Culled-face mesh extraction.
//!
//! For every solid block, in [`ChunkBlockIterator`] order, each of the six faces (in
//! [`BlockSide::all`] order) becomes a quad when the neighbour it faces is air.
//! Neighbours outside the chunk read as air, so the outer ring of every chunk is always
//! closed off even where the next chunk is solid.
//!
//! Only top faces are shaded per vertex. Each top corner samples the two edge
//! neighbours and the diagonal neighbour one layer above the block; bottom and
//! side faces use flat constants.
//!
//! [`ChunkBlockIterator`]: crate::engine_state::voxels::chunk::chunk_iteration::ChunkBlockIterator

use log::trace;
use web_time::Instant;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, BlockId},
    chunk::Chunk,
};

use super::{face::vertex_light, Face, MeshBuffers};

pub fn generate_geometry(chunk: &Chunk) -> MeshBuffers {
    let start = Instant::now();
    let mut mesh = MeshBuffers::new();

    for (position, block_id) in chunk.solid_blocks() {
        let (x, y, z) = (position.x, position.y, position.z);

        for side in BlockSide::all() {
            let offset = side.offset();
            if chunk.is_block_solid(x + offset.x, y + offset.y, z + offset.z) {
                continue;
            }

            let face = match side {
                BlockSide::TOP => top_face(chunk, x, y, z, block_id),
                _ => Face::new(x, y, z, block_id, side),
            };
            mesh.push_face(&face);
        }
    }

    trace!(
        "Meshed chunk {} into {} quads in {:?}",
        chunk.position,
        mesh.quad_count(),
        start.elapsed()
    );

    mesh
}

/// Top face with per-corner occlusion sampled from the layer above.
fn top_face(chunk: &Chunk, x: i32, y: i32, z: i32, block_id: BlockId) -> Face {
    let above = y + 1;
    let solid = |dx: i32, dz: i32| chunk.is_block_solid(x + dx, above, z + dz);

    let north = solid(0, -1);
    let south = solid(0, 1);
    let west = solid(-1, 0);
    let east = solid(1, 0);

    let ao = [
        vertex_light(south, west, solid(-1, 1)),
        vertex_light(south, east, solid(1, 1)),
        vertex_light(north, east, solid(1, -1)),
        vertex_light(north, west, solid(-1, -1)),
    ];

    Face::new(x, y, z, block_id, BlockSide::TOP).with_ao(ao)
}
