//! # Voxel Engine Core
//!
//! This module contains the voxel data model: block ids, terrain, chunks and the
//! bounded set of chunks currently held in memory.
//!
//! ## Architecture
//!
//! * **Block**: block ids, material kinds, the six face directions and the texture atlas table
//! * **Terrain**: deterministic height fields that decide which block sits at a world position
//! * **Chunk**: dense 16x128x16 block grids, the unit of generation, meshing and persistence
//! * **World**: the resident chunk cache, evicting the chunk farthest from the player first
//! * **Tasks**: asynchronous chunk loads and saves driven by the world controller
//!
//! ## Data Flow
//!
//! 1. The controller receives a load or edit request for a chunk coordinate
//! 2. A load task reads the persisted record, or generates the chunk from terrain
//! 3. The chunk joins the [`World`](world::World); edits mark it dirty
//! 4. Dirty chunks are meshed and sent to the consumer; edited chunks are saved by save tasks

pub mod block;
pub mod chunk;
pub mod tasks;
pub mod terrain;
pub mod world;
