//! Mesh extraction for voxel chunks.
//!
//! Converts a chunk's block array into flat, renderer-ready buffers with
//! culled-face meshing: every face of a solid block that looks into air becomes
//! one quad (four vertices, two triangles). Faces are never merged.
//!
//! # Architecture
//! - [`MeshBuffers`]: the five parallel output arrays
//! - [`Face`]: corner positions, UVs and lighting of a single quad
//! - [`culled`]: the per-chunk extraction loop and top-face ambient occlusion

pub mod culled;
mod face;
mod mesh;

pub use face::{vertex_light, Face, BOTTOM_FACE_LIGHT, MIN_LIGHT, SIDE_FACE_LIGHT};
pub use mesh::MeshBuffers;
