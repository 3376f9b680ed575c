//! Mesh buffer storage.

use serde::{Deserialize, Serialize};

use super::face::Face;

/// Vertex and index data for one chunk.
///
/// All arrays are parallel per vertex except `indices`:
/// - `positions`: 3 floats per vertex, local chunk space
/// - `normals`: 3 floats per vertex, unit axis vectors
/// - `uvs`: 2 floats per vertex, atlas space
/// - `ao`: 1 float per vertex in `[0.2, 1.0]`
/// - `indices`: 6 per quad, two counter-clockwise triangles
///
/// Buffers are built fresh for every emission and moved to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub ao: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one quad.
    pub fn push_face(&mut self, face: &Face) {
        let index_offset = self.vertex_count() as u32;
        let normal = face.side.normal();

        for (corner, (uv, light)) in face.corners.iter().zip(face.uvs.iter().zip(face.ao)) {
            self.positions
                .extend_from_slice(&[corner.x as f32, corner.y as f32, corner.z as f32]);
            self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
            self.uvs.extend_from_slice(uv);
            self.ao.push(light);
        }

        self.indices
            .extend_from_slice(&Self::generate_face_indices(index_offset));
    }

    /// Two triangles (0, 1, 2) and (0, 2, 3) over the quad starting at `index_offset`.
    pub fn generate_face_indices(index_offset: u32) -> [u32; 6] {
        [
            index_offset,
            index_offset + 1,
            index_offset + 2,
            index_offset,
            index_offset + 2,
            index_offset + 3,
        ]
    }

    pub fn vertex_count(&self) -> usize {
        self.ao.len()
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `vertex` as `[x, y, z]`.
    pub fn position(&self, vertex: usize) -> [f32; 3] {
        let base = vertex * 3;
        [
            self.positions[base],
            self.positions[base + 1],
            self.positions[base + 2],
        ]
    }

    /// Normal of vertex `vertex` as `[x, y, z]`.
    pub fn normal(&self, vertex: usize) -> [f32; 3] {
        let base = vertex * 3;
        [self.normals[base], self.normals[base + 1], self.normals[base + 2]]
    }
}
