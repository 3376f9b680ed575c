use cgmath::Point3;

use crate::engine_state::voxels::block::{
    atlas_origin, block_side::BlockSide, BlockId, ATLAS_SLOT_SIZE,
};

/// Darkest value a vertex can receive from ambient occlusion.
pub const MIN_LIGHT: f32 = 0.2;
/// Light lost per occluding neighbour.
const OCCLUSION_STEP: f32 = 0.2;
/// Flat light of every bottom face.
pub const BOTTOM_FACE_LIGHT: f32 = 0.5;
/// Flat light of every side face.
pub const SIDE_FACE_LIGHT: f32 = 0.8;

/// Light of a top-face corner from its two edge neighbours and the diagonal between them.
///
/// Two solid edge neighbours fully occlude the corner whatever the diagonal holds.
pub fn vertex_light(side1: bool, side2: bool, corner: bool) -> f32 {
    if side1 && side2 {
        return MIN_LIGHT;
    }
    let occlusion = side1 as u8 + side2 as u8 + corner as u8;
    1.0 - occlusion as f32 * OCCLUSION_STEP
}

/// A single quad of the mesh.
///
/// `corners` are listed counter-clockwise seen from outside the block, so the
/// triangles (0, 1, 2) and (0, 2, 3) face along the side's normal. For the top
/// face the order is SW, SE, NE, NW (south is +z, east is +x).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    pub corners: [Point3<i32>; 4],
    pub uvs: [[f32; 2]; 4],
    pub ao: [f32; 4],
    pub block_id: BlockId,
    pub side: BlockSide,
}

impl Face {
    /// Creates the face of block `(i, j, k)` on the given side with flat lighting.
    ///
    /// Top faces get their per-corner light from [`Face::with_ao`].
    pub fn new(i: i32, j: i32, k: i32, block_id: BlockId, side: BlockSide) -> Self {
        let corners = match side {
            BlockSide::TOP => [
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ],
            BlockSide::BOTTOM => [
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j, k + 1),
            ],
            BlockSide::FRONT => [
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i, j + 1, k + 1),
            ],
            BlockSide::BACK => [
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i, j + 1, k),
                Point3::new(i + 1, j + 1, k),
            ],
            BlockSide::RIGHT => [
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i + 1, j + 1, k + 1),
            ],
            BlockSide::LEFT => [
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i, j + 1, k),
            ],
        };

        let light = match side {
            BlockSide::BOTTOM => BOTTOM_FACE_LIGHT,
            BlockSide::TOP => 1.0,
            _ => SIDE_FACE_LIGHT,
        };

        Face {
            corners,
            uvs: Self::generate_uvs(block_id, side),
            ao: [light; 4],
            block_id,
            side,
        }
    }

    pub fn with_ao(mut self, ao: [f32; 4]) -> Self {
        self.ao = ao;
        self
    }

    /// The block this face belongs to.
    #[cfg(test)]
    fn block_position(&self) -> Point3<i32> {
        let min = self.corners.iter().fold(self.corners[0], |acc, corner| {
            Point3::new(acc.x.min(corner.x), acc.y.min(corner.y), acc.z.min(corner.z))
        });
        match self.side {
            BlockSide::TOP => Point3::new(min.x, min.y - 1, min.z),
            BlockSide::FRONT => Point3::new(min.x, min.y, min.z - 1),
            BlockSide::RIGHT => Point3::new(min.x - 1, min.y, min.z),
            _ => min,
        }
    }

    fn generate_uvs(block_id: BlockId, side: BlockSide) -> [[f32; 2]; 4] {
        let [u, v] = atlas_origin(block_id, side.face_kind());
        let s = ATLAS_SLOT_SIZE;
        [[u, v], [u + s, v], [u + s, v + s], [u, v + s]]
    }
}
