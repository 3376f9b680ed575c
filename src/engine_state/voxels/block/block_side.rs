//! # Block Side Module
//!
//! The six faces of a voxel, in the order the mesher emits them.

use cgmath::Vector3;

/// Which atlas texture family a face draws from.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum FaceKind {
    Top = 0,
    Bottom = 1,
    Side = 2,
}

/// Represents the six possible faces of a voxel block.
///
/// The discriminants follow mesh emission order: for every solid voxel the mesher
/// visits the faces as [TOP, BOTTOM, FRONT, BACK, RIGHT, LEFT]. Changing the order
/// changes the vertex stream the renderer receives.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// Facing positive Y
    TOP = 0,

    /// Facing negative Y
    BOTTOM = 1,

    /// Facing positive Z
    FRONT = 2,

    /// Facing negative Z
    BACK = 3,

    /// Facing positive X
    RIGHT = 4,

    /// Facing negative X
    LEFT = 5,
}

impl BlockSide {
    /// All six faces in emission order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::RIGHT,
            BlockSide::LEFT,
        ]
    }

    /// Offset from a voxel to the neighbour this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
        }
    }

    /// Outward unit normal of the face.
    pub fn normal(self) -> Vector3<f32> {
        let offset = self.offset();
        Vector3::new(offset.x as f32, offset.y as f32, offset.z as f32)
    }

    pub fn face_kind(self) -> FaceKind {
        match self {
            BlockSide::TOP => FaceKind::Top,
            BlockSide::BOTTOM => FaceKind::Bottom,
            _ => FaceKind::Side,
        }
    }
}
