//! # Terrain Module
//!
//! Height-field terrain. Every column of the world has a single surface height;
//! the block at any `(x, y, z)` follows from that height alone:
//!
//! * above the surface: air
//! * at the surface: grass
//! * the two cells below the surface: dirt
//! * deeper: stone
//!
//! Generators are pure functions of their seed and the world coordinate, so two
//! generators built from the same seed produce bit-identical terrain and may be
//! shared freely between threads.

use noise::{NoiseFn, Simplex};

use super::block::block_type::BlockType;

/// Surface elevation added to the summed noise octaves.
pub const BASE_ELEVATION: f64 = 10.0;

/// (frequency, amplitude) of the rolling base terrain.
const BASE_OCTAVE: (f64, f64) = (0.01, 10.0);
/// (frequency, amplitude) of small surface detail.
const DETAIL_OCTAVE: (f64, f64) = (0.05, 5.0);
/// (frequency, amplitude) of the squared mountain term.
const MOUNTAIN_OCTAVE: (f64, f64) = (0.005, 20.0);

/// Number of dirt cells between the grass surface and stone.
pub const DIRT_DEPTH: i32 = 2;

/// A source of column heights.
///
/// `block_at` is derived from `height_at`; implementors normally only provide the height.
pub trait HeightField: Send + Sync {
    /// Surface height of the column at the given world coordinate.
    fn height_at(&self, world_x: i32, world_z: i32) -> i32;

    /// Block at a world coordinate.
    fn block_at(&self, world_x: i32, y: i32, world_z: i32) -> BlockType {
        block_for_height(y, self.height_at(world_x, world_z))
    }
}

/// Applies the layering rule to a single cell of a column with the given surface height.
pub fn block_for_height(y: i32, height: i32) -> BlockType {
    if y > height {
        BlockType::AIR
    } else if y == height {
        BlockType::GRASS
    } else if y > height - (DIRT_DEPTH + 1) {
        BlockType::DIRT
    } else {
        BlockType::STONE
    }
}

/// Hashes a textual seed to the numeric seed of the noise permutation table.
pub fn seed_from_str(seed: &str) -> u32 {
    let mut hash: u32 = 0xdead_beef;
    for unit in seed.encode_utf16() {
        hash = (hash ^ unit as u32).wrapping_mul(2_654_435_761);
    }
    hash ^ (hash >> 16)
}

/// Procedural terrain from three octaves of 2D simplex noise.
pub struct TerrainGenerator {
    seed: String,
    noise: Simplex,
}

impl TerrainGenerator {
    /// Creates a generator whose permutation table is derived from `seed`.
    pub fn new(seed: &str) -> Self {
        TerrainGenerator {
            seed: seed.to_owned(),
            noise: Simplex::new(seed_from_str(seed)),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    fn sample(&self, world_x: f64, world_z: f64, frequency: f64) -> f64 {
        self.noise.get([world_x * frequency, world_z * frequency])
    }
}

impl Default for TerrainGenerator {
    fn default() -> Self {
        Self::new("default")
    }
}

impl HeightField for TerrainGenerator {
    fn height_at(&self, world_x: i32, world_z: i32) -> i32 {
        let (x, z) = (world_x as f64, world_z as f64);

        let base = self.sample(x, z, BASE_OCTAVE.0) * BASE_OCTAVE.1;
        let detail = self.sample(x, z, DETAIL_OCTAVE.0) * DETAIL_OCTAVE.1;
        let mountains = self.sample(x, z, MOUNTAIN_OCTAVE.0).powi(2) * MOUNTAIN_OCTAVE.1;

        (base + detail + mountains + BASE_ELEVATION).floor() as i32
    }
}

/// Every column has the same height. Used for tests and flat worlds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatTerrain {
    pub height: i32,
}

impl FlatTerrain {
    pub fn new(height: i32) -> Self {
        FlatTerrain { height }
    }
}

impl HeightField for FlatTerrain {
    fn height_at(&self, _world_x: i32, _world_z: i32) -> i32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_identical_heights() {
        let first = TerrainGenerator::new("determinism");
        let second = TerrainGenerator::new("determinism");

        for x in (-300..300).step_by(7) {
            for z in (-300..300).step_by(11) {
                let height = first.height_at(x, z);
                assert_eq!(height, first.height_at(x, z));
                assert_eq!(height, second.height_at(x, z));
            }
        }
    }

    #[test]
    fn different_seeds_diverge_somewhere() {
        let first = TerrainGenerator::new("alpha");
        let second = TerrainGenerator::new("beta");

        let differs =
            (0..512).any(|i| first.height_at(i * 3, i * 5) != second.height_at(i * 3, i * 5));
        assert!(differs);
    }

    #[test]
    fn heights_stay_within_the_octave_envelope() {
        let generator = TerrainGenerator::default();
        // |base| <= 10, |detail| <= 5, mountains in [0, 20], plus the base elevation,
        // with slack for simplex output slightly overshooting [-1, 1].
        for x in (-1000..1000).step_by(37) {
            for z in (-1000..1000).step_by(41) {
                let height = generator.height_at(x, z);
                assert!((-20..=60).contains(&height), "height {height} at ({x}, {z})");
            }
        }
    }

    #[test]
    fn layering_follows_the_surface() {
        assert_eq!(block_for_height(11, 10), BlockType::AIR);
        assert_eq!(block_for_height(10, 10), BlockType::GRASS);
        assert_eq!(block_for_height(9, 10), BlockType::DIRT);
        assert_eq!(block_for_height(8, 10), BlockType::DIRT);
        assert_eq!(block_for_height(7, 10), BlockType::STONE);
        assert_eq!(block_for_height(0, 10), BlockType::STONE);
    }

    #[test]
    fn block_at_uses_the_column_height() {
        let generator = TerrainGenerator::new("columns");
        let height = generator.height_at(42, -17);
        assert_eq!(generator.block_at(42, height, -17), BlockType::GRASS);
        assert_eq!(generator.block_at(42, height + 1, -17), BlockType::AIR);
        assert_eq!(generator.block_at(42, height - 3, -17), BlockType::STONE);
    }

    #[test]
    fn seed_hash_is_stable() {
        assert_eq!(seed_from_str("default"), seed_from_str("default"));
        assert_ne!(seed_from_str("default"), seed_from_str("Default"));
    }
}
