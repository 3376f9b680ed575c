//! # World Configuration
//!
//! Settings for a world: terrain seed and generator, load radius, cache size, save
//! retries and where records go on disk. Read from JSON; every field is optional.
//!
//! ```text
//! {
//!     "seed": "hello",
//!     "generation": "flat",
//!     "flat_height": 12,
//!     "load_radius": 2,
//!     "max_resident_chunks": 256,
//!     "max_save_attempts": 3,
//!     "save_directory": "saves/world"
//! }
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::voxels::chunk::CHUNK_HEIGHT;
use super::voxels::terrain::{FlatTerrain, HeightField, TerrainGenerator};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How new chunks are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    /// Three octaves of simplex noise.
    #[default]
    Noise,
    /// Every column at `flat_height`.
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: String,
    pub generation: GenerationMethod,
    pub flat_height: i32,
    /// Chunks within this Chebyshev distance of the player are kept loaded.
    pub load_radius: i32,
    pub max_resident_chunks: usize,
    pub max_save_attempts: u32,
    pub save_directory: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            seed: "default".to_owned(),
            generation: GenerationMethod::Noise,
            flat_height: 10,
            load_radius: 2,
            max_resident_chunks: 256,
            max_save_attempts: 3,
            save_directory: PathBuf::from("saves/world"),
        }
    }
}

impl WorldConfig {
    /// Reads and validates a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of chunks one area refresh keeps resident.
    pub fn area_chunk_count(&self) -> usize {
        let side = 2 * self.load_radius.max(0) as usize + 1;
        side * side
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_radius < 0 {
            return Err(ConfigError::Invalid(format!(
                "load_radius must not be negative, got {}",
                self.load_radius
            )));
        }
        if self.max_resident_chunks < self.area_chunk_count() {
            return Err(ConfigError::Invalid(format!(
                "max_resident_chunks is {}, but a radius of {} keeps {} chunks loaded",
                self.max_resident_chunks,
                self.load_radius,
                self.area_chunk_count()
            )));
        }
        if self.max_save_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_save_attempts must be at least 1".to_owned(),
            ));
        }
        if self.generation == GenerationMethod::Flat
            && !(0..CHUNK_HEIGHT).contains(&self.flat_height)
        {
            return Err(ConfigError::Invalid(format!(
                "flat_height must be within 0..{}, got {}",
                CHUNK_HEIGHT, self.flat_height
            )));
        }
        Ok(())
    }

    /// Resident cache capacity. Validation guarantees at least one chunk.
    pub fn resident_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_resident_chunks).unwrap_or(NonZeroUsize::MIN)
    }

    /// Builds the height field selected by `generation`.
    pub fn make_generator(&self) -> Arc<dyn HeightField> {
        match self.generation {
            GenerationMethod::Noise => Arc::new(TerrainGenerator::new(&self.seed)),
            GenerationMethod::Flat => Arc::new(FlatTerrain::new(self.flat_height)),
        }
    }
}
