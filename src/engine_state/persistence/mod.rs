//! # Persistence Module
//!
//! Asynchronous key-value storage for chunk records. A record is keyed by the chunk
//! coordinate (`"{x},{z}"`) and holds the raw block array of the chunk, with no header.
//! A missing record means the chunk has never been edited; a present record always
//! wins over terrain generation.
//!
//! Backends:
//! - [`MemoryPersistence`]: a shared in-process table, used on the web and in tests
//! - [`FilePersistence`]: one file per chunk under a save directory (native only)

use futures::future::BoxFuture;
use thiserror::Error;

use crate::engine_state::voxels::chunk::ChunkCoord;

mod memory;
pub use memory::MemoryPersistence;

#[cfg(not(target_family = "wasm"))]
mod file;
#[cfg(not(target_family = "wasm"))]
pub use file::FilePersistence;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend failed: {0}")]
    Backend(String),

    #[error("storage backend is unavailable")]
    Unavailable,
}

/// A store of persisted chunk records.
///
/// Both operations return futures that own everything they need, so the caller can keep
/// them in flight while it handles further requests.
pub trait ChunkPersistence: Send + Sync {
    /// Stores `bytes` as the record for `position`, replacing any previous record.
    fn save_chunk(
        &self,
        position: ChunkCoord,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<(), PersistenceError>>;

    /// Reads the record for `position`. `Ok(None)` means no record exists.
    fn load_chunk(
        &self,
        position: ChunkCoord,
    ) -> BoxFuture<'static, Result<Option<Vec<u8>>, PersistenceError>>;
}
