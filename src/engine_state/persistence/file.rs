use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures::future::{self, BoxFuture, FutureExt};

use super::{ChunkPersistence, PersistenceError};
use crate::engine_state::voxels::chunk::ChunkCoord;

const CHUNK_DIRECTORY: &str = "chunks";
const CHUNK_EXTENSION: &str = "chunk";

/// One raw record file per chunk: `<save_directory>/chunks/<x>,<z>.chunk`.
///
/// File operations complete before the returned future is first polled; the worker
/// thread that owns the controller is the only caller.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    save_directory: PathBuf,
}

impl FilePersistence {
    pub fn new<P: AsRef<Path>>(save_directory: P) -> Self {
        FilePersistence {
            save_directory: save_directory.as_ref().to_path_buf(),
        }
    }

    pub fn save_directory(&self) -> &Path {
        &self.save_directory
    }

    /// Get the path to a chunk record file
    pub fn chunk_path(&self, position: ChunkCoord) -> PathBuf {
        self.save_directory
            .join(CHUNK_DIRECTORY)
            .join(format!("{}.{}", position.key(), CHUNK_EXTENSION))
    }

    fn write_record(&self, position: ChunkCoord, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.chunk_path(position);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Staged write; the rename replaces the record in one step.
        let staging = path.with_extension("tmp");
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn read_record(&self, position: ChunkCoord) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.chunk_path(position)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl ChunkPersistence for FilePersistence {
    fn save_chunk(
        &self,
        position: ChunkCoord,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<(), PersistenceError>> {
        future::ready(self.write_record(position, &bytes)).boxed()
    }

    fn load_chunk(
        &self,
        position: ChunkCoord,
    ) -> BoxFuture<'static, Result<Option<Vec<u8>>, PersistenceError>> {
        future::ready(self.read_record(position)).boxed()
    }
}
