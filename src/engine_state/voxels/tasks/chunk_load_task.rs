//! # Chunk Load Task
//!
//! Makes a chunk resident: the persisted record is used when one exists, otherwise the
//! chunk is generated from terrain. A failed read, or a record of the wrong size, is
//! logged and treated as a missing record.
//!
//! Blocks from a save that has not been confirmed yet take precedence over both, since
//! the record may still hold an older version of the chunk.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::{info, warn};
use web_time::Instant;

use crate::engine_state::{
    persistence::ChunkPersistence,
    voxels::{
        chunk::{Chunk, ChunkCoord},
        terrain::HeightField,
    },
};

/// Where a loaded chunk's blocks came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSource {
    /// The newest blocks of a save still in flight or queued for retry.
    Unconfirmed,
    Persisted,
    Generated,
}

pub struct ChunkLoadTask {
    position: ChunkCoord,
    persistence: Arc<dyn ChunkPersistence>,
    height_field: Arc<dyn HeightField>,
    unconfirmed: Option<Vec<u8>>,
}

impl ChunkLoadTask {
    pub fn new(
        position: ChunkCoord,
        persistence: Arc<dyn ChunkPersistence>,
        height_field: Arc<dyn HeightField>,
    ) -> Self {
        ChunkLoadTask {
            position,
            persistence,
            height_field,
            unconfirmed: None,
        }
    }

    /// Loads from `bytes` without reading persistence.
    pub fn with_unconfirmed(mut self, bytes: Vec<u8>) -> Self {
        self.unconfirmed = Some(bytes);
        self
    }

    pub fn process(self) -> BoxFuture<'static, ChunkLoadTaskResult> {
        async move {
            let start = Instant::now();
            let position = self.position;

            if let Some(bytes) = self.unconfirmed {
                match Chunk::from_bytes(position, bytes) {
                    Ok(chunk) => {
                        info!("Chunk {} restored from an unconfirmed save", position);
                        return ChunkLoadTaskResult {
                            chunk,
                            source: ChunkSource::Unconfirmed,
                        };
                    }
                    Err(err) => warn!("Discarding unconfirmed chunk {}: {}", position, err),
                }
            }

            let persisted = match self.persistence.load_chunk(position).await {
                Ok(Some(bytes)) => match Chunk::from_bytes(position, bytes) {
                    Ok(chunk) => Some(chunk),
                    Err(err) => {
                        warn!("Discarding persisted chunk {}: {}", position, err);
                        None
                    }
                },
                Ok(None) => None,
                Err(err) => {
                    warn!("Failed to load chunk {}: {}", position, err);
                    None
                }
            };

            let (chunk, source) = match persisted {
                Some(chunk) => (chunk, ChunkSource::Persisted),
                None => (
                    Chunk::generate(position, self.height_field.as_ref()),
                    ChunkSource::Generated,
                ),
            };

            info!(
                "Chunk {} {:?} in {:?}",
                position,
                source,
                start.elapsed()
            );

            ChunkLoadTaskResult { chunk, source }
        }
        .boxed()
    }
}

/// A chunk ready to become resident.
pub struct ChunkLoadTaskResult {
    pub chunk: Chunk,
    pub source: ChunkSource,
}

impl ChunkLoadTaskResult {
    pub fn position(&self) -> ChunkCoord {
        self.chunk.position
    }
}
