//! # Chunk Save Task
//!
//! Writes one chunk record. The result carries the bytes back so a failed write can be
//! queued and retried without the chunk still being resident.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::engine_state::{
    persistence::{ChunkPersistence, PersistenceError},
    voxels::chunk::ChunkCoord,
};

pub struct ChunkSaveTask {
    position: ChunkCoord,
    bytes: Vec<u8>,
    /// Orders saves of the same chunk; only the highest sequence is authoritative.
    sequence: u64,
    /// 1 for the first write of these bytes, incremented on every retry.
    attempt: u32,
    persistence: Arc<dyn ChunkPersistence>,
}

impl ChunkSaveTask {
    pub fn new(
        position: ChunkCoord,
        bytes: Vec<u8>,
        sequence: u64,
        attempt: u32,
        persistence: Arc<dyn ChunkPersistence>,
    ) -> Self {
        ChunkSaveTask {
            position,
            bytes,
            sequence,
            attempt,
            persistence,
        }
    }

    pub fn process(self) -> BoxFuture<'static, ChunkSaveTaskResult> {
        async move {
            let outcome = self
                .persistence
                .save_chunk(self.position, self.bytes.clone())
                .await;

            ChunkSaveTaskResult {
                position: self.position,
                bytes: self.bytes,
                sequence: self.sequence,
                attempt: self.attempt,
                outcome,
            }
        }
        .boxed()
    }
}

pub struct ChunkSaveTaskResult {
    pub position: ChunkCoord,
    pub bytes: Vec<u8>,
    pub sequence: u64,
    pub attempt: u32,
    pub outcome: Result<(), PersistenceError>,
}
