use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use super::{ChunkPersistence, PersistenceError};
use crate::core::MtResource;
use crate::engine_state::voxels::chunk::ChunkCoord;

/// In-process record table.
///
/// Clones share the same table, so a controller built after another one was dropped
/// still sees every record the first one saved.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    records: MtResource<HashMap<String, Vec<u8>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.get().is_empty()
    }

    pub fn contains(&self, position: ChunkCoord) -> bool {
        self.records.get().contains_key(&position.key())
    }

    /// Copy of the stored record, bypassing the asynchronous interface.
    pub fn record(&self, position: ChunkCoord) -> Option<Vec<u8>> {
        self.records.get().get(&position.key()).cloned()
    }

    /// Total number of saves accepted since construction, across all clones.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl ChunkPersistence for MemoryPersistence {
    fn save_chunk(
        &self,
        position: ChunkCoord,
        bytes: Vec<u8>,
    ) -> BoxFuture<'static, Result<(), PersistenceError>> {
        self.records.get_mut().insert(position.key(), bytes);
        self.saves.fetch_add(1, Ordering::Relaxed);
        future::ready(Ok(())).boxed()
    }

    fn load_chunk(
        &self,
        position: ChunkCoord,
    ) -> BoxFuture<'static, Result<Option<Vec<u8>>, PersistenceError>> {
        future::ready(Ok(self.record(position))).boxed()
    }
}
