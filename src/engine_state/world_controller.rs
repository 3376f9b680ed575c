//! # World Controller
//!
//! Owns the resident chunks and turns [`WorldRequest`]s into [`WorldResponse`]s.
//!
//! ## Chunk states
//!
//! Every chunk key is in exactly one state:
//!
//! * **Unloaded**: neither resident nor loading
//! * **Loading**: one [`ChunkLoadTask`] is in flight. Further load requests and edits for the
//!   key are attached to that load instead of starting another one
//! * **Resident**: held in the [`World`] cache, dirty or clean
//!
//! ## Requests
//!
//! * `LOAD_CHUNK` always sends the chunk's mesh once it is resident, whether or not it is
//!   dirty. A chunk without any solid block sends nothing and stays dirty.
//! * `SET_BLOCK` on a resident chunk writes the block, reports a `BLOCK_BROKEN` when a
//!   solid block became air, saves the whole chunk and sends the new mesh. On a chunk that
//!   is not resident the edit waits behind a load and is applied, in arrival order, once
//!   the chunk arrives.
//! * `REFRESH_AREA` requests every chunk within the load radius of a world position,
//!   farthest first, so the cache evicts chunks far from the player before near ones.
//!
//! ## Saves
//!
//! Each edit issues a full-chunk save tagged with a sequence number. A failed save is kept
//! in the write queue only if it is still the newest save of its chunk, and is reissued by
//! [`WorldController::retry_failed_writes`] until `max_save_attempts` is reached. A chunk
//! leaving the cache while its newest edit is unconfirmed is saved on the way out.
//!
//! The bytes of every unconfirmed save are kept until persistence accepts them. Loading a
//! chunk that has such bytes rebuilds it from them instead of reading the possibly older
//! record, and the chunk stays marked unsaved.
//!
//! ## Driving
//!
//! [`WorldController::handle_message`] never blocks: it starts tasks and returns.
//! [`WorldController::settle`] drives every in-flight task to completion and applies the
//! results, which is where loaded chunks become resident and queued edits run.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};

use super::{
    persistence::ChunkPersistence,
    protocol::{ChunkData, WorldRequest, WorldResponse},
    voxels::{
        block::{block_type::BlockType, is_solid, BlockId},
        chunk::{Chunk, ChunkCoord},
        tasks::{
            chunk_load_task::{ChunkLoadTask, ChunkLoadTaskResult, ChunkSource},
            chunk_save_task::{ChunkSaveTask, ChunkSaveTaskResult},
        },
        terrain::HeightField,
        world::{ResidentChunk, World},
    },
    world_config::WorldConfig,
};

/// An edit waiting for its chunk to become resident. Coordinates are chunk-local.
#[derive(Debug, Clone, Copy)]
struct PendingEdit {
    x: i32,
    y: i32,
    z: i32,
    id: BlockId,
}

/// Work attached to a chunk that is still loading.
#[derive(Debug, Default)]
struct PendingLoad {
    /// An explicit load was requested, so the mesh is sent on arrival.
    emit: bool,
    edits: Vec<PendingEdit>,
}

/// A save that failed and is waiting to be reissued.
#[derive(Debug)]
struct FailedWrite {
    bytes: Vec<u8>,
    attempts: u32,
}

pub struct WorldController {
    world: World,
    height_field: Arc<dyn HeightField>,
    persistence: Arc<dyn ChunkPersistence>,
    responses: Sender<WorldResponse>,
    load_radius: i32,
    max_save_attempts: u32,
    /// Last area refresh centre.
    center: Option<ChunkCoord>,
    loading: HashMap<ChunkCoord, PendingLoad>,
    in_flight_loads: FuturesUnordered<BoxFuture<'static, ChunkLoadTaskResult>>,
    in_flight_saves: FuturesUnordered<BoxFuture<'static, ChunkSaveTaskResult>>,
    next_save_sequence: u64,
    /// Sequence of the newest save issued per chunk, until it succeeds or is given up.
    latest_saves: HashMap<ChunkCoord, u64>,
    /// Newest bytes per chunk that persistence has not accepted yet.
    unconfirmed: HashMap<ChunkCoord, Vec<u8>>,
    write_queue: HashMap<ChunkCoord, FailedWrite>,
}

impl WorldController {
    pub fn new(
        config: &WorldConfig,
        height_field: Arc<dyn HeightField>,
        persistence: Arc<dyn ChunkPersistence>,
        responses: Sender<WorldResponse>,
    ) -> Self {
        WorldController {
            world: World::new(config.resident_capacity()),
            height_field,
            persistence,
            responses,
            load_radius: config.load_radius,
            max_save_attempts: config.max_save_attempts,
            center: None,
            loading: HashMap::new(),
            in_flight_loads: FuturesUnordered::new(),
            in_flight_saves: FuturesUnordered::new(),
            next_save_sequence: 0,
            latest_saves: HashMap::new(),
            unconfirmed: HashMap::new(),
            write_queue: HashMap::new(),
        }
    }

    /// Handles one request. Work that needs persistence is started here and finished
    /// by [`settle`](Self::settle).
    pub fn handle_message(&mut self, request: WorldRequest) {
        match request {
            WorldRequest::LoadChunk { x, z } => self.load_chunk(ChunkCoord::new(x, z)),
            WorldRequest::SetBlock { x, y, z, id } => self.set_block(x, y, z, id),
            WorldRequest::RefreshArea { x, z } => self.refresh_area(x, z),
        }
    }

    /// Drives every in-flight load and save to completion.
    pub async fn settle(&mut self) {
        loop {
            let loaded = self.in_flight_loads.next().await;
            if let Some(result) = loaded {
                self.finish_load(result);
                continue;
            }

            let saved = self.in_flight_saves.next().await;
            if let Some(result) = saved {
                self.finish_save(result);
                continue;
            }

            break;
        }
    }

    /// `true` while no load or save is in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight_loads.is_empty() && self.in_flight_saves.is_empty()
    }

    pub fn load_chunk(&mut self, position: ChunkCoord) {
        if self.world.contains(position) {
            self.emit_chunk(position, false);
            return;
        }
        self.request_load(position).emit = true;
    }

    /// Writes one block at world coordinates.
    pub fn set_block(&mut self, world_x: i32, y: i32, world_z: i32, id: BlockId) {
        let position = ChunkCoord::from_world(world_x, world_z);
        let (x, z) = position.to_local(world_x, world_z);
        let edit = PendingEdit { x, y, z, id };

        if self.world.contains(position) {
            self.apply_edit(position, edit);
        } else {
            debug!("Queueing edit for chunk {} until it is loaded", position);
            self.request_load(position).edits.push(edit);
        }
    }

    /// Requests every chunk within the load radius of a world position.
    pub fn refresh_area(&mut self, world_x: f32, world_z: f32) {
        let center = ChunkCoord::from_world_position(world_x, world_z);
        self.center = Some(center);

        let mut area = center.chunks_in_radius(self.load_radius);
        area.sort_by_key(|position| std::cmp::Reverse(position.chebyshev_distance(center)));
        self.world.promote_by_distance(center, &area);

        for position in area {
            self.load_chunk(position);
        }
    }

    /// Removes a chunk from memory, saving it first if its newest edit is unconfirmed.
    ///
    /// Returns `false` if the chunk was not resident.
    pub fn unload_chunk(&mut self, position: ChunkCoord) -> bool {
        match self.world.remove_chunk(position) {
            Some(resident) => {
                self.flush(position, resident);
                true
            }
            None => false,
        }
    }

    /// Reissues every queued failed save.
    pub fn retry_failed_writes(&mut self) {
        let queued: Vec<(ChunkCoord, FailedWrite)> = self.write_queue.drain().collect();
        for (position, write) in queued {
            debug!(
                "Retrying save of chunk {} (attempt {})",
                position,
                write.attempts + 1
            );
            self.issue_save(position, write.bytes, write.attempts + 1);
        }
    }

    /// Number of failed saves waiting to be retried.
    pub fn pending_writes(&self) -> usize {
        self.write_queue.len()
    }

    pub fn resident_count(&self) -> usize {
        self.world.len()
    }

    pub fn is_resident(&self, position: ChunkCoord) -> bool {
        self.world.contains(position)
    }

    pub fn is_loading(&self, position: ChunkCoord) -> bool {
        self.loading.contains_key(&position)
    }

    /// A resident chunk, without affecting eviction order.
    pub fn chunk(&self, position: ChunkCoord) -> Option<&Chunk> {
        self.world
            .peek_chunk_at(position)
            .map(|resident| &resident.chunk)
    }

    /// `true` if the resident chunk has an edit persistence has not confirmed.
    pub fn has_unsaved_edits(&self, position: ChunkCoord) -> bool {
        self.world
            .peek_chunk_at(position)
            .is_some_and(|resident| resident.unsaved)
    }

    pub fn resident_positions(&self) -> Vec<ChunkCoord> {
        self.world.positions()
    }

    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Returns the pending-load entry for `position`, starting the load if needed.
    fn request_load(&mut self, position: ChunkCoord) -> &mut PendingLoad {
        if self.loading.contains_key(&position) {
            debug!("Chunk {} is already loading", position);
        } else {
            let mut task = ChunkLoadTask::new(
                position,
                self.persistence.clone(),
                self.height_field.clone(),
            );
            if let Some(bytes) = self.unconfirmed.remove(&position) {
                debug!("Chunk {} has an unconfirmed save, loading from it", position);
                task = task.with_unconfirmed(bytes);
            }
            self.in_flight_loads.push(task.process());
        }
        self.loading.entry(position).or_default()
    }

    fn finish_load(&mut self, result: ChunkLoadTaskResult) {
        let position = result.position();
        let pending = self.loading.remove(&position).unwrap_or_default();

        let mut resident = ResidentChunk::new(result.chunk);
        resident.unsaved = result.source == ChunkSource::Unconfirmed;
        if let Some((evicted_position, evicted)) = self.world.add_chunk(resident) {
            debug!("Evicting chunk {}", evicted_position);
            self.flush(evicted_position, evicted);
        }

        if pending.emit {
            self.emit_chunk(position, false);
        }
        for edit in pending.edits {
            self.apply_edit(position, edit);
        }
    }

    fn apply_edit(&mut self, position: ChunkCoord, edit: PendingEdit) {
        let Some(resident) = self.world.get_chunk_at(position) else {
            warn!("Dropping edit for chunk {} which is not resident", position);
            return;
        };

        let previous = resident.chunk.get_block(edit.x, edit.y, edit.z);
        resident.chunk.set_block(edit.x, edit.y, edit.z, edit.id);
        resident.unsaved = true;
        let bytes = resident.chunk.to_bytes();

        if is_solid(previous) && edit.id == BlockType::AIR.id() {
            self.send(WorldResponse::BlockBroken { id: previous });
        }

        self.issue_save(position, bytes, 1);
        self.emit_chunk(position, true);
    }

    /// Meshes a resident chunk and sends it, clearing its dirty flag.
    ///
    /// Chunks with no solid block are skipped unless `allow_empty` is set.
    fn emit_chunk(&mut self, position: ChunkCoord, allow_empty: bool) {
        let Some(resident) = self.world.get_chunk_at(position) else {
            return;
        };

        if !allow_empty && resident.chunk.is_empty() {
            debug!("Chunk {} has no solid blocks, nothing to send", position);
            return;
        }

        let geometry = resident.chunk.generate_geometry();
        resident.chunk.clear_dirty();
        self.send(WorldResponse::ChunkData(ChunkData::new(position, geometry)));
    }

    fn issue_save(&mut self, position: ChunkCoord, bytes: Vec<u8>, attempt: u32) {
        let sequence = self.next_save_sequence;
        self.next_save_sequence += 1;
        self.latest_saves.insert(position, sequence);
        self.unconfirmed.insert(position, bytes.clone());
        // A newer save supersedes any queued failure for the same chunk.
        self.write_queue.remove(&position);

        let task = ChunkSaveTask::new(
            position,
            bytes,
            sequence,
            attempt,
            self.persistence.clone(),
        );
        self.in_flight_saves.push(task.process());
    }

    fn finish_save(&mut self, result: ChunkSaveTaskResult) {
        let position = result.position;
        if self.latest_saves.get(&position) != Some(&result.sequence) {
            debug!("Ignoring superseded save of chunk {}", position);
            return;
        }

        match result.outcome {
            Ok(()) => {
                self.latest_saves.remove(&position);
                self.unconfirmed.remove(&position);
                if let Some(resident) = self.world.peek_chunk_at_mut(position) {
                    resident.unsaved = false;
                }
            }
            Err(err) if result.attempt >= self.max_save_attempts => {
                error!(
                    "Giving up on saving chunk {} after {} attempts: {}",
                    position, result.attempt, err
                );
                self.latest_saves.remove(&position);
                // Memory now holds the only copy of a chunk that is not resident.
                if self.world.contains(position) {
                    self.unconfirmed.remove(&position);
                }
            }
            Err(err) => {
                warn!(
                    "Failed to save chunk {} (attempt {}): {}",
                    position, result.attempt, err
                );
                self.write_queue.insert(
                    position,
                    FailedWrite {
                        bytes: result.bytes,
                        attempts: result.attempt,
                    },
                );
            }
        }
    }

    /// Saves a chunk that is leaving memory if its newest edit is unconfirmed.
    fn flush(&mut self, position: ChunkCoord, resident: ResidentChunk) {
        if resident.unsaved {
            info!("Saving chunk {} before unloading it", position);
            self.issue_save(position, resident.chunk.to_bytes(), 1);
        }
    }

    fn send(&self, response: WorldResponse) {
        if self.responses.send(response).is_err() {
            debug!("Response receiver is gone, dropping response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::persistence::{MemoryPersistence, PersistenceError};
    use crate::engine_state::voxels::chunk::{CHUNK_DIMENSION, CHUNK_VOLUME};
    use crate::engine_state::voxels::terrain::{FlatTerrain, TerrainGenerator};
    use futures::future::{self, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{channel, Receiver};

    const GRASS: BlockId = 1;
    const STONE: BlockId = 3;

    struct Harness {
        controller: WorldController,
        responses: Receiver<WorldResponse>,
        persistence: MemoryPersistence,
    }

    impl Harness {
        fn flat(config: WorldConfig) -> Self {
            Self::with_persistence(config, MemoryPersistence::new())
        }

        fn with_persistence(config: WorldConfig, persistence: MemoryPersistence) -> Self {
            let (sender, responses) = channel();
            let controller = WorldController::new(
                &config,
                Arc::new(FlatTerrain::new(10)),
                Arc::new(persistence.clone()),
                sender,
            );
            Harness {
                controller,
                responses,
                persistence,
            }
        }

        fn send(&mut self, request: WorldRequest) -> Vec<WorldResponse> {
            self.controller.handle_message(request);
            pollster::block_on(self.controller.settle());
            self.responses.try_iter().collect()
        }
    }

    fn chunk_data(responses: &[WorldResponse]) -> Vec<&ChunkData> {
        responses
            .iter()
            .filter_map(|response| match response {
                WorldResponse::ChunkData(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    /// Fails the first `failures` saves, then stores into memory.
    struct FlakyPersistence {
        inner: MemoryPersistence,
        failures: AtomicUsize,
    }

    impl ChunkPersistence for FlakyPersistence {
        fn save_chunk(
            &self,
            position: ChunkCoord,
            bytes: Vec<u8>,
        ) -> BoxFuture<'static, Result<(), PersistenceError>> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return future::ready(Err(PersistenceError::Unavailable)).boxed();
            }
            self.inner.save_chunk(position, bytes)
        }

        fn load_chunk(
            &self,
            position: ChunkCoord,
        ) -> BoxFuture<'static, Result<Option<Vec<u8>>, PersistenceError>> {
            self.inner.load_chunk(position)
        }
    }

    fn flaky(
        failures: usize,
        max_save_attempts: u32,
    ) -> (WorldController, Receiver<WorldResponse>, MemoryPersistence) {
        let config = WorldConfig {
            max_save_attempts,
            ..WorldConfig::default()
        };
        flaky_with_config(failures, &config)
    }

    fn flaky_with_config(
        failures: usize,
        config: &WorldConfig,
    ) -> (WorldController, Receiver<WorldResponse>, MemoryPersistence) {
        let inner = MemoryPersistence::new();
        let (sender, responses) = channel();
        let controller = WorldController::new(
            config,
            Arc::new(FlatTerrain::new(10)),
            Arc::new(FlakyPersistence {
                inner: inner.clone(),
                failures: AtomicUsize::new(failures),
            }),
            sender,
        );
        (controller, responses, inner)
    }

    #[test]
    fn load_emits_the_chunk_and_clears_dirty() {
        let mut harness = Harness::flat(WorldConfig::default());
        let responses = harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        let data = chunk_data(&responses);
        assert_eq!(responses.len(), 1);
        assert_eq!(data[0].key, "0,0");
        let resident = harness.controller.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(data[0].geometry, resident.generate_geometry());
        assert!(!harness.controller.chunk(ChunkCoord::ORIGIN).unwrap().is_dirty());
        // Generation alone never writes a record.
        assert!(harness.persistence.is_empty());
    }

    #[test]
    fn repeated_load_of_a_clean_chunk_emits_again() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 3, z: 3 });
        let again = harness.send(WorldRequest::LoadChunk { x: 3, z: 3 });
        assert_eq!(chunk_data(&again).len(), 1);
    }

    #[test]
    fn breaking_grass_reports_the_block_and_remeshes() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        let responses = harness.send(WorldRequest::SetBlock { x: 0, y: 10, z: 0, id: 0 });

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], WorldResponse::BlockBroken { id: GRASS });
        assert_eq!(chunk_data(&responses).len(), 1);

        let chunk = harness.controller.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(chunk.get_block(0, 10, 0), 0);
        assert!(!chunk.is_dirty());
        assert_eq!(harness.persistence.record(ChunkCoord::ORIGIN).unwrap(), chunk.to_bytes());
        assert!(!harness.controller.has_unsaved_edits(ChunkCoord::ORIGIN));
    }

    #[test]
    fn placing_a_block_does_not_report_a_break() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        let responses = harness.send(WorldRequest::SetBlock { x: 4, y: 11, z: 4, id: STONE });
        assert_eq!(responses.len(), 1);
        assert_eq!(chunk_data(&responses).len(), 1);

        // Replacing air with air is not a break either.
        let responses = harness.send(WorldRequest::SetBlock { x: 4, y: 40, z: 4, id: 0 });
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn negative_world_coordinates_resolve_with_floor_division() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: -1, z: -1 });

        let responses = harness.send(WorldRequest::SetBlock { x: -1, y: 10, z: -16, id: 0 });

        let data = chunk_data(&responses);
        assert_eq!(data[0].key, "-1,-1");
        let chunk = harness.controller.chunk(ChunkCoord::new(-1, -1)).unwrap();
        assert_eq!(chunk.get_block(CHUNK_DIMENSION - 1, 10, 0), 0);
    }

    #[test]
    fn edits_survive_a_restart() {
        let persistence = MemoryPersistence::new();
        {
            let mut harness =
                Harness::with_persistence(WorldConfig::default(), persistence.clone());
            harness.send(WorldRequest::LoadChunk { x: 2, z: -1 });
            harness.send(WorldRequest::SetBlock { x: 35, y: 10, z: -9, id: 0 });
            harness.send(WorldRequest::SetBlock { x: 35, y: 60, z: -9, id: STONE });
        }

        let mut harness = Harness::with_persistence(WorldConfig::default(), persistence);
        harness.send(WorldRequest::LoadChunk { x: 2, z: -1 });

        let chunk = harness.controller.chunk(ChunkCoord::new(2, -1)).unwrap();
        assert_eq!(chunk.get_block(3, 10, 7), 0);
        assert_eq!(chunk.get_block(3, 60, 7), STONE);
        assert_eq!(chunk.get_block(4, 10, 7), GRASS);
    }

    #[test]
    fn edit_on_unloaded_chunk_waits_for_the_load() {
        let mut harness = Harness::flat(WorldConfig::default());

        harness.controller.handle_message(WorldRequest::SetBlock { x: 5, y: 10, z: 5, id: 0 });
        assert!(harness.controller.is_loading(ChunkCoord::ORIGIN));
        assert!(!harness.controller.is_resident(ChunkCoord::ORIGIN));

        pollster::block_on(harness.controller.settle());
        let responses: Vec<WorldResponse> = harness.responses.try_iter().collect();

        // The implicit load sends nothing itself; the edit sends its own break and mesh.
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0], WorldResponse::BlockBroken { id: GRASS });
        assert_eq!(harness.controller.chunk(ChunkCoord::ORIGIN).unwrap().get_block(5, 10, 5), 0);
        assert!(!harness.controller.is_loading(ChunkCoord::ORIGIN));
    }

    #[test]
    fn queued_edits_apply_in_arrival_order() {
        let mut harness = Harness::flat(WorldConfig::default());

        harness.controller.handle_message(WorldRequest::SetBlock { x: 1, y: 20, z: 1, id: STONE });
        harness.controller.handle_message(WorldRequest::SetBlock { x: 1, y: 20, z: 1, id: 0 });
        harness.controller.handle_message(WorldRequest::SetBlock { x: 1, y: 21, z: 1, id: 2 });
        pollster::block_on(harness.controller.settle());

        let responses: Vec<WorldResponse> = harness.responses.try_iter().collect();
        assert_eq!(chunk_data(&responses).len(), 3);
        assert!(responses.contains(&WorldResponse::BlockBroken { id: STONE }));

        let chunk = harness.controller.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(chunk.get_block(1, 20, 1), 0);
        assert_eq!(chunk.get_block(1, 21, 1), 2);
    }

    #[test]
    fn duplicate_loads_share_one_task_and_one_emission() {
        let mut harness = Harness::flat(WorldConfig::default());

        for _ in 0..4 {
            harness.controller.handle_message(WorldRequest::LoadChunk { x: 7, z: 7 });
        }
        assert_eq!(harness.controller.in_flight_loads.len(), 1);

        pollster::block_on(harness.controller.settle());
        let responses: Vec<WorldResponse> = harness.responses.try_iter().collect();
        assert_eq!(responses.len(), 1);
        assert_eq!(harness.controller.resident_count(), 1);
    }

    #[test]
    fn load_and_edit_during_loading_share_the_load() {
        let mut harness = Harness::flat(WorldConfig::default());

        harness.controller.handle_message(WorldRequest::LoadChunk { x: 0, z: 0 });
        harness.controller.handle_message(WorldRequest::SetBlock { x: 0, y: 10, z: 0, id: 0 });
        assert_eq!(harness.controller.in_flight_loads.len(), 1);

        pollster::block_on(harness.controller.settle());
        let responses: Vec<WorldResponse> = harness.responses.try_iter().collect();

        // Load mesh, then the break and the edited mesh.
        assert_eq!(responses.len(), 3);
        assert!(matches!(responses[0], WorldResponse::ChunkData(_)));
        assert_eq!(responses[1], WorldResponse::BlockBroken { id: GRASS });
        assert!(matches!(responses[2], WorldResponse::ChunkData(_)));
    }

    #[test]
    fn empty_chunk_sends_nothing_on_load_but_always_on_edit() {
        let persistence = MemoryPersistence::new();
        pollster::block_on(persistence.save_chunk(ChunkCoord::ORIGIN, vec![0; CHUNK_VOLUME]))
            .unwrap();
        let mut harness = Harness::with_persistence(WorldConfig::default(), persistence);

        let responses = harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });
        assert!(responses.is_empty());
        assert!(harness.controller.chunk(ChunkCoord::ORIGIN).unwrap().is_dirty());

        let responses = harness.send(WorldRequest::SetBlock { x: 0, y: 0, z: 0, id: 0 });
        let data = chunk_data(&responses);
        assert_eq!(data.len(), 1);
        assert!(data[0].geometry.is_empty());
    }

    #[test]
    fn out_of_range_height_still_saves_and_emits() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });
        let before = harness.controller.chunk(ChunkCoord::ORIGIN).unwrap().to_bytes();

        let responses = harness.send(WorldRequest::SetBlock { x: 3, y: 500, z: 3, id: STONE });

        assert_eq!(chunk_data(&responses).len(), 1);
        assert_eq!(harness.persistence.record(ChunkCoord::ORIGIN), Some(before));
    }

    #[test]
    fn every_edit_saves_the_whole_chunk() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        let mut rng = fastrand::Rng::with_seed(42);
        let edits = 25;
        for _ in 0..edits {
            harness.send(WorldRequest::SetBlock {
                x: rng.i32(0..16),
                y: rng.i32(0..128),
                z: rng.i32(0..16),
                id: rng.u8(0..4),
            });
        }

        assert_eq!(harness.persistence.save_count(), edits);
        assert_eq!(
            harness.persistence.record(ChunkCoord::ORIGIN).unwrap().len(),
            CHUNK_VOLUME
        );
    }

    #[test]
    fn refresh_area_loads_the_square_around_the_player() {
        let mut harness = Harness::flat(WorldConfig::default());

        let responses = harness.send(WorldRequest::RefreshArea { x: -0.5, z: 33.0 });

        let center = ChunkCoord::new(-1, 2);
        assert_eq!(harness.controller.center(), Some(center));
        assert_eq!(chunk_data(&responses).len(), 25);
        for position in center.chunks_in_radius(2) {
            assert!(harness.controller.is_resident(position));
        }

        // A second refresh sends every chunk again but loads nothing new.
        let responses = harness.send(WorldRequest::RefreshArea { x: -0.5, z: 33.0 });
        assert_eq!(chunk_data(&responses).len(), 25);
        assert_eq!(harness.controller.resident_count(), 25);
    }

    #[test]
    fn moving_away_evicts_the_farthest_chunks() {
        let config = WorldConfig {
            max_resident_chunks: 25,
            ..WorldConfig::default()
        };
        let mut harness = Harness::flat(config);

        harness.send(WorldRequest::RefreshArea { x: 0.0, z: 0.0 });
        harness.send(WorldRequest::RefreshArea { x: 16.0, z: 0.0 });

        assert_eq!(harness.controller.resident_count(), 25);
        for position in ChunkCoord::new(1, 0).chunks_in_radius(2) {
            assert!(harness.controller.is_resident(position), "{position} missing");
        }
        for z in -2..=2 {
            assert!(!harness.controller.is_resident(ChunkCoord::new(-2, z)));
        }
    }

    #[test]
    fn evicted_chunk_with_unconfirmed_edit_is_saved() {
        let (mut controller, _responses, persistence) = flaky(1, 5);
        controller.handle_message(WorldRequest::SetBlock { x: 0, y: 10, z: 0, id: 0 });
        pollster::block_on(controller.settle());

        assert_eq!(controller.pending_writes(), 1);
        assert!(controller.has_unsaved_edits(ChunkCoord::ORIGIN));
        assert!(persistence.is_empty());

        assert!(controller.unload_chunk(ChunkCoord::ORIGIN));
        // The unload save supersedes the queued failure.
        assert_eq!(controller.pending_writes(), 0);
        pollster::block_on(controller.settle());

        let record = persistence.record(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(record[Chunk::index(0, 10, 0).unwrap()], 0);
        assert!(!controller.unload_chunk(ChunkCoord::ORIGIN));
    }

    #[test]
    fn reload_before_the_flush_lands_keeps_the_edit() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        // Nothing settles between the edit, the unload and the reload.
        harness.controller.handle_message(WorldRequest::SetBlock { x: 0, y: 10, z: 0, id: 0 });
        assert!(harness.controller.unload_chunk(ChunkCoord::ORIGIN));
        harness.controller.handle_message(WorldRequest::LoadChunk { x: 0, z: 0 });
        pollster::block_on(harness.controller.settle());

        let chunk = harness.controller.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(chunk.get_block(0, 10, 0), 0);
        assert!(!harness.controller.has_unsaved_edits(ChunkCoord::ORIGIN));

        // A later edit must not write the pre-edit blocks back.
        harness.send(WorldRequest::SetBlock { x: 1, y: 10, z: 1, id: 0 });
        let record = harness.persistence.record(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(record[Chunk::index(0, 10, 0).unwrap()], 0);
        assert_eq!(record[Chunk::index(1, 10, 1).unwrap()], 0);
    }

    #[test]
    fn refresh_after_a_retry_restores_the_evicted_edit() {
        let config = WorldConfig {
            max_resident_chunks: 25,
            max_save_attempts: 3,
            ..WorldConfig::default()
        };
        let (mut controller, _responses, persistence) = flaky_with_config(3, &config);
        // One pass of the worker loop.
        fn batch(controller: &mut WorldController, request: WorldRequest) {
            controller.retry_failed_writes();
            controller.handle_message(request);
            pollster::block_on(controller.settle());
        }

        batch(&mut controller, WorldRequest::RefreshArea { x: 0.0, z: 0.0 });
        batch(&mut controller, WorldRequest::SetBlock { x: 0, y: 10, z: 0, id: 0 });
        batch(&mut controller, WorldRequest::RefreshArea { x: 200.0, z: 0.0 });
        assert!(!controller.is_resident(ChunkCoord::ORIGIN));
        assert_eq!(controller.pending_writes(), 1);

        batch(&mut controller, WorldRequest::RefreshArea { x: 0.0, z: 0.0 });

        let chunk = controller.chunk(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(chunk.get_block(0, 10, 0), 0);
        assert!(!controller.has_unsaved_edits(ChunkCoord::ORIGIN));
        let record = persistence.record(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(record[Chunk::index(0, 10, 0).unwrap()], 0);

        batch(&mut controller, WorldRequest::SetBlock { x: 2, y: 10, z: 2, id: 0 });
        let record = persistence.record(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(record[Chunk::index(0, 10, 0).unwrap()], 0);
    }

    #[test]
    fn abandoned_save_of_an_unloaded_chunk_stays_in_memory() {
        let (mut controller, _responses, persistence) = flaky(10, 1);
        controller.handle_message(WorldRequest::SetBlock { x: 6, y: 10, z: 6, id: 0 });
        pollster::block_on(controller.settle());

        assert!(controller.unload_chunk(ChunkCoord::ORIGIN));
        pollster::block_on(controller.settle());
        assert_eq!(controller.pending_writes(), 0);
        assert!(persistence.is_empty());

        controller.handle_message(WorldRequest::LoadChunk { x: 0, z: 0 });
        pollster::block_on(controller.settle());

        assert_eq!(controller.chunk(ChunkCoord::ORIGIN).unwrap().get_block(6, 10, 6), 0);
        assert!(controller.has_unsaved_edits(ChunkCoord::ORIGIN));
    }

    #[test]
    fn clean_chunks_unload_without_saving() {
        let mut harness = Harness::flat(WorldConfig::default());
        harness.send(WorldRequest::LoadChunk { x: 0, z: 0 });

        assert!(harness.controller.unload_chunk(ChunkCoord::ORIGIN));
        pollster::block_on(harness.controller.settle());

        assert_eq!(harness.persistence.save_count(), 0);
        assert!(!harness.controller.is_resident(ChunkCoord::ORIGIN));
    }

    #[test]
    fn failed_saves_are_retried() {
        let (mut controller, _responses, persistence) = flaky(2, 3);
        controller.handle_message(WorldRequest::SetBlock { x: 2, y: 10, z: 2, id: 0 });
        pollster::block_on(controller.settle());
        assert_eq!(controller.pending_writes(), 1);

        controller.retry_failed_writes();
        pollster::block_on(controller.settle());
        assert_eq!(controller.pending_writes(), 1);

        controller.retry_failed_writes();
        pollster::block_on(controller.settle());
        assert_eq!(controller.pending_writes(), 0);
        assert!(persistence.contains(ChunkCoord::ORIGIN));
        assert!(!controller.has_unsaved_edits(ChunkCoord::ORIGIN));
    }

    #[test]
    fn saves_are_given_up_after_max_attempts() {
        let (mut controller, _responses, persistence) = flaky(10, 2);
        controller.handle_message(WorldRequest::SetBlock { x: 2, y: 10, z: 2, id: 0 });
        pollster::block_on(controller.settle());

        controller.retry_failed_writes();
        pollster::block_on(controller.settle());

        assert_eq!(controller.pending_writes(), 0);
        assert!(persistence.is_empty());
        // The edit itself is still in memory.
        assert!(controller.has_unsaved_edits(ChunkCoord::ORIGIN));
        assert_eq!(controller.chunk(ChunkCoord::ORIGIN).unwrap().get_block(2, 10, 2), 0);
    }

    #[test]
    fn a_newer_edit_replaces_a_queued_failure() {
        let (mut controller, _responses, persistence) = flaky(1, 3);
        controller.handle_message(WorldRequest::SetBlock { x: 2, y: 10, z: 2, id: 0 });
        pollster::block_on(controller.settle());
        assert_eq!(controller.pending_writes(), 1);

        controller.handle_message(WorldRequest::SetBlock { x: 3, y: 10, z: 3, id: 0 });
        pollster::block_on(controller.settle());

        assert_eq!(controller.pending_writes(), 0);
        let record = persistence.record(ChunkCoord::ORIGIN).unwrap();
        assert_eq!(record[Chunk::index(2, 10, 2).unwrap()], 0);
        assert_eq!(record[Chunk::index(3, 10, 3).unwrap()], 0);
    }

    #[test]
    fn noise_terrain_round_trips_through_persistence() {
        let persistence = MemoryPersistence::new();
        let (sender, _responses) = channel();
        let mut controller = WorldController::new(
            &WorldConfig::default(),
            Arc::new(TerrainGenerator::new("round trip")),
            Arc::new(persistence.clone()),
            sender,
        );

        controller.handle_message(WorldRequest::LoadChunk { x: 4, z: 4 });
        pollster::block_on(controller.settle());
        controller.handle_message(WorldRequest::SetBlock { x: 64, y: 0, z: 64, id: 0 });
        pollster::block_on(controller.settle());

        let resident = controller.chunk(ChunkCoord::new(4, 4)).unwrap().to_bytes();
        assert_eq!(persistence.record(ChunkCoord::new(4, 4)), Some(resident));
    }
}
