//! # World Client
//!
//! The consumer side of the protocol. A renderer holds a [`WorldClient`], tells it where
//! the player is and which blocks to break or place, and polls it for [`WorldEvent`]s.
//! The client keeps the latest mesh of every chunk it has received within the load radius
//! of the player; it never sees block data. Crossing into another chunk drops the meshes
//! that fell outside the new area, the way the controller's cache lets far chunks go.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use super::{
    meshing::MeshBuffers,
    persistence::ChunkPersistence,
    protocol::{WorldRequest, WorldResponse},
    task_management::WorldWorker,
    voxels::{
        block::{block_type::BlockType, BlockId},
        chunk::ChunkCoord,
    },
    world_config::WorldConfig,
};

#[cfg(not(target_family = "wasm"))]
use web_time::{Duration, Instant};

/// Something the renderer should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A new mesh replaced the previous one for this chunk.
    ChunkUpdated(ChunkCoord),
    /// The chunk's mesh is now empty and was dropped.
    ChunkCleared(ChunkCoord),
    /// The spawn chunk (0, 0) has geometry for the first time.
    SpawnReady,
    /// A block with this id was broken; it becomes the block to place next.
    BlockBroken(BlockId),
}

/// Meshes and placement state built from responses.
#[derive(Debug, Clone)]
pub struct WorldView {
    meshes: HashMap<ChunkCoord, MeshBuffers>,
    last_broken_block: BlockId,
    has_spawned: bool,
}

impl Default for WorldView {
    fn default() -> Self {
        WorldView {
            meshes: HashMap::new(),
            last_broken_block: BlockType::GRASS.id(),
            has_spawned: false,
        }
    }
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one response and reports what changed.
    pub fn apply(&mut self, response: WorldResponse) -> Vec<WorldEvent> {
        match response {
            WorldResponse::ChunkData(data) => {
                let position = data.position();
                debug!(
                    "Received chunk {} with {} vertices",
                    data.key,
                    data.geometry.vertex_count()
                );

                if data.geometry.is_empty() {
                    self.meshes.remove(&position);
                    return vec![WorldEvent::ChunkCleared(position)];
                }

                self.meshes.insert(position, data.geometry);
                let mut events = vec![WorldEvent::ChunkUpdated(position)];
                if position == ChunkCoord::ORIGIN && !self.has_spawned {
                    self.has_spawned = true;
                    info!("Spawn chunk is ready");
                    events.push(WorldEvent::SpawnReady);
                }
                events
            }
            WorldResponse::BlockBroken { id } => {
                self.last_broken_block = id;
                debug!("Last broken block id: {}", id);
                vec![WorldEvent::BlockBroken(id)]
            }
        }
    }

    pub fn mesh(&self, position: ChunkCoord) -> Option<&MeshBuffers> {
        self.meshes.get(&position)
    }

    pub fn chunk_count(&self) -> usize {
        self.meshes.len()
    }

    /// Chunks with a mesh, in no particular order.
    pub fn chunk_positions(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.meshes.keys().copied()
    }

    /// Drops every mesh farther than `radius` chunks from `center`.
    pub fn retain_area(&mut self, center: ChunkCoord, radius: i32) -> Vec<WorldEvent> {
        let outside: Vec<ChunkCoord> = self
            .meshes
            .keys()
            .copied()
            .filter(|position| position.chebyshev_distance(center) > radius)
            .collect();

        for position in &outside {
            self.meshes.remove(position);
        }
        if !outside.is_empty() {
            debug!("Dropped {} meshes outside the area around {}", outside.len(), center);
        }
        outside.into_iter().map(WorldEvent::ChunkCleared).collect()
    }

    /// Total quads across every held mesh.
    pub fn quad_count(&self) -> usize {
        self.meshes.values().map(MeshBuffers::quad_count).sum()
    }

    pub fn last_broken_block(&self) -> BlockId {
        self.last_broken_block
    }

    pub fn has_spawned(&self) -> bool {
        self.has_spawned
    }
}

/// A world running on its own worker thread.
pub struct WorldClient {
    worker: WorldWorker,
    view: WorldView,
    player_chunk: ChunkCoord,
    load_radius: i32,
    /// Events produced on the consumer side, handed out by the next poll.
    pending_events: Vec<WorldEvent>,
}

impl WorldClient {
    /// Starts the worker and requests the area around the origin.
    pub fn new(config: WorldConfig, persistence: Arc<dyn ChunkPersistence>) -> Self {
        let load_radius = config.load_radius;
        let client = WorldClient {
            worker: WorldWorker::spawn(config, persistence),
            view: WorldView::new(),
            player_chunk: ChunkCoord::ORIGIN,
            load_radius,
            pending_events: Vec::new(),
        };
        client.update_chunks(0.0, 0.0);
        client
    }

    /// Requests every chunk within the load radius of a world position.
    pub fn update_chunks(&self, player_x: f32, player_z: f32) {
        self.send(WorldRequest::RefreshArea {
            x: player_x,
            z: player_z,
        });
    }

    /// Refreshes the area only when the player has crossed into another chunk, dropping
    /// the meshes left outside it.
    ///
    /// Returns `true` if a refresh was requested.
    pub fn update_player_position(&mut self, player_x: f32, player_z: f32) -> bool {
        let player_chunk = ChunkCoord::from_world_position(player_x, player_z);
        if player_chunk == self.player_chunk {
            return false;
        }
        self.player_chunk = player_chunk;
        let cleared = self.view.retain_area(player_chunk, self.load_radius);
        self.pending_events.extend(cleared);
        self.update_chunks(player_x, player_z);
        true
    }

    pub fn request_chunk(&self, x: i32, z: i32) {
        self.send(WorldRequest::LoadChunk { x, z });
    }

    pub fn set_block(&self, x: i32, y: i32, z: i32, id: BlockId) {
        self.send(WorldRequest::SetBlock { x, y, z, id });
    }

    pub fn break_block(&self, x: i32, y: i32, z: i32) {
        self.set_block(x, y, z, BlockType::AIR.id());
    }

    /// Places the most recently broken kind of block (grass until something is broken).
    pub fn place_block(&self, x: i32, y: i32, z: i32) {
        self.set_block(x, y, z, self.view.last_broken_block());
    }

    /// Applies every response that has arrived so far.
    pub fn poll_events(&mut self) -> Vec<WorldEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        while let Some(response) = self.worker.try_recv() {
            events.extend(self.view.apply(response));
        }
        events
    }

    /// Blocks until `condition` holds for the view or `timeout` passes.
    ///
    /// Returns every event seen while waiting and whether the condition was met.
    #[cfg(not(target_family = "wasm"))]
    pub fn wait_until<F>(&mut self, timeout: Duration, condition: F) -> (Vec<WorldEvent>, bool)
    where
        F: Fn(&WorldView) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll_events();

        while !condition(&self.view) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return (events, false);
            }
            match self.worker.recv_timeout(remaining) {
                Some(response) => events.extend(self.view.apply(response)),
                None => return (events, condition(&self.view)),
            }
        }
        (events, true)
    }

    pub fn view(&self) -> &WorldView {
        &self.view
    }

    pub fn player_chunk(&self) -> ChunkCoord {
        self.player_chunk
    }

    /// Stops the worker after it has finished every queued request.
    pub fn shutdown(self) {
        self.worker.shutdown();
    }

    fn send(&self, request: WorldRequest) {
        if !self.worker.send(request) {
            warn!("World worker has stopped; dropping request");
        }
    }
}
