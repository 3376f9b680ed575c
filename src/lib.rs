#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunk Engine
//!
//! The world side of a voxel game: deterministic terrain, dense 16x128x16 chunks,
//! culled-face meshing with top-face ambient occlusion, and asynchronous chunk
//! persistence, all driven through a small request/response protocol from a worker
//! thread. Rendering, input and physics live elsewhere and only see meshes.
//!
//! ## Key Modules
//!
//! * `core` - Shared resource handles used across threads
//! * `engine_state` - Voxels, meshing, persistence, the protocol and the world controller
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use voxel_chunk_engine::{MemoryPersistence, WorldClient, WorldConfig};
//!
//! let mut client = WorldClient::new(WorldConfig::default(), Arc::new(MemoryPersistence::new()));
//! client.update_player_position(40.0, -12.0);
//! for event in client.poll_events() {
//!     println!("{event:?}");
//! }
//! ```
//!
//! For web applications, `run_web()` sets up logging and `WebWorld` exchanges JSON
//! messages with JavaScript.

#[cfg(not(target_family = "wasm"))]
use std::sync::Arc;

#[cfg(not(target_family = "wasm"))]
use log::{error, info, warn};
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::*;

pub mod core;
pub mod engine_state;

pub use engine_state::{
    meshing::MeshBuffers,
    persistence::{ChunkPersistence, MemoryPersistence, PersistenceError},
    protocol::{ChunkData, WorldRequest, WorldResponse},
    voxels::{
        block::{block_type::BlockType, BlockId},
        chunk::{Chunk, ChunkCoord, ChunkError},
        terrain::{FlatTerrain, HeightField, TerrainGenerator},
    },
    world_client::{WorldClient, WorldEvent, WorldView},
    world_config::{ConfigError, GenerationMethod, WorldConfig},
    world_controller::WorldController,
};

#[cfg(not(target_family = "wasm"))]
pub use engine_state::persistence::FilePersistence;

/// Environment variable naming a JSON world config for `run()`.
pub const CONFIG_ENV: &str = "WORLD_CONFIG";

#[cfg(not(target_family = "wasm"))]
const STARTUP_TIMEOUT: web_time::Duration = web_time::Duration::from_secs(30);

/// Headless native entry: loads the area around the origin, reports it and exits.
#[cfg(not(target_family = "wasm"))]
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => match WorldConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("Could not use config {}: {}", path, err);
                return;
            }
        },
        Err(_) => WorldConfig::default(),
    };
    let area = config.area_chunk_count();

    info!("Saving chunks under {}", config.save_directory.display());
    let persistence = Arc::new(FilePersistence::new(&config.save_directory));
    let mut client = WorldClient::new(config, persistence);

    let (_, spawned) = client.wait_until(STARTUP_TIMEOUT, WorldView::has_spawned);
    if !spawned {
        warn!("Spawn chunk did not arrive within {:?}", STARTUP_TIMEOUT);
    }
    let (_, complete) = client.wait_until(STARTUP_TIMEOUT, |view| view.chunk_count() >= area);
    if !complete {
        warn!("Only {} of {} chunks arrived", client.view().chunk_count(), area);
    }

    let view = client.view();
    info!(
        "World ready: {} chunks, {} quads, spawn ready: {}",
        view.chunk_count(),
        view.quad_count(),
        view.has_spawned()
    );

    client.shutdown();
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("Logger was already initialized");
    }
}

/// A world hosted inside a browser worker, driven by JSON messages.
///
/// Records live in memory for the lifetime of the page.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub struct WebWorld {
    controller: WorldController,
    responses: std::sync::mpsc::Receiver<WorldResponse>,
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
impl WebWorld {
    /// Creates a world from a JSON config; an empty string uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WebWorld, JsValue> {
        let config = if config_json.trim().is_empty() {
            WorldConfig::default()
        } else {
            WorldConfig::from_json_str(config_json)
                .map_err(|err| JsValue::from_str(&err.to_string()))?
        };

        let (sender, responses) = std::sync::mpsc::channel();
        let controller = WorldController::new(
            &config,
            config.make_generator(),
            std::sync::Arc::new(MemoryPersistence::new()),
            sender,
        );
        Ok(WebWorld {
            controller,
            responses,
        })
    }

    /// Handles one JSON request and returns a JSON array of every response it produced.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, request_json: &str) -> Result<String, JsValue> {
        let request: WorldRequest = serde_json::from_str(request_json)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        self.controller.retry_failed_writes();
        self.controller.handle_message(request);
        pollster::block_on(self.controller.settle());

        let responses: Vec<WorldResponse> = self.responses.try_iter().collect();
        serde_json::to_string(&responses).map_err(|err| JsValue::from_str(&err.to_string()))
    }
}
