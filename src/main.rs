//! # Voxel Chunk Engine Entry Point
//!
//! Native headless runner. Generates (or loads from `saves/world`) the area around the
//! origin, logs what it built and exits.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! WORLD_CONFIG=world.json RUST_LOG=debug cargo run
//! ```

fn main() {
    #[cfg(not(target_family = "wasm"))]
    voxel_chunk_engine::run();
}
