//! # Engine State
//!
//! Everything that runs the voxel world, from block ids up to the consumer handle.
//!
//! * [`voxels`]: blocks, terrain, chunks, the resident cache and chunk tasks
//! * [`meshing`]: culled-face mesh extraction with top-face ambient occlusion
//! * [`persistence`]: asynchronous chunk record storage
//! * [`protocol`]: the request and response messages
//! * [`world_controller`]: the request handler that owns the resident chunks
//! * [`task_management`]: the worker thread hosting the controller
//! * [`world_client`]: the consumer's handle on a running world
//! * [`world_config`]: world settings

pub mod meshing;
pub mod persistence;
pub mod protocol;
pub mod task_management;
pub mod voxels;
pub mod world_client;
pub mod world_config;
pub mod world_controller;
