//! # Voxel Task System
//!
//! Asynchronous chunk work driven by the world controller. A task owns everything it
//! needs, `process` turns it into a future, and the future resolves to a result the
//! controller applies once it completes. Many tasks may be in flight at once.

pub mod chunk_load_task;
pub mod chunk_save_task;
