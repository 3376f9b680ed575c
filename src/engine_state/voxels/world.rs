//! # World Module
//!
//! This module provides the `World` struct which holds the chunks currently resident in
//! memory. It is a bounded cache: once `capacity` chunks are resident, inserting another
//! evicts the least recently used one and hands it back to the caller, which saves it
//! first if it carries edits that persistence has not confirmed yet.
//!
//! ## Eviction order
//!
//! Every access through [`World::get_chunk_at`] marks the chunk as recently used. An area
//! refresh walks its chunks from the farthest ring to the centre and promotes each one
//! ([`World::promote_by_distance`]), so the least recently used entry is always the chunk
//! farthest from the last known player position.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::engine_state::voxels::chunk::{Chunk, ChunkCoord};

/// A chunk held in memory together with its persistence state.
#[derive(Debug, Clone)]
pub struct ResidentChunk {
    pub chunk: Chunk,
    /// Set while the latest edit has not been confirmed by persistence.
    pub unsaved: bool,
}

impl ResidentChunk {
    pub fn new(chunk: Chunk) -> Self {
        ResidentChunk {
            chunk,
            unsaved: false,
        }
    }
}

/// The resident chunk cache.
pub struct World {
    chunks: LruCache<ChunkCoord, ResidentChunk>,
}

impl World {
    /// Creates an empty world that keeps at most `capacity` chunks resident.
    pub fn new(capacity: NonZeroUsize) -> Self {
        World {
            chunks: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.chunks.cap().get()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, position: ChunkCoord) -> bool {
        self.chunks.contains(&position)
    }

    /// Inserts a chunk as the most recently used entry.
    ///
    /// Returns the chunk that had to be evicted to make room, if any. Inserting a chunk
    /// at a position that is already resident replaces it and evicts nothing.
    pub fn add_chunk(&mut self, resident: ResidentChunk) -> Option<(ChunkCoord, ResidentChunk)> {
        let position = resident.chunk.position;
        match self.chunks.push(position, resident) {
            Some((evicted_position, _)) if evicted_position == position => None,
            evicted => evicted,
        }
    }

    /// Mutable access to a resident chunk. Marks it as recently used.
    pub fn get_chunk_at(&mut self, position: ChunkCoord) -> Option<&mut ResidentChunk> {
        self.chunks.get_mut(&position)
    }

    /// Read access without touching the eviction order.
    pub fn peek_chunk_at(&self, position: ChunkCoord) -> Option<&ResidentChunk> {
        self.chunks.peek(&position)
    }

    /// Mutable access without touching the eviction order.
    pub fn peek_chunk_at_mut(&mut self, position: ChunkCoord) -> Option<&mut ResidentChunk> {
        self.chunks.peek_mut(&position)
    }

    pub fn remove_chunk(&mut self, position: ChunkCoord) -> Option<ResidentChunk> {
        self.chunks.pop(&position)
    }

    /// Promotes the resident chunks among `positions` from the farthest to the nearest
    /// to `center`, leaving the nearest one most recently used.
    pub fn promote_by_distance(&mut self, center: ChunkCoord, positions: &[ChunkCoord]) {
        let mut ordered = positions.to_vec();
        ordered.sort_by_key(|position| std::cmp::Reverse(position.chebyshev_distance(center)));
        for position in ordered {
            self.chunks.promote(&position);
        }
    }

    /// Resident positions, most recently used first.
    pub fn positions(&self) -> Vec<ChunkCoord> {
        self.chunks.iter().map(|(position, _)| *position).collect()
    }

    /// Position of the chunk that the next insertion past capacity would evict.
    pub fn eviction_candidate(&self) -> Option<ChunkCoord> {
        self.chunks.peek_lru().map(|(position, _)| *position)
    }
}
