//! Iteration over every chunk currently resident in a store.

use cgmath::Point3;

use crate::core::StResource;
use crate::error::{WorldError, WorldResult};
use crate::voxels::block::Block;
use crate::voxels::chunk::{Chunk, ChunkBlockIterator};
use crate::voxels::coords::{BlockCoordinate, ChunkCoordinate};

use super::ChunkStore;

/// Walks the resident chunks one after another, each from `start_z` to the
/// top of the world.
///
/// The set of chunks is captured when the iterator is built and the walk never
/// loads anything. The iterator borrows the store, so the resident set cannot
/// change under it. Only the chunk being walked is pinned.
pub struct ResidentIterator<'a, S: ChunkStore + ?Sized> {
    store: &'a S,
    remaining: std::vec::IntoIter<ChunkCoordinate>,
    start_z: i32,
    top_z: i32,
    current: Option<ChunkBlockIterator>,
}

impl<'a, S: ChunkStore + ?Sized> ResidentIterator<'a, S> {
    pub fn new(store: &'a S, start_z: i32) -> Self {
        let top_z = store.dimensions().blocks_z - 1;
        let mut iter = ResidentIterator {
            store,
            remaining: store.resident_coordinates().into_iter(),
            start_z,
            top_z,
            current: None,
        };
        iter.current = iter.next_chunk();
        iter
    }

    /// The next resident chunk that has anything to yield.
    fn next_chunk(&mut self) -> Option<ChunkBlockIterator> {
        for position in self.remaining.by_ref() {
            let Some(chunk) = self.store.get_chunk(position) else {
                continue;
            };
            match ChunkBlockIterator::new(chunk, self.start_z, self.top_z) {
                Ok(iter) if iter.has_next() => return Some(iter),
                Ok(_) => {}
                Err(err) => log::warn!("skipping chunk {:?}: {}", position, err),
            }
        }
        None
    }

    pub fn has_next(&self) -> bool {
        // Every chunk shares the z range, so any chunk left has blocks to yield.
        self.current.as_ref().is_some_and(ChunkBlockIterator::has_next)
            || (self.start_z <= self.top_z && !self.remaining.as_slice().is_empty())
    }

    /// Yields the next block, moving to the next resident chunk when the
    /// current one has run out.
    ///
    /// # Errors
    /// `Exhausted` once every resident chunk has been walked.
    pub fn get_next_block(&mut self) -> WorldResult<Block> {
        let finished = !self.current.as_ref().is_some_and(ChunkBlockIterator::has_next);
        if finished {
            if !self.has_next() {
                return Err(WorldError::Exhausted);
            }
            // Release the finished chunk before pinning the next one.
            self.current = None;
            self.current = Some(self.next_chunk().ok_or(WorldError::Exhausted)?);
        }
        self.current
            .as_mut()
            .ok_or(WorldError::Exhausted)?
            .get_next_block()
    }

    /// Chunk-local index of the block most recently yielded.
    pub fn current_index(&self) -> Option<Point3<i32>> {
        self.current.as_ref().and_then(ChunkBlockIterator::current_index)
    }

    /// Handle of the chunk the iterator is positioned in.
    pub fn current_chunk(&self) -> Option<&StResource<Chunk>> {
        self.current.as_ref().map(ChunkBlockIterator::chunk)
    }
}

impl<S: ChunkStore + ?Sized> Iterator for ResidentIterator<'_, S> {
    /// World-absolute position and block.
    type Item = (BlockCoordinate, Block);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.get_next_block().ok()?;
        let current = self.current.as_ref()?;
        let local = current.current_index()?;
        let world = self
            .store
            .dimensions()
            .block_of(current.chunk_coordinate(), local);
        Some((world, block))
    }
}
