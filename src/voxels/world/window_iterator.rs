//! # Window Iterator
//!
//! Walks the 3x3 neighbourhood of chunks around a centre chunk, the region a
//! camera in the centre chunk can see. Chunks are visited row by row, left to
//! right, starting at `(cx - 1, cy - 1)`:
//!
//! ```text
//!   row cy+1   6 7 8
//!   row cy     3 4 5
//!   row cy-1   0 1 2
//!          cx-1 cx cx+1
//! ```
//!
//! A chunk that is not resident is loaded when the walk reaches it, never
//! skipped. Indices are reported in window space: the whole neighbourhood is
//! one `3 * blocks_x` by `3 * blocks_y` grid, which maps straight onto a
//! flattened render buffer.

use cgmath::Point3;

use crate::core::StResource;
use crate::error::{WorldError, WorldResult};
use crate::voxels::block::Block;
use crate::voxels::chunk::{Chunk, ChunkBlockIterator};
use crate::voxels::coords::ChunkCoordinate;

use super::ChunkStore;

/// Iterator over the 3x3 chunk window around `center`.
///
/// Borrows the store mutably for its whole life since advancing may load.
pub struct WindowIterator<'a, S: ChunkStore + ?Sized> {
    store: &'a mut S,
    center: ChunkCoordinate,
    /// Chunk currently being walked
    column: i32,
    row: i32,
    current: ChunkBlockIterator,
    start_z: i32,
    top_z: i32,
}

impl<'a, S: ChunkStore + ?Sized> WindowIterator<'a, S> {
    /// Focuses the store on `center` and loads the first window chunk.
    ///
    /// # Errors
    /// `OutOfBounds` when `top_z` is at or above the chunk height.
    pub fn new(store: &'a mut S, center: ChunkCoordinate, start_z: i32, top_z: i32) -> WorldResult<Self> {
        store.set_focus(center);
        let column = center.x - 1;
        let row = center.y - 1;
        let chunk = store.load_chunk(ChunkCoordinate::new(column, row));
        let current = ChunkBlockIterator::new(chunk, start_z, top_z)?;
        Ok(WindowIterator {
            store,
            center,
            column,
            row,
            current,
            start_z,
            top_z,
        })
    }

    pub fn center(&self) -> ChunkCoordinate {
        self.center
    }

    /// Coordinate of the chunk currently being walked.
    pub fn current_chunk_coordinate(&self) -> ChunkCoordinate {
        ChunkCoordinate::new(self.column, self.row)
    }

    /// Handle of the chunk currently being walked.
    pub fn current_chunk(&self) -> &StResource<Chunk> {
        self.current.chunk()
    }

    /// True while the current chunk is not the last one of the window.
    pub fn has_next_chunk(&self) -> bool {
        self.column < self.center.x + 1 || self.row < self.center.y + 1
    }

    pub fn has_next(&self) -> bool {
        // An empty z range makes every chunk empty, so only the current one counts.
        self.current.has_next() || (self.has_next_chunk() && self.start_z <= self.top_z)
    }

    /// Moves to the next window chunk, loading it if needed.
    fn advance_chunk(&mut self) -> WorldResult<()> {
        if self.column <= self.center.x {
            self.column += 1;
        } else {
            self.column = self.center.x - 1;
            self.row += 1;
        }
        let chunk = self
            .store
            .load_chunk(ChunkCoordinate::new(self.column, self.row));
        // Replacing the iterator releases the pin on the previous chunk.
        self.current = ChunkBlockIterator::new(chunk, self.start_z, self.top_z)?;
        Ok(())
    }

    /// Yields the next block of the window.
    ///
    /// # Errors
    /// `Exhausted` after the last block of the last window chunk.
    pub fn get_next_block(&mut self) -> WorldResult<Block> {
        if !self.current.has_next() {
            if !self.has_next() {
                return Err(WorldError::Exhausted);
            }
            self.advance_chunk()?;
        }
        self.current.get_next_block()
    }

    /// Window-space index of the block most recently yielded: `x` in
    /// `[0, 3 * blocks_x)`, `y` in `[0, 3 * blocks_y)`, `z` unchanged.
    pub fn current_index(&self) -> Option<Point3<i32>> {
        let local = self.current.current_index()?;
        let dimensions = self.store.dimensions();
        Some(Point3::new(
            local.x + (self.column - self.center.x + 1) * dimensions.blocks_x,
            local.y + (self.row - self.center.y + 1) * dimensions.blocks_y,
            local.z,
        ))
    }
}

impl<S: ChunkStore + ?Sized> Iterator for WindowIterator<'_, S> {
    /// Window-space index and block.
    type Item = (Point3<i32>, Block);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.get_next_block().ok()?;
        self.current_index().map(|index| (index, block))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use cgmath::Point2;

    use super::*;
    use crate::voxels::coords::ChunkDimensions;
    use crate::voxels::generation::CheckerboardGenerator;
    use crate::voxels::world::World;

    fn world() -> World {
        World::new(ChunkDimensions::new(2, 3, 2), Box::new(CheckerboardGenerator))
    }

    #[test]
    fn visits_chunks_row_major() {
        let mut world = world();
        let mut iter = world.iterate_window(Point2::new(0, 0), 0, 0).unwrap();
        let mut order = vec![iter.current_chunk_coordinate()];
        while iter.has_next() {
            iter.get_next_block().unwrap();
            if order.last() != Some(&iter.current_chunk_coordinate()) {
                order.push(iter.current_chunk_coordinate());
            }
        }
        let expected: Vec<_> = (-1..=1)
            .flat_map(|y| (-1..=1).map(move |x| Point2::new(x, y)))
            .collect();
        assert_eq!(order, expected);
        assert!(!iter.has_next_chunk());
        assert_eq!(iter.get_next_block(), Err(WorldError::Exhausted));
    }

    #[test]
    fn window_indices_tile_the_neighbourhood() {
        let mut world = world();
        let indices: Vec<_> = world
            .iterate_window(Point2::new(-4, 7), 0, 1)
            .unwrap()
            .map(|(index, _)| index)
            .collect();
        assert_eq!(indices.len(), 9 * 12);
        let unique: HashSet<_> = indices.iter().map(|p| (p.x, p.y, p.z)).collect();
        assert_eq!(unique.len(), indices.len());
        assert!(indices
            .iter()
            .all(|p| (0..6).contains(&p.x) && (0..9).contains(&p.y) && (0..2).contains(&p.z)));
    }

    #[test]
    fn blocks_match_world_positions() {
        let mut world = world();
        let blocks: Vec<_> = world.iterate_window(Point2::new(3, -2), 1, 1).unwrap().collect();
        for (index, block) in blocks {
            // Window origin is the lower-left corner of chunk (2, -3).
            let x = index.x + 2 * 2;
            let y = index.y - 3 * 3;
            let expected = if (x + y + index.z).rem_euclid(2) == 0 {
                crate::voxels::block::block_type::BlockType::DIRT
            } else {
                crate::voxels::block::block_type::BlockType::AIR
            };
            assert_eq!(block.native_type(), Some(expected));
        }
    }

    #[test]
    fn loads_lazily_and_sets_focus() {
        let mut world = world();
        {
            let iter = world.iterate_window(Point2::new(0, 0), 0, 1).unwrap();
            assert_eq!(iter.center(), Point2::new(0, 0));
        }
        assert_eq!(world.stats().loads, 1);
        assert!(world.contains_chunk(Point2::new(-1, -1)));
    }

    #[test]
    fn rejects_top_above_height() {
        let mut world = world();
        assert!(matches!(
            world.iterate_window(Point2::new(0, 0), 0, 2),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_z_range_yields_nothing() {
        let mut world = world();
        let mut iter = world.iterate_window(Point2::new(0, 0), 1, 0).unwrap();
        assert!(!iter.has_next());
        assert!(iter.next().is_none());
    }
}
