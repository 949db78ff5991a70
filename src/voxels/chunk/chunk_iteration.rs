//! # Chunk Iteration Module
//!
//! A bounded, forward-only walk over one chunk's block array.
//!
//! The walk visits x fastest, then y, then z, from a starting layer up to an
//! inclusive top layer, optionally restricted to a rectangular footprint on the
//! horizontal plane. Layers below zero are the floor beneath the world; they are
//! not stored, and every cell in them reads as [`Block::GROUND`].

use cgmath::Point3;

use crate::core::StResource;
use crate::error::{WorldError, WorldResult};
use crate::voxels::block::Block;
use crate::voxels::coords::{ChunkCoordinate, ChunkDimensions};

use super::Chunk;

/// Inclusive horizontal rectangle `[left, right] x [back, front]` in chunk-local
/// coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    pub left: i32,
    pub right: i32,
    pub back: i32,
    pub front: i32,
}

impl Footprint {
    /// The whole horizontal extent of a chunk.
    pub fn full(dimensions: ChunkDimensions) -> Self {
        Footprint {
            left: 0,
            right: dimensions.blocks_x - 1,
            back: 0,
            front: dimensions.blocks_y - 1,
        }
    }

    fn validate(&self, dimensions: ChunkDimensions) -> WorldResult<()> {
        let fits = 0 <= self.left
            && self.left <= self.right
            && self.right < dimensions.blocks_x
            && 0 <= self.back
            && self.back <= self.front
            && self.front < dimensions.blocks_y;
        if fits {
            Ok(())
        } else {
            Err(WorldError::OutOfBounds {
                index: (self.right, self.front, 0),
                bounds: (dimensions.blocks_x, dimensions.blocks_y, dimensions.blocks_z),
            })
        }
    }
}

/// Bounded dense-array iterator over a single chunk.
///
/// Holding the iterator keeps a handle to its chunk, which pins the chunk in
/// the store until the iterator is dropped. The iterator cannot be rewound;
/// build a new one to walk the chunk again.
pub struct ChunkBlockIterator {
    /// Pinned handle to the chunk being walked
    chunk: StResource<Chunk>,
    footprint: Footprint,
    limit_z: i32,
    /// Position the next call to `get_next_block` will yield
    cursor: Option<Point3<i32>>,
    /// Position most recently yielded
    current: Option<Point3<i32>>,
}

impl ChunkBlockIterator {
    /// Walks the whole horizontal extent of `chunk` from `start_z` to `top_z`.
    ///
    /// # Errors
    /// `OutOfBounds` when `top_z` is at or above the chunk height.
    pub fn new(chunk: StResource<Chunk>, start_z: i32, top_z: i32) -> WorldResult<Self> {
        let footprint = Footprint::full(chunk.get().dimensions());
        Self::with_footprint(chunk, start_z, top_z, footprint)
    }

    /// Walks only the cells inside `footprint`.
    ///
    /// # Errors
    /// `OutOfBounds` when `top_z` is at or above the chunk height or the
    /// footprint does not fit inside the chunk.
    pub fn with_footprint(
        chunk: StResource<Chunk>,
        start_z: i32,
        top_z: i32,
        footprint: Footprint,
    ) -> WorldResult<Self> {
        let dimensions = chunk.get().dimensions();
        footprint.validate(dimensions)?;
        if top_z >= dimensions.blocks_z {
            return Err(WorldError::OutOfBounds {
                index: (footprint.right, footprint.front, top_z),
                bounds: (dimensions.blocks_x, dimensions.blocks_y, dimensions.blocks_z),
            });
        }

        let cursor = (start_z <= top_z).then(|| Point3::new(footprint.left, footprint.back, start_z));

        Ok(ChunkBlockIterator {
            chunk,
            footprint,
            limit_z: top_z,
            cursor,
            current: None,
        })
    }

    /// True while the cursor has not passed `(right, front, top_z)`.
    pub fn has_next(&self) -> bool {
        self.cursor.is_some()
    }

    /// Yields the block under the cursor and advances x, then y, then z.
    ///
    /// # Errors
    /// `Exhausted` when called after `has_next` turned false.
    pub fn get_next_block(&mut self) -> WorldResult<Block> {
        let position = self.cursor.ok_or(WorldError::Exhausted)?;

        let block = if position.z < 0 {
            Block::GROUND
        } else {
            self.chunk.get().get(position.x, position.y, position.z)?
        };

        self.current = Some(position);
        self.cursor = self.successor(position);
        Ok(block)
    }

    fn successor(&self, mut position: Point3<i32>) -> Option<Point3<i32>> {
        position.x += 1;
        if position.x > self.footprint.right {
            position.x = self.footprint.left;
            position.y += 1;
            if position.y > self.footprint.front {
                position.y = self.footprint.back;
                position.z += 1;
                if position.z > self.limit_z {
                    return None;
                }
            }
        }
        Some(position)
    }

    /// Chunk-local position of the block most recently yielded.
    ///
    /// `None` until the first call to `get_next_block`.
    pub fn current_index(&self) -> Option<Point3<i32>> {
        self.current
    }

    /// Coordinate of the chunk being walked.
    pub fn chunk_coordinate(&self) -> ChunkCoordinate {
        self.chunk.get().coordinate()
    }

    /// The pinned chunk handle.
    pub fn chunk(&self) -> &StResource<Chunk> {
        &self.chunk
    }
}

impl Iterator for ChunkBlockIterator {
    type Item = (Point3<i32>, Block);

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.get_next_block().ok()?;
        self.current.map(|position| (position, block))
    }
}
