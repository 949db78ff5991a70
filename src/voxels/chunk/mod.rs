//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense `blocks_x * blocks_y * blocks_z`
//! grid of blocks covering one native chunk column, the unit of generation,
//! caching and eviction.
//!
//! ## Storage
//!
//! Chunks keep two parallel structures:
//! - `blocks`: the dense block array, ordered x-fastest, then y, then z
//! - `solid_array`: one bit per cell, set where the block obstructs movement
//!
//! The bit vector lets collision queries and occupancy counts run without
//! touching the block records.
//!
//! ### Performance Characteristics
//! - **Block Lookup**: O(1)
//! - **Solidity Check**: O(1)
//! - **Memory Usage**: `size_of::<Block>()` per cell plus one bit per cell

use bitvec::prelude::BitVec;
use cgmath::Point3;
use chunk_creation::ChunkCreationIterator;

use super::block::Block;
use super::coords::{ChunkCoordinate, ChunkDimensions};
use super::generation::{Generator, SpawnDirective};
use crate::error::{WorldError, WorldResult};

mod chunk_creation;
pub mod chunk_iteration;

pub use chunk_iteration::{ChunkBlockIterator, Footprint};

/// A dense column of blocks at one chunk coordinate.
///
/// A chunk is filled once, when it is first referenced, by running the world's
/// generator over every cell. After that it is only changed through [`Chunk::set`].
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    position: ChunkCoordinate,
    /// Extent of the block array.
    dimensions: ChunkDimensions,
    /// One bit per cell, in the same order as `blocks`.
    solid_array: BitVec,
    /// Dense block storage, x-fastest, then y, then z.
    blocks: Vec<Block>,
}

impl Chunk {
    /// Creates a chunk filled with air.
    pub fn empty(position: ChunkCoordinate, dimensions: ChunkDimensions) -> Self {
        let mut cci = ChunkCreationIterator::new(position, dimensions);
        while !cci.is_complete() {
            cci.push_block(Block::AIR);
        }
        cci.return_chunk()
    }

    /// Fills a chunk by asking `generator` for every cell, in storage order.
    ///
    /// Spawn directives emitted along the way are appended to `spawns`.
    pub fn generate(
        position: ChunkCoordinate,
        dimensions: ChunkDimensions,
        generator: &mut dyn Generator,
        spawns: &mut Vec<SpawnDirective>,
    ) -> Self {
        let mut cci = ChunkCreationIterator::new(position, dimensions);

        for k in 0..dimensions.blocks_z {
            for j in 0..dimensions.blocks_y {
                for i in 0..dimensions.blocks_x {
                    let world = dimensions.block_of(position, Point3::new(i, j, k));
                    let id = generator.generate(world.x, world.y, world.z);
                    spawns.extend(generator.spawn_entities(world.x, world.y, world.z));
                    cci.push_block(Block::from_id(id));
                }
            }
        }

        cci.return_chunk()
    }

    /// The chunk coordinate this chunk was created for.
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.position
    }

    pub fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    fn check_bounds(&self, x: i32, y: i32, z: i32) -> WorldResult<usize> {
        if !self.dimensions.contains_local(x, y, z) {
            return Err(WorldError::OutOfBounds {
                index: (x, y, z),
                bounds: (
                    self.dimensions.blocks_x,
                    self.dimensions.blocks_y,
                    self.dimensions.blocks_z,
                ),
            });
        }
        Ok(self.dimensions.linear_index(x, y, z))
    }

    /// Reads the block at a chunk-local index.
    ///
    /// # Errors
    /// `OutOfBounds` when the index lies outside the block array.
    pub fn get(&self, x: i32, y: i32, z: i32) -> WorldResult<Block> {
        let offset = self.check_bounds(x, y, z)?;
        Ok(self.blocks[offset])
    }

    /// Replaces the block at a chunk-local index, keeping the solid mask in step.
    ///
    /// # Errors
    /// `OutOfBounds` when the index lies outside the block array.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: Block) -> WorldResult<()> {
        let offset = self.check_bounds(x, y, z)?;
        self.blocks[offset] = block;
        self.solid_array.set(offset, block.is_solid());
        Ok(())
    }

    /// Whether the block at a chunk-local index is solid. Out of range is not solid.
    pub fn is_block_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.check_bounds(x, y, z)
            .map(|offset| self.solid_array[offset])
            .unwrap_or(false)
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.solid_array.count_ones()
    }

    /// Approximate resident footprint in bytes, used by the store's byte budget.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.blocks.len() * std::mem::size_of::<Block>()
            + self.solid_array.len().div_ceil(8)
    }

    /// The raw block array, x-fastest, then y, then z.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
