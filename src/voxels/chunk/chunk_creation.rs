//! # Chunk Creation Module
//!
//! A builder that accepts blocks in storage order (x-fastest, then y, then z)
//! and keeps the block array and the solid mask consistent while doing so.

use bitvec::vec::BitVec;

use crate::voxels::block::Block;
use crate::voxels::coords::{ChunkCoordinate, ChunkDimensions};

use super::Chunk;

/// Incrementally fills a chunk in storage order.
pub struct ChunkCreationIterator {
    /// Chunk coordinate of the chunk being created
    position: ChunkCoordinate,
    dimensions: ChunkDimensions,
    /// One bit per pushed block
    solid_array: BitVec,
    blocks: Vec<Block>,
}

impl ChunkCreationIterator {
    pub fn new(position: ChunkCoordinate, dimensions: ChunkDimensions) -> Self {
        let volume = dimensions.volume();
        ChunkCreationIterator {
            position,
            dimensions,
            solid_array: BitVec::with_capacity(volume),
            blocks: Vec::with_capacity(volume),
        }
    }

    /// Whether every cell has been pushed.
    pub fn is_complete(&self) -> bool {
        self.blocks.len() >= self.dimensions.volume()
    }

    /// Appends the block for the next cell in storage order.
    ///
    /// Blocks pushed after the chunk is complete are ignored.
    pub fn push_block(&mut self, block: Block) {
        if self.is_complete() {
            log::warn!(
                "ignoring block pushed past the end of chunk {:?}",
                self.position
            );
            return;
        }
        self.solid_array.push(block.is_solid());
        self.blocks.push(block);
    }

    /// Finalizes the chunk. Cells never pushed are air.
    pub fn return_chunk(mut self) -> Chunk {
        while !self.is_complete() {
            self.push_block(Block::AIR);
        }
        Chunk {
            position: self.position,
            dimensions: self.dimensions,
            solid_array: self.solid_array,
            blocks: self.blocks,
        }
    }
}
