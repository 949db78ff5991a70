//! # Block Module
//!
//! The block record stored in every chunk cell, and the native block vocabulary.

use block_type::BlockType;

pub mod block_type;

/// Integer block id. Native ids are [`BlockType`] discriminants; foreign ids
/// that have no remap entry pass through unchanged, so the type is wide and signed.
pub type BlockId = i32;

/// A single voxel: a type id plus an auxiliary value (orientation, fluid
/// level, ...) whose meaning belongs to the block type.
///
/// # Memory Layout
/// `#[repr(C)]` and `Pod` so a chunk's block array can be handed to a GPU
/// buffer or a byte-oriented writer without conversion.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// The type of this block.
    pub block_type: BlockId,
    /// Type-specific auxiliary value.
    pub aux: i32,
}

impl Block {
    /// The empty block.
    pub const AIR: Block = Block {
        block_type: BlockType::AIR as BlockId,
        aux: 0,
    };

    /// Shared sentinel returned for every position below `z = 0`. The floor
    /// beneath the world is never stored in a chunk.
    pub const GROUND: Block = Block {
        block_type: BlockType::BEDROCK as BlockId,
        aux: 0,
    };

    /// Creates a block of a native type.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type as BlockId,
            aux: 0,
        }
    }

    /// Creates a block from a raw id, as produced by a generator.
    pub fn from_id(block_type: BlockId) -> Self {
        Block { block_type, aux: 0 }
    }

    pub fn with_aux(self, aux: i32) -> Self {
        Block { aux, ..self }
    }

    /// The native type, if the id belongs to the native vocabulary.
    pub fn native_type(&self) -> Option<BlockType> {
        BlockType::from_id(self.block_type)
    }

    /// Whether the block obstructs movement. Ids outside the native
    /// vocabulary count as solid.
    pub fn is_solid(&self) -> bool {
        self.native_type().map_or(true, BlockType::is_solid)
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_the_zeroed_block() {
        let zeroed: Block = bytemuck::Zeroable::zeroed();
        assert_eq!(zeroed, Block::AIR);
        assert!(!Block::AIR.is_solid());
    }

    #[test]
    fn unknown_ids_are_solid() {
        assert!(Block::from_id(-1).is_solid());
        assert!(Block::from_id(4096).is_solid());
        assert!(!Block::new(BlockType::WATER).is_solid());
    }

    #[test]
    fn ground_sentinel_is_bedrock() {
        assert_eq!(Block::GROUND.native_type(), Some(BlockType::BEDROCK));
    }
}
