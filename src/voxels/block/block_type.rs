//! # Block Type Module
//!
//! The native block vocabulary. Generators emit these ids; the external source
//! adapter remaps foreign ids onto them.

use num_derive::FromPrimitive;

use super::BlockId;

/// Enumerates the block types the native world knows about.
///
/// The `FromPrimitive` derive allows conversion from raw ids read out of
/// chunks or foreign sources.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// An air block, which is non-solid and transparent.
    AIR = 0,
    /// A basic dirt block.
    DIRT = 1,
    /// A grass-topped dirt block.
    GRASS = 2,
    /// A wooden block.
    WOOD = 3,
    /// A plain white block, mostly used for testing.
    WHITE = 4,
    /// Bare stone.
    STONE = 5,
    /// Water; occupies space but does not obstruct movement.
    WATER = 6,
    /// The indestructible floor. Also the ground sentinel below the world.
    BEDROCK = 7,
}

impl BlockType {
    /// Looks up the native type for a raw id.
    pub fn from_id(id: BlockId) -> Option<Self> {
        num::FromPrimitive::from_i32(id)
    }

    pub fn is_solid(self) -> bool {
        !matches!(self, BlockType::AIR | BlockType::WATER)
    }

    /// Picks a random solid surface type (DIRT, GRASS or WOOD).
    pub fn random_solid(rng: &mut fastrand::Rng) -> Self {
        Self::from_id(rng.i32(1..4)).unwrap_or(BlockType::DIRT)
    }
}
