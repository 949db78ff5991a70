//! # Coordinate Hierarchy
//!
//! Pure conversions between the nested coordinate spaces of the world:
//!
//! * **Block** - world-absolute voxel position (`x`, `y` horizontal, `z` vertical)
//! * **Chunk** - native chunk grid position `(cx, cy)`; a chunk spans the full height
//! * **Chunk in dimension / region / chunk in region** - the external source's
//!   own chunk grid, grouped into square regions of `span x span` chunks
//!
//! All divisions are floor divisions. Coordinates are signed and extend in both
//! directions from the origin, so truncating division would map `-1` into region
//! `0` instead of region `-1`.

use cgmath::{Point2, Point3};
use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

/// World-absolute block position. `z` may be negative (below ground) or above
/// the chunk height.
pub type BlockCoordinate = Point3<i32>;

/// Native chunk grid position `(cx, cy)`.
pub type ChunkCoordinate = Point2<i32>;

/// Number of chunks along each side of an external region.
pub const REGION_CHUNK_SPAN: i32 = 32;

/// Floor division for a positive divisor.
#[inline]
pub fn floor_div(value: i32, span: i32) -> i32 {
    debug_assert!(span > 0, "span must be positive");
    value.div_euclid(span)
}

/// Floor modulo for a positive divisor; always in `[0, span)`.
#[inline]
pub fn floor_mod(value: i32, span: i32) -> i32 {
    debug_assert!(span > 0, "span must be positive");
    value.rem_euclid(span)
}

/// Block extent of every chunk in a world. Fixed for the lifetime of a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkDimensions {
    /// Blocks along x.
    pub blocks_x: i32,
    /// Blocks along y.
    pub blocks_y: i32,
    /// Blocks along z (the chunk height).
    pub blocks_z: i32,
}

impl Default for ChunkDimensions {
    fn default() -> Self {
        ChunkDimensions {
            blocks_x: 16,
            blocks_y: 16,
            blocks_z: 64,
        }
    }
}

impl ChunkDimensions {
    pub fn new(blocks_x: i32, blocks_y: i32, blocks_z: i32) -> Self {
        ChunkDimensions {
            blocks_x,
            blocks_y,
            blocks_z,
        }
    }

    /// Number of blocks in one chunk. Configured dimensions are capped at
    /// [`crate::config::MAX_CHUNK_VOLUME`], so the product fits an `i32`.
    pub fn volume(&self) -> usize {
        (self.blocks_x * self.blocks_y * self.blocks_z) as usize
    }

    /// Whether a chunk-local index lies inside the block array.
    pub fn contains_local(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.blocks_x).contains(&x)
            && (0..self.blocks_y).contains(&y)
            && (0..self.blocks_z).contains(&z)
    }

    /// Offset into a dense array ordered x-fastest, then y, then z.
    ///
    /// The caller must have checked the index with [`Self::contains_local`].
    #[inline]
    pub fn linear_index(&self, x: i32, y: i32, z: i32) -> usize {
        (x + self.blocks_x * (y + self.blocks_y * z)) as usize
    }

    /// Chunk containing a world block. The vertical axis is ignored.
    pub fn chunk_of_block(&self, block: BlockCoordinate) -> ChunkCoordinate {
        Point2::new(
            floor_div(block.x, self.blocks_x),
            floor_div(block.y, self.blocks_y),
        )
    }

    /// Horizontal position of a world block inside its chunk; `z` passes through.
    pub fn local_of_block(&self, block: BlockCoordinate) -> Point3<i32> {
        Point3::new(
            floor_mod(block.x, self.blocks_x),
            floor_mod(block.y, self.blocks_y),
            block.z,
        )
    }

    /// World position of a chunk-local index.
    pub fn block_of(&self, chunk: ChunkCoordinate, local: Point3<i32>) -> BlockCoordinate {
        Point3::new(
            chunk.x * self.blocks_x + local.x,
            chunk.y * self.blocks_y + local.y,
            local.z,
        )
    }
}

/// Position of a region in the external source's region grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoordinate {
    pub x: i32,
    pub z: i32,
}

impl RegionCoordinate {
    pub fn new(x: i32, z: i32) -> Self {
        RegionCoordinate { x, z }
    }

    /// Region holding a dimension chunk.
    pub fn containing(chunk: ChunkInDimensionCoordinate, span: i32) -> Self {
        RegionCoordinate {
            x: floor_div(chunk.x, span),
            z: floor_div(chunk.z, span),
        }
    }

    /// True iff `self.x*span <= chunk.x < (self.x+1)*span`, and the same for z.
    pub fn contains_chunk(&self, chunk: ChunkInDimensionCoordinate, span: i32) -> bool {
        let in_x = self.x * span <= chunk.x && chunk.x < (self.x + 1) * span;
        let in_z = self.z * span <= chunk.z && chunk.z < (self.z + 1) * span;
        in_x && in_z
    }
}

/// Position of a chunk inside its region; both components lie in `[0, span)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkInRegionCoordinate {
    x: i32,
    z: i32,
}

impl ChunkInRegionCoordinate {
    /// Builds a region-local chunk coordinate, rejecting components outside `[0, span)`.
    pub fn new(x: i32, z: i32, span: i32) -> WorldResult<Self> {
        if !(0..span).contains(&x) {
            return Err(WorldError::OutOfRange {
                what: "chunk-in-region x",
                value: x,
                span,
            });
        }
        if !(0..span).contains(&z) {
            return Err(WorldError::OutOfRange {
                what: "chunk-in-region z",
                value: z,
                span,
            });
        }
        Ok(ChunkInRegionCoordinate { x, z })
    }

    /// Region-local position of a dimension chunk.
    pub fn of(chunk: ChunkInDimensionCoordinate, span: i32) -> Self {
        ChunkInRegionCoordinate {
            x: floor_mod(chunk.x, span),
            z: floor_mod(chunk.z, span),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Row-major slot in a region's location table.
    pub fn table_index(&self, span: i32) -> usize {
        (self.z * span + self.x) as usize
    }
}

/// Position of a chunk in the external source's unbounded chunk grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkInDimensionCoordinate {
    pub x: i32,
    pub z: i32,
}

impl ChunkInDimensionCoordinate {
    pub fn new(x: i32, z: i32) -> Self {
        ChunkInDimensionCoordinate { x, z }
    }

    /// Chunk holding the source-space block column `(x, z)`.
    pub fn containing_block(x: i32, z: i32, chunk_span: i32) -> Self {
        ChunkInDimensionCoordinate {
            x: floor_div(x, chunk_span),
            z: floor_div(z, chunk_span),
        }
    }

    /// Rebuilds a dimension chunk from its region and region-local parts.
    pub fn from_region(
        region: RegionCoordinate,
        local: ChunkInRegionCoordinate,
        span: i32,
    ) -> Self {
        ChunkInDimensionCoordinate {
            x: region.x * span + local.x,
            z: region.z * span + local.z,
        }
    }

    /// Splits into `(region, chunk in region)`.
    pub fn split(self, span: i32) -> (RegionCoordinate, ChunkInRegionCoordinate) {
        (
            RegionCoordinate::containing(self, span),
            ChunkInRegionCoordinate::of(self, span),
        )
    }
}
