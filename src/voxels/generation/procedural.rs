//! Procedural generators.

use noise::{NoiseFn, Perlin};

use crate::voxels::block::block_type::BlockType;
use crate::voxels::block::BlockId;

use super::Generator;

/// Threshold above which Perlin noise is considered solid.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered solid.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Terrain from 3-D Perlin noise: cells whose sample falls outside the
/// `[negative, positive]` band are solid, producing caves and overhangs.
pub struct PerlinGenerator {
    perlin: Perlin,
    scale: f64,
    negative_threshold: f64,
    positive_threshold: f64,
}

impl PerlinGenerator {
    pub fn new(seed: u32, scale: f64, negative_threshold: f64, positive_threshold: f64) -> Self {
        PerlinGenerator {
            perlin: Perlin::new(seed),
            scale,
            negative_threshold,
            positive_threshold,
        }
    }

    fn sample(&self, x: i32, y: i32, z: i32) -> f64 {
        self.perlin.get([
            x as f64 * self.scale,
            y as f64 * self.scale,
            z as f64 * self.scale,
        ])
    }
}

impl Default for PerlinGenerator {
    fn default() -> Self {
        Self::new(
            0,
            PERLIN_SCALE_FACTOR,
            PERLIN_NEGATIVE_THRESHOLD,
            PERLIN_POSITIVE_THRESHOLD,
        )
    }
}

impl Generator for PerlinGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId {
        let sample = self.sample(x, y, z);
        let block = if sample > self.positive_threshold {
            BlockType::STONE
        } else if sample < self.negative_threshold {
            BlockType::DIRT
        } else {
            BlockType::AIR
        };
        block as BlockId
    }
}

/// Stone up to `height - 1`, a grass layer at `height - 1`, air above.
pub struct FlatGenerator {
    height: i32,
}

impl FlatGenerator {
    pub fn new(height: i32) -> Self {
        FlatGenerator { height }
    }
}

impl Generator for FlatGenerator {
    fn generate(&mut self, _x: i32, _y: i32, z: i32) -> BlockId {
        let block = if z < self.height - 1 {
            BlockType::STONE
        } else if z == self.height - 1 {
            BlockType::GRASS
        } else {
            BlockType::AIR
        };
        block as BlockId
    }
}

/// Alternates dirt and air along every axis.
pub struct CheckerboardGenerator;

impl Generator for CheckerboardGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId {
        let parity = (x + y + z).rem_euclid(2);
        if parity == 0 {
            BlockType::DIRT as BlockId
        } else {
            BlockType::AIR as BlockId
        }
    }
}

/// The same block everywhere.
pub struct UniformGenerator {
    block: BlockType,
}

impl UniformGenerator {
    /// Every cell dirt.
    pub fn solid() -> Self {
        UniformGenerator {
            block: BlockType::DIRT,
        }
    }

    /// Every cell air.
    pub fn empty() -> Self {
        UniformGenerator {
            block: BlockType::AIR,
        }
    }
}

impl Generator for UniformGenerator {
    fn generate(&mut self, _x: i32, _y: i32, _z: i32) -> BlockId {
        self.block as BlockId
    }
}

/// Random solid blocks at a given density.
///
/// Each cell draws from an RNG seeded by the world seed and the cell's
/// coordinate, so a regenerated chunk matches the original.
pub struct ScatterGenerator {
    seed: u64,
    density: f64,
}

impl ScatterGenerator {
    pub fn new(seed: u64, density: f64) -> Self {
        ScatterGenerator { seed, density }
    }

    fn cell_seed(&self, x: i32, y: i32, z: i32) -> u64 {
        // splitmix64 over the packed coordinate
        let mut h = self.seed
            ^ (x as u32 as u64)
            ^ ((y as u32 as u64) << 21)
            ^ ((z as u32 as u64) << 42);
        h = h.wrapping_add(0x9E37_79B9_7F4A_7C15);
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^ (h >> 31)
    }
}

impl Generator for ScatterGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId {
        let mut rng = fastrand::Rng::with_seed(self.cell_seed(x, y, z));
        if rng.f64() < self.density {
            BlockType::random_solid(&mut rng) as BlockId
        } else {
            BlockType::AIR as BlockId
        }
    }
}
