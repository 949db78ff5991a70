//! # Generation Module
//!
//! Generators populate a chunk the first time the world needs it. A generator
//! maps world-absolute block coordinates to block ids and is expected to be
//! deterministic: the same coordinate always yields the same id, so a chunk
//! that was evicted can be regenerated identically.
//!
//! Strategies:
//! - Perlin noise terrain
//! - Flat ground up to a fixed height
//! - Checkerboard, solid and empty chunks (testing)
//! - Seeded scatter of random solid blocks (testing)
//! - An adapter over a foreign region/chunk format

use cgmath::Point3;

use crate::config::GeneratorConfig;
use crate::error::WorldResult;
use crate::voxels::block::BlockId;
use crate::voxels::coords::BlockCoordinate;

pub mod external;
pub mod procedural;

pub use external::ExternalSourceGenerator;
pub use procedural::{
    CheckerboardGenerator, FlatGenerator, PerlinGenerator, ScatterGenerator, UniformGenerator,
};

/// Request to seed an entity at a block position. The payload beyond the kind
/// id belongs to the entity system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnDirective {
    pub kind: u32,
    pub position: BlockCoordinate,
}

impl SpawnDirective {
    pub fn new(kind: u32, position: Point3<i32>) -> Self {
        SpawnDirective { kind, position }
    }
}

/// Produces block ids for world-absolute coordinates.
///
/// Takes `&mut self` so implementations can keep decode caches; the result
/// must still depend only on the coordinate.
pub trait Generator {
    /// Block id at `(x, y, z)`.
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId;

    /// Entities to seed at `(x, y, z)`. Most generators seed nothing.
    fn spawn_entities(&mut self, _x: i32, _y: i32, _z: i32) -> Vec<SpawnDirective> {
        Vec::new()
    }
}

/// Builds the generator a configuration selects.
///
/// # Errors
/// `InvalidConfig` when an external source's region directory is missing.
pub fn build_generator(config: &GeneratorConfig) -> WorldResult<Box<dyn Generator>> {
    let generator: Box<dyn Generator> = match config {
        GeneratorConfig::Perlin {
            seed,
            scale,
            negative_threshold,
            positive_threshold,
        } => Box::new(PerlinGenerator::new(
            *seed,
            *scale,
            *negative_threshold,
            *positive_threshold,
        )),
        GeneratorConfig::Flat { height } => Box::new(FlatGenerator::new(*height)),
        GeneratorConfig::Checkerboard => Box::new(CheckerboardGenerator),
        GeneratorConfig::Solid => Box::new(UniformGenerator::solid()),
        GeneratorConfig::Empty => Box::new(UniformGenerator::empty()),
        GeneratorConfig::Scatter { seed, density } => {
            Box::new(ScatterGenerator::new(*seed, *density))
        }
        GeneratorConfig::External(source) => Box::new(external::open_external_source(source)?),
    };
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExternalSourceConfig;
    use crate::voxels::block::block_type::BlockType;

    #[test]
    fn builds_each_procedural_kind() {
        let mut solid = build_generator(&GeneratorConfig::Solid).unwrap();
        assert_eq!(solid.generate(3, -7, 2), BlockType::DIRT as BlockId);
        let mut empty = build_generator(&GeneratorConfig::Empty).unwrap();
        assert_eq!(empty.generate(3, -7, 2), BlockType::AIR as BlockId);
        let mut flat = build_generator(&GeneratorConfig::Flat { height: 2 }).unwrap();
        assert_eq!(flat.generate(0, 0, 1), BlockType::GRASS as BlockId);
    }

    #[test]
    fn external_source_needs_an_existing_directory() {
        let config = GeneratorConfig::External(ExternalSourceConfig {
            region_dir: "/definitely/not/a/region/dir".into(),
            ..ExternalSourceConfig::default()
        });
        assert!(build_generator(&config).is_err());
    }
}
