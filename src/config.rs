//! # World Configuration
//!
//! Everything fixed at world-creation time: chunk dimensions, the cache budget,
//! the eviction strategy and the generator. Configurations are plain serde
//! values; how they reach the program (files, flags) is up to the caller. The
//! helpers here read JSON.
//!
//! ```json
//! {
//!   "dimensions": { "blocks_x": 16, "blocks_y": 16, "blocks_z": 64 },
//!   "budget": { "max_chunks": 256 },
//!   "eviction": { "kind": "camera_radius", "radius": 2 },
//!   "generator": { "flat": { "height": 8 } }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};
use crate::voxels::block::BlockId;
use crate::voxels::coords::{ChunkDimensions, REGION_CHUNK_SPAN};
use crate::voxels::generation::external::{ExternalSourceGenerator, SourceLayout};
use crate::voxels::generation::procedural::{
    PERLIN_NEGATIVE_THRESHOLD, PERLIN_POSITIVE_THRESHOLD, PERLIN_SCALE_FACTOR,
};

/// Most blocks a single chunk may hold.
pub const MAX_CHUNK_VOLUME: i64 = 1 << 24;
/// Widest foreign chunk, in block columns per side.
pub const MAX_SOURCE_CHUNK_SPAN: i32 = 512;
/// Widest foreign region, in chunks per side.
pub const MAX_REGION_CHUNK_SPAN: i32 = 1024;

/// Limits on what the chunk store keeps resident. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheBudget {
    pub max_chunks: Option<usize>,
    pub max_bytes: Option<usize>,
}

/// Which resident chunks are evicted first when the budget is exceeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvictionConfig {
    /// Least recently accessed first.
    #[default]
    Lru,
    /// Chunks farther than `radius` chunks from the focus first, then LRU.
    CameraRadius { radius: i32 },
}

/// Foreign region source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSourceConfig {
    /// Directory holding `r.<x>.<z>.mca` files.
    pub region_dir: PathBuf,
    pub region_chunk_span: i32,
    pub chunk_span: i32,
    /// Added to a native `z` to get the foreign height.
    pub vertical_offset: i32,
    /// Foreign id to native id. Ids without an entry pass through.
    pub remap: BTreeMap<BlockId, BlockId>,
    pub decoded_chunk_capacity: usize,
}

impl Default for ExternalSourceConfig {
    fn default() -> Self {
        ExternalSourceConfig {
            region_dir: PathBuf::from("region"),
            region_chunk_span: REGION_CHUNK_SPAN,
            chunk_span: 16,
            vertical_offset: 0,
            remap: BTreeMap::new(),
            decoded_chunk_capacity: ExternalSourceGenerator::DEFAULT_DECODED_CHUNK_CAPACITY,
        }
    }
}

impl ExternalSourceConfig {
    pub fn layout(&self) -> SourceLayout {
        SourceLayout {
            region_chunk_span: self.region_chunk_span,
            chunk_span: self.chunk_span,
            vertical_offset: self.vertical_offset,
        }
    }
}

/// Generator selection. Externally tagged: `"checkerboard"` or
/// `{ "flat": { "height": 8 } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorConfig {
    Perlin {
        seed: u32,
        scale: f64,
        negative_threshold: f64,
        positive_threshold: f64,
    },
    Flat {
        height: i32,
    },
    Checkerboard,
    Solid,
    Empty,
    Scatter {
        seed: u64,
        density: f64,
    },
    External(ExternalSourceConfig),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Perlin {
            seed: 0,
            scale: PERLIN_SCALE_FACTOR,
            negative_threshold: PERLIN_NEGATIVE_THRESHOLD,
            positive_threshold: PERLIN_POSITIVE_THRESHOLD,
        }
    }
}

/// Complete world configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub dimensions: ChunkDimensions,
    pub budget: CacheBudget,
    pub eviction: EvictionConfig,
    pub generator: GeneratorConfig,
}

impl WorldConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    /// `InvalidConfig` on malformed JSON or failed validation.
    pub fn from_json_str(json: &str) -> WorldResult<Self> {
        let config: WorldConfig = serde_json::from_str(json)
            .map_err(|err| WorldError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    /// `InvalidConfig` when the file cannot be read or its contents are invalid.
    pub fn from_path(path: &Path) -> WorldResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| WorldError::InvalidConfig(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// Checks the values the world relies on being positive.
    ///
    /// # Errors
    /// `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> WorldResult<()> {
        let ChunkDimensions {
            blocks_x,
            blocks_y,
            blocks_z,
        } = self.dimensions;
        if blocks_x <= 0 || blocks_y <= 0 || blocks_z <= 0 {
            return Err(WorldError::InvalidConfig(format!(
                "chunk dimensions must be positive, got {blocks_x}x{blocks_y}x{blocks_z}"
            )));
        }
        let volume = i64::from(blocks_x) * i64::from(blocks_y) * i64::from(blocks_z);
        if volume > MAX_CHUNK_VOLUME {
            return Err(WorldError::InvalidConfig(format!(
                "chunk of {blocks_x}x{blocks_y}x{blocks_z} blocks exceeds {MAX_CHUNK_VOLUME}"
            )));
        }
        if self.budget.max_chunks == Some(0) {
            return Err(WorldError::InvalidConfig(
                "max_chunks must be at least 1".to_string(),
            ));
        }
        if let EvictionConfig::CameraRadius { radius } = self.eviction {
            if radius < 0 {
                return Err(WorldError::InvalidConfig(format!(
                    "camera radius must not be negative, got {radius}"
                )));
            }
        }
        if let GeneratorConfig::External(source) = &self.generator {
            if !(1..=MAX_REGION_CHUNK_SPAN).contains(&source.region_chunk_span)
                || !(1..=MAX_SOURCE_CHUNK_SPAN).contains(&source.chunk_span)
            {
                return Err(WorldError::InvalidConfig(format!(
                    "region span must be in 1..={MAX_REGION_CHUNK_SPAN} and chunk span in \
                     1..={MAX_SOURCE_CHUNK_SPAN}, got {} and {}",
                    source.region_chunk_span, source.chunk_span
                )));
            }
        }
        Ok(())
    }
}
