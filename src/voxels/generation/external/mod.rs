//! # External Source Adapter
//!
//! Feeds blocks from a foreign region/chunk format into the native generator
//! pipeline.
//!
//! The foreign format stores chunks of `chunk_span x chunk_span` block columns,
//! grouped into region files of `region_chunk_span x region_chunk_span` chunks.
//! Its horizontal axes are `x` and `z` with `y` pointing up; the native world
//! uses `x`, `y` horizontally and `z` up. A native block `(x, y, z)` therefore
//! reads the foreign block at column `(x, y)` and height `z + vertical_offset`.
//!
//! Parsing a region and decompressing a chunk are expensive, so both are
//! cached: regions in a map keyed by [`RegionCoordinate`], decoded chunks in an
//! LRU cache keyed by `(RegionCoordinate, ChunkInRegionCoordinate)`. Neither is
//! authoritative; the world's chunk store is.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use log::{debug, warn};
use lru::LruCache;

use crate::config::ExternalSourceConfig;
use crate::error::{WorldError, WorldResult};
use crate::voxels::block::block_type::BlockType;
use crate::voxels::block::BlockId;
use crate::voxels::coords::{
    floor_mod, ChunkInDimensionCoordinate, ChunkInRegionCoordinate, RegionCoordinate,
};

use super::Generator;

pub mod region;

pub use region::{
    ChunkCompression, DecodedChunk, RegionDirectory, RegionFile, RegionFileBuilder,
    RegionOpener, RegionSource,
};

/// Composite decode cache key. Structural, so distinct pairs never collide.
type ChunkKey = (RegionCoordinate, ChunkInRegionCoordinate);

/// Total mapping from foreign block ids to native ids. Ids without an entry
/// pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRemap {
    table: HashMap<BlockId, BlockId>,
}

impl BlockRemap {
    pub fn new(table: HashMap<BlockId, BlockId>) -> Self {
        BlockRemap { table }
    }

    pub fn map(&self, foreign: BlockId) -> BlockId {
        self.table.get(&foreign).copied().unwrap_or(foreign)
    }
}

impl FromIterator<(BlockId, BlockId)> for BlockRemap {
    fn from_iter<I: IntoIterator<Item = (BlockId, BlockId)>>(iter: I) -> Self {
        BlockRemap {
            table: iter.into_iter().collect(),
        }
    }
}

/// Geometry of the foreign format relative to the native world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLayout {
    /// Chunks per region side.
    pub region_chunk_span: i32,
    /// Block columns per chunk side.
    pub chunk_span: i32,
    /// Added to a native `z` to get the foreign height.
    pub vertical_offset: i32,
}

/// Counters for the decode cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeCacheStats {
    /// Regions successfully opened and inserted.
    pub region_opens: usize,
    /// Regions that failed to open.
    pub region_failures: usize,
    /// Chunk decode attempts (hits on the chunk cache are not counted).
    pub chunk_decodes: usize,
}

/// Generator that reads blocks out of a foreign region format.
pub struct ExternalSourceGenerator {
    opener: Box<dyn RegionOpener>,
    layout: SourceLayout,
    remap: BlockRemap,
    /// `None` records a region that failed to open, so it is not retried per block.
    regions: HashMap<RegionCoordinate, Option<Box<dyn RegionSource>>>,
    /// `None` records a chunk that is missing or corrupt.
    chunks: LruCache<ChunkKey, Option<DecodedChunk>>,
    stats: DecodeCacheStats,
}

impl ExternalSourceGenerator {
    /// Default number of decoded chunks kept in memory.
    pub const DEFAULT_DECODED_CHUNK_CAPACITY: usize = 256;

    pub fn new(
        opener: Box<dyn RegionOpener>,
        layout: SourceLayout,
        remap: BlockRemap,
        decoded_chunk_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(decoded_chunk_capacity).unwrap_or(NonZeroUsize::MIN);
        ExternalSourceGenerator {
            opener,
            layout,
            remap,
            regions: HashMap::new(),
            chunks: LruCache::new(capacity),
            stats: DecodeCacheStats::default(),
        }
    }

    /// Builds an adapter reading region files from `config.region_dir`.
    pub fn from_config(config: &ExternalSourceConfig) -> Self {
        let opener = RegionDirectory::new(
            config.region_dir.clone(),
            config.region_chunk_span,
            config.chunk_span,
        );
        Self::new(
            Box::new(opener),
            config.layout(),
            config.remap.iter().map(|(k, v)| (*k, *v)).collect(),
            config.decoded_chunk_capacity,
        )
    }

    pub fn stats(&self) -> DecodeCacheStats {
        self.stats
    }

    /// Drops every cached region and decoded chunk, including failure records.
    pub fn clear_cache(&mut self) {
        self.regions.clear();
        self.chunks.clear();
    }

    fn region(&mut self, region: RegionCoordinate) -> Option<&dyn RegionSource> {
        if !self.regions.contains_key(&region) {
            let opened = match self.opener.open(region) {
                Ok(source) => {
                    debug!("decode cache: opened region ({}, {})", region.x, region.z);
                    self.stats.region_opens += 1;
                    Some(source)
                }
                Err(err) => {
                    warn!("{err}; region treated as empty");
                    self.stats.region_failures += 1;
                    None
                }
            };
            self.regions.insert(region, opened);
        }
        self.regions.get(&region).and_then(|source| source.as_deref())
    }

    fn decoded_chunk(&mut self, key: ChunkKey) -> Option<&DecodedChunk> {
        if !self.chunks.contains(&key) {
            let (region, local) = key;
            self.stats.chunk_decodes += 1;
            let decoded = self
                .region(region)
                .and_then(|source| source.decode_chunk(local));
            self.chunks.put(key, decoded);
        }
        self.chunks.get(&key).and_then(Option::as_ref)
    }

    /// Foreign block id at a native block coordinate, before remapping.
    /// `None` when the source has no data there.
    pub fn source_block(&mut self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        let SourceLayout {
            region_chunk_span,
            chunk_span,
            vertical_offset,
        } = self.layout;

        let (source_x, source_z, source_y) = (x, y, z + vertical_offset);
        let chunk = ChunkInDimensionCoordinate::containing_block(source_x, source_z, chunk_span);
        let key = chunk.split(region_chunk_span);

        let local_x = floor_mod(source_x, chunk_span);
        let local_z = floor_mod(source_z, chunk_span);
        self.decoded_chunk(key)?
            .block_at(local_x, source_y, local_z)
    }
}

impl Generator for ExternalSourceGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId {
        match self.source_block(x, y, z) {
            Some(foreign) => self.remap.map(foreign),
            None => BlockType::AIR as BlockId,
        }
    }
}

/// Opens regions from `config` and checks the directory exists.
///
/// # Errors
/// `InvalidConfig` when `region_dir` is not a directory.
pub fn open_external_source(config: &ExternalSourceConfig) -> WorldResult<ExternalSourceGenerator> {
    if !config.region_dir.is_dir() {
        return Err(WorldError::InvalidConfig(format!(
            "region directory {} does not exist",
            config.region_dir.display()
        )));
    }
    Ok(ExternalSourceGenerator::from_config(config))
}
