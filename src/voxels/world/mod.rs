//! # World Module
//!
//! This module provides the `World` struct, the chunk store of the native world.
//! It owns every resident chunk and the generator that creates them, and it is
//! the single mutable resource the iterators walk.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach: only chunks that have been
//! referenced are kept in memory, which allows an effectively infinite extent.
//! A chunk that is referenced but not resident is generated on the spot,
//! synchronously.
//!
//! ## Eviction
//!
//! An optional budget caps the resident chunk count and/or byte footprint.
//! When a load pushes the store over budget, the configured [`EvictionPolicy`]
//! picks victims among chunks nobody else holds a handle to. Iterators hold a
//! handle to the chunk they are positioned in, so that chunk is never evicted
//! from under them.
//!
//! ## Performance Considerations
//!
//! - Chunk lookup is O(1) using a hash map
//! - Recency is tracked in an LRU list, promoted on every loading access
//! - Eviction scans the resident set once per victim

use std::collections::HashMap;

use log::{debug, info};
use lru::LruCache;

use crate::config::{CacheBudget, WorldConfig};
use crate::core::StResource;
use crate::error::{WorldError, WorldResult};
use crate::voxels::block::Block;
use crate::voxels::chunk::Chunk;
use crate::voxels::coords::{BlockCoordinate, ChunkCoordinate, ChunkDimensions};
use crate::voxels::generation::{build_generator, Generator, SpawnDirective};

pub mod eviction;
pub mod resident_iterator;
pub mod window_iterator;

use eviction::{policy_from_config, EvictionPolicy, LeastRecentlyUsed};
pub use resident_iterator::ResidentIterator;
pub use window_iterator::WindowIterator;

/// Storage of resident chunks, consumed by the iterators.
///
/// `World` is the only implementation; the trait is the seam renderer,
/// physics and importer code program against.
pub trait ChunkStore {
    /// Block extent of every chunk.
    fn dimensions(&self) -> ChunkDimensions;

    /// Resident chunk at `position`, without loading. Does not count as an access.
    fn get_chunk(&self, position: ChunkCoordinate) -> Option<StResource<Chunk>>;

    /// Chunk at `position`, generating it first if it is not resident.
    fn load_chunk(&mut self, position: ChunkCoordinate) -> StResource<Chunk>;

    /// Coordinates of every resident chunk, in the store's enumeration order.
    fn resident_coordinates(&self) -> Vec<ChunkCoordinate>;

    /// Tells the store where the camera is. Stores that ignore it may.
    fn set_focus(&mut self, _center: ChunkCoordinate) {}

    /// Walks the 3x3 chunk window around `center`, loading missing chunks.
    ///
    /// # Errors
    /// `OutOfBounds` when `top_z` is at or above the chunk height.
    fn iterate_window(
        &mut self,
        center: ChunkCoordinate,
        start_z: i32,
        top_z: i32,
    ) -> WorldResult<WindowIterator<'_, Self>>
    where
        Self: Sized,
    {
        WindowIterator::new(self, center, start_z, top_z)
    }

    /// Walks every resident chunk from `start_z` to the top of the world.
    fn iterate_resident(&self, start_z: i32) -> ResidentIterator<'_, Self>
    where
        Self: Sized,
    {
        ResidentIterator::new(self, start_z)
    }
}

/// Counters for chunk store activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Loading lookups answered from memory.
    pub hits: usize,
    /// Chunks generated.
    pub loads: usize,
    /// Chunks dropped to satisfy the budget.
    pub evictions: usize,
}

/// Represents a voxel world composed of multiple chunks.
///
/// # Examples
///
/// ```
/// use cgmath::{Point2, Point3};
/// use voxel_world::voxels::coords::ChunkDimensions;
/// use voxel_world::voxels::generation::FlatGenerator;
/// use voxel_world::voxels::world::{ChunkStore, World};
///
/// let mut world = World::new(ChunkDimensions::new(8, 8, 16), Box::new(FlatGenerator::new(4)));
/// let chunk = world.load_chunk(Point2::new(0, 0));
/// assert_eq!(chunk.get().coordinate(), Point2::new(0, 0));
/// assert!(world.get_block(Point3::new(3, 3, 0)).unwrap().is_solid());
/// ```
pub struct World {
    dimensions: ChunkDimensions,
    /// A mapping from chunk coordinates to chunk data.
    chunks: HashMap<ChunkCoordinate, StResource<Chunk>>,
    /// Resident coordinates, most recently accessed first.
    recency: LruCache<ChunkCoordinate, ()>,
    generator: Box<dyn Generator>,
    budget: CacheBudget,
    policy: Box<dyn EvictionPolicy>,
    focus: Option<ChunkCoordinate>,
    resident_bytes: usize,
    /// Spawn directives emitted while generating, waiting for the entity system.
    pending_spawns: Vec<SpawnDirective>,
    stats: StoreStats,
}

impl World {
    /// Creates an empty, unbounded world.
    pub fn new(dimensions: ChunkDimensions, generator: Box<dyn Generator>) -> Self {
        World {
            dimensions,
            chunks: HashMap::new(),
            recency: LruCache::unbounded(),
            generator,
            budget: CacheBudget::default(),
            policy: Box::new(LeastRecentlyUsed),
            focus: None,
            resident_bytes: 0,
            pending_spawns: Vec::new(),
            stats: StoreStats::default(),
        }
    }

    /// Caps the resident set and sets the strategy used to stay under the cap.
    pub fn with_budget(mut self, budget: CacheBudget, policy: Box<dyn EvictionPolicy>) -> Self {
        self.budget = budget;
        self.policy = policy;
        self
    }

    /// Builds a world, its generator and its eviction policy from configuration.
    ///
    /// # Errors
    /// `InvalidConfig` when the configuration fails validation or the
    /// generator cannot be built.
    pub fn from_config(config: &WorldConfig) -> WorldResult<Self> {
        config.validate()?;
        let generator = build_generator(&config.generator)?;
        info!(
            "world created: chunks {}x{}x{}, budget {:?}, eviction {:?}",
            config.dimensions.blocks_x,
            config.dimensions.blocks_y,
            config.dimensions.blocks_z,
            config.budget,
            config.eviction
        );
        Ok(World::new(config.dimensions, generator)
            .with_budget(config.budget, policy_from_config(&config.eviction)))
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn resident_bytes(&self) -> usize {
        self.resident_bytes
    }

    pub fn contains_chunk(&self, position: ChunkCoordinate) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Takes the spawn directives queued since the last call.
    pub fn drain_spawn_directives(&mut self) -> Vec<SpawnDirective> {
        std::mem::take(&mut self.pending_spawns)
    }

    /// Block at a world position, loading its chunk if needed.
    ///
    /// Below `z = 0` this is the ground sentinel; at or above the chunk height
    /// it is air. Neither case loads a chunk.
    pub fn get_block(&mut self, position: BlockCoordinate) -> WorldResult<Block> {
        if position.z < 0 {
            return Ok(Block::GROUND);
        }
        if position.z >= self.dimensions.blocks_z {
            return Ok(Block::AIR);
        }
        let chunk = self.load_chunk(self.dimensions.chunk_of_block(position));
        let local = self.dimensions.local_of_block(position);
        let block = chunk.get().get(local.x, local.y, local.z)?;
        Ok(block)
    }

    /// Replaces the block at a world position, loading its chunk if needed.
    ///
    /// # Errors
    /// `OutOfBounds` when `z` lies outside the chunk height.
    pub fn set_block(&mut self, position: BlockCoordinate, block: Block) -> WorldResult<()> {
        let local = self.dimensions.local_of_block(position);
        if !self.dimensions.contains_local(local.x, local.y, local.z) {
            return Err(WorldError::OutOfBounds {
                index: (local.x, local.y, local.z),
                bounds: (
                    self.dimensions.blocks_x,
                    self.dimensions.blocks_y,
                    self.dimensions.blocks_z,
                ),
            });
        }
        let chunk = self.load_chunk(self.dimensions.chunk_of_block(position));
        let result = chunk.get_mut().set(local.x, local.y, local.z, block);
        result
    }

    /// Drops a resident chunk. Handles held elsewhere stay valid but are no
    /// longer reachable through the world.
    pub fn unload_chunk(&mut self, position: ChunkCoordinate) -> Option<StResource<Chunk>> {
        let chunk = self.chunks.remove(&position)?;
        self.recency.pop(&position);
        self.resident_bytes = self.resident_bytes.saturating_sub(chunk.get().byte_size());
        debug!("unloaded chunk {:?}", position);
        Some(chunk)
    }

    fn over_budget(&self) -> bool {
        let too_many = self
            .budget
            .max_chunks
            .is_some_and(|max| self.chunks.len() > max);
        let too_large = self
            .budget
            .max_bytes
            .is_some_and(|max| self.resident_bytes > max);
        too_many || too_large
    }

    fn enforce_budget(&mut self, keep: ChunkCoordinate) {
        if !self.over_budget() {
            return;
        }
        // Pins cannot change while evicting.
        let mut candidates: Vec<ChunkCoordinate> = self
            .recency
            .iter()
            .rev()
            .map(|(position, _)| *position)
            .filter(|position| *position != keep)
            .filter(|position| {
                self.chunks
                    .get(position)
                    .is_some_and(|chunk| !chunk.is_shared())
            })
            .collect();

        while self.over_budget() {
            let Some(victim) = self.policy.choose_victim(&candidates, self.focus) else {
                debug!(
                    "over budget with {} resident chunks, all pinned",
                    self.chunks.len()
                );
                break;
            };
            let Some(index) = candidates.iter().position(|position| *position == victim) else {
                break;
            };
            candidates.remove(index);
            if self.unload_chunk(victim).is_none() {
                break;
            }
            self.stats.evictions += 1;
            debug!("evicted chunk {:?}", victim);
        }
    }
}

impl ChunkStore for World {
    fn dimensions(&self) -> ChunkDimensions {
        self.dimensions
    }

    fn get_chunk(&self, position: ChunkCoordinate) -> Option<StResource<Chunk>> {
        self.chunks.get(&position).cloned()
    }

    fn load_chunk(&mut self, position: ChunkCoordinate) -> StResource<Chunk> {
        if let Some(chunk) = self.chunks.get(&position) {
            self.stats.hits += 1;
            self.recency.promote(&position);
            return chunk.clone();
        }

        debug!("generating chunk {:?}", position);
        let chunk = Chunk::generate(
            position,
            self.dimensions,
            self.generator.as_mut(),
            &mut self.pending_spawns,
        );
        self.resident_bytes += chunk.byte_size();
        let chunk = StResource::new(chunk);
        self.chunks.insert(position, chunk.clone());
        self.recency.push(position, ());
        self.stats.loads += 1;

        self.enforce_budget(position);
        chunk
    }

    /// Most recently accessed first.
    fn resident_coordinates(&self) -> Vec<ChunkCoordinate> {
        self.recency.iter().map(|(position, _)| *position).collect()
    }

    fn set_focus(&mut self, center: ChunkCoordinate) {
        self.focus = Some(center);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cgmath::{Point2, Point3};

    use super::eviction::CameraRadius;
    use super::*;
    use crate::voxels::block::block_type::BlockType;
    use crate::voxels::block::BlockId;
    use crate::voxels::generation::{FlatGenerator, UniformGenerator};

    fn small_world() -> World {
        World::new(ChunkDimensions::new(4, 4, 4), Box::new(FlatGenerator::new(2)))
    }

    #[test]
    fn load_is_lazy_and_cached() {
        let mut world = small_world();
        assert!(world.get_chunk(Point2::new(0, 0)).is_none());
        let first = world.load_chunk(Point2::new(0, 0));
        let second = world.load_chunk(Point2::new(0, 0));
        assert!(first.ptr_eq(&second));
        assert_eq!(world.stats().loads, 1);
        assert_eq!(world.stats().hits, 1);
        assert!(world.get_chunk(Point2::new(0, 0)).is_some());
    }

    #[test]
    fn every_resident_chunk_matches_its_key() {
        let mut world = small_world();
        for x in -2..2 {
            for y in -2..2 {
                world.load_chunk(Point2::new(x, y));
            }
        }
        for position in world.resident_coordinates() {
            assert_eq!(world.get_chunk(position).unwrap().get().coordinate(), position);
        }
        assert_eq!(world.resident_count(), 16);
    }

    #[test]
    fn block_accessors_cover_ground_and_sky() {
        let mut world = small_world();
        assert_eq!(world.get_block(Point3::new(0, 0, -3)).unwrap(), Block::GROUND);
        assert_eq!(world.get_block(Point3::new(0, 0, 9)).unwrap(), Block::AIR);
        assert_eq!(world.resident_count(), 0);

        let grass = world.get_block(Point3::new(-5, 7, 1)).unwrap();
        assert_eq!(grass.block_type, BlockType::GRASS as BlockId);
        assert!(world.contains_chunk(Point2::new(-2, 1)));

        world
            .set_block(Point3::new(-5, 7, 3), Block::new(BlockType::WOOD))
            .unwrap();
        assert_eq!(
            world.get_block(Point3::new(-5, 7, 3)).unwrap().native_type(),
            Some(BlockType::WOOD)
        );
        assert!(matches!(
            world.set_block(Point3::new(0, 0, 4), Block::AIR),
            Err(WorldError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn count_budget_evicts_least_recently_used() {
        let mut world = small_world().with_budget(
            CacheBudget {
                max_chunks: Some(2),
                max_bytes: None,
            },
            Box::new(LeastRecentlyUsed),
        );
        world.load_chunk(Point2::new(0, 0));
        world.load_chunk(Point2::new(1, 0));
        world.load_chunk(Point2::new(0, 0));
        world.load_chunk(Point2::new(2, 0));

        assert_eq!(world.resident_count(), 2);
        assert!(world.contains_chunk(Point2::new(0, 0)));
        assert!(!world.contains_chunk(Point2::new(1, 0)));
        assert_eq!(world.stats().evictions, 1);
    }

    #[test]
    fn byte_budget_is_respected() {
        let one_chunk = Chunk::empty(Point2::new(0, 0), ChunkDimensions::new(4, 4, 4)).byte_size();
        let mut world = small_world().with_budget(
            CacheBudget {
                max_chunks: None,
                max_bytes: Some(one_chunk * 3),
            },
            Box::new(LeastRecentlyUsed),
        );
        for x in 0..10 {
            world.load_chunk(Point2::new(x, 0));
        }
        assert_eq!(world.resident_count(), 3);
        assert!(world.resident_bytes() <= one_chunk * 3);
    }

    #[test]
    fn pinned_chunks_survive_eviction() {
        let mut world = small_world().with_budget(
            CacheBudget {
                max_chunks: Some(1),
                max_bytes: None,
            },
            Box::new(LeastRecentlyUsed),
        );
        let pinned = world.load_chunk(Point2::new(0, 0));
        world.load_chunk(Point2::new(1, 0));
        // (0, 0) is held by `pinned`, so the store goes over budget instead.
        assert!(world.contains_chunk(Point2::new(0, 0)));
        drop(pinned);
        world.load_chunk(Point2::new(2, 0));
        assert!(!world.contains_chunk(Point2::new(0, 0)));
        assert_eq!(world.resident_count(), 1);
    }

    /// Least recently used, remembering how many candidates it was offered.
    struct RecordingPolicy {
        offered: Rc<RefCell<Vec<usize>>>,
    }

    impl EvictionPolicy for RecordingPolicy {
        fn choose_victim(
            &self,
            candidates: &[ChunkCoordinate],
            _focus: Option<ChunkCoordinate>,
        ) -> Option<ChunkCoordinate> {
            self.offered.borrow_mut().push(candidates.len());
            candidates.first().copied()
        }
    }

    #[test]
    fn shrinking_budget_evicts_down_from_one_candidate_list() {
        let mut world = small_world();
        for x in 0..10 {
            world.load_chunk(Point2::new(x, 0));
        }
        let offered = Rc::new(RefCell::new(Vec::new()));
        let mut world = world.with_budget(
            CacheBudget {
                max_chunks: Some(2),
                max_bytes: None,
            },
            Box::new(RecordingPolicy {
                offered: offered.clone(),
            }),
        );
        world.load_chunk(Point2::new(10, 0));

        assert_eq!(world.resident_count(), 2);
        assert_eq!(world.stats().evictions, 9);
        assert!(world.contains_chunk(Point2::new(9, 0)));
        assert!(world.contains_chunk(Point2::new(10, 0)));
        assert_eq!(*offered.borrow(), (2..=10).rev().collect::<Vec<_>>());
    }

    #[test]
    fn camera_radius_evicts_outside_focus_first() {
        let mut world = small_world().with_budget(
            CacheBudget {
                max_chunks: Some(2),
                max_bytes: None,
            },
            Box::new(CameraRadius::new(1)),
        );
        world.set_focus(Point2::new(10, 10));
        world.load_chunk(Point2::new(10, 10));
        world.load_chunk(Point2::new(0, 0));
        world.load_chunk(Point2::new(11, 10));
        assert!(world.contains_chunk(Point2::new(10, 10)));
        assert!(!world.contains_chunk(Point2::new(0, 0)));
    }

    #[test]
    fn regenerated_chunk_is_reproducible() {
        let mut world = World::new(
            ChunkDimensions::new(4, 4, 4),
            Box::new(crate::voxels::generation::ScatterGenerator::new(3, 0.5)),
        );
        let before: Vec<Block> = world.load_chunk(Point2::new(2, -1)).get().blocks().to_vec();
        world.unload_chunk(Point2::new(2, -1));
        let after: Vec<Block> = world.load_chunk(Point2::new(2, -1)).get().blocks().to_vec();
        assert_eq!(before, after);
        assert_eq!(world.stats().loads, 2);
    }

    #[test]
    fn unload_releases_bytes() {
        let mut world = World::new(ChunkDimensions::new(2, 2, 2), Box::new(UniformGenerator::solid()));
        world.load_chunk(Point2::new(0, 0));
        assert!(world.resident_bytes() > 0);
        assert!(world.unload_chunk(Point2::new(0, 0)).is_some());
        assert_eq!(world.resident_bytes(), 0);
        assert!(world.unload_chunk(Point2::new(0, 0)).is_none());
    }
}
