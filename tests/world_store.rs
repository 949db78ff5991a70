use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use cgmath::{Point2, Point3};
use test_case::test_case;
use voxel_world::config::{CacheBudget, EvictionConfig, GeneratorConfig, WorldConfig};
use voxel_world::voxels::block::block_type::BlockType;
use voxel_world::voxels::block::{Block, BlockId};
use voxel_world::voxels::coords::{ChunkCoordinate, ChunkDimensions};
use voxel_world::voxels::generation::{Generator, SpawnDirective};
use voxel_world::voxels::world::eviction::LeastRecentlyUsed;
use voxel_world::{ChunkStore, World, WorldError};

/// Counts generator calls and records which chunks they fell in.
struct RecordingGenerator {
    dimensions: ChunkDimensions,
    calls: Rc<Cell<usize>>,
    chunks: Rc<RefCell<HashSet<ChunkCoordinate>>>,
}

impl Generator for RecordingGenerator {
    fn generate(&mut self, x: i32, y: i32, z: i32) -> BlockId {
        self.calls.set(self.calls.get() + 1);
        self.chunks
            .borrow_mut()
            .insert(self.dimensions.chunk_of_block(Point3::new(x, y, z)));
        if z == 0 {
            BlockType::STONE as BlockId
        } else {
            BlockType::AIR as BlockId
        }
    }

    fn spawn_entities(&mut self, x: i32, y: i32, z: i32) -> Vec<SpawnDirective> {
        if x.rem_euclid(8) == 0 && y.rem_euclid(8) == 0 && z == 1 {
            vec![SpawnDirective::new(7, Point3::new(x, y, z))]
        } else {
            Vec::new()
        }
    }
}

fn recording_world(
    dimensions: ChunkDimensions,
) -> (World, Rc<Cell<usize>>, Rc<RefCell<HashSet<ChunkCoordinate>>>) {
    let calls = Rc::new(Cell::new(0));
    let chunks = Rc::new(RefCell::new(HashSet::new()));
    let generator = RecordingGenerator {
        dimensions,
        calls: calls.clone(),
        chunks: chunks.clone(),
    };
    (World::new(dimensions, Box::new(generator)), calls, chunks)
}

#[test]
fn window_on_empty_store_loads_the_nine_neighbours() {
    let dimensions = ChunkDimensions::new(4, 4, 4);
    let (mut world, calls, chunks) = recording_world(dimensions);

    let visited = world.iterate_window(Point2::new(5, 5), 0, 3).unwrap().count();

    assert_eq!(visited, 9 * 64);
    assert_eq!(world.stats().loads, 9);
    assert_eq!(calls.get(), 9 * dimensions.volume());
    let expected: HashSet<_> = (4..=6)
        .flat_map(|x| (4..=6).map(move |y| Point2::new(x, y)))
        .collect();
    assert_eq!(*chunks.borrow(), expected);
    let resident: HashSet<_> = world.resident_coordinates().into_iter().collect();
    assert_eq!(resident, expected);
}

#[test]
fn second_window_walk_is_served_from_memory() {
    let (mut world, calls, _) = recording_world(ChunkDimensions::new(2, 2, 2));
    world.iterate_window(Point2::new(0, 0), 0, 1).unwrap().for_each(drop);
    let generated = calls.get();
    world.iterate_window(Point2::new(0, 0), 0, 1).unwrap().for_each(drop);

    assert_eq!(calls.get(), generated);
    assert_eq!(world.stats().loads, 9);
    assert_eq!(world.stats().hits, 9);
}

#[test_case(4, 4, 3 ; "square chunks")]
#[test_case(3, 5, 2 ; "rectangular chunks")]
#[test_case(1, 1, 1 ; "single block chunks")]
fn window_indices_cover_the_window_once_per_layer(bx: i32, by: i32, bz: i32) {
    let mut world = World::new(
        ChunkDimensions::new(bx, by, bz),
        Box::new(voxel_world::voxels::generation::CheckerboardGenerator),
    );
    let mut seen: HashMap<i32, HashSet<(i32, i32)>> = HashMap::new();
    let mut iter = world.iterate_window(Point2::new(-3, 2), 0, bz - 1).unwrap();
    while iter.has_next() {
        iter.get_next_block().unwrap();
        let index = iter.current_index().unwrap();
        assert!(
            seen.entry(index.z).or_default().insert((index.x, index.y)),
            "index {:?} visited twice",
            index
        );
    }

    assert_eq!(seen.len(), bz as usize);
    for layer in seen.values() {
        assert_eq!(layer.len(), (9 * bx * by) as usize);
        for x in 0..3 * bx {
            for y in 0..3 * by {
                assert!(layer.contains(&(x, y)));
            }
        }
    }
}

#[test]
fn window_blocks_below_zero_are_ground() {
    let (mut world, _, _) = recording_world(ChunkDimensions::new(2, 2, 2));
    let below: Vec<_> = world
        .iterate_window(Point2::new(0, 0), -2, -1)
        .unwrap()
        .map(|(_, block)| block)
        .collect();
    assert_eq!(below.len(), 2 * 9 * 4);
    assert!(below.iter().all(|block| *block == Block::GROUND));
}

#[test]
fn resident_walk_never_loads() {
    let (mut world, calls, _) = recording_world(ChunkDimensions::new(4, 4, 2));
    world.load_chunk(Point2::new(0, 0));
    world.load_chunk(Point2::new(10, -10));
    let generated = calls.get();

    let blocks: Vec<_> = world.iterate_resident(0).collect();
    assert_eq!(blocks.len(), 2 * 32);
    assert_eq!(calls.get(), generated);
    assert_eq!(world.stats().loads, 2);

    let chunks: HashSet<_> = blocks
        .iter()
        .map(|(position, _)| world.dimensions().chunk_of_block(*position))
        .collect();
    assert_eq!(
        chunks,
        HashSet::from([Point2::new(0, 0), Point2::new(10, -10)])
    );
}

#[test]
fn eviction_keeps_store_within_budget() {
    let (world, _, _) = recording_world(ChunkDimensions::new(2, 2, 2));
    let mut world = world.with_budget(
        CacheBudget {
            max_chunks: Some(4),
            max_bytes: None,
        },
        Box::new(LeastRecentlyUsed),
    );
    for x in -5..5 {
        for y in -5..5 {
            world.load_chunk(Point2::new(x, y));
            assert!(world.resident_count() <= 4);
        }
    }
    assert_eq!(world.stats().evictions, 100 - 4);
}

#[test]
fn window_iteration_survives_a_tight_budget() {
    let config = WorldConfig {
        dimensions: ChunkDimensions::new(2, 2, 2),
        budget: CacheBudget {
            max_chunks: Some(1),
            max_bytes: None,
        },
        eviction: EvictionConfig::CameraRadius { radius: 0 },
        generator: GeneratorConfig::Flat { height: 1 },
    };
    let mut world = World::from_config(&config).unwrap();

    let solid = world
        .iterate_window(Point2::new(3, 3), 0, 1)
        .unwrap()
        .filter(|(_, block)| block.is_solid())
        .count();

    // Each chunk is pinned while walked, so every cell is read from a live chunk.
    assert_eq!(solid, 9 * 4);
    assert_eq!(world.stats().loads, 9);
    // The previous chunk is still pinned while its successor loads.
    assert_eq!(world.resident_count(), 2);
    assert_eq!(world.stats().evictions, 7);
}

#[test]
fn block_edits_are_visible_to_iterators() {
    let (mut world, _, _) = recording_world(ChunkDimensions::new(4, 4, 4));
    world
        .set_block(Point3::new(-1, -1, 2), Block::new(BlockType::WOOD))
        .unwrap();

    let found: Vec<_> = world
        .iterate_resident(2)
        .filter(|(_, block)| block.native_type() == Some(BlockType::WOOD))
        .map(|(position, _)| position)
        .collect();
    assert_eq!(found, vec![Point3::new(-1, -1, 2)]);

    assert_eq!(
        world.get_block(Point3::new(-1, -1, 0)).unwrap().native_type(),
        Some(BlockType::STONE)
    );
    assert!(matches!(
        world.set_block(Point3::new(0, 0, -1), Block::AIR),
        Err(WorldError::OutOfBounds { .. })
    ));
}

#[test]
fn spawn_directives_are_queued_until_drained() {
    let (mut world, _, _) = recording_world(ChunkDimensions::new(8, 8, 2));
    world.load_chunk(Point2::new(0, 0));
    world.load_chunk(Point2::new(-1, 0));

    let mut spawns = world.drain_spawn_directives();
    spawns.sort_by_key(|spawn| spawn.position.x);
    assert_eq!(
        spawns,
        vec![
            SpawnDirective::new(7, Point3::new(-8, 0, 1)),
            SpawnDirective::new(7, Point3::new(0, 0, 1)),
        ]
    );
    assert!(world.drain_spawn_directives().is_empty());
}

#[test]
fn iterators_reject_top_above_the_world() {
    let (mut world, _, _) = recording_world(ChunkDimensions::new(2, 2, 2));
    assert!(matches!(
        world.iterate_window(Point2::new(0, 0), 0, 2),
        Err(WorldError::OutOfBounds { .. })
    ));
}
