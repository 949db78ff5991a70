#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The world core of a voxel engine: chunked block storage over an unbounded
//! horizontal plane, populated lazily by pluggable generators and walked by
//! iterators that load what they touch.
//!
//! ## Key Modules
//!
//! * `config` - World configuration (dimensions, cache budget, eviction, generator)
//! * `core` - Shared resource handles used to pin chunks
//! * `error` - The crate's error type
//! * `voxels` - Coordinates, blocks, chunks, generators and the chunk store
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point2;
//! use voxel_world::config::{GeneratorConfig, WorldConfig};
//! use voxel_world::voxels::world::{ChunkStore, World};
//!
//! let config = WorldConfig {
//!     generator: GeneratorConfig::Flat { height: 4 },
//!     ..WorldConfig::default()
//! };
//! let mut world = World::from_config(&config).unwrap();
//! let solid = world
//!     .iterate_window(Point2::new(0, 0), 0, 7)
//!     .unwrap()
//!     .filter(|(_, block)| block.is_solid())
//!     .count();
//! assert_eq!(solid, 9 * 16 * 16 * 4);
//! ```
//!
//! ## Performance Considerations
//!
//! * Chunks are generated only when first referenced and cached until evicted
//! * Foreign region files are parsed once and decoded chunks are cached
//! * Iteration walks the dense block arrays directly, without per-block lookups

use std::path::PathBuf;

use cgmath::Point2;
use log::{error, info};

pub mod config;
pub mod core;
pub mod error;
pub mod voxels;

pub use config::WorldConfig;
pub use error::{WorldError, WorldResult};
pub use voxels::world::{ChunkStore, World};

/// Chunk the demo window is centred on.
const DEMO_WINDOW_CENTER: (i32, i32) = (0, 0);

/// Runs the demo: builds a world from the configuration named by the first
/// argument (or the default one), walks the window around the origin and then
/// every resident chunk, and logs what it found.
pub fn run() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    if let Err(err) = run_demo(std::env::args().nth(1).map(PathBuf::from)) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run_demo(config_path: Option<PathBuf>) -> WorldResult<()> {
    let config = match config_path {
        Some(path) => WorldConfig::from_path(&path)?,
        None => WorldConfig::default(),
    };
    let mut world = World::from_config(&config)?;
    let top_z = config.dimensions.blocks_z - 1;

    let center = Point2::new(DEMO_WINDOW_CENTER.0, DEMO_WINDOW_CENTER.1);
    let mut visited = 0usize;
    let mut solid = 0usize;
    for (_, block) in world.iterate_window(center, 0, top_z)? {
        visited += 1;
        if block.is_solid() {
            solid += 1;
        }
    }
    info!("window around {:?}: {visited} blocks, {solid} solid", center);

    let resident = world.iterate_resident(0).count();
    let stats = world.stats();
    info!(
        "resident store: {} chunks, {} bytes, {resident} blocks",
        world.resident_count(),
        world.resident_bytes()
    );
    info!(
        "store stats: {} loads, {} hits, {} evictions",
        stats.loads, stats.hits, stats.evictions
    );

    let spawns = world.drain_spawn_directives();
    info!("{} spawn directives queued", spawns.len());
    Ok(())
}
