//! # Voxel World Demo Entry Point
//!
//! Calls into the library's `run()` function, which builds a world and walks it.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- path/to/world.json
//! ```

fn main() {
    voxel_world::run();
}
