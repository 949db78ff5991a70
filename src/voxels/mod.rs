//! # Voxels
//!
//! This module contains the chunked voxel world: how blocks are addressed, how
//! chunks are filled, where their contents come from and how they are kept in
//! memory and walked.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components, each depending
//! only on the ones above it:
//!
//! * **Coords**: Block, chunk and foreign region coordinates and the floor
//!   arithmetic that converts between them
//! * **Block**: The native block record and vocabulary
//! * **Chunk**: A dense column of blocks plus a bounded iterator over it
//! * **Generation**: Procedural generators and the adapter over foreign region files
//! * **World**: The chunk store with lazy loading, eviction and the
//!   whole-store and windowed iterators
//!
//! ## Data Flow
//!
//! 1. A caller asks the world for a chunk, a block or an iterator
//! 2. The world returns the resident chunk, or generates it on a miss
//! 3. Generation asks the generator for every cell; the external adapter
//!    answers from its decode cache, opening region files as needed
//! 4. If the resident set is over budget, unpinned chunks are evicted
//!
//! ## Thread Safety
//!
//! None of these types are `Send`. A world and everything borrowed from it
//! belong to a single thread.

pub mod block;
pub mod chunk;
pub mod coords;
pub mod generation;
pub mod world;
