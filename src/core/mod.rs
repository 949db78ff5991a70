//! # Core Module
//!
//! Resource handles shared between the chunk store and the iterators that walk it.
//!
//! ## Key Components
//! - `StResource`: Single-threaded reference-counted resource with interior mutability
//!
//! The world is owned by one thread of control, so no synchronised variant is
//! provided. A caller that moves generation onto a worker builds the chunk
//! there and hands the finished value back to the owning thread.

pub mod st_resource;

pub use st_resource::StResource;
