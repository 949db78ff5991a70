//! # World Errors
//!
//! Every fallible operation in the crate reports a [`WorldError`]. Coordinate,
//! bounds and exhaustion errors are contract violations by the caller and abort
//! the operation that raised them. `SourceUnavailable` is the only kind with a
//! fallback: the external source adapter logs it and hands back air.

use std::fmt;

use crate::voxels::coords::RegionCoordinate;

/// Result alias used across the crate.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised by coordinate construction, chunk access, iteration and
/// external sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// A local coordinate fell outside `[0, span)`.
    OutOfRange {
        /// Which coordinate was being constructed.
        what: &'static str,
        /// The offending component value.
        value: i32,
        /// The exclusive upper bound.
        span: i32,
    },
    /// A chunk-local index fell outside the chunk's block array.
    OutOfBounds {
        /// Requested index.
        index: (i32, i32, i32),
        /// Chunk extent on each axis.
        bounds: (i32, i32, i32),
    },
    /// An external region or chunk could not be opened or parsed.
    SourceUnavailable {
        /// Region the failure belongs to.
        region: RegionCoordinate,
        /// Human readable cause.
        reason: String,
    },
    /// `next` was called on an iterator with no remaining elements.
    Exhausted,
    /// A configuration value could not be parsed or failed validation.
    InvalidConfig(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { what, value, span } => {
                write!(f, "{what} component {value} outside [0, {span})")
            }
            Self::OutOfBounds { index, bounds } => write!(
                f,
                "chunk index {:?} outside chunk bounds {:?}",
                index, bounds
            ),
            Self::SourceUnavailable { region, reason } => write!(
                f,
                "region ({}, {}) unavailable: {reason}",
                region.x, region.z
            ),
            Self::Exhausted => write!(f, "iterator advanced past its last element"),
            Self::InvalidConfig(reason) => write!(f, "invalid world configuration: {reason}"),
        }
    }
}

impl std::error::Error for WorldError {}
