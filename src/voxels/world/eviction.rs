//! Eviction strategies for the chunk store.

use crate::config::EvictionConfig;
use crate::voxels::coords::ChunkCoordinate;

/// Picks which resident chunk to drop when the store is over budget.
pub trait EvictionPolicy {
    /// `candidates` are the evictable chunks, least recently used first.
    /// `focus` is the chunk the camera was last centred on, if any.
    fn choose_victim(
        &self,
        candidates: &[ChunkCoordinate],
        focus: Option<ChunkCoordinate>,
    ) -> Option<ChunkCoordinate>;
}

/// Evicts the least recently used chunk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastRecentlyUsed;

impl EvictionPolicy for LeastRecentlyUsed {
    fn choose_victim(
        &self,
        candidates: &[ChunkCoordinate],
        _focus: Option<ChunkCoordinate>,
    ) -> Option<ChunkCoordinate> {
        candidates.first().copied()
    }
}

/// Evicts the least recently used chunk outside `radius` chunks (Chebyshev
/// distance) of the focus, and falls back to plain LRU when every candidate is
/// inside the radius or no focus is set.
#[derive(Debug, Clone, Copy)]
pub struct CameraRadius {
    radius: i32,
}

impl CameraRadius {
    pub fn new(radius: i32) -> Self {
        CameraRadius { radius }
    }
}

impl EvictionPolicy for CameraRadius {
    fn choose_victim(
        &self,
        candidates: &[ChunkCoordinate],
        focus: Option<ChunkCoordinate>,
    ) -> Option<ChunkCoordinate> {
        let outside = focus.and_then(|focus| {
            candidates.iter().copied().find(|chunk| {
                let distance = (chunk.x - focus.x).abs().max((chunk.y - focus.y).abs());
                distance > self.radius
            })
        });
        outside.or_else(|| candidates.first().copied())
    }
}

/// Builds the policy a configuration selects.
pub fn policy_from_config(config: &EvictionConfig) -> Box<dyn EvictionPolicy> {
    match config {
        EvictionConfig::Lru => Box::new(LeastRecentlyUsed),
        EvictionConfig::CameraRadius { radius } => Box::new(CameraRadius::new(*radius)),
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point2;

    use super::*;

    #[test]
    fn lru_takes_the_oldest() {
        let candidates = [Point2::new(1, 1), Point2::new(0, 0)];
        assert_eq!(
            LeastRecentlyUsed.choose_victim(&candidates, None),
            Some(Point2::new(1, 1))
        );
        assert_eq!(LeastRecentlyUsed.choose_victim(&[], None), None);
    }

    #[test]
    fn camera_radius_prefers_far_chunks() {
        let policy = CameraRadius::new(1);
        let candidates = [Point2::new(0, 1), Point2::new(3, 0), Point2::new(-5, 0)];
        assert_eq!(
            policy.choose_victim(&candidates, Some(Point2::new(0, 0))),
            Some(Point2::new(3, 0))
        );
    }

    #[test]
    fn camera_radius_falls_back_to_lru() {
        let policy = CameraRadius::new(4);
        let candidates = [Point2::new(0, 1), Point2::new(3, 0)];
        assert_eq!(
            policy.choose_victim(&candidates, Some(Point2::new(0, 0))),
            Some(Point2::new(0, 1))
        );
        assert_eq!(policy.choose_victim(&candidates, None), Some(Point2::new(0, 1)));
    }
}
