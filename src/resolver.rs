//! Active target resolution.
//!
//! The animation loop indexes the target and its own buffer in lockstep, so
//! the target must hold exactly one point per particle. [`Target`] can only
//! be produced here, which makes that length a type-level guarantee rather
//! than a per-frame check.

use std::ops::Deref;

use crate::archetype::ShapeArchetype;
use crate::cache::ShapeCache;
use crate::cloud::PointCloud;

/// A target cloud sized to the particle budget.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    cloud: PointCloud,
}

impl Target {
    /// Fit `cloud` to `len` floats, sharing it when it already fits.
    fn fit(cloud: PointCloud, len: usize) -> Self {
        if cloud.len() == len {
            Self { cloud }
        } else {
            Self {
                cloud: cloud.wrapped_to(len),
            }
        }
    }

    /// The underlying cloud.
    #[inline]
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    /// Number of target points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.cloud.point_count()
    }
}

impl Deref for Target {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.cloud
    }
}

/// Picks the cloud the particles should currently morph toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetResolver {
    particle_count: usize,
}

impl TargetResolver {
    /// Create a resolver for a buffer of `particle_count` particles.
    pub fn new(particle_count: usize) -> Self {
        Self { particle_count }
    }

    /// Create a resolver matching a cache's particle count.
    pub fn for_cache(cache: &ShapeCache) -> Self {
        Self::new(cache.particle_count())
    }

    /// Particle budget of every resolved target.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Resolve the target for `shape`.
    ///
    /// A generated archetype with a non-empty `custom` cloud targets that
    /// cloud: returned as-is when it already has one point per particle,
    /// otherwise cyclically repeated (`out[i] = custom[i % custom.len()]`)
    /// to the budget. Everything else targets the cache's local cloud.
    /// Allocates only when resampling.
    pub fn resolve(
        &self,
        shape: ShapeArchetype,
        custom: Option<&PointCloud>,
        cache: &ShapeCache,
    ) -> Target {
        let len = self.particle_count * 3;
        match custom {
            Some(cloud) if shape.is_generated() && !cloud.is_empty() => {
                Target::fit(cloud.clone(), len)
            }
            _ => Target::fit(cache.get(shape), len),
        }
    }

    /// [`resolve`](Self::resolve) for a raw archetype id; unknown ids
    /// resolve as [`ShapeArchetype::Fireworks`].
    pub fn resolve_id(&self, id: u32, custom: Option<&PointCloud>, cache: &ShapeCache) -> Target {
        self.resolve(ShapeArchetype::from(id), custom, cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_procedural_target_is_cached_cloud() {
        let cache = ShapeCache::new(64);
        let resolver = TargetResolver::for_cache(&cache);
        let target = resolver.resolve(ShapeArchetype::Flower, None, &cache);
        assert!(target.cloud().ptr_eq(&cache.get(ShapeArchetype::Flower)));
        assert_eq!(target.len(), 192);
    }

    #[test]
    fn test_exact_custom_is_returned_unchanged() {
        let cache = ShapeCache::new(4);
        let resolver = TargetResolver::new(4);
        let custom = PointCloud::from_fn(4, |i| Vec3::splat(i as f32));
        let target = resolver.resolve(ShapeArchetype::AiCustom, Some(&custom), &cache);
        assert!(target.cloud().ptr_eq(&custom));
    }

    #[test]
    fn test_short_custom_is_wrapped() {
        let cache = ShapeCache::new(3000);
        let resolver = TargetResolver::for_cache(&cache);
        let custom = PointCloud::from_fn(200, |i| Vec3::new(i as f32, 0.5, -1.0));

        let target = resolver.resolve(ShapeArchetype::AiPrimary, Some(&custom), &cache);
        assert_eq!(target.len(), 9000);
        for i in 0..target.len() {
            assert_eq!(target[i], custom[i % 600]);
        }
    }

    #[test]
    fn test_long_custom_is_truncated() {
        let cache = ShapeCache::new(2);
        let resolver = TargetResolver::new(2);
        let custom = PointCloud::from_fn(5, |i| Vec3::splat(i as f32));
        let target = resolver.resolve(ShapeArchetype::AiPrimary, Some(&custom), &cache);
        assert_eq!(&target[..], &custom[..6]);
    }

    #[test]
    fn test_custom_ignored_for_procedural_and_when_empty() {
        let cache = ShapeCache::new(10);
        let resolver = TargetResolver::new(10);
        let custom = PointCloud::from_fn(10, |_| Vec3::ONE);

        let heart = resolver.resolve(ShapeArchetype::Heart, Some(&custom), &cache);
        assert!(heart.cloud().ptr_eq(&cache.get(ShapeArchetype::Heart)));

        let empty = PointCloud::default();
        let ai = resolver.resolve(ShapeArchetype::AiCustom, Some(&empty), &cache);
        assert!(ai.cloud().ptr_eq(&cache.get(ShapeArchetype::AiCustom)));
    }

    #[test]
    fn test_unknown_id_resolves_fireworks() {
        let cache = ShapeCache::new(8);
        let resolver = TargetResolver::new(8);
        let target = resolver.resolve_id(42, None, &cache);
        assert!(target.cloud().ptr_eq(&cache.get(ShapeArchetype::Fireworks)));
    }
}
