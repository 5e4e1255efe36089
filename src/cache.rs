//! Per-session memo of target clouds.
//!
//! Procedural clouds are generated on first request and then kept for the
//! rest of the session, so switching back and forth between shapes never
//! re-samples them. The generated archetypes share one lazily built sphere
//! placeholder and additionally own a slot that a shape service can fill.

use std::cell::OnceCell;

use tracing::debug;

use crate::archetype::ShapeArchetype;
use crate::cloud::PointCloud;
use crate::error::CacheError;
use crate::geometry;
use crate::sampling::Sampler;

const SLOTS: usize = ShapeArchetype::count() as usize;

/// Memoized target clouds, one per archetype.
///
/// Only the cache writes its slots. Readers get cheap [`PointCloud`]
/// handles that share the cached allocation.
#[derive(Debug)]
pub struct ShapeCache {
    particle_count: usize,
    procedural: [OnceCell<PointCloud>; SLOTS],
    fallback: OnceCell<PointCloud>,
    generated: [Option<PointCloud>; SLOTS],
}

impl ShapeCache {
    /// Create an empty cache for clouds of `particle_count` points.
    pub fn new(particle_count: usize) -> Self {
        Self {
            particle_count,
            procedural: std::array::from_fn(|_| OnceCell::new()),
            fallback: OnceCell::new(),
            generated: std::array::from_fn(|_| None),
        }
    }

    /// Point count of every locally generated cloud.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// The local cloud for `shape`.
    ///
    /// Procedural archetypes are generated on first call. Generated
    /// archetypes get the sphere placeholder; their service-supplied cloud
    /// lives in [`ShapeCache::custom`].
    pub fn get(&self, shape: ShapeArchetype) -> PointCloud {
        if shape.is_generated() {
            return self.fallback().clone();
        }
        self.procedural[shape.slot()]
            .get_or_init(|| {
                debug!(%shape, points = self.particle_count, "generating shape cloud");
                geometry::generate_with(shape, self.particle_count, &mut Sampler::new())
            })
            .clone()
    }

    /// The service-supplied cloud for a generated archetype, if any.
    pub fn custom(&self, shape: ShapeArchetype) -> Option<PointCloud> {
        self.generated[shape.slot()].clone()
    }

    /// Store a service-supplied cloud, returning the one it replaces.
    ///
    /// The cloud is kept at whatever length the service produced; the
    /// resolver fits it to the particle budget.
    pub fn store_custom(
        &mut self,
        shape: ShapeArchetype,
        cloud: PointCloud,
    ) -> Result<Option<PointCloud>, CacheError> {
        if !shape.is_generated() {
            return Err(CacheError::NotGenerated(shape));
        }
        debug!(%shape, points = cloud.point_count(), "storing generated cloud");
        Ok(self.generated[shape.slot()].replace(cloud))
    }

    /// Whether `shape` currently has its own cloud.
    ///
    /// For procedural archetypes this means "already generated"; for
    /// generated archetypes it means "a service result is stored".
    pub fn is_cached(&self, shape: ShapeArchetype) -> bool {
        if shape.is_generated() {
            self.generated[shape.slot()].is_some()
        } else {
            self.procedural[shape.slot()].get().is_some()
        }
    }

    /// Drop every cloud, including stored service results.
    pub fn invalidate(&mut self) {
        for cell in &mut self.procedural {
            cell.take();
        }
        self.fallback.take();
        for slot in &mut self.generated {
            slot.take();
        }
        debug!("shape cache invalidated");
    }

    fn fallback(&self) -> &PointCloud {
        self.fallback.get_or_init(|| {
            debug!(points = self.particle_count, "generating placeholder sphere");
            geometry::sphere(self.particle_count)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_clouds_are_memoized() {
        let cache = ShapeCache::new(100);
        assert!(!cache.is_cached(ShapeArchetype::Heart));

        let first = cache.get(ShapeArchetype::Heart);
        let second = cache.get(ShapeArchetype::Heart);
        assert!(first.ptr_eq(&second));
        assert_eq!(first.len(), 300);
        assert!(cache.is_cached(ShapeArchetype::Heart));
        assert!(!cache.is_cached(ShapeArchetype::Flower));
    }

    #[test]
    fn test_generated_archetypes_share_fallback() {
        let cache = ShapeCache::new(50);
        let a = cache.get(ShapeArchetype::AiPrimary);
        let b = cache.get(ShapeArchetype::AiCustom);
        assert!(a.ptr_eq(&b));
        assert!(a.points().all(|p| p.length() <= geometry::SPHERE_RADIUS + 1e-4));
        assert!(cache.custom(ShapeArchetype::AiPrimary).is_none());
    }

    #[test]
    fn test_store_custom() {
        let mut cache = ShapeCache::new(10);
        let cloud = PointCloud::from_flat(vec![1.0, 2.0, 3.0]).unwrap();

        assert_eq!(cache.store_custom(ShapeArchetype::AiCustom, cloud.clone()), Ok(None));
        assert!(cache.is_cached(ShapeArchetype::AiCustom));
        assert!(cache.custom(ShapeArchetype::AiCustom).unwrap().ptr_eq(&cloud));
        assert!(cache.custom(ShapeArchetype::AiPrimary).is_none());

        let previous = cache
            .store_custom(ShapeArchetype::AiCustom, PointCloud::default())
            .unwrap();
        assert!(previous.unwrap().ptr_eq(&cloud));
    }

    #[test]
    fn test_store_custom_rejects_procedural() {
        let mut cache = ShapeCache::new(10);
        let err = cache
            .store_custom(ShapeArchetype::Saturn, PointCloud::default())
            .unwrap_err();
        assert_eq!(err, CacheError::NotGenerated(ShapeArchetype::Saturn));
    }

    #[test]
    fn test_invalidate_drops_everything() {
        let mut cache = ShapeCache::new(20);
        let heart = cache.get(ShapeArchetype::Heart);
        let sphere = cache.get(ShapeArchetype::AiPrimary);
        cache
            .store_custom(ShapeArchetype::AiPrimary, PointCloud::from_points([glam::Vec3::ONE]))
            .unwrap();

        cache.invalidate();

        assert!(!cache.is_cached(ShapeArchetype::Heart));
        assert!(!cache.is_cached(ShapeArchetype::AiPrimary));
        assert!(!cache.get(ShapeArchetype::Heart).ptr_eq(&heart));
        assert!(!cache.get(ShapeArchetype::AiCustom).ptr_eq(&sphere));
    }
}
