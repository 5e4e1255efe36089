//! The per-frame particle update.
//!
//! [`ParticleField`] owns the particle buffer for the whole session. Each
//! frame it pulls every particle a fixed fraction of the way toward a
//! perturbed copy of its target point; higher tension pushes the perturbed
//! point further out along the particle's own direction from the origin,
//! so the cloud breathes and scatters while still converging on the shape.
//!
//! The buffer is never reset when the target changes. Particle `i` simply
//! starts heading for target point `i`, which gives the morph between
//! shapes for free.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::cloud::PointCloud;
use crate::resolver::Target;
use crate::signal::InteractionSignal;
use crate::time::FrameTime;

/// Tuning for [`ParticleField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Fraction of the remaining distance covered per frame.
    pub follow: f32,
    /// Perturbation distance at full tension.
    pub explosion: f32,
    /// Angular speed of the perturbation wobble, in radians per second.
    pub wobble_rate: f32,
    /// Fraction of the remaining scale change covered per frame.
    pub scale_follow: f32,
    /// Rotation per frame at zero tension, in radians.
    pub base_spin: f32,
    /// Extra rotation per frame at full tension, in radians.
    pub tension_spin: f32,
    /// Frame rate the per-frame factors are tuned for.
    ///
    /// When set, factors are rescaled by the real frame delta so the motion
    /// looks the same at any frame rate. When unset each `step` applies the
    /// factors exactly once.
    pub reference_fps: Option<f32>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            follow: 0.05,
            explosion: 3.0,
            wobble_rate: 2.0,
            scale_follow: 0.1,
            base_spin: 0.002,
            tension_spin: 0.01,
            reference_fps: None,
        }
    }
}

impl AnimationConfig {
    /// Blend factor for one frame.
    ///
    /// `1 − (1 − k)^(delta · fps)` reduces to `k` at exactly the reference
    /// frame rate and to zero for a zero delta.
    fn blend(&self, k: f32, delta: f32) -> f32 {
        match self.reference_fps {
            Some(fps) => 1.0 - (1.0 - k).powf(delta.max(0.0) * fps),
            None => k,
        }
    }

    /// Multiplier for per-frame increments.
    fn frames(&self, delta: f32) -> f32 {
        match self.reference_fps {
            Some(fps) => delta.max(0.0) * fps,
            None => 1.0,
        }
    }
}

/// The session's particle buffer and its display transform.
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<f32>,
    display_scale: f32,
    rotation: f32,
    explosion: f32,
    config: AnimationConfig,
}

impl ParticleField {
    /// Allocate the buffer and seed it with `seed`.
    pub fn new(seed: &PointCloud, config: AnimationConfig) -> Self {
        Self {
            positions: seed.to_vec(),
            display_scale: 1.0,
            rotation: 0.0,
            explosion: 0.0,
            config,
        }
    }

    /// Advance one frame toward `target`.
    ///
    /// Does not allocate. `target` always holds one point per particle, so
    /// the buffers are walked in lockstep.
    pub fn step(&mut self, frame: FrameTime, signal: &InteractionSignal, target: &Target) {
        debug_assert_eq!(target.len(), self.positions.len());

        let tension = signal.tension();
        let explosion = tension * self.config.explosion;
        let follow = self.config.blend(self.config.follow, frame.delta);
        let phase = frame.elapsed * self.config.wobble_rate;

        for (i, (current, goal)) in self
            .positions
            .chunks_exact_mut(3)
            .zip(target.chunks_exact(3))
            .enumerate()
        {
            let c = Vec3::from_slice(current);
            let t = Vec3::from_slice(goal);

            let distance = c.length();
            let dir = c / if distance > 0.0 { distance } else { 1.0 };

            let wobble = phase + i as f32;
            let perturbed = Vec3::new(
                t.x + dir.x * explosion * wobble.sin(),
                t.y + dir.y * explosion * wobble.cos(),
                t.z + dir.z * explosion,
            );

            c.lerp(perturbed, follow).write_to_slice(current);
        }

        self.explosion = explosion;
        let scale_follow = self.config.blend(self.config.scale_follow, frame.delta);
        self.display_scale += (signal.scale() - self.display_scale) * scale_follow;
        let spin = self.config.base_spin + tension * self.config.tension_spin;
        self.rotation = (self.rotation + spin * self.config.frames(frame.delta)) % std::f32::consts::TAU;
    }

    /// Replace the buffer contents with `cloud`, cyclically repeated to the
    /// particle count. The count itself never changes.
    pub fn reseed(&mut self, cloud: &PointCloud) {
        if cloud.is_empty() {
            return;
        }
        for (i, value) in self.positions.iter_mut().enumerate() {
            *value = cloud[i % cloud.len()];
        }
    }

    /// Flat particle positions.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Smoothed display scale.
    #[inline]
    pub fn display_scale(&self) -> f32 {
        self.display_scale
    }

    /// Accumulated rotation about the y axis, in `[0, 2π)`.
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Perturbation distance used by the last step.
    #[inline]
    pub fn explosion(&self) -> f32 {
        self.explosion
    }

    #[inline]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// World transform of the cloud: uniform scale, then rotation about y.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation) * Mat4::from_scale(Vec3::splat(self.display_scale))
    }

    /// Mean distance from the origin over all particles.
    pub fn mean_radius(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.positions.chunks_exact(3).map(|p| Vec3::from_slice(p).length()).sum();
        sum / self.particle_count() as f32
    }

    /// Largest distance between a particle and its target point.
    pub fn max_error(&self, target: &Target) -> f32 {
        self.positions
            .chunks_exact(3)
            .zip(target.chunks_exact(3))
            .map(|(c, t)| Vec3::from_slice(c).distance(Vec3::from_slice(t)))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ShapeArchetype;
    use crate::cache::ShapeCache;
    use crate::resolver::TargetResolver;

    fn still(tension: f32) -> InteractionSignal {
        InteractionSignal::new(tension, 1.0, false)
    }

    fn setup(n: usize, shape: ShapeArchetype) -> (ParticleField, Target) {
        let cache = ShapeCache::new(n);
        let target = TargetResolver::for_cache(&cache).resolve(shape, None, &cache);
        let field = ParticleField::new(&cache.get(ShapeArchetype::Fireworks), AnimationConfig::default());
        (field, target)
    }

    #[test]
    fn test_zero_tension_contracts_by_constant_factor() {
        let (mut field, target) = setup(200, ShapeArchetype::Heart);
        let mut previous = field.max_error(&target);
        for frame in 0..50 {
            let before: Vec<f32> = field.positions().to_vec();
            field.step(FrameTime::fixed(frame, 60.0), &still(0.0), &target);

            for ((c, b), t) in field.positions().iter().zip(&before).zip(target.iter()) {
                let expected = t + (b - t) * 0.95;
                assert!((c - expected).abs() < 1e-4, "got {c}, expected {expected}");
            }
            let error = field.max_error(&target);
            assert!(error <= previous + 1e-5);
            previous = error;
        }
    }

    #[test]
    fn test_zero_vector_stays_finite() {
        let cache = ShapeCache::new(16);
        let target = TargetResolver::new(16).resolve(ShapeArchetype::Saturn, None, &cache);
        let zeros = PointCloud::from_flat(vec![0.0; 48]).unwrap();
        let mut field = ParticleField::new(&zeros, AnimationConfig::default());

        for frame in 0..200 {
            field.step(FrameTime::fixed(frame, 60.0), &still(1.0), &target);
            assert!(field.positions().iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_first_step_from_origin_ignores_direction() {
        let zeros = PointCloud::from_flat(vec![0.0; 3]).unwrap();
        let cache = ShapeCache::new(1);
        let resolver = TargetResolver::new(1);
        let custom = PointCloud::from_points([Vec3::new(1.0, 2.0, 3.0)]);
        let target = resolver.resolve(ShapeArchetype::AiCustom, Some(&custom), &cache);
        let mut field = ParticleField::new(&zeros, AnimationConfig::default());

        field.step(FrameTime::default(), &still(1.0), &target);
        let p = Vec3::from_slice(field.positions());
        assert!((p - Vec3::new(0.05, 0.1, 0.15)).length() < 1e-6);
    }

    #[test]
    fn test_scale_and_rotation() {
        let (mut field, target) = setup(10, ShapeArchetype::Flower);
        let signal = InteractionSignal::new(1.0, 3.0, true);

        field.step(FrameTime::fixed(0, 60.0), &signal, &target);
        assert!((field.display_scale() - 1.2).abs() < 1e-6);
        assert!((field.rotation() - 0.012).abs() < 1e-6);
        assert_eq!(field.explosion(), 3.0);

        for frame in 1..200 {
            field.step(FrameTime::fixed(frame, 60.0), &signal, &target);
        }
        assert!((field.display_scale() - 3.0).abs() < 1e-3);
        assert!((0.0..std::f32::consts::TAU).contains(&field.rotation()));
    }

    #[test]
    fn test_reference_fps_matches_per_frame_at_reference_rate() {
        let config = AnimationConfig {
            reference_fps: Some(60.0),
            ..AnimationConfig::default()
        };
        assert!((config.blend(0.05, 1.0 / 60.0) - 0.05).abs() < 1e-6);
        assert_eq!(config.blend(0.05, 0.0), 0.0);
        // Two half-length frames cover the same ground as one full frame.
        let half = config.blend(0.05, 1.0 / 120.0);
        assert!((1.0 - (1.0 - half) * (1.0 - half) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_model_matrix() {
        let (mut field, _) = setup(4, ShapeArchetype::Heart);
        field.display_scale = 2.0;
        field.rotation = std::f32::consts::FRAC_PI_2;
        let p = field.model_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn test_reseed_keeps_count() {
        let (mut field, _) = setup(5, ShapeArchetype::Heart);
        field.reseed(&PointCloud::from_points([Vec3::ONE]));
        assert_eq!(field.particle_count(), 5);
        assert!(field.positions().iter().all(|&v| v == 1.0));
        assert!((field.mean_radius() - 3.0f32.sqrt()).abs() < 1e-6);
    }
}
