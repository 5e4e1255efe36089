//! The single-threaded core of a running piece.
//!
//! A [`Session`] ties the shape cache, the resolver and the particle field
//! together with the user's current choices. The viewer (or the headless
//! runner) feeds it one frame at a time and forwards generation outcomes as
//! they arrive.

use tracing::{info, warn};

use crate::animation::ParticleField;
use crate::archetype::ShapeArchetype;
use crate::cache::ShapeCache;
use crate::config::Config;
use crate::geometry;
use crate::generation::GenerationOutcome;
use crate::resolver::{Target, TargetResolver};
use crate::signal::InteractionSignal;
use crate::time::FrameTime;
use crate::visuals::Color;

/// Notice shown when a generation request produced nothing.
pub const GENERATION_FAILED: &str = "AI generation failed. Check the shape service configuration.";

/// Selected shape, target and particle state for one run.
#[derive(Debug)]
pub struct Session {
    cache: ShapeCache,
    resolver: TargetResolver,
    field: ParticleField,
    shape: ShapeArchetype,
    target: Target,
    color: Color,
    notice: Option<String>,
}

impl Session {
    /// Start a session. The particles begin scattered as fireworks and
    /// morph toward the configured shape.
    pub fn new(config: &Config) -> Self {
        let cache = ShapeCache::new(config.particles);
        let resolver = TargetResolver::for_cache(&cache);
        // A burst of its own, so selecting Fireworks still visibly morphs.
        let field = ParticleField::new(&geometry::fireworks(config.particles), config.animation.clone());
        let target = resolver.resolve(config.shape, None, &cache);

        info!(particles = config.particles, shape = %config.shape, "session started");

        Self {
            cache,
            resolver,
            field,
            shape: config.shape,
            target,
            color: config.visuals.color,
            notice: None,
        }
    }

    /// Switch the target archetype.
    ///
    /// The particles keep their positions and start morphing from wherever
    /// they are.
    pub fn select(&mut self, shape: ShapeArchetype) {
        if shape != self.shape {
            info!(from = %self.shape, to = %shape, "shape changed");
        }
        self.shape = shape;
        self.refresh_target();
    }

    /// Apply a finished generation request.
    ///
    /// A cloud is stored in the slot of the archetype it was requested for,
    /// whether or not that archetype is still selected. A missing cloud
    /// leaves everything as it was and raises a notice. Returns whether a
    /// cloud was stored.
    pub fn apply(&mut self, outcome: GenerationOutcome) -> bool {
        let Some(cloud) = outcome.cloud else {
            self.notice = Some(GENERATION_FAILED.to_owned());
            return false;
        };

        match self.cache.store_custom(outcome.shape, cloud) {
            Ok(_) => {
                info!(shape = %outcome.shape, prompt = %outcome.request.prompt, "generated shape stored");
                if outcome.shape == self.shape {
                    self.refresh_target();
                }
                true
            }
            Err(err) => {
                warn!(error = %err, "discarding generated cloud");
                self.notice = Some(err.to_string());
                false
            }
        }
    }

    /// Advance the particles by one frame.
    pub fn step(&mut self, frame: FrameTime, signal: &InteractionSignal) {
        self.field.step(frame, signal, &self.target);
    }

    /// Drop every cached cloud, including generated ones, and re-resolve.
    pub fn reset(&mut self) {
        info!("resetting shape cache");
        self.cache.invalidate();
        self.refresh_target();
    }

    fn refresh_target(&mut self) {
        let custom = self.cache.custom(self.shape);
        self.target = self.resolver.resolve(self.shape, custom.as_ref(), &self.cache);
    }

    #[inline]
    pub fn shape(&self) -> ShapeArchetype {
        self.shape
    }

    #[inline]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[inline]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    #[inline]
    pub fn cache(&self) -> &ShapeCache {
        &self.cache
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Cycle to the next palette colour.
    pub fn next_color(&mut self) {
        self.color = self.color.next_in_palette();
    }

    /// The pending notice, if any. Reading does not clear it.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Take the pending notice, clearing it.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::PointCloud;
    use crate::generation::GenerationRequest;
    use crate::visuals::PALETTE;
    use glam::Vec3;

    fn session(n: usize) -> Session {
        Session::new(&Config::default().with_particles(n))
    }

    fn outcome(shape: ShapeArchetype, cloud: Option<PointCloud>) -> GenerationOutcome {
        GenerationOutcome {
            shape,
            request: GenerationRequest::new("test"),
            cloud,
        }
    }

    #[test]
    fn test_initial_state() {
        let s = session(100);
        assert_eq!(s.shape(), ShapeArchetype::Heart);
        assert_eq!(s.color(), PALETTE[0]);
        assert!(s.target().cloud().ptr_eq(&s.cache().get(ShapeArchetype::Heart)));
        assert_eq!(s.field().particle_count(), 100);
    }

    #[test]
    fn test_seed_is_independent_of_fireworks_target() {
        let mut s = session(200);
        s.select(ShapeArchetype::Fireworks);
        let target = s.target().clone();
        assert!(s.field().max_error(&target) > 0.0);
        assert_ne!(s.field().positions(), &target[..]);

        s.step(FrameTime::fixed(0, 60.0), &InteractionSignal::new(0.0, 1.0, false));
        assert!(s.field().positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_select_keeps_particles() {
        let mut s = session(50);
        s.step(FrameTime::fixed(0, 60.0), &InteractionSignal::default());
        let before = s.field().positions().to_vec();
        s.select(ShapeArchetype::Saturn);
        assert_eq!(s.field().positions(), &before[..]);
        assert!(s.target().cloud().ptr_eq(&s.cache().get(ShapeArchetype::Saturn)));
    }

    #[test]
    fn test_apply_to_selected_shape() {
        let mut s = session(10);
        s.select(ShapeArchetype::AiCustom);
        let cloud = PointCloud::from_fn(10, |i| Vec3::splat(i as f32));
        assert!(s.apply(outcome(ShapeArchetype::AiCustom, Some(cloud.clone()))));
        assert!(s.target().cloud().ptr_eq(&cloud));
    }

    #[test]
    fn test_apply_to_other_shape_waits_for_selection() {
        let mut s = session(10);
        let cloud = PointCloud::from_fn(10, |_| Vec3::ONE);
        assert!(s.apply(outcome(ShapeArchetype::AiPrimary, Some(cloud.clone()))));
        assert!(s.target().cloud().ptr_eq(&s.cache().get(ShapeArchetype::Heart)));

        s.select(ShapeArchetype::AiPrimary);
        assert!(s.target().cloud().ptr_eq(&cloud));
        s.select(ShapeArchetype::AiCustom);
        assert!(s.target().cloud().ptr_eq(&s.cache().get(ShapeArchetype::AiCustom)));
    }

    #[test]
    fn test_failed_outcome_keeps_target() {
        let mut s = session(10);
        s.select(ShapeArchetype::AiPrimary);
        let before = s.target().clone();

        assert!(!s.apply(outcome(ShapeArchetype::AiPrimary, None)));
        assert!(s.target().cloud().ptr_eq(before.cloud()));
        assert_eq!(s.take_notice().as_deref(), Some(GENERATION_FAILED));
        assert!(s.notice().is_none());
    }

    #[test]
    fn test_outcome_for_procedural_shape_is_rejected() {
        let mut s = session(10);
        let cloud = PointCloud::from_points([Vec3::ONE]);
        assert!(!s.apply(outcome(ShapeArchetype::Heart, Some(cloud))));
        assert!(s.notice().is_some());
    }

    #[test]
    fn test_reset_regenerates() {
        let mut s = session(20);
        let heart = s.target().clone();
        s.apply(outcome(ShapeArchetype::AiPrimary, Some(PointCloud::from_points([Vec3::X]))));
        s.reset();
        assert!(!s.target().cloud().ptr_eq(heart.cloud()));
        assert!(s.cache().custom(ShapeArchetype::AiPrimary).is_none());
    }

    #[test]
    fn test_colors() {
        let mut s = session(1);
        s.next_color();
        assert_eq!(s.color(), PALETTE[1]);
        s.set_color(Color::rgb8(1, 2, 3));
        s.next_color();
        assert_eq!(s.color(), PALETTE[0]);
    }
}
