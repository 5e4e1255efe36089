//! Random sampling primitives shared by the shape generators.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random source for point generation.
///
/// Generators are stochastic with no reproducibility guarantee, so
/// [`Sampler::new`] seeds from OS entropy. Tests that need a fixed
/// sequence use [`Sampler::seeded`].
///
/// ```ignore
/// let mut sampler = Sampler::new();
/// let p = sampler.unit_ball();
/// assert!(p.length() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    /// Create a sampler seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a sampler with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Random angle in `[0, 2π)`.
    #[inline]
    pub fn angle(&mut self) -> f32 {
        TAU * self.random()
    }

    /// `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.random() < p
    }

    // ========== Position helpers ==========

    /// Random point inside the unit ball, uniform in volume.
    ///
    /// θ = 2π·U1, φ = acos(2·U2 − 1) and r = cbrt(U3). The arc-cosine keeps
    /// directions uniform over the sphere and the cube root keeps density
    /// uniform over the radius, so samples do not cluster at the poles or
    /// the surface.
    pub fn unit_ball(&mut self) -> Vec3 {
        let theta = self.angle();
        let phi = (2.0 * self.random() - 1.0).acos();
        let r = self.random().cbrt();
        let sin_phi = phi.sin();

        Vec3::new(
            r * sin_phi * theta.cos(),
            r * sin_phi * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Random point inside a ball of the given radius.
    #[inline]
    pub fn in_ball(&mut self, radius: f32) -> Vec3 {
        self.unit_ball() * radius
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
