//! Procedural shape generators.
//!
//! Every generator maps a point count `n` to a fresh [`PointCloud`] of
//! `n` points (`3n` floats). Generators are stochastic: each call draws new
//! samples and no two calls share state. The `_with` variants take an
//! explicit [`Sampler`] so callers can seed them.
//!
//! | Generator | Shape |
//! |-----------|-------|
//! | [`heart`] | Parametric heart curve with volumetric noise and depth |
//! | [`flower`] | Five-petal polar rose, thick at the centre |
//! | [`saturn`] | Ball body (70%) plus a flat ring (30%) |
//! | [`fireworks`] | Ball with sparse far-flung burst outliers |
//! | [`sphere`] | Plain ball, the placeholder for generated shapes |

use glam::Vec3;

use crate::archetype::ShapeArchetype;
use crate::cloud::PointCloud;
use crate::sampling::Sampler;

/// Scale applied to the heart curve (its raw extent is about ±17).
pub const HEART_SCALE: f32 = 0.1;
/// Radius of the noise added to each heart curve point, before scaling.
pub const HEART_SPREAD: f32 = 0.5;
/// Half-depth of the heart along z.
pub const HEART_DEPTH: f32 = 2.0;

/// Number of flower petals.
pub const FLOWER_PETALS: f32 = 5.0;
/// Scale applied to the flower in the xy plane.
pub const FLOWER_SCALE: f32 = 0.5;

/// Radius of Saturn's body.
pub const SATURN_BODY_RADIUS: f32 = 1.5;
/// Inner radius of Saturn's ring.
pub const SATURN_RING_INNER: f32 = 2.5;
/// Outer radius of Saturn's ring (exclusive).
pub const SATURN_RING_OUTER: f32 = 4.5;
/// Half-thickness of Saturn's ring.
pub const SATURN_RING_WOBBLE: f32 = 0.05;

/// Radius of the fireworks ball.
pub const FIREWORKS_RADIUS: f32 = 3.0;
/// Probability that a fireworks point becomes a burst outlier.
pub const BURST_CHANCE: f32 = 0.1;
/// Extra scale applied to burst outliers.
pub const BURST_FACTOR: f32 = 3.0;

/// Radius of the placeholder sphere.
pub const SPHERE_RADIUS: f32 = 2.0;

/// Number of Saturn points that belong to the body: `floor(0.7 * count)`.
#[inline]
pub fn saturn_body_count(count: usize) -> usize {
    count * 7 / 10
}

/// Heart curve.
///
/// `x = 16 sin³t`, `y = 13 cos t − 5 cos 2t − 2 cos 3t − cos 4t` with `t`
/// uniform, plus unit-ball noise for thickness in xy and an independent
/// depth in z.
pub fn heart(count: usize) -> PointCloud {
    heart_with(count, &mut Sampler::new())
}

/// [`heart`] with an explicit sampler.
pub fn heart_with(count: usize, sampler: &mut Sampler) -> PointCloud {
    PointCloud::from_fn(count, |_| {
        let t = sampler.angle();
        let x = 16.0 * t.sin().powi(3);
        let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
        let noise = sampler.unit_ball();

        Vec3::new(
            (x + noise.x * HEART_SPREAD) * HEART_SCALE,
            (y + noise.y * HEART_SPREAD) * HEART_SCALE,
            noise.z * HEART_DEPTH,
        )
    })
}

/// Five-petal flower.
pub fn flower(count: usize) -> PointCloud {
    flower_with(count, &mut Sampler::new())
}

/// [`flower`] with an explicit sampler.
pub fn flower_with(count: usize, sampler: &mut Sampler) -> PointCloud {
    PointCloud::from_fn(count, |_| {
        let u = sampler.angle();
        let v = sampler.random();
        let petal = (FLOWER_PETALS * u).sin() * 2.0 + 3.0;
        let radius = petal * v;
        // Thick at the centre, thin at the petal tips.
        let z = (sampler.random() - 0.5) * 2.0 * (1.0 - v);

        Vec3::new(
            u.cos() * radius * FLOWER_SCALE,
            u.sin() * radius * FLOWER_SCALE,
            z,
        )
    })
}

/// Saturn: a ball body followed by a flat ring in the xz plane.
///
/// The first [`saturn_body_count`] points are the body, the rest the ring.
pub fn saturn(count: usize) -> PointCloud {
    saturn_with(count, &mut Sampler::new())
}

/// [`saturn`] with an explicit sampler.
pub fn saturn_with(count: usize, sampler: &mut Sampler) -> PointCloud {
    let body = saturn_body_count(count);
    PointCloud::from_fn(count, |i| {
        if i < body {
            sampler.in_ball(SATURN_BODY_RADIUS)
        } else {
            let angle = sampler.angle();
            let dist = sampler.random_range(SATURN_RING_INNER, SATURN_RING_OUTER);
            let wobble = (sampler.random() - 0.5) * 2.0 * SATURN_RING_WOBBLE;
            Vec3::new(angle.cos() * dist, wobble, angle.sin() * dist)
        }
    })
}

/// Fireworks: a ball where roughly one point in ten is flung three times
/// farther out.
pub fn fireworks(count: usize) -> PointCloud {
    fireworks_with(count, &mut Sampler::new())
}

/// [`fireworks`] with an explicit sampler.
pub fn fireworks_with(count: usize, sampler: &mut Sampler) -> PointCloud {
    PointCloud::from_fn(count, |_| {
        let p = sampler.in_ball(FIREWORKS_RADIUS);
        if sampler.chance(BURST_CHANCE) {
            p * BURST_FACTOR
        } else {
            p
        }
    })
}

/// Placeholder ball used while a generated shape has no data.
pub fn sphere(count: usize) -> PointCloud {
    sphere_with(count, &mut Sampler::new())
}

/// [`sphere`] with an explicit sampler.
pub fn sphere_with(count: usize, sampler: &mut Sampler) -> PointCloud {
    PointCloud::from_fn(count, |_| sampler.in_ball(SPHERE_RADIUS))
}

/// Generate the local cloud for an archetype.
///
/// Generated archetypes get the placeholder [`sphere`].
pub fn generate_with(shape: ShapeArchetype, count: usize, sampler: &mut Sampler) -> PointCloud {
    match shape {
        ShapeArchetype::Heart => heart_with(count, sampler),
        ShapeArchetype::Flower => flower_with(count, sampler),
        ShapeArchetype::Saturn => saturn_with(count, sampler),
        ShapeArchetype::Fireworks => fireworks_with(count, sampler),
        ShapeArchetype::AiPrimary | ShapeArchetype::AiCustom => sphere_with(count, sampler),
    }
}
