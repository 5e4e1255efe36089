//! Camera for 3D orbit view.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec2, Vec3};

/// Smallest polar angle (from +y) the orbit may reach.
pub const MIN_POLAR: f32 = PI / 3.0;
/// Largest polar angle (from +y) the orbit may reach.
pub const MAX_POLAR: f32 = PI / 1.5;

/// Radians of orbit per pixel dragged.
const ORBIT_SPEED: f32 = 0.005;

/// Orbit camera around the origin. Distance is fixed: no zoom, no pan.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Rotation about the y axis in radians; zero looks down -z.
    pub azimuth: f32,
    /// Angle from the +y axis in radians, kept in `[MIN_POLAR, MAX_POLAR]`.
    pub polar: f32,
    /// Distance from the origin.
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Camera {
    /// Camera on the +z axis, six units out, 60° field of view.
    pub fn new() -> Self {
        Self {
            azimuth: 0.0,
            polar: FRAC_PI_2,
            distance: 6.0,
            fov_degrees: 60.0,
        }
    }

    /// Orbit by a mouse drag of `delta` pixels.
    pub fn orbit(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * ORBIT_SPEED;
        self.polar = (self.polar - delta.y * ORBIT_SPEED).clamp(MIN_POLAR, MAX_POLAR);
    }

    /// The camera's world position.
    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.distance * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, 0.1, 100.0)
    }

    /// World-space right and up vectors of the view, for billboarding.
    pub fn billboard_axes(&self) -> (Vec3, Vec3) {
        let view = self.view_matrix();
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);
        (right, up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position() {
        let camera = Camera::new();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-5);
        let (right, up) = camera.billboard_axes();
        assert!((right - Vec3::X).length() < 1e-5);
        assert!((up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_polar_clamp() {
        let mut camera = Camera::new();
        camera.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(camera.polar, MIN_POLAR);
        camera.orbit(Vec2::new(0.0, -10_000.0));
        assert_eq!(camera.polar, MAX_POLAR);
        assert!((camera.position().length() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_azimuth_is_free() {
        let mut camera = Camera::new();
        camera.orbit(Vec2::new(-PI / ORBIT_SPEED, 0.0));
        assert!((camera.position() - Vec3::new(0.0, 0.0, -6.0)).length() < 1e-3);
    }
}
