//! Camera for ray generation.

use lux_core::CameraDescription;
use lux_math::{is_zero, Ray, Vec3};
use rand::RngCore;

use crate::{gen_f64, Image, RayTracer, Scene};

/// Narrowest and widest accepted field of view, in degrees.
pub const MIN_VIEW_ANGLE: f64 = 10.0;
pub const MAX_VIEW_ANGLE: f64 = 160.0;

/// Pinhole camera with a precomputed orthonormal frame.
#[derive(Debug, Clone)]
pub struct Camera {
    view_position: Vec3,
    view_direction: Vec3,
    right: Vec3,
    up: Vec3,
    /// Field of view in radians
    view_angle: f64,
}

impl Camera {
    /// Create a camera.
    ///
    /// A zero `view_direction` defaults to +z. `view_angle` is in degrees
    /// and is clamped to [10, 160].
    pub fn new(view_position: Vec3, view_direction: Vec3, view_angle: f64) -> Self {
        let mut view_direction = view_direction.normalize_or_zero();
        if is_zero(view_direction) {
            view_direction = Vec3::Z;
        }

        let view_angle = view_angle.clamp(MIN_VIEW_ANGLE, MAX_VIEW_ANGLE).to_radians();

        // Frame from the world up, unless looking straight up or down
        let mut right = Vec3::Y.cross(view_direction).normalize_or_zero();
        let up = if !is_zero(right) {
            view_direction.cross(right).normalize_or_zero()
        } else {
            let up = Vec3::new(0.0, 0.0, if view_direction.y < 0.0 { 1.0 } else { -1.0 });
            right = up.cross(view_direction).normalize_or_zero();
            up
        };

        Self {
            view_position,
            view_direction,
            right,
            up,
            view_angle,
        }
    }

    pub fn from_description(description: &CameraDescription) -> Self {
        Self::new(description.position, description.direction, description.view_angle)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.view_position
    }

    pub fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Field of view in radians, after clamping.
    pub fn view_angle(&self) -> f64 {
        self.view_angle
    }

    /// Generate a ray through pixel (x, y), jittered within the pixel.
    ///
    /// Pixel rows count upward from the bottom of the image.
    pub fn get_ray(&self, x: u32, y: u32, width: u32, height: u32, rng: &mut dyn RngCore) -> Ray {
        let aspect = height as f64 / width as f64;

        let x_coeff = ((x as f64 + gen_f64(rng)) * 2.0 / width as f64) - 1.0;
        let y_coeff = ((y as f64 + gen_f64(rng)) * 2.0 / height as f64) - 1.0;

        let offset = self.right * x_coeff + self.up * (y_coeff * aspect);
        let direction =
            (self.view_direction + offset * (self.view_angle * 0.5).tan()).normalize_or_zero();

        Ray::new(self.view_position, direction)
    }

    /// Add one radiance sample to every pixel of `image`.
    pub fn get_frame(&self, scene: &Scene, image: &mut Image, rng: &mut dyn RngCore) {
        let tracer = RayTracer::new(scene);
        let (width, height) = (image.width(), image.height());

        for y in 0..height {
            for x in 0..width {
                let ray = self.get_ray(x, y, width, height, rng);
                let radiance = tracer.radiance(&ray, rng, None);
                image.add_to_pixel(x, y, radiance);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_orthonormal(camera: &Camera) {
        let (r, u, v) = (camera.right(), camera.up(), camera.view_direction());
        for a in [r, u, v] {
            assert!((a.length() - 1.0).abs() < 1e-12);
        }
        assert!(r.dot(u).abs() < 1e-12);
        assert!(r.dot(v).abs() < 1e-12);
        assert!(u.dot(v).abs() < 1e-12);
    }

    #[test]
    fn test_camera_frame() {
        let camera = Camera::new(Vec3::new(0.0, 0.75, -2.0), Vec3::new(0.0, 0.0, 1.0), 45.0);

        assert_eq!(camera.view_direction(), Vec3::Z);
        assert_eq!(camera.right(), Vec3::X);
        assert_eq!(camera.up(), Vec3::Y);
        assert!((camera.view_angle() - 45f64.to_radians()).abs() < 1e-12);
        assert_orthonormal(&camera);

        let oblique = Camera::new(Vec3::ZERO, Vec3::new(1.0, -2.0, 0.5), 60.0);
        assert_orthonormal(&oblique);
        assert!(oblique.up().y > 0.0);
    }

    #[test]
    fn test_zero_direction_defaults_to_z() {
        let camera = Camera::new(Vec3::ZERO, Vec3::ZERO, 45.0);
        assert_eq!(camera.view_direction(), Vec3::Z);
        assert_orthonormal(&camera);
    }

    #[test]
    fn test_vertical_view_uses_fallback_up() {
        let down = Camera::new(Vec3::ZERO, -Vec3::Y, 45.0);
        assert_eq!(down.up(), Vec3::Z);
        assert_orthonormal(&down);

        let up = Camera::new(Vec3::ZERO, Vec3::Y * 3.0, 45.0);
        assert_eq!(up.up(), -Vec3::Z);
        assert_orthonormal(&up);
    }

    #[test]
    fn test_view_angle_is_clamped() {
        let narrow = Camera::new(Vec3::ZERO, Vec3::Z, 1.0);
        assert!((narrow.view_angle() - MIN_VIEW_ANGLE.to_radians()).abs() < 1e-12);

        let wide = Camera::new(Vec3::ZERO, Vec3::Z, 179.0);
        assert!((wide.view_angle() - MAX_VIEW_ANGLE.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_rays_stay_inside_field_of_view() {
        let camera = Camera::new(Vec3::ZERO, Vec3::Z, 90.0);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let ray = camera.get_ray(0, 0, 4, 4, &mut rng);
            assert!((ray.direction.length() - 1.0).abs() < 1e-12);
            // Bottom-left pixel of a 90 degree view
            assert!(ray.direction.x <= 0.0 && ray.direction.y <= 0.0);
            assert!(ray.direction.x >= -std::f64::consts::FRAC_1_SQRT_2 - 1e-12);
        }

        // Center pixel of an odd-sized image points roughly forward
        let ray = camera.get_ray(50, 50, 101, 101, &mut rng);
        assert!(ray.direction.z > 0.999);
    }

    #[test]
    fn test_get_frame_accumulates() {
        let scene = Scene::new(Color::ONE, Color::ZERO, Vec::new(), Vec3::ZERO);
        // Looking slightly up: every ray sees the sky
        let camera = Camera::new(Vec3::ZERO, Vec3::Y, 20.0);
        let mut image = Image::new(3, 2);
        let mut rng = StdRng::seed_from_u64(1);

        camera.get_frame(&scene, &mut image, &mut rng);
        camera.get_frame(&scene, &mut image, &mut rng);

        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(image.pixel(x, y), Color::splat(2.0));
            }
        }
    }
}
