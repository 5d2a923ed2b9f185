//! Surface point at a ray-triangle intersection.
//!
//! Implements the ideal diffuse BRDF: emission, reflection, and importance
//! sampled bounce directions. All direction parameters are unit vectors
//! pointing away from the surface.

use std::f64::consts::PI;

use lux_math::{is_zero, Vec3};
use rand::RngCore;

use crate::{gen_f64, Color, Triangle, TriangleId};

/// Minimum squared distance used by the solid-angle emission term.
const MIN_DISTANCE_SQUARED: f64 = 1e-6;

/// A position on a triangle, valid for one shading step.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint<'a> {
    id: TriangleId,
    triangle: &'a Triangle,
    position: Vec3,
}

impl<'a> SurfacePoint<'a> {
    pub fn new(id: TriangleId, triangle: &'a Triangle, position: Vec3) -> Self {
        Self {
            id,
            triangle,
            position,
        }
    }

    pub fn id(&self) -> TriangleId {
        self.id
    }

    pub fn triangle(&self) -> &'a Triangle {
        self.triangle
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Radiance emitted from this point toward `to_position`.
    ///
    /// Only the front face emits. With `is_solid_angle` the emissivity is
    /// scaled by the projected area over squared distance, as needed when
    /// the point was picked by area sampling.
    pub fn emission(&self, to_position: Vec3, out_direction: Vec3, is_solid_angle: bool) -> Color {
        let cos_area = out_direction.dot(self.triangle.normal()) * self.triangle.area();
        if cos_area <= 0.0 {
            return Color::ZERO;
        }

        let solid_angle = if is_solid_angle {
            let distance_squared = (to_position - self.position).length_squared();
            cos_area / distance_squared.max(MIN_DISTANCE_SQUARED)
        } else {
            1.0
        };

        self.triangle.emissivity() * solid_angle
    }

    /// Radiance reflected toward `out_direction` from `in_radiance`
    /// arriving along `-in_direction`.
    pub fn reflection(&self, in_direction: Vec3, in_radiance: Color, out_direction: Vec3) -> Color {
        let normal = self.triangle.normal();
        let in_dot = in_direction.dot(normal);
        let out_dot = out_direction.dot(normal);

        // No transmission
        if (in_dot < 0.0) != (out_dot < 0.0) {
            return Color::ZERO;
        }

        in_radiance * self.triangle.reflectivity() * (in_dot.abs() / PI)
    }

    /// Sample the direction of the next path segment.
    ///
    /// `in_direction` points back toward where the path came from. Returns
    /// the new direction and the color weight to apply to radiance coming
    /// back along it, or `None` when the path is absorbed.
    pub fn next_direction(&self, rng: &mut dyn RngCore, in_direction: Vec3) -> Option<(Vec3, Color)> {
        let reflectivity = self.triangle.reflectivity();
        let reflectivity_mean = reflectivity.dot(Vec3::splat(1.0 / 3.0));

        // Russian roulette on reflectance magnitude
        if reflectivity_mean <= gen_f64(rng) {
            return None;
        }

        // Cosine-weighted hemisphere sample, z along the normal
        let theta = 2.0 * PI * gen_f64(rng);
        let r2 = gen_f64(rng);
        let r = r2.sqrt();
        let x = theta.cos() * r;
        let y = theta.sin() * r;
        let z = (1.0 - r2).sqrt();

        let tangent = self.triangle.tangent();
        let mut normal = self.triangle.normal();
        // Keep the normal on the incoming side
        if normal.dot(in_direction) < 0.0 {
            normal = -normal;
        }

        let out_direction = x * tangent + y * normal.cross(tangent) + z * normal;
        if is_zero(out_direction) {
            return None;
        }

        Some((out_direction, reflectivity / reflectivity_mean))
    }
}
