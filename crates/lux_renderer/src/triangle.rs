//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use lux_math::{clamp, Bound, Ray, Vec3, EPSILON, TOLERANCE};
use rand::RngCore;

use crate::{gen_f64, Color};

/// Index of a triangle in the scene's item table.
pub type TriangleId = usize;

/// A triangle primitive with a diffuse surface.
///
/// Immutable after construction: edges, normal, tangent, area and bound
/// are all computed up front.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// v1 - v0
    edge0: Vec3,
    /// v2 - v0
    edge2: Vec3,
    reflectivity: Color,
    emissivity: Color,
    normal: Vec3,
    tangent: Vec3,
    area: f64,
    bound: Bound,
}

impl Triangle {
    /// Create a new triangle.
    ///
    /// Reflectivity is clamped to [0, 1] and emissivity to [0, inf) per
    /// channel.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, reflectivity: Color, emissivity: Color) -> Self {
        let edge0 = v1 - v0;
        let edge2 = v2 - v0;

        let cross = edge0.cross(v2 - v1);

        // Pad so that axis-aligned triangles still have volume
        let bound = Bound::from_points(&[v0, v1, v2]).padded(TOLERANCE);

        Self {
            v0,
            v1,
            v2,
            edge0,
            edge2,
            reflectivity: clamp(reflectivity, 0.0, 1.0),
            emissivity: clamp(emissivity, 0.0, f64::INFINITY),
            normal: cross.normalize_or_zero(),
            tangent: edge0.normalize_or_zero(),
            area: 0.5 * cross.length(),
            bound,
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn reflectivity(&self) -> Color {
        self.reflectivity
    }

    pub fn emissivity(&self) -> Color {
        self.emissivity
    }

    /// Axis-aligned bound, padded by `TOLERANCE` on every side.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Unit normal, following the v0 -> v1 -> v2 winding.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Unit vector along the first edge.
    pub fn tangent(&self) -> Vec3 {
        self.tangent
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// True for triangles that act as light sources.
    pub fn is_emitter(&self) -> bool {
        self.emissivity != Color::ZERO && self.area > 0.0
    }

    /// Möller-Trumbore ray-triangle intersection.
    ///
    /// Returns the distance along the ray to the hit, if the ray crosses
    /// the triangle at a non-negative distance. A zero distance is reported
    /// here; the spatial index discards it.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let pvec = ray.direction.cross(self.edge2);
        let det = self.edge0.dot(pvec);

        // Ray is parallel to triangle, or triangle is degenerate
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin - self.v0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(self.edge0);
        let v = ray.direction.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = self.edge2.dot(qvec) * inv_det;
        (distance >= 0.0).then_some(distance)
    }

    /// Pick a point uniformly over the triangle's surface.
    pub fn sample_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let sqr1 = gen_f64(rng).sqrt();
        let r2 = gen_f64(rng);
        (1.0 - sqr1) * self.edge0 + ((1.0 - r2) * sqr1) * self.edge2 + self.v0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn xy_triangle() -> Triangle {
        Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Color::splat(0.5),
            Color::ONE,
        )
    }

    fn ray(origin: [f64; 3], direction: [f64; 3]) -> Ray {
        Ray::new(Vec3::from_array(origin), Vec3::from_array(direction))
    }

    #[test]
    fn test_triangle_hit() {
        let tri = xy_triangle();

        assert_eq!(tri.intersect(&ray([0.0, 0.0, 1.0], [0.0, 0.0, -1.0])), Some(1.0));
        assert_eq!(tri.intersect(&ray([0.0, 0.0, 2.0], [0.0, 0.0, -1.0])), Some(2.0));
        assert_eq!(tri.intersect(&ray([0.9, 0.0, 1.0], [0.0, 0.0, -1.0])), Some(1.0));

        // From behind
        assert_eq!(tri.intersect(&ray([0.1, 0.1, -1.0], [0.0, 0.0, 1.0])), Some(1.0));
    }

    #[test]
    fn test_triangle_miss() {
        let tri = xy_triangle();

        // Direction is opposite
        assert_eq!(tri.intersect(&ray([0.0, 0.0, 1.0], [0.0, 0.0, 1.0])), None);
        // Direction is parallel
        assert_eq!(tri.intersect(&ray([0.0, 0.0, 1.1], [1.0, 0.0, 0.0])), None);
        // Goes wide
        let wide = Vec3::new(0.0, 1.0, -1.0).normalize();
        assert_eq!(tri.intersect(&Ray::new(Vec3::new(0.0, 0.0, 2.0), wide)), None);
    }

    #[test]
    fn test_triangle_degenerate() {
        let tri = Triangle::new(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Color::ONE,
            Color::ONE,
        );

        assert_eq!(tri.area(), 0.0);
        assert!(!tri.is_emitter());
        assert_eq!(tri.intersect(&ray([0.5, 0.0, 1.0], [0.0, 0.0, -1.0])), None);
    }

    #[test]
    fn test_triangle_geometry() {
        let tri = xy_triangle();
        assert_eq!(tri.area(), 0.5);
        assert_eq!(tri.normal(), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tri.tangent(), Vec3::new(1.0, 0.0, 0.0));

        let y2z = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Color::splat(0.5),
            Color::ONE,
        );
        assert_eq!(y2z.area(), 1.0);
        assert_eq!(y2z.normal(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(y2z.tangent(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_triangle_bound_is_padded() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Color::ZERO,
            Color::ZERO,
        );
        let bound = tri.bound();

        assert_eq!(bound.lower, Vec3::splat(-TOLERANCE));
        assert_eq!(bound.upper, Vec3::new(TOLERANCE, 2.0 + TOLERANCE, 1.0 + TOLERANCE));
    }

    #[test]
    fn test_triangle_material_is_clamped() {
        let tri = Triangle::new(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Color::new(2.0, -1.0, 0.5),
            Color::new(-3.0, 0.0, 40.0),
        );

        assert_eq!(tri.reflectivity(), Color::new(1.0, 0.0, 0.5));
        assert_eq!(tri.emissivity(), Color::new(0.0, 0.0, 40.0));
        assert!(tri.is_emitter());
    }

    #[test]
    fn test_sample_point_inside_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let triangles = [
            xy_triangle(),
            Triangle::new(
                Vec3::new(-10.0, 5.0, -10.0),
                Vec3::new(-9.0, 5.0, -10.0),
                Vec3::new(-10.0, 5.0, -9.0),
                Color::splat(0.5),
                Color::ONE,
            ),
            Triangle::new(
                Vec3::new(3.0, -2.0, 7.5),
                Vec3::new(-1.0, 4.0, 0.25),
                Vec3::new(0.5, 0.5, -6.0),
                Color::splat(0.5),
                Color::ZERO,
            ),
        ];

        for tri in &triangles {
            let bound = tri.bound();
            for _ in 0..1000 {
                let p = tri.sample_point(&mut rng);
                assert!(bound.contains_with_tolerance(p, 0.0), "{p} outside {bound:?}");
            }
        }
    }

    #[test]
    fn test_sampled_point_is_hit_along_normal() {
        let mut rng = StdRng::seed_from_u64(11);
        let tri = Triangle::new(
            Vec3::new(-10.0, 5.0, -10.0),
            Vec3::new(-9.0, 5.0, -10.0),
            Vec3::new(-10.0, 5.0, -9.0),
            Color::splat(0.5),
            Color::ONE,
        );

        for _ in 0..100 {
            let n = tri.normal();
            let p = tri.sample_point(&mut rng);
            let distance = tri.intersect(&Ray::new(p - n, n)).unwrap();
            assert!((distance - 1.0).abs() < 1e-9);
        }
    }
}
