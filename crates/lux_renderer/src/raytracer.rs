//! Path tracing integrator with emitter sampling.
//!
//! A single chain of ray steps advances from the eye into the scene, with
//! one emitter sample (next event estimation) at each surface hit. Paths
//! end by Russian roulette in [`SurfacePoint::next_direction`].

use lux_math::Ray;
use rand::RngCore;

use crate::{Color, Scene, SurfacePoint, TriangleId};

/// Hard cap on path length.
///
/// Roulette only bounds the expected length; a closed scene with
/// reflectivity 1 everywhere would otherwise never terminate.
pub const MAX_BOUNCES: usize = 1024;

/// Computes eyeward radiance for rays into a scene.
#[derive(Clone, Copy)]
pub struct RayTracer<'a> {
    scene: &'a Scene,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Radiance arriving back along `ray`.
    ///
    /// `last_hit` is the triangle the ray leaves from, or `None` for a ray
    /// from the eye. Emission of the surfaces a path hits is only counted
    /// for eye rays; after that, light from emitters arrives through
    /// explicit emitter sampling, so it is never counted twice.
    pub fn radiance(&self, ray: &Ray, rng: &mut dyn RngCore, last_hit: Option<TriangleId>) -> Color {
        let mut ray = *ray;
        let mut last_hit = last_hit;
        let mut throughput = Color::ONE;
        let mut radiance = Color::ZERO;

        for _ in 0..MAX_BOUNCES {
            let Some(hit) = self.scene.intersect(&ray, last_hit) else {
                radiance += throughput * self.scene.default_emission(-ray.direction);
                break;
            };

            let surface = SurfacePoint::new(hit.triangle, self.scene.triangle(hit.triangle), hit.position);

            if last_hit.is_none() {
                radiance += throughput * surface.emission(ray.origin, -ray.direction, false);
            }

            radiance += throughput * self.sample_emitters(&ray, &surface, rng);

            let Some((direction, color)) = surface.next_direction(rng, -ray.direction) else {
                break;
            };

            throughput *= color;
            ray = Ray::new(surface.position(), direction);
            last_hit = Some(surface.id());
        }

        radiance
    }

    /// Radiance reflected toward the viewer from one emitter sample.
    fn sample_emitters(&self, ray: &Ray, surface: &SurfacePoint, rng: &mut dyn RngCore) -> Color {
        let Some(emitter_id) = self.scene.sample_emitter(rng) else {
            return Color::ZERO;
        };
        let emitter = self.scene.triangle(emitter_id);

        let position = emitter.sample_point(rng);
        let direction = (position - surface.position()).normalize_or_zero();

        // Is the sample point visible from the surface?
        let shadow_ray = Ray::new(surface.position(), direction);
        if let Some(hit) = self.scene.intersect(&shadow_ray, Some(surface.id())) {
            if hit.triangle != emitter_id {
                return Color::ZERO;
            }
        }

        let emission_in = SurfacePoint::new(emitter_id, emitter, position).emission(
            surface.position(),
            -direction,
            true,
        );

        // One sample stands in for the sum over all emitters
        surface.reflection(
            direction,
            emission_in * self.scene.count_emitters() as f64,
            -ray.direction,
        )
    }
}
