//! Renderable scene: triangles, their octree, emitters and background.

use lux_core::SceneDescription;
use lux_math::{clamp, Ray, Vec3};
use rand::RngCore;

use crate::{gen_f64, Color, Hit, SpatialIndex, Triangle, TriangleId};

/// Collection of triangles with an open sky around them.
///
/// Immutable after construction, so it can be shared freely between
/// render threads.
#[derive(Debug)]
pub struct Scene {
    sky_emission: Color,
    ground_reflection: Color,
    emitters: Vec<TriangleId>,
    index: SpatialIndex,
}

impl Scene {
    /// Build a scene.
    ///
    /// `sky_emission` is clamped to be non-negative; `ground_reflection` is
    /// clamped to [0, 1] and then lit by the sky. `eye_position` is only
    /// used to make the octree enclose the camera.
    pub fn new(
        sky_emission: Color,
        ground_reflection: Color,
        triangles: Vec<Triangle>,
        eye_position: Vec3,
    ) -> Self {
        let sky_emission = clamp(sky_emission, 0.0, f64::INFINITY);
        let ground_reflection = sky_emission * clamp(ground_reflection, 0.0, 1.0);

        let emitters: Vec<TriangleId> = triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_emitter())
            .map(|(id, _)| id)
            .collect();

        let index = SpatialIndex::new(eye_position, triangles);

        log::info!(
            "Scene built: {} triangles, {} emitters",
            index.triangles().len(),
            emitters.len()
        );

        Self {
            sky_emission,
            ground_reflection,
            emitters,
            index,
        }
    }

    /// Build a scene from a loaded description.
    pub fn from_description(description: &SceneDescription) -> Self {
        let triangles = description
            .triangles
            .iter()
            .map(|t| {
                let [v0, v1, v2] = t.vertices;
                Triangle::new(v0, v1, v2, t.reflectivity, t.emissivity)
            })
            .collect();

        Self::new(
            description.sky_emission,
            description.ground_reflection,
            triangles,
            description.camera.position,
        )
    }

    /// Nearest intersection along a ray, ignoring `last_hit`.
    pub fn intersect(&self, ray: &Ray, last_hit: Option<TriangleId>) -> Option<Hit> {
        self.index.intersect(ray, last_hit)
    }

    /// Pick an emitter uniformly, or `None` if the scene has none.
    pub fn sample_emitter(&self, rng: &mut dyn RngCore) -> Option<TriangleId> {
        if self.emitters.is_empty() {
            return None;
        }
        let i = (gen_f64(rng) * self.emitters.len() as f64) as usize;
        Some(self.emitters[i.min(self.emitters.len() - 1)])
    }

    pub fn count_emitters(&self) -> usize {
        self.emitters.len()
    }

    /// Radiance arriving along a ray that hit nothing.
    ///
    /// `back_direction` points back along the ray: a negative y means the
    /// ray was heading up, into the sky.
    pub fn default_emission(&self, back_direction: Vec3) -> Color {
        if back_direction.y < 0.0 {
            self.sky_emission
        } else {
            self.ground_reflection
        }
    }

    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        self.index.triangle(id)
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.index.triangles()
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }
}
