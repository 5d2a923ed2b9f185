//! Renderer-agnostic scene description.
//!
//! These are plain data types mirroring what a model file contains. Values
//! are stored exactly as read; the renderer clamps them when it builds its
//! own scene.

use lux_math::Vec3;
use serde::{Deserialize, Serialize};

/// Camera placement and lens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraDescription {
    /// Eye position
    pub position: Vec3,
    /// View direction (need not be unit length)
    pub direction: Vec3,
    /// Horizontal field of view in degrees
    pub view_angle: f64,
}

/// A single triangle with its surface properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleDescription {
    pub vertices: [Vec3; 3],
    /// Diffuse reflectivity per channel, expected in [0, 1]
    pub reflectivity: Vec3,
    /// Emitted radiance per channel, expected >= 0
    #[serde(default)]
    pub emissivity: Vec3,
}

/// Everything needed to render an image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Number of progressive passes
    pub iterations: u32,
    pub width: u32,
    pub height: u32,
    pub camera: CameraDescription,
    /// Radiance arriving from above the horizon
    pub sky_emission: Vec3,
    /// Ground reflectivity, lit by the sky
    pub ground_reflection: Vec3,
    #[serde(default)]
    pub triangles: Vec<TriangleDescription>,
}

impl SceneDescription {
    /// A single grey triangle under an open sky.
    pub fn example() -> Self {
        Self {
            iterations: 10,
            width: 200,
            height: 150,
            camera: CameraDescription {
                position: Vec3::new(0.0, 0.75, -2.0),
                direction: Vec3::new(0.0, 0.0, 1.0),
                view_angle: 45.0,
            },
            sky_emission: Vec3::new(3626.0, 5572.0, 5802.0),
            ground_reflection: Vec3::new(0.1, 0.09, 0.07),
            triangles: vec![TriangleDescription {
                vertices: [
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                ],
                reflectivity: Vec3::splat(0.7),
                emissivity: Vec3::ZERO,
            }],
        }
    }

    /// Number of triangles with any emission.
    pub fn emitter_count(&self) -> usize {
        self.triangles
            .iter()
            .filter(|t| t.emissivity != Vec3::ZERO)
            .count()
    }
}
