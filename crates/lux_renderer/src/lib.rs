//! Lux Renderer - CPU Monte-Carlo path tracing
//!
//! Renders triangle scenes lit by emitting triangles and a sky/ground
//! background. Geometry is indexed by an octree, paths are traced with
//! emitter sampling and Russian roulette, and the accumulated image is
//! tone mapped to 8-bit output.

mod triangle;
mod surface_point;
mod spatial_index;
mod scene;
mod raytracer;
mod camera;
mod image_buffer;
mod tile;
mod renderer;

pub use triangle::{Triangle, TriangleId};
pub use surface_point::SurfacePoint;
pub use spatial_index::{Hit, IndexStats, Node, SpatialIndex, MAX_ITEMS, MAX_LEVELS};
pub use scene::Scene;
pub use raytracer::{RayTracer, MAX_BOUNCES};
pub use camera::Camera;
pub use image_buffer::{Image, ImageError, ImageResult, ToneMapper, PPM_GENERATOR_ID};
pub use tile::{generate_tiles, render_tile, tile_rng, Tile, TileResult, DEFAULT_TILE_SIZE};
pub use renderer::{render, render_parallel, render_with, render_with_config, RenderConfig};

/// Re-export math types from lux_math
pub use lux_math::{Bound, Ray, Vec3};

use rand::{Rng, RngCore};

/// RGB radiance or reflectivity, one `f64` per channel.
pub type Color = Vec3;

/// Uniform draw in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen()
}
