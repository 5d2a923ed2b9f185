// Re-export glam for convenience
pub use glam::*;

// Lux math types
mod bound;
mod ray;
pub use bound::Bound;
pub use ray::Ray;

/// Vector type used throughout the renderer (double precision).
pub type Vec3 = DVec3;

/// Padding applied to bounds, and slack allowed when testing hit positions
/// against octree cells. Suits a scale of one unit per metre.
pub const TOLERANCE: f64 = 1.0 / 1024.0;

/// Determinant threshold below which a ray counts as parallel to a triangle.
pub const EPSILON: f64 = 1.0 / 1_048_576.0;

/// Componentwise clamp of `v` into `[lo, hi]`.
///
/// Unlike `DVec3::clamp` this accepts infinite bounds, so it can express
/// "non-negative" as `clamp(v, 0.0, f64::INFINITY)`.
#[inline]
pub fn clamp(v: Vec3, lo: f64, hi: f64) -> Vec3 {
    v.min(Vec3::splat(hi)).max(Vec3::splat(lo))
}

/// Exact zero test.
#[inline]
pub fn is_zero(v: Vec3) -> bool {
    v == Vec3::ZERO
}
