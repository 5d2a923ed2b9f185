use crate::Vec3;

/// Axis-aligned bounding box used by the octree.
///
/// Stored as two corners with `lower <= upper` componentwise. Triangle
/// bounds are always padded by `TOLERANCE` so that floating-point slack
/// never causes a missed overlap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bound {
    pub lower: Vec3,
    pub upper: Vec3,
}

impl Bound {
    /// Create a bound from its corners.
    pub fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Create a degenerate bound holding a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { lower: p, upper: p }
    }

    /// Create the tightest bound holding all the given points.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut lower = Vec3::INFINITY;
        let mut upper = Vec3::NEG_INFINITY;
        for &p in points {
            lower = lower.min(p);
            upper = upper.max(p);
        }
        Self { lower, upper }
    }

    /// Create a bound that surrounds two other bounds.
    pub fn surrounding(a: &Bound, b: &Bound) -> Self {
        Self {
            lower: a.lower.min(b.lower),
            upper: a.upper.max(b.upper),
        }
    }

    /// Grow the bound outward by `delta` in every axis.
    pub fn padded(&self, delta: f64) -> Self {
        Self {
            lower: self.lower - Vec3::splat(delta),
            upper: self.upper + Vec3::splat(delta),
        }
    }

    /// Size of the bound along each axis.
    pub fn extent(&self) -> Vec3 {
        self.upper - self.lower
    }

    /// Center point of the bound.
    pub fn midpoint(&self) -> Vec3 {
        (self.lower + self.upper) * 0.5
    }

    /// Make a cube sharing this bound's lower corner, with every edge as
    /// long as the longest one. The upper corner never shrinks below the
    /// original, which guards against rounding in `lower + size`.
    pub fn to_cube(&self) -> Self {
        let size = self.extent().max_element();
        let upper = (self.lower + Vec3::splat(size)).max(self.upper);
        Self {
            lower: self.lower,
            upper,
        }
    }

    /// Octree overlap test: `other` touches this bound on every axis.
    ///
    /// Closed at this bound's lower face and open at its upper face, so an
    /// item lying exactly on a split plane goes to the upper cell.
    pub fn overlaps(&self, other: &Bound) -> bool {
        (0..3).all(|b| other.upper[b] >= self.lower[b] && other.lower[b] < self.upper[b])
    }

    /// Returns true if `p` lies inside the bound, allowing `tolerance` of
    /// slack on every face.
    pub fn contains_with_tolerance(&self, p: Vec3, tolerance: f64) -> bool {
        (0..3).all(|b| self.lower[b] - p[b] <= tolerance && p[b] - self.upper[b] <= tolerance)
    }

    /// Returns true if `other` lies entirely inside this bound.
    pub fn encloses(&self, other: &Bound) -> bool {
        self.lower.cmple(other.lower).all() && other.upper.cmple(self.upper).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_from_points() {
        let b = Bound::from_points(&[
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(-1.0, 1.0, 3.0),
        ]);

        assert_eq!(b.lower, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(b.upper, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_bound_padded() {
        let b = Bound::from_point(Vec3::ZERO).padded(0.5);
        assert_eq!(b.lower, Vec3::splat(-0.5));
        assert_eq!(b.upper, Vec3::splat(0.5));
    }

    #[test]
    fn test_bound_to_cube() {
        let b = Bound::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 2.0)).to_cube();
        assert_eq!(b.extent(), Vec3::splat(4.0));
        assert_eq!(b.lower, Vec3::ZERO);
    }

    #[test]
    fn test_bound_overlaps_half_open() {
        let cell = Bound::new(Vec3::ZERO, Vec3::ONE);

        // Touching the lower face counts
        let below = Bound::new(Vec3::splat(-1.0), Vec3::ZERO);
        assert!(cell.overlaps(&below));

        // Touching the upper face does not
        let above = Bound::new(Vec3::ONE, Vec3::splat(2.0));
        assert!(!cell.overlaps(&above));

        let inside = Bound::new(Vec3::splat(0.25), Vec3::splat(0.75));
        assert!(cell.overlaps(&inside));
    }

    #[test]
    fn test_bound_contains_with_tolerance() {
        let cell = Bound::new(Vec3::ZERO, Vec3::ONE);
        assert!(cell.contains_with_tolerance(Vec3::new(1.0005, 0.5, 0.5), 0.001));
        assert!(!cell.contains_with_tolerance(Vec3::new(1.002, 0.5, 0.5), 0.001));
        assert!(cell.contains_with_tolerance(Vec3::new(-0.001, 0.0, 1.0), 0.001));
    }

    #[test]
    fn test_bound_surrounding_and_encloses() {
        let a = Bound::new(Vec3::ZERO, Vec3::splat(5.0));
        let b = Bound::new(Vec3::splat(3.0), Vec3::splat(10.0));
        let s = Bound::surrounding(&a, &b);

        assert_eq!(s.lower, Vec3::ZERO);
        assert_eq!(s.upper, Vec3::splat(10.0));
        assert!(s.encloses(&a));
        assert!(s.encloses(&b));
        assert!(!a.encloses(&b));
    }

    #[test]
    fn test_bound_midpoint() {
        let b = Bound::new(Vec3::ZERO, Vec3::new(10.0, 4.0, 2.0));
        assert_eq!(b.midpoint(), Vec3::new(5.0, 2.0, 1.0));
    }
}
