//! Octree acceleration structure.
//!
//! Axis-aligned and cubical. Sub-cells are numbered by which half of the
//! parent they take on each axis (bit 0 = x, bit 1 = y, bit 2 = z):
//!
//! ```text
//!            110---111
//!            /|    /|
//!         010---011 |
//!    y z   | 100-|-101
//!    |/    |/    | /
//!    .-x  000---001
//! ```
//!
//! Each node stores its own bound. Building and tracing use absolute rather
//! than incremental calculations, and fixed tolerances: item bounds are
//! padded, and leaf hits are accepted slightly outside the cell. Depth is
//! cut off at an absolute cell size, which handles coincident items.

use lux_math::{Bound, Ray, Vec3, TOLERANCE};

use crate::{Triangle, TriangleId};

/// Maximum tree depth. Enough for a scene holding both the sun and the
/// earth down to centimetre cells.
pub const MAX_LEVELS: usize = 44;

/// Maximum items in a leaf before it is split.
pub const MAX_ITEMS: usize = 8;

/// Nearest intersection found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub triangle: TriangleId,
    pub position: Vec3,
    /// Distance along the (unit) ray direction
    pub distance: f64,
}

/// Octree node - either a branch with eight octants or a leaf with items.
#[derive(Debug)]
pub enum Node {
    /// Internal node; empty octants are `None`.
    Branch {
        bound: Bound,
        children: [Option<Box<Node>>; 8],
    },
    /// Leaf node with the items overlapping its cell.
    Leaf {
        bound: Bound,
        items: Vec<TriangleId>,
    },
}

/// Counts gathered over a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub branches: usize,
    pub leaves: usize,
    pub max_depth: usize,
    /// Sum of leaf item counts (items shared between leaves count once per leaf)
    pub item_refs: usize,
}

/// Octree over a scene's triangles. Owns the triangles; nodes refer to
/// them by index. Read-only once built.
#[derive(Debug)]
pub struct SpatialIndex {
    triangles: Vec<Triangle>,
    root: Node,
}

impl SpatialIndex {
    /// Build the octree.
    ///
    /// The root cell is a cube enclosing every triangle and the eye
    /// position; keeping the eye inside means primary rays always start in
    /// a cell.
    pub fn new(eye_position: Vec3, triangles: Vec<Triangle>) -> Self {
        let rect_bound = triangles
            .iter()
            .fold(Bound::from_point(eye_position), |acc, t| {
                Bound::surrounding(&acc, &t.bound())
            });

        let items: Vec<TriangleId> = (0..triangles.len()).collect();
        let root = Node::build(&triangles, rect_bound.to_cube(), items, 0);

        let index = Self { triangles, root };
        let stats = index.stats();
        log::debug!(
            "Built octree over {} triangles: {} branches, {} leaves, depth {}, {} leaf refs",
            index.triangles.len(),
            stats.branches,
            stats.leaves,
            stats.max_depth,
            stats.item_refs
        );
        index
    }

    /// Find the nearest intersection of a ray with the indexed triangles,
    /// ignoring `last_hit` (the surface the ray leaves from).
    pub fn intersect(&self, ray: &Ray, last_hit: Option<TriangleId>) -> Option<Hit> {
        self.root.intersect(&self.triangles, ray, last_hit, ray.origin)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id]
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Root cell bound.
    pub fn bound(&self) -> Bound {
        self.root.bound()
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats::default();
        self.root.gather_stats(0, &mut stats);
        stats
    }
}

impl Node {
    pub fn bound(&self) -> Bound {
        match self {
            Node::Branch { bound, .. } | Node::Leaf { bound, .. } => *bound,
        }
    }

    /// Recursive construction.
    fn build(triangles: &[Triangle], bound: Bound, items: Vec<TriangleId>, level: usize) -> Self {
        if items.len() <= MAX_ITEMS || level >= MAX_LEVELS - 1 {
            return Node::Leaf { bound, items };
        }

        let mid = bound.midpoint();

        // Octants receiving the parent's entire item set
        let mut whole_copies = 0;

        let children = std::array::from_fn(|s| {
            let mut sub_bound = bound;
            for b in 0..3 {
                if (s >> b) & 1 == 1 {
                    sub_bound.lower[b] = mid[b];
                } else {
                    sub_bound.upper[b] = mid[b];
                }
            }

            let sub_items: Vec<TriangleId> = items
                .iter()
                .copied()
                .filter(|&id| sub_bound.overlaps(&triangles[id].bound()))
                .collect();

            // Curtail degenerate subdivision: two or more octants copying
            // the whole parent, or cells below millimetre size, end the
            // recursion at the next level. One whole copy is allowed (a
            // model including the sun needs it).
            if sub_items.len() == items.len() {
                whole_copies += 1;
            }
            let cell_size = sub_bound.upper.x - sub_bound.lower.x;
            let sub_level = if whole_copies > 1 || cell_size < TOLERANCE * 4.0 {
                MAX_LEVELS
            } else {
                level + 1
            };

            if sub_items.is_empty() {
                None
            } else {
                Some(Box::new(Node::build(triangles, sub_bound, sub_items, sub_level)))
            }
        });

        Node::Branch { bound, children }
    }

    fn intersect(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        last_hit: Option<TriangleId>,
        cell_position: Vec3,
    ) -> Option<Hit> {
        match self {
            Node::Branch { bound, children } => {
                intersect_branch(bound, children, triangles, ray, last_hit, cell_position)
            }
            Node::Leaf { bound, items } => intersect_leaf(bound, items, triangles, ray, last_hit),
        }
    }

    fn gather_stats(&self, depth: usize, stats: &mut IndexStats) {
        stats.max_depth = stats.max_depth.max(depth);
        match self {
            Node::Branch { children, .. } => {
                stats.branches += 1;
                for child in children.iter().flatten() {
                    child.gather_stats(depth + 1, stats);
                }
            }
            Node::Leaf { items, .. } => {
                stats.leaves += 1;
                stats.item_refs += items.len();
            }
        }
    }
}

/// Walk the octants the ray passes through, nearest first, and return the
/// first hit found. Hits are ordered by the walk itself: a leaf only
/// reports hits inside its own cell.
fn intersect_branch(
    bound: &Bound,
    children: &[Option<Box<Node>>; 8],
    triangles: &[Triangle],
    ray: &Ray,
    last_hit: Option<TriangleId>,
    mut cell_position: Vec3,
) -> Option<Hit> {
    let mid = bound.midpoint();

    // Octant holding the walk point
    let mut sub_cell = (0..3).fold(0usize, |acc, i| {
        acc | (usize::from(cell_position[i] >= mid[i]) << i)
    });

    loop {
        if let Some(child) = &children[sub_cell] {
            if let Some(hit) = child.intersect(triangles, ray, last_hit, cell_position) {
                return Some(hit);
            }
        }

        // Find which face of the octant ahead is crossed first
        let mut axis = 2;
        let mut step = [f64::INFINITY; 3];
        for i in (0..3).rev() {
            let high = (sub_cell >> i) & 1 == 1;
            let negative = ray.direction[i] < 0.0;
            let face = if negative ^ high {
                if high {
                    bound.upper[i]
                } else {
                    bound.lower[i]
                }
            } else {
                mid[i]
            };
            if ray.direction[i] != 0.0 {
                step[i] = (face - ray.origin[i]) / ray.direction[i];
            }
            if step[i] < step[axis] {
                axis = i;
            }
        }

        // Ray never crosses another face
        if !step[axis].is_finite() {
            return None;
        }

        // Leaving the branch: heading up from a high octant, or down from a low one
        let high = (sub_cell >> axis) & 1 == 1;
        if high ^ (ray.direction[axis] < 0.0) {
            return None;
        }

        // Move onto the face of the next octant
        cell_position = ray.at(step[axis]);
        sub_cell ^= 1 << axis;
    }
}

/// Nearest hit among a leaf's items, restricted to the leaf's cell.
fn intersect_leaf(
    bound: &Bound,
    items: &[TriangleId],
    triangles: &[Triangle],
    ray: &Ray,
    last_hit: Option<TriangleId>,
) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;

    for &id in items {
        // Avoid spurious intersection with the surface just left
        if Some(id) == last_hit {
            continue;
        }

        // A hit at the ray origin is no hit
        let Some(distance) = triangles[id].intersect(ray).filter(|&d| d > 0.0) else {
            continue;
        };
        if nearest.map_or(false, |n| distance >= n.distance) {
            continue;
        }

        let position = ray.at(distance);
        if bound.contains_with_tolerance(position, TOLERANCE) {
            nearest = Some(Hit {
                triangle: id,
                position,
                distance,
            });
        }
    }

    nearest
}
