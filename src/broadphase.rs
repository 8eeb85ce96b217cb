//! Broadphase pair generation.
//!
//! `spec.md` §4.2 specifies a single naive O(N²) strategy with cheap,
//! shape-specific cull tests — no spatial hashing or sweep-and-prune tree,
//! unlike the teacher's `SweepAndPrune`. The `Broadphase` trait exists so a
//! smarter strategy could be dropped in later without touching `World`.

use glam::Vec3;

use crate::error::PhysicsError;
use crate::shape::Shape;

/// Minimal per-body data broadphase needs: position and shape. Lives here
/// rather than pulling in the whole `World` so broadphase can be tested in
/// isolation.
#[derive(Debug, Clone, Copy)]
pub struct BroadphaseBody {
    pub position: Vec3,
    pub shape: Shape,
}

/// A pair-generation strategy over the current body set.
pub trait Broadphase {
    /// Return the candidate colliding pairs as two equal-length index
    /// arrays, `pairs_i[k] > pairs_j[k]` for every `k` (spec.md's
    /// determinism convention — iterate bodies outer-to-inner, highest
    /// index first).
    fn collision_pairs(&self, bodies: &[BroadphaseBody]) -> Result<(Vec<usize>, Vec<usize>), PhysicsError>;
}

/// The O(N²) double loop, `spec.md` §4.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBroadphase;

impl NaiveBroadphase {
    pub fn new() -> Self {
        Self
    }
}

/// Cheap overlap test between two shapes at given positions. Returns `true`
/// when the pair should be handed to narrowphase.
fn may_collide(pos_a: Vec3, shape_a: Shape, pos_b: Vec3, shape_b: Shape) -> bool {
    match (shape_a, shape_b) {
        (Shape::Sphere { r: ra }, Shape::Sphere { r: rb }) => {
            let d = pos_b - pos_a;
            let r = ra + rb;
            d.x.abs() < r && d.y.abs() < r && d.z.abs() < r
        }
        (Shape::Sphere { r }, Shape::Plane { n }) | (Shape::Plane { n }, Shape::Sphere { r }) => {
            let (sphere_pos, plane_pos) = if matches!(shape_a, Shape::Sphere { .. }) {
                (pos_a, pos_b)
            } else {
                (pos_b, pos_a)
            };
            (sphere_pos - plane_pos).dot(n) < r
        }
        (Shape::Box { half_extents }, Shape::Plane { n }) | (Shape::Plane { n }, Shape::Box { half_extents }) => {
            let (box_pos, plane_pos) = if matches!(shape_a, Shape::Box { .. }) {
                (pos_a, pos_b)
            } else {
                (pos_b, pos_a)
            };
            (box_pos - plane_pos).dot(n) < half_extents.length()
        }
        // Any other pair (box/box, box/sphere, plane/plane) has no
        // narrowphase handler; broadphase still reports it as a candidate
        // using the bounding-sphere fallback so `detect` can raise
        // `UnsupportedShape` for visibility rather than silently dropping it.
        _ => {
            let d = pos_b - pos_a;
            let r = shape_a.bounding_sphere_radius() + shape_b.bounding_sphere_radius();
            r.is_finite() && d.length_squared() < r * r
        }
    }
}

impl Broadphase for NaiveBroadphase {
    fn collision_pairs(&self, bodies: &[BroadphaseBody]) -> Result<(Vec<usize>, Vec<usize>), PhysicsError> {
        let n = bodies.len();
        let mut pairs_i = Vec::new();
        let mut pairs_j = Vec::new();

        for i in 1..n {
            for j in 0..i {
                let a = bodies[i];
                let b = bodies[j];
                if may_collide(a.position, a.shape, b.position, b.shape) {
                    pairs_i.push(i);
                    pairs_j.push(j);
                }
            }
        }

        Ok((pairs_i, pairs_j))
    }
}
