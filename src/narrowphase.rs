//! Narrowphase contact generation.
//!
//! Three handlers, exactly as `spec.md` §4.3 specifies: sphere–sphere,
//! sphere–plane, box–plane. No general convex solver (GJK/EPA/SAT) — the
//! source corpus this crate follows only ever narrowphases these three
//! shape pairs, and a general convex pair is explicitly out of scope.

use glam::{Quat, Vec3};

use crate::contact::Contact;
use crate::error::PhysicsError;
use crate::shape::Shape;

/// Box/plane contacts are capped at this many points per pair.
const MAX_BOX_PLANE_CONTACTS: usize = 4;

/// A single body's pose, as narrowphase needs it.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Project `point` onto the plane through `plane_pos` with normal
/// `plane_normal`, then compute the penetration of a candidate contact
/// point offset by `arm` from `point` along `n = -plane_normal`.
///
/// Returns `(q, xp)`: the signed penetration (`q < 0` on contact) and the
/// projected point. Shared by sphere–plane and box–plane, per `spec.md`
/// §4.3's "identically to sphere–plane with rs replaced by the rotated
/// corner."
fn plane_penetration(plane_pos: Vec3, plane_normal: Vec3, point: Vec3, arm: Vec3) -> (f32, Vec3) {
    let n = -plane_normal;
    let xp = point - (point - plane_pos).dot(plane_normal) * plane_normal;
    let qvec = xp - point - arm;
    (qvec.dot(n), xp)
}

/// Sphere–sphere contact test.
pub fn sphere_sphere(i: usize, pose_i: Pose, r_i: f32, j: usize, pose_j: Pose, r_j: f32) -> Option<Contact> {
    let delta = pose_j.position - pose_i.position;
    let dist = delta.length();
    let n = if dist > 1e-8 {
        delta / dist
    } else {
        tracing::debug!("sphere-sphere contact with coincident centers, defaulting normal to +Y");
        Vec3::Y
    };

    let arm_i = n * r_i;
    let arm_j = -n * r_j;
    let qvec = (pose_j.position + arm_j) - (pose_i.position + arm_i);
    let q = qvec.dot(n);

    if q < 0.0 {
        Some(Contact {
            i,
            j: Some(j),
            normal: n,
            r_i: arm_i,
            r_j: arm_j,
            penetration: q,
            row_angular_i: false,
            row_angular_j: false,
        })
    } else {
        None
    }
}

/// Sphere–plane contact test. `sphere` is the sphere's body index, `plane`
/// the plane's.
pub fn sphere_plane(
    sphere: usize,
    sphere_pose: Pose,
    radius: f32,
    plane: usize,
    plane_pose: Pose,
    plane_normal: Vec3,
) -> Option<Contact> {
    let n = -plane_normal;
    let rs = n * radius;
    let (q, _xp) = plane_penetration(plane_pose.position, plane_normal, sphere_pose.position, rs);

    if q < 0.0 {
        Some(Contact {
            i: sphere,
            j: Some(plane),
            normal: n,
            r_i: rs,
            r_j: Vec3::ZERO,
            penetration: q,
            row_angular_i: false,
            row_angular_j: false,
        })
    } else {
        None
    }
}

/// Box–plane contact test, up to [`MAX_BOX_PLANE_CONTACTS`] points.
pub fn box_plane(
    b: usize,
    box_pose: Pose,
    half_extents: Vec3,
    p: usize,
    plane_pose: Pose,
    plane_normal: Vec3,
) -> Vec<Contact> {
    let n = -plane_normal;
    let Vec3 { x: hx, y: hy, z: hz } = half_extents;

    let corners = [
        Vec3::new(hx, hy, hz),
        Vec3::new(hx, hy, -hz),
        Vec3::new(hx, -hy, hz),
        Vec3::new(hx, -hy, -hz),
        Vec3::new(-hx, hy, hz),
        Vec3::new(-hx, hy, -hz),
        Vec3::new(-hx, -hy, hz),
        Vec3::new(-hx, -hy, -hz),
    ];

    let mut candidates: Vec<Contact> = Vec::with_capacity(8);
    for local_corner in corners {
        let arm = box_pose.orientation * local_corner;
        let (q, _xp) = plane_penetration(plane_pose.position, plane_normal, box_pose.position, arm);
        if q < 0.0 {
            candidates.push(Contact {
                i: b,
                j: Some(p),
                normal: n,
                r_i: arm,
                r_j: Vec3::ZERO,
                penetration: q,
                row_angular_i: true,
                row_angular_j: false,
            });
        }
    }

    if candidates.len() > MAX_BOX_PLANE_CONTACTS {
        tracing::debug!(
            found = candidates.len(),
            cap = MAX_BOX_PLANE_CONTACTS,
            "box/plane contact count capped"
        );
        candidates.sort_by(|a, b| a.penetration.partial_cmp(&b.penetration).unwrap());
        candidates.truncate(MAX_BOX_PLANE_CONTACTS);
    }

    candidates
}

/// World-frame diagonal inertia approximation for a rotated box: the
/// componentwise absolute value of the local inertia rotated by `q`.
///
/// This is only dimensionally sound for near-axis-aligned orientations —
/// preserved as specified (`spec.md` §9) rather than replaced with a full
/// world-frame inertia tensor.
pub fn rotated_box_inertia(local_inertia: Vec3, q: Quat) -> Vec3 {
    (q * local_inertia).abs()
}

/// Dispatch a shape pair to the appropriate handler.
///
/// `a`/`b` are the candidate pair as produced by broadphase, in no
/// particular shape-role order; the returned contacts' `i`/`j` fields are
/// assigned per the canonical role each handler expects (e.g. the sphere is
/// always `i` in a sphere/plane contact), which need not match the order
/// `a`/`b` were passed in.
pub fn detect(
    a: usize,
    shape_a: Shape,
    pose_a: Pose,
    b: usize,
    shape_b: Shape,
    pose_b: Pose,
) -> Result<Vec<Contact>, PhysicsError> {
    match (shape_a, shape_b) {
        (Shape::Sphere { r: ra }, Shape::Sphere { r: rb }) => {
            Ok(sphere_sphere(a, pose_a, ra, b, pose_b, rb).into_iter().collect())
        }
        (Shape::Sphere { r }, Shape::Plane { n }) => {
            Ok(sphere_plane(a, pose_a, r, b, pose_b, n).into_iter().collect())
        }
        (Shape::Plane { n }, Shape::Sphere { r }) => {
            Ok(sphere_plane(b, pose_b, r, a, pose_a, n).into_iter().collect())
        }
        (Shape::Box { half_extents }, Shape::Plane { n }) => {
            Ok(box_plane(a, pose_a, half_extents, b, pose_b, n))
        }
        (Shape::Plane { n }, Shape::Box { half_extents }) => {
            Ok(box_plane(b, pose_b, half_extents, a, pose_a, n))
        }
        _ => {
            tracing::debug!(?shape_a, ?shape_b, "no narrowphase handler for this shape pair");
            Err(PhysicsError::UnsupportedShape)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(p: Vec3) -> Pose {
        Pose {
            position: p,
            orientation: Quat::IDENTITY,
        }
    }

    #[test]
    fn sphere_sphere_overlap_detected() {
        let c = sphere_sphere(0, pose(Vec3::ZERO), 1.0, 1, pose(Vec3::new(1.5, 0.0, 0.0)), 1.0);
        assert!(c.is_some());
        let c = c.unwrap();
        assert!(c.penetration < 0.0);
        assert!((c.normal - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn sphere_sphere_separated_is_none() {
        let c = sphere_sphere(0, pose(Vec3::ZERO), 1.0, 1, pose(Vec3::new(3.0, 0.0, 0.0)), 1.0);
        assert!(c.is_none());
    }

    #[test]
    fn sphere_plane_penetrating() {
        let c = sphere_plane(0, pose(Vec3::new(0.0, 0.5, 0.0)), 1.0, 1, pose(Vec3::ZERO), Vec3::Y);
        assert!(c.is_some());
        assert!(c.unwrap().penetration < 0.0);
    }

    #[test]
    fn sphere_plane_resting_exactly_is_not_penetrating() {
        let c = sphere_plane(0, pose(Vec3::new(0.0, 1.0, 0.0)), 1.0, 1, pose(Vec3::ZERO), Vec3::Y);
        assert!(c.is_none());
    }

    #[test]
    fn box_plane_penetrating_corner_count() {
        let contacts = box_plane(
            0,
            pose(Vec3::new(0.0, 0.4, 0.0)),
            Vec3::splat(0.5),
            1,
            pose(Vec3::ZERO),
            Vec3::Y,
        );
        assert!(!contacts.is_empty());
        assert!(contacts.len() <= MAX_BOX_PLANE_CONTACTS);
        for c in &contacts {
            assert!(c.penetration < 0.0);
            assert!(c.row_angular_i);
        }
    }

    #[test]
    fn box_plane_above_surface_has_no_contacts() {
        let contacts = box_plane(
            0,
            pose(Vec3::new(0.0, 5.0, 0.0)),
            Vec3::splat(0.5),
            1,
            pose(Vec3::ZERO),
            Vec3::Y,
        );
        assert!(contacts.is_empty());
    }

    #[test]
    fn detect_dispatches_by_shape_pair() {
        let contacts = detect(
            0,
            Shape::sphere(1.0),
            pose(Vec3::new(0.0, 0.5, 0.0)),
            1,
            Shape::plane(Vec3::Y),
            pose(Vec3::ZERO),
        )
        .unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].i, 0);
        assert_eq!(contacts[0].j, Some(1));
    }

    #[test]
    fn detect_unsupported_pair_errors() {
        let result = detect(
            0,
            Shape::boxed(Vec3::splat(1.0)),
            pose(Vec3::ZERO),
            1,
            Shape::boxed(Vec3::splat(1.0)),
            pose(Vec3::new(5.0, 0.0, 0.0)),
        );
        assert!(matches!(result, Err(PhysicsError::UnsupportedShape)));
    }
}
