//! Collision shape catalogue: `Sphere`, `Plane`, `Box`.
//!
//! Each variant carries exactly the data narrowphase and inertia
//! computation need. Adding a new variant should also extend
//! `calculate_local_inertia` and `bounding_sphere_radius`; there is no
//! separate capability trait (`spec.md` leaves the polymorphism style open,
//! and the tagged-enum-with-inherent-methods form is what the teacher's
//! `ColliderShape` already uses).

use glam::Vec3;

/// A collision shape, tagged by variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A sphere of radius `r`.
    Sphere { r: f32 },
    /// An infinite plane with unit normal `n`.
    Plane { n: Vec3 },
    /// An axis-aligned box with half-extents `half_extents`.
    Box { half_extents: Vec3 },
}

impl Shape {
    /// Convenience constructor matching `spec.md`'s external interface.
    pub fn sphere(r: f32) -> Self {
        Shape::Sphere { r }
    }

    /// Convenience constructor. `n` is normalized on construction.
    pub fn plane(n: Vec3) -> Self {
        Shape::Plane {
            n: n.normalize_or_zero(),
        }
    }

    /// Convenience constructor.
    pub fn boxed(half_extents: Vec3) -> Self {
        Shape::Box { half_extents }
    }

    /// Bounding sphere radius, used by the broadphase cull tests.
    ///
    /// `Plane` is conceptually unbounded; the engine never queries its
    /// bounding radius (broadphase has a dedicated sphere/plane and
    /// box/plane test that never calls this), so it returns `f32::INFINITY`
    /// rather than a meaningless finite value.
    pub fn bounding_sphere_radius(&self) -> f32 {
        match self {
            Shape::Sphere { r } => *r,
            Shape::Plane { .. } => f32::INFINITY,
            Shape::Box { half_extents } => half_extents.length(),
        }
    }

    /// Diagonal local inertia tensor for a body of the given mass.
    ///
    /// Planes are static and contribute zero inertia. `mass` is expected to
    /// be positive for dynamic shapes; a non-positive mass yields zero
    /// inertia, matching fixed-body semantics.
    ///
    /// The box formula uses half-extents directly (`Ix = m/12 * (hy^2 +
    /// hz^2)`), matching `spec.md` §4.1 rather than the textbook full-width
    /// form — preserved as specified rather than "corrected."
    pub fn calculate_local_inertia(&self, mass: f32) -> Vec3 {
        if mass <= 0.0 {
            return Vec3::ZERO;
        }
        match self {
            Shape::Sphere { r } => Vec3::splat(0.4 * mass * r * r),
            Shape::Plane { .. } => Vec3::ZERO,
            Shape::Box { half_extents } => {
                let Vec3 { x: hx, y: hy, z: hz } = *half_extents;
                Vec3::new(
                    (mass / 12.0) * (hy * hy + hz * hz),
                    (mass / 12.0) * (hx * hx + hz * hz),
                    (mass / 12.0) * (hx * hx + hy * hy),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_inertia() {
        let s = Shape::sphere(2.0);
        let i = s.calculate_local_inertia(5.0);
        let expected = 0.4 * 5.0 * 4.0;
        assert!((i.x - expected).abs() < 1e-5);
        assert!((i.y - expected).abs() < 1e-5);
        assert!((i.z - expected).abs() < 1e-5);
    }

    #[test]
    fn plane_inertia_is_zero() {
        let p = Shape::plane(Vec3::Y);
        assert_eq!(p.calculate_local_inertia(10.0), Vec3::ZERO);
    }

    #[test]
    fn box_inertia_matches_formula() {
        let half_extents = Vec3::new(1.0, 2.0, 3.0);
        let b = Shape::boxed(half_extents);
        let i = b.calculate_local_inertia(6.0);
        // Ix = (1/12) m (hy^2 + hz^2), using half-extents per spec.
        let (hx, hy, hz) = (1.0, 2.0, 3.0);
        let ix = (6.0 / 12.0) * (hy * hy + hz * hz);
        let iy = (6.0 / 12.0) * (hx * hx + hz * hz);
        let iz = (6.0 / 12.0) * (hx * hx + hy * hy);
        assert!((i.x - ix).abs() < 1e-4);
        assert!((i.y - iy).abs() < 1e-4);
        assert!((i.z - iz).abs() < 1e-4);
    }

    #[test]
    fn plane_normalizes_normal() {
        let p = Shape::plane(Vec3::new(0.0, 5.0, 0.0));
        match p {
            Shape::Plane { n } => assert!((n - Vec3::Y).length() < 1e-6),
            _ => panic!("expected plane"),
        }
    }

    #[test]
    fn fixed_mass_gives_zero_inertia() {
        let s = Shape::sphere(1.0);
        assert_eq!(s.calculate_local_inertia(0.0), Vec3::ZERO);
        assert_eq!(s.calculate_local_inertia(-1.0), Vec3::ZERO);
    }
}
