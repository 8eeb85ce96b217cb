//! Rigid body record.
//!
//! A [`RigidBody`] is created detached — all of its state lives in the
//! struct itself. Once passed to [`crate::world::World::add`], its state is
//! copied into the world's Structure-of-Arrays and the body is assigned an
//! index. Rust's ownership rules don't allow the same value to alias both a
//! standalone struct and a slot in the world's arrays, so post-attach access
//! goes through index-keyed methods on [`crate::world::World`] (its "AoS
//! view" accessors) rather than literally through the original `RigidBody`
//! value — see `DESIGN.md` for this open-question resolution. The
//! pre-attach getters/setters below remain usable on a `RigidBody` that was
//! never added to a world.

use glam::{Quat, Vec3};

use crate::shape::Shape;

/// A rigid body's state before (or independent of) being attached to a world.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub(crate) id: Option<usize>,
    pub(crate) shape: Shape,
    pub(crate) mass: f32,
    pub(crate) position: Vec3,
    pub(crate) orientation: Quat,
    pub(crate) linear_velocity: Vec3,
    pub(crate) angular_velocity: Vec3,
    pub(crate) force: Vec3,
    pub(crate) torque: Vec3,
}

impl RigidBody {
    /// Construct a new, detached rigid body at the origin with identity
    /// orientation and zero velocity/force/torque.
    ///
    /// `mass <= 0.0` marks the body fixed (infinite inertia, never moved by
    /// the integrator or the solver).
    pub fn new(mass: f32, shape: Shape) -> Self {
        Self {
            id: None,
            shape,
            mass,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }

    /// The body's index in its world, or `-1` if it is not attached.
    pub fn id(&self) -> i64 {
        self.id.map(|i| i as i64).unwrap_or(-1)
    }

    /// `true` once this value has been consumed by `World::add`.
    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn is_fixed(&self) -> bool {
        self.mass <= 0.0
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.position = p;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, q: Quat) {
        self.orientation = q.normalize();
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, v: Vec3) {
        self.linear_velocity = v;
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, w: Vec3) {
        self.angular_velocity = w;
    }

    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn apply_force(&mut self, f: Vec3) {
        self.force += f;
    }

    pub fn torque(&self) -> Vec3 {
        self.torque
    }

    pub fn apply_torque(&mut self, t: Vec3) {
        self.torque += t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_body_is_detached() {
        let body = RigidBody::new(1.0, Shape::sphere(1.0));
        assert_eq!(body.id(), -1);
        assert!(!body.is_attached());
    }

    #[test]
    fn fixed_iff_nonpositive_mass() {
        assert!(RigidBody::new(0.0, Shape::sphere(1.0)).is_fixed());
        assert!(RigidBody::new(-1.0, Shape::sphere(1.0)).is_fixed());
        assert!(!RigidBody::new(1.0, Shape::sphere(1.0)).is_fixed());
    }

    #[test]
    fn pre_attach_getters_setters_round_trip() {
        let mut body = RigidBody::new(2.0, Shape::sphere(1.0));
        body.set_position(Vec3::new(1.0, 2.0, 3.0));
        body.set_linear_velocity(Vec3::new(0.0, -1.0, 0.0));
        body.apply_force(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(body.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.linear_velocity(), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(body.force(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn set_orientation_normalizes() {
        let mut body = RigidBody::new(1.0, Shape::sphere(1.0));
        body.set_orientation(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0));
        assert!((body.orientation().length() - 1.0).abs() < 1e-6);
    }
}
