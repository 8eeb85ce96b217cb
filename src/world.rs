//! The simulated world: Structure-of-Arrays body storage and the fixed-step
//! driver that ties broadphase, narrowphase, the impulse handler, and the
//! SPOOK solver together.

use glam::{Quat, Vec3};

use crate::body::RigidBody;
use crate::broadphase::{Broadphase, BroadphaseBody, NaiveBroadphase};
use crate::contact::{Contact, ContactHistory};
use crate::error::PhysicsError;
use crate::narrowphase::{self, Pose};
use crate::shape::Shape;
use crate::solver::{self, ConstraintRow, SolverScratch, SpookParams};

/// Tunable parameters for a [`World`]. Unlike the teacher's `PhysicsConfig`,
/// there is no `use_gpu` flag — a GPU compute path is out of scope here.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// SPOOK stiffness (`k`). Higher values converge penetration faster but
    /// tolerate smaller timesteps before the solver becomes unstable.
    pub stiffness: f32,
    /// SPOOK damping (`d`), expressed as the number of steps to relax over.
    pub damping: f32,
    pub iterations: u32,
    pub restitution: f32,
    pub friction: f32,
    /// Whether the first-contact impulse handler applies its angular
    /// component. Off by default — see `DESIGN.md`'s open-question
    /// resolution for why the teacher's equivalent defaults this on but
    /// this crate does not.
    pub apply_impulse_angular: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            stiffness: 1.0e6,
            damping: 3.0,
            iterations: 10,
            restitution: 0.3,
            friction: 0.0,
            apply_impulse_angular: false,
        }
    }
}

/// The world's per-body state, stored as parallel arrays (§3). A
/// [`RigidBody`] is consumed by [`World::add`] and its fields copied in;
/// every subsequent read/write goes through the index-keyed methods below.
pub struct World {
    config: PhysicsConfig,
    broadphase: Box<dyn Broadphase>,

    position: Vec<Vec3>,
    orientation: Vec<Quat>,
    linear_velocity: Vec<Vec3>,
    angular_velocity: Vec<Vec3>,
    force: Vec<Vec3>,
    torque: Vec<Vec3>,
    shape: Vec<Shape>,
    mass: Vec<f32>,
    inv_mass: Vec<f32>,
    local_inertia: Vec<Vec3>,
    inv_inertia: Vec<Vec3>,

    history: ContactHistory,
    scratch: SolverScratch,

    #[cfg(feature = "sleeping")]
    sleep: Vec<crate::sleep::SleepState>,
    #[cfg(feature = "sleeping")]
    sleep_time: Vec<f32>,

    time: f32,
    step_number: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl World {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            broadphase: Box::new(NaiveBroadphase::new()),
            position: Vec::new(),
            orientation: Vec::new(),
            linear_velocity: Vec::new(),
            angular_velocity: Vec::new(),
            force: Vec::new(),
            torque: Vec::new(),
            shape: Vec::new(),
            mass: Vec::new(),
            inv_mass: Vec::new(),
            local_inertia: Vec::new(),
            inv_inertia: Vec::new(),
            history: ContactHistory::new(0),
            scratch: SolverScratch::default(),
            #[cfg(feature = "sleeping")]
            sleep: Vec::new(),
            #[cfg(feature = "sleeping")]
            sleep_time: Vec::new(),
            time: 0.0,
            step_number: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Install a different broadphase strategy. `spec.md` only ever calls
    /// for [`NaiveBroadphase`]; this hook exists so a smarter strategy can
    /// be swapped in without touching the step driver.
    pub fn set_broadphase(&mut self, broadphase: Box<dyn Broadphase>) {
        self.broadphase = broadphase;
    }

    pub fn body_count(&self) -> usize {
        self.position.len()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn step_number(&self) -> u64 {
        self.step_number
    }

    /// Consume `body`, attach it to the world, and return its index.
    pub fn add(&mut self, body: RigidBody) -> usize {
        let i = self.position.len();
        let mass = body.mass();
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let local_inertia = body.shape().calculate_local_inertia(mass);
        let inv_inertia = Vec3::new(
            if local_inertia.x > 0.0 { 1.0 / local_inertia.x } else { 0.0 },
            if local_inertia.y > 0.0 { 1.0 / local_inertia.y } else { 0.0 },
            if local_inertia.z > 0.0 { 1.0 / local_inertia.z } else { 0.0 },
        );

        self.position.push(body.position());
        self.orientation.push(body.orientation());
        self.linear_velocity.push(body.linear_velocity());
        self.angular_velocity.push(body.angular_velocity());
        self.force.push(body.force());
        self.torque.push(body.torque());
        self.shape.push(body.shape());
        self.mass.push(mass);
        self.inv_mass.push(inv_mass);
        self.local_inertia.push(local_inertia);
        self.inv_inertia.push(inv_inertia);

        self.history.grow_to(i + 1);
        self.scratch.resize(i + 1);

        #[cfg(feature = "sleeping")]
        {
            self.sleep.push(crate::sleep::SleepState::Awake);
            self.sleep_time.push(0.0);
        }

        tracing::debug!(index = i, mass, "body attached to world");
        i
    }

    pub fn position(&self, i: usize) -> Vec3 {
        self.position[i]
    }

    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.position[i] = p;
    }

    pub fn orientation(&self, i: usize) -> Quat {
        self.orientation[i]
    }

    pub fn set_orientation(&mut self, i: usize, q: Quat) {
        self.orientation[i] = q.normalize();
    }

    pub fn linear_velocity(&self, i: usize) -> Vec3 {
        self.linear_velocity[i]
    }

    pub fn set_linear_velocity(&mut self, i: usize, v: Vec3) {
        self.linear_velocity[i] = v;
    }

    pub fn angular_velocity(&self, i: usize) -> Vec3 {
        self.angular_velocity[i]
    }

    pub fn set_angular_velocity(&mut self, i: usize, w: Vec3) {
        self.angular_velocity[i] = w;
    }

    pub fn apply_force(&mut self, i: usize, f: Vec3) {
        self.force[i] += f;
    }

    pub fn apply_torque(&mut self, i: usize, t: Vec3) {
        self.torque[i] += t;
    }

    pub fn shape(&self, i: usize) -> Shape {
        self.shape[i]
    }

    pub fn mass(&self, i: usize) -> f32 {
        self.mass[i]
    }

    pub fn is_fixed(&self, i: usize) -> bool {
        self.inv_mass[i] == 0.0
    }

    /// Advance the world by `dt`, logging and swallowing any error so a
    /// caller that doesn't need to distinguish failure modes can drive the
    /// simulation in a simple loop. Use [`World::try_step`] to see them.
    pub fn step(&mut self, dt: f32) {
        if let Err(err) = self.try_step(dt) {
            tracing::error!(error = %err, "physics step failed, world left unchanged for this step");
        }
    }

    /// Advance the world by `dt`, per the fixed-step driver in `spec.md`
    /// §4.8: broadphase, rotate contact history, apply gravity, narrowphase
    /// each candidate pair, resolve each contact as an impulse (first
    /// contact) or a solver row (persistent contact), run the constraint
    /// solver, integrate velocities into position/orientation, then clear
    /// forces and advance the clock.
    pub fn try_step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        let n = self.body_count();
        if n == 0 {
            self.time += dt;
            self.step_number += 1;
            return Ok(());
        }

        let bodies: Vec<BroadphaseBody> = (0..n)
            .map(|i| BroadphaseBody {
                position: self.position[i],
                shape: self.shape[i],
            })
            .collect();
        let (pairs_i, pairs_j) = self.broadphase.collision_pairs(&bodies)?;

        self.history.rotate();

        for i in 0..n {
            if self.inv_mass[i] <= 0.0 {
                continue;
            }
            #[cfg(feature = "sleeping")]
            if self.is_sleeping(i) {
                continue;
            }
            self.force[i] += self.config.gravity * self.mass[i];
        }

        let mut rows: Vec<ConstraintRow> = Vec::new();

        for (&i, &j) in pairs_i.iter().zip(pairs_j.iter()) {
            let pose_i = Pose {
                position: self.position[i],
                orientation: self.orientation[i],
            };
            let pose_j = Pose {
                position: self.position[j],
                orientation: self.orientation[j],
            };
            let contacts = narrowphase::detect(i, self.shape[i], pose_i, j, self.shape[j], pose_j)?;

            for contact in contacts {
                let other = contact.j.expect("every handler in this crate produces a two-body contact");
                let was_touching = self.history.previous(contact.i, other);
                self.history.set_current(contact.i, other, true);

                if was_touching {
                    rows.push(self.build_row(&contact));
                } else {
                    self.apply_first_contact_impulse(&contact)?;
                }
            }
        }

        if !rows.is_empty() {
            self.scratch.resize(n);
            self.scratch.zero();
            let params = SpookParams {
                h: dt,
                k: self.config.stiffness,
                d: self.config.damping,
            };
            solver::solve(&mut rows, &mut self.scratch, &params, self.config.iterations);

            for i in 0..n {
                let [dvx, dvy, dvz, dwx, dwy, dwz] = self.scratch.body(i);
                self.linear_velocity[i] += Vec3::new(dvx, dvy, dvz);
                self.angular_velocity[i] += Vec3::new(dwx, dwy, dwz);
            }
        }

        for i in 0..n {
            if self.inv_mass[i] <= 0.0 {
                self.force[i] = Vec3::ZERO;
                self.torque[i] = Vec3::ZERO;
                continue;
            }
            #[cfg(feature = "sleeping")]
            if self.is_sleeping(i) {
                self.force[i] = Vec3::ZERO;
                self.torque[i] = Vec3::ZERO;
                continue;
            }

            self.linear_velocity[i] += self.force[i] * self.inv_mass[i] * dt;
            let inv_inertia = self.inv_inertia[i];
            let torque = self.torque[i];
            self.angular_velocity[i] += Vec3::new(
                torque.x * inv_inertia.x,
                torque.y * inv_inertia.y,
                torque.z * inv_inertia.z,
            ) * dt;

            self.position[i] += self.linear_velocity[i] * dt;

            let w = self.angular_velocity[i];
            let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * self.orientation[i];
            self.orientation[i] = (self.orientation[i] + spin * (0.5 * dt)).normalize();

            self.force[i] = Vec3::ZERO;
            self.torque[i] = Vec3::ZERO;
        }

        #[cfg(feature = "sleeping")]
        self.update_sleep_states(dt);

        self.time += dt;
        self.step_number += 1;
        Ok(())
    }

    fn build_row(&self, contact: &Contact) -> ConstraintRow {
        let i = contact.i;
        let j = contact.j.expect("persistent contact always has a body j");
        let n = contact.normal;

        let mut g = [0.0f32; 12];
        g[0] = -n.x;
        g[1] = -n.y;
        g[2] = -n.z;
        if contact.row_angular_i {
            let t = -contact.r_i.cross(n);
            g[3] = t.x;
            g[4] = t.y;
            g[5] = t.z;
        }
        g[6] = n.x;
        g[7] = n.y;
        g[8] = n.z;
        if contact.row_angular_j {
            let t = contact.r_j.cross(n);
            g[9] = t.x;
            g[10] = t.y;
            g[11] = t.z;
        }

        let inv_inertia_i = self.inv_inertia[i];
        let inv_inertia_j = self.inv_inertia[j];
        let minv = [
            self.inv_mass[i],
            self.inv_mass[i],
            self.inv_mass[i],
            inv_inertia_i.x,
            inv_inertia_i.y,
            inv_inertia_i.z,
            self.inv_mass[j],
            self.inv_mass[j],
            self.inv_mass[j],
            inv_inertia_j.x,
            inv_inertia_j.y,
            inv_inertia_j.z,
        ];

        let vi = self.linear_velocity[i];
        let wi = self.angular_velocity[i];
        let vj = self.linear_velocity[j];
        let wj = self.angular_velocity[j];
        let qdot = [
            vi.x, vi.y, vi.z, wi.x, wi.y, wi.z, vj.x, vj.y, vj.z, wj.x, wj.y, wj.z,
        ];

        let fi = self.force[i];
        let ti = self.torque[i];
        let fj = self.force[j];
        let tj = self.torque[j];
        let fext = [
            fi.x, fi.y, fi.z, ti.x, ti.y, ti.z, fj.x, fj.y, fj.z, tj.x, tj.y, tj.z,
        ];

        // q = [-qvec, 0, 0, 0] for a single movable body, or
        // [-qvec, 0, +qvec, 0] when j is movable too (spec.md §4.6). qvec's
        // component off the contact normal never reaches Gq (G's linear
        // block is ±n), so qvec = n * penetration is an equivalent stand-in
        // for the full penetration vector here.
        let qvec = n * contact.penetration;
        let mut q = [0.0f32; 12];
        q[0] = -qvec.x;
        q[1] = -qvec.y;
        q[2] = -qvec.z;
        if self.inv_mass[j] > 0.0 {
            q[6] = qvec.x;
            q[7] = qvec.y;
            q[8] = qvec.z;
        }

        ConstraintRow::new(i, Some(j), g, minv, q, qdot, fext).with_bounds(Some(0.0), None)
    }

    #[cfg(feature = "sleeping")]
    fn update_sleep_states(&mut self, dt: f32) {
        use crate::sleep::{SleepState, ANGULAR_SLEEP_THRESHOLD, LINEAR_SLEEP_THRESHOLD, SLEEP_TIME};

        for i in 0..self.body_count() {
            if self.inv_mass[i] <= 0.0 {
                continue;
            }
            let slow = self.linear_velocity[i].length_squared() < LINEAR_SLEEP_THRESHOLD * LINEAR_SLEEP_THRESHOLD
                && self.angular_velocity[i].length_squared() < ANGULAR_SLEEP_THRESHOLD * ANGULAR_SLEEP_THRESHOLD;

            if slow {
                self.sleep_time[i] += dt;
                if self.sleep_time[i] >= SLEEP_TIME {
                    self.sleep[i] = SleepState::Sleeping;
                }
            } else {
                self.sleep_time[i] = 0.0;
                self.sleep[i] = SleepState::Awake;
            }
        }
    }

    #[cfg(feature = "sleeping")]
    pub fn is_sleeping(&self, i: usize) -> bool {
        self.sleep[i] == crate::sleep::SleepState::Sleeping
    }

    fn apply_first_contact_impulse(&mut self, contact: &Contact) -> Result<(), PhysicsError> {
        let i = contact.i;
        let j = contact.j.expect("every handler in this crate produces a two-body contact");
        let n = contact.normal;

        let vi = self.linear_velocity[i] + self.angular_velocity[i].cross(contact.r_i);
        let vj = self.linear_velocity[j] + self.angular_velocity[j].cross(contact.r_j);
        let u = vj - vi;

        if u.dot(n) >= 0.0 {
            tracing::debug!(i, j, "first contact already separating, skipping impulse");
            return Ok(());
        }

        let impulse = solver::solve_impulse(
            contact.r_i,
            self.inv_mass[i],
            self.inv_inertia[i],
            contact.r_j,
            self.inv_mass[j],
            self.inv_inertia[j],
            u,
            n,
            self.config.restitution,
            self.config.friction,
        )?;

        self.linear_velocity[i] -= impulse * self.inv_mass[i];
        self.linear_velocity[j] += impulse * self.inv_mass[j];

        if self.config.apply_impulse_angular {
            let inv_inertia_i = self.inv_inertia[i];
            if inv_inertia_i != Vec3::ZERO {
                let c = contact.r_i.cross(impulse);
                self.angular_velocity[i] -= Vec3::new(c.x * inv_inertia_i.x, c.y * inv_inertia_i.y, c.z * inv_inertia_i.z);
            }
            let inv_inertia_j = self.inv_inertia[j];
            if inv_inertia_j != Vec3::ZERO {
                let c = contact.r_j.cross(impulse);
                self.angular_velocity[j] += Vec3::new(c.x * inv_inertia_j.x, c.y * inv_inertia_j.y, c.z * inv_inertia_j.z);
            }
        }

        Ok(())
    }
}
