//! The impulse handler (first-contact events) and the SPOOK projected
//! Gauss–Seidel constraint solver (persistent contacts).

use glam::{Mat3, Vec3};

use crate::error::PhysicsError;
use crate::math::{cross_matrix, solve3};

/// Global SPOOK parameters. `h` is the timestep, `k` the spring stiffness,
/// `d` the damping expressed as a count of steps to stabilization.
#[derive(Debug, Clone, Copy)]
pub struct SpookParams {
    pub h: f32,
    pub k: f32,
    pub d: f32,
}

impl SpookParams {
    /// `a(h) = 4 / (h * (1 + 4d))`.
    pub fn a(&self) -> f32 {
        4.0 / (self.h * (1.0 + 4.0 * self.d))
    }

    /// `b = 4d / (1 + 4d)`.
    pub fn b(&self) -> f32 {
        4.0 * self.d / (1.0 + 4.0 * self.d)
    }

    /// `eps(h) = 4 / (h^2 * k * (1 + 4d))`.
    pub fn eps(&self) -> f32 {
        4.0 / (self.h * self.h * self.k * (1.0 + 4.0 * self.d))
    }
}

/// A single constraint row: one contact's worth of Jacobian, inverse-mass,
/// violation, rate, and external-force data, laid out as 12 scalars
/// (6 per body: `[vx, vy, vz, wx, wy, wz]`).
#[derive(Debug, Clone, Copy)]
pub struct ConstraintRow {
    pub i: usize,
    /// `None` for a single-body row (`j = -1` in `spec.md`'s vocabulary).
    pub j: Option<usize>,
    pub g: [f32; 12],
    pub minv: [f32; 12],
    /// Per-DoF constraint violation (`q` in `spec.md`'s vocabulary): `[-qvec,
    /// 0, 0, 0]` for a single movable body, `[-qvec, 0, +qvec, 0]` when both
    /// bodies are movable. `Gq` is the dot product of this with `g`, not the
    /// bare penetration scalar — the two only coincide when body `j`
    /// contributes nothing to `q` (`spec.md` §4.6/§4.7).
    pub q: [f32; 12],
    pub qdot: [f32; 12],
    pub fext: [f32; 12],
    pub lower: f32,
    pub has_lower: bool,
    pub upper: f32,
    pub has_upper: bool,

    // Solver-internal scratch, populated by `prepare` and mutated during
    // iteration. Exposed so a caller can inspect convergence (§8's solver
    // property) without re-deriving it.
    pub lambda: f32,
    c: f32,
    b_term: f32,
    eps: f32,
}

impl ConstraintRow {
    /// Build a fresh row. Bounds `[lower, upper]` default to `[0, +inf)`
    /// (non-penetration) unless overridden via `with_bounds`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        i: usize,
        j: Option<usize>,
        g: [f32; 12],
        minv: [f32; 12],
        q: [f32; 12],
        qdot: [f32; 12],
        fext: [f32; 12],
    ) -> Self {
        Self {
            i,
            j,
            g,
            minv,
            q,
            qdot,
            fext,
            lower: 0.0,
            has_lower: true,
            upper: f32::INFINITY,
            has_upper: false,
            lambda: 0.0,
            c: 0.0,
            b_term: 0.0,
            eps: 0.0,
        }
    }

    pub fn with_bounds(mut self, lower: Option<f32>, upper: Option<f32>) -> Self {
        self.has_lower = lower.is_some();
        self.lower = lower.unwrap_or(f32::NEG_INFINITY);
        self.has_upper = upper.is_some();
        self.upper = upper.unwrap_or(f32::INFINITY);
        self
    }

    /// Precompute `GMG`, `Gq`, `GW`, `GMf`, `c`, and `B` for this row, and
    /// reset its accumulated multiplier. Called once per solver run, before
    /// any Gauss–Seidel sweep.
    fn prepare(&mut self, params: &SpookParams) {
        let mut gmg = 0.0;
        let mut gq = 0.0;
        let mut gw = 0.0;
        let mut gmf = 0.0;
        for k in 0..12 {
            gmg += self.g[k] * self.g[k] * self.minv[k];
            gq += self.g[k] * self.q[k];
            gw += self.g[k] * self.qdot[k];
            gmf += self.g[k] * self.minv[k] * self.fext[k];
        }

        let eps = params.eps();
        self.eps = eps;
        self.c = 1.0 / (gmg + eps);
        self.b_term = -params.a() * gq - params.b() * gw - params.h * gmf;
        self.lambda = 0.0;
    }

    #[inline]
    fn clamp_lambda(&self, value: f32) -> f32 {
        let mut v = value;
        if self.has_lower && v < self.lower {
            v = self.lower;
        }
        if self.has_upper && v > self.upper {
            v = self.upper;
        }
        v
    }
}

/// Per-body velocity-correction scratch (`vxlambda` .. `wzlambda` in
/// `spec.md`'s vocabulary), stored as six parallel arrays sized to the
/// current body count. Preallocated once and reused across steps, resized
/// only when the body count grows — the draft source this crate follows
/// reallocates every step; this port caches and zeroes instead (`spec.md`
/// §9).
#[derive(Debug, Clone, Default)]
pub struct SolverScratch {
    vx: Vec<f32>,
    vy: Vec<f32>,
    vz: Vec<f32>,
    wx: Vec<f32>,
    wy: Vec<f32>,
    wz: Vec<f32>,
}

impl SolverScratch {
    pub fn len(&self) -> usize {
        self.vx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vx.is_empty()
    }

    /// Resize to `n` bodies, dropping any previous contents (scratch is
    /// zeroed at the start of every solve, so growth need not preserve data).
    pub fn resize(&mut self, n: usize) {
        self.vx.resize(n, 0.0);
        self.vy.resize(n, 0.0);
        self.vz.resize(n, 0.0);
        self.wx.resize(n, 0.0);
        self.wy.resize(n, 0.0);
        self.wz.resize(n, 0.0);
    }

    pub fn zero(&mut self) {
        self.vx.iter_mut().for_each(|v| *v = 0.0);
        self.vy.iter_mut().for_each(|v| *v = 0.0);
        self.vz.iter_mut().for_each(|v| *v = 0.0);
        self.wx.iter_mut().for_each(|v| *v = 0.0);
        self.wy.iter_mut().for_each(|v| *v = 0.0);
        self.wz.iter_mut().for_each(|v| *v = 0.0);
    }

    /// The 6-vector `(vx, vy, vz, wx, wy, wz)` correction for body `i`.
    pub fn body(&self, i: usize) -> [f32; 6] {
        [self.vx[i], self.vy[i], self.vz[i], self.wx[i], self.wy[i], self.wz[i]]
    }

    #[inline]
    fn add(&mut self, i: usize, slot: usize, value: f32) {
        match slot {
            0 => self.vx[i] += value,
            1 => self.vy[i] += value,
            2 => self.vz[i] += value,
            3 => self.wx[i] += value,
            4 => self.wy[i] += value,
            5 => self.wz[i] += value,
            _ => unreachable!("solver DoF slot out of range"),
        }
    }

    #[inline]
    fn get(&self, i: usize, slot: usize) -> f32 {
        match slot {
            0 => self.vx[i],
            1 => self.vy[i],
            2 => self.vz[i],
            3 => self.wx[i],
            4 => self.wy[i],
            5 => self.wz[i],
            _ => unreachable!("solver DoF slot out of range"),
        }
    }
}

/// Run `iterations` projected Gauss–Seidel sweeps over `rows`, accumulating
/// per-body velocity corrections into `scratch`. `scratch` must already be
/// sized to the world's body count and zeroed by the caller.
pub fn solve(rows: &mut [ConstraintRow], scratch: &mut SolverScratch, params: &SpookParams, iterations: u32) {
    for row in rows.iter_mut() {
        row.prepare(params);
    }

    for _ in 0..iterations {
        for row in rows.iter_mut() {
            let mut gu = 0.0;
            for slot in 0..6 {
                gu += row.g[slot] * scratch.get(row.i, slot);
            }
            if let Some(j) = row.j {
                for slot in 0..6 {
                    gu += row.g[6 + slot] * scratch.get(j, slot);
                }
            }

            let delta_lambda_unclamped = row.c * (row.b_term - gu - row.eps * row.lambda);
            let lambda_new = row.clamp_lambda(row.lambda + delta_lambda_unclamped);
            let delta_lambda = lambda_new - row.lambda;
            row.lambda = lambda_new;

            for slot in 0..6 {
                scratch.add(row.i, slot, delta_lambda * row.minv[slot] * row.g[slot]);
            }
            if let Some(j) = row.j {
                for slot in 0..6 {
                    scratch.add(j, slot, delta_lambda * row.minv[6 + slot] * row.g[6 + slot]);
                }
            }
        }
    }
}

/// Solve the 3x3 impulse system for a first-contact event (`spec.md` §4.5)
/// and return the impulse `J`. The caller applies `-J/m_i` to body `i` and
/// `+J/m_j` to body `j` (and the matching angular terms via `r_i x J` /
/// `r_j x J`, if angular impulse application is enabled) so that the
/// post-impulse relative velocity along `n` matches the restitution target.
///
/// `u` is the pre-contact relative velocity (body `j` minus body `i`) at the
/// contact point; `n` is the contact normal pointing outward from body `i`.
#[allow(clippy::too_many_arguments)]
pub fn solve_impulse(
    r_i: Vec3,
    inv_mass_i: f32,
    inv_inertia_i: Vec3,
    r_j: Vec3,
    inv_mass_j: f32,
    inv_inertia_j: Vec3,
    u: Vec3,
    n: Vec3,
    restitution: f32,
    friction: f32,
) -> Result<Vec3, PhysicsError> {
    let skew_i = cross_matrix(r_i);
    let skew_j = cross_matrix(r_j);
    let k = Mat3::from_diagonal(Vec3::splat(inv_mass_i + inv_mass_j))
        - skew_i * Mat3::from_diagonal(inv_inertia_i) * skew_i
        - skew_j * Mat3::from_diagonal(inv_inertia_j) * skew_j;

    let v_f = n * (-restitution * u.dot(n));
    let mut impulse = solve3(k, v_f - u).ok_or_else(|| {
        tracing::error!("impulse solve: singular collision matrix");
        PhysicsError::SolverSingular
    })?;

    let j_n = impulse.dot(n);
    let tangent_vec = impulse - n * j_n;
    let j_t_mag = tangent_vec.length();

    if j_t_mag > friction * j_n.abs() {
        let t = if j_t_mag > 1e-8 {
            tangent_vec / j_t_mag
        } else {
            Vec3::ZERO
        };
        let denom = n.dot(k * (n - t * friction));
        if !denom.is_finite() || denom.abs() < 1e-12 {
            tracing::error!("impulse solve: singular friction-cone recompute");
            return Err(PhysicsError::SolverSingular);
        }
        let impulse_scalar = -(1.0 + restitution) * u.dot(n) / denom;
        impulse = n * impulse_scalar - t * (friction * impulse_scalar);
    }

    if !impulse.is_finite() {
        tracing::error!("impulse solve: non-finite result");
        return Err(PhysicsError::SolverSingular);
    }

    Ok(impulse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spook_coefficients() {
        let params = SpookParams { h: 1.0 / 60.0, k: 1e6, d: 3.0 };
        assert!(params.a() > 0.0);
        assert!(params.b() > 0.0 && params.b() < 1.0);
        assert!(params.eps() > 0.0);
    }

    #[test]
    fn head_on_elastic_impulse_reverses_normal_velocity() {
        // Two unit-mass spheres approaching head-on along X with e=1: the
        // closed-form result for equal masses is a full velocity swap along n.
        let n = Vec3::X;
        let u = Vec3::new(-2.0, 0.0, 0.0); // v_j - v_i, approaching
        let j = solve_impulse(
            Vec3::ZERO,
            1.0,
            Vec3::ZERO,
            Vec3::ZERO,
            1.0,
            Vec3::ZERO,
            u,
            n,
            1.0,
            0.0,
        )
        .unwrap();
        assert!(j.x > 0.0);
    }

    #[test]
    fn fixed_body_has_zero_inverse_mass_contribution() {
        // Body j fixed (inv_mass_j = 0, inv_inertia_j = 0): impulse should
        // still solve without error.
        let n = Vec3::Y;
        let u = Vec3::new(0.0, -3.0, 0.0);
        let j = solve_impulse(
            Vec3::ZERO,
            1.0,
            Vec3::ZERO,
            Vec3::ZERO,
            0.0,
            Vec3::ZERO,
            u,
            n,
            0.5,
            0.0,
        )
        .unwrap();
        assert!(j.y > 0.0);
    }

    #[test]
    fn solver_drives_single_unconstrained_row_toward_target() {
        let params = SpookParams { h: 1.0 / 60.0, k: 1e6, d: 3.0 };
        let mut row = ConstraintRow::new(
            0,
            None,
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0; 12],
            [0.0; 12],
        )
        .with_bounds(None, None);
        let mut scratch = SolverScratch::default();
        scratch.resize(1);
        solve(std::slice::from_mut(&mut row), &mut scratch, &params, 50);

        let gu = row.g[0] * scratch.get(0, 0);
        let residual = (gu + row.eps * row.lambda - row.b_term).abs();
        assert!(residual < 1e-3, "residual too large: {residual}");
    }

    #[test]
    fn two_movable_body_row_uses_full_q_dot_product_for_gq() {
        // q = [-qvec, 0, +qvec, 0] for a two-movable-body row: with g[0]=1,
        // g[6]=1 and q[0]=q[6]=penetration, Gq = 2*penetration, not
        // penetration alone.
        let params = SpookParams { h: 1.0 / 60.0, k: 1e6, d: 3.0 };
        let penetration = -0.1;
        let mut g = [0.0f32; 12];
        g[0] = 1.0;
        g[6] = 1.0;
        let mut q = [0.0f32; 12];
        q[0] = penetration;
        q[6] = penetration;
        let mut row =
            ConstraintRow::new(0, Some(1), g, [0.0; 12], q, [0.0; 12], [0.0; 12]).with_bounds(None, None);
        row.prepare(&params);
        let expected_gq = 2.0 * penetration;
        let expected_b = -params.a() * expected_gq;
        assert!((row.b_term - expected_b).abs() < 1e-6, "b_term = {}, expected {}", row.b_term, expected_b);
    }

    #[test]
    fn clamp_respects_per_row_bounds() {
        let row = ConstraintRow::new(0, None, [0.0; 12], [0.0; 12], 0.0, [0.0; 12], [0.0; 12])
            .with_bounds(Some(0.0), Some(5.0));
        assert_eq!(row.clamp_lambda(-10.0), 0.0);
        assert_eq!(row.clamp_lambda(10.0), 5.0);
        assert_eq!(row.clamp_lambda(2.5), 2.5);
    }
}
