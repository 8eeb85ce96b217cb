//! Math primitives that sit on top of `glam`: a 3x3 cross-product (skew-symmetric)
//! matrix builder and a Gaussian-elimination solver for 3x3 systems.
//!
//! Vectors, quaternions, and general 3x3/4x4 matrix arithmetic are provided
//! by `glam` directly; this module only adds the handful of operations the
//! solver and impulse handler need that `glam` doesn't ship.

use glam::{Mat3, Vec3};

/// Build the skew-symmetric cross-product matrix `v^x` such that
/// `v^x * u == v.cross(u)` for any vector `u`.
#[inline]
pub fn cross_matrix(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        glam::vec3(0.0, v.z, -v.y),
        glam::vec3(-v.z, 0.0, v.x),
        glam::vec3(v.y, -v.x, 0.0),
    )
}

/// Solve the 3x3 linear system `a * x = b` via Gaussian elimination with
/// partial pivoting. Returns `None` if `a` is singular (including when the
/// elimination produces a `NaN`/infinite pivot).
pub fn solve3(a: Mat3, b: Vec3) -> Option<Vec3> {
    // Work with row-major scratch copies; glam's Mat3 is column-major, so
    // index as `a.col(j)[i]` for row i, column j.
    let mut m = [
        [a.x_axis.x, a.y_axis.x, a.z_axis.x, b.x],
        [a.x_axis.y, a.y_axis.y, a.z_axis.y, b.y],
        [a.x_axis.z, a.y_axis.z, a.z_axis.z, b.z],
    ];

    for col in 0..3 {
        // Partial pivot: choose the row with the largest magnitude in this column.
        let mut pivot_row = col;
        let mut pivot_val = m[col][col].abs();
        for row in (col + 1)..3 {
            let v = m[row][col].abs();
            if v > pivot_val {
                pivot_val = v;
                pivot_row = row;
            }
        }

        if !pivot_val.is_finite() || pivot_val < 1e-12 {
            return None;
        }

        if pivot_row != col {
            m.swap(col, pivot_row);
        }

        let pivot = m[col][col];
        for k in col..4 {
            m[col][k] /= pivot;
        }

        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let x = Vec3::new(m[0][3], m[1][3], m[2][3]);
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_matrix_matches_cross_product() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let u = Vec3::new(4.0, -1.0, 0.5);
        let via_matrix = cross_matrix(v) * u;
        let via_cross = v.cross(u);
        assert!((via_matrix - via_cross).length() < 1e-6);
    }

    #[test]
    fn solve3_identity() {
        let x = solve3(Mat3::IDENTITY, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert!((x - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn solve3_diagonal() {
        let a = Mat3::from_diagonal(Vec3::new(2.0, 4.0, 0.5));
        let x = solve3(a, Vec3::new(2.0, 8.0, 1.0)).unwrap();
        assert!((x - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn solve3_singular_returns_none() {
        // Rank-deficient: third row is a combination of the first two.
        let a = Mat3::from_cols(
            glam::vec3(1.0, 2.0, 3.0),
            glam::vec3(0.0, 1.0, 1.0),
            glam::vec3(1.0, 3.0, 4.0),
        );
        assert!(solve3(a, Vec3::new(1.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn solve3_requires_pivoting() {
        // Zero in the natural pivot position forces a row swap.
        let a = Mat3::from_cols(
            glam::vec3(0.0, 1.0, 0.0),
            glam::vec3(1.0, 0.0, 0.0),
            glam::vec3(0.0, 0.0, 1.0),
        );
        let x = solve3(a, Vec3::new(2.0, 3.0, 4.0)).unwrap();
        assert!((x - Vec3::new(3.0, 2.0, 4.0)).length() < 1e-6);
    }
}
