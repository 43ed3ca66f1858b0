use crate::{LinalgError, EPSILON};

/// A 3x3 matrix stored as rows.
pub type Mat33 = [[f64; 3]; 3];

/// The 3x3 identity matrix.
pub const IDENTITY: Mat33 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Compute the determinant of a 3x3 matrix.
#[rustfmt::skip]
pub fn det_mat33(m: &Mat33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[rustfmt::skip]
fn adjugate_mat33(m: &Mat33) -> Mat33 {
    [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],  // [0, 0]
            m[0][2] * m[2][1] - m[0][1] * m[2][2],  // [0, 1]
            m[0][1] * m[1][2] - m[0][2] * m[1][1],  // [0, 2]
        ],
        [
            m[1][2] * m[2][0] - m[1][0] * m[2][2],  // [1, 0]
            m[0][0] * m[2][2] - m[0][2] * m[2][0],  // [1, 1]
            m[0][2] * m[1][0] - m[0][0] * m[1][2],  // [1, 2]
        ],
        [
            m[1][0] * m[2][1] - m[1][1] * m[2][0],  // [2, 0]
            m[0][1] * m[2][0] - m[0][0] * m[2][1],  // [2, 1]
            m[0][0] * m[1][1] - m[0][1] * m[1][0],  // [2, 2]
        ],
    ]
}

/// Invert a 3x3 matrix with the closed-form cofactor expansion.
///
/// # Errors
///
/// Returns [`LinalgError::Singular`] if `|det(m)| < EPSILON`.
///
/// Example:
///
/// ```
/// use pitchmap_linalg::mat33::invert_mat33;
///
/// let m = [[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 1.0]];
/// let inv = invert_mat33(&m).unwrap();
/// assert_eq!(inv, [[0.5, 0.0, 0.0], [0.0, 0.25, 0.0], [0.0, 0.0, 1.0]]);
/// assert!(invert_mat33(&[[0.0; 3]; 3]).is_err());
/// ```
pub fn invert_mat33(m: &Mat33) -> Result<Mat33, LinalgError> {
    let det = det_mat33(m);
    if det.abs() < EPSILON {
        return Err(LinalgError::Singular(det.abs()));
    }

    let inv_det = 1.0 / det;
    let mut inv = adjugate_mat33(m);
    inv.iter_mut()
        .flat_map(|row| row.iter_mut())
        .for_each(|v| *v *= inv_det);

    Ok(inv)
}

/// Compute the product `a * b` of two 3x3 matrices.
pub fn mul_mat33(a: &Mat33, b: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Return the transpose of a 3x3 matrix.
pub fn transpose_mat33(m: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = m[j][i];
        }
    }
    out
}

/// Compute the product of a 3x3 matrix and a 3-vector.
pub fn mat33_mul_vec3(m: &Mat33, v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Multiply every entry of a 3x3 matrix by `k`.
pub fn scale_mat33(m: &Mat33, k: f64) -> Mat33 {
    let mut out = *m;
    out.iter_mut()
        .flat_map(|row| row.iter_mut())
        .for_each(|v| *v *= k);
    out
}

/// Divide a 3x3 matrix by its bottom-right entry so that `m[2][2] == 1`.
///
/// # Errors
///
/// Returns [`LinalgError::Singular`] if `|m[2][2]| < EPSILON`; the matrix is left untouched.
pub fn normalize_mat33_inplace(m: &mut Mat33) -> Result<(), LinalgError> {
    let s = m[2][2];
    if s.abs() < EPSILON {
        return Err(LinalgError::Singular(s.abs()));
    }
    *m = scale_mat33(m, 1.0 / s);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const M: Mat33 = [[2.0, -1.0, 0.5], [0.3, 1.5, -2.0], [0.01, 0.002, 1.0]];

    #[test]
    fn test_det_identity() {
        assert_eq!(det_mat33(&IDENTITY), 1.0);
    }

    #[test]
    fn test_det() {
        let m = [[1.0, 2.0, 3.0], [0.0, 1.0, 4.0], [5.0, 6.0, 0.0]];
        assert_relative_eq!(det_mat33(&m), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invert() -> Result<(), LinalgError> {
        let inv = invert_mat33(&M)?;
        let prod = mul_mat33(&M, &inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(prod[i][j], IDENTITY[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_invert_singular() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(matches!(invert_mat33(&m), Err(LinalgError::Singular(_))));

        // below the threshold counts as singular too
        let tiny = scale_mat33(&IDENTITY, 1e-4);
        assert!(matches!(invert_mat33(&tiny), Err(LinalgError::Singular(_))));
    }

    #[test]
    fn test_transpose() {
        let t = transpose_mat33(&M);
        assert_eq!(t[0][1], M[1][0]);
        assert_eq!(t[2][0], M[0][2]);
        assert_eq!(transpose_mat33(&t), M);
    }

    #[test]
    fn test_mul_vec3() {
        let v = mat33_mul_vec3(&M, &[1.0, 2.0, 1.0]);
        assert_relative_eq!(v[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(v[1], 1.3, epsilon = 1e-12);
        assert_relative_eq!(v[2], 1.014, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize() -> Result<(), LinalgError> {
        let mut m = scale_mat33(&M, 4.0);
        normalize_mat33_inplace(&mut m)?;
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(m[i][j], M[i][j], epsilon = 1e-12);
            }
        }

        let mut zero_corner = IDENTITY;
        zero_corner[2][2] = 0.0;
        assert!(normalize_mat33_inplace(&mut zero_corner).is_err());
        assert_eq!(zero_corner[0][0], 1.0);
        Ok(())
    }
}
