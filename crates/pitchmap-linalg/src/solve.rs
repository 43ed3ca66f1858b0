use crate::{LinalgError, Matrix, EPSILON};

/// Solve the square linear system `a * x = b`.
///
/// Uses Gaussian elimination with partial pivoting: for every column the
/// remaining row with the largest absolute entry in that column is swapped
/// into the pivot position before eliminating below it, then the upper
/// triangular system is resolved by back-substitution.
///
/// # Arguments
///
/// * `a` - The coefficient matrix with shape (n, n).
/// * `b` - The right-hand side with length n.
///
/// # Returns
///
/// The solution vector `x` with length n.
///
/// # Errors
///
/// * [`LinalgError::DimensionMismatch`] if `a` is not square or `b` has the wrong length.
/// * [`LinalgError::Singular`] if a selected pivot has magnitude below [`EPSILON`].
///
/// Example:
///
/// ```
/// use pitchmap_linalg::{solve, Matrix};
///
/// let a = Matrix::from_vec(2, 2, vec![2.0, 1.0, 1.0, 3.0]).unwrap();
/// let x = solve(&a, &[3.0, 5.0]).unwrap();
/// assert!((x[0] - 0.8).abs() < 1e-12);
/// assert!((x[1] - 1.4).abs() < 1e-12);
/// ```
pub fn solve(a: &Matrix, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
    let n = a.rows();
    if a.cols() != n || b.len() != n {
        return Err(LinalgError::DimensionMismatch(a.rows(), a.cols(), b.len(), 1));
    }

    // augmented working copy, one Vec per row so rows can be swapped cheaply
    let mut rows = (0..n)
        .map(|i| {
            let mut row = Vec::with_capacity(n + 1);
            row.extend_from_slice(a.row(i));
            row.push(b[i]);
            row
        })
        .collect::<Vec<_>>();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = rows[col][col].abs();
        for (row_idx, row) in rows.iter().enumerate().skip(col + 1) {
            if row[col].abs() > max_val {
                max_val = row[col].abs();
                max_row = row_idx;
            }
        }

        if max_row != col {
            rows.swap(col, max_row);
        }

        let pivot = rows[col][col];
        if pivot.abs() < EPSILON {
            log::debug!("rejecting pivot {pivot:e} at column {col} of a {n}x{n} system");
            return Err(LinalgError::Singular(pivot.abs()));
        }

        let (upper, lower) = rows.split_at_mut(col + 1);
        let pivot_row = &upper[col];
        for row in lower.iter_mut() {
            let factor = row[col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for (dst, src) in row[col..].iter_mut().zip(&pivot_row[col..]) {
                *dst -= factor * src;
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let row = &rows[i];
        let tail = row[i + 1..n]
            .iter()
            .zip(&x[i + 1..])
            .map(|(a_ij, x_j)| a_ij * x_j)
            .sum::<f64>();
        x[i] = (row[n] - tail) / row[i];
    }

    Ok(x)
}

/// Solve the least-squares problem `min |a * x - b|` through the normal equations.
///
/// Forms `aᵀa x = aᵀb` and hands it to [`solve`]. Accurate when `a` is well
/// conditioned; callers are expected to normalize their inputs first.
///
/// # Errors
///
/// Same as [`solve`], plus [`LinalgError::DimensionMismatch`] if `b.len() != a.rows()`.
pub fn solve_normal_equations(a: &Matrix, b: &[f64]) -> Result<Vec<f64>, LinalgError> {
    if b.len() != a.rows() {
        return Err(LinalgError::DimensionMismatch(a.rows(), a.cols(), b.len(), 1));
    }
    let at = a.transpose();
    let ata = at.matmul(a)?;
    let atb = at.matvec(b)?;
    solve(&ata, &atb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;

    #[test]
    fn test_solve_3x3() -> Result<(), LinalgError> {
        let a = Matrix::from_vec(3, 3, vec![2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0])?;
        let x = solve(&a, &[8.0, -11.0, -3.0])?;
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], -1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_solve_needs_pivoting() -> Result<(), LinalgError> {
        // zero in the leading position forces a row swap
        let a = Matrix::from_vec(2, 2, vec![0.0, 1.0, 1.0, 1.0])?;
        let x = solve(&a, &[2.0, 3.0])?;
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 2.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_solve_singular() -> Result<(), LinalgError> {
        let a = Matrix::from_vec(3, 3, vec![1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0])?;
        assert!(matches!(
            solve(&a, &[1.0, 2.0, 3.0]),
            Err(LinalgError::Singular(_))
        ));
        Ok(())
    }

    #[test]
    fn test_solve_dimension_mismatch() {
        let a = Matrix::zeros(2, 3);
        assert!(matches!(
            solve(&a, &[1.0, 2.0]),
            Err(LinalgError::DimensionMismatch(..))
        ));
        let a = Matrix::zeros(2, 2);
        assert!(matches!(
            solve(&a, &[1.0]),
            Err(LinalgError::DimensionMismatch(..))
        ));
    }

    #[test]
    fn test_solve_random_diagonally_dominant() -> Result<(), LinalgError> {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 8;
        let a = Matrix::from_fn(n, n, |i, j| {
            if i == j {
                10.0 + i as f64
            } else {
                ((i * 31 + j * 17) % 7) as f64 / 7.0 - 0.5
            }
        });
        let x_true = (0..n).map(|_| rng.random_range(-5.0..5.0)).collect::<Vec<f64>>();
        let b = a.matvec(&x_true)?;
        let x = solve(&a, &b)?;
        for (xi, ti) in x.iter().zip(&x_true) {
            assert_relative_eq!(xi, ti, epsilon = 1e-10);
        }
        Ok(())
    }

    #[test]
    fn test_normal_equations_overdetermined() -> Result<(), LinalgError> {
        // fit y = 2x + 1 through exact samples
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = Matrix::from_fn(xs.len(), 2, |i, j| if j == 0 { xs[i] } else { 1.0 });
        let b = xs.iter().map(|x| 2.0 * x + 1.0).collect::<Vec<_>>();
        let p = solve_normal_equations(&a, &b)?;
        assert_relative_eq!(p[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(p[1], 1.0, epsilon = 1e-10);
        Ok(())
    }
}
