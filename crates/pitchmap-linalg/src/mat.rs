use crate::LinalgError;

/// A dense matrix of `f64` stored in row-major order.
///
/// Sized for the small systems of the homography estimator (at most a few
/// dozen rows by nine columns); no attempt is made at blocking or SIMD.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a matrix from a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::InvalidBuffer`] if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, LinalgError> {
        if data.len() != rows * cols {
            return Err(LinalgError::InvalidBuffer(data.len(), rows, cols));
        }
        Ok(Self { rows, cols, data })
    }

    /// Create a matrix by evaluating `f(row, col)` for every entry.
    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Read the entry at `(row, col)`.
    ///
    /// PRECONDITION: `row < rows` and `col < cols`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Write the entry at `(row, col)`.
    ///
    /// PRECONDITION: `row < rows` and `col < cols`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// The row-major data buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the matrix and return the row-major data buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Return the transpose of the matrix.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |i, j| self.get(j, i))
    }

    /// Compute the dense product `self * rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::DimensionMismatch`] if `self.cols() != rhs.rows()`.
    pub fn matmul(&self, rhs: &Self) -> Result<Self, LinalgError> {
        if self.cols != rhs.rows {
            return Err(LinalgError::DimensionMismatch(
                self.rows, self.cols, rhs.rows, rhs.cols,
            ));
        }

        let mut out = Self::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a_ik = self.get(i, k);
                if a_ik == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a_ik * rhs.get(k, j);
                }
            }
        }
        Ok(out)
    }

    /// Compute the matrix-vector product `self * v`.
    ///
    /// # Errors
    ///
    /// Returns [`LinalgError::DimensionMismatch`] if `self.cols() != v.len()`.
    pub fn matvec(&self, v: &[f64]) -> Result<Vec<f64>, LinalgError> {
        if self.cols != v.len() {
            return Err(LinalgError::DimensionMismatch(
                self.rows,
                self.cols,
                v.len(),
                1,
            ));
        }
        Ok((0..self.rows)
            .map(|i| self.row(i).iter().zip(v).map(|(a, b)| a * b).sum())
            .collect())
    }
}

impl From<[[f64; 3]; 3]> for Matrix {
    fn from(m: [[f64; 3]; 3]) -> Self {
        Self::from_fn(3, 3, |i, j| m[i][j])
    }
}

impl TryFrom<&Matrix> for [[f64; 3]; 3] {
    type Error = LinalgError;

    fn try_from(m: &Matrix) -> Result<Self, Self::Error> {
        if m.rows != 3 || m.cols != 3 {
            return Err(LinalgError::DimensionMismatch(m.rows, m.cols, 3, 3));
        }
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            row.copy_from_slice(m.row(i));
        }
        Ok(out)
    }
}

/// Compute the dense product `a * b`.
///
/// Free-function form of [`Matrix::matmul`].
///
/// Example:
///
/// ```
/// use pitchmap_linalg::{mat::multiply, Matrix};
///
/// let a = Matrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
/// let b = Matrix::from_vec(2, 1, vec![3.0, 4.0]).unwrap();
/// let c = multiply(&a, &b).unwrap();
/// assert_eq!(c.as_slice(), &[11.0]);
/// ```
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, LinalgError> {
    a.matmul(b)
}

/// Return the transpose of `a`.
pub fn transpose(a: &Matrix) -> Matrix {
    a.transpose()
}
