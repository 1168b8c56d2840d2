//! Small dense symmetric-matrix algebra
//!
//! Just enough linear algebra to correlate the large-scale parameters: a
//! row-major `Matrix`, Jacobi eigen-decomposition and the principal square
//! root of a positive semi-definite matrix.
//!
//! ```rust
//! use gscm_core::matrix::{Matrix, sqrt_psd};
//!
//! let c = Matrix::from_data(2, 2, vec![1.0, 0.5, 0.5, 1.0]);
//! let s = sqrt_psd(&c);
//! let back = s.multiply(&s);
//! assert!((back.get(0, 1) - 0.5).abs() < 1e-10);
//! ```

/// Row-major dense matrix of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Result of an eigenvalue decomposition.
#[derive(Debug, Clone)]
pub struct EigenResult {
    /// Eigenvalues (not sorted)
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as columns; column `j` belongs to `eigenvalues[j]`
    pub eigenvectors: Matrix,
}

impl Matrix {
    /// Zero-initialised matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major data
    pub fn from_data(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { rows, cols, data }
    }

    /// Square matrix from fixed-size rows
    pub fn from_rows<const N: usize>(rows: &[[f64; N]; N]) -> Self {
        Self {
            rows: N,
            cols: N,
            data: rows.iter().flat_map(|r| r.iter().copied()).collect(),
        }
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, val: f64) {
        self.data[r * self.cols + c] = val;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t.set(c, r, self.get(r, c));
            }
        }
        t
    }

    pub fn multiply(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::new(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    acc += self.get(r, k) * other.get(k, c);
                }
                out.set(r, c, acc);
            }
        }
        out
    }

    /// Matrix-vector product `M·x`
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols, x.len());
        (0..self.rows)
            .map(|r| (0..self.cols).map(|c| self.get(r, c) * x[c]).sum())
            .collect()
    }
}

/// Eigen-decomposition of a real symmetric matrix by classical Jacobi rotations.
pub fn symmetric_eigen(mat: &Matrix) -> EigenResult {
    let n = mat.rows();
    debug_assert_eq!(n, mat.cols());

    let mut a = mat.clone();
    let mut v = Matrix::identity(n);
    if n < 2 {
        return EigenResult {
            eigenvalues: (0..n).map(|i| a.get(i, i)).collect(),
            eigenvectors: v,
        };
    }

    let max_iter = 100 * n * n;
    let tol = 1e-12;

    for _ in 0..max_iter {
        // Largest off-diagonal element
        let (mut p, mut q, mut max_off) = (0, 1, 0.0_f64);
        for i in 0..n {
            for j in (i + 1)..n {
                let val = a.get(i, j).abs();
                if val > max_off {
                    max_off = val;
                    p = i;
                    q = j;
                }
            }
        }
        if max_off < tol {
            break;
        }

        let app = a.get(p, p);
        let aqq = a.get(q, q);
        let apq = a.get(p, q);
        let theta = if (app - aqq).abs() < 1e-30 {
            std::f64::consts::FRAC_PI_4
        } else {
            0.5 * (2.0 * apq / (app - aqq)).atan()
        };
        let (s, c) = theta.sin_cos();

        // A' = Gᵀ A G, rows then columns
        for i in 0..n {
            let (ap, aq) = (a.get(p, i), a.get(q, i));
            a.set(p, i, c * ap + s * aq);
            a.set(q, i, -s * ap + c * aq);
        }
        for i in 0..n {
            let (ap, aq) = (a.get(i, p), a.get(i, q));
            a.set(i, p, c * ap + s * aq);
            a.set(i, q, -s * ap + c * aq);
        }
        for i in 0..n {
            let (vp, vq) = (v.get(i, p), v.get(i, q));
            v.set(i, p, c * vp + s * vq);
            v.set(i, q, -s * vp + c * vq);
        }
    }

    EigenResult {
        eigenvalues: (0..n).map(|i| a.get(i, i)).collect(),
        eigenvectors: v,
    }
}

/// Principal square root `V·diag(√λ)·Vᵀ` of a symmetric matrix.
///
/// Negative eigenvalues (tables that are not quite positive semi-definite)
/// are clamped to zero.
pub fn sqrt_psd(mat: &Matrix) -> Matrix {
    let eig = symmetric_eigen(mat);
    let n = mat.rows();
    let v = &eig.eigenvectors;
    let roots: Vec<f64> = eig.eigenvalues.iter().map(|&l| l.max(0.0).sqrt()).collect();

    let mut out = Matrix::new(n, n);
    for r in 0..n {
        for c in r..n {
            let val: f64 = (0..n).map(|k| v.get(r, k) * roots[k] * v.get(c, k)).sum();
            out.set(r, c, val);
            out.set(c, r, val);
        }
    }
    out
}
