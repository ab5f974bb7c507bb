//! Timing-model basis construction.
//!
//! A marginalised timing model is represented as a Gaussian process whose
//! basis is the design matrix (or an orthonormal/normalised version of it) and
//! whose prior variance is effectively infinite (`1e40`).
//!
//! Numerical notes:
//! - Design-matrix columns span many orders of magnitude (offsets in seconds,
//!   spin-down terms scaled by `dt²`), so the basis is normalised column-wise.
//! - Columns with zero norm are left as zeros rather than divided by zero.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Prior variance assigned to every timing-model basis coefficient.
pub const TM_PRIOR_VARIANCE: f64 = 1e40;

/// How the timing-model basis is derived from the design matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingBasisOptions {
    /// Use the left singular vectors of the design matrix.
    pub use_svd: bool,
    /// Normalise design-matrix columns to unit length (ignored with `use_svd`).
    pub normed: bool,
    /// Design-matrix columns to drop before building the basis.
    pub idx_exclude: Vec<usize>,
}

impl Default for TimingBasisOptions {
    fn default() -> Self {
        Self {
            use_svd: false,
            normed: true,
            idx_exclude: Vec::new(),
        }
    }
}

/// Euclidean norm of every column.
pub fn column_norms(m: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_iterator(m.ncols(), m.column_iter().map(|c| c.norm()))
}

/// Columns scaled to unit norm, with unit prior weights.
pub fn normed_tm_basis(m: &DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let norms = column_norms(m);
    let mut out = m.clone();
    for (j, mut col) in out.column_iter_mut().enumerate() {
        if norms[j] == 0.0 {
            col.fill(0.0);
        } else {
            col /= norms[j];
        }
    }
    (out, DVector::from_element(m.ncols(), 1.0))
}

/// Left singular vectors of the design matrix, with unit prior weights.
pub fn svd_tm_basis(m: &DMatrix<f64>) -> Result<(DMatrix<f64>, DVector<f64>), AppError> {
    let svd = m.clone().svd(true, false);
    let u = svd
        .u
        .ok_or_else(|| AppError::numeric("SVD of the design matrix did not produce U."))?;
    let k = svd.singular_values.len();
    Ok((u, DVector::from_element(k, 1.0)))
}

/// Drop the listed columns (out-of-range indices are ignored).
pub fn exclude_columns(m: &DMatrix<f64>, idx_exclude: &[usize]) -> DMatrix<f64> {
    if idx_exclude.is_empty() {
        return m.clone();
    }
    let keep: Vec<usize> = (0..m.ncols()).filter(|j| !idx_exclude.contains(j)).collect();
    m.select_columns(keep.iter())
}

/// Basis matrix and prior weights for a marginalised timing model.
pub fn timing_model_basis(
    m: &DMatrix<f64>,
    opts: &TimingBasisOptions,
) -> Result<(DMatrix<f64>, DVector<f64>), AppError> {
    let m = exclude_columns(m, &opts.idx_exclude);
    if opts.use_svd {
        svd_tm_basis(&m)
    } else if opts.normed {
        Ok(normed_tm_basis(&m))
    } else {
        let k = m.ncols();
        Ok((m, DVector::from_element(k, 1.0)))
    }
}

/// Prior variances `phi` for timing-model coefficients.
pub fn tm_prior(weights: &DVector<f64>) -> DVector<f64> {
    weights * TM_PRIOR_VARIANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normed_basis_has_unit_columns_and_zero_for_empty() {
        let m = DMatrix::from_row_slice(3, 3, &[3.0, 0.0, 1e10, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let (b, w) = normed_tm_basis(&m);
        assert!((b.column(0).norm() - 1.0).abs() < 1e-12);
        assert!((b[(0, 0)] - 0.6).abs() < 1e-12);
        assert!(b.column(1).iter().all(|v| *v == 0.0));
        assert!((b[(0, 2)] - 1.0).abs() < 1e-12);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn svd_basis_is_orthonormal() {
        let m = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let (u, w) = svd_tm_basis(&m).unwrap();
        assert_eq!(u.shape(), (4, 2));
        assert_eq!(w.len(), 2);
        let gram = u.transpose() * &u;
        assert!((gram - DMatrix::<f64>::identity(2, 2)).norm() < 1e-10);
    }

    #[test]
    fn excluded_columns_are_removed() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let opts = TimingBasisOptions {
            use_svd: false,
            normed: false,
            idx_exclude: vec![1],
        };
        let (b, w) = timing_model_basis(&m, &opts).unwrap();
        assert_eq!(b, DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 4.0, 6.0]));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn tm_prior_is_effectively_flat() {
        let phi = tm_prior(&DVector::from_element(2, 1.0));
        assert!(phi.iter().all(|v| *v == 1e40));
    }
}
