//! Weighted least squares solver.
//!
//! Used to fit linearised timing-model offsets to the combined residuals:
//!
//! ```text
//! minimize Σ w_i (r_i - M_i δ)^2
//! ```
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and an ordinary least squares problem is
//!   solved with SVD (tall, possibly rank-deficient systems).
//! - Callers are expected to normalise design-matrix columns first; timing
//!   model columns span many orders of magnitude.

use nalgebra::{DMatrix, DVector};

/// Solution of a least squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub beta: DVector<f64>,
    /// Diagonal of `(XᵀX)⁻¹`, i.e. the coefficient variances for unit-variance data.
    pub variances: DVector<f64>,
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<LeastSquares> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                let variances = svd_variances(&svd, tol)?;
                return Some(LeastSquares { beta, variances });
            }
        }
    }

    None
}

/// Weighted variant: rows are scaled by `sqrt(w_i)` before solving.
///
/// Returns `None` on shape mismatch, non-positive weights, or a failed solve.
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &DVector<f64>,
) -> Option<LeastSquares> {
    if x.nrows() != y.len() || y.len() != w.len() {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let sw = w.map(f64::sqrt);
    let mut xw = x.clone();
    for (i, mut row) in xw.row_iter_mut().enumerate() {
        row *= sw[i];
    }
    let yw = y.component_mul(&sw);
    solve_least_squares(&xw, &yw)
}

fn svd_variances(svd: &nalgebra::SVD<f64, nalgebra::Dyn, nalgebra::Dyn>, tol: f64) -> Option<DVector<f64>> {
    let v_t = svd.v_t.as_ref()?;
    let ncols = v_t.ncols();
    let mut out = DVector::<f64>::zeros(ncols);
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s <= tol {
            continue;
        }
        let inv_s2 = 1.0 / (s * s);
        for j in 0..ncols {
            out[j] += v_t[(k, j)] * v_t[(k, j)] * inv_s2;
        }
    }
    Some(out)
}
