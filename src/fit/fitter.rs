//! Weighted least-squares fit of the combined residuals.
//!
//! Given:
//! - combined residuals `r` (timing block then DM block)
//! - the combined design matrix `M`
//! - the wideband white-noise diagonal `N`
//!
//! we solve `min Σ (r_i - M_i δ)² / N_i` for the parameter offsets `δ`.
//! Columns are scaled by their weighted norms before solving and the scaling
//! is undone afterwards.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::math::{column_norms, solve_weighted_least_squares};
use crate::pulsar::WidebandPulsar;

/// Fitted offset of one timing-model parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedParam {
    pub name: String,
    pub offset: f64,
    pub uncertainty: f64,
}

/// Fit output for a single pulsar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidebandFit {
    pub psr: String,
    pub params: Vec<FittedParam>,
    pub chi2: f64,
    pub dof: usize,
    pub chi2_reduced: f64,
    /// Weighted RMS of the post-fit timing residuals (s).
    pub rms_timing: f64,
    /// Weighted RMS of the post-fit DM residuals (pc cm⁻³).
    pub rms_dm: f64,
}

/// Fit parameter offsets to the wideband residuals of `psr`.
///
/// `ndiag` must be the length-2N white-noise diagonal in combined order.
pub fn fit_wideband(psr: &WidebandPulsar, ndiag: &DVector<f64>) -> Result<WidebandFit, AppError> {
    let m = psr.combined_design_matrix();
    let r = psr.combined_residuals();
    let n = psr.ntoa();

    if ndiag.len() != r.len() {
        return Err(AppError::numeric(format!(
            "Noise diagonal has {} entries, expected {}.",
            ndiag.len(),
            r.len()
        )));
    }
    if ndiag.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
        return Err(AppError::numeric("Noise variances must be finite and > 0."));
    }

    let w = ndiag.map(|v| 1.0 / v);
    let sw = w.map(f64::sqrt);

    let mut weighted = m.clone();
    for (i, mut row) in weighted.row_iter_mut().enumerate() {
        row *= sw[i];
    }
    let norms = column_norms(&weighted);

    let mut scaled = m.clone();
    for (j, mut col) in scaled.column_iter_mut().enumerate() {
        if norms[j] > 0.0 {
            col /= norms[j];
        } else {
            warn!(psr = psr.name(), param = %psr.fit_params()[j], "design matrix column is all zero");
        }
    }

    let ls = solve_weighted_least_squares(&scaled, &r, &w).ok_or_else(|| {
        AppError::numeric(format!("Wideband least-squares fit failed for {}.", psr.name()))
    })?;

    let mut delta = DVector::<f64>::zeros(m.ncols());
    let params = psr
        .fit_params()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let (offset, uncertainty) = if norms[j] > 0.0 {
                (ls.beta[j] / norms[j], ls.variances[j].sqrt() / norms[j])
            } else {
                (0.0, f64::NAN)
            };
            delta[j] = offset;
            FittedParam {
                name: name.clone(),
                offset,
                uncertainty,
            }
        })
        .collect();

    let post = &r - &m * &delta;
    let chi2: f64 = post.iter().zip(w.iter()).map(|(x, wi)| x * x * wi).sum();
    let dof = r.len().saturating_sub(m.ncols());
    let chi2_reduced = if dof > 0 { chi2 / dof as f64 } else { f64::NAN };

    let block_rms = |range: std::ops::Range<usize>| {
        let (mut num, mut den) = (0.0, 0.0);
        for i in range {
            num += w[i] * post[i] * post[i];
            den += w[i];
        }
        if den > 0.0 { (num / den).sqrt() } else { f64::NAN }
    };
    let rms_timing = block_rms(0..n);
    let rms_dm = block_rms(n..2 * n);

    debug!(psr = psr.name(), chi2, dof, "wideband fit complete");

    Ok(WidebandFit {
        psr: psr.name().to_string(),
        params,
        chi2,
        dof,
        chi2_reduced,
        rms_timing,
        rms_dm,
    })
}
