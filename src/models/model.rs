//! Timing-model evaluation for wideband data.
//!
//! Every wideband quantity comes in two blocks of length N laid out back to
//! back: TOA rows first (seconds), then DM rows (pc cm⁻³). The design matrix
//! follows the same layout, so row `i` and row `N + i` both describe TOA `i`.

use nalgebra::{DMatrix, DVector};

use crate::domain::{DM_CONST, ModelFile, ToaSet, YEAR_SECONDS, mjd_to_seconds};
use crate::error::AppError;

/// Residual and design-matrix provider for a wideband TOA set.
pub trait TimingModel {
    /// Labels of the fitted parameters, in design-matrix column order.
    fn param_names(&self) -> Vec<String>;

    /// Length-2N residuals: timing residuals (s) then DM residuals (pc cm⁻³),
    /// both in the input order of `toas`.
    fn wideband_residuals(&self, toas: &ToaSet) -> Result<DVector<f64>, AppError>;

    /// `(2N × P)` design matrix (timing rows then DM rows) and its column labels.
    fn wideband_design_matrix(&self, toas: &ToaSet) -> Result<(DMatrix<f64>, Vec<String>), AppError>;
}

/// Linearised spin + DM-polynomial timing model.
///
/// Columns, in order:
/// - `Offset` (if enabled): a constant time offset; no effect on DM
/// - `F0`, `F1`, ...: spin-frequency derivatives; no effect on DM
/// - `DM`, `DM1`, ...: DM Taylor coefficients; affect both blocks
#[derive(Debug, Clone)]
pub struct LinearTimingModel {
    f0: f64,
    pepoch: f64,
    spin_terms: usize,
    fit_offset: bool,
    dm: f64,
    dmepoch: f64,
    dm_derivs: Vec<f64>,
    subtract_mean: bool,
}

impl LinearTimingModel {
    pub fn from_file(file: &ModelFile) -> Result<Self, AppError> {
        if !(file.f0.is_finite() && file.f0 > 0.0) {
            return Err(AppError::input(format!(
                "Invalid F0 {} (must be finite and > 0).",
                file.f0
            )));
        }
        if !file.dm.is_finite() || file.dm_derivs.iter().any(|v| !v.is_finite()) {
            return Err(AppError::input("DM and its derivatives must be finite."));
        }
        let pepoch = mjd_to_seconds(file.pepoch_mjd);
        let dmepoch = file.dmepoch_mjd.map(mjd_to_seconds).unwrap_or(pepoch);
        Ok(Self {
            f0: file.f0,
            pepoch,
            spin_terms: file.spin_terms,
            fit_offset: file.fit_offset,
            dm: file.dm,
            dmepoch,
            dm_derivs: file.dm_derivs.clone(),
            subtract_mean: file.subtract_mean,
        })
    }

    /// Number of design-matrix columns.
    pub fn n_params(&self) -> usize {
        usize::from(self.fit_offset) + self.spin_terms + 1 + self.dm_derivs.len()
    }

    /// Model DM (pc cm⁻³) at epoch `t` (s).
    pub fn dm_at(&self, t: f64) -> f64 {
        let dt_yr = (t - self.dmepoch) / YEAR_SECONDS;
        let mut dm = self.dm;
        for (k, coeff) in self.dm_derivs.iter().enumerate() {
            dm += coeff * taylor_term(dt_yr, k + 1);
        }
        dm
    }

    fn fill_rows(&self, t: f64, freq_mhz: f64, toa_row: &mut [f64], dm_row: &mut [f64]) {
        let mut j = 0;
        if self.fit_offset {
            toa_row[j] = 1.0;
            dm_row[j] = 0.0;
            j += 1;
        }

        let dt = t - self.pepoch;
        for k in 0..self.spin_terms {
            // d(phase)/dF_k = dt^(k+1)/(k+1)!, converted to time via -1/F0.
            toa_row[j] = -taylor_term(dt, k + 1) / self.f0;
            dm_row[j] = 0.0;
            j += 1;
        }

        let delay_per_dm = DM_CONST / (freq_mhz * freq_mhz);
        let dt_yr = (t - self.dmepoch) / YEAR_SECONDS;
        for k in 0..=self.dm_derivs.len() {
            let d_dm = taylor_term(dt_yr, k);
            toa_row[j] = delay_per_dm * d_dm;
            dm_row[j] = d_dm;
            j += 1;
        }
    }
}

impl TimingModel for LinearTimingModel {
    fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_params());
        if self.fit_offset {
            names.push("Offset".to_string());
        }
        for k in 0..self.spin_terms {
            names.push(format!("F{k}"));
        }
        names.push("DM".to_string());
        for k in 1..=self.dm_derivs.len() {
            names.push(format!("DM{k}"));
        }
        names
    }

    fn wideband_residuals(&self, toas: &ToaSet) -> Result<DVector<f64>, AppError> {
        let dms = toas
            .dms()
            .ok_or_else(|| AppError::input("TOA set has no wideband DM measurements."))?;
        let n = toas.len();
        let t = toas.toas();

        let mut time_resids = toas.residuals();
        if self.subtract_mean {
            let weights: Vec<f64> = toas.toa_errors().iter().map(|e| 1.0 / (e * e)).collect();
            let wsum: f64 = weights.iter().sum();
            if wsum.is_finite() && wsum > 0.0 {
                let mean = time_resids.iter().zip(&weights).map(|(r, w)| r * w).sum::<f64>() / wsum;
                time_resids.iter_mut().for_each(|r| *r -= mean);
            }
        }

        let mut out = DVector::<f64>::zeros(2 * n);
        for i in 0..n {
            out[i] = time_resids[i];
            out[n + i] = dms[i] - self.dm_at(t[i]);
        }
        Ok(out)
    }

    fn wideband_design_matrix(&self, toas: &ToaSet) -> Result<(DMatrix<f64>, Vec<String>), AppError> {
        let n = toas.len();
        let p = self.n_params();
        let mut m = DMatrix::<f64>::zeros(2 * n, p);
        let mut toa_row = vec![0.0; p];
        let mut dm_row = vec![0.0; p];

        for (i, r) in toas.records.iter().enumerate() {
            if !(r.freq_mhz.is_finite() && r.freq_mhz > 0.0) {
                return Err(AppError::numeric(format!(
                    "TOA {i} has invalid frequency {} MHz.",
                    r.freq_mhz
                )));
            }
            self.fill_rows(mjd_to_seconds(r.mjd), r.freq_mhz, &mut toa_row, &mut dm_row);
            for j in 0..p {
                m[(i, j)] = toa_row[j];
                m[(n + i, j)] = dm_row[j];
            }
        }

        Ok((m, self.param_names()))
    }
}

/// `x^k / k!`
fn taylor_term(x: f64, k: usize) -> f64 {
    let mut term = 1.0;
    for i in 1..=k {
        term *= x / i as f64;
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToaRecord;

    fn model_file() -> ModelFile {
        ModelFile {
            psr: None,
            f0: 200.0,
            pepoch_mjd: 55000.0,
            spin_terms: 2,
            fit_offset: true,
            dm: 10.0,
            dmepoch_mjd: None,
            dm_derivs: vec![0.5],
            subtract_mean: false,
        }
    }

    fn toas() -> ToaSet {
        let records = (0..4)
            .map(|i| ToaRecord {
                mjd: 55000.0 + 100.0 * i as f64,
                freq_mhz: if i % 2 == 0 { 800.0 } else { 1400.0 },
                toa_err: 1e-6,
                residual: 1e-6 * i as f64,
                dm: Some(10.0 + 0.01 * i as f64),
                dm_err: Some(1e-4),
                backend: "B".to_string(),
            })
            .collect();
        ToaSet::new("J1234+5678", records)
    }

    #[test]
    fn param_names_follow_column_order() {
        let m = LinearTimingModel::from_file(&model_file()).unwrap();
        assert_eq!(m.param_names(), vec!["Offset", "F0", "F1", "DM", "DM1"]);
        assert_eq!(m.n_params(), 5);
    }

    #[test]
    fn design_matrix_has_two_blocks() {
        let m = LinearTimingModel::from_file(&model_file()).unwrap();
        let t = toas();
        let (dm, labels) = m.wideband_design_matrix(&t).unwrap();
        assert_eq!(dm.nrows(), 8);
        assert_eq!(dm.ncols(), labels.len());

        // Offset and spin columns do not touch the DM block.
        for i in 4..8 {
            for j in 0..3 {
                assert_eq!(dm[(i, j)], 0.0);
            }
            assert_eq!(dm[(i, 3)], 1.0);
        }
        // The DM column maps to a dispersive delay in the TOA block.
        assert!((dm[(0, 3)] - DM_CONST / (800.0 * 800.0)).abs() < 1e-15);
        assert!((dm[(1, 3)] - DM_CONST / (1400.0 * 1400.0)).abs() < 1e-15);
    }

    #[test]
    fn residuals_stack_timing_then_dm() {
        let m = LinearTimingModel::from_file(&model_file()).unwrap();
        let t = toas();
        let r = m.wideband_residuals(&t).unwrap();
        assert_eq!(r.len(), 8);
        assert!((r[2] - 2e-6).abs() < 1e-18);

        let expected = 10.03 - m.dm_at(mjd_to_seconds(55300.0));
        assert!((r[7] - expected).abs() < 1e-12);
    }

    #[test]
    fn subtract_mean_centres_timing_block() {
        let mut file = model_file();
        file.subtract_mean = true;
        let m = LinearTimingModel::from_file(&file).unwrap();
        let r = m.wideband_residuals(&toas()).unwrap();
        let mean: f64 = r.rows(0, 4).iter().sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-18);
    }

    #[test]
    fn rejects_non_positive_f0() {
        let mut file = model_file();
        file.f0 = 0.0;
        assert!(LinearTimingModel::from_file(&file).is_err());
    }
}
