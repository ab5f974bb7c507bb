//! Interleaved timing + DM dataset for wideband TOAs.
//!
//! Every wideband array has length 2N: entries `[0, N)` belong to the TOA
//! stream and entries `[N, 2N)` to the DM stream, with entry `N + i` describing
//! the same TOA as entry `i`. The combined permutation is the single-stream
//! sort order followed by the same order shifted by N, so after reordering the
//! first half is still the timing block and the second half the DM block, and
//! the two sub-records of a TOA stay exactly N positions apart.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::ToaSet;
use crate::error::AppError;
use crate::models::TimingModel;
use crate::pulsar::base::{Pulsar, PulsarOptions, permute};

#[derive(Debug, Clone)]
pub struct WidebandPulsar {
    base: Pulsar,
    dms: Vec<f64>,
    dm_errors: Vec<f64>,
    residuals: DVector<f64>,
    design_matrix: DMatrix<f64>,
    fit_params: Vec<String>,
    isort: Vec<usize>,
    toas: Vec<f64>,
    freqs: Vec<f64>,
}

impl WidebandPulsar {
    /// Build the wideband view of `toas` under `model`.
    ///
    /// Fails with a precondition error when the TOAs do not all carry a DM
    /// measurement.
    pub fn new(toas: &ToaSet, model: &dyn TimingModel, opts: PulsarOptions) -> Result<Self, AppError> {
        if !toas.is_wideband() {
            return Err(AppError::precondition(format!(
                "The TOAs are not wideband! ({}: every TOA needs a DM value and DM uncertainty)",
                toas.name
            )));
        }

        let base = Pulsar::new(toas, opts);
        let n = base.len();

        let dms = toas
            .dms()
            .ok_or_else(|| AppError::precondition("The TOAs are not wideband!"))?;
        let dm_errors = toas
            .dm_errors()
            .ok_or_else(|| AppError::precondition("The TOAs are not wideband!"))?;

        let residuals = model.wideband_residuals(toas)?;
        if residuals.len() != 2 * n {
            return Err(AppError::numeric(format!(
                "Timing model returned {} wideband residuals for {n} TOAs (expected {}).",
                residuals.len(),
                2 * n
            )));
        }

        let (design_matrix, fit_params) = model.wideband_design_matrix(toas)?;
        if design_matrix.nrows() != 2 * n || design_matrix.ncols() != fit_params.len() {
            return Err(AppError::numeric(format!(
                "Timing model returned a {}x{} design matrix with {} labels for {n} TOAs.",
                design_matrix.nrows(),
                design_matrix.ncols(),
                fit_params.len()
            )));
        }

        let isort = combined_permutation(base.isort());

        let mut wb_toas = Vec::with_capacity(2 * n);
        wb_toas.extend_from_slice(base.raw_toas());
        wb_toas.extend_from_slice(base.raw_toas());

        let mut wb_freqs = Vec::with_capacity(2 * n);
        wb_freqs.extend_from_slice(base.raw_freqs());
        wb_freqs.extend_from_slice(base.raw_freqs());

        debug!(
            psr = base.name(),
            ntoa = n,
            npar = fit_params.len(),
            sorted = opts.sort,
            "built wideband dataset"
        );

        Ok(Self {
            base,
            dms,
            dm_errors,
            residuals,
            design_matrix,
            fit_params,
            isort,
            toas: wb_toas,
            freqs: wb_freqs,
        })
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Number of underlying TOAs (N).
    pub fn ntoa(&self) -> usize {
        self.base.len()
    }

    /// Combined permutation (length 2N): base order, then base order + N.
    pub fn permutation(&self) -> &[usize] {
        &self.isort
    }

    /// Duplicated TOA epochs (s) before reordering.
    pub fn raw_combined_toas(&self) -> &[f64] {
        &self.toas
    }

    /// Length-2N TOA epochs (s) in combined order.
    pub fn combined_toas(&self) -> Vec<f64> {
        permute(&self.toas, &self.isort)
    }

    /// Length-2N observing frequencies (MHz) in combined order.
    pub fn combined_freqs(&self) -> Vec<f64> {
        permute(&self.freqs, &self.isort)
    }

    /// Length-2N residuals in combined order: timing (s) then DM (pc cm⁻³).
    pub fn combined_residuals(&self) -> DVector<f64> {
        DVector::from_iterator(self.isort.len(), self.isort.iter().map(|&i| self.residuals[i]))
    }

    /// `(2N × P)` design matrix with rows in combined order.
    pub fn combined_design_matrix(&self) -> DMatrix<f64> {
        self.design_matrix.select_rows(self.isort.iter())
    }

    /// Column labels of the design matrix.
    pub fn fit_params(&self) -> &[String] {
        &self.fit_params
    }

    /// TOA uncertainties (s), length N, in base sort order.
    pub fn toa_uncertainties(&self) -> Vec<f64> {
        self.base.toaerrs()
    }

    /// DM uncertainties (pc cm⁻³), length N, in input order.
    pub fn dm_uncertainties(&self) -> &[f64] {
        &self.dm_errors
    }

    /// DM uncertainties (pc cm⁻³), length N, in base sort order.
    ///
    /// This pairs element-wise with `toa_uncertainties()` and with the DM
    /// block of `combined_residuals()`.
    pub fn sorted_dm_uncertainties(&self) -> Vec<f64> {
        permute(&self.dm_errors, self.base.isort())
    }

    /// Measured DMs (pc cm⁻³), length N, in input order.
    pub fn dms(&self) -> &[f64] {
        &self.dms
    }

    /// Backend flags, length N, in base sort order.
    pub fn backends(&self) -> Vec<String> {
        self.base.backends()
    }
}

/// `isort ++ (isort + N)`.
///
/// The single-stream order is reused for the DM half rather than sorting the
/// 2N entries by epoch, which keeps each TOA's timing and DM entries paired.
pub fn combined_permutation(isort: &[usize]) -> Vec<usize> {
    let n = isort.len();
    isort.iter().copied().chain(isort.iter().map(|&i| i + n)).collect()
}
