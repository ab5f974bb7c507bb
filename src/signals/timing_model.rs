//! Marginalised linear timing model for wideband data.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::AppError;
use crate::math::{TimingBasisOptions, timing_model_basis, tm_prior};
use crate::pulsar::WidebandPulsar;
use crate::signals::parameter::{ParamSpec, ParamValues, param_name};
use crate::signals::signal::{Signal, SignalType};

/// Factory for the marginalised timing-model basis signal.
///
/// The basis is the combined design matrix with normalised columns (no SVD,
/// no excluded columns unless configured) and an effectively infinite prior.
#[derive(Debug, Clone)]
pub struct WidebandTimingModel {
    pub name: String,
    pub basis: TimingBasisOptions,
}

impl Default for WidebandTimingModel {
    fn default() -> Self {
        Self {
            name: "linear_wideband_timing_model".to_string(),
            basis: TimingBasisOptions::default(),
        }
    }
}

impl WidebandTimingModel {
    pub fn build(&self, psr: &WidebandPulsar) -> Result<TimingModelSignal, AppError> {
        let (basis, weights) = timing_model_basis(&psr.combined_design_matrix(), &self.basis)?;
        let phi = tm_prior(&weights);
        let name = param_name(&[psr.name(), self.name.as_str()]);
        debug!(signal = %name, rows = basis.nrows(), cols = basis.ncols(), "built timing model basis");
        Ok(TimingModelSignal { name, basis, phi })
    }
}

/// Zero-parameter basis signal for the timing model.
#[derive(Debug, Clone)]
pub struct TimingModelSignal {
    name: String,
    basis: DMatrix<f64>,
    phi: DVector<f64>,
}

impl Signal for TimingModelSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn signal_name(&self) -> &str {
        "linear wideband timing model"
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Basis
    }

    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    fn get_basis(&self, _params: &ParamValues) -> Result<Option<DMatrix<f64>>, AppError> {
        Ok(Some(self.basis.clone()))
    }

    fn get_phi(&self, _params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        Ok(Some(self.phi.clone()))
    }
}
