//! The capability set shared by all built signals.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::signals::parameter::{ParamSpec, ParamValues};

/// How a signal enters the likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalType {
    /// Diagonal noise covariance (`get_ndiag`).
    WhiteNoise,
    /// Linear basis with a Gaussian coefficient prior (`get_basis`, `get_phi`).
    Basis,
}

impl SignalType {
    pub fn label(self) -> &'static str {
        match self {
            SignalType::WhiteNoise => "white_noise",
            SignalType::Basis => "basis",
        }
    }
}

/// A model component bound to one pulsar.
///
/// Methods that do not apply to a signal type return `Ok(None)`.
pub trait Signal: std::fmt::Debug + Send + Sync {
    /// Unique id, `{psr}_{signal id}`.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn signal_name(&self) -> &str;

    fn signal_type(&self) -> SignalType;

    /// Free (non-constant) parameters.
    fn params(&self) -> &[ParamSpec];

    fn param_names(&self) -> Vec<String> {
        self.params().iter().map(|p| p.name.clone()).collect()
    }

    /// Length-2N white-noise variances.
    fn get_ndiag(&self, _params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        Ok(None)
    }

    /// `(2N × K)` basis matrix.
    fn get_basis(&self, _params: &ParamValues) -> Result<Option<DMatrix<f64>>, AppError> {
        Ok(None)
    }

    /// Length-K prior variances of the basis coefficients.
    fn get_phi(&self, _params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        Ok(None)
    }

    /// Inverse prior variances.
    fn get_phiinv(&self, params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        Ok(self.get_phi(params)?.map(|phi| phi.map(|v| 1.0 / v)))
    }
}
