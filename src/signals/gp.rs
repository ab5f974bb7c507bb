//! Red-noise and DM-noise Gaussian processes on wideband data.
//!
//! Both share the sine/cosine frequency grid; they differ in how the basis
//! enters the DM block (see `math::fourier`).

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::DEFAULT_FREF_MHZ;
use crate::error::AppError;
use crate::math::{FourierBasis, FourierOptions, fourier_design_matrix_dm_wideband, fourier_design_matrix_red_wideband};
use crate::pulsar::WidebandPulsar;
use crate::signals::parameter::{ParamSpec, ParamValues, Parameter, param_name};
use crate::signals::signal::{Signal, SignalType};
use crate::signals::spectrum::powerlaw;

/// Which wideband Fourier adapter to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FourierKind {
    /// Achromatic red noise; no effect on measured DMs.
    RedNoise,
    /// Chromatic DM variations referenced to `fref_mhz`.
    DmNoise { fref_mhz: f64 },
}

impl FourierKind {
    pub fn dm_noise() -> Self {
        FourierKind::DmNoise {
            fref_mhz: DEFAULT_FREF_MHZ,
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            FourierKind::RedNoise => "red_noise",
            FourierKind::DmNoise { .. } => "dm_gp",
        }
    }
}

/// Factory for a Fourier-basis GP with a power-law spectrum.
#[derive(Debug, Clone)]
pub struct FourierBasisGp {
    pub kind: FourierKind,
    pub fourier: FourierOptions,
    pub log10_a: Parameter,
    pub gamma: Parameter,
    /// Signal id; defaults to `red_noise` / `dm_gp`.
    pub name: Option<String>,
}

impl FourierBasisGp {
    pub fn red_noise(fourier: FourierOptions) -> Self {
        Self {
            kind: FourierKind::RedNoise,
            fourier,
            log10_a: Parameter::uniform(-20.0, -11.0),
            gamma: Parameter::uniform(0.0, 7.0),
            name: None,
        }
    }

    pub fn dm_noise(fourier: FourierOptions) -> Self {
        Self {
            kind: FourierKind::dm_noise(),
            ..Self::red_noise(fourier)
        }
    }

    pub fn build(&self, psr: &WidebandPulsar) -> Result<FourierGpSignal, AppError> {
        let toas = psr.combined_toas();
        let basis = match self.kind {
            FourierKind::RedNoise => fourier_design_matrix_red_wideband(&toas, &self.fourier)?,
            FourierKind::DmNoise { fref_mhz } => {
                fourier_design_matrix_dm_wideband(&toas, &psr.combined_freqs(), Some(fref_mhz), &self.fourier)?
            }
        };

        let signal_id = self.name.as_deref().unwrap_or(self.kind.default_name());
        let name = param_name(&[psr.name(), signal_id]);
        let log10_a = ParamSpec::new(format!("{name}_log10_A"), self.log10_a);
        let gamma = ParamSpec::new(format!("{name}_gamma"), self.gamma);
        let params = [&log10_a, &gamma]
            .into_iter()
            .filter(|p| !p.prior.is_constant())
            .cloned()
            .collect();

        debug!(signal = %name, rows = basis.matrix.nrows(), cols = basis.matrix.ncols(), "built Fourier basis");

        Ok(FourierGpSignal {
            name,
            kind: self.kind,
            basis,
            log10_a,
            gamma,
            params,
        })
    }
}

/// Built Fourier-basis GP signal.
#[derive(Debug, Clone)]
pub struct FourierGpSignal {
    name: String,
    kind: FourierKind,
    basis: FourierBasis,
    log10_a: ParamSpec,
    gamma: ParamSpec,
    params: Vec<ParamSpec>,
}

impl FourierGpSignal {
    /// Frequency (Hz) of each basis column.
    pub fn frequencies(&self) -> &DVector<f64> {
        &self.basis.freqs
    }
}

impl Signal for FourierGpSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn signal_name(&self) -> &str {
        match self.kind {
            FourierKind::RedNoise => "red noise",
            FourierKind::DmNoise { .. } => "dm noise",
        }
    }

    fn signal_type(&self) -> SignalType {
        SignalType::Basis
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn get_basis(&self, _params: &ParamValues) -> Result<Option<DMatrix<f64>>, AppError> {
        Ok(Some(self.basis.matrix.clone()))
    }

    fn get_phi(&self, params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        let log10_a = self.log10_a.value(params)?;
        let gamma = self.gamma.value(params)?;
        Ok(Some(powerlaw(&self.basis.freqs, log10_a, gamma)))
    }
}
