//! Shared domain types.
//!
//! TOA records are kept close to what a `.tim`-derived CSV provides; unit
//! conversion happens once during ingest so everything downstream works in
//! seconds, MHz and pc cm⁻³.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::units::{DEFAULT_FREF_MHZ, mjd_to_seconds};

/// A single time-of-arrival measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ToaRecord {
    /// Arrival epoch (MJD).
    pub mjd: f64,
    /// Observing frequency (MHz).
    pub freq_mhz: f64,
    /// TOA uncertainty (s).
    pub toa_err: f64,
    /// Timing residual relative to the current ephemeris (s).
    pub residual: f64,
    /// Wideband DM measurement (pc cm⁻³), if present.
    pub dm: Option<f64>,
    /// Wideband DM uncertainty (pc cm⁻³), if present.
    pub dm_err: Option<f64>,
    /// Backend / receiver flag, used by per-backend selections.
    pub backend: String,
}

/// An ordered stream of TOAs for one pulsar, in input order.
#[derive(Debug, Clone)]
pub struct ToaSet {
    pub name: String,
    pub records: Vec<ToaRecord>,
}

impl ToaSet {
    pub fn new(name: impl Into<String>, records: Vec<ToaRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if every TOA carries a DM measurement and its uncertainty.
    pub fn is_wideband(&self) -> bool {
        !self.records.is_empty()
            && self
                .records
                .iter()
                .all(|r| r.dm.is_some() && r.dm_err.is_some())
    }

    /// TOA epochs in seconds.
    pub fn toas(&self) -> Vec<f64> {
        self.records.iter().map(|r| mjd_to_seconds(r.mjd)).collect()
    }

    pub fn mjds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.mjd).collect()
    }

    pub fn toa_errors(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.toa_err).collect()
    }

    pub fn freqs(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.freq_mhz).collect()
    }

    pub fn residuals(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.residual).collect()
    }

    pub fn backends(&self) -> Vec<String> {
        self.records.iter().map(|r| r.backend.clone()).collect()
    }

    /// Wideband DM values, or `None` if any TOA lacks one.
    pub fn dms(&self) -> Option<Vec<f64>> {
        self.records.iter().map(|r| r.dm).collect()
    }

    /// Wideband DM uncertainties, or `None` if any TOA lacks one.
    pub fn dm_errors(&self) -> Option<Vec<f64>> {
        self.records.iter().map(|r| r.dm_err).collect()
    }
}

fn default_spin_terms() -> usize {
    2
}

fn default_true() -> bool {
    true
}

/// On-disk timing model (JSON).
///
/// Parameters are the usual linearised set: an overall offset, spin frequency
/// derivatives (`F0`, `F1`, ...) and a DM Taylor series (`DM`, `DM1`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Pulsar name; overrides the TOA file stem when present.
    #[serde(default)]
    pub psr: Option<String>,
    /// Spin frequency (Hz).
    pub f0: f64,
    /// Spin epoch (MJD).
    pub pepoch_mjd: f64,
    /// Number of spin terms fitted (1 = F0, 2 = F0 + F1, ...).
    #[serde(default = "default_spin_terms")]
    pub spin_terms: usize,
    /// Fit an overall phase offset.
    #[serde(default = "default_true")]
    pub fit_offset: bool,
    /// Reference DM (pc cm⁻³).
    pub dm: f64,
    /// DM epoch (MJD); defaults to `pepoch_mjd`.
    #[serde(default)]
    pub dmepoch_mjd: Option<f64>,
    /// DM derivatives `DM1, DM2, ...` (pc cm⁻³ yr⁻ᵏ).
    #[serde(default)]
    pub dm_derivs: Vec<f64>,
    /// Subtract the weighted mean from the timing residuals.
    #[serde(default = "default_true")]
    pub subtract_mean: bool,
}

/// How measurement-noise parameters are split across the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelectionKind {
    /// One parameter set for all TOAs.
    None,
    /// One parameter set per backend flag.
    Backend,
}

/// One pulsar to load: TOA CSV plus model JSON.
#[derive(Debug, Clone)]
pub struct PulsarInput {
    pub tim: PathBuf,
    pub model: PathBuf,
}

/// Fixed values used when evaluating the wideband white-noise diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSettings {
    pub efac: f64,
    pub log10_t2equad: f64,
    pub dmefac: f64,
    pub log10_dmequad: f64,
    pub selection: SelectionKind,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            efac: 1.0,
            log10_t2equad: -8.0,
            dmefac: 1.0,
            log10_dmequad: -8.0,
            selection: SelectionKind::None,
        }
    }
}

/// Fourier basis settings shared by the red-noise and DM-noise bases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourierSettings {
    pub nmodes: usize,
    /// Basis time span (s); defaults to the data span.
    pub tspan: Option<f64>,
    pub fref_mhz: f64,
    /// Fixed power-law amplitude; free (uniform prior) when unset.
    pub log10_a: Option<f64>,
    /// Fixed power-law index; free (uniform prior) when unset.
    pub gamma: Option<f64>,
    /// Seed for drawing free GP parameters from their priors.
    pub seed: u64,
}

impl Default for FourierSettings {
    fn default() -> Self {
        Self {
            nmodes: 30,
            tspan: None,
            fref_mhz: DEFAULT_FREF_MHZ,
            log10_a: None,
            gamma: None,
            seed: 42,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub inputs: Vec<PulsarInput>,
    pub sort: bool,
    pub noise: NoiseSettings,
    pub fourier: FourierSettings,
}
