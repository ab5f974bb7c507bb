//! EFAC/EQUAD + DMEFAC/DMEQUAD white noise for wideband data.
//!
//! Tempo/tempo2/PINT convention, applied separately to the two blocks:
//!
//! ```text
//! ndiag[i]   = efac²   (σ_toa[i]² + t2equad²)     t2equad = 10^log10_t2equad  (s)
//! ndiag[N+i] = dmefac² (σ_dm[i]²  + dmequad²)     dmequad = 10^log10_dmequad  (pc cm⁻³)
//! ```
//!
//! The diagonal is laid out in combined order (timing block then DM block),
//! i.e. it pairs element-wise with `WidebandPulsar::combined_residuals`.

use nalgebra::DVector;
use tracing::debug;

use crate::error::AppError;
use crate::pulsar::WidebandPulsar;
use crate::signals::parameter::{ParamSpec, ParamValues, Parameter, param_name};
use crate::signals::selection::Selection;
use crate::signals::signal::{Signal, SignalType};

/// Wideband white-noise variances for fixed parameter values.
///
/// `toaerrs` and `dmerrs` must have the same length N; the result has length 2N.
pub fn wideband_ndiag(
    toaerrs: &[f64],
    dmerrs: &[f64],
    efac: f64,
    log10_t2equad: f64,
    dmefac: f64,
    log10_dmequad: f64,
) -> DVector<f64> {
    debug_assert_eq!(toaerrs.len(), dmerrs.len(), "TOA and DM uncertainty counts differ");
    let n = toaerrs.len();
    let equad2 = 10f64.powf(2.0 * log10_t2equad);
    let dmequad2 = 10f64.powf(2.0 * log10_dmequad);

    let mut ndiag = DVector::<f64>::zeros(2 * n);
    for (i, (&t, &d)) in toaerrs.iter().zip(dmerrs).enumerate() {
        ndiag[i] = efac * efac * (t * t + equad2);
        ndiag[n + i] = dmefac * dmefac * (d * d + dmequad2);
    }
    ndiag
}

/// Factory for wideband measurement noise.
#[derive(Debug, Clone)]
pub struct WidebandMeasurementNoise {
    pub efac: Parameter,
    pub log10_t2equad: Parameter,
    pub dmefac: Parameter,
    pub log10_dmequad: Parameter,
    pub selection: Selection,
    /// Optional suffix for the signal id.
    pub name: String,
}

impl Default for WidebandMeasurementNoise {
    fn default() -> Self {
        Self {
            efac: Parameter::uniform(0.5, 1.5),
            log10_t2equad: Parameter::constant(-18.0),
            dmefac: Parameter::uniform(0.5, 1.5),
            log10_dmequad: Parameter::constant(-18.0),
            selection: Selection::NoSelection,
            name: String::new(),
        }
    }
}

impl WidebandMeasurementNoise {
    pub fn build(&self, psr: &WidebandPulsar) -> MeasurementNoiseSignal {
        let signal_id = param_name(&["wideband_measurement_noise", self.name.as_str()]);
        let name = param_name(&[psr.name(), signal_id.as_str()]);

        let subsets: Vec<NoiseSubset> = self
            .selection
            .masks(psr)
            .into_iter()
            .map(|(label, mask)| {
                let bind = |pname: &str, prior: Parameter| {
                    ParamSpec::new(param_name(&[psr.name(), label.as_str(), pname]), prior)
                };
                NoiseSubset {
                    efac: bind("efac", self.efac),
                    log10_t2equad: bind("log10_t2equad", self.log10_t2equad),
                    dmefac: bind("dmefac", self.dmefac),
                    log10_dmequad: bind("log10_dmequad", self.log10_dmequad),
                    mask,
                }
            })
            .collect();

        let params: Vec<ParamSpec> = subsets
            .iter()
            .flat_map(|s| [&s.efac, &s.log10_t2equad, &s.dmefac, &s.log10_dmequad])
            .filter(|p| !p.prior.is_constant())
            .cloned()
            .collect();

        debug!(signal = %name, subsets = subsets.len(), nparams = params.len(), "built measurement noise");

        MeasurementNoiseSignal {
            name,
            params,
            subsets,
            toaerrs: psr.toa_uncertainties(),
            dmerrs: psr.sorted_dm_uncertainties(),
        }
    }
}

#[derive(Debug, Clone)]
struct NoiseSubset {
    efac: ParamSpec,
    log10_t2equad: ParamSpec,
    dmefac: ParamSpec,
    log10_dmequad: ParamSpec,
    mask: Vec<bool>,
}

/// Built measurement-noise signal.
#[derive(Debug, Clone)]
pub struct MeasurementNoiseSignal {
    name: String,
    params: Vec<ParamSpec>,
    subsets: Vec<NoiseSubset>,
    toaerrs: Vec<f64>,
    dmerrs: Vec<f64>,
}

impl Signal for MeasurementNoiseSignal {
    fn name(&self) -> &str {
        &self.name
    }

    fn signal_name(&self) -> &str {
        "wideband_measurement_noise"
    }

    fn signal_type(&self) -> SignalType {
        SignalType::WhiteNoise
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn get_ndiag(&self, params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        let n = self.toaerrs.len();
        let mut out = DVector::<f64>::zeros(2 * n);
        for s in &self.subsets {
            let full = wideband_ndiag(
                &self.toaerrs,
                &self.dmerrs,
                s.efac.value(params)?,
                s.log10_t2equad.value(params)?,
                s.dmefac.value(params)?,
                s.log10_dmequad.value(params)?,
            );
            for (i, &selected) in s.mask.iter().enumerate() {
                if selected {
                    out[i] = full[i];
                    out[n + i] = full[n + i];
                }
            }
        }
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SimConfig, simulate_toas};
    use crate::models::LinearTimingModel;
    use crate::pulsar::PulsarOptions;

    fn pulsar() -> WidebandPulsar {
        let sim = simulate_toas(&SimConfig {
            ntoa: 12,
            backends: vec!["GUPPI".to_string(), "PUPPI".to_string()],
            ..SimConfig::default()
        })
        .unwrap();
        let model = LinearTimingModel::from_file(&sim.model).unwrap();
        WidebandPulsar::new(&sim.toas, &model, PulsarOptions::default()).unwrap()
    }

    #[test]
    fn ndiag_formula_matches_reference_values() {
        let nd = wideband_ndiag(&[2.0], &[0.5], 1.0, -8.0, 1.1, -4.5);
        assert_eq!(nd.len(), 2);
        assert!((nd[0] - 4.0).abs() < 1e-12);
        assert!((nd[1] - 1.21 * (0.25 + 1e-9)).abs() < 1e-15);
        assert!((nd[1] - 0.3025).abs() < 1e-8);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "uncertainty counts differ")]
    fn mismatched_uncertainty_lengths_are_caught() {
        wideband_ndiag(&[1.0, 2.0], &[0.5], 1.0, -8.0, 1.0, -4.5);
    }

    #[test]
    fn all_tunable_parameters_are_exposed() {
        let psr = pulsar();
        let wn = WidebandMeasurementNoise {
            log10_t2equad: Parameter::uniform(-8.0, -5.0),
            log10_dmequad: Parameter::uniform(-6.0, -3.0),
            ..WidebandMeasurementNoise::default()
        };
        let sig = wn.build(&psr);
        assert_eq!(sig.name(), format!("{}_wideband_measurement_noise", psr.name()));
        assert_eq!(sig.params().len(), 4);

        let values = ParamValues::from([
            (format!("{}_efac", psr.name()), 1.0),
            (format!("{}_log10_t2equad", psr.name()), -7.0),
            (format!("{}_dmefac", psr.name()), 1.1),
            (format!("{}_log10_dmequad", psr.name()), -4.5),
        ]);
        let nd = sig.get_ndiag(&values).unwrap().unwrap();
        assert_eq!(nd.len(), psr.combined_toas().len());
    }

    #[test]
    fn fixed_efacs_leave_only_equads_free() {
        let psr = pulsar();
        let wn = WidebandMeasurementNoise {
            efac: Parameter::constant(1.0),
            log10_t2equad: Parameter::uniform(-8.0, -5.0),
            dmefac: Parameter::constant(1.0),
            log10_dmequad: Parameter::uniform(-6.0, -3.0),
            ..WidebandMeasurementNoise::default()
        };
        let sig = wn.build(&psr);
        assert_eq!(
            sig.param_names(),
            vec![
                format!("{}_log10_t2equad", psr.name()),
                format!("{}_log10_dmequad", psr.name())
            ]
        );
    }

    #[test]
    fn ndiag_pairs_with_sorted_uncertainties() {
        let psr = pulsar();
        let wn = WidebandMeasurementNoise {
            efac: Parameter::constant(1.0),
            dmefac: Parameter::constant(2.0),
            ..WidebandMeasurementNoise::default()
        };
        let nd = wn.build(&psr).get_ndiag(&ParamValues::new()).unwrap().unwrap();
        let n = psr.ntoa();
        let toaerrs = psr.toa_uncertainties();
        let dmerrs = psr.sorted_dm_uncertainties();
        for i in 0..n {
            assert!((nd[i] / (toaerrs[i] * toaerrs[i]) - 1.0).abs() < 1e-9);
            assert!((nd[n + i] / (dmerrs[i] * dmerrs[i]) - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn backend_selection_splits_parameters() {
        let psr = pulsar();
        let wn = WidebandMeasurementNoise {
            selection: Selection::ByBackend,
            name: "wb".to_string(),
            ..WidebandMeasurementNoise::default()
        };
        let sig = wn.build(&psr);
        assert_eq!(sig.name(), format!("{}_wideband_measurement_noise_wb", psr.name()));
        assert_eq!(
            sig.param_names(),
            vec![
                format!("{}_GUPPI_efac", psr.name()),
                format!("{}_GUPPI_dmefac", psr.name()),
                format!("{}_PUPPI_efac", psr.name()),
                format!("{}_PUPPI_dmefac", psr.name()),
            ]
        );

        let mut values: ParamValues = sig.param_names().into_iter().map(|p| (p, 1.0)).collect();
        values.insert(format!("{}_PUPPI_efac", psr.name()), 3.0);
        let nd = sig.get_ndiag(&values).unwrap().unwrap();
        let backends = psr.backends();
        let toaerrs = psr.toa_uncertainties();
        for (i, b) in backends.iter().enumerate() {
            let scale = if b == "PUPPI" { 9.0 } else { 1.0 };
            assert!((nd[i] / (toaerrs[i] * toaerrs[i]) - scale).abs() < 1e-6);
        }
    }
}
