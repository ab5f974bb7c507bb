//! End-to-end checks of the wideband dataset and its signals.

use approx::assert_relative_eq;

use wideband_timing::app::pipeline::{build_signals, evaluate_signals, load_pulsar, run_fit, starting_values};
use wideband_timing::data::{SimConfig, simulate_toas};
use wideband_timing::domain::{DM_CONST, FourierSettings, NoiseSettings, PulsarInput, RunConfig};
use wideband_timing::error::ErrorKind;
use wideband_timing::io::{write_model_json, write_toas_csv};
use wideband_timing::math::FourierOptions;
use wideband_timing::models::LinearTimingModel;
use wideband_timing::pulsar::{PulsarOptions, WidebandPulsar};
use wideband_timing::signals::{
    FourierBasisGp, ParamValues, Signal, SignalType, WidebandMeasurementNoise, WidebandTimingModel,
};

fn simulated(cfg: SimConfig) -> (WidebandPulsar, LinearTimingModel) {
    let sim = simulate_toas(&cfg).unwrap();
    let model = LinearTimingModel::from_file(&sim.model).unwrap();
    let psr = WidebandPulsar::new(&sim.toas, &model, PulsarOptions::default()).unwrap();
    (psr, model)
}

#[test]
fn narrowband_toas_fail_the_precondition() {
    let mut sim = simulate_toas(&SimConfig::default()).unwrap();
    sim.toas.records[5].dm = None;
    let model = LinearTimingModel::from_file(&sim.model).unwrap();
    let err = WidebandPulsar::new(&sim.toas, &model, PulsarOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(err.message().contains("not wideband"));
}

#[test]
fn combined_arrays_keep_timing_then_dm_blocks() {
    let (psr, model) = simulated(SimConfig::default());
    let n = psr.ntoa();

    assert_eq!(psr.combined_toas().len(), 2 * n);
    assert_eq!(psr.combined_residuals().len(), 2 * n);
    assert_eq!(psr.combined_design_matrix().nrows(), 2 * n);

    let perm = psr.permutation();
    assert!(perm[..n].iter().all(|&i| i < n));
    assert!(perm[n..].iter().all(|&i| i >= n));
    for i in 0..n {
        assert_eq!(perm[n + i], perm[i] + n);
    }

    // Entry N + i is the DM of the TOA at entry i.
    let toas = psr.combined_toas();
    let resid = psr.combined_residuals();
    let raw_dms = psr.dms();
    for i in 0..n {
        assert_eq!(toas[i], toas[n + i]);
        let raw = perm[i];
        assert_relative_eq!(resid[n + i], raw_dms[raw] - model.dm_at(toas[i]), epsilon = 1e-12);
    }
}

#[test]
fn timing_model_signal_is_parameter_free_with_huge_prior() {
    let (psr, _) = simulated(SimConfig::default());
    let sig = WidebandTimingModel::default().build(&psr).unwrap();
    let values = ParamValues::new();

    assert_eq!(sig.name(), format!("{}_linear_wideband_timing_model", psr.name()));
    assert!(sig.params().is_empty());
    assert_eq!(sig.signal_type(), SignalType::Basis);

    let basis = sig.get_basis(&values).unwrap().unwrap();
    let phiinv = sig.get_phiinv(&values).unwrap().unwrap();
    assert_eq!(basis.nrows(), psr.combined_toas().len());
    assert_eq!(basis.ncols(), phiinv.len());
    for v in phiinv.iter() {
        assert_relative_eq!(*v, 1e-40, max_relative = 1e-12);
    }
}

#[test]
fn measurement_noise_matches_reference_formula() {
    let (psr, _) = simulated(SimConfig::default());
    let n = psr.ntoa();
    let sig = WidebandMeasurementNoise::default().build(&psr);
    assert_eq!(sig.signal_type(), SignalType::WhiteNoise);
    assert_eq!(
        sig.param_names(),
        vec![format!("{}_efac", psr.name()), format!("{}_dmefac", psr.name())]
    );

    let values: ParamValues = [
        (format!("{}_efac", psr.name()), 1.2),
        (format!("{}_dmefac", psr.name()), 0.8),
    ]
    .into_iter()
    .collect();
    let ndiag = sig.get_ndiag(&values).unwrap().unwrap();
    assert_eq!(ndiag.len(), 2 * n);

    let toaerrs = psr.toa_uncertainties();
    let dmerrs = psr.sorted_dm_uncertainties();
    let equad2 = 1e-36;
    for i in 0..n {
        assert_relative_eq!(ndiag[i], 1.44 * (toaerrs[i] * toaerrs[i] + equad2), max_relative = 1e-12);
        assert_relative_eq!(ndiag[n + i], 0.64 * (dmerrs[i] * dmerrs[i] + equad2), max_relative = 1e-12);
    }
}

#[test]
fn fourier_bases_treat_the_dm_block_differently() {
    let (psr, _) = simulated(SimConfig {
        ntoa: 24,
        freqs_mhz: vec![430.0, 820.0, 1400.0],
        ..SimConfig::default()
    });
    let n = psr.ntoa();
    let values = ParamValues::new();

    let red = FourierBasisGp::red_noise(FourierOptions::with_nmodes(6)).build(&psr).unwrap();
    let fr = red.get_basis(&values).unwrap().unwrap();
    assert!(fr.rows(n, n).iter().all(|v| *v == 0.0));

    let dm = FourierBasisGp::dm_noise(FourierOptions::with_nmodes(6)).build(&psr).unwrap();
    let fd = dm.get_basis(&values).unwrap().unwrap();
    let freqs = psr.combined_freqs();
    for i in 0..n {
        let scale = freqs[i] * freqs[i] / DM_CONST;
        for k in 0..fd.ncols() {
            assert_relative_eq!(fd[(n + i, k)], fd[(i, k)] * scale, max_relative = 1e-10, epsilon = 1e-300);
        }
    }
}

#[test]
fn csv_and_json_inputs_run_through_the_pipeline() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let dir = tmp.path();

    let cfg = SimConfig {
        ntoa: 50,
        backends: vec!["GUPPI".to_string(), "PUPPI".to_string()],
        inject_offset_us: 2.0,
        ..SimConfig::default()
    };
    let sim = simulate_toas(&cfg).unwrap();
    let input = PulsarInput {
        tim: dir.join("psr.csv"),
        model: dir.join("psr.json"),
    };
    write_toas_csv(&input.tim, &sim.toas).unwrap();
    write_model_json(&input.model, &sim.model).unwrap();

    let loaded = load_pulsar(&input, true).unwrap();

    // The model file names the pulsar, not the file stem.
    assert_eq!(loaded.psr.name(), "J1909-3744");
    assert_eq!(loaded.rows_skipped, 0);

    let config = RunConfig {
        inputs: vec![input],
        sort: true,
        noise: NoiseSettings::default(),
        fourier: FourierSettings {
            nmodes: 8,
            ..FourierSettings::default()
        },
    };
    let sc = build_signals(&loaded.psr, &config).unwrap();
    let values = starting_values(&sc, 3).unwrap();
    let eval = evaluate_signals(&loaded.psr, &sc, &values).unwrap();
    assert_eq!(eval.basis.nrows(), 2 * loaded.psr.ntoa());
    assert_eq!(eval.basis.ncols(), eval.phiinv.len());

    let fit = run_fit(&loaded.psr, &config.noise).unwrap();
    let offset = fit.params.iter().find(|p| p.name == "Offset").unwrap();
    assert!((offset.offset - 2e-6).abs() < 5.0 * offset.uncertainty, "{offset:?}");
}
