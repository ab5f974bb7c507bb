//! CSV/JSON exports.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts:
//! - TOA CSV in the same layout `ingest` reads (used by `wb simulate`)
//! - combined residuals + design matrix, one row per combined entry
//! - a JSON run summary

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{DAY_SECONDS, ToaSet};
use crate::error::AppError;
use crate::pulsar::WidebandPulsar;

/// Write TOAs in the ingest CSV layout (µs for times, pc cm⁻³ for DMs).
pub fn write_toas_csv(path: &Path, toas: &ToaSet) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create TOA CSV '{}': {e}", path.display())))?;

    writeln!(file, "mjd,freq_mhz,toa_err_us,residual_us,dm,dm_err,backend")
        .map_err(|e| AppError::input(format!("Failed to write TOA CSV header: {e}")))?;

    for r in &toas.records {
        writeln!(
            file,
            "{:.12},{:.6},{:.6},{:.6},{},{},{}",
            r.mjd,
            r.freq_mhz,
            r.toa_err * 1e6,
            r.residual * 1e6,
            r.dm.map(|v| format!("{v:.8}")).unwrap_or_default(),
            r.dm_err.map(|v| format!("{v:.8}")).unwrap_or_default(),
            r.backend,
        )
        .map_err(|e| AppError::input(format!("Failed to write TOA CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the combined residual vector and design matrix of one pulsar.
///
/// Rows follow the combined order: the timing block (`block = toa`, residual
/// in s) then the DM block (`block = dm`, residual in pc cm⁻³).
pub fn write_combined_csv(path: &Path, psr: &WidebandPulsar) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create combined CSV '{}': {e}", path.display())))?;

    let n = psr.ntoa();
    let toas = psr.combined_toas();
    let freqs = psr.combined_freqs();
    let residuals = psr.combined_residuals();
    let design = psr.combined_design_matrix();
    let mut sigmas = psr.toa_uncertainties();
    sigmas.extend(psr.sorted_dm_uncertainties());

    let mut header = String::from("row,block,mjd,freq_mhz,residual,sigma");
    for p in psr.fit_params() {
        header.push(',');
        header.push_str(p);
    }
    writeln!(file, "{header}").map_err(|e| AppError::input(format!("Failed to write combined CSV header: {e}")))?;

    for i in 0..2 * n {
        let block = if i < n { "toa" } else { "dm" };
        let mut line = format!(
            "{i},{block},{:.12},{:.6},{:.10e},{:.6e}",
            toas[i] / DAY_SECONDS,
            freqs[i],
            residuals[i],
            sigmas[i]
        );
        for v in design.row(i).iter() {
            line.push_str(&format!(",{v:.10e}"));
        }
        writeln!(file, "{line}").map_err(|e| AppError::input(format!("Failed to write combined CSV row: {e}")))?;
    }

    Ok(())
}

/// Write any serialisable summary as pretty JSON.
pub fn write_summary_json<T: Serialize + ?Sized>(path: &Path, summary: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::input(format!("Failed to write summary JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SimConfig, simulate_toas};
    use crate::io::ingest::load_toas;
    use crate::models::LinearTimingModel;
    use crate::pulsar::PulsarOptions;

    #[test]
    fn simulated_toas_reload_from_csv() {
        let sim = simulate_toas(&SimConfig::default()).unwrap();
        let tmp = tempfile::tempdir().expect("create temp dir");
        let path = tmp.path().join("toas.csv");
        write_toas_csv(&path, &sim.toas).unwrap();
        let ingested = load_toas(&path, Some("J1909-3744")).unwrap();

        assert!(ingested.row_errors.is_empty());
        assert_eq!(ingested.toas.len(), sim.toas.len());
        assert!(ingested.toas.is_wideband());
        let (a, b) = (&sim.toas.records[3], &ingested.toas.records[3]);
        assert!((a.residual - b.residual).abs() < 1e-12);
        assert!((a.dm.unwrap() - b.dm.unwrap()).abs() < 1e-8);
    }

    #[test]
    fn combined_csv_has_two_blocks_and_param_columns() {
        let sim = simulate_toas(&SimConfig {
            ntoa: 6,
            ..SimConfig::default()
        })
        .unwrap();
        let model = LinearTimingModel::from_file(&sim.model).unwrap();
        let psr = WidebandPulsar::new(&sim.toas, &model, PulsarOptions::default()).unwrap();

        let tmp = tempfile::tempdir().expect("create temp dir");
        let path = tmp.path().join("combined.csv");
        write_combined_csv(&path, &psr).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 12);
        assert_eq!(lines[0].split(',').count(), 6 + psr.fit_params().len());
        assert!(lines[1].contains(",toa,"));
        assert!(lines[7].contains(",dm,"));
    }
}
