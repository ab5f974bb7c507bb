//! Formatted terminal output.
//!
//! We keep formatting code in one place so the dataset/signal code stays
//! free of presentation details.

use crate::app::pipeline::SignalEvaluation;
use crate::fit::WidebandFit;
use crate::report::summary::PulsarSummary;

/// Dataset and signal overview for one pulsar.
pub fn format_summary(summary: &PulsarSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", summary.psr));
    out.push_str(&format!(
        "TOAs: n={} (skipped {}) | MJD [{:.3}, {:.3}]",
        summary.ntoa, summary.rows_skipped, summary.mjd_start, summary.mjd_end
    ));
    if let (Some(a), Some(b)) = (&summary.start_date, &summary.end_date) {
        out.push_str(&format!(" | {a} .. {b}"));
    }
    out.push('\n');
    out.push_str(&format!("Backends: {}\n", summary.backends.join(", ")));
    out.push_str(&format!("Combined length: {}\n", 2 * summary.ntoa));
    out.push_str(&format!("Fit params: {}\n", summary.fit_params.join(", ")));

    out.push_str("\nSignals:\n");
    for s in &summary.signals {
        let cols = s.basis_columns.map(|c| format!(" cols={c}")).unwrap_or_default();
        out.push_str(&format!("- {:<48} {:<12}{cols}\n", s.name, s.kind));
        if !s.params.is_empty() {
            let names: Vec<&str> = s.params.iter().map(|p| p.name.as_str()).collect();
            out.push_str(&format!("    params: {}\n", names.join(", ")));
        }
    }

    out
}

/// Noise diagonal and basis shapes at one parameter point.
pub fn format_noise(psr: &str, eval: &SignalEvaluation) -> String {
    let mut out = String::new();
    let n = eval.ndiag.len() / 2;

    out.push_str(&format!("=== {psr} noise ===\n"));
    if eval.values.is_empty() {
        out.push_str("Free params: none\n");
    } else {
        out.push_str("Free params:\n");
        for (name, v) in &eval.values {
            out.push_str(&format!("  {name:<40} {v:>12.6}\n"));
        }
    }

    let (t_lo, t_hi) = sigma_range(eval.ndiag.rows(0, n).iter());
    let (d_lo, d_hi) = sigma_range(eval.ndiag.rows(n, n).iter());
    out.push_str(&format!("TOA sigma: [{:.4}, {:.4}] us\n", t_lo * 1e6, t_hi * 1e6));
    out.push_str(&format!("DM sigma : [{d_lo:.3e}, {d_hi:.3e}] pc cm^-3\n"));
    out.push_str(&format!(
        "Basis: {}x{} | phiinv: {}\n",
        eval.basis.nrows(),
        eval.basis.ncols(),
        eval.phiinv.len()
    ));

    out
}

/// Parameter offsets and fit quality.
pub fn format_fit(fit: &WidebandFit) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} fit ===\n", fit.psr));
    out.push_str(&format!("{:<10} {:>16} {:>16}\n", "param", "offset", "uncertainty"));
    out.push_str(&format!("{:-<10} {:-<16} {:-<16}\n", "", "", ""));
    for p in &fit.params {
        out.push_str(&format!("{:<10} {:>16.6e} {:>16.6e}\n", p.name, p.offset, p.uncertainty));
    }
    out.push_str(&format!(
        "chi2={:.3} dof={} chi2_red={:.3}\n",
        fit.chi2, fit.dof, fit.chi2_reduced
    ));
    out.push_str(&format!(
        "rms: timing={:.4} us | dm={:.3e} pc cm^-3\n",
        fit.rms_timing * 1e6,
        fit.rms_dm
    ));

    out
}

fn sigma_range<'a>(vars: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    vars.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        let s = v.sqrt();
        (lo.min(s), hi.max(s))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FittedParam;

    #[test]
    fn fit_table_lists_every_param() {
        let fit = WidebandFit {
            psr: "J1909-3744".to_string(),
            params: vec![
                FittedParam {
                    name: "Offset".to_string(),
                    offset: 1e-6,
                    uncertainty: 1e-8,
                },
                FittedParam {
                    name: "DM".to_string(),
                    offset: 1e-3,
                    uncertainty: 1e-5,
                },
            ],
            chi2: 10.0,
            dof: 8,
            chi2_reduced: 1.25,
            rms_timing: 5e-7,
            rms_dm: 2e-4,
        };
        let text = format_fit(&fit);
        assert!(text.contains("J1909-3744"));
        assert!(text.contains("Offset"));
        assert!(text.contains("DM"));
        assert!(text.contains("chi2_red=1.250"));
        assert!(text.contains("timing=0.5000 us"));
    }

    #[test]
    fn summary_lists_signals_and_dates() {
        let summary = PulsarSummary {
            psr: "J1713+0747".to_string(),
            ntoa: 3,
            rows_skipped: 1,
            mjd_start: 55000.0,
            mjd_end: 55010.0,
            start_date: Some("2009-06-18".to_string()),
            end_date: Some("2009-06-28".to_string()),
            backends: vec!["GUPPI".to_string()],
            fit_params: vec!["Offset".to_string(), "DM".to_string()],
            signals: vec![crate::report::summary::SignalSummary {
                name: "J1713+0747_red_noise".to_string(),
                description: "red noise".to_string(),
                kind: "basis",
                params: vec![crate::signals::ParamSpec::new(
                    "J1713+0747_red_noise_gamma",
                    crate::signals::Parameter::uniform(0.0, 7.0),
                )],
                basis_columns: Some(10),
            }],
            fit: None,
        };
        let text = format_summary(&summary);
        assert!(text.contains("Combined length: 6"));
        assert!(text.contains("2009-06-18 .. 2009-06-28"));
        assert!(text.contains("cols=10"));
        assert!(text.contains("params: J1713+0747_red_noise_gamma"));
    }
}
