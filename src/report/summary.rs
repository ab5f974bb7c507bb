//! Serialisable per-pulsar summaries (printed by `wb summary`, written by
//! `wb export`).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::app::pipeline::LoadedPulsar;
use crate::domain::mjd_to_date;
use crate::error::AppError;
use crate::fit::WidebandFit;
use crate::signals::{ParamSpec, ParamValues, SignalCollection};

#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub name: String,
    pub description: String,
    pub kind: &'static str,
    /// Free parameters with their priors.
    pub params: Vec<ParamSpec>,
    /// Basis columns, for basis signals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basis_columns: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PulsarSummary {
    pub psr: String,
    pub ntoa: usize,
    pub rows_skipped: usize,
    pub mjd_start: f64,
    pub mjd_end: f64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub backends: Vec<String>,
    pub fit_params: Vec<String>,
    pub signals: Vec<SignalSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<WidebandFit>,
}

/// Summarise one loaded pulsar and its signals.
pub fn summarize_pulsar(
    loaded: &LoadedPulsar,
    signals: &SignalCollection,
    values: &ParamValues,
) -> Result<PulsarSummary, AppError> {
    let psr = &loaded.psr;

    let mut out_signals = Vec::with_capacity(signals.signals().len());
    for s in signals.signals() {
        out_signals.push(SignalSummary {
            name: s.name().to_string(),
            description: s.signal_name().to_string(),
            kind: s.signal_type().label(),
            params: s.params().to_vec(),
            basis_columns: s.get_basis(values)?.map(|b| b.ncols()),
        });
    }

    let backends: BTreeSet<String> = psr.backends().into_iter().collect();

    Ok(PulsarSummary {
        psr: psr.name().to_string(),
        ntoa: psr.ntoa(),
        rows_skipped: loaded.rows_skipped,
        mjd_start: loaded.mjd_start,
        mjd_end: loaded.mjd_end,
        start_date: mjd_to_date(loaded.mjd_start).map(|d| d.to_string()),
        end_date: mjd_to_date(loaded.mjd_end).map(|d| d.to_string()),
        backends: backends.into_iter().collect(),
        fit_params: psr.fit_params().to_vec(),
        signals: out_signals,
        fit: None,
    })
}
