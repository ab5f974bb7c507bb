//! Sum of signals for one pulsar.
//!
//! White-noise diagonals add; basis matrices are stacked column-wise with
//! their prior variances concatenated in the same order.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::signals::parameter::{ParamSpec, ParamValues};
use crate::signals::signal::Signal;

#[derive(Debug, Default)]
pub struct SignalCollection {
    signals: Vec<Box<dyn Signal>>,
}

impl SignalCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, signal: impl Signal + 'static) {
        self.signals.push(Box::new(signal));
    }

    pub fn signals(&self) -> &[Box<dyn Signal>] {
        &self.signals
    }

    /// Free parameters of all signals, deduplicated by name, in signal order.
    pub fn params(&self) -> Vec<ParamSpec> {
        let mut out: Vec<ParamSpec> = Vec::new();
        for p in self.signals.iter().flat_map(|s| s.params()) {
            if !out.iter().any(|q| q.name == p.name) {
                out.push(p.clone());
            }
        }
        out
    }

    /// Summed white-noise variances, or `None` if no signal contributes one.
    pub fn get_ndiag(&self, params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        let mut total: Option<DVector<f64>> = None;
        for s in &self.signals {
            if let Some(nd) = s.get_ndiag(params)? {
                total = Some(match total {
                    None => nd,
                    Some(acc) if acc.len() == nd.len() => acc + nd,
                    Some(acc) => {
                        return Err(AppError::numeric(format!(
                            "Signal {} has {} noise entries, expected {}.",
                            s.name(),
                            nd.len(),
                            acc.len()
                        )));
                    }
                });
            }
        }
        Ok(total)
    }

    /// Column-stacked basis of all basis signals.
    pub fn get_basis(&self, params: &ParamValues) -> Result<Option<DMatrix<f64>>, AppError> {
        let mut blocks = Vec::new();
        for s in &self.signals {
            if let Some(b) = s.get_basis(params)? {
                blocks.push(b);
            }
        }
        let Some(nrows) = blocks.first().map(|b| b.nrows()) else {
            return Ok(None);
        };
        if blocks.iter().any(|b| b.nrows() != nrows) {
            return Err(AppError::numeric("Basis signals disagree on the number of rows."));
        }

        let ncols = blocks.iter().map(|b| b.ncols()).sum();
        let mut out = DMatrix::<f64>::zeros(nrows, ncols);
        let mut col = 0;
        for b in &blocks {
            out.view_mut((0, col), (nrows, b.ncols())).copy_from(b);
            col += b.ncols();
        }
        Ok(Some(out))
    }

    /// Concatenated inverse prior variances, in basis column order.
    pub fn get_phiinv(&self, params: &ParamValues) -> Result<Option<DVector<f64>>, AppError> {
        let mut parts: Vec<f64> = Vec::new();
        let mut any = false;
        for s in &self.signals {
            if let Some(p) = s.get_phiinv(params)? {
                parts.extend(p.iter());
                any = true;
            }
        }
        Ok(any.then(|| DVector::from_vec(parts)))
    }
}
