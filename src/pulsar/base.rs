//! Single-stream pulsar dataset.

use crate::domain::ToaSet;

/// Dataset construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsarOptions {
    /// Present TOAs in time order. When false the input order is kept.
    pub sort: bool,
}

impl Default for PulsarOptions {
    fn default() -> Self {
        Self { sort: true }
    }
}

/// Per-TOA arrays of one pulsar plus the permutation that orders them.
///
/// Arrays are stored in input order; accessors return them through `isort`.
#[derive(Debug, Clone)]
pub struct Pulsar {
    name: String,
    toas: Vec<f64>,
    toaerrs: Vec<f64>,
    freqs: Vec<f64>,
    backends: Vec<String>,
    isort: Vec<usize>,
}

impl Pulsar {
    pub fn new(toas: &ToaSet, opts: PulsarOptions) -> Self {
        let raw_toas = toas.toas();
        let isort = if opts.sort {
            argsort(&raw_toas)
        } else {
            (0..raw_toas.len()).collect()
        };

        Self {
            name: toas.name.clone(),
            toas: raw_toas,
            toaerrs: toas.toa_errors(),
            freqs: toas.freqs(),
            backends: toas.backends(),
            isort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.toas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toas.is_empty()
    }

    /// Permutation from presented position to storage index.
    pub fn isort(&self) -> &[usize] {
        &self.isort
    }

    /// TOAs (s), unsorted.
    pub fn raw_toas(&self) -> &[f64] {
        &self.toas
    }

    pub fn raw_freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// TOAs (s) in presentation order.
    pub fn toas(&self) -> Vec<f64> {
        permute(&self.toas, &self.isort)
    }

    /// TOA uncertainties (s) in presentation order.
    pub fn toaerrs(&self) -> Vec<f64> {
        permute(&self.toaerrs, &self.isort)
    }

    /// Observing frequencies (MHz) in presentation order.
    pub fn freqs(&self) -> Vec<f64> {
        permute(&self.freqs, &self.isort)
    }

    /// Backend flags in presentation order.
    pub fn backends(&self) -> Vec<String> {
        permute(&self.backends, &self.isort)
    }
}

/// Stable argsort of `values` (ties keep input order).
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}

/// Gather `values[perm[k]]` for every `k`.
pub fn permute<T: Clone>(values: &[T], perm: &[usize]) -> Vec<T> {
    perm.iter().map(|&i| values[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToaRecord;

    fn set(mjds: &[f64]) -> ToaSet {
        let records = mjds
            .iter()
            .enumerate()
            .map(|(i, &mjd)| ToaRecord {
                mjd,
                freq_mhz: 1400.0,
                toa_err: 1e-6 * (i + 1) as f64,
                residual: 0.0,
                dm: None,
                dm_err: None,
                backend: format!("B{i}"),
            })
            .collect();
        ToaSet::new("J0000+0000", records)
    }

    #[test]
    fn argsort_is_stable() {
        assert_eq!(argsort(&[3.0, 1.0, 2.0, 1.0]), vec![1, 3, 2, 0]);
    }

    #[test]
    fn sorted_accessors_follow_isort() {
        let psr = Pulsar::new(&set(&[55002.0, 55000.0, 55001.0]), PulsarOptions::default());
        assert_eq!(psr.isort(), &[1, 2, 0]);
        assert_eq!(psr.backends(), vec!["B1", "B2", "B0"]);
        let errs = psr.toaerrs();
        assert!((errs[0] - 2e-6).abs() < 1e-18);
        assert!(psr.toas().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn unsorted_keeps_input_order() {
        let psr = Pulsar::new(&set(&[55002.0, 55000.0]), PulsarOptions { sort: false });
        assert_eq!(psr.isort(), &[0, 1]);
        assert_eq!(psr.toas(), psr.raw_toas().to_vec());
    }
}
