//! Power spectral densities for Fourier-basis Gaussian processes.

use std::f64::consts::PI;

use nalgebra::DVector;

use crate::domain::FYR;

/// Power-law prior variances for a sine/cosine basis.
///
/// `freqs` lists each frequency twice (one per sine/cosine column). The
/// per-mode bin width is taken from the distinct frequencies, starting at 0.
pub fn powerlaw(freqs: &DVector<f64>, log10_a: f64, gamma: f64) -> DVector<f64> {
    let amp2 = 10f64.powf(2.0 * log10_a);
    let mut prev = 0.0;
    let mut out = DVector::<f64>::zeros(freqs.len());
    for k in (0..freqs.len()).step_by(2) {
        let f = freqs[k];
        let df = f - prev;
        prev = f;
        let psd = amp2 / 12.0 / (PI * PI) * FYR.powf(gamma - 3.0) * f.powf(-gamma) * df;
        out[k] = psd;
        if k + 1 < freqs.len() {
            out[k + 1] = psd;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powerlaw_pairs_and_slope() {
        let t = 1e8;
        let freqs = DVector::from_vec(vec![1.0 / t, 1.0 / t, 2.0 / t, 2.0 / t]);
        let phi = powerlaw(&freqs, -14.0, 13.0 / 3.0);
        assert_eq!(phi[0], phi[1]);
        assert_eq!(phi[2], phi[3]);
        // Equal bin widths: the ratio is set by f^-gamma alone.
        let ratio = phi[0] / phi[2];
        assert!((ratio - 2f64.powf(13.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn amplitude_scales_quadratically() {
        let freqs = DVector::from_vec(vec![1e-8, 1e-8]);
        let a = powerlaw(&freqs, -14.0, 4.0);
        let b = powerlaw(&freqs, -13.0, 4.0);
        assert!((b[0] / a[0] - 100.0).abs() < 1e-9);
    }
}
