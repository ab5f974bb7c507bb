//! Physical constants and unit conversions.
//!
//! Internally all epochs are seconds (MJD × 86400), radio frequencies are MHz
//! and dispersion measures are pc cm⁻³.

/// Seconds per day.
pub const DAY_SECONDS: f64 = 86_400.0;

/// Seconds per Julian year.
pub const YEAR_SECONDS: f64 = 365.25 * DAY_SECONDS;

/// Dispersion constant in s MHz² cm³ pc⁻¹.
///
/// A dispersion measure `DM` delays a pulse observed at `f` MHz by
/// `DM_CONST · DM / f²` seconds. This is the conventional (rounded) value
/// `1 / 2.41e-4` used by tempo, tempo2 and PINT rather than the CODATA value.
pub const DM_CONST: f64 = 1.0 / 2.41e-4;

/// Reference frequency `1/yr` used to normalise power-law spectra (Hz).
pub const FYR: f64 = 1.0 / 3.16e7;

/// Default reference radio frequency for DM-noise bases (MHz).
pub const DEFAULT_FREF_MHZ: f64 = 1400.0;

/// Convert an MJD to seconds.
pub fn mjd_to_seconds(mjd: f64) -> f64 {
    mjd * DAY_SECONDS
}

/// Convert microseconds to seconds.
pub fn us_to_seconds(us: f64) -> f64 {
    us * 1e-6
}

/// Dispersive delay (s) of `dm` (pc cm⁻³) at `freq_mhz`.
pub fn dispersion_delay(dm: f64, freq_mhz: f64) -> f64 {
    DM_CONST * dm / (freq_mhz * freq_mhz)
}

/// Calendar date (UTC) corresponding to an MJD, if representable.
pub fn mjd_to_date(mjd: f64) -> Option<chrono::NaiveDate> {
    let epoch = chrono::NaiveDate::from_ymd_opt(1858, 11, 17)?;
    let days = mjd.floor();
    // Also rejects NaN; `as i64` would saturate and overflow `TimeDelta`.
    if !(days.abs() < 1e15) {
        return None;
    }
    epoch.checked_add_signed(chrono::TimeDelta::try_days(days as i64)?)
}
