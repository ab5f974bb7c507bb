//! Pulsar datasets.
//!
//! - `Pulsar`: the single-stream dataset (TOAs, uncertainties, frequencies,
//!   backends) with its canonical sort order
//! - `WidebandPulsar`: wraps a `Pulsar` and exposes the interleaved
//!   timing + DM view used by the wideband signals

pub mod base;
pub mod wideband;

pub use base::*;
pub use wideband::*;
