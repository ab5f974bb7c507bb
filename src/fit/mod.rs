//! Linearised timing fits on wideband data.
//!
//! The combined residuals are fitted with the combined design matrix, weighting
//! each entry by the inverse of the wideband white-noise diagonal so TOAs and
//! DMs are treated jointly.

pub mod fitter;

pub use fitter::*;
