//! Timing models.
//!
//! A timing model is the collaborator that turns a TOA set into residuals and
//! a design matrix. The wideband dataset only depends on the `TimingModel`
//! trait; `LinearTimingModel` is the concrete implementation used by the CLI.

pub mod model;

pub use model::*;
