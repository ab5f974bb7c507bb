//! Mathematical utilities: least squares, timing-model bases and Fourier bases.

pub mod basis;
pub mod fourier;
pub mod ols;

pub use basis::*;
pub use fourier::*;
pub use ols::*;
