//! Synthetic wideband TOA generation.

pub mod sample;

pub use sample::*;
