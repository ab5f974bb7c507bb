//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - TOA records and TOA sets (`ToaRecord`, `ToaSet`)
//! - the on-disk timing model schema (`ModelFile`)
//! - run configuration derived from CLI flags (`RunConfig`)
//! - physical constants and unit conversions (`units`)

pub mod types;
pub mod units;

pub use types::*;
pub use units::*;
