//! Input/output helpers.
//!
//! - CSV TOA ingest + validation (`ingest`)
//! - timing model JSON read/write (`model_file`)
//! - CSV/JSON exports (`export`)

pub mod export;
pub mod ingest;
pub mod model_file;

pub use export::*;
pub use ingest::*;
pub use model_file::*;
