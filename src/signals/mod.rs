//! Model components ("signals") built against a wideband pulsar.
//!
//! Each factory is a plain configuration struct with a `build` method that
//! binds it to one `WidebandPulsar`:
//!
//! - `WidebandTimingModel`: marginalised timing-model basis
//! - `WidebandMeasurementNoise`: EFAC/EQUAD + DMEFAC/DMEQUAD white noise
//! - `FourierBasisGp`: red-noise or DM-noise Fourier basis with a power-law prior
//!
//! Built signals implement the `Signal` trait and can be combined with a
//! `SignalCollection`.

pub mod collection;
pub mod gp;
pub mod parameter;
pub mod selection;
pub mod signal;
pub mod spectrum;
pub mod timing_model;
pub mod white_noise;

pub use collection::*;
pub use gp::*;
pub use parameter::*;
pub use selection::*;
pub use signal::*;
pub use spectrum::*;
pub use timing_model::*;
pub use white_noise::*;
