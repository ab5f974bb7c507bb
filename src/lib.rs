//! `wideband-timing` library crate.
//!
//! Wideband pulsar timing: TOAs that carry both an arrival time and a DM
//! measurement are combined into one interleaved dataset (timing block then
//! DM block), and the usual noise and basis signals are rebuilt to treat the
//! two measurement types jointly.
//!
//! The binary (`wb`) is a thin wrapper around this library so that the core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod pulsar;
pub mod report;
pub mod signals;
