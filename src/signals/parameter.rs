//! Signal parameters and their priors.
//!
//! A `Parameter` is an unbound prior (or a fixed constant). Binding it to a
//! full name (e.g. `J1713+0747_efac`) gives a `ParamSpec`; values are then
//! looked up by that name in a `ParamValues` map.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::error::AppError;

/// Parameter values keyed by full parameter name.
pub type ParamValues = HashMap<String, f64>;

/// Prior of a single scalar parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Parameter {
    Uniform { pmin: f64, pmax: f64 },
    Normal { mu: f64, sigma: f64 },
    /// Fixed value; not a free parameter.
    Constant { value: f64 },
}

impl Parameter {
    pub fn uniform(pmin: f64, pmax: f64) -> Self {
        Parameter::Uniform { pmin, pmax }
    }

    pub fn constant(value: f64) -> Self {
        Parameter::Constant { value }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Parameter::Constant { .. })
    }

    /// Log prior density at `x` (0 for constants).
    pub fn ln_prior(&self, x: f64) -> f64 {
        match *self {
            Parameter::Uniform { pmin, pmax } => {
                if (pmin..=pmax).contains(&x) {
                    -(pmax - pmin).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            Parameter::Normal { mu, sigma } => {
                let z = (x - mu) / sigma;
                -0.5 * z * z - sigma.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
            }
            Parameter::Constant { .. } => 0.0,
        }
    }

    /// Draw a value from the prior.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<f64, AppError> {
        match *self {
            Parameter::Uniform { pmin, pmax } => {
                if !(pmin < pmax) {
                    return Err(AppError::usage(format!("Invalid uniform prior [{pmin}, {pmax}].")));
                }
                Ok(rng.gen_range(pmin..pmax))
            }
            Parameter::Normal { mu, sigma } => {
                let normal = Normal::new(mu, sigma)
                    .map_err(|e| AppError::usage(format!("Invalid normal prior: {e}")))?;
                Ok(normal.sample(rng))
            }
            Parameter::Constant { value } => Ok(value),
        }
    }
}

/// A parameter bound to its full name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub prior: Parameter,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, prior: Parameter) -> Self {
        Self {
            name: name.into(),
            prior,
        }
    }

    /// Current value: the constant itself, or the entry in `values`.
    pub fn value(&self, values: &ParamValues) -> Result<f64, AppError> {
        match self.prior {
            Parameter::Constant { value } => Ok(value),
            _ => values
                .get(&self.name)
                .copied()
                .ok_or_else(|| AppError::usage(format!("Missing value for parameter `{}`.", self.name))),
        }
    }
}

/// Join name parts with `_`, skipping empty parts.
pub fn param_name(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Draw one value per free parameter.
pub fn sample_params<R: Rng>(params: &[ParamSpec], rng: &mut R) -> Result<ParamValues, AppError> {
    params
        .iter()
        .map(|p| Ok((p.name.clone(), p.prior.sample(rng)?)))
        .collect()
}
