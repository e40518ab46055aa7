use super::functions::{Buckingham, LennardJones, SoftSphere};
use super::pair::PairPotential;
use super::truncation::{Truncated, TruncatedShifted};
use crate::core::bonding::BondingError;
use crate::core::models::system::SystemError;
use crate::core::space::boundary::BoundaryError;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Functional form and its parameters, tagged by `kind` in the system file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PotentialForm {
    /// Either `sigma` (zero crossing) or `r-min` (well minimum) must be given.
    #[serde(rename_all = "kebab-case")]
    LennardJones {
        sigma: Option<f64>,
        r_min: Option<f64>,
        epsilon: f64,
    },
    #[serde(rename_all = "kebab-case")]
    SoftSphere {
        epsilon: f64,
        sigma: f64,
        exponent: f64,
    },
    #[serde(rename_all = "kebab-case")]
    Buckingham {
        r_min: f64,
        well_depth: f64,
        scale: f64,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct PotentialParam {
    pub types: [String; 2],
    #[serde(flatten)]
    pub form: PotentialForm,
    pub cutoff: Option<f64>,
    #[serde(default)]
    pub shift: bool,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid parameter for {context}: {reason}")]
    InvalidParameter { context: String, reason: String },
    #[error("Unknown atom type '{0}'")]
    UnknownAtomType(String),
    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("Invalid simulation box: {0}")]
    Boundary(#[from] BoundaryError),
    #[error("Invalid system description: {0}")]
    System(#[from] SystemError),
    #[error("Invalid bonding description: {0}")]
    Bonding(#[from] BondingError),
}

impl PotentialParam {
    fn context(&self) -> String {
        format!("potential {}-{}", self.types[0], self.types[1])
    }

    fn invalid(&self, reason: impl Into<String>) -> ParamLoadError {
        ParamLoadError::InvalidParameter {
            context: self.context(),
            reason: reason.into(),
        }
    }

    fn require_positive(&self, name: &str, value: f64) -> Result<(), ParamLoadError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(self.invalid(format!("'{name}' must be positive and finite, got {value}")))
        }
    }

    /// Validates the parameters and builds the (optionally truncated) potential.
    pub fn build(&self) -> Result<Arc<dyn PairPotential>, ParamLoadError> {
        if let Some(cutoff) = self.cutoff {
            self.require_positive("cutoff", cutoff)?;
        } else if self.shift {
            return Err(self.invalid("'shift' requires a 'cutoff'"));
        }

        match self.form {
            PotentialForm::LennardJones {
                sigma,
                r_min,
                epsilon,
            } => {
                self.require_positive("epsilon", epsilon)?;
                let lj = match (sigma, r_min) {
                    (Some(sigma), None) => {
                        self.require_positive("sigma", sigma)?;
                        LennardJones::from_sigma_epsilon(sigma, epsilon)
                    }
                    (None, Some(r_min)) => {
                        self.require_positive("r-min", r_min)?;
                        LennardJones::new(r_min, epsilon)
                    }
                    _ => return Err(self.invalid("exactly one of 'sigma' or 'r-min' is required")),
                };
                Ok(self.wrap(lj))
            }
            PotentialForm::SoftSphere {
                epsilon,
                sigma,
                exponent,
            } => {
                self.require_positive("epsilon", epsilon)?;
                self.require_positive("sigma", sigma)?;
                if !(exponent.is_finite() && exponent > 3.0) {
                    return Err(self.invalid(format!("'exponent' must exceed 3, got {exponent}")));
                }
                Ok(self.wrap(SoftSphere::new(epsilon, sigma, exponent)))
            }
            PotentialForm::Buckingham {
                r_min,
                well_depth,
                scale,
            } => {
                self.require_positive("r-min", r_min)?;
                self.require_positive("well-depth", well_depth)?;
                if !(scale.is_finite() && scale > 6.0) {
                    return Err(self.invalid(format!("'scale' must exceed 6, got {scale}")));
                }
                Ok(self.wrap(Buckingham::new(r_min, well_depth, scale)))
            }
        }
    }

    fn wrap<P: PairPotential + 'static>(&self, potential: P) -> Arc<dyn PairPotential> {
        match (self.cutoff, self.shift) {
            (None, _) => Arc::new(potential),
            (Some(cutoff), false) => Arc::new(Truncated::new(potential, cutoff)),
            (Some(cutoff), true) => Arc::new(TruncatedShifted::new(potential, cutoff)),
        }
    }
}
