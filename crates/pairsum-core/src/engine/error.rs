use super::config::ConfigError;
use crate::core::models::system::SystemError;
use thiserror::Error;

/// Failures of a single energy evaluation.
#[derive(Debug, Error, PartialEq)]
pub enum ComputeError {
    #[error("Non-finite energy {value} for pair ({i}, {j})")]
    NonFiniteEnergy { i: usize, j: usize, value: f64 },

    #[error("Non-finite force for pair ({i}, {j})")]
    NonFiniteForce { i: usize, j: usize },

    #[error("Atom {index} is out of range for a system of {count} atoms")]
    AtomOutOfRange { index: usize, count: usize },

    #[error("Atom {0} appears more than once in a moved group")]
    DuplicateAtom(usize),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Energy evaluation failed: {source}")]
    Compute {
        #[from]
        source: ComputeError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("System update failed: {source}")]
    System {
        #[from]
        source: SystemError,
    },

    #[error("Simulation phase '{phase}' failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },
}
