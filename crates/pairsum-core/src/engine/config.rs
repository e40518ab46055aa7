use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Switches for the optional parts of an energy evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Add the analytic long-range tail correction to full and incremental energies.
    pub truncation_correction: bool,
    /// Add the intramolecular virial correction when forces are computed.
    pub intramolecular_virial: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            truncation_correction: true,
            intramolecular_virial: true,
        }
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    truncation_correction: Option<bool>,
    intramolecular_virial: Option<bool>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn truncation_correction(mut self, enabled: bool) -> Self {
        self.truncation_correction = Some(enabled);
        self
    }
    pub fn intramolecular_virial(mut self, enabled: bool) -> Self {
        self.intramolecular_virial = Some(enabled);
        self
    }

    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            truncation_correction: self
                .truncation_correction
                .unwrap_or(defaults.truncation_correction),
            intramolecular_virial: self
                .intramolecular_virial
                .unwrap_or(defaults.intramolecular_virial),
        }
    }
}

/// Parameters of a Metropolis Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub steps: u64,
    /// Temperature in energy units (`kT`).
    pub temperature: f64,
    /// Largest displacement per axis for single-atom moves.
    pub atom_step: f64,
    /// Largest displacement per axis for rigid molecule translations.
    pub molecule_step: f64,
    pub seed: Option<u64>,
    /// Steps between full recomputations that check the tracked energy for drift.
    pub check_interval: u64,
    /// Largest tolerated difference between tracked and recomputed energy, relative to
    /// `max(1, |E|)`.
    pub drift_tolerance: f64,
    /// Steps between recorded energy samples.
    pub sample_interval: u64,
}

#[derive(Default)]
pub struct MonteCarloConfigBuilder {
    steps: Option<u64>,
    temperature: Option<f64>,
    atom_step: Option<f64>,
    molecule_step: Option<f64>,
    seed: Option<u64>,
    check_interval: Option<u64>,
    drift_tolerance: Option<f64>,
    sample_interval: Option<u64>,
}

impl MonteCarloConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn atom_step(mut self, step: f64) -> Self {
        self.atom_step = Some(step);
        self
    }
    pub fn molecule_step(mut self, step: f64) -> Self {
        self.molecule_step = Some(step);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn check_interval(mut self, interval: u64) -> Self {
        self.check_interval = Some(interval);
        self
    }
    pub fn drift_tolerance(mut self, tolerance: f64) -> Self {
        self.drift_tolerance = Some(tolerance);
        self
    }
    pub fn sample_interval(mut self, interval: u64) -> Self {
        self.sample_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<MonteCarloConfig, ConfigError> {
        let steps = self.steps.ok_or(ConfigError::MissingParameter("steps"))?;
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be positive, got {temperature}"),
            });
        }
        let atom_step = self
            .atom_step
            .ok_or(ConfigError::MissingParameter("atom_step"))?;
        let molecule_step = self.molecule_step.unwrap_or(atom_step);
        for (name, value) in [("atom_step", atom_step), ("molecule_step", molecule_step)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        let check_interval = self.check_interval.unwrap_or(1000);
        let sample_interval = self.sample_interval.unwrap_or(100);
        for (name, value) in [("check_interval", check_interval), ("sample_interval", sample_interval)] {
            if value == 0 {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        let drift_tolerance = self.drift_tolerance.unwrap_or(1e-6);
        if !(drift_tolerance.is_finite() && drift_tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "drift_tolerance",
                reason: format!("must be non-negative, got {drift_tolerance}"),
            });
        }

        Ok(MonteCarloConfig {
            steps,
            temperature,
            atom_step,
            molecule_step,
            seed: self.seed,
            check_interval,
            drift_tolerance,
            sample_interval,
        })
    }
}
