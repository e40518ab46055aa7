use crate::cli::McArgs;
use crate::error::{CliError, Result};
use pairsum::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEngineConfig {
    truncation_correction: Option<bool>,
    intramolecular_virial: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMonteCarloConfig {
    steps: Option<u64>,
    temperature: Option<f64>,
    atom_step: Option<f64>,
    molecule_step: Option<f64>,
    seed: Option<u64>,
    check_interval: Option<u64>,
    drift_tolerance: Option<f64>,
    sample_interval: Option<u64>,
}

/// Run configuration as read from disk; every value may still be overridden from the
/// command line.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRunConfig {
    engine: Option<PartialEngineConfig>,
    monte_carlo: Option<PartialMonteCarloConfig>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Engine switches from the file, with `--no-tail` taking precedence.
    pub fn engine_config(&self, no_tail: bool) -> core_config::EngineConfig {
        let engine = self.engine.clone().unwrap_or_default();
        let mut builder = core_config::EngineConfigBuilder::new();
        if let Some(enabled) = engine.truncation_correction {
            builder = builder.truncation_correction(enabled);
        }
        if no_tail {
            builder = builder.truncation_correction(false);
        }
        if let Some(enabled) = engine.intramolecular_virial {
            builder = builder.intramolecular_virial(enabled);
        }
        builder.build()
    }

    pub fn merge_with_cli(
        mut self,
        args: &McArgs,
    ) -> Result<(core_config::EngineConfig, core_config::MonteCarloConfig)> {
        self.apply_set_values(&args.set_values)?;
        let engine = self.engine_config(args.no_tail);
        let mc = self.monte_carlo.take().unwrap_or_default();

        let mut builder = core_config::MonteCarloConfigBuilder::new()
            .seed(args.seed.or(mc.seed));
        if let Some(steps) = args.steps.or(mc.steps) {
            builder = builder.steps(steps);
        }
        if let Some(temperature) = args.temperature.or(mc.temperature) {
            builder = builder.temperature(temperature);
        }
        if let Some(step) = args.atom_step.or(mc.atom_step) {
            builder = builder.atom_step(step);
        }
        if let Some(step) = args.molecule_step.or(mc.molecule_step) {
            builder = builder.molecule_step(step);
        }
        if let Some(interval) = mc.check_interval {
            builder = builder.check_interval(interval);
        }
        if let Some(tolerance) = mc.drift_tolerance {
            builder = builder.drift_tolerance(tolerance);
        }
        if let Some(interval) = mc.sample_interval {
            builder = builder.sample_interval(interval);
        }

        let mc = builder.build().map_err(|e| CliError::Config(e.to_string()))?;
        Ok((engine, mc))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            let engine = || PartialEngineConfig::default();
            let mc = || PartialMonteCarloConfig::default();
            match key {
                "engine.truncation-correction" => {
                    self.engine.get_or_insert_with(engine).truncation_correction =
                        Some(parse_value(key, value_str)?);
                }
                "engine.intramolecular-virial" => {
                    self.engine.get_or_insert_with(engine).intramolecular_virial =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.steps" => {
                    self.monte_carlo.get_or_insert_with(mc).steps = Some(parse_value(key, value_str)?);
                }
                "monte-carlo.temperature" => {
                    self.monte_carlo.get_or_insert_with(mc).temperature =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.atom-step" => {
                    self.monte_carlo.get_or_insert_with(mc).atom_step =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.molecule-step" => {
                    self.monte_carlo.get_or_insert_with(mc).molecule_step =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.seed" => {
                    self.monte_carlo.get_or_insert_with(mc).seed = Some(parse_value(key, value_str)?);
                }
                "monte-carlo.check-interval" => {
                    self.monte_carlo.get_or_insert_with(mc).check_interval =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.drift-tolerance" => {
                    self.monte_carlo.get_or_insert_with(mc).drift_tolerance =
                        Some(parse_value(key, value_str)?);
                }
                "monte-carlo.sample-interval" => {
                    self.monte_carlo.get_or_insert_with(mc).sample_interval =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}
