use crate::core::models::system::System;
use crate::engine::compute::PairCompute;
use crate::engine::config::MonteCarloConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::EnergyState;
use nalgebra::{Point3, Vector3};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Energy recorded every `sample_interval` steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySample {
    pub step: u64,
    pub energy: f64,
    pub acceptance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveStatistics {
    pub attempted: u64,
    pub accepted: u64,
}

impl MoveStatistics {
    pub fn acceptance(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloSummary {
    pub steps: u64,
    pub atom_moves: MoveStatistics,
    pub molecule_moves: MoveStatistics,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Largest difference seen between the tracked energy and a full recomputation.
    pub max_drift: f64,
    pub samples: Vec<EnergySample>,
}

impl MonteCarloSummary {
    pub fn acceptance(&self) -> f64 {
        let attempted = self.atom_moves.attempted + self.molecule_moves.attempted;
        if attempted == 0 {
            0.0
        } else {
            (self.atom_moves.accepted + self.molecule_moves.accepted) as f64 / attempted as f64
        }
    }
}

/// Runs Metropolis Monte Carlo with translation moves.
///
/// Each step picks a molecule uniformly; monatomic molecules get a single-atom
/// displacement and polyatomic ones a rigid translation. Energies are tracked
/// incrementally through committed trials and checked against a full recomputation
/// every `check_interval` steps.
#[instrument(skip_all, name = "monte_carlo_workflow")]
pub fn run(
    system: &mut System,
    compute: &PairCompute,
    state: &mut EnergyState,
    config: &MonteCarloConfig,
    reporter: &ProgressReporter,
) -> Result<MonteCarloSummary, EngineError> {
    // === Phase 1: Initial energy ===
    reporter.report(Progress::PhaseStart {
        name: "Initial Energy",
    });
    if system.molecules().is_empty() {
        return Err(EngineError::PhaseFailed {
            phase: "Initial Energy",
            reason: "the system contains no molecules".to_string(),
        });
    }
    let initial_energy = compute.compute_all(state, system, false, None)?;
    info!(
        "Initial energy {:.6} for {} atoms in {} molecules.",
        initial_energy,
        system.atom_count(),
        system.molecules().len()
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Sampling ===
    reporter.report(Progress::PhaseStart { name: "Sampling" });
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let beta = 1.0 / config.temperature;
    let mut atom_moves = MoveStatistics::default();
    let mut molecule_moves = MoveStatistics::default();
    let mut max_drift: f64 = 0.0;
    let mut samples = Vec::new();

    reporter.report(Progress::StepsStart {
        total: config.steps,
    });
    for step in 1..=config.steps {
        let molecule = rng.random_range(0..system.molecules().len());
        let atoms = system.molecules()[molecule].atoms.clone();

        if let [atom] = atoms[..] {
            let displacement = random_displacement(&mut rng, config.atom_step);
            let position = system.atoms()[atom].position + displacement;
            let trial = compute.compute_one(state, system, atom, position)?;
            let delta_u = trial.energy() - compute.compute_one_old(state, atom)?;

            atom_moves.attempted += 1;
            if metropolis(&mut rng, beta, delta_u) {
                compute.process_atom_u(state, trial, 1.0);
                system.set_position(atom, position)?;
                atom_moves.accepted += 1;
            } else {
                compute.process_atom_u(state, trial, -1.0);
            }
        } else {
            let displacement = random_displacement(&mut rng, config.molecule_step);
            let moves: Vec<(usize, Point3<f64>)> = atoms
                .iter()
                .map(|&a| (a, system.atoms()[a].position + displacement))
                .collect();
            let old = compute.compute_many_atoms_old(state, system, &atoms)?;
            let trial = compute.compute_many_atoms(state, system, &moves)?;
            let delta_u = trial.energy() - old;

            molecule_moves.attempted += 1;
            if metropolis(&mut rng, beta, delta_u) {
                compute.process_atom_u(state, trial, 1.0);
                for (atom, position) in moves {
                    system.set_position(atom, position)?;
                }
                molecule_moves.accepted += 1;
            } else {
                compute.process_atom_u(state, trial, -1.0);
            }
        }

        if step % config.sample_interval == 0 {
            let attempted = atom_moves.attempted + molecule_moves.attempted;
            let accepted = atom_moves.accepted + molecule_moves.accepted;
            samples.push(EnergySample {
                step,
                energy: state.energy(),
                acceptance: accepted as f64 / attempted as f64,
            });
        }

        if step % config.check_interval == 0 {
            let tracked = state.energy();
            let recomputed = compute.compute_all(state, system, false, None)?;
            let drift = (tracked - recomputed).abs();
            max_drift = max_drift.max(drift);
            reporter.report(Progress::EnergyCheck {
                step,
                tracked,
                recomputed,
            });
            if drift > config.drift_tolerance * recomputed.abs().max(1.0) {
                warn!(
                    "Energy drift at step {}: tracked {:.10}, recomputed {:.10} (difference {:.3e}). Resetting to recomputed value.",
                    step, tracked, recomputed, drift
                );
            } else {
                debug!(step, drift, "Energy check passed");
            }
        }

        reporter.report(Progress::StepsAdvance { count: 1 });
    }
    reporter.report(Progress::StepsFinish);
    reporter.report(Progress::PhaseFinish);

    let summary = MonteCarloSummary {
        steps: config.steps,
        atom_moves,
        molecule_moves,
        initial_energy,
        final_energy: state.energy(),
        max_drift,
        samples,
    };
    info!(
        "Sampling complete. Final energy {:.6}, acceptance {:.3}, max drift {:.3e}.",
        summary.final_energy,
        summary.acceptance(),
        summary.max_drift
    );
    Ok(summary)
}

fn random_displacement(rng: &mut impl Rng, step: f64) -> Vector3<f64> {
    Vector3::from_fn(|_, _| rng.random_range(-step..step))
}

fn metropolis(rng: &mut impl Rng, beta: f64, delta_u: f64) -> bool {
    delta_u <= 0.0 || rng.random::<f64>() < (-beta * delta_u).exp()
}
