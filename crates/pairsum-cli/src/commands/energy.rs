use crate::cli::EnergyArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use pairsum::core::models::system::System;
use pairsum::engine::callback::{PairCallback, PairStatistics};
use pairsum::engine::error::EngineError;
use pairsum::engine::state::EnergyState;
use std::fmt::Write;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    let config = PartialRunConfig::from_optional_file(args.config.as_deref())?
        .engine_config(args.no_tail);
    let (system, compute) = super::load_system(&args.system, config)?;

    let mut state = EnergyState::new(&system);
    let mut stats = PairStatistics::default();
    let callback: Option<&mut dyn PairCallback> = if args.pair_stats {
        Some(&mut stats)
    } else {
        None
    };

    info!("Computing all pair interactions...");
    compute
        .compute_all(&mut state, &system, args.forces, callback)
        .map_err(EngineError::from)?;

    let stats = args.pair_stats.then_some(&stats);
    print!("{}", format_report(&system, &state, stats));
    Ok(())
}

fn format_report(system: &System, state: &EnergyState, stats: Option<&PairStatistics>) -> String {
    let mut out = String::new();
    let atoms = system.atom_count();
    let _ = writeln!(out, "Atoms:            {}", atoms);
    let _ = writeln!(out, "Molecules:        {}", system.molecules().len());
    let _ = writeln!(out, "Volume:           {:.6}", system.boundary().volume());

    let counts = system
        .atom_types()
        .iter()
        .zip(state.atom_count_by_type())
        .map(|(t, n)| format!("{}={}", t.name, n))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "Atoms by type:    {}", counts);

    let _ = writeln!(out, "Energy:           {:.10}", state.energy());
    if atoms > 0 {
        let _ = writeln!(out, "Energy per atom:  {:.10}", state.energy() / atoms as f64);
    }
    let _ = writeln!(out, "Virial:           {:.10}", state.virial());

    if let Some(forces) = state.forces() {
        let max_force = forces.iter().map(|f| f.norm()).fold(0.0, f64::max);
        let _ = writeln!(out, "Largest |force|:  {:.10}", max_force);
    }
    if let Some(stats) = stats {
        let _ = writeln!(out, "Pairs evaluated:  {} ({} interacting)", stats.pairs, stats.interacting);
        if let Some(r) = stats.min_distance {
            let _ = writeln!(out, "Closest approach: {:.6}", r);
        }
    }
    out
}
