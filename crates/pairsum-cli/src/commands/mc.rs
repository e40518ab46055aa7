use crate::cli::McArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use pairsum::engine::progress::ProgressReporter;
use pairsum::engine::state::EnergyState;
use pairsum::workflows::monte_carlo::{self, EnergySample, MonteCarloSummary};
use std::path::Path;
use tracing::info;

pub fn run(args: McArgs) -> Result<()> {
    let partial = PartialRunConfig::from_optional_file(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let (engine_config, mc_config) = partial.merge_with_cli(&args)?;

    let (mut system, compute) = super::load_system(&args.system, engine_config)?;
    let mut state = EnergyState::new(&system);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting Monte Carlo sampling ({} steps)...", mc_config.steps);
    info!("Invoking the Monte Carlo workflow...");
    let summary = monte_carlo::run(&mut system, &compute, &mut state, &mc_config, &reporter)?;

    print_summary(&summary);

    if let Some(output) = &args.output {
        write_samples(output, &summary.samples)?;
        println!(
            "✓ {} energy samples written to: {}",
            summary.samples.len(),
            output.display()
        );
    }
    Ok(())
}

fn print_summary(summary: &MonteCarloSummary) {
    println!("Initial energy:       {:.10}", summary.initial_energy);
    println!("Final energy:         {:.10}", summary.final_energy);
    println!(
        "Atom moves:           {} / {} accepted ({:.1}%)",
        summary.atom_moves.accepted,
        summary.atom_moves.attempted,
        100.0 * summary.atom_moves.acceptance()
    );
    println!(
        "Molecule moves:       {} / {} accepted ({:.1}%)",
        summary.molecule_moves.accepted,
        summary.molecule_moves.attempted,
        100.0 * summary.molecule_moves.acceptance()
    );
    println!("Largest energy drift: {:.3e}", summary.max_drift);
}

fn write_samples(path: &Path, samples: &[EnergySample]) -> Result<()> {
    info!("Writing {} energy samples to {:?}", samples.len(), path);
    let mut writer = csv::Writer::from_path(path)?;
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}
