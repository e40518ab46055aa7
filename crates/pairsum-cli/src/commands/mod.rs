pub mod energy;
pub mod mc;

use crate::error::Result;
use pairsum::core::io::system_file::{SystemFile, SystemSetup};
use pairsum::core::models::system::System;
use pairsum::engine::compute::PairCompute;
use pairsum::engine::config::EngineConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loads a system file and builds the compute engine for it.
fn load_system(path: &Path, config: EngineConfig) -> Result<(System, PairCompute)> {
    info!("Loading system description from {:?}", path);
    let SystemSetup {
        system,
        potentials,
        near_core,
        bonding,
    } = SystemFile::load(path)?.build()?;
    info!(
        "Loaded {} atoms in {} molecules of {} species.",
        system.atom_count(),
        system.molecules().len(),
        system.species().len()
    );
    let compute =
        PairCompute::new(potentials, Arc::new(bonding), config).with_near_core_scale(near_core);
    Ok((system, compute))
}
