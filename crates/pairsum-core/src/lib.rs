//! # pairsum
//!
//! A pairwise-interaction energy engine for particle simulations in a periodic box.
//!
//! The engine evaluates the total potential energy, per-atom energies, forces and virial
//! of a system of atoms interacting through short-ranged pair potentials, and supports
//! cheap incremental re-evaluation when one atom or a rigid group of atoms is displaced,
//! as needed by Monte Carlo sampling.
//!
//! ## Architectural Philosophy
//!
//! - **[`core`]: The Foundation.** Stateless data: the particle [`System`] with its
//!   species and molecules, the periodic [`Boundary`], pair potentials and their type
//!   tables, bonded-exclusion topology, and the TOML system-file loader.
//!
//! - **[`engine`]: The Logic Core.** [`PairCompute`] performs full recomputation
//!   (`compute_all`) and incremental trials (`compute_one`, `compute_many_atoms`) over a
//!   caller-owned [`EnergyState`]. Trials are owned values that are either committed or
//!   discarded.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built on the engine, such as
//!   Metropolis Monte Carlo.
//!
//! [`System`]: core::models::system::System
//! [`Boundary`]: core::space::boundary::Boundary
//! [`PairCompute`]: engine::compute::PairCompute
//! [`EnergyState`]: engine::state::EnergyState

pub mod core;
pub mod engine;
pub mod workflows;
