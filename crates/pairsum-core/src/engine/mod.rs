//! # Engine Module
//!
//! The stateful layer: full and incremental pair-energy evaluation over a
//! [`System`](crate::core::models::system::System).
//!
//! ## Architecture
//!
//! - **Computation** ([`compute`]) - [`compute::PairCompute`], the all-pairs engine with
//!   single- and multi-atom trial evaluation
//! - **State** ([`state`]) - Per-atom energies, forces and totals owned by the caller
//! - **Trials** ([`trial`]) - Uncommitted energy changes, consumed by commit or discard
//! - **Long-range correction** ([`tail`]) - Analytic tail estimates from per-type counts
//! - **Hooks** ([`callback`], [`virial`]) - Per-pair instrumentation and the
//!   intramolecular virial correction
//! - **Configuration** ([`config`]) - Engine switches and Monte Carlo parameters
//! - **Progress Monitoring** ([`progress`]) - Progress reporting for long runs
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Trial discipline
//!
//! Incremental evaluation borrows the state immutably and returns an owned
//! [`trial::Trial`]; applying it needs the state mutably. A trial can therefore only be
//! applied once, and a debug assertion catches trials applied after the state has
//! changed underneath them.

pub mod callback;
pub mod compute;
pub mod config;
pub mod error;
pub mod progress;
pub mod state;
pub mod tail;
pub mod trial;
pub mod virial;
