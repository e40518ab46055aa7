//! # Workflows Module
//!
//! High-level procedures that drive the engine over a loaded system.
//!
//! ## Architecture
//!
//! - **Monte Carlo** ([`monte_carlo`]) - Metropolis sampling with single-atom and
//!   rigid-molecule translations, periodic drift checks against a full recomputation,
//!   and energy samples for output.
//!
//! Workflows own no state of their own. The caller supplies the
//! [`System`](crate::core::models::system::System), the
//! [`PairCompute`](crate::engine::compute::PairCompute) engine and its
//! [`EnergyState`](crate::engine::state::EnergyState), and receives progress through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter).

pub mod monte_carlo;
