//! # Potentials Module
//!
//! Pair potentials consumed by the compute engine and the tables that map atom-type
//! pairs onto them.
//!
//! ## Key Components
//!
//! - [`pair::PairPotential`] - The trait every functional form implements
//! - [`functions`] - Lennard-Jones, soft-sphere and Buckingham exp-6 forms
//! - [`truncation`] - Cutoff wrappers (plain and energy-shifted)
//! - [`table`] - The symmetric potential table and the near-core scale table
//! - [`params`] - Deserializable parameter records and their validation
//!
//! Every form returns the energy together with `r·dU/dr` and `r²·d²U/dr²` from a
//! single call on the squared separation, and may provide closed-form tail integrals
//! for the long-range correction.

pub mod functions;
pub mod pair;
pub mod params;
pub mod table;
pub mod term;
pub mod truncation;
