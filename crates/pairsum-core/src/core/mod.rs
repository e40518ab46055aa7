//! # Core Module
//!
//! The stateless building blocks the compute engine is written against.
//!
//! ## Architecture
//!
//! - **Cell geometry** ([`space`]) - The [`space::boundary::Boundary`] trait and a periodic box
//! - **Interactions** ([`potentials`]) - Pair potentials, cutoffs, the potential and
//!   near-core scale tables, and their parameter records
//! - **Exclusions** ([`bonding`]) - Which intramolecular pairs are skipped and how many
//!   bonds apart two atoms are
//! - **Molecular Representation** ([`models`]) - Atom types, species, molecules and the system
//! - **File I/O** ([`io`]) - TOML system descriptions
//!
//! None of these types know about energies accumulated over a configuration; that state
//! lives in [`crate::engine`].

pub mod bonding;
pub mod io;
pub mod models;
pub mod potentials;
pub mod space;
