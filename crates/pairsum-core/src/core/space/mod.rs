//! # Space Module
//!
//! Simulation cell geometry. The compute engine talks to the cell only through the
//! [`boundary::Boundary`] trait; [`boundary::PeriodicBox`] is the rectangular
//! implementation used by the bundled workflows and the CLI.

pub mod boundary;
