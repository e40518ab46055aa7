//! # Core Models Module
//!
//! Data structures describing what is being simulated: atom types, species,
//! molecules, atoms and the [`system::System`] that owns them together with the
//! simulation cell.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom types and individual atoms
//! - [`species`] - Molecule templates and molecule instances
//! - [`system`] - The complete system, its mutation methods and the
//!   [`system::SystemEvent`]s they emit
//!
//! ## Usage
//!
//! ```ignore
//! use pairsum::core::models::system::System;
//!
//! let mut system = System::new(Arc::new(PeriodicBox::cubic(20.0)?));
//! let ar = system.add_atom_type("Ar", 39.948)?;
//! let argon = system.add_species("argon", vec![ar])?;
//! let (_, events) = system.add_molecule(argon, &[Point3::origin()])?;
//! ```

pub mod atom;
pub mod species;
pub mod system;
