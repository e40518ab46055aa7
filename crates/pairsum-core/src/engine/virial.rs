use crate::core::models::system::System;
use nalgebra::Vector3;
use std::fmt::Debug;

/// Converts the atomic virial of a molecular system into its molecular counterpart.
///
/// The returned value is added to the pair virial after a full recomputation with
/// forces, for systems that are not purely atomic.
pub trait IntramolecularVirial: Debug + Send + Sync {
    fn virial(&self, system: &System, forces: &[Vector3<f64>]) -> f64;
}

/// `Σ f_i · (r_i − R_com)` over all atoms of polyatomic molecules, with the centre of
/// mass located by minimum image relative to each molecule's first atom.
///
/// Molecules whose total mass is not positive use equal weights.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterOfMassVirial;

impl IntramolecularVirial for CenterOfMassVirial {
    fn virial(&self, system: &System, forces: &[Vector3<f64>]) -> f64 {
        let atoms = system.atoms();
        let types = system.atom_types();
        let boundary = system.boundary();
        let mut virial = 0.0;
        let mut offsets: Vec<Vector3<f64>> = Vec::new();

        for molecule in system.molecules().iter().filter(|m| m.atom_count() > 1) {
            let anchor = atoms[molecule.atoms[0]].position;
            offsets.clear();
            offsets.extend(molecule.atoms.iter().map(|&a| {
                let mut dr = atoms[a].position - anchor;
                boundary.nearest_image(&mut dr);
                dr
            }));

            let total_mass: f64 = molecule.atoms.iter().map(|&a| types[atoms[a].type_id].mass).sum();
            let com = if total_mass > 0.0 {
                molecule
                    .atoms
                    .iter()
                    .zip(&offsets)
                    .map(|(&a, dr)| dr * types[atoms[a].type_id].mass)
                    .sum::<Vector3<f64>>()
                    / total_mass
            } else {
                offsets.iter().sum::<Vector3<f64>>() / offsets.len() as f64
            };

            for (&a, dr) in molecule.atoms.iter().zip(&offsets) {
                virial += forces[a].dot(&(dr - com));
            }
        }
        virial
    }
}
