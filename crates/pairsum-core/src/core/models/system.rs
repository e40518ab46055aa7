use super::atom::{Atom, AtomType};
use super::species::{Molecule, Species};
use crate::core::space::boundary::Boundary;
use nalgebra::Point3;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SystemError {
    #[error("Atom type '{0}' is already defined")]
    DuplicateAtomType(String),
    #[error("Species '{0}' is already defined")]
    DuplicateSpecies(String),
    #[error("Atom type id {0} does not exist")]
    UnknownAtomType(usize),
    #[error("Species id {0} does not exist")]
    UnknownSpecies(usize),
    #[error("Species '{0}' has no atoms")]
    EmptySpecies(String),
    #[error("Species '{species}' has {expected} atoms but {found} positions were given")]
    PositionCountMismatch {
        species: String,
        expected: usize,
        found: usize,
    },
    #[error("Molecule {0} does not exist")]
    MoleculeNotFound(usize),
    #[error("Atom {0} does not exist")]
    AtomNotFound(usize),
}

/// A change to the atom population that per-atom bookkeeping must follow.
///
/// Events are returned by the mutating methods of [`System`] and must be applied in
/// order. A removal is reported atom by atom: each `AtomRemoved` is followed by an
/// `AtomRenumbered` when the last atom was moved into the vacated slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    AtomAdded { index: usize, type_id: usize },
    AtomRemoved { index: usize, type_id: usize },
    AtomRenumbered { from: usize, to: usize },
}

/// The particles being simulated, their molecular grouping and the cell they live in.
///
/// Atoms are stored densely: atom `i` is always `atoms()[i]`, and every atom of a
/// molecule is listed by index in [`Molecule::atoms`].
#[derive(Debug, Clone)]
pub struct System {
    boundary: Arc<dyn Boundary>,
    atom_types: Vec<AtomType>,
    atom_type_lookup: HashMap<String, usize>,
    species: Vec<Species>,
    species_lookup: HashMap<String, usize>,
    molecules: Vec<Molecule>,
    atoms: Vec<Atom>,
}

impl System {
    /// Creates an empty system in the given cell.
    pub fn new(boundary: Arc<dyn Boundary>) -> Self {
        Self {
            boundary,
            atom_types: Vec::new(),
            atom_type_lookup: HashMap::new(),
            species: Vec::new(),
            species_lookup: HashMap::new(),
            molecules: Vec::new(),
            atoms: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &dyn Boundary {
        self.boundary.as_ref()
    }

    /// Replaces the cell. Positions are wrapped into the new cell.
    pub fn set_boundary(&mut self, boundary: Arc<dyn Boundary>) {
        self.boundary = boundary;
        for atom in &mut self.atoms {
            self.boundary.wrap(&mut atom.position);
        }
    }

    /// Registers a new atom type.
    ///
    /// # Return
    ///
    /// The id of the new type.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::DuplicateAtomType`] if the name is taken.
    pub fn add_atom_type(&mut self, name: &str, mass: f64) -> Result<usize, SystemError> {
        if self.atom_type_lookup.contains_key(name) {
            return Err(SystemError::DuplicateAtomType(name.to_string()));
        }
        let id = self.atom_types.len();
        self.atom_types.push(AtomType::new(name, mass));
        self.atom_type_lookup.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers a new species built from existing atom types.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, the list is empty or a type id is unknown.
    pub fn add_species(&mut self, name: &str, atom_types: Vec<usize>) -> Result<usize, SystemError> {
        if self.species_lookup.contains_key(name) {
            return Err(SystemError::DuplicateSpecies(name.to_string()));
        }
        if atom_types.is_empty() {
            return Err(SystemError::EmptySpecies(name.to_string()));
        }
        if let Some(&bad) = atom_types.iter().find(|&&t| t >= self.atom_types.len()) {
            return Err(SystemError::UnknownAtomType(bad));
        }
        let id = self.species.len();
        self.species.push(Species::new(name, atom_types));
        self.species_lookup.insert(name.to_string(), id);
        Ok(id)
    }

    /// Inserts a molecule of `species` with its atoms at `positions` (wrapped into the cell).
    ///
    /// # Arguments
    ///
    /// * `species` - Species id of the new molecule.
    /// * `positions` - One position per species atom, in species order.
    ///
    /// # Return
    ///
    /// The new molecule's index and one [`SystemEvent::AtomAdded`] per new atom.
    pub fn add_molecule(
        &mut self,
        species: usize,
        positions: &[Point3<f64>],
    ) -> Result<(usize, Vec<SystemEvent>), SystemError> {
        let template = self
            .species
            .get(species)
            .ok_or(SystemError::UnknownSpecies(species))?;
        if template.atom_count() != positions.len() {
            return Err(SystemError::PositionCountMismatch {
                species: template.name.clone(),
                expected: template.atom_count(),
                found: positions.len(),
            });
        }

        let molecule = self.molecules.len();
        let first = self.atoms.len();
        let mut events = Vec::with_capacity(positions.len());
        for (k, (&type_id, position)) in template.atom_types.iter().zip(positions).enumerate() {
            let mut position = *position;
            self.boundary.wrap(&mut position);
            self.atoms.push(Atom::new(position, type_id, molecule, k));
            events.push(SystemEvent::AtomAdded {
                index: first + k,
                type_id,
            });
        }
        self.molecules
            .push(Molecule::new(species, (first..first + positions.len()).collect()));
        Ok((molecule, events))
    }

    /// Removes a molecule and its atoms.
    ///
    /// Atoms are removed in descending index order, each vacated slot being filled by
    /// the current last atom; the last molecule likewise takes the removed molecule's
    /// index.
    ///
    /// # Return
    ///
    /// The removal and renumbering events, in the order they happened.
    pub fn remove_molecule(&mut self, molecule: usize) -> Result<Vec<SystemEvent>, SystemError> {
        if molecule >= self.molecules.len() {
            return Err(SystemError::MoleculeNotFound(molecule));
        }
        let mut doomed = self.molecules[molecule].atoms.clone();
        doomed.sort_unstable_by(|a, b| b.cmp(a));

        let mut events = Vec::with_capacity(2 * doomed.len());
        for index in doomed {
            let removed = self.atoms.swap_remove(index);
            events.push(SystemEvent::AtomRemoved {
                index,
                type_id: removed.type_id,
            });
            if index < self.atoms.len() {
                let from = self.atoms.len();
                let moved = &self.atoms[index];
                self.molecules[moved.molecule].atoms[moved.index_in_molecule] = index;
                events.push(SystemEvent::AtomRenumbered { from, to: index });
            }
        }

        self.molecules.swap_remove(molecule);
        if molecule < self.molecules.len() {
            for &atom in &self.molecules[molecule].atoms {
                self.atoms[atom].molecule = molecule;
            }
        }
        Ok(events)
    }

    /// Moves an atom, wrapping the position into the cell.
    pub fn set_position(&mut self, atom: usize, position: Point3<f64>) -> Result<(), SystemError> {
        let slot = self
            .atoms
            .get_mut(atom)
            .ok_or(SystemError::AtomNotFound(atom))?;
        slot.position = position;
        self.boundary.wrap(&mut slot.position);
        Ok(())
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom_types(&self) -> &[AtomType] {
        &self.atom_types
    }

    pub fn atom_type_id(&self, name: &str) -> Option<usize> {
        self.atom_type_lookup.get(name).copied()
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn species_id(&self, name: &str) -> Option<usize> {
        self.species_lookup.get(name).copied()
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecule(&self, index: usize) -> Option<&Molecule> {
        self.molecules.get(index)
    }

    /// Species of the molecule that owns `atom`.
    pub fn species_of_atom(&self, atom: usize) -> Option<usize> {
        let molecule = self.atoms.get(atom)?.molecule;
        self.molecules.get(molecule).map(|m| m.species)
    }

    /// True when every species is monatomic, so no intramolecular bookkeeping applies.
    pub fn is_pure_atoms(&self) -> bool {
        self.species.iter().all(Species::is_atomic)
    }

    /// Number of atoms of each type, indexed by type id.
    pub fn atom_count_by_type(&self) -> Vec<usize> {
        let mut counts = vec![0; self.atom_types.len()];
        for atom in &self.atoms {
            counts[atom.type_id] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::space::boundary::PeriodicBox;

    fn setup() -> (System, usize, usize) {
        let mut system = System::new(Arc::new(PeriodicBox::cubic(10.0).unwrap()));
        let a = system.add_atom_type("A", 1.0).unwrap();
        let b = system.add_atom_type("B", 2.0).unwrap();
        let mono = system.add_species("mono", vec![a]).unwrap();
        let dimer = system.add_species("dimer", vec![a, b]).unwrap();
        (system, mono, dimer)
    }

    #[test]
    fn add_atom_type_rejects_duplicates() {
        let (mut system, _, _) = setup();
        assert_eq!(
            system.add_atom_type("A", 3.0),
            Err(SystemError::DuplicateAtomType("A".to_string()))
        );
        assert_eq!(system.atom_type_id("B"), Some(1));
    }

    #[test]
    fn add_species_validates_type_ids() {
        let (mut system, _, _) = setup();
        assert_eq!(
            system.add_species("bad", vec![0, 7]),
            Err(SystemError::UnknownAtomType(7))
        );
        assert_eq!(
            system.add_species("empty", vec![]),
            Err(SystemError::EmptySpecies("empty".to_string()))
        );
    }

    #[test]
    fn add_molecule_wraps_positions_and_reports_added_atoms() {
        let (mut system, _, dimer) = setup();
        let (molecule, events) = system
            .add_molecule(dimer, &[Point3::new(0.0, 0.0, 0.0), Point3::new(6.0, 0.0, 0.0)])
            .unwrap();
        assert_eq!(molecule, 0);
        assert_eq!(
            events,
            vec![
                SystemEvent::AtomAdded { index: 0, type_id: 0 },
                SystemEvent::AtomAdded { index: 1, type_id: 1 },
            ]
        );
        assert!((system.atoms()[1].position.x - (-4.0)).abs() < 1e-12);
        assert_eq!(system.molecule(0).unwrap().atoms, vec![0, 1]);
        assert!(!system.is_pure_atoms());
    }

    #[test]
    fn add_molecule_rejects_wrong_position_count() {
        let (mut system, _, dimer) = setup();
        let result = system.add_molecule(dimer, &[Point3::origin()]);
        assert!(matches!(
            result,
            Err(SystemError::PositionCountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn remove_molecule_renumbers_trailing_atoms_and_molecules() {
        let (mut system, mono, dimer) = setup();
        system.add_molecule(dimer, &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]).unwrap();
        system.add_molecule(mono, &[Point3::new(2.0, 0.0, 0.0)]).unwrap();
        system.add_molecule(mono, &[Point3::new(3.0, 0.0, 0.0)]).unwrap();

        let events = system.remove_molecule(0).unwrap();
        assert_eq!(
            events,
            vec![
                SystemEvent::AtomRemoved { index: 1, type_id: 1 },
                SystemEvent::AtomRenumbered { from: 3, to: 1 },
                SystemEvent::AtomRemoved { index: 0, type_id: 0 },
                SystemEvent::AtomRenumbered { from: 2, to: 0 },
            ]
        );

        assert_eq!(system.atom_count(), 2);
        assert_eq!(system.molecules().len(), 2);
        for (m, molecule) in system.molecules().iter().enumerate() {
            for (k, &atom) in molecule.atoms.iter().enumerate() {
                assert_eq!(system.atoms()[atom].molecule, m);
                assert_eq!(system.atoms()[atom].index_in_molecule, k);
            }
        }
        assert!((system.atoms()[0].position.x - 2.0).abs() < 1e-12);
        assert!((system.atoms()[1].position.x - 3.0).abs() < 1e-12);
        assert_eq!(system.atom_count_by_type(), vec![2, 0]);
    }

    #[test]
    fn remove_molecule_rejects_unknown_index() {
        let (mut system, _, _) = setup();
        assert_eq!(system.remove_molecule(0), Err(SystemError::MoleculeNotFound(0)));
    }

    #[test]
    fn set_position_wraps_and_validates_index() {
        let (mut system, mono, _) = setup();
        system.add_molecule(mono, &[Point3::origin()]).unwrap();
        system.set_position(0, Point3::new(0.0, 12.0, 0.0)).unwrap();
        assert!((system.atoms()[0].position.y - 2.0).abs() < 1e-12);
        assert_eq!(
            system.set_position(3, Point3::origin()),
            Err(SystemError::AtomNotFound(3))
        );
    }
}
