use nalgebra::Point3;

/// A kind of atom. Its position in [`System::atom_types`](super::system::System::atom_types)
/// is the type id used to index the potential table and the per-type counts.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomType {
    /// Unique name, e.g. `"Ar"` or `"CH3"`.
    pub name: String,
    /// Mass in the system's unit of mass; used to locate molecular centres of mass.
    pub mass: f64,
}

impl AtomType {
    pub fn new(name: &str, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            mass,
        }
    }
}

/// A single atom of the system.
///
/// Atoms are stored densely and their index in the system is the index the compute
/// engine uses for its per-atom arrays. Removing a molecule may renumber atoms; the
/// system reports every renumbering as a [`SystemEvent`](super::system::SystemEvent).
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Position inside the primary cell.
    pub position: Point3<f64>,
    /// Index into the system's atom types.
    pub type_id: usize,
    /// Index of the owning molecule.
    pub molecule: usize,
    /// Position of this atom within its molecule's atom list (and species template).
    pub index_in_molecule: usize,
}

impl Atom {
    pub fn new(position: Point3<f64>, type_id: usize, molecule: usize, index_in_molecule: usize) -> Self {
        Self {
            position,
            type_id,
            molecule,
            index_in_molecule,
        }
    }
}
