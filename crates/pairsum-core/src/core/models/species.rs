/// A template for molecules: an ordered list of atom types.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub atom_types: Vec<usize>,
}

impl Species {
    pub fn new(name: &str, atom_types: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            atom_types,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atom_types.len()
    }

    /// True for monatomic species.
    pub fn is_atomic(&self) -> bool {
        self.atom_types.len() == 1
    }
}

/// One instance of a [`Species`] in the system.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    /// Index into the system's species.
    pub species: usize,
    /// System-wide indices of the member atoms, in species order.
    pub atoms: Vec<usize>,
}

impl Molecule {
    pub fn new(species: usize, atoms: Vec<usize>) -> Self {
        Self { species, atoms }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}
