use crate::core::bonding::SpeciesBonding;
use crate::core::models::system::System;
use crate::core::potentials::params::{ParamLoadError, PotentialParam};
use crate::core::potentials::table::{NearCoreScale, PotentialTable};
use crate::core::space::boundary::PeriodicBox;
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::f64::consts::PI;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

const MAX_INSERTION_ATTEMPTS: usize = 10_000;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BoxSection {
    pub dimensions: [f64; 3],
    #[serde(default = "all_periodic")]
    pub periodic: [bool; 3],
}

fn all_periodic() -> [bool; 3] {
    [true; 3]
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomTypeEntry {
    pub name: String,
    #[serde(default = "unit_mass")]
    pub mass: f64,
}

fn unit_mass() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NearCoreEntry {
    pub types: [String; 2],
    pub bonded_distance: usize,
    pub factor: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SpeciesEntry {
    pub name: String,
    pub atoms: Vec<String>,
    /// Atom positions relative to the molecule origin; required to insert polyatomic
    /// species at random.
    pub template: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    pub bonds: Vec<[usize; 2]>,
    #[serde(default)]
    pub angles: Vec<[usize; 3]>,
    #[serde(default)]
    pub torsions: Vec<[usize; 4]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MoleculeEntry {
    pub species: String,
    pub positions: Vec<[f64; 3]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InsertEntry {
    pub species: String,
    pub count: usize,
}

/// TOML description of a system: its cell, atom types, pair potentials, species and
/// initial molecules.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SystemFile {
    /// Seed for random insertion; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Smallest allowed distance between a randomly inserted atom and any existing atom.
    pub min_separation: Option<f64>,
    #[serde(rename = "box")]
    pub cell: BoxSection,
    pub atom_types: Vec<AtomTypeEntry>,
    #[serde(default)]
    pub potentials: Vec<PotentialParam>,
    #[serde(default)]
    pub near_core: Vec<NearCoreEntry>,
    pub species: Vec<SpeciesEntry>,
    #[serde(default)]
    pub molecules: Vec<MoleculeEntry>,
    #[serde(default)]
    pub insert: Vec<InsertEntry>,
}

/// Everything the compute engine needs, built from a [`SystemFile`].
#[derive(Debug, Clone)]
pub struct SystemSetup {
    pub system: System,
    pub potentials: PotentialTable,
    pub near_core: NearCoreScale,
    pub bonding: SpeciesBonding,
}

impl FromStr for SystemFile {
    type Err = ParamLoadError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })
    }
}

impl SystemFile {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Builds the system, potential tables and bonding rules described by this file.
    pub fn build(&self) -> Result<SystemSetup, ParamLoadError> {
        let cell = PeriodicBox::new(Vector3::from(self.cell.dimensions))?
            .with_periodicity(self.cell.periodic);
        let mut system = System::new(Arc::new(cell));

        for entry in &self.atom_types {
            if !(entry.mass.is_finite() && entry.mass >= 0.0) {
                return Err(ParamLoadError::InvalidParameter {
                    context: format!("atom type {}", entry.name),
                    reason: format!("mass must be non-negative, got {}", entry.mass),
                });
            }
            system.add_atom_type(&entry.name, entry.mass)?;
        }
        let type_count = system.atom_types().len();

        let mut potentials = PotentialTable::new(type_count);
        for param in &self.potentials {
            let a = type_id(&system, &param.types[0])?;
            let b = type_id(&system, &param.types[1])?;
            potentials.set(a, b, param.build()?);
        }

        let mut near_core = NearCoreScale::new(type_count);
        for entry in &self.near_core {
            if !entry.factor.is_finite() {
                return Err(ParamLoadError::InvalidParameter {
                    context: format!("near-core {}-{}", entry.types[0], entry.types[1]),
                    reason: format!("factor must be finite, got {}", entry.factor),
                });
            }
            let a = type_id(&system, &entry.types[0])?;
            let b = type_id(&system, &entry.types[1])?;
            near_core.set(a, b, entry.bonded_distance, entry.factor);
        }

        for entry in &self.species {
            let types = entry
                .atoms
                .iter()
                .map(|name| type_id(&system, name))
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(template) = &entry.template {
                if template.len() != types.len() {
                    return Err(ParamLoadError::InvalidParameter {
                        context: format!("species {}", entry.name),
                        reason: format!(
                            "template has {} positions for {} atoms",
                            template.len(),
                            types.len()
                        ),
                    });
                }
            }
            system.add_species(&entry.name, types)?;
        }

        let mut bonding = SpeciesBonding::new(&system);
        for (species, entry) in self.species.iter().enumerate() {
            if !entry.bonds.is_empty() {
                bonding.add_bonds(species, &entry.bonds)?;
            }
            if !entry.angles.is_empty() {
                bonding.add_angles(species, &entry.angles)?;
            }
            if !entry.torsions.is_empty() {
                bonding.add_torsions(species, &entry.torsions)?;
            }
        }

        for entry in &self.molecules {
            let species = species_id(&system, &entry.species)?;
            let positions: Vec<Point3<f64>> = entry.positions.iter().map(|&p| Point3::from(p)).collect();
            system.add_molecule(species, &positions)?;
        }

        if !self.insert.is_empty() {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            for entry in &self.insert {
                self.insert_random(&mut system, entry, &mut rng)?;
            }
        }

        debug!(
            atoms = system.atom_count(),
            molecules = system.molecules().len(),
            types = type_count,
            "Built system from description"
        );

        Ok(SystemSetup {
            system,
            potentials,
            near_core,
            bonding,
        })
    }

    fn insert_random(&self, system: &mut System, entry: &InsertEntry, rng: &mut impl Rng) -> Result<(), ParamLoadError> {
        let species = species_id(system, &entry.species)?;
        let spec = &self.species[species];
        let template: Vec<Vector3<f64>> = match &spec.template {
            Some(template) => template.iter().map(|&p| Vector3::from(p)).collect(),
            None if spec.atoms.len() == 1 => vec![Vector3::zeros()],
            None => {
                return Err(ParamLoadError::InvalidParameter {
                    context: format!("species {}", spec.name),
                    reason: "a template is required for random insertion".to_string(),
                });
            }
        };
        let dimensions = system.boundary().dimensions();

        for _ in 0..entry.count {
            let mut placed = false;
            for _ in 0..MAX_INSERTION_ATTEMPTS {
                let origin = Vector3::new(
                    (rng.random::<f64>() - 0.5) * dimensions.x,
                    (rng.random::<f64>() - 0.5) * dimensions.y,
                    (rng.random::<f64>() - 0.5) * dimensions.z,
                );
                let rotation = random_rotation(rng);
                let positions: Vec<Point3<f64>> = template
                    .iter()
                    .map(|offset| Point3::from(origin + rotation * offset))
                    .collect();
                if self.is_clear(system, &positions) {
                    system.add_molecule(species, &positions)?;
                    placed = true;
                    break;
                }
            }
            if !placed {
                return Err(ParamLoadError::InvalidParameter {
                    context: format!("insert {}", entry.species),
                    reason: format!(
                        "no free position found after {MAX_INSERTION_ATTEMPTS} attempts"
                    ),
                });
            }
        }
        Ok(())
    }

    fn is_clear(&self, system: &System, positions: &[Point3<f64>]) -> bool {
        let Some(min_separation) = self.min_separation else {
            return true;
        };
        let min2 = min_separation * min_separation;
        let boundary = system.boundary();
        positions.iter().all(|p| {
            system.atoms().iter().all(|atom| {
                let mut dr = atom.position - *p;
                boundary.nearest_image(&mut dr);
                dr.norm_squared() >= min2
            })
        })
    }
}

fn type_id(system: &System, name: &str) -> Result<usize, ParamLoadError> {
    system
        .atom_type_id(name)
        .ok_or_else(|| ParamLoadError::UnknownAtomType(name.to_string()))
}

fn species_id(system: &System, name: &str) -> Result<usize, ParamLoadError> {
    system
        .species_id(name)
        .ok_or_else(|| ParamLoadError::UnknownSpecies(name.to_string()))
}

/// Uniformly distributed rotation (Shoemake's method).
fn random_rotation(rng: &mut impl Rng) -> UnitQuaternion<f64> {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();
    let u3: f64 = rng.random();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    let (t2, t3) = (2.0 * PI * u2, 2.0 * PI * u3);
    UnitQuaternion::from_quaternion(Quaternion::new(
        b * t3.cos(),
        a * t2.sin(),
        a * t2.cos(),
        b * t3.sin(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bonding::BondingInfo;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const DIMER_FILE: &str = r#"
        seed = 7
        min-separation = 0.8

        [box]
        dimensions = [12.0, 12.0, 12.0]

        [[atom-types]]
        name = "A"
        mass = 1.0

        [[atom-types]]
        name = "B"
        mass = 3.0

        [[potentials]]
        types = ["A", "A"]
        kind = "lennard-jones"
        sigma = 1.0
        epsilon = 1.0
        cutoff = 3.0

        [[potentials]]
        types = ["A", "B"]
        kind = "soft-sphere"
        epsilon = 1.0
        sigma = 1.0
        exponent = 12

        [[near-core]]
        types = ["B", "A"]
        bonded-distance = 1
        factor = 0.5

        [[species]]
        name = "atom"
        atoms = ["A"]

        [[species]]
        name = "dimer"
        atoms = ["A", "B"]
        template = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]
        bonds = [[0, 1]]

        [[molecules]]
        species = "dimer"
        positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]

        [[insert]]
        species = "atom"
        count = 10

        [[insert]]
        species = "dimer"
        count = 3
    "#;

    #[test]
    fn build_creates_system_tables_and_bonding() {
        let setup = DIMER_FILE.parse::<SystemFile>().unwrap().build().unwrap();
        let system = &setup.system;

        assert_eq!(system.atom_count(), 2 + 10 + 6);
        assert_eq!(system.molecules().len(), 14);
        assert_eq!(system.atom_count_by_type(), vec![14, 4]);
        assert!(setup.potentials.get(0, 0).is_some());
        assert!(setup.potentials.get(1, 0).is_some());
        assert!(setup.potentials.get(1, 1).is_none());
        assert_eq!(setup.near_core.factor(0, 1, 1), 0.5);
        assert!(setup.bonding.skip_pair(system, system.is_pure_atoms(), 0, 1));
        assert_eq!(setup.bonding.bonded_distance(system, 0, 1), 1);
    }

    #[test]
    fn random_insertion_respects_min_separation_and_seed() {
        let first = DIMER_FILE.parse::<SystemFile>().unwrap().build().unwrap();
        let second = DIMER_FILE.parse::<SystemFile>().unwrap().build().unwrap();
        let system = &first.system;
        let atoms = system.atoms();
        for i in 0..atoms.len() {
            assert_eq!(atoms[i].position, second.system.atoms()[i].position);
            for j in (i + 1)..atoms.len() {
                if atoms[i].molecule == atoms[j].molecule {
                    continue;
                }
                let mut dr = atoms[j].position - atoms[i].position;
                system.boundary().nearest_image(&mut dr);
                assert!(dr.norm() >= 0.8 - 1e-12);
            }
        }
    }

    #[test]
    fn inserted_polyatomic_molecules_keep_template_geometry() {
        let setup = DIMER_FILE.parse::<SystemFile>().unwrap().build().unwrap();
        let system = &setup.system;
        for molecule in system.molecules().iter().filter(|m| m.atom_count() == 2) {
            let mut dr = system.atoms()[molecule.atoms[1]].position
                - system.atoms()[molecule.atoms[0]].position;
            system.boundary().nearest_image(&mut dr);
            assert!((dr.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.toml");
        let mut file = File::create(&path).unwrap();
        write!(file, "{DIMER_FILE}").unwrap();

        let parsed = SystemFile::load(&path).unwrap();
        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.species.len(), 2);
        assert_eq!(parsed.cell.periodic, [true; 3]);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = SystemFile::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn build_rejects_unknown_names() {
        let content = r#"
            [box]
            dimensions = [5.0, 5.0, 5.0]

            [[atom-types]]
            name = "A"

            [[species]]
            name = "atom"
            atoms = ["Z"]
        "#;
        let result = content.parse::<SystemFile>().unwrap().build();
        assert!(matches!(result, Err(ParamLoadError::UnknownAtomType(name)) if name == "Z"));
    }

    #[test]
    fn build_rejects_polyatomic_insertion_without_template() {
        let content = r#"
            [box]
            dimensions = [5.0, 5.0, 5.0]

            [[atom-types]]
            name = "A"

            [[species]]
            name = "pair"
            atoms = ["A", "A"]

            [[insert]]
            species = "pair"
            count = 1
        "#;
        let result = content.parse::<SystemFile>().unwrap().build();
        assert!(matches!(result, Err(ParamLoadError::InvalidParameter { .. })));
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        let content = r#"
            [box]
            dimensions = [5.0, 5.0, 5.0]
            shape = "cubic"
        "#;
        assert!(matches!(
            content.parse::<SystemFile>(),
            Err(ParamLoadError::Toml { .. })
        ));
    }
}
