//! Intramolecular exclusion rules.
//!
//! The compute engine asks a [`BondingInfo`] two questions about every pair: whether
//! the pair is handled by bonded terms (and must be skipped), and how many bonds
//! separate the two atoms (to select a near-core scale factor).

use crate::core::models::system::System;
use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BondingError {
    #[error("Species id {0} does not exist")]
    UnknownSpecies(usize),
    #[error("Atom {index} is out of range for species {species} with {atom_count} atoms")]
    AtomOutOfRange {
        species: usize,
        index: usize,
        atom_count: usize,
    },
    #[error("Bonded tuple {0:?} lists the same atom twice")]
    RepeatedAtom(Vec<usize>),
}

pub trait BondingInfo: Debug + Send + Sync {
    /// True when the non-bonded interaction between atoms `i` and `j` must be skipped.
    fn skip_pair(&self, system: &System, is_pure_atoms: bool, i: usize, j: usize) -> bool;

    /// Number of bonds on the shortest path between `i` and `j`, or 0 when they are in
    /// different molecules or not connected.
    fn bonded_distance(&self, system: &System, i: usize, j: usize) -> usize;
}

/// Excludes nothing: every pair interacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonding;

impl BondingInfo for NoBonding {
    fn skip_pair(&self, _system: &System, _is_pure_atoms: bool, _i: usize, _j: usize) -> bool {
        false
    }

    fn bonded_distance(&self, _system: &System, _i: usize, _j: usize) -> usize {
        0
    }
}

#[derive(Debug, Clone, Default)]
struct SpeciesTopology {
    atom_count: usize,
    bonded: bool,
    bonds: Vec<[usize; 2]>,
    excluded: Vec<bool>,
    distance: Vec<usize>,
}

impl SpeciesTopology {
    fn new(atom_count: usize) -> Self {
        Self {
            atom_count,
            bonded: false,
            bonds: Vec::new(),
            excluded: vec![false; atom_count * atom_count],
            distance: vec![0; atom_count * atom_count],
        }
    }

    fn exclude_tuple(&mut self, tuple: &[usize]) {
        for (k, &a) in tuple.iter().enumerate() {
            for &b in &tuple[k + 1..] {
                self.excluded[a * self.atom_count + b] = true;
                self.excluded[b * self.atom_count + a] = true;
            }
        }
    }

    fn update_distances(&mut self) {
        let n = self.atom_count;
        let mut graph = UnGraph::<(), ()>::with_capacity(n, self.bonds.len());
        let nodes: Vec<NodeIndex> = (0..n).map(|_| graph.add_node(())).collect();
        for &[a, b] in &self.bonds {
            graph.update_edge(nodes[a], nodes[b], ());
        }

        self.distance.fill(0);
        for (a, &start) in nodes.iter().enumerate() {
            for (node, steps) in dijkstra(&graph, start, None, |_| 1usize) {
                self.distance[a * n + node.index()] = steps;
            }
        }
    }
}

/// Exclusions defined per species by bond, angle and torsion tuples.
///
/// Pairs that appear together in any tuple are excluded. A species without any
/// tuples is treated as rigid and all of its intramolecular pairs are excluded.
#[derive(Debug, Clone, Default)]
pub struct SpeciesBonding {
    topologies: Vec<SpeciesTopology>,
    only_rigid: bool,
}

impl SpeciesBonding {
    /// Creates an empty table with one entry per species currently in `system`.
    pub fn new(system: &System) -> Self {
        Self {
            topologies: system
                .species()
                .iter()
                .map(|s| SpeciesTopology::new(s.atom_count()))
                .collect(),
            only_rigid: true,
        }
    }

    /// True while no species has been given any bonded tuples.
    pub fn is_only_rigid(&self) -> bool {
        self.only_rigid
    }

    pub fn add_bonds(&mut self, species: usize, bonds: &[[usize; 2]]) -> Result<(), BondingError> {
        self.add_tuples(species, bonds)?;
        let topology = &mut self.topologies[species];
        topology.bonds.extend_from_slice(bonds);
        topology.update_distances();
        Ok(())
    }

    pub fn add_angles(&mut self, species: usize, angles: &[[usize; 3]]) -> Result<(), BondingError> {
        self.add_tuples(species, angles)
    }

    pub fn add_torsions(&mut self, species: usize, torsions: &[[usize; 4]]) -> Result<(), BondingError> {
        self.add_tuples(species, torsions)
    }

    fn add_tuples<const N: usize>(&mut self, species: usize, tuples: &[[usize; N]]) -> Result<(), BondingError> {
        let topology = self
            .topologies
            .get_mut(species)
            .ok_or(BondingError::UnknownSpecies(species))?;
        for tuple in tuples {
            if let Some(&index) = tuple.iter().find(|&&a| a >= topology.atom_count) {
                return Err(BondingError::AtomOutOfRange {
                    species,
                    index,
                    atom_count: topology.atom_count,
                });
            }
            for (k, a) in tuple.iter().enumerate() {
                if tuple[k + 1..].contains(a) {
                    return Err(BondingError::RepeatedAtom(tuple.to_vec()));
                }
            }
        }
        for tuple in tuples {
            topology.exclude_tuple(tuple);
        }
        topology.bonded = true;
        self.only_rigid = false;
        Ok(())
    }

    fn intramolecular(&self, system: &System, i: usize, j: usize) -> Option<(&SpeciesTopology, usize, usize)> {
        let atoms = system.atoms();
        let (a, b) = (&atoms[i], &atoms[j]);
        if a.molecule != b.molecule {
            return None;
        }
        let species = system.molecules()[a.molecule].species;
        self.topologies
            .get(species)
            .map(|t| (t, a.index_in_molecule, b.index_in_molecule))
    }
}

impl BondingInfo for SpeciesBonding {
    fn skip_pair(&self, system: &System, is_pure_atoms: bool, i: usize, j: usize) -> bool {
        if is_pure_atoms {
            return false;
        }
        let atoms = system.atoms();
        if atoms[i].molecule != atoms[j].molecule {
            return false;
        }
        if self.only_rigid {
            return true;
        }
        match self.intramolecular(system, i, j) {
            Some((topology, a, b)) => !topology.bonded || topology.excluded[a * topology.atom_count + b],
            None => true,
        }
    }

    fn bonded_distance(&self, system: &System, i: usize, j: usize) -> usize {
        self.intramolecular(system, i, j)
            .map(|(topology, a, b)| topology.distance[a * topology.atom_count + b])
            .unwrap_or(0)
    }
}
