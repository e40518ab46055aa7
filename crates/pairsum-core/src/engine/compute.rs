use super::callback::PairCallback;
use super::config::EngineConfig;
use super::error::ComputeError;
use super::state::EnergyState;
use super::tail;
use super::trial::Trial;
use super::virial::{CenterOfMassVirial, IntramolecularVirial};
use crate::core::bonding::BondingInfo;
use crate::core::models::atom::Atom;
use crate::core::models::system::System;
use crate::core::potentials::pair::PairPotential;
use crate::core::potentials::table::{NearCoreScale, PotentialTable};
use crate::core::potentials::term::PairTerms;
use crate::core::space::boundary::Boundary;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use tracing::{debug, info, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Read-only view of a configuration shared by every pair evaluated in one pass.
struct Scan<'a> {
    system: &'a System,
    atoms: &'a [Atom],
    boundary: &'a dyn Boundary,
    is_pure_atoms: bool,
    /// Pairs closer than half the smallest box edge are subject to near-core scaling.
    min_r2: f64,
}

impl<'a> Scan<'a> {
    fn new(system: &'a System) -> Self {
        let boundary = system.boundary();
        let half = 0.5 * boundary.min_dimension();
        Self {
            system,
            atoms: system.atoms(),
            boundary,
            is_pure_atoms: system.is_pure_atoms(),
            min_r2: half * half,
        }
    }
}

/// Partial sums of a full recomputation; one per rayon partition when parallel.
struct Accumulator {
    u_atom: Vec<f64>,
    forces: Vec<Vector3<f64>>,
    energy: f64,
    virial: f64,
}

impl Accumulator {
    #[cfg(feature = "parallel")]
    fn zeros(atom_count: usize, do_forces: bool) -> Self {
        Self {
            u_atom: vec![0.0; atom_count],
            forces: if do_forces {
                vec![Vector3::zeros(); atom_count]
            } else {
                Vec::new()
            },
            energy: 0.0,
            virial: 0.0,
        }
    }

    #[cfg(feature = "parallel")]
    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.u_atom.iter_mut().zip(&other.u_atom) {
            *a += b;
        }
        for (a, b) in self.forces.iter_mut().zip(&other.forces) {
            *a += b;
        }
        self.energy += other.energy;
        self.virial += other.virial;
        self
    }
}

/// All-pairs energy, force and virial engine with incremental trial evaluation.
///
/// The engine holds only configuration (potentials, exclusions, scale factors); all
/// accumulated results live in an [`EnergyState`] owned by the caller.
#[derive(Debug)]
pub struct PairCompute {
    potentials: PotentialTable,
    near_core: NearCoreScale,
    near_core_active: bool,
    bonding: Arc<dyn BondingInfo>,
    intramolecular: Box<dyn IntramolecularVirial>,
    config: EngineConfig,
}

impl PairCompute {
    pub fn new(potentials: PotentialTable, bonding: Arc<dyn BondingInfo>, config: EngineConfig) -> Self {
        info!(
            types = potentials.type_count(),
            range = potentials.max_range(),
            tail = config.truncation_correction,
            "Initializing pair compute engine"
        );
        let near_core = NearCoreScale::new(potentials.type_count());
        Self {
            potentials,
            near_core,
            near_core_active: false,
            bonding,
            intramolecular: Box::new(CenterOfMassVirial),
            config,
        }
    }

    pub fn with_near_core_scale(mut self, scale: NearCoreScale) -> Self {
        self.near_core_active = !scale.is_identity();
        self.near_core = scale;
        self
    }

    pub fn with_intramolecular_virial(mut self, hook: Box<dyn IntramolecularVirial>) -> Self {
        self.intramolecular = hook;
        self
    }

    pub fn potentials(&self) -> &PotentialTable {
        &self.potentials
    }

    pub fn near_core_scale(&self) -> &NearCoreScale {
        &self.near_core
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recomputes every pair from scratch.
    ///
    /// Zeroes the per-atom energies (and forces when `do_forces`), sums all unordered
    /// pairs, then adds the tail correction and, for molecular systems with forces, the
    /// intramolecular virial.
    ///
    /// # Arguments
    ///
    /// * `state` - Receives per-atom energies, forces, total energy and virial.
    /// * `system` - The configuration to evaluate.
    /// * `do_forces` - Whether to accumulate forces.
    /// * `callback` - Optional per-pair hook; forces the serial path.
    ///
    /// # Return
    ///
    /// The total energy, equal to the sum of [`EnergyState::u_atom`].
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::NonFiniteEnergy`] or [`ComputeError::NonFiniteForce`]
    /// naming the first offending pair; the state is then left with partial sums.
    pub fn compute_all(
        &self,
        state: &mut EnergyState,
        system: &System,
        do_forces: bool,
        mut callback: Option<&mut dyn PairCallback>,
    ) -> Result<f64, ComputeError> {
        let scan = Scan::new(system);
        let n = scan.atoms.len();
        state.resize(n, system.atom_types().len());
        state.forces_valid = false;

        let (pair_energy, pair_virial) = match callback.as_deref_mut() {
            Some(cb) => self.sum_serial(state, &scan, do_forces, Some(cb))?,
            None => self.sum_pairs(state, &scan, do_forces)?,
        };

        let mut energy = pair_energy;
        let mut virial = pair_virial;

        if self.config.truncation_correction {
            let volume = scan.boundary.volume();
            let counts = &state.atom_count_by_type;
            let correction = tail::all_atoms(&self.potentials, counts, volume);
            let shares = tail::one_atom_energies(&self.potentials, counts, volume);
            for (u, atom) in state.u_atom[..n].iter_mut().zip(scan.atoms) {
                *u += 0.5 * shares.get(atom.type_id).copied().unwrap_or(0.0);
            }
            energy += correction.energy;
            virial += correction.virial;
        }

        if do_forces && !scan.is_pure_atoms && self.config.intramolecular_virial {
            virial += self.intramolecular.virial(system, &state.forces[..n]);
        }

        state.energy_tot = energy;
        state.virial_tot = virial;
        state.forces_valid = do_forces;
        state.generation += 1;

        debug!(energy, virial, atoms = n, forces = do_forces, "Full recomputation complete");
        Ok(energy)
    }

    #[cfg(not(feature = "parallel"))]
    fn sum_pairs(&self, state: &mut EnergyState, scan: &Scan, do_forces: bool) -> Result<(f64, f64), ComputeError> {
        self.sum_serial(state, scan, do_forces, None)
    }

    #[cfg(feature = "parallel")]
    fn sum_pairs(&self, state: &mut EnergyState, scan: &Scan, do_forces: bool) -> Result<(f64, f64), ComputeError> {
        let n = scan.atoms.len();
        let total = (0..n)
            .into_par_iter()
            .try_fold(
                || Accumulator::zeros(n, do_forces),
                |mut acc, i| {
                    self.accumulate_row(scan, &mut acc, i, do_forces, &mut None)?;
                    Ok::<_, ComputeError>(acc)
                },
            )
            .try_reduce(|| Accumulator::zeros(n, do_forces), |a, b| Ok(a.merge(b)))?;

        state.u_atom[..n].copy_from_slice(&total.u_atom);
        if do_forces {
            state.forces[..n].copy_from_slice(&total.forces);
        }
        Ok((total.energy, total.virial))
    }

    fn sum_serial(
        &self,
        state: &mut EnergyState,
        scan: &Scan,
        do_forces: bool,
        mut callback: Option<&mut dyn PairCallback>,
    ) -> Result<(f64, f64), ComputeError> {
        let n = scan.atoms.len();
        let mut acc = Accumulator {
            u_atom: mem::take(&mut state.u_atom),
            forces: mem::take(&mut state.forces),
            energy: 0.0,
            virial: 0.0,
        };
        acc.u_atom[..n].fill(0.0);
        if do_forces {
            acc.forces[..n].fill(Vector3::zeros());
        }

        let result = (0..n).try_for_each(|i| self.accumulate_row(scan, &mut acc, i, do_forces, &mut callback));

        state.u_atom = acc.u_atom;
        state.forces = acc.forces;
        result.map(|()| (acc.energy, acc.virial))
    }

    /// Adds every pair `(i, j)` with `j > i` to the accumulator.
    fn accumulate_row(
        &self,
        scan: &Scan,
        acc: &mut Accumulator,
        i: usize,
        do_forces: bool,
        callback: &mut Option<&mut dyn PairCallback>,
    ) -> Result<(), ComputeError> {
        let ri = scan.atoms[i].position;
        for j in (i + 1)..scan.atoms.len() {
            if self.bonding.skip_pair(scan.system, scan.is_pure_atoms, i, j) {
                continue;
            }
            if let Some(cb) = callback.as_deref_mut() {
                if cb.skip_pair(i, j) {
                    continue;
                }
            }
            let Some(potential) = self.potential_for(scan, i, j) else {
                continue;
            };

            let mut dr = scan.atoms[j].position - ri;
            scan.boundary.nearest_image(&mut dr);
            let r2 = dr.norm_squared();
            let mut terms = potential.u012(r2);
            if r2 < scan.min_r2 && self.near_core_active {
                terms = terms * self.near_core_factor(scan, i, j);
            }

            if let Some(cb) = callback.as_deref_mut() {
                cb.pair_compute(i, j, &dr, &terms);
            }
            self.accumulate_pair(acc, i, j, &dr, r2, &terms, do_forces)?;
        }
        Ok(())
    }

    #[inline]
    #[allow(clippy::too_many_arguments)]
    fn accumulate_pair(
        &self,
        acc: &mut Accumulator,
        i: usize,
        j: usize,
        dr: &Vector3<f64>,
        r2: f64,
        terms: &PairTerms,
        do_forces: bool,
    ) -> Result<(), ComputeError> {
        if !terms.u.is_finite() {
            return Err(ComputeError::NonFiniteEnergy { i, j, value: terms.u });
        }
        let half = 0.5 * terms.u;
        acc.u_atom[i] += half;
        acc.u_atom[j] += half;
        acc.energy += terms.u;
        acc.virial += terms.du;

        if do_forces && terms.du != 0.0 {
            let force = dr * (terms.du / r2);
            if !force.iter().all(|c| c.is_finite()) {
                return Err(ComputeError::NonFiniteForce { i, j });
            }
            acc.forces[i] += force;
            acc.forces[j] -= force;
        }
        Ok(())
    }

    /// Evaluates moving `atom` to `position` without touching `state`.
    ///
    /// # Return
    ///
    /// A [`Trial`] whose first entry is the moved atom. Its energy is the atom's
    /// energy at the new position (tail share included), to be compared with
    /// [`PairCompute::compute_one_old`]. An overlap yields `+∞`.
    ///
    /// # Errors
    ///
    /// Returns an error if the atom does not exist or a pair energy is `NaN`.
    pub fn compute_one(
        &self,
        state: &EnergyState,
        system: &System,
        atom: usize,
        position: Point3<f64>,
    ) -> Result<Trial, ComputeError> {
        let scan = Scan::new(system);
        let n = scan.atoms.len();
        if atom >= n {
            return Err(ComputeError::AtomOutOfRange { index: atom, count: n });
        }
        let mut new_position = position;
        scan.boundary.wrap(&mut new_position);
        let old_position = scan.atoms[atom].position;

        let mut entries = vec![(atom, 0.0)];
        let mut energy = 0.0;
        let mut delta = 0.0;
        for j in 0..n {
            if j == atom {
                continue;
            }
            let Some(potential) = self.interacting(&scan, atom, j) else {
                continue;
            };
            let rj = &scan.atoms[j].position;
            let old = self.pair_energy(&scan, potential, atom, j, &old_position, rj);
            let new = self.pair_energy(&scan, potential, atom, j, &new_position, rj);
            if new.is_nan() {
                return Err(ComputeError::NonFiniteEnergy { i: atom, j, value: new });
            }
            energy += new;
            if old != 0.0 || new != 0.0 {
                let change = 0.5 * (new - old);
                entries[0].1 += change;
                entries.push((j, change));
                delta += new - old;
            }
        }
        energy += self.one_atom_tail(state, &scan, atom);

        trace!(atom, energy, delta, partners = entries.len() - 1, "Single-atom trial");
        Ok(Trial::new(entries, energy, delta, state.generation))
    }

    /// Committed energy of `atom`, tail share included: `2·u_atom[atom]`.
    pub fn compute_one_old(&self, state: &EnergyState, atom: usize) -> Result<f64, ComputeError> {
        state
            .u_atom()
            .get(atom)
            .map(|u| 2.0 * u)
            .ok_or(ComputeError::AtomOutOfRange {
                index: atom,
                count: state.atom_count(),
            })
    }

    /// Evaluates moving a group of atoms together without touching `state`.
    ///
    /// Pairs inside the group are evaluated once, with both atoms at their new
    /// positions. Entries are keyed by atom index; group atoms come first, in `moves`
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if an atom does not exist or is listed twice, or a pair energy
    /// is `NaN`.
    pub fn compute_many_atoms(
        &self,
        state: &EnergyState,
        system: &System,
        moves: &[(usize, Point3<f64>)],
    ) -> Result<Trial, ComputeError> {
        let scan = Scan::new(system);
        let n = scan.atoms.len();
        let atoms: Vec<usize> = moves.iter().map(|&(atom, _)| atom).collect();
        let group = group_slots(&atoms, n)?;

        let new_positions: Vec<Point3<f64>> = moves
            .iter()
            .map(|&(_, position)| {
                let mut p = position;
                scan.boundary.wrap(&mut p);
                p
            })
            .collect();

        let mut entries: Vec<(usize, f64)> = atoms.iter().map(|&a| (a, 0.0)).collect();
        let mut slots = group.clone();
        let mut energy = 0.0;
        let mut delta = 0.0;

        for (k, &a) in atoms.iter().enumerate() {
            let old_a = scan.atoms[a].position;
            let new_a = new_positions[k];
            for j in 0..n {
                if j == a {
                    continue;
                }
                let new_j = match group.get(&j) {
                    Some(&m) if m < k => continue,
                    Some(&m) => new_positions[m],
                    None => scan.atoms[j].position,
                };
                let Some(potential) = self.interacting(&scan, a, j) else {
                    continue;
                };
                let old = self.pair_energy(&scan, potential, a, j, &old_a, &scan.atoms[j].position);
                let new = self.pair_energy(&scan, potential, a, j, &new_a, &new_j);
                if new.is_nan() {
                    return Err(ComputeError::NonFiniteEnergy { i: a, j, value: new });
                }
                energy += new;
                if old != 0.0 || new != 0.0 {
                    let change = 0.5 * (new - old);
                    entries[k].1 += change;
                    let slot = *slots.entry(j).or_insert_with(|| {
                        entries.push((j, 0.0));
                        entries.len() - 1
                    });
                    entries[slot].1 += change;
                    delta += new - old;
                }
            }
        }
        energy += atoms
            .iter()
            .map(|&a| self.one_atom_tail(state, &scan, a))
            .sum::<f64>();

        trace!(group = atoms.len(), energy, delta, changed = entries.len(), "Multi-atom trial");
        Ok(Trial::new(entries, energy, delta, state.generation))
    }

    /// Committed energy of a group: `Σ 2·u_atom` less the intra-group pair energies that
    /// sum counts twice.
    pub fn compute_many_atoms_old(&self, state: &EnergyState, system: &System, atoms: &[usize]) -> Result<f64, ComputeError> {
        let scan = Scan::new(system);
        group_slots(atoms, scan.atoms.len().min(state.atom_count()))?;

        let mut energy: f64 = atoms.iter().map(|&a| 2.0 * state.u_atom[a]).sum();
        for (k, &a) in atoms.iter().enumerate() {
            for &b in &atoms[k + 1..] {
                if let Some(potential) = self.interacting(&scan, a, b) {
                    energy -= self.pair_energy(&scan, potential, a, b, &scan.atoms[a].position, &scan.atoms[b].position);
                }
            }
        }
        Ok(energy)
    }

    /// Applies (`factor > 0`, conventionally `+1`) or drops (`-1` or `0`) a trial.
    pub fn process_atom_u(&self, state: &mut EnergyState, trial: Trial, factor: f64) {
        debug_assert!(
            factor == 1.0 || factor == 0.0 || factor == -1.0,
            "process_atom_u expects +1, 0 or -1, got {factor}"
        );
        if factor > 0.0 {
            trial.commit(state);
        } else {
            trial.discard();
        }
    }

    /// The potential for an included pair, or `None` when the pair is excluded or the
    /// two types do not interact.
    #[inline]
    fn interacting(&self, scan: &Scan, i: usize, j: usize) -> Option<&dyn PairPotential> {
        if self.bonding.skip_pair(scan.system, scan.is_pure_atoms, i, j) {
            return None;
        }
        self.potential_for(scan, i, j)
    }

    #[inline]
    fn potential_for(&self, scan: &Scan, i: usize, j: usize) -> Option<&dyn PairPotential> {
        self.potentials
            .get(scan.atoms[i].type_id, scan.atoms[j].type_id)
    }

    #[inline]
    fn pair_energy(
        &self,
        scan: &Scan,
        potential: &dyn PairPotential,
        i: usize,
        j: usize,
        ri: &Point3<f64>,
        rj: &Point3<f64>,
    ) -> f64 {
        let mut dr = rj - ri;
        scan.boundary.nearest_image(&mut dr);
        let r2 = dr.norm_squared();
        let u = potential.u(r2);
        if r2 < scan.min_r2 && self.near_core_active {
            u * self.near_core_factor(scan, i, j)
        } else {
            u
        }
    }

    #[inline]
    fn near_core_factor(&self, scan: &Scan, i: usize, j: usize) -> f64 {
        let distance = self.bonding.bonded_distance(scan.system, i, j);
        self.near_core
            .factor(scan.atoms[i].type_id, scan.atoms[j].type_id, distance)
    }

    fn one_atom_tail(&self, state: &EnergyState, scan: &Scan, atom: usize) -> f64 {
        if !self.config.truncation_correction {
            return 0.0;
        }
        tail::one_atom(
            &self.potentials,
            &state.atom_count_by_type,
            scan.boundary.volume(),
            scan.atoms[atom].type_id,
        )
    }
}

/// Maps each group atom to its position in `atoms`, rejecting unknown or repeated atoms.
fn group_slots(atoms: &[usize], atom_count: usize) -> Result<HashMap<usize, usize>, ComputeError> {
    let mut slots = HashMap::with_capacity(atoms.len());
    for (k, &atom) in atoms.iter().enumerate() {
        if atom >= atom_count {
            return Err(ComputeError::AtomOutOfRange {
                index: atom,
                count: atom_count,
            });
        }
        if slots.insert(atom, k).is_some() {
            return Err(ComputeError::DuplicateAtom(atom));
        }
    }
    Ok(slots)
}
