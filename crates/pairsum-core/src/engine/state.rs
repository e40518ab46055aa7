use crate::core::models::system::{System, SystemEvent};
use nalgebra::Vector3;

/// Per-atom and global results of the most recent energy evaluation.
///
/// The state is owned by the caller but only written by
/// [`PairCompute`](super::compute::PairCompute) and by committing a
/// [`Trial`](super::trial::Trial). Between evaluations it follows the atom population
/// through [`SystemEvent`]s.
#[derive(Debug, Clone)]
pub struct EnergyState {
    pub(crate) u_atom: Vec<f64>,
    pub(crate) forces: Vec<Vector3<f64>>,
    pub(crate) forces_valid: bool,
    pub(crate) atom_count: usize,
    pub(crate) atom_count_by_type: Vec<usize>,
    pub(crate) energy_tot: f64,
    pub(crate) virial_tot: f64,
    pub(crate) generation: u64,
}

impl EnergyState {
    /// Creates a state sized for `system`, with per-type counts taken from it.
    /// Energy and virial are `NaN` until the first full recomputation.
    pub fn new(system: &System) -> Self {
        let atom_count = system.atom_count();
        Self {
            u_atom: vec![0.0; atom_count],
            forces: vec![Vector3::zeros(); atom_count],
            forces_valid: false,
            atom_count,
            atom_count_by_type: system.atom_count_by_type(),
            energy_tot: f64::NAN,
            virial_tot: f64::NAN,
            generation: 0,
        }
    }

    /// Total energy, including the tail correction when enabled.
    pub fn energy(&self) -> f64 {
        self.energy_tot
    }

    /// Total virial `Σ r·dU/dr` from the most recent full recomputation.
    pub fn virial(&self) -> f64 {
        self.virial_tot
    }

    /// Half of the pair energy touching each atom; sums to [`EnergyState::energy`].
    pub fn u_atom(&self) -> &[f64] {
        &self.u_atom[..self.atom_count]
    }

    /// Forces from the most recent full recomputation, if it computed forces and no
    /// trial has been committed since.
    pub fn forces(&self) -> Option<&[Vector3<f64>]> {
        self.forces_valid.then(|| &self.forces[..self.atom_count])
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn atom_count_by_type(&self) -> &[usize] {
        &self.atom_count_by_type
    }

    /// Incremented by every write; trials record it to detect stale commits.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Follows one change to the atom population.
    ///
    /// Per-atom arrays grow as needed and are never shrunk; a removed slot is zeroed
    /// and a renumbered atom carries its values to the new index. Energy and virial
    /// become `NaN` until the next full recomputation.
    pub fn apply_event(&mut self, event: SystemEvent) {
        match event {
            SystemEvent::AtomAdded { index, type_id } => {
                self.ensure_capacity(index + 1);
                self.u_atom[index] = 0.0;
                self.forces[index] = Vector3::zeros();
                self.atom_count = self.atom_count.max(index + 1);
                if self.atom_count_by_type.len() <= type_id {
                    self.atom_count_by_type.resize(type_id + 1, 0);
                }
                self.atom_count_by_type[type_id] += 1;
            }
            SystemEvent::AtomRemoved { index, type_id } => {
                if let Some(count) = self.atom_count_by_type.get_mut(type_id) {
                    *count = count.saturating_sub(1);
                }
                if index < self.u_atom.len() {
                    self.u_atom[index] = 0.0;
                    self.forces[index] = Vector3::zeros();
                }
                self.atom_count = self.atom_count.saturating_sub(1);
            }
            SystemEvent::AtomRenumbered { from, to } => {
                self.ensure_capacity(from.max(to) + 1);
                self.u_atom[to] = self.u_atom[from];
                self.forces[to] = self.forces[from];
                self.u_atom[from] = 0.0;
                self.forces[from] = Vector3::zeros();
            }
        }
        self.invalidate();
    }

    pub fn apply_events(&mut self, events: impl IntoIterator<Item = SystemEvent>) {
        for event in events {
            self.apply_event(event);
        }
    }

    fn ensure_capacity(&mut self, len: usize) {
        if self.u_atom.len() < len {
            self.u_atom.resize(len, 0.0);
            self.forces.resize(len, Vector3::zeros());
        }
    }

    fn invalidate(&mut self) {
        self.energy_tot = f64::NAN;
        self.virial_tot = f64::NAN;
        self.forces_valid = false;
        self.generation += 1;
    }

    /// Prepares the arrays for a full recomputation over `atom_count` atoms and
    /// `type_count` types.
    pub(crate) fn resize(&mut self, atom_count: usize, type_count: usize) {
        self.ensure_capacity(atom_count);
        self.atom_count = atom_count;
        if self.atom_count_by_type.len() < type_count {
            self.atom_count_by_type.resize(type_count, 0);
        }
    }
}
