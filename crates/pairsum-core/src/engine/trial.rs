use super::state::EnergyState;
use tracing::trace;

/// Energy changes of a proposed move, computed against a committed [`EnergyState`]
/// but not yet applied to it.
///
/// Each entry is an atom index and the change of that atom's half-energy. Committing
/// adds every change to the state, which then matches a full recomputation of the moved
/// configuration; discarding leaves the state untouched.
#[must_use = "a trial must be committed or discarded"]
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    entries: Vec<(usize, f64)>,
    energy: f64,
    delta: f64,
    generation: u64,
}

impl Trial {
    pub(crate) fn new(entries: Vec<(usize, f64)>, energy: f64, delta: f64, generation: u64) -> Self {
        Self {
            entries,
            energy,
            delta,
            generation,
        }
    }

    /// Atom indices and half-energy changes. Moved atoms come first.
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Energy of the moved atom (or group) in its trial position, tail share included.
    /// `+∞` marks an overlap.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Change of the total energy if the trial is committed.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Applies the trial to the state it was computed against.
    pub fn commit(self, state: &mut EnergyState) {
        debug_assert_eq!(
            self.generation, state.generation,
            "trial committed against a state that changed after it was computed"
        );
        debug_assert!(self.delta.is_finite(), "committed a trial with non-finite energy change");
        for &(atom, change) in &self.entries {
            state.u_atom[atom] += change;
        }
        state.energy_tot += self.delta;
        state.forces_valid = false;
        state.generation += 1;
        trace!(delta = self.delta, atoms = self.entries.len(), "Committed trial");
    }

    /// Drops the trial without touching any state.
    pub fn discard(self) {
        trace!(delta = self.delta, "Discarded trial");
    }
}
