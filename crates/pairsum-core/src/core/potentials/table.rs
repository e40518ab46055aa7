use super::pair::PairPotential;
use std::sync::Arc;

/// Dense, symmetric matrix of pair potentials indexed by atom-type ids.
///
/// A missing cell means the two types do not interact.
#[derive(Debug, Clone, Default)]
pub struct PotentialTable {
    type_count: usize,
    cells: Vec<Option<Arc<dyn PairPotential>>>,
}

impl PotentialTable {
    pub fn new(type_count: usize) -> Self {
        Self {
            type_count,
            cells: vec![None; type_count * type_count],
        }
    }

    pub fn type_count(&self) -> usize {
        self.type_count
    }

    /// Widens the table to `type_count` types, keeping existing entries.
    pub fn grow(&mut self, type_count: usize) {
        if type_count <= self.type_count {
            return;
        }
        let mut cells = vec![None; type_count * type_count];
        for a in 0..self.type_count {
            for b in 0..self.type_count {
                cells[a * type_count + b] = self.cells[a * self.type_count + b].take();
            }
        }
        self.cells = cells;
        self.type_count = type_count;
    }

    /// Sets the potential for both `(a, b)` and `(b, a)`, growing the table if needed.
    pub fn set(&mut self, a: usize, b: usize, potential: Arc<dyn PairPotential>) {
        self.grow(a.max(b) + 1);
        let n = self.type_count;
        self.cells[a * n + b] = Some(Arc::clone(&potential));
        self.cells[b * n + a] = Some(potential);
    }

    pub fn clear(&mut self, a: usize, b: usize) {
        if a < self.type_count && b < self.type_count {
            let n = self.type_count;
            self.cells[a * n + b] = None;
            self.cells[b * n + a] = None;
        }
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> Option<&dyn PairPotential> {
        if a >= self.type_count || b >= self.type_count {
            return None;
        }
        self.cells[a * self.type_count + b].as_deref()
    }

    /// Largest finite interaction range in the table; infinite if any potential is
    /// untruncated.
    pub fn max_range(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .map(|p| p.range())
            .fold(0.0, f64::max)
    }
}

/// Bonded-distance classes tracked by [`NearCoreScale`]: 0 (unbonded or unknown),
/// 1, 2 and 3-or-more bonds apart.
pub const BOND_DISTANCE_CLASSES: usize = 4;

/// Multiplicative energy factors for pairs closer than half the smallest box edge,
/// indexed by `[type_a][type_b][min(bonded_distance, 3)]`. Every factor defaults to 1.
#[derive(Debug, Clone, Default)]
pub struct NearCoreScale {
    type_count: usize,
    factors: Vec<[f64; BOND_DISTANCE_CLASSES]>,
}

impl NearCoreScale {
    pub fn new(type_count: usize) -> Self {
        Self {
            type_count,
            factors: vec![[1.0; BOND_DISTANCE_CLASSES]; type_count * type_count],
        }
    }

    pub fn type_count(&self) -> usize {
        self.type_count
    }

    pub fn grow(&mut self, type_count: usize) {
        if type_count <= self.type_count {
            return;
        }
        let mut factors = vec![[1.0; BOND_DISTANCE_CLASSES]; type_count * type_count];
        for a in 0..self.type_count {
            for b in 0..self.type_count {
                factors[a * type_count + b] = self.factors[a * self.type_count + b];
            }
        }
        self.factors = factors;
        self.type_count = type_count;
    }

    /// Sets the factor for both orderings of the type pair.
    pub fn set(&mut self, a: usize, b: usize, bonded_distance: usize, factor: f64) {
        self.grow(a.max(b) + 1);
        let n = self.type_count;
        let class = bonded_distance.min(BOND_DISTANCE_CLASSES - 1);
        self.factors[a * n + b][class] = factor;
        self.factors[b * n + a][class] = factor;
    }

    #[inline]
    pub fn factor(&self, a: usize, b: usize, bonded_distance: usize) -> f64 {
        if a >= self.type_count || b >= self.type_count {
            return 1.0;
        }
        self.factors[a * self.type_count + b][bonded_distance.min(BOND_DISTANCE_CLASSES - 1)]
    }

    /// True when every factor is 1, i.e. the table changes nothing.
    pub fn is_identity(&self) -> bool {
        self.factors.iter().flatten().all(|&f| f == 1.0)
    }
}
