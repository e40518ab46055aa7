use crate::core::potentials::term::PairTerms;
use nalgebra::Vector3;

/// Per-pair hook for a full recomputation.
///
/// Receives every pair that was actually evaluated, with the minimum-image
/// displacement `r_j − r_i` and the (near-core scaled) terms.
pub trait PairCallback {
    /// Returning `true` removes the pair from the sums.
    fn skip_pair(&mut self, i: usize, j: usize) -> bool {
        let _ = (i, j);
        false
    }

    fn pair_compute(&mut self, i: usize, j: usize, dr: &Vector3<f64>, terms: &PairTerms);
}

/// Counts evaluated pairs and records the closest approach.
#[derive(Debug, Clone, Default)]
pub struct PairStatistics {
    pub pairs: usize,
    pub interacting: usize,
    pub min_distance: Option<f64>,
}

impl PairCallback for PairStatistics {
    fn pair_compute(&mut self, _i: usize, _j: usize, dr: &Vector3<f64>, terms: &PairTerms) {
        self.pairs += 1;
        if terms.u != 0.0 {
            self.interacting += 1;
        }
        let r = dr.norm();
        self.min_distance = Some(self.min_distance.map_or(r, |m| m.min(r)));
    }
}
