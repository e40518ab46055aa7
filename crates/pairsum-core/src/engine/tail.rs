use crate::core::potentials::table::PotentialTable;
use crate::core::potentials::term::TailIntegral;
use itertools::iproduct;

/// Mean-field correction for all interactions beyond each potential's range.
///
/// Same-type pairs number `n(n−1)/2`, cross-type pairs `n_a·n_b`; each type pair
/// contributes `pairs / volume × tail integral`.
pub fn all_atoms(potentials: &PotentialTable, counts: &[usize], volume: f64) -> TailIntegral {
    let types = potentials.type_count().min(counts.len());
    iproduct!(0..types, 0..types)
        .filter(|&(a, b)| a <= b)
        .filter_map(|(a, b)| {
            let potential = potentials.get(a, b)?;
            let (na, nb) = (counts[a] as f64, counts[b] as f64);
            let pairs = if a == b { 0.5 * na * (na - 1.0) } else { na * nb };
            if pairs == 0.0 {
                return None;
            }
            Some(potential.tail_integral(potential.range()) * (pairs / volume))
        })
        .fold(TailIntegral::default(), |acc, t| acc + t)
}

/// Tail energy seen by a single atom of type `a`: `Σ_b (n_b − δ_ab)/V × E_ab`.
pub fn one_atom(potentials: &PotentialTable, counts: &[usize], volume: f64, a: usize) -> f64 {
    let types = potentials.type_count().min(counts.len());
    if a >= types {
        return 0.0;
    }
    (0..types)
        .filter_map(|b| {
            let potential = potentials.get(a, b)?;
            let partners = counts[b] as f64 - if a == b { 1.0 } else { 0.0 };
            if partners <= 0.0 {
                return None;
            }
            Some(partners / volume * potential.tail_integral(potential.range()).energy)
        })
        .sum()
}

/// [`one_atom`] for every type. Half of each value is one atom's share of [`all_atoms`].
pub fn one_atom_energies(potentials: &PotentialTable, counts: &[usize], volume: f64) -> Vec<f64> {
    (0..counts.len())
        .map(|a| one_atom(potentials, counts, volume, a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::potentials::functions::LennardJones;
    use crate::core::potentials::pair::PairPotential;
    use crate::core::potentials::truncation::Truncated;
    use std::sync::Arc;

    fn table() -> (PotentialTable, TailIntegral, TailIntegral) {
        let aa = Truncated::new(LennardJones::new(1.0, 1.0), 2.5);
        let ab = Truncated::new(LennardJones::new(1.2, 0.5), 3.0);
        let (taa, tab) = (aa.tail_integral(2.5), ab.tail_integral(3.0));
        let mut table = PotentialTable::new(2);
        table.set(0, 0, Arc::new(aa));
        table.set(0, 1, Arc::new(ab));
        (table, taa, tab)
    }

    #[test]
    fn all_atoms_counts_same_and_cross_type_pairs() {
        let (table, taa, tab) = table();
        let tail = all_atoms(&table, &[4, 3], 100.0);
        let expected = taa.energy * 6.0 / 100.0 + tab.energy * 12.0 / 100.0;
        assert!((tail.energy - expected).abs() < 1e-12);
        let expected_virial = taa.virial * 6.0 / 100.0 + tab.virial * 12.0 / 100.0;
        assert!((tail.virial - expected_virial).abs() < 1e-12);
    }

    #[test]
    fn doubling_a_type_scales_with_pair_count() {
        let (table, _, _) = table();
        let single = all_atoms(&table, &[10, 0], 50.0);
        let double = all_atoms(&table, &[20, 0], 50.0);
        assert!((double.energy / single.energy - 190.0 / 45.0).abs() < 1e-12);

        let cross = all_atoms(&table, &[1, 5], 50.0).energy - all_atoms(&table, &[1, 0], 50.0).energy;
        let cross_doubled = all_atoms(&table, &[2, 5], 50.0).energy
            - all_atoms(&table, &[2, 0], 50.0).energy;
        assert!((cross_doubled / cross - 2.0).abs() < 1e-12);
    }

    #[test]
    fn one_atom_shares_sum_to_the_full_correction() {
        let (table, _, _) = table();
        let counts = [4, 3];
        let one = one_atom_energies(&table, &counts, 100.0);
        let apportioned: f64 = counts.iter().zip(&one).map(|(&n, &e)| 0.5 * n as f64 * e).sum();
        assert!((apportioned - all_atoms(&table, &counts, 100.0).energy).abs() < 1e-12);
    }

    #[test]
    fn single_atom_has_no_tail() {
        let (table, _, _) = table();
        assert_eq!(all_atoms(&table, &[1, 0], 10.0), TailIntegral::default());
        assert_eq!(one_atom_energies(&table, &[1, 0], 10.0)[0], 0.0);
    }
}
