use nalgebra::{Point3, Vector3};
use pairsum::core::bonding::{BondingInfo, NoBonding, SpeciesBonding};
use pairsum::core::models::system::System;
use pairsum::core::potentials::functions::LennardJones;
use pairsum::core::potentials::pair::PairPotential;
use pairsum::core::potentials::table::{NearCoreScale, PotentialTable};
use pairsum::core::potentials::truncation::{Truncated, TruncatedShifted};
use pairsum::core::space::boundary::PeriodicBox;
use pairsum::engine::compute::PairCompute;
use pairsum::engine::config::{EngineConfig, EngineConfigBuilder, MonteCarloConfigBuilder};
use pairsum::engine::progress::ProgressReporter;
use pairsum::engine::state::EnergyState;
use pairsum::workflows::monte_carlo;
use std::sync::Arc;

const TOLERANCE: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * (1.0 + a.abs().max(b.abs()))
}

/// Argon-like atoms on a slightly jittered cubic lattice.
fn fluid(count: usize, edge: f64) -> System {
    let mut system = System::new(Arc::new(PeriodicBox::cubic(edge).unwrap()));
    let ar = system.add_atom_type("Ar", 40.0).unwrap();
    let atom = system.add_species("argon", vec![ar]).unwrap();
    let per_side = (count as f64).cbrt().ceil() as usize;
    let spacing = edge / per_side as f64;
    let mut placed = 0;
    'outer: for x in 0..per_side {
        for y in 0..per_side {
            for z in 0..per_side {
                if placed == count {
                    break 'outer;
                }
                let jitter = 0.1 * spacing * (((placed * 7919) % 13) as f64 / 13.0 - 0.5);
                let p = Point3::new(
                    (x as f64 + 0.5) * spacing - 0.5 * edge + jitter,
                    (y as f64 + 0.5) * spacing - 0.5 * edge - jitter,
                    (z as f64 + 0.5) * spacing - 0.5 * edge + 0.5 * jitter,
                );
                system.add_molecule(atom, &[p]).unwrap();
                placed += 1;
            }
        }
    }
    system
}

/// Argon atoms mixed with rigid three-site molecules.
fn mixture(edge: f64) -> System {
    let mut system = System::new(Arc::new(PeriodicBox::cubic(edge).unwrap()));
    let a = system.add_atom_type("A", 1.0).unwrap();
    let b = system.add_atom_type("B", 2.0).unwrap();
    let atom = system.add_species("atom", vec![a]).unwrap();
    let trimer = system.add_species("trimer", vec![b, a, b]).unwrap();
    for k in 0..4 {
        let base = Point3::new(-3.0 + 2.0 * k as f64, -2.5, -2.5);
        system.add_molecule(atom, &[base]).unwrap();
        let origin = base + Vector3::new(0.0, 3.0, 1.0);
        system
            .add_molecule(
                trimer,
                &[
                    origin,
                    origin + Vector3::new(1.0, 0.0, 0.0),
                    origin + Vector3::new(1.0, 1.0, 0.0),
                ],
            )
            .unwrap();
    }
    system
}

fn lj_table(type_count: usize, cutoff: f64) -> PotentialTable {
    let mut table = PotentialTable::new(type_count);
    for a in 0..type_count {
        for b in a..type_count {
            let r_min = 1.1 + 0.1 * (a + b) as f64;
            let depth = 1.0 / (1.0 + (a + b) as f64);
            table.set(a, b, Arc::new(Truncated::new(LennardJones::new(r_min, depth), cutoff)));
        }
    }
    table
}

fn engine(system: &System, cutoff: f64) -> PairCompute {
    PairCompute::new(
        lj_table(system.atom_types().len(), cutoff),
        Arc::new(SpeciesBonding::new(system)),
        EngineConfig::default(),
    )
}

fn recompute(compute: &PairCompute, system: &System) -> EnergyState {
    let mut state = EnergyState::new(system);
    compute.compute_all(&mut state, system, true, None).unwrap();
    state
}

#[test]
fn per_atom_energies_sum_to_total() {
    let system = fluid(64, 6.0);
    let compute = engine(&system, 2.5);
    let state = recompute(&compute, &system);

    let sum: f64 = state.u_atom().iter().sum();
    assert!(approx_eq(sum, state.energy()));
    assert_eq!(state.u_atom().len(), 64);
}

#[test]
fn full_recomputation_is_deterministic() {
    let system = mixture(9.0);
    let compute = engine(&system, 3.0);
    let mut state = EnergyState::new(&system);

    let first = compute.compute_all(&mut state, &system, true, None).unwrap();
    let u_first = state.u_atom().to_vec();
    let forces_first = state.forces().unwrap().to_vec();
    let virial_first = state.virial();

    let second = compute.compute_all(&mut state, &system, true, None).unwrap();
    if cfg!(feature = "parallel") {
        // Work stealing may change the reduction order between runs.
        assert!(approx_eq(first, second));
        assert!(approx_eq(virial_first, state.virial()));
        for (a, b) in u_first.iter().zip(state.u_atom()) {
            assert!(approx_eq(*a, *b));
        }
        for (a, b) in forces_first.iter().zip(state.forces().unwrap()) {
            assert!((a - b).norm() < TOLERANCE);
        }
    } else {
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(virial_first.to_bits(), state.virial().to_bits());
        assert_eq!(u_first, state.u_atom());
        assert_eq!(forces_first, state.forces().unwrap());
    }
}

#[test]
fn committed_single_atom_move_matches_recomputation() {
    let mut system = fluid(27, 5.0);
    let compute = engine(&system, 2.0);
    let mut state = recompute(&compute, &system);

    let moves = [
        (4, Vector3::new(0.2, -0.1, 0.05)),
        (13, Vector3::new(-0.15, 0.1, 0.2)),
        (26, Vector3::new(2.6, 0.0, 0.0)),
    ];
    for (atom, shift) in moves {
        let position = system.atoms()[atom].position + shift;
        let trial = compute.compute_one(&state, &system, atom, position).unwrap();
        let old = compute.compute_one_old(&state, atom).unwrap();
        assert!(approx_eq(trial.energy() - old, trial.delta()));

        compute.process_atom_u(&mut state, trial, 1.0);
        system.set_position(atom, position).unwrap();
    }

    let fresh = recompute(&compute, &system);
    assert!(approx_eq(state.energy(), fresh.energy()));
    for (tracked, expected) in state.u_atom().iter().zip(fresh.u_atom()) {
        assert!(approx_eq(*tracked, *expected));
    }
}

#[test]
fn rejected_trials_leave_state_untouched() {
    let system = fluid(27, 5.0);
    let compute = engine(&system, 2.0);
    let mut state = recompute(&compute, &system);
    let before = state.clone();

    let position = system.atoms()[3].position + Vector3::new(0.3, 0.3, 0.3);
    let trial = compute.compute_one(&state, &system, 3, position).unwrap();
    compute.process_atom_u(&mut state, trial, -1.0);
    let trial = compute.compute_one(&state, &system, 3, position).unwrap();
    compute.process_atom_u(&mut state, trial, 0.0);

    assert_eq!(state.energy().to_bits(), before.energy().to_bits());
    assert_eq!(state.u_atom(), before.u_atom());
    assert!(state.forces().is_some());
    assert_eq!(state.forces(), before.forces());
    assert_eq!(state.generation(), before.generation());
}

#[test]
fn shifted_potential_is_continuous_across_cutoff() {
    let cutoff = 2.5;
    let potential = TruncatedShifted::new(LennardJones::from_sigma_epsilon(1.0, 1.0), cutoff);
    let mut table = PotentialTable::new(1);
    table.set(0, 0, Arc::new(potential));
    let config = EngineConfigBuilder::new().truncation_correction(false).build();
    let compute = PairCompute::new(table, Arc::new(NoBonding), config);

    let energy_at = |r: f64| {
        let mut system = System::new(Arc::new(PeriodicBox::cubic(20.0).unwrap()));
        let ar = system.add_atom_type("Ar", 1.0).unwrap();
        let atom = system.add_species("argon", vec![ar]).unwrap();
        system.add_molecule(atom, &[Point3::origin()]).unwrap();
        system.add_molecule(atom, &[Point3::new(r, 0.0, 0.0)]).unwrap();
        let mut state = EnergyState::new(&system);
        compute.compute_all(&mut state, &system, false, None).unwrap()
    };

    let inside = energy_at(cutoff - 1e-7);
    let outside = energy_at(cutoff + 1e-7);
    assert!(inside.abs() < 1e-6);
    assert_eq!(outside, 0.0);
    assert!((inside - outside).abs() < 1e-6);
}

#[test]
fn two_atoms_at_well_minimum() {
    let sigma = 1.0;
    let epsilon = 0.75;
    let lj = LennardJones::from_sigma_epsilon(sigma, epsilon);
    let mut table = PotentialTable::new(1);
    table.set(0, 0, Arc::new(lj));
    let config = EngineConfigBuilder::new().truncation_correction(false).build();
    let compute = PairCompute::new(table, Arc::new(NoBonding), config);

    let mut system = System::new(Arc::new(PeriodicBox::cubic(20.0 * sigma).unwrap()));
    let ar = system.add_atom_type("Ar", 1.0).unwrap();
    let atom = system.add_species("argon", vec![ar]).unwrap();
    system.add_molecule(atom, &[Point3::origin()]).unwrap();
    system
        .add_molecule(atom, &[Point3::new(0.0, lj.r_min(), 0.0)])
        .unwrap();

    let mut state = EnergyState::new(&system);
    let energy = compute.compute_all(&mut state, &system, true, None).unwrap();
    assert!(approx_eq(energy, -epsilon));
    assert!(state.virial().abs() < 1e-9);
    assert!(state.forces().unwrap().iter().all(|f| f.norm() < 1e-9));
}

#[derive(Debug)]
struct ExcludeAll;

impl BondingInfo for ExcludeAll {
    fn skip_pair(&self, _system: &System, _is_pure_atoms: bool, _i: usize, _j: usize) -> bool {
        true
    }

    fn bonded_distance(&self, _system: &System, _i: usize, _j: usize) -> usize {
        0
    }
}

#[test]
fn bonding_rules_control_pair_exclusion() {
    let mut system = System::new(Arc::new(PeriodicBox::cubic(10.0).unwrap()));
    let a = system.add_atom_type("A", 1.0).unwrap();
    let dimer = system.add_species("dimer", vec![a, a]).unwrap();
    system
        .add_molecule(dimer, &[Point3::origin(), Point3::new(1.2, 0.0, 0.0)])
        .unwrap();
    let config = EngineConfigBuilder::new().truncation_correction(false).build();

    let included = PairCompute::new(lj_table(1, 3.0), Arc::new(NoBonding), config);
    let excluded = PairCompute::new(lj_table(1, 3.0), Arc::new(ExcludeAll), config);

    let with_pair = recompute(&included, &system).energy();
    let expected = Truncated::new(LennardJones::new(1.1, 1.0), 3.0).u(1.44);
    assert!(approx_eq(with_pair, expected));
    assert_eq!(recompute(&excluded, &system).energy(), 0.0);
}

#[test]
fn tail_correction_scales_with_pair_counts() {
    let cutoff = 2.0;
    let edge = 12.0;
    let tail_of = |system: &System| {
        let compute = PairCompute::new(lj_table(2, cutoff), Arc::new(NoBonding), EngineConfig::default());
        let without = PairCompute::new(
            lj_table(2, cutoff),
            Arc::new(NoBonding),
            EngineConfigBuilder::new().truncation_correction(false).build(),
        );
        recompute(&compute, system).energy() - recompute(&without, system).energy()
    };
    let build = |na: usize, nb: usize| {
        let mut system = System::new(Arc::new(PeriodicBox::cubic(edge).unwrap()));
        let a = system.add_atom_type("A", 1.0).unwrap();
        let b = system.add_atom_type("B", 1.0).unwrap();
        let sa = system.add_species("a", vec![a]).unwrap();
        let sb = system.add_species("b", vec![b]).unwrap();
        for k in 0..na {
            system.add_molecule(sa, &[Point3::new(-5.0 + 2.5 * k as f64, -5.0, 0.0)]).unwrap();
        }
        for k in 0..nb {
            system.add_molecule(sb, &[Point3::new(-5.0 + 2.5 * k as f64, 3.0, 0.0)]).unwrap();
        }
        system
    };

    let same_4 = tail_of(&build(4, 0));
    let same_2 = tail_of(&build(2, 0));
    assert!(same_4 < 0.0);
    assert!(approx_eq(same_4 / same_2, 6.0));

    let cross_2x3 = tail_of(&build(2, 3)) - tail_of(&build(2, 0)) - tail_of(&build(0, 3));
    let cross_1x3 = tail_of(&build(1, 3)) - tail_of(&build(1, 0)) - tail_of(&build(0, 3));
    assert!(approx_eq(cross_2x3 / cross_1x3, 2.0));
}

#[test]
fn committed_rigid_move_matches_recomputation() {
    let mut system = mixture(9.0);
    let compute = engine(&system, 3.0);
    let mut state = recompute(&compute, &system);

    for (molecule, shift) in [(1, Vector3::new(0.3, -0.2, 0.1)), (5, Vector3::new(-0.4, 0.0, 4.5))] {
        let atoms = system.molecules()[molecule].atoms.clone();
        let moves: Vec<_> = atoms
            .iter()
            .map(|&a| (a, system.atoms()[a].position + shift))
            .collect();
        let old = compute.compute_many_atoms_old(&state, &system, &atoms).unwrap();
        let trial = compute.compute_many_atoms(&state, &system, &moves).unwrap();
        assert!(approx_eq(trial.energy() - old, trial.delta()));

        compute.process_atom_u(&mut state, trial, 1.0);
        for (atom, position) in moves {
            system.set_position(atom, position).unwrap();
        }
    }

    let fresh = recompute(&compute, &system);
    assert!(approx_eq(state.energy(), fresh.energy()));
    for (tracked, expected) in state.u_atom().iter().zip(fresh.u_atom()) {
        assert!(approx_eq(*tracked, *expected));
    }
}

/// Zig-zag five-site chains bonded end to end; sites two and three bonds apart
/// stay inside half the box edge.
fn bonded_chains(edge: f64) -> (System, SpeciesBonding) {
    let mut system = System::new(Arc::new(PeriodicBox::cubic(edge).unwrap()));
    let a = system.add_atom_type("A", 1.0).unwrap();
    let chain = system.add_species("chain", vec![a; 5]).unwrap();
    for origin in [Point3::new(-1.8, -2.0, -1.5), Point3::new(-1.8, 1.0, 1.0)] {
        let sites: Vec<_> = (0..5)
            .map(|k| origin + Vector3::new(0.9 * k as f64, 0.6 * (k % 2) as f64, 0.0))
            .collect();
        system.add_molecule(chain, &sites).unwrap();
    }
    let mut bonding = SpeciesBonding::new(&system);
    bonding
        .add_bonds(chain, &[[0, 1], [1, 2], [2, 3], [3, 4]])
        .unwrap();
    (system, bonding)
}

#[test]
fn near_core_scaled_commits_match_recomputation() {
    let (mut system, bonding) = bonded_chains(6.0);
    let bonding = Arc::new(bonding);
    let mut scale = NearCoreScale::new(1);
    scale.set(0, 0, 0, 0.5);
    scale.set(0, 0, 2, 0.8);
    scale.set(0, 0, 3, 1.3);
    let compute = PairCompute::new(lj_table(1, 2.9), bonding.clone(), EngineConfig::default())
        .with_near_core_scale(scale);
    let unscaled = PairCompute::new(lj_table(1, 2.9), bonding, EngineConfig::default());
    assert!(!approx_eq(
        recompute(&compute, &system).energy(),
        recompute(&unscaled, &system).energy()
    ));

    let mut state = recompute(&compute, &system);
    for (atom, shift) in [
        (1, Vector3::new(0.1, -0.15, 0.05)),
        (3, Vector3::new(-0.05, 0.1, 0.2)),
        (7, Vector3::new(0.2, 0.0, -0.1)),
    ] {
        let position = system.atoms()[atom].position + shift;
        let trial = compute.compute_one(&state, &system, atom, position).unwrap();
        compute.process_atom_u(&mut state, trial, 1.0);
        system.set_position(atom, position).unwrap();
    }

    let atoms = system.molecules()[1].atoms.clone();
    let shift = Vector3::new(0.3, -0.4, 0.25);
    let moves: Vec<_> = atoms
        .iter()
        .map(|&a| (a, system.atoms()[a].position + shift))
        .collect();
    let old = compute.compute_many_atoms_old(&state, &system, &atoms).unwrap();
    let trial = compute.compute_many_atoms(&state, &system, &moves).unwrap();
    assert!(approx_eq(trial.energy() - old, trial.delta()));
    compute.process_atom_u(&mut state, trial, 1.0);
    for (atom, position) in moves {
        system.set_position(atom, position).unwrap();
    }

    let fresh = recompute(&compute, &system);
    assert!(approx_eq(state.energy(), fresh.energy()));
    for (tracked, expected) in state.u_atom().iter().zip(fresh.u_atom()) {
        assert!(approx_eq(*tracked, *expected));
    }
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_and_serial_recomputation_agree() {
    use pairsum::engine::callback::PairStatistics;

    let system = fluid(125, 7.0);
    let compute = engine(&system, 2.5);

    let parallel = recompute(&compute, &system);
    let mut serial = EnergyState::new(&system);
    let mut stats = PairStatistics::default();
    compute
        .compute_all(&mut serial, &system, true, Some(&mut stats))
        .unwrap();

    assert!(approx_eq(parallel.energy(), serial.energy()));
    assert!(approx_eq(parallel.virial(), serial.virial()));
    for (p, s) in parallel.u_atom().iter().zip(serial.u_atom()) {
        assert!(approx_eq(*p, *s));
    }
    for (p, s) in parallel.forces().unwrap().iter().zip(serial.forces().unwrap()) {
        assert!((p - s).norm() < 1e-9);
    }
}

#[test]
fn population_events_keep_state_consistent() {
    let mut system = mixture(9.0);
    let compute = engine(&system, 3.0);
    let mut state = recompute(&compute, &system);

    let trimer = system.species_id("trimer").unwrap();
    let (_, added) = system
        .add_molecule(
            trimer,
            &[
                Point3::new(3.5, 3.5, 3.5),
                Point3::new(3.5, 3.5, 2.5),
                Point3::new(3.5, 2.5, 2.5),
            ],
        )
        .unwrap();
    state.apply_events(added);
    assert!(state.energy().is_nan());
    assert_eq!(state.atom_count_by_type(), system.atom_count_by_type().as_slice());

    compute.compute_all(&mut state, &system, false, None).unwrap();
    let moved_value = state.u_atom()[system.atom_count() - 1];

    // Molecule 0 is the single atom at index 0; the last atom takes its slot.
    let events = system.remove_molecule(0).unwrap();
    state.apply_events(events);
    assert_eq!(state.atom_count(), system.atom_count());
    assert_eq!(state.atom_count_by_type(), system.atom_count_by_type().as_slice());
    assert_eq!(state.u_atom()[0], moved_value);

    compute.compute_all(&mut state, &system, false, None).unwrap();
    let fresh = recompute(&compute, &system);
    assert!(approx_eq(state.energy(), fresh.energy()));
    assert_eq!(state.u_atom().len(), fresh.u_atom().len());
}

#[test]
fn monte_carlo_tracks_energy_without_drift() {
    let mut system = mixture(9.0);
    let compute = engine(&system, 3.0);
    let mut state = EnergyState::new(&system);
    let config = MonteCarloConfigBuilder::new()
        .steps(2_000)
        .temperature(1.5)
        .atom_step(0.25)
        .molecule_step(0.15)
        .seed(Some(2024))
        .check_interval(500)
        .build()
        .unwrap();

    let summary =
        monte_carlo::run(&mut system, &compute, &mut state, &config, &ProgressReporter::new()).unwrap();

    let fresh = recompute(&compute, &system);
    assert!(approx_eq(summary.final_energy, fresh.energy()));
    assert!(summary.max_drift < 1e-8);
    assert!(summary.acceptance() > 0.0);
}
