//! Property-based tests for the solver.
//!
//! These tests use proptest to verify invariants hold across randomly
//! generated problem configurations: built rosters are feasible, neighbor
//! moves preserve feasibility and reverse cleanly, and cost evaluation is
//! pure and deterministic.

mod common;

use common::{day_shift, person};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use roster_core::models::{ApiInput, CostWeights, ProblemDefinition, SolverConfiguration};
use roster_core::solver::State;

/// A problem that is always satisfiable: every person needs one to two
/// shifts, every shift takes up to `people_count` people, no windows.
fn solvable_problem() -> impl Strategy<Value = ApiInput> {
    (2..8usize, 2..6usize).prop_map(|(people_count, shift_count)| {
        let people = (0..people_count)
            .map(|i| person(&format!("p{}", i), 1, 2))
            .collect();
        let shifts = (0..shift_count)
            .map(|i| day_shift(&format!("s{}", i), i as i64, 1, people_count as u32))
            .collect();
        ApiInput {
            problem: ProblemDefinition { people, shifts },
            weights: CostWeights::default(),
            solver: SolverConfiguration::default(),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn built_rosters_are_feasible(input in solvable_problem(), seed in any::<u64>()) {
        let mut state = State::new(&input).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        state.build_initial_roster(&mut rng).unwrap();

        let violations = state.validate_roster();
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        for (idx, record) in input.problem.people.iter().enumerate() {
            let count = state.assigned[idx].len() as u32;
            prop_assert!(count >= record.shift_count.0);
            prop_assert!(count <= record.shift_count.1);
        }
    }

    #[test]
    fn neighbors_preserve_feasibility(input in solvable_problem(), seed in any::<u64>()) {
        let mut state = State::new(&input).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        state.build_initial_roster(&mut rng).unwrap();

        for _ in 0..20 {
            if state.propose_neighbor(&mut rng).is_none() {
                break;
            }
            let violations = state.validate_roster();
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }
    }

    #[test]
    fn reverted_neighbors_restore_the_cost(input in solvable_problem(), seed in any::<u64>()) {
        let mut state = State::new(&input).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        state.build_initial_roster(&mut rng).unwrap();

        for _ in 0..10 {
            let cost_before = state.total_cost();
            let Some(mv) = state.propose_neighbor(&mut rng) else {
                break;
            };
            state.revert_move(&mv);
            prop_assert!((state.total_cost() - cost_before).abs() < 1e-9);
        }
    }

    #[test]
    fn cost_evaluation_is_pure(input in solvable_problem(), seed in any::<u64>()) {
        let mut state = State::new(&input).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        state.build_initial_roster(&mut rng).unwrap();

        let first = state.evaluate_cost();
        let second = state.evaluate_cost();
        prop_assert_eq!(first.summary.total, second.summary.total);
        prop_assert_eq!(first.summary.priority, second.summary.priority);
        prop_assert_eq!(first.per_person, second.per_person);
    }

    #[test]
    fn construction_is_seed_deterministic(input in solvable_problem(), seed in any::<u64>()) {
        let build = |input: &ApiInput| {
            let mut state = State::new(input).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            state.build_initial_roster(&mut rng).unwrap();
            state.schedule.clone()
        };
        prop_assert_eq!(build(&input), build(&input));
    }
}
