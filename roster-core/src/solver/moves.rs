//! Neighbor generation.
//!
//! A neighbor is reached by a single feasibility-preserving transformation:
//! either a transfer (one person changes shift) or a swap (two people trade
//! shifts). The generator mutates the working roster in place and hands the
//! caller an undo record; the annealing driver reverts rejected moves
//! instead of cloning the roster per attempt.

use super::State;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Random pick attempts before the generator gives up.
const MAX_NEIGHBOR_ATTEMPTS: usize = 10_000;

/// Probability of attempting a transfer into a shift that still has room
/// but already meets its minimum.
const TRANSFER_BIAS: f64 = 0.66;

/// Undo record of an applied neighbor transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// `person` moved from shift `from` to shift `to`
    Transfer {
        person: usize,
        from: usize,
        to: usize,
    },
    /// `person_a` moved `shift_a` -> `shift_b`, `person_b` the reverse
    Swap {
        person_a: usize,
        shift_a: usize,
        person_b: usize,
        shift_b: usize,
    },
}

impl State {
    /// Applies one random feasible transformation and returns its undo
    /// record, or `None` when no feasible neighbor was found within the
    /// attempt limit. On `None` the roster is unchanged.
    ///
    /// Transfers are preferred when the source shift sits above its minimum
    /// and the target is under-staffed; this steers the search toward
    /// filling shifts that are below their required headcount.
    pub fn propose_neighbor<R: Rng>(&mut self, rng: &mut R) -> Option<Move> {
        let people_count = self.people.len();

        for _ in 0..MAX_NEIGHBOR_ATTEMPTS {
            let person_a = rng.random_range(0..people_count);
            let person_b = rng.random_range(0..people_count);
            if person_a == person_b {
                continue;
            }
            let Some(&shift_a) = self.assigned[person_a].choose(rng) else {
                continue;
            };
            let Some(&shift_b) = self.assigned[person_b].choose(rng) else {
                continue;
            };
            if shift_a == shift_b {
                continue;
            }

            let len_a = self.schedule[shift_a].len();
            let len_b = self.schedule[shift_b].len();
            let above_min_a = len_a > self.shifts[shift_a].min_cap as usize;
            let below_min_b = len_b < self.shifts[shift_b].min_cap as usize;
            let has_room_b = self.shifts[shift_b].has_room(len_b);

            if above_min_a && (below_min_b || (has_room_b && rng.random::<f64>() < TRANSFER_BIAS))
            {
                if self.schedule[shift_b].contains(&person_a) {
                    continue;
                }
                self.remove_assignment(shift_a, person_a);
                self.add_assignment(shift_b, person_a);
                if self.is_valid_assignment(shift_b, person_a) {
                    return Some(Move::Transfer {
                        person: person_a,
                        from: shift_a,
                        to: shift_b,
                    });
                }
                self.remove_assignment(shift_b, person_a);
                self.add_assignment(shift_a, person_a);
            } else {
                if self.schedule[shift_b].contains(&person_a)
                    || self.schedule[shift_a].contains(&person_b)
                {
                    continue;
                }
                self.remove_assignment(shift_a, person_a);
                self.add_assignment(shift_b, person_a);
                self.remove_assignment(shift_b, person_b);
                self.add_assignment(shift_a, person_b);
                if self.is_valid_assignment(shift_b, person_a)
                    && self.is_valid_assignment(shift_a, person_b)
                {
                    return Some(Move::Swap {
                        person_a,
                        shift_a,
                        person_b,
                        shift_b,
                    });
                }
                self.remove_assignment(shift_b, person_a);
                self.add_assignment(shift_a, person_a);
                self.remove_assignment(shift_a, person_b);
                self.add_assignment(shift_b, person_b);
            }
        }

        log::debug!(
            "no feasible neighbor within {} attempts",
            MAX_NEIGHBOR_ATTEMPTS
        );
        None
    }

    /// Undoes a move previously returned by [`State::propose_neighbor`].
    pub fn revert_move(&mut self, mv: &Move) {
        match *mv {
            Move::Transfer { person, from, to } => {
                self.remove_assignment(to, person);
                self.add_assignment(from, person);
            }
            Move::Swap {
                person_a,
                shift_a,
                person_b,
                shift_b,
            } => {
                self.remove_assignment(shift_b, person_a);
                self.add_assignment(shift_a, person_a);
                self.remove_assignment(shift_a, person_b);
                self.add_assignment(shift_b, person_b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::solver::State;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, HashSet};

    fn hour(h: i64) -> i64 {
        h * 3600
    }

    fn person(id: &str) -> PersonRecord {
        PersonRecord {
            id: id.to_string(),
            label: None,
            shift_count: (1, 3),
            gender: None,
            experience: None,
            shift_types: HashMap::new(),
            unavailable: vec![],
            mandatory: vec![],
            days_off: vec![],
            min_rest_seconds: 0,
            partners: vec![],
            time_preferences: vec![],
        }
    }

    fn shift(id: &str, day: i64) -> ShiftRecord {
        ShiftRecord {
            id: id.to_string(),
            start: hour(day * 24),
            end: hour(day * 24 + 8),
            capacity: (0, 2),
            shift_type: 0,
            restricted: false,
            priority: 0,
            base_cost: 0,
        }
    }

    fn built_state(seed: u64) -> (State, ChaCha8Rng) {
        let mut s = State::new(&ApiInput {
            problem: ProblemDefinition {
                people: vec![person("a"), person("b"), person("c"), person("d")],
                shifts: vec![shift("s1", 0), shift("s2", 1), shift("s3", 2), shift("s4", 3)],
            },
            weights: CostWeights::default(),
            solver: SolverConfiguration::default(),
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        s.build_initial_roster(&mut rng).unwrap();
        (s, rng)
    }

    fn roster_fingerprint(state: &State) -> Vec<HashSet<usize>> {
        state
            .schedule
            .iter()
            .map(|members| members.iter().copied().collect())
            .collect()
    }

    #[test]
    fn neighbor_preserves_feasibility() {
        let (mut s, mut rng) = built_state(11);
        for _ in 0..50 {
            if s.propose_neighbor(&mut rng).is_none() {
                break;
            }
            assert!(s.validate_roster().is_empty());
        }
    }

    #[test]
    fn reverted_move_restores_the_roster() {
        let (mut s, mut rng) = built_state(23);
        for _ in 0..25 {
            let before = roster_fingerprint(&s);
            let Some(mv) = s.propose_neighbor(&mut rng) else {
                break;
            };
            assert_ne!(before, roster_fingerprint(&s), "move changed nothing");
            s.revert_move(&mv);
            assert_eq!(before, roster_fingerprint(&s));
        }
    }

    #[test]
    fn views_stay_consistent_across_moves() {
        let (mut s, mut rng) = built_state(37);
        for _ in 0..50 {
            if s.propose_neighbor(&mut rng).is_none() {
                break;
            }
            for (shift_idx, members) in s.schedule.iter().enumerate() {
                for &p in members {
                    assert!(s.assigned[p].contains(&shift_idx));
                }
            }
            for (p, shifts) in s.assigned.iter().enumerate() {
                for &shift_idx in shifts {
                    assert!(s.schedule[shift_idx].contains(&p));
                }
            }
        }
    }

    #[test]
    fn no_neighbor_leaves_state_untouched() {
        // single person, single shift: no transformation is possible
        let mut s = State::new(&ApiInput {
            problem: ProblemDefinition {
                people: vec![person("a")],
                shifts: vec![shift("s1", 0)],
            },
            weights: CostWeights::default(),
            solver: SolverConfiguration::default(),
        })
        .unwrap();
        s.add_assignment(0, 0);
        let before = roster_fingerprint(&s);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(s.propose_neighbor(&mut rng).is_none());
        assert_eq!(before, roster_fingerprint(&s));
    }
}
