//! Initial roster construction.
//!
//! The builder produces a feasible roster by greedy weighted-random
//! placement with bounded retries and depth-growing backtracking. Hard
//! constraints are enforced through speculative placement: tentatively add,
//! validate, roll back on failure. Infeasible inputs are reported through
//! the capacity pre-checks or, after all resets are spent, as a
//! `ScheduleCreation` error.

use super::{SolverError, State};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use std::collections::HashMap;

/// Placement attempts per person before giving up on them.
const MAX_ASSIGN_ITER: usize = 20;
/// Full restarts before construction is declared failed.
const MAX_RESETS: usize = 50;

/// Score bonus for a restricted shift still needing the person's type.
const SCORE_RESTRICTED: u32 = 100;
/// Score bonus when the person is below their per-type minimum.
const SCORE_BELOW_PERSON_MIN: u32 = 15;
/// Score multiplier per shift priority point.
const SCORE_PRIORITY: u32 = 10;
/// Score bonus when the shift is below its minimum headcount.
const SCORE_BELOW_SHIFT_MIN: u32 = 15;

impl State {
    /// Builds an initial feasible roster from an empty one.
    ///
    /// People are processed from a shuffled worklist. When a person cannot
    /// be placed, previously placed people are unwound from an undo stack
    /// with a per-person growing depth; when the stack is too shallow for
    /// the required depth, everything resets and construction starts over
    /// with a fresh shuffle.
    ///
    /// On success every person holds at least their minimum and at most
    /// their maximum shift count, and all hard constraints hold.
    pub fn build_initial_roster<R: Rng>(&mut self, rng: &mut R) -> Result<(), SolverError> {
        self.check_type_capacity()?;
        self.check_total_capacity()?;

        let people_count = self.people.len();
        let mut worklist: Vec<usize> = (0..people_count).collect();
        worklist.shuffle(rng);

        let mut undo_stack: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut backtrack_depth: HashMap<usize, usize> = HashMap::new();
        let mut resets = 0usize;

        while let Some(person_idx) = worklist.pop() {
            match self.assign_person(person_idx, rng) {
                Some(placed) => {
                    undo_stack.push((person_idx, placed));
                    backtrack_depth.insert(person_idx, 0);
                }
                None => {
                    let depth = backtrack_depth.get(&person_idx).copied().unwrap_or(0) + 1;
                    if undo_stack.len() >= depth {
                        backtrack_depth.insert(person_idx, depth);
                        for _ in 0..depth {
                            let (last_person, last_shifts) = undo_stack.pop().unwrap();
                            for shift_idx in last_shifts {
                                self.remove_assignment(shift_idx, last_person);
                            }
                            worklist.push(last_person);
                        }
                        worklist.push(person_idx);
                        log::warn!(
                            "backtracked {} placements to resolve conflict for '{}'",
                            depth,
                            self.person_idx_to_id[person_idx]
                        );
                    } else {
                        resets += 1;
                        if resets > MAX_RESETS {
                            return Err(SolverError::ScheduleCreation(format!(
                                "no feasible roster after {} restarts; '{}' could not be placed",
                                MAX_RESETS, self.person_idx_to_id[person_idx]
                            )));
                        }
                        self.clear_assignments();
                        undo_stack.clear();
                        backtrack_depth.clear();
                        worklist = (0..people_count).collect();
                        worklist.shuffle(rng);
                        log::warn!("construction reset {} of {}", resets, MAX_RESETS);
                    }
                }
            }
        }

        // Lower-bound audit: only enforced here, not during placement.
        for person_idx in 0..people_count {
            let count = self.assigned[person_idx].len() as u32;
            if count < self.people[person_idx].min_shifts {
                return Err(SolverError::ScheduleCreation(format!(
                    "'{}' holds {} shifts, below their minimum of {}",
                    self.person_idx_to_id[person_idx],
                    count,
                    self.people[person_idx].min_shifts
                )));
            }
            let uncovered = self.uncovered_mandatory(person_idx);
            if uncovered > 0 {
                log::info!(
                    "'{}' has {} uncovered mandatory interval(s) after construction",
                    self.person_idx_to_id[person_idx],
                    uncovered
                );
            }
        }

        log::info!("initial roster constructed after {} reset(s)", resets);
        Ok(())
    }

    /// Tries to fill one person up to their maximum shift count.
    ///
    /// Returns the placed shifts, or `None` (with all placements rolled
    /// back) when the person ends below their minimum.
    fn assign_person<R: Rng>(&mut self, person_idx: usize, rng: &mut R) -> Option<Vec<usize>> {
        let min_shifts = self.people[person_idx].min_shifts as usize;
        let max_shifts = self.people[person_idx].max_shifts as usize;
        let mut placed: Vec<usize> = Vec::new();
        let mut attempt = 0usize;

        while placed.len() < max_shifts && attempt < MAX_ASSIGN_ITER {
            attempt += 1;
            let Some(shift_idx) = self.choose_shift(person_idx, attempt, rng) else {
                break;
            };
            self.add_assignment(shift_idx, person_idx);
            if self.is_valid_assignment(shift_idx, person_idx) {
                placed.push(shift_idx);
            } else {
                self.remove_assignment(shift_idx, person_idx);
            }
        }

        if placed.len() >= min_shifts {
            Some(placed)
        } else {
            log::debug!(
                "'{}' reached only {}/{} shifts after {} attempts",
                self.person_idx_to_id[person_idx],
                placed.len(),
                min_shifts,
                attempt
            );
            for &shift_idx in &placed {
                self.remove_assignment(shift_idx, person_idx);
            }
            None
        }
    }

    /// Picks a candidate shift for the person by weighted random sampling.
    ///
    /// Candidates must have spare capacity, must not push the person over
    /// their per-type maximum and must not already contain them. Scores are
    /// only heuristics; the hard-constraint check after placement has the
    /// final word.
    fn choose_shift<R: Rng>(
        &self,
        person_idx: usize,
        attempt: usize,
        rng: &mut R,
    ) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.shifts.len())
            .filter(|&shift_idx| {
                self.shifts[shift_idx].has_room(self.schedule[shift_idx].len())
                    && self.type_has_headroom(person_idx, shift_idx)
                    && !self.schedule[shift_idx].contains(&person_idx)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let scores: Vec<u32> = candidates
            .iter()
            .map(|&shift_idx| self.score_shift(person_idx, shift_idx, attempt, rng))
            .collect();

        match WeightedIndex::new(&scores) {
            Ok(dist) => Some(candidates[dist.sample(rng)]),
            // all scores zero: fall back to a uniform pick
            Err(_) => candidates.choose(rng).copied(),
        }
    }

    /// The person can still take another shift of this shift's type.
    fn type_has_headroom(&self, person_idx: usize, shift_idx: usize) -> bool {
        let type_idx = self.shifts[shift_idx].type_idx;
        let max_allowed = self.people[person_idx]
            .allowed
            .get(&type_idx)
            .map_or(0, |&(_, max)| max);
        max_allowed == 0 || self.type_count(person_idx, type_idx) < max_allowed
    }

    /// Additive desirability score of one candidate shift.
    ///
    /// With probability `0.23 + 0.10 * attempt` the score is replaced by a
    /// uniform random bonus, the diversification hedge that keeps repeated
    /// construction attempts from circling the same local optimum.
    fn score_shift<R: Rng>(
        &self,
        person_idx: usize,
        shift_idx: usize,
        attempt: usize,
        rng: &mut R,
    ) -> u32 {
        let average_weight = (SCORE_RESTRICTED
            + SCORE_BELOW_PERSON_MIN
            + SCORE_PRIORITY
            + SCORE_BELOW_SHIFT_MIN)
            / 4;
        if rng.random::<f64>() < 0.23 + 0.10 * attempt as f64 {
            return rng.random_range(1..=average_weight * attempt as u32);
        }

        let shift = &self.shifts[shift_idx];
        let person = &self.people[person_idx];
        let type_count = self.type_count(person_idx, shift.type_idx);
        let limits = person.allowed.get(&shift.type_idx);

        let mut score = 0;
        if shift.restricted && limits.is_some_and(|&(_, max)| type_count < max) {
            score += SCORE_RESTRICTED;
        }
        if limits.is_some_and(|&(min, _)| type_count < min) {
            score += SCORE_BELOW_PERSON_MIN;
        }
        score += shift.priority * SCORE_PRIORITY;
        if self.schedule[shift_idx].len() < shift.min_cap as usize {
            score += SCORE_BELOW_SHIFT_MIN;
        }
        score
    }

    /// Runs the fatal capacity pre-checks without building anything. The
    /// coordinator calls this once up front so a capacity mismatch is
    /// reported as such instead of as N failed workers.
    pub fn precheck(&self) -> Result<(), SolverError> {
        self.check_type_capacity()?;
        self.check_total_capacity()
    }

    /// Per-type supply/demand pre-check: for every shift type, the summed
    /// shift capacity must cover the summed per-person minimum requirement.
    fn check_type_capacity(&self) -> Result<(), SolverError> {
        for (type_idx, &type_id) in self.type_idx_to_id.iter().enumerate() {
            let mut supply = 0u64;
            let mut unbounded = false;
            for shift in self.shifts.iter().filter(|s| s.type_idx == type_idx) {
                if shift.max_cap == 0 {
                    unbounded = true;
                } else {
                    supply += shift.max_cap as u64;
                }
            }
            let demand: u64 = self
                .people
                .iter()
                .filter_map(|p| p.allowed.get(&type_idx))
                .map(|&(min, _)| min as u64)
                .sum();

            if !unbounded && supply < demand {
                return Err(SolverError::Capacity(format!(
                    "insufficient capacity for shift type {}: {} slots available, at least {} required",
                    type_id, supply, demand
                )));
            }
            log::info!(
                "shift type {} has {} slot(s) beyond the required minimum",
                type_id,
                if unbounded {
                    "unbounded".to_string()
                } else {
                    (supply - demand).to_string()
                }
            );
        }
        Ok(())
    }

    /// Total supply/demand pre-check across all shifts and people.
    fn check_total_capacity(&self) -> Result<(), SolverError> {
        let mut total_max_supply = 0u64;
        let mut unbounded = false;
        let mut total_min_supply = 0u64;
        for shift in &self.shifts {
            total_min_supply += shift.min_cap as u64;
            if shift.max_cap == 0 {
                unbounded = true;
            } else {
                total_max_supply += shift.max_cap as u64;
            }
        }
        let total_min_demand: u64 = self.people.iter().map(|p| p.min_shifts as u64).sum();
        let total_max_demand: u64 = self.people.iter().map(|p| p.max_shifts as u64).sum();

        if !unbounded && total_max_supply < total_min_demand {
            return Err(SolverError::Capacity(format!(
                "maximum shift capacity ({}) is below the minimum required person capacity ({})",
                total_max_supply, total_min_demand
            )));
        }
        if total_min_supply > total_max_demand {
            return Err(SolverError::Capacity(format!(
                "minimum shift capacity ({}) exceeds the maximum person capacity ({})",
                total_min_supply, total_max_demand
            )));
        }
        Ok(())
    }
}
