//! Simulated annealing driver.
//!
//! One driver instance runs one single-threaded search to convergence: it
//! builds an initial feasible roster, then walks feasibility-preserving
//! neighbors under a geometric cooling schedule, accepting worse rosters
//! with probability `exp(-|delta| / temperature)`. Termination is
//! guaranteed because the temperature decays geometrically toward the
//! fixed floor and the no-improvement counter only resets on acceptance.

use super::Solver;
use crate::models::{ProgressCallback, ProgressUpdate, SolverConfiguration, SolverResult};
use crate::solver::{SolverError, State};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

/// Temperature floor below which the search stops.
const TEMPERATURE_FLOOR: f64 = 1.0;
/// Progress cadence when the configuration does not set one.
const DEFAULT_LOG_FREQUENCY: u64 = 333;

/// Simulated annealing search over feasible rosters.
pub struct SimulatedAnnealing {
    initial_temperature: f64,
    cooling_rate: f64,
    no_improvement_limit: u64,
    time_limit_seconds: Option<u64>,
    log_frequency: u64,
    seed: Option<u64>,
}

impl SimulatedAnnealing {
    /// Creates a driver from the solver configuration.
    ///
    /// The configuration is expected to be validated (cooling rate
    /// strictly between 0 and 1, positive initial temperature); the crate
    /// entry points check this before constructing a driver.
    pub fn new(config: &SolverConfiguration) -> Self {
        SimulatedAnnealing {
            initial_temperature: config.initial_temperature,
            cooling_rate: config.cooling_rate,
            no_improvement_limit: config.no_improvement_limit,
            time_limit_seconds: config.time_limit_seconds,
            log_frequency: config
                .logging
                .log_frequency
                .unwrap_or(DEFAULT_LOG_FREQUENCY)
                .max(1),
            seed: config.seed,
        }
    }

    /// Overrides the RNG seed; used by the parallel coordinator to give
    /// each worker its own stream.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Estimated iterations until the schedule reaches the floor.
    /// Returns 0 when the cooling rate lies outside (0, 1) and the
    /// schedule would never decay.
    fn estimated_iterations(&self) -> u64 {
        debug_assert!(
            self.cooling_rate > 0.0 && self.cooling_rate < 1.0,
            "cooling rate must lie strictly between 0 and 1"
        );
        if self.initial_temperature <= TEMPERATURE_FLOOR
            || self.cooling_rate <= 0.0
            || self.cooling_rate >= 1.0
        {
            return 0;
        }
        ((TEMPERATURE_FLOOR / self.initial_temperature).ln() / self.cooling_rate.ln()).ceil()
            as u64
    }
}

impl Solver for SimulatedAnnealing {
    fn solve(
        &self,
        state: &mut State,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<SolverResult, SolverError> {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        let start = Instant::now();
        state.clear_assignments();
        state.build_initial_roster(&mut rng)?;

        let initial_cost = state.total_cost();
        if state.logging.log_initial_state {
            log::info!("initial roster (cost {:.2}):\n{}", initial_cost, state.format_roster());
            log::info!("{}", state.format_cost_breakdown());
        }

        let estimated_iterations = self.estimated_iterations();
        let mut temperature = self.initial_temperature;
        let mut current_cost = initial_cost;
        // Best-seen snapshot, kept only for the cancellation path: a run
        // that converges normally returns the last-accepted roster.
        let mut best_cost = initial_cost;
        let mut best_roster = state.snapshot();
        let mut cancelled = false;
        let mut no_improvement = 0u64;
        let mut accepted = 0u64;
        let mut rejected = 0u64;
        let mut iteration = 0u64;

        while temperature > TEMPERATURE_FLOOR && no_improvement < self.no_improvement_limit {
            if let Some(limit) = self.time_limit_seconds {
                if start.elapsed().as_secs() >= limit {
                    log::info!("time limit of {}s reached after {} iterations", limit, iteration);
                    break;
                }
            }

            let Some(mv) = state.propose_neighbor(&mut rng) else {
                log::info!("search space exhausted after {} iterations", iteration);
                break;
            };

            let new_cost = state.total_cost();
            let delta = new_cost - current_cost;
            let accept =
                delta < 0.0 || rng.random::<f64>() < (-delta.abs() / temperature).exp();

            if accept {
                current_cost = new_cost;
                no_improvement = 0;
                accepted += 1;
                if new_cost < best_cost {
                    best_cost = new_cost;
                    best_roster = state.snapshot();
                }
            } else {
                state.revert_move(&mv);
                no_improvement += 1;
                rejected += 1;
            }

            temperature *= self.cooling_rate;
            iteration += 1;

            if iteration % self.log_frequency == 0 {
                let update = ProgressUpdate {
                    iteration,
                    estimated_iterations,
                    temperature,
                    current_cost,
                    best_cost,
                    initial_cost,
                    accepted_moves: accepted,
                    rejected_moves: rejected,
                    no_improvement_count: no_improvement,
                    elapsed_seconds: start.elapsed().as_secs_f64(),
                };
                log::debug!(
                    "iteration {}/{}: cost {:.2} (best {:.2}), temperature {:.3}",
                    update.iteration,
                    update.estimated_iterations,
                    update.current_cost,
                    update.best_cost,
                    update.temperature
                );
                if let Some(callback) = progress_callback {
                    if !callback(&update) {
                        log::info!("search cancelled at iteration {}", iteration);
                        cancelled = true;
                        break;
                    }
                }
            }
        }

        // Normal termination (temperature floor, no-improvement limit,
        // exhausted neighborhood, time limit) returns the last-accepted
        // roster; only an external cancellation falls back to the best
        // roster seen so far.
        if cancelled {
            state.restore(best_roster);
        }
        let result = state.to_solver_result(initial_cost, iteration, no_improvement);

        // Final update so a consumer's last sample matches the result.
        if let Some(callback) = progress_callback {
            callback(&ProgressUpdate {
                iteration,
                estimated_iterations,
                temperature,
                current_cost: result.final_cost,
                best_cost: best_cost.min(result.final_cost),
                initial_cost,
                accepted_moves: accepted,
                rejected_moves: rejected,
                no_improvement_count: no_improvement,
                elapsed_seconds: start.elapsed().as_secs_f64(),
            });
        }

        if state.logging.log_duration_and_cost {
            log::info!(
                "finished after {} iterations in {:.2}s: cost {:.2} (initial {:.2})",
                iteration,
                start.elapsed().as_secs_f64(),
                result.final_cost,
                initial_cost
            );
        }
        if state.logging.display_final_schedule {
            log::info!("final roster:\n{}", state.format_roster());
        }
        if state.logging.log_final_cost_breakdown {
            log::info!("{}", state.format_cost_breakdown());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::solver::State;
    use std::collections::HashMap;

    fn hour(h: i64) -> i64 {
        h * 3600
    }

    fn small_input(seed: u64) -> ApiInput {
        let people = (0..4)
            .map(|i| PersonRecord {
                id: format!("p{}", i),
                label: None,
                shift_count: (1, 2),
                gender: None,
                experience: None,
                shift_types: HashMap::new(),
                unavailable: vec![],
                mandatory: vec![],
                days_off: vec![],
                min_rest_seconds: 0,
                partners: vec![],
                time_preferences: vec![],
            })
            .collect();
        let shifts = (0..4)
            .map(|i| ShiftRecord {
                id: format!("s{}", i),
                start: hour(i * 24),
                end: hour(i * 24 + 8),
                capacity: (1, 2),
                shift_type: 0,
                restricted: false,
                priority: 1,
                base_cost: 0,
            })
            .collect();
        ApiInput {
            problem: ProblemDefinition { people, shifts },
            weights: CostWeights::default(),
            solver: SolverConfiguration {
                workers: 1,
                seed: Some(seed),
                initial_temperature: 100.0,
                cooling_rate: 0.99,
                no_improvement_limit: 200,
                time_limit_seconds: None,
                logging: LoggingOptions::default(),
            },
        }
    }

    #[test]
    fn solve_returns_a_feasible_roster() {
        let input = small_input(42);
        let mut state = State::new(&input).unwrap();
        let driver = SimulatedAnnealing::new(&input.solver);
        let result = driver.solve(&mut state, None).unwrap();
        assert!(state.validate_roster().is_empty());
        assert!(result.final_cost.is_finite());
    }

    #[test]
    fn same_seed_reproduces_the_same_roster() {
        let run = |seed: u64| {
            let input = small_input(seed);
            let mut state = State::new(&input).unwrap();
            let driver = SimulatedAnnealing::new(&input.solver);
            let result = driver.solve(&mut state, None).unwrap();
            (result.final_cost, result.assignments)
        };
        let (cost_a, roster_a) = run(1234);
        let (cost_b, roster_b) = run(1234);
        assert_eq!(cost_a, cost_b);
        assert_eq!(roster_a, roster_b);
    }

    #[test]
    fn different_seeds_may_differ_but_stay_feasible() {
        for seed in [1, 2, 3] {
            let input = small_input(seed);
            let mut state = State::new(&input).unwrap();
            let driver = SimulatedAnnealing::new(&input.solver);
            driver.solve(&mut state, None).unwrap();
            assert!(state.validate_roster().is_empty());
        }
    }

    #[test]
    fn cancellation_returns_the_best_seen_roster() {
        use std::sync::{Arc, Mutex};
        let mut input = small_input(7);
        input.solver.logging.log_frequency = Some(1);
        let mut state = State::new(&input).unwrap();
        let driver = SimulatedAnnealing::new(&input.solver);

        // Cancel on the 10th update, remembering the best seen up to then.
        let best_at_cancel: Arc<Mutex<Option<f64>>> = Arc::new(Mutex::new(None));
        let sink = best_at_cancel.clone();
        let counter = Arc::new(Mutex::new(0u32));
        let callback: ProgressCallback = Box::new(move |update| {
            let mut count = counter.lock().unwrap();
            *count += 1;
            if *count == 10 {
                *sink.lock().unwrap() = Some(update.best_cost);
                false
            } else {
                true
            }
        });

        let result = driver.solve(&mut state, Some(&callback)).unwrap();
        assert!(state.validate_roster().is_empty());
        let best_at_cancel_value = *best_at_cancel.lock().unwrap();
        if let Some(best) = best_at_cancel_value {
            assert!(
                (result.final_cost - best).abs() < 1e-9,
                "cancelled run returned {} instead of the best seen {}",
                result.final_cost,
                best
            );
        }
    }

    #[test]
    fn normal_termination_returns_the_last_accepted_roster() {
        use std::sync::{Arc, Mutex};
        let mut input = small_input(21);
        input.solver.logging.log_frequency = Some(1);
        input.solver.no_improvement_limit = 50;
        let mut state = State::new(&input).unwrap();
        let driver = SimulatedAnnealing::new(&input.solver);

        let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            sink.lock().unwrap().push(update.clone());
            true
        });

        let result = driver.solve(&mut state, Some(&callback)).unwrap();
        let updates = updates.lock().unwrap();
        assert!(updates.len() >= 2);

        // The last in-loop update (before the final synthesized one) holds
        // the current cost at termination; the result must carry that
        // roster, not the best-seen snapshot.
        let last_in_loop = &updates[updates.len() - 2];
        assert!(
            (last_in_loop.current_cost - result.final_cost).abs() < 1e-9,
            "normal termination returned {} instead of the current {}",
            result.final_cost,
            last_in_loop.current_cost
        );
    }

    #[test]
    fn final_progress_update_matches_result() {
        use std::sync::{Arc, Mutex};
        let input = small_input(11);
        let mut state = State::new(&input).unwrap();
        let driver = SimulatedAnnealing::new(&input.solver);

        let last: Arc<Mutex<Option<ProgressUpdate>>> = Arc::new(Mutex::new(None));
        let sink = last.clone();
        let callback: ProgressCallback = Box::new(move |update| {
            *sink.lock().unwrap() = Some(update.clone());
            true
        });

        let result = driver.solve(&mut state, Some(&callback)).unwrap();
        let last_update = last.lock().unwrap().clone().expect("no progress emitted");
        assert_eq!(last_update.current_cost, result.final_cost);
        assert!(last_update.best_cost <= result.final_cost);
    }
}
