//! # Roster-Core: Workforce Shift-Assignment Engine
//!
//! This crate solves the workforce shift-assignment problem: a set of
//! people is distributed across time-bounded shifts so that every hard
//! rule (capacity, availability, rest, partner conflicts) is satisfied
//! while a weighted soft-preference objective (shift preferences, partner
//! preferences, workload balance, crew mix) is minimized.
//!
//! The pipeline has three stages:
//! 1. a greedy backtracking **builder** constructs an initial feasible
//!    roster,
//! 2. a **simulated-annealing** search explores feasibility-preserving
//!    transfer/swap neighbors under a geometric cooling schedule,
//! 3. a **parallel coordinator** runs N independently seeded searches and
//!    keeps the cheapest result.
//!
//! ## Quick Example
//!
//! ```no_run
//! use roster_core::{run_parallel_solver, models::*};
//! use std::collections::HashMap;
//!
//! let input = ApiInput {
//!     problem: ProblemDefinition {
//!         people: vec![
//!             PersonRecord {
//!                 id: "alice".to_string(),
//!                 label: None,
//!                 shift_count: (1, 2),
//!                 gender: None,
//!                 experience: None,
//!                 shift_types: HashMap::new(),
//!                 unavailable: vec![],
//!                 mandatory: vec![],
//!                 days_off: vec![],
//!                 min_rest_seconds: 0,
//!                 partners: vec![],
//!                 time_preferences: vec![],
//!             },
//!         ],
//!         shifts: vec![
//!             ShiftRecord {
//!                 id: "sat-early".to_string(),
//!                 start: 1_719_644_400,
//!                 end: 1_719_666_000,
//!                 capacity: (1, 1),
//!                 shift_type: 0,
//!                 restricted: false,
//!                 priority: 0,
//!                 base_cost: 0,
//!             },
//!         ],
//!     },
//!     weights: CostWeights::default(),
//!     solver: SolverConfiguration::default(),
//! };
//!
//! match run_parallel_solver(&input) {
//!     Ok(result) => {
//!         println!("cost {} (initial {})", result.final_cost, result.initial_cost);
//!         println!("{}", result.display());
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use crate::algorithms::simulated_annealing::SimulatedAnnealing;
use crate::algorithms::Solver;
use crate::models::{ApiInput, ProgressCallback, SolverResult};
use crate::solver::{SolverError, State};
use rayon::prelude::*;

pub mod algorithms;
pub mod models;
pub mod solver;

fn validate_configuration(input: &ApiInput) -> Result<(), SolverError> {
    let config = &input.solver;
    if !(config.cooling_rate > 0.0 && config.cooling_rate < 1.0) {
        return Err(SolverError::Validation(format!(
            "cooling rate must be strictly between 0 and 1, got {}",
            config.cooling_rate
        )));
    }
    if config.initial_temperature <= 0.0 || !config.initial_temperature.is_finite() {
        return Err(SolverError::Validation(format!(
            "initial temperature must be a positive number, got {}",
            config.initial_temperature
        )));
    }
    if config.workers == 0 {
        return Err(SolverError::Validation(
            "worker count must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Runs a single annealing search with the configured seed.
///
/// This is the deterministic entry point: the same input and seed produce
/// the same roster. For the best-of-N coordinator see
/// [`run_parallel_solver`].
///
/// # Errors
///
/// * `Validation` for malformed configuration or problem data
/// * `Capacity` when supply cannot cover demand (fatal before search)
/// * `NotFound` when a record references an unknown id
/// * `ScheduleCreation` when no feasible initial roster could be built
pub fn run_solver(input: &ApiInput) -> Result<SolverResult, SolverError> {
    run_solver_with_progress(input, None)
}

/// Like [`run_solver`], with a progress callback.
///
/// The callback is invoked at the configured cadence and may cancel the
/// search by returning `false`; the best-seen roster is still returned.
pub fn run_solver_with_progress(
    input: &ApiInput,
    progress_callback: Option<&ProgressCallback>,
) -> Result<SolverResult, SolverError> {
    validate_configuration(input)?;
    let mut state = State::new(input)?;
    let driver = SimulatedAnnealing::new(&input.solver);
    driver.solve(&mut state, progress_callback)
}

/// Runs `workers` independent annealing searches and returns the cheapest
/// feasible roster.
///
/// Workers share nothing but the read-only input: each builds its own
/// state and owns its RNG. Worker `i` seeds its stream with
/// `seed + i` when a base seed is configured, so parallel runs stay
/// reproducible per worker. A failing worker is logged and discarded; the
/// aggregate `NoSolution` error is returned only when every worker fails.
///
/// Write-side resources (result export, persistence) are never touched
/// here; callers use them only after this function returns.
pub fn run_parallel_solver(input: &ApiInput) -> Result<SolverResult, SolverError> {
    validate_configuration(input)?;

    // Surface capacity mismatches once, before spawning anything.
    State::new(input)?.precheck()?;

    let workers = input.solver.workers;
    let base_seed = input.solver.seed;

    let outcomes: Vec<Result<SolverResult, SolverError>> = (0..workers)
        .into_par_iter()
        .map(|worker| {
            let seed = base_seed.map(|s| s.wrapping_add(worker as u64));
            let mut state = State::new(input)?;
            let driver = SimulatedAnnealing::new(&input.solver).with_seed(seed);
            driver.solve(&mut state, None)
        })
        .collect();

    let mut best: Option<SolverResult> = None;
    let mut failures = Vec::new();
    for (worker, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => {
                log::info!("worker {} finished with cost {:.2}", worker, result.final_cost);
                let better = best
                    .as_ref()
                    .map_or(true, |b| result.final_cost < b.final_cost);
                if better {
                    best = Some(result);
                }
            }
            Err(e) => {
                log::warn!("worker {} failed: {}", worker, e);
                failures.push(format!("worker {}: {}", worker, e));
            }
        }
    }

    best.ok_or_else(|| SolverError::NoSolution(failures.join("; ")))
}
