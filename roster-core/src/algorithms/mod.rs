//! Optimization algorithm implementations.
//!
//! Algorithms are exposed behind the [`Solver`] trait so the entry points
//! can stay agnostic of the concrete search strategy.

pub mod simulated_annealing;

use crate::models::{ProgressCallback, SolverResult};
use crate::solver::{SolverError, State};

/// A search algorithm that turns a domain state into an optimized roster.
pub trait Solver {
    /// Builds an initial roster in `state`, improves it and returns the
    /// best roster found. The optional callback receives rate-limited
    /// progress updates and may cancel the search by returning `false`;
    /// cancellation still yields the best-seen roster.
    fn solve(
        &self,
        state: &mut State,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<SolverResult, SolverError>;
}
