//! Data models and types for the roster-core API.
//!
//! This module contains the public data structures used to define a
//! shift-assignment problem, configure the solver, and receive results. All
//! types are serializable (JSON/YAML) so problem files can be kept next to
//! the rosters they produce.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound used for open-ended time windows (9999-12-31T23:59:59Z).
pub const FAR_FUTURE: i64 = 253_402_300_799;

/// Complete input specification for the solver.
///
/// The root structure combines the problem definition (people and shifts),
/// the soft-constraint weights, and the solver configuration.
///
/// # Example
///
/// ```no_run
/// use roster_core::models::*;
/// use std::collections::HashMap;
///
/// let input = ApiInput {
///     problem: ProblemDefinition {
///         people: vec![
///             PersonRecord {
///                 id: "alice".to_string(),
///                 label: Some("Alice".to_string()),
///                 shift_count: (2, 3),
///                 gender: Some(1),
///                 experience: None,
///                 shift_types: HashMap::new(), // joker: may take any type
///                 unavailable: vec![],
///                 mandatory: vec![],
///                 days_off: vec![],
///                 min_rest_seconds: 8 * 3600,
///                 partners: vec![PartnerPreference {
///                     id: "bob".to_string(),
///                     relation: -1, // prefers to work with bob
///                 }],
///                 time_preferences: vec![],
///             },
///         ],
///         shifts: vec![
///             ShiftRecord {
///                 id: "fri-night".to_string(),
///                 start: 1_719_615_600,
///                 end: 1_719_637_200,
///                 capacity: (2, 4),
///                 shift_type: 0,
///                 restricted: false,
///                 priority: 1,
///                 base_cost: 3,
///             },
///         ],
///     },
///     weights: CostWeights::default(),
///     solver: SolverConfiguration::default(),
/// };
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiInput {
    /// The core problem definition: people and shifts
    pub problem: ProblemDefinition,
    /// Soft-constraint weights (defaults match the calibrated production values)
    #[serde(default)]
    pub weights: CostWeights,
    /// Solver configuration and parameters
    #[serde(default)]
    pub solver: SolverConfiguration,
}

/// The people to be rostered and the shifts to fill.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProblemDefinition {
    /// Everyone that can be assigned to shifts
    pub people: Vec<PersonRecord>,
    /// All shifts of the planning horizon, with absolute times
    pub shifts: Vec<ShiftRecord>,
}

/// A person that can be scheduled onto shifts.
///
/// Times are absolute seconds since the Unix epoch (UTC); time-of-day
/// preferences use seconds since midnight UTC.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PersonRecord {
    /// Unique identifier (must be unique across all people)
    pub id: String,
    /// Display label for output; falls back to the id when absent
    #[serde(default)]
    pub label: Option<String>,
    /// Minimum and maximum number of shifts over the planning horizon
    pub shift_count: (u32, u32),
    /// Gender class as a small integer, if known
    #[serde(default)]
    pub gender: Option<i32>,
    /// Experience level as a small integer, if known
    #[serde(default)]
    pub experience: Option<i32>,
    /// Allowed shift types with per-type limits. An empty map makes the
    /// person a joker: any type is allowed and no type preference cost
    /// applies.
    #[serde(default)]
    pub shift_types: HashMap<u32, TypeLimits>,
    /// Periods during which the person must not be scheduled (hard)
    #[serde(default)]
    pub unavailable: Vec<TimeWindow>,
    /// Periods the person must cover with at least one shift each (soft,
    /// penalized via `CostWeights::mandatory_factor`)
    #[serde(default)]
    pub mandatory: Vec<TimeWindow>,
    /// Periods the person would rather not work (soft, off-day cost)
    #[serde(default)]
    pub days_off: Vec<TimeWindow>,
    /// Minimum rest between two of this person's shifts, in seconds
    #[serde(default)]
    pub min_rest_seconds: i64,
    /// Partner preferences: `relation = -1` marks a preferred partner
    /// (friend), `relation = +1` marks a person to avoid (enemy)
    #[serde(default)]
    pub partners: Vec<PartnerPreference>,
    /// Per-time-of-day shift preference costs
    #[serde(default)]
    pub time_preferences: Vec<TimePreference>,
}

/// Per-type assignment limits for one shift type of one person.
///
/// The pair `(min, max)` bounds how many shifts of this type the person
/// should take; `max == 0` leaves the upper bound open. The special
/// combination `(0, 0)` means "preferred but not required": taking none of
/// this type is penalized twice, but any count is allowed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLimits {
    /// Whether the person counts as experienced for this type
    #[serde(default)]
    pub experienced: bool,
    /// Minimum number of shifts of this type the person should work
    pub min: u32,
    /// Maximum number of shifts of this type (0 = unbounded)
    pub max: u32,
}

/// An absolute time range in epoch seconds. Either bound may be omitted;
/// a missing start defaults to the epoch and a missing end to far future.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl TimeWindow {
    /// Resolves optional bounds to a concrete `(start, end)` pair.
    pub fn resolve(&self) -> (i64, i64) {
        (self.start.unwrap_or(0), self.end.unwrap_or(FAR_FUTURE))
    }
}

/// A directed partner preference of one person about another.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PartnerPreference {
    /// The other person's id
    pub id: String,
    /// `-1` = prefer to work together (friend), `+1` = avoid (enemy)
    pub relation: i8,
}

/// A time-of-day window with an associated preference cost.
///
/// Windows use seconds since midnight UTC. A window whose start is greater
/// than its end denotes an overnight range, e.g. `82800..25200` covers
/// 23:00 to 07:00.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct TimePreference {
    pub window: DayWindow,
    /// Cost contributed when an assigned shift falls into the window.
    /// Lower is better; the ranking cost squares this value.
    pub cost: i64,
}

/// A wrap-around-safe time-of-day range in seconds since midnight UTC.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start_sec: u32,
    pub end_sec: u32,
}

/// A shift to be filled.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ShiftRecord {
    /// Unique identifier (must be unique across all shifts)
    pub id: String,
    /// Start of the shift, seconds since the Unix epoch (UTC)
    pub start: i64,
    /// End of the shift, exclusive
    pub end: i64,
    /// Minimum and maximum headcount; `max == 0` means unbounded
    pub capacity: (u32, u32),
    /// Shift type identifier, matched against `PersonRecord::shift_types`
    pub shift_type: u32,
    /// When set, only people whose allowed-type map contains this shift's
    /// type may be assigned
    #[serde(default)]
    pub restricted: bool,
    /// Staffing priority; under-filled shifts are penalized by priority²
    #[serde(default)]
    pub priority: u32,
    /// Base desirability cost fed into the ranking component
    #[serde(default)]
    pub base_cost: i64,
}

/// Weights of the soft-constraint cost model.
///
/// All components are combined into a single scalar objective; the weights
/// control their relative influence. The struct is passed around as one
/// immutable value, there is no process-wide configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct CostWeights {
    /// Penalty per unmet friend co-occurrence opportunity
    pub friend_factor: f64,
    /// Penalty per enemy co-occurrence
    pub enemy_factor: f64,
    /// Penalty per assigned shift overlapping a day-off window
    pub off_day_factor: f64,
    /// Penalty per violated per-type minimum/maximum
    pub shift_type_factor: f64,
    /// Scale of the multiple-night-shift surcharge
    pub night_shift_factor: f64,
    /// Scale of the gender distribution spread penalty
    pub gender_factor: f64,
    /// Scale of the per-shift ranking cost
    pub ranking_factor: f64,
    /// Penalty per uncovered mandatory interval
    pub mandatory_factor: f64,
    /// Exponent applied to the per-person workload deviation. The source
    /// history used several calibrations, so it stays configurable.
    pub balance_exponent: f64,
    /// Weight of a friend working the same shift
    pub same_shift_friend: f64,
    /// Weight of a friend working a different shift with the same start
    pub same_time_friend: f64,
    /// Weight of an enemy working the same shift
    pub same_shift_enemy: f64,
    /// Weight of an enemy working a different shift with the same start
    pub same_time_enemy: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        CostWeights {
            friend_factor: 100.0,
            enemy_factor: 5000.0,
            off_day_factor: 200.0,
            shift_type_factor: 50.0,
            night_shift_factor: 100.0,
            gender_factor: 10.0,
            ranking_factor: 1.0,
            mandatory_factor: 500.0,
            balance_exponent: 2.0,
            same_shift_friend: 1.0,
            same_time_friend: 0.5,
            same_shift_enemy: 1.0,
            same_time_enemy: 0.5,
        }
    }
}

/// Configuration of the annealing search and the restart coordinator.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Number of independent restarts run in parallel (1 to 16 is typical)
    pub workers: usize,
    /// Base RNG seed. Worker `i` derives its stream from `seed + i`, so a
    /// fixed seed with a single worker reproduces the exact same roster.
    /// When absent, seeds are taken from OS entropy.
    pub seed: Option<u64>,
    /// Starting temperature of the annealing schedule
    pub initial_temperature: f64,
    /// Geometric cooling rate, strictly between 0 and 1
    pub cooling_rate: f64,
    /// Stop after this many consecutive rejected neighbors
    pub no_improvement_limit: u64,
    /// Optional wall-clock limit per worker, in seconds
    pub time_limit_seconds: Option<u64>,
    /// Logging and progress preferences
    pub logging: LoggingOptions,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        SolverConfiguration {
            workers: 4,
            seed: None,
            initial_temperature: 1000.0,
            cooling_rate: 0.9999,
            no_improvement_limit: 1000,
            time_limit_seconds: None,
            logging: LoggingOptions::default(),
        }
    }
}

/// Options controlling diagnostic output during and after the search.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Emit a progress update every N iterations. `None` uses the default
    /// cadence of 333 iterations.
    #[serde(default)]
    pub log_frequency: Option<u64>,
    /// Log the initial roster and its cost breakdown
    #[serde(default)]
    pub log_initial_state: bool,
    /// Log total runtime and final cost when a worker finishes
    #[serde(default)]
    pub log_duration_and_cost: bool,
    /// Include the formatted roster in the final log output
    #[serde(default)]
    pub display_final_schedule: bool,
    /// Log the per-person cost breakdown of the final roster
    #[serde(default)]
    pub log_final_cost_breakdown: bool,
}

/// Progress snapshot emitted by the annealing driver.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProgressUpdate {
    /// Current iteration (0-based)
    pub iteration: u64,
    /// Estimated total iterations from the cooling schedule
    pub estimated_iterations: u64,
    /// Current temperature
    pub temperature: f64,
    /// Cost of the current roster
    pub current_cost: f64,
    /// Cost of the best roster seen so far
    pub best_cost: f64,
    /// Cost of the initial roster
    pub initial_cost: f64,
    /// Accepted neighbor count
    pub accepted_moves: u64,
    /// Rejected neighbor count
    pub rejected_moves: u64,
    /// Consecutive iterations without an accepted move
    pub no_improvement_count: u64,
    /// Seconds elapsed since the worker started
    pub elapsed_seconds: f64,
}

/// Callback invoked by the driver at a rate-limited cadence. Returning
/// `false` cancels the search; the best-seen roster is still returned.
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) -> bool + Send + Sync>;

/// Per-person decomposition of the individual cost components.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct PersonCostBreakdown {
    /// Friend shortfall and enemy co-occurrence cost
    pub preference: f64,
    /// Day-off overlap cost
    pub off_day: f64,
    /// Time-frame ranking cost including the night-shift surcharge
    pub ranking: f64,
    /// Per-type minimum/maximum violation cost
    pub shift_type: f64,
    /// Uncovered mandatory interval cost
    pub mandatory: f64,
    /// Sum of the components above
    pub total: f64,
}

/// Global cost components and the aggregate objective.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct CostSummary {
    /// Sum of all per-person totals
    pub individual_total: f64,
    /// Under-staffed shift priority penalty
    pub priority: f64,
    /// Gender distribution spread penalty
    pub gender: f64,
    /// Workload balance penalty
    pub balance: f64,
    /// The objective value minimized by the solver
    pub total: f64,
}

/// A row of the external `shift_assignment` table.
///
/// The core only produces these rows; writing them (and deleting previous
/// `auto_created` rows first, which keeps the writer idempotent) belongs to
/// the persistence collaborator.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AssignmentRow {
    pub shift_id: String,
    pub person_id: String,
    pub auto_created: bool,
    pub active: bool,
}

/// A row of the external `shift_assignment_event` table.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AssignmentEventRow {
    /// Index of the matching entry in the exported assignment rows
    pub assignment_id: u64,
    /// Event timestamp, epoch seconds
    pub created_at: i64,
    /// Event state, always `"ASSIGNED"` for solver output
    pub state: String,
}

/// The result returned by the solver: the roster, its cost decomposition,
/// and search statistics.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SolverResult {
    /// Final objective value of the returned roster
    pub final_cost: f64,
    /// Objective value of the initial constructed roster
    pub initial_cost: f64,
    /// The roster: shift id to the people working it
    pub assignments: HashMap<String, Vec<String>>,
    /// Inverse view: person id to their shifts, ordered by start time
    pub person_shifts: HashMap<String, Vec<String>>,
    /// Per-person cost decomposition
    pub person_costs: HashMap<String, PersonCostBreakdown>,
    /// Global cost components
    pub cost: CostSummary,
    /// Iterations the winning worker ran
    pub iterations: u64,
    /// Consecutive rejections at termination
    pub no_improvement_count: u64,
}

impl SolverResult {
    /// Formats the roster as a human-readable string, shifts sorted by id.
    pub fn display(&self) -> String {
        let mut output = String::new();
        let mut shift_ids: Vec<_> = self.assignments.keys().collect();
        shift_ids.sort();

        for shift_id in shift_ids {
            let mut names = self.assignments[shift_id].clone();
            names.sort();
            output.push_str(&format!("{}: {}\n", shift_id, names.join(", ")));
        }
        output
    }

    /// Converts the roster into persistence rows for the external writer.
    ///
    /// Every row carries `auto_created = true` so a later run can delete
    /// and replace earlier solver output without touching manual entries.
    pub fn to_rows(&self, created_at: i64) -> (Vec<AssignmentRow>, Vec<AssignmentEventRow>) {
        let mut rows = Vec::new();
        let mut events = Vec::new();

        let mut shift_ids: Vec<_> = self.assignments.keys().collect();
        shift_ids.sort();
        for shift_id in shift_ids {
            let mut people = self.assignments[shift_id].clone();
            people.sort();
            for person_id in people {
                let assignment_id = rows.len() as u64;
                rows.push(AssignmentRow {
                    shift_id: shift_id.clone(),
                    person_id,
                    auto_created: true,
                    active: true,
                });
                events.push(AssignmentEventRow {
                    assignment_id,
                    created_at,
                    state: "ASSIGNED".to_string(),
                });
            }
        }
        (rows, events)
    }
}
