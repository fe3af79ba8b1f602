//! Core solver state management.
//!
//! This module contains the `State` struct which represents the internal
//! solver state with integer-based representations for fast operations
//! during search. String ids from the API input are converted to indices
//! once, at construction; everything on the hot path works on `usize`.

pub mod builder;
pub mod constraints;
mod construction;
pub mod display;
pub mod moves;
pub mod scoring;
pub mod validation;


use crate::models::{CostWeights, DayWindow, LoggingOptions, SolverResult};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during solver operation.
///
/// A rejected tentative placement is not an error: inside the builder and
/// the neighbor generator it is the normal feedback signal, handled by
/// rollback and retry. Only conditions that end a run surface here.
#[derive(Error, Debug, Clone, Serialize)]
pub enum SolverError {
    /// Total or per-type supply/demand mismatch, detected before search.
    #[error("capacity error: {0}")]
    Capacity(String),
    /// A referenced id is missing from the problem definition.
    #[error("not found: {0}")]
    NotFound(String),
    /// The builder exhausted all resets without a feasible roster.
    #[error("schedule creation failed: {0}")]
    ScheduleCreation(String),
    /// The problem definition itself is invalid.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Every worker failed; carries a summary of the worker errors.
    #[error("no solution found: {0}")]
    NoSolution(String),
}

/// Resolved per-person data, immutable during search.
#[derive(Debug, Clone)]
pub struct PersonCtx {
    /// Display label (the record's label, or its id)
    pub label: String,
    /// Minimum shifts over the horizon, enforced at end of construction
    pub min_shifts: u32,
    /// Maximum shifts over the horizon, enforced at all times
    pub max_shifts: u32,
    /// Allowed shift types: type index to `(min, max)` counts, `max == 0`
    /// unbounded. Empty for jokers.
    pub allowed: HashMap<usize, (u32, u32)>,
    /// True when the allowed-type map is empty: any type, no type cost
    pub joker: bool,
    /// Minimum rest between two shifts, seconds
    pub min_rest: i64,
    pub gender: Option<i32>,
    pub experience: Option<i32>,
    /// Hard unavailability windows, resolved to concrete bounds
    pub unavailable: Vec<(i64, i64)>,
    /// Intervals that should each be covered by at least one shift
    pub mandatory: Vec<(i64, i64)>,
    /// Soft day-off windows, penalized per overlapping shift
    pub days_off: Vec<(i64, i64)>,
    /// Time-of-day preference windows with their costs
    pub time_prefs: Vec<(DayWindow, i64)>,
    /// Indices of preferred partners
    pub friends: Vec<usize>,
    /// Indices of people to avoid
    pub enemies: Vec<usize>,
}

/// Resolved per-shift data, immutable during search.
#[derive(Debug, Clone)]
pub struct ShiftCtx {
    pub start: i64,
    pub end: i64,
    pub min_cap: u32,
    /// Maximum headcount, 0 = unbounded
    pub max_cap: u32,
    /// Interned shift type index
    pub type_idx: usize,
    pub restricted: bool,
    pub priority: u32,
    pub base_cost: i64,
}

impl ShiftCtx {
    /// True while another person fits under the capacity limit.
    #[inline]
    pub fn has_room(&self, current: usize) -> bool {
        self.max_cap == 0 || current < self.max_cap as usize
    }
}

/// The internal state of the solver: the immutable domain model plus the
/// mutable working roster.
///
/// The roster is kept in two mutually consistent views: `schedule` maps a
/// shift to its people and `assigned` maps a person to their shifts. Every
/// mutation goes through [`State::add_assignment`] and
/// [`State::remove_assignment`] so the views cannot drift apart.
#[derive(Debug, Clone)]
pub struct State {
    // === ID MAPPINGS ===
    pub person_id_to_idx: HashMap<String, usize>,
    pub person_idx_to_id: Vec<String>,
    pub shift_id_to_idx: HashMap<String, usize>,
    pub shift_idx_to_id: Vec<String>,
    /// External shift-type id to interned index
    pub type_id_to_idx: HashMap<u32, usize>,
    pub type_idx_to_id: Vec<u32>,

    // === DOMAIN MODEL (immutable during search) ===
    pub people: Vec<PersonCtx>,
    pub shifts: Vec<ShiftCtx>,
    /// Signed preference matrix: negative = friend, positive = enemy
    pub preference: Vec<Vec<i8>>,

    // === WORKING ROSTER ===
    /// shift index -> people working it
    pub schedule: Vec<Vec<usize>>,
    /// person index -> shifts they work
    pub assigned: Vec<Vec<usize>>,

    // === CONFIGURATION ===
    pub weights: CostWeights,
    pub logging: LoggingOptions,
}

impl State {
    /// Adds `person_idx` to `shift_idx`, updating both roster views.
    #[inline]
    pub(crate) fn add_assignment(&mut self, shift_idx: usize, person_idx: usize) {
        self.schedule[shift_idx].push(person_idx);
        self.assigned[person_idx].push(shift_idx);
    }

    /// Removes `person_idx` from `shift_idx`. A no-op when the pair is not
    /// assigned, so rollback paths can call it unconditionally.
    #[inline]
    pub(crate) fn remove_assignment(&mut self, shift_idx: usize, person_idx: usize) {
        if let Some(pos) = self.schedule[shift_idx]
            .iter()
            .position(|&p| p == person_idx)
        {
            self.schedule[shift_idx].swap_remove(pos);
        }
        if let Some(pos) = self.assigned[person_idx]
            .iter()
            .position(|&s| s == shift_idx)
        {
            self.assigned[person_idx].swap_remove(pos);
        }
    }

    /// Clears the whole roster, keeping the domain model.
    pub(crate) fn clear_assignments(&mut self) {
        for members in &mut self.schedule {
            members.clear();
        }
        for shifts in &mut self.assigned {
            shifts.clear();
        }
    }

    /// Number of shifts of the given type currently assigned to a person.
    pub fn type_count(&self, person_idx: usize, type_idx: usize) -> u32 {
        self.assigned[person_idx]
            .iter()
            .filter(|&&s| self.shifts[s].type_idx == type_idx)
            .count() as u32
    }

    /// The person's assigned shifts sorted by start time.
    pub fn assigned_sorted_by_start(&self, person_idx: usize) -> Vec<usize> {
        let mut shifts = self.assigned[person_idx].clone();
        shifts.sort_by_key(|&s| (self.shifts[s].start, self.shifts[s].end));
        shifts
    }

    /// Takes a snapshot of the working roster for later restore.
    pub fn snapshot(&self) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        (self.schedule.clone(), self.assigned.clone())
    }

    /// Restores a roster snapshot taken with [`State::snapshot`].
    pub fn restore(&mut self, snapshot: (Vec<Vec<usize>>, Vec<Vec<usize>>)) {
        self.schedule = snapshot.0;
        self.assigned = snapshot.1;
    }

    /// Converts the current roster into the public result format.
    pub fn to_solver_result(
        &self,
        initial_cost: f64,
        iterations: u64,
        no_improvement_count: u64,
    ) -> SolverResult {
        let breakdown = self.evaluate_cost();

        let mut assignments = HashMap::new();
        for (shift_idx, members) in self.schedule.iter().enumerate() {
            let ids: Vec<String> = members
                .iter()
                .map(|&p| self.person_idx_to_id[p].clone())
                .collect();
            assignments.insert(self.shift_idx_to_id[shift_idx].clone(), ids);
        }

        let mut person_shifts = HashMap::new();
        let mut person_costs = HashMap::new();
        for person_idx in 0..self.people.len() {
            let shifts: Vec<String> = self
                .assigned_sorted_by_start(person_idx)
                .iter()
                .map(|&s| self.shift_idx_to_id[s].clone())
                .collect();
            let id = self.person_idx_to_id[person_idx].clone();
            person_shifts.insert(id.clone(), shifts);
            person_costs.insert(id, breakdown.per_person[person_idx]);
        }

        SolverResult {
            final_cost: breakdown.summary.total,
            initial_cost,
            assignments,
            person_shifts,
            person_costs,
            cost: breakdown.summary,
            iterations,
            no_improvement_count,
        }
    }
}
