//! State construction and input preprocessing.
//!
//! This module contains the `State::new` constructor that converts the
//! string-keyed API input into the integer-indexed internal solver state.

use super::{PersonCtx, ShiftCtx, SolverError, State};
use crate::models::ApiInput;
use std::collections::HashMap;

impl State {
    /// Creates a new solver state from the API input.
    ///
    /// This performs all one-time preprocessing:
    /// 1. **Validation**: unique ids, sane capacities and time ranges
    /// 2. **Interning**: people, shifts and shift types become indices
    /// 3. **Preference matrix**: partner lists become a signed matrix plus
    ///    friend/enemy adjacency lists
    /// 4. **Window resolution**: open-ended time windows get concrete bounds
    ///
    /// The returned state has an empty roster; the builder fills it.
    ///
    /// # Errors
    ///
    /// * `Validation` for duplicate ids, inverted capacity pairs or time
    ///   ranges
    /// * `NotFound` when a partner preference references an unknown person
    pub fn new(input: &ApiInput) -> Result<Self, SolverError> {
        let people_count = input.problem.people.len();
        let shift_count = input.problem.shifts.len();

        if people_count == 0 || shift_count == 0 {
            return Err(SolverError::Validation(
                "problem needs at least one person and one shift".to_string(),
            ));
        }

        // --- ID mappings ---
        let mut person_id_to_idx = HashMap::with_capacity(people_count);
        for (idx, p) in input.problem.people.iter().enumerate() {
            if person_id_to_idx.insert(p.id.clone(), idx).is_some() {
                return Err(SolverError::Validation(format!(
                    "duplicate person id '{}'",
                    p.id
                )));
            }
        }
        let person_idx_to_id: Vec<String> =
            input.problem.people.iter().map(|p| p.id.clone()).collect();

        let mut shift_id_to_idx = HashMap::with_capacity(shift_count);
        for (idx, s) in input.problem.shifts.iter().enumerate() {
            if shift_id_to_idx.insert(s.id.clone(), idx).is_some() {
                return Err(SolverError::Validation(format!(
                    "duplicate shift id '{}'",
                    s.id
                )));
            }
        }
        let shift_idx_to_id: Vec<String> =
            input.problem.shifts.iter().map(|s| s.id.clone()).collect();

        // --- Shift type interning ---
        // Types come from both the shifts and the per-person allowed maps so
        // a person's requirement for a type with no shift still surfaces in
        // the capacity pre-check instead of silently vanishing.
        let mut type_id_to_idx: HashMap<u32, usize> = HashMap::new();
        let mut type_idx_to_id: Vec<u32> = Vec::new();
        let shift_types = input.problem.shifts.iter().map(|s| s.shift_type);
        let person_types = input
            .problem
            .people
            .iter()
            .flat_map(|p| p.shift_types.keys().copied());
        for type_id in shift_types.chain(person_types) {
            type_id_to_idx.entry(type_id).or_insert_with(|| {
                type_idx_to_id.push(type_id);
                type_idx_to_id.len() - 1
            });
        }

        // --- Shifts ---
        let mut shifts = Vec::with_capacity(shift_count);
        for record in &input.problem.shifts {
            if record.start >= record.end {
                return Err(SolverError::Validation(format!(
                    "shift '{}' has start {} >= end {}",
                    record.id, record.start, record.end
                )));
            }
            let (min_cap, max_cap) = record.capacity;
            if max_cap != 0 && min_cap > max_cap {
                return Err(SolverError::Validation(format!(
                    "shift '{}' has min capacity {} above max {}",
                    record.id, min_cap, max_cap
                )));
            }
            shifts.push(ShiftCtx {
                start: record.start,
                end: record.end,
                min_cap,
                max_cap,
                type_idx: type_id_to_idx[&record.shift_type],
                restricted: record.restricted,
                priority: record.priority,
                base_cost: record.base_cost,
            });
        }

        // --- People ---
        let mut people = Vec::with_capacity(people_count);
        for record in &input.problem.people {
            let (min_shifts, max_shifts) = record.shift_count;
            if min_shifts > max_shifts {
                return Err(SolverError::Validation(format!(
                    "person '{}' has min shift count {} above max {}",
                    record.id, min_shifts, max_shifts
                )));
            }
            let allowed: HashMap<usize, (u32, u32)> = record
                .shift_types
                .iter()
                .map(|(type_id, limits)| (type_id_to_idx[type_id], (limits.min, limits.max)))
                .collect();

            people.push(PersonCtx {
                label: record.label.clone().unwrap_or_else(|| record.id.clone()),
                min_shifts,
                max_shifts,
                joker: allowed.is_empty(),
                allowed,
                min_rest: record.min_rest_seconds,
                gender: record.gender,
                experience: record.experience,
                unavailable: record.unavailable.iter().map(|w| w.resolve()).collect(),
                mandatory: record.mandatory.iter().map(|w| w.resolve()).collect(),
                days_off: record.days_off.iter().map(|w| w.resolve()).collect(),
                time_prefs: record
                    .time_preferences
                    .iter()
                    .map(|p| (p.window, p.cost))
                    .collect(),
                friends: Vec::new(),
                enemies: Vec::new(),
            });
        }

        // --- Preference matrix ---
        // Symmetric, like the contact bookkeeping it feeds: listing someone
        // as a partner preference applies in both directions. A positive
        // (avoid) entry wins over a conflicting negative one.
        let mut preference = vec![vec![0i8; people_count]; people_count];
        for (person_idx, record) in input.problem.people.iter().enumerate() {
            for partner in &record.partners {
                let other_idx = *person_id_to_idx.get(&partner.id).ok_or_else(|| {
                    SolverError::NotFound(format!(
                        "person '{}' lists unknown partner '{}'",
                        record.id, partner.id
                    ))
                })?;
                if other_idx == person_idx {
                    return Err(SolverError::Validation(format!(
                        "person '{}' lists themselves as a partner",
                        record.id
                    )));
                }
                let value = partner.relation.signum();
                if value == 0 {
                    continue;
                }
                for (a, b) in [(person_idx, other_idx), (other_idx, person_idx)] {
                    if preference[a][b] <= 0 || value > 0 {
                        preference[a][b] = value;
                    }
                }
            }
        }
        for (person_idx, person) in people.iter_mut().enumerate() {
            for other_idx in 0..people_count {
                match preference[person_idx][other_idx].signum() {
                    -1 => person.friends.push(other_idx),
                    1 => person.enemies.push(other_idx),
                    _ => {}
                }
            }
        }

        Ok(State {
            person_id_to_idx,
            person_idx_to_id,
            shift_id_to_idx,
            shift_idx_to_id,
            type_id_to_idx,
            type_idx_to_id,
            people,
            shifts,
            preference,
            schedule: vec![Vec::new(); shift_count],
            assigned: vec![Vec::new(); people_count],
            weights: input.weights,
            logging: input.solver.logging.clone(),
        })
    }
}
