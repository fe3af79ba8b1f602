//! Shared test utilities for roster-core integration tests.
//!
//! This module provides common helper functions for creating test inputs
//! and verifying solver results across different test files.

use roster_core::models::{
    ApiInput, CostWeights, LoggingOptions, PartnerPreference, PersonRecord, ProblemDefinition,
    ShiftRecord, SolverConfiguration, SolverResult, TimeWindow,
};
use std::collections::HashMap;

#[allow(dead_code)]
pub fn hour(h: i64) -> i64 {
    h * 3600
}

/// A person with no preferences, windows or type limits.
#[allow(dead_code)]
pub fn person(id: &str, min: u32, max: u32) -> PersonRecord {
    PersonRecord {
        id: id.to_string(),
        label: None,
        shift_count: (min, max),
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

/// An 8-hour day shift starting at 09:00 of the given day.
#[allow(dead_code)]
pub fn day_shift(id: &str, day: i64, min: u32, max: u32) -> ShiftRecord {
    ShiftRecord {
        id: id.to_string(),
        start: hour(day * 24 + 9),
        end: hour(day * 24 + 17),
        capacity: (min, max),
        shift_type: 0,
        restricted: false,
        priority: 0,
        base_cost: 0,
    }
}

/// The deterministic end-to-end configuration used by the scenarios:
/// seed 42, T0 = 1000, alpha = 0.999, K = 1000, one worker.
#[allow(dead_code)]
pub fn scenario_config() -> SolverConfiguration {
    SolverConfiguration {
        workers: 1,
        seed: Some(42),
        initial_temperature: 1000.0,
        cooling_rate: 0.999,
        no_improvement_limit: 1000,
        time_limit_seconds: None,
        logging: LoggingOptions::default(),
    }
}

#[allow(dead_code)]
pub fn make_input(people: Vec<PersonRecord>, shifts: Vec<ShiftRecord>) -> ApiInput {
    ApiInput {
        problem: ProblemDefinition { people, shifts },
        weights: CostWeights::default(),
        solver: scenario_config(),
    }
}

/// Marks two people as mutual preferred partners.
#[allow(dead_code)]
pub fn befriend(a: &mut PersonRecord, b_id: &str) {
    a.partners.push(PartnerPreference {
        id: b_id.to_string(),
        relation: -1,
    });
}

/// Marks a person as avoiding another.
#[allow(dead_code)]
pub fn antagonize(a: &mut PersonRecord, b_id: &str) {
    a.partners.push(PartnerPreference {
        id: b_id.to_string(),
        relation: 1,
    });
}

#[allow(dead_code)]
pub fn window(start: i64, end: i64) -> TimeWindow {
    TimeWindow {
        start: Some(start),
        end: Some(end),
    }
}

/// Asserts the hard invariants every returned roster must satisfy.
#[allow(dead_code)]
pub fn assert_feasible(result: &SolverResult, input: &ApiInput) {
    let shift_by_id: HashMap<_, _> = input.problem.shifts.iter().map(|s| (&s.id, s)).collect();
    let person_by_id: HashMap<_, _> = input.problem.people.iter().map(|p| (&p.id, p)).collect();

    // capacity
    for (shift_id, people) in &result.assignments {
        let shift = shift_by_id[shift_id];
        if shift.capacity.1 != 0 {
            assert!(
                people.len() <= shift.capacity.1 as usize,
                "shift {} over capacity: {} > {}",
                shift_id,
                people.len(),
                shift.capacity.1
            );
        }
    }

    for (person_id, shifts) in &result.person_shifts {
        let person = person_by_id[person_id];

        // personal bounds
        assert!(
            shifts.len() <= person.shift_count.1 as usize,
            "{} over their maximum",
            person_id
        );

        // rest: sorted by start, gap start[i] - end[i-1] >= min_rest
        let mut intervals: Vec<(i64, i64)> = shifts
            .iter()
            .map(|s| (shift_by_id[s].start, shift_by_id[s].end))
            .collect();
        intervals.sort();
        for pair in intervals.windows(2) {
            assert!(
                pair[1].0 - pair[0].1 >= person.min_rest_seconds,
                "{} rest violation",
                person_id
            );
        }

        // unavailability
        for shift_id in shifts {
            let shift = shift_by_id[shift_id];
            for unavailable in &person.unavailable {
                let (u_start, u_end) = unavailable.resolve();
                assert!(
                    shift.end <= u_start || shift.start >= u_end,
                    "{} assigned to {} while unavailable",
                    person_id,
                    shift_id
                );
            }
        }

        // restricted shifts
        for shift_id in shifts {
            let shift = shift_by_id[shift_id];
            if shift.restricted {
                assert!(
                    person.shift_types.contains_key(&shift.shift_type),
                    "{} not permitted on restricted {}",
                    person_id,
                    shift_id
                );
            }
        }
    }

    // enemies never co-occur
    for person in &input.problem.people {
        for partner in &person.partners {
            if partner.relation > 0 {
                for people in result.assignments.values() {
                    assert!(
                        !(people.contains(&person.id) && people.contains(&partner.id)),
                        "enemies {} and {} share a shift",
                        person.id,
                        partner.id
                    );
                }
            }
        }
    }
}
