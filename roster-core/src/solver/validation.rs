//! Roster validation.
//!
//! A post-hoc audit of every hard constraint over the whole roster, used by
//! tests and by debug logging. The per-move predicates in `constraints` are
//! the hot path; this module re-derives the same conditions independently
//! so drift between the two would surface as a test failure.

use super::State;

impl State {
    /// Checks every hard constraint and returns a human-readable violation
    /// list. An empty list means the roster is feasible.
    pub fn validate_roster(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (shift_idx, members) in self.schedule.iter().enumerate() {
            let shift = &self.shifts[shift_idx];
            let shift_id = &self.shift_idx_to_id[shift_idx];

            if shift.max_cap != 0 && members.len() > shift.max_cap as usize {
                violations.push(format!(
                    "shift '{}' holds {} people, capacity is {}",
                    shift_id,
                    members.len(),
                    shift.max_cap
                ));
            }

            let mut seen = std::collections::HashSet::new();
            for &p in members {
                if !seen.insert(p) {
                    violations.push(format!(
                        "shift '{}' lists '{}' more than once",
                        shift_id, self.person_idx_to_id[p]
                    ));
                }
            }

            if shift.restricted {
                for &p in members {
                    if !self.people[p].allowed.contains_key(&shift.type_idx) {
                        violations.push(format!(
                            "restricted shift '{}' holds unpermitted person '{}'",
                            shift_id, self.person_idx_to_id[p]
                        ));
                    }
                }
            }

            for (i, &p1) in members.iter().enumerate() {
                for &p2 in &members[i + 1..] {
                    if self.preference[p1][p2] > 0 {
                        violations.push(format!(
                            "shift '{}' pairs enemies '{}' and '{}'",
                            shift_id, self.person_idx_to_id[p1], self.person_idx_to_id[p2]
                        ));
                    }
                }
            }
        }

        for (person_idx, person) in self.people.iter().enumerate() {
            let person_id = &self.person_idx_to_id[person_idx];
            let count = self.assigned[person_idx].len() as u32;

            if count > person.max_shifts {
                violations.push(format!(
                    "'{}' holds {} shifts, maximum is {}",
                    person_id, count, person.max_shifts
                ));
            }

            let sorted = self.assigned_sorted_by_start(person_idx);
            for pair in sorted.windows(2) {
                let gap = self.shifts[pair[1]].start - self.shifts[pair[0]].end;
                if gap < person.min_rest {
                    violations.push(format!(
                        "'{}' has only {}s between '{}' and '{}', needs {}s",
                        person_id,
                        gap,
                        self.shift_idx_to_id[pair[0]],
                        self.shift_idx_to_id[pair[1]],
                        person.min_rest
                    ));
                }
            }

            for &shift_idx in &self.assigned[person_idx] {
                if !self.availability_ok(shift_idx, person_idx) {
                    violations.push(format!(
                        "'{}' is assigned to '{}' during an unavailable period",
                        person_id, self.shift_idx_to_id[shift_idx]
                    ));
                }
            }

            for (&type_idx, &(_, max)) in &person.allowed {
                let type_count = self.type_count(person_idx, type_idx);
                if max != 0 && type_count > max {
                    violations.push(format!(
                        "'{}' works {} shifts of type {}, maximum is {}",
                        person_id, type_count, self.type_idx_to_id[type_idx], max
                    ));
                }
            }
        }

        violations
    }

    /// Lists every person with uncovered mandatory intervals. Mandatory
    /// coverage is a soft concern, so this reports instead of failing.
    pub fn mandatory_report(&self) -> Vec<String> {
        (0..self.people.len())
            .filter_map(|person_idx| {
                let uncovered = self.uncovered_mandatory(person_idx);
                (uncovered > 0).then(|| {
                    format!(
                        "'{}' has {} uncovered mandatory interval(s)",
                        self.person_idx_to_id[person_idx], uncovered
                    )
                })
            })
            .collect()
    }
}
