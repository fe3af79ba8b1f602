//! Hard-constraint predicates.
//!
//! All checks are pure functions of the current state so the builder and
//! the neighbor generator can speculate: tentatively add, test, roll back.
//! The canonical entry point [`State::is_valid_assignment`] assumes the
//! person has just been added to the shift under test.

use super::State;

impl State {
    /// Validates a tentative placement of `person_idx` on `shift_idx`.
    ///
    /// The person must already be present in `schedule[shift_idx]`; the
    /// check covers shift capacity, the person's per-type maximum, the
    /// restrict flag, minimum rest, unavailability overlap and enemy
    /// co-occurrence.
    pub fn is_valid_assignment(&self, shift_idx: usize, person_idx: usize) -> bool {
        self.capacity_ok(shift_idx)
            && self.type_count_ok(shift_idx, person_idx)
            && self.restriction_ok(shift_idx, person_idx)
            && self.rest_ok(person_idx)
            && self.availability_ok(shift_idx, person_idx)
            && self.no_enemy_in_shift(shift_idx, person_idx)
    }

    /// Shift headcount does not exceed the maximum (0 = unbounded).
    pub fn capacity_ok(&self, shift_idx: usize) -> bool {
        let max_cap = self.shifts[shift_idx].max_cap;
        max_cap == 0 || self.schedule[shift_idx].len() <= max_cap as usize
    }

    /// The person's count of this shift's type stays within their per-type
    /// maximum. Types missing from the allowed map are unbounded, matching
    /// the `(_, 0)` convention.
    pub fn type_count_ok(&self, shift_idx: usize, person_idx: usize) -> bool {
        let type_idx = self.shifts[shift_idx].type_idx;
        let max_allowed = self.people[person_idx]
            .allowed
            .get(&type_idx)
            .map_or(0, |&(_, max)| max);
        max_allowed == 0 || self.type_count(person_idx, type_idx) <= max_allowed
    }

    /// A restricted shift only admits people whose allowed-type map names
    /// its type. Jokers carry an empty map, so they are excluded here.
    pub fn restriction_ok(&self, shift_idx: usize, person_idx: usize) -> bool {
        let shift = &self.shifts[shift_idx];
        !shift.restricted || self.people[person_idx].allowed.contains_key(&shift.type_idx)
    }

    /// All of the person's shifts are pairwise separated by their minimum
    /// rest: sorted by start, each gap `start[i] - end[i-1]` must reach
    /// `min_rest`. Overlapping shifts produce a negative gap and fail too.
    pub fn rest_ok(&self, person_idx: usize) -> bool {
        let min_rest = self.people[person_idx].min_rest;
        let shifts = self.assigned_sorted_by_start(person_idx);
        shifts.windows(2).all(|pair| {
            self.shifts[pair[1]].start - self.shifts[pair[0]].end >= min_rest
        })
    }

    /// The shift does not overlap any unavailability window of the person.
    pub fn availability_ok(&self, shift_idx: usize, person_idx: usize) -> bool {
        let shift = &self.shifts[shift_idx];
        self.people[person_idx]
            .unavailable
            .iter()
            .all(|&(start, end)| shift.end <= start || shift.start >= end)
    }

    /// Nobody the person wants to avoid works the same shift.
    pub fn no_enemy_in_shift(&self, shift_idx: usize, person_idx: usize) -> bool {
        self.schedule[shift_idx]
            .iter()
            .all(|&other| other == person_idx || self.preference[person_idx][other] <= 0)
    }

    /// Number of the person's mandatory intervals not yet covered by any
    /// assigned shift. An interval counts as covered once at least one
    /// shift lies fully inside it. Checked at the end of construction and
    /// at cost time; covering may require several shifts, so it is not part
    /// of the per-placement predicate.
    pub fn uncovered_mandatory(&self, person_idx: usize) -> usize {
        self.people[person_idx]
            .mandatory
            .iter()
            .filter(|&&(m_start, m_end)| {
                !self.assigned[person_idx].iter().any(|&s| {
                    self.shifts[s].start >= m_start && self.shifts[s].end <= m_end
                })
            })
            .count()
    }
}
