//! Cost evaluation.
//!
//! The evaluator scores a feasible roster against the weighted
//! soft-preference components: partner preferences, day-off overlap,
//! time-frame ranking, shift-type counts, mandatory coverage, shift
//! staffing priority, gender distribution and workload balance. It is a
//! pure function of the state; evaluating twice yields the same value.

use super::State;
use crate::models::{CostSummary, DayWindow, PersonCostBreakdown};

const SECONDS_PER_DAY: i64 = 86_400;
const NIGHT_START: u32 = 23 * 3600;
const NIGHT_END: u32 = 7 * 3600;

/// Full decomposition of the objective for one roster.
#[derive(Debug, Clone)]
pub struct CostBreakdown {
    pub per_person: Vec<PersonCostBreakdown>,
    pub summary: CostSummary,
}

/// Seconds since midnight UTC of an absolute timestamp.
#[inline]
pub fn seconds_of_day(timestamp: i64) -> u32 {
    timestamp.rem_euclid(SECONDS_PER_DAY) as u32
}

/// Splits a possibly wrapping time-of-day range into linear segments.
/// `start == end` denotes a full-day window.
fn day_segments(start: u32, end: u32) -> [(u32, u32); 2] {
    if start < end {
        [(start, end), (0, 0)]
    } else if start == end {
        [(0, SECONDS_PER_DAY as u32), (0, 0)]
    } else {
        [(start, SECONDS_PER_DAY as u32), (0, end)]
    }
}

/// Wrap-around-safe overlap test between a preference window and a shift's
/// time-of-day range.
pub fn day_windows_overlap(window: &DayWindow, shift_start: u32, shift_end: u32) -> bool {
    for &(a_start, a_end) in &day_segments(window.start_sec, window.end_sec) {
        if a_start == a_end {
            continue;
        }
        for &(b_start, b_end) in &day_segments(shift_start, shift_end) {
            if b_start == b_end {
                continue;
            }
            if a_start < b_end && b_start < a_end {
                return true;
            }
        }
    }
    false
}

/// Sample standard deviation, 0 for fewer than two values.
fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

impl State {
    /// Scores the current roster. Pure; does not mutate anything.
    pub fn evaluate_cost(&self) -> CostBreakdown {
        let mut per_person = Vec::with_capacity(self.people.len());
        for person_idx in 0..self.people.len() {
            let preference = self.preference_cost(person_idx);
            let off_day = self.off_day_cost(person_idx);
            let ranking = self.ranking_cost(person_idx);
            let shift_type = self.shift_type_cost(person_idx);
            let mandatory =
                self.uncovered_mandatory(person_idx) as f64 * self.weights.mandatory_factor;
            per_person.push(PersonCostBreakdown {
                preference,
                off_day,
                ranking,
                shift_type,
                mandatory,
                total: preference + off_day + ranking + shift_type + mandatory,
            });
        }

        let individual_total: f64 = per_person.iter().map(|p| p.total).sum();
        let priority = self.priority_cost();
        let gender = self.gender_cost();
        let totals: Vec<f64> = per_person.iter().map(|p| p.total).collect();
        let balance = sample_stddev(&totals).powf(self.weights.balance_exponent);

        CostBreakdown {
            per_person,
            summary: CostSummary {
                individual_total,
                priority,
                gender,
                balance,
                total: individual_total + priority + gender + balance,
            },
        }
    }

    /// Convenience accessor for the aggregate objective.
    pub fn total_cost(&self) -> f64 {
        self.evaluate_cost().summary.total
    }

    /// Partner preference cost of one person.
    ///
    /// Friends working the same shift count fully, friends working a
    /// different shift that starts at the same time count with the reduced
    /// same-time weight. The shortfall against the best case (every
    /// assigned shift shared with every friend) is charged with
    /// `friend_factor`; enemy co-occurrence is charged with `enemy_factor`.
    fn preference_cost(&self, person_idx: usize) -> f64 {
        let person = &self.people[person_idx];
        if person.friends.is_empty() && person.enemies.is_empty() {
            return 0.0;
        }
        let w = &self.weights;

        let own_shifts = &self.assigned[person_idx];
        let start_times: Vec<i64> = own_shifts.iter().map(|&s| self.shifts[s].start).collect();

        let mut friends_count = 0.0;
        let mut enemies_count = 0.0;
        for (shift_idx, members) in self.schedule.iter().enumerate() {
            let same_shift = own_shifts.contains(&shift_idx);
            let same_time = !same_shift && start_times.contains(&self.shifts[shift_idx].start);
            if !same_shift && !same_time {
                continue;
            }
            for &other in members {
                if other == person_idx {
                    continue;
                }
                match self.preference[person_idx][other].signum() {
                    -1 => {
                        friends_count += if same_shift {
                            w.same_shift_friend
                        } else {
                            w.same_time_friend
                        }
                    }
                    1 => {
                        enemies_count += if same_shift {
                            w.same_shift_enemy
                        } else {
                            w.same_time_enemy
                        }
                    }
                    _ => {}
                }
            }
        }

        let opportunities = person.friends.len() as f64 * own_shifts.len() as f64;
        (opportunities - friends_count).max(0.0) * w.friend_factor
            + enemies_count * w.enemy_factor
    }

    /// Day-off cost: charged at most once per assigned shift that overlaps
    /// any of the person's day-off windows.
    fn off_day_cost(&self, person_idx: usize) -> f64 {
        let person = &self.people[person_idx];
        if person.days_off.is_empty() {
            return 0.0;
        }
        let overlapping = self.assigned[person_idx]
            .iter()
            .filter(|&&s| {
                let shift = &self.shifts[s];
                person
                    .days_off
                    .iter()
                    .any(|&(start, end)| shift.start < end && start < shift.end)
            })
            .count();
        overlapping as f64 * self.weights.off_day_factor
    }

    /// Time-frame ranking cost: every assigned shift contributes its base
    /// cost plus the squared matching time-of-day preference cost, scaled
    /// by `ranking_factor`. Working more than one night shift adds the
    /// surcharge `(assigned / night_count) * night_shift_factor`.
    fn ranking_cost(&self, person_idx: usize) -> f64 {
        let person = &self.people[person_idx];
        let w = &self.weights;
        let mut cost = 0.0;
        let mut night_count = 0u32;

        for &shift_idx in &self.assigned[person_idx] {
            let shift = &self.shifts[shift_idx];
            let shift_start = seconds_of_day(shift.start);
            let shift_end = seconds_of_day(shift.end);

            let preference_cost = person
                .time_prefs
                .iter()
                .find(|(window, _)| day_windows_overlap(window, shift_start, shift_end))
                .map_or(0, |&(_, cost)| cost);
            cost += (shift.base_cost as f64 + (preference_cost as f64).powi(2)) * w.ranking_factor;

            if shift_start >= NIGHT_START || shift_end <= NIGHT_END {
                night_count += 1;
            }
        }

        if night_count > 1 {
            cost +=
                self.assigned[person_idx].len() as f64 / night_count as f64 * w.night_shift_factor;
        }
        cost
    }

    /// Per-type count cost. Below the per-type minimum or above the maximum
    /// costs one `shift_type_factor` each; a `(0, 0)` entry is a
    /// preferred-but-not-required type and costs double when unused.
    /// Jokers contribute nothing.
    fn shift_type_cost(&self, person_idx: usize) -> f64 {
        let person = &self.people[person_idx];
        if person.joker {
            return 0.0;
        }
        let factor = self.weights.shift_type_factor;
        let mut cost = 0.0;
        for (&type_idx, &(min, max)) in &person.allowed {
            let count = self.type_count(person_idx, type_idx);
            if min == 0 && max == 0 {
                if count == 0 {
                    cost += 2.0 * factor;
                }
                continue;
            }
            if count < min {
                cost += factor;
            }
            if max != 0 && count > max {
                cost += factor;
            }
        }
        cost
    }

    /// Staffing priority cost: each shift below its minimum headcount adds
    /// the square of its priority.
    fn priority_cost(&self) -> f64 {
        self.shifts
            .iter()
            .enumerate()
            .filter(|(idx, shift)| self.schedule[*idx].len() < shift.min_cap as usize)
            .map(|(_, shift)| (shift.priority as f64).powi(2))
            .sum()
    }

    /// Gender distribution cost: the sample standard deviation of the
    /// per-shift gender means, scaled by `gender_factor`. Zero when the
    /// problem carries no gender data at all.
    fn gender_cost(&self) -> f64 {
        if self.people.iter().all(|p| p.gender.is_none()) {
            return 0.0;
        }
        let means: Vec<f64> = self
            .schedule
            .iter()
            .map(|members| {
                let genders: Vec<f64> = members
                    .iter()
                    .filter_map(|&p| self.people[p].gender)
                    .map(|g| g as f64)
                    .collect();
                if genders.is_empty() {
                    0.0
                } else {
                    genders.iter().sum::<f64>() / genders.len() as f64
                }
            })
            .collect();
        sample_stddev(&means) * self.weights.gender_factor
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

    fn person(id: &str) -> PersonRecord {
        PersonRecord {
            id: id.to_string(),
            label: None,
            shift_count: (1, 4),
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

    fn shift(id: &str, start: i64, end: i64) -> ShiftRecord {
        ShiftRecord {
            id: id.to_string(),
            start,
            end,
            capacity: (0, 4),
            shift_type: 0,
            restricted: false,
            priority: 0,
            base_cost: 0,
        }
    }

    fn state(people: Vec<PersonRecord>, shifts: Vec<ShiftRecord>) -> State {
        State::new(&ApiInput {
            problem: ProblemDefinition { people, shifts },
            weights: CostWeights::default(),
            solver: SolverConfiguration::default(),
        })
        .unwrap()
    }

    #[test]
    fn evaluation_is_pure() {
        let mut s = state(
            vec![person("a"), person("b")],
            vec![shift("s1", hour(0), hour(6)), shift("s2", hour(12), hour(18))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(0, 1);
        s.add_assignment(1, 0);
        let first = s.evaluate_cost();
        let second = s.evaluate_cost();
        assert_eq!(first.summary.total, second.summary.total);
        assert_eq!(first.per_person, second.per_person);
    }

    #[test]
    fn friends_together_cancel_the_shortfall() {
        let mut a = person("a");
        a.partners = vec![PartnerPreference {
            id: "b".to_string(),
            relation: -1,
        }];
        let mut s = state(
            vec![a, person("b")],
            vec![shift("s1", hour(0), hour(6))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(0, 1);
        let breakdown = s.evaluate_cost();
        // 1 friend * 1 shift opportunity, fully met
        assert_eq!(breakdown.per_person[0].preference, 0.0);
    }

    #[test]
    fn separated_friends_pay_the_friend_factor() {
        let mut a = person("a");
        a.partners = vec![PartnerPreference {
            id: "b".to_string(),
            relation: -1,
        }];
        let mut s = state(
            vec![a, person("b")],
            vec![
                shift("s1", hour(0), hour(6)),
                shift("s2", hour(24), hour(30)),
            ],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 1);
        let breakdown = s.evaluate_cost();
        assert_eq!(
            breakdown.per_person[0].preference,
            s.weights.friend_factor
        );
    }

    #[test]
    fn parallel_shift_friend_counts_with_same_time_weight() {
        let mut a = person("a");
        a.partners = vec![PartnerPreference {
            id: "b".to_string(),
            relation: -1,
        }];
        // two shifts with the same start time
        let mut s = state(
            vec![a, person("b")],
            vec![shift("s1", hour(0), hour(6)), shift("s2", hour(0), hour(8))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 1);
        let breakdown = s.evaluate_cost();
        let expected = (1.0 - s.weights.same_time_friend).max(0.0) * s.weights.friend_factor;
        assert_eq!(breakdown.per_person[0].preference, expected);
    }

    #[test]
    fn same_time_enemy_is_charged() {
        let mut a = person("a");
        a.partners = vec![PartnerPreference {
            id: "b".to_string(),
            relation: 1,
        }];
        let mut s = state(
            vec![a, person("b")],
            vec![shift("s1", hour(0), hour(6)), shift("s2", hour(0), hour(8))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 1);
        let breakdown = s.evaluate_cost();
        assert_eq!(
            breakdown.per_person[0].preference,
            s.weights.same_time_enemy * s.weights.enemy_factor
        );
    }

    #[test]
    fn off_day_charged_once_per_overlapping_shift() {
        let mut p = person("a");
        p.days_off = vec![TimeWindow {
            start: Some(hour(0)),
            end: Some(hour(48)),
        }];
        let mut s = state(
            vec![p],
            vec![
                shift("s1", hour(1), hour(7)),
                shift("s2", hour(20), hour(26)),
                shift("s3", hour(50), hour(56)),
            ],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 0);
        s.add_assignment(2, 0);
        let breakdown = s.evaluate_cost();
        assert_eq!(breakdown.per_person[0].off_day, 2.0 * s.weights.off_day_factor);
    }

    #[test]
    fn ranking_squares_the_preference_cost() {
        let mut p = person("a");
        p.time_preferences = vec![TimePreference {
            window: DayWindow {
                start_sec: 0,
                end_sec: 12 * 3600,
            },
            cost: 3,
        }];
        let mut morning = shift("s1", hour(2), hour(8));
        morning.base_cost = 5;
        let mut s = state(vec![p], vec![morning]);
        s.add_assignment(0, 0);
        let breakdown = s.evaluate_cost();
        assert_eq!(breakdown.per_person[0].ranking, (5.0 + 9.0) * s.weights.ranking_factor);
    }

    #[test]
    fn overnight_preference_window_wraps() {
        let window = DayWindow {
            start_sec: 23 * 3600,
            end_sec: 7 * 3600,
        };
        assert!(day_windows_overlap(&window, 23 * 3600 + 1800, 5 * 3600));
        assert!(day_windows_overlap(&window, 1800, 6 * 3600));
        assert!(!day_windows_overlap(&window, 9 * 3600, 15 * 3600));
    }

    #[test]
    fn multiple_night_shifts_add_surcharge() {
        let mut s = state(
            vec![person("a")],
            vec![
                shift("n1", hour(23), hour(31)),  // starts 23:00
                shift("n2", hour(71), hour(79)),  // starts 23:00 two days later
                shift("d1", hour(105), hour(113)), // 09:00 day shift
            ],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 0);
        s.add_assignment(2, 0);
        let breakdown = s.evaluate_cost();
        // 3 assigned shifts / 2 night shifts
        assert_eq!(
            breakdown.per_person[0].ranking,
            3.0 / 2.0 * s.weights.night_shift_factor
        );
    }

    #[test]
    fn preferred_not_required_type_costs_double_when_unused() {
        let mut p = person("a");
        p.shift_types.insert(
            1,
            TypeLimits {
                experienced: false,
                min: 0,
                max: 0,
            },
        );
        let s = state(vec![p], vec![shift("s1", hour(0), hour(6))]);
        let breakdown = s.evaluate_cost();
        assert_eq!(
            breakdown.per_person[0].shift_type,
            2.0 * s.weights.shift_type_factor
        );
    }

    #[test]
    fn jokers_pay_no_type_cost() {
        let s = state(vec![person("a")], vec![shift("s1", hour(0), hour(6))]);
        assert_eq!(s.evaluate_cost().per_person[0].shift_type, 0.0);
    }

    #[test]
    fn understaffed_shift_costs_priority_squared() {
        let mut urgent = shift("s1", hour(0), hour(6));
        urgent.capacity = (2, 3);
        urgent.priority = 4;
        let s = state(vec![person("a")], vec![urgent]);
        assert_eq!(s.evaluate_cost().summary.priority, 16.0);
    }

    #[test]
    fn gender_cost_skipped_without_gender_data() {
        let mut s = state(
            vec![person("a"), person("b")],
            vec![shift("s1", hour(0), hour(6)), shift("s2", hour(12), hour(18))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 1);
        assert_eq!(s.evaluate_cost().summary.gender, 0.0);
    }

    #[test]
    fn uneven_gender_mix_is_penalized() {
        let mut a = person("a");
        a.gender = Some(0);
        let mut b = person("b");
        b.gender = Some(1);
        let mut s = state(
            vec![a, b],
            vec![shift("s1", hour(0), hour(6)), shift("s2", hour(12), hour(18))],
        );
        s.add_assignment(0, 0);
        s.add_assignment(1, 1);
        let split = s.evaluate_cost().summary.gender;
        assert!(split > 0.0);

        // both on one shift: single mean, no spread
        s.clear_assignments();
        s.add_assignment(0, 0);
        s.add_assignment(0, 1);
        let together = s.evaluate_cost().summary.gender;
        assert!(together < split);
    }

    #[test]
    fn balance_exponent_is_applied() {
        let mut p = person("a");
        p.days_off = vec![TimeWindow {
            start: Some(hour(0)),
            end: Some(hour(24)),
        }];
        let mut s = state(
            vec![p, person("b")],
            vec![shift("s1", hour(1), hour(7))],
        );
        s.add_assignment(0, 0);
        s.weights.balance_exponent = 1.0;
        let linear = s.evaluate_cost().summary.balance;
        s.weights.balance_exponent = 2.0;
        let squared = s.evaluate_cost().summary.balance;
        assert!((squared - linear * linear).abs() < 1e-9);
    }

    #[test]
    fn uncovered_mandatory_is_charged() {
        let mut p = person("a");
        p.mandatory = vec![TimeWindow {
            start: Some(hour(0)),
            end: Some(hour(12)),
        }];
        let mut s = state(
            vec![p],
            vec![shift("inside", hour(2), hour(8)), shift("outside", hour(24), hour(30))],
        );
        s.add_assignment(1, 0);
        assert_eq!(
            s.evaluate_cost().per_person[0].mandatory,
            s.weights.mandatory_factor
        );
        s.add_assignment(0, 0);
        assert_eq!(s.evaluate_cost().per_person[0].mandatory, 0.0);
    }
}
