//! Display and formatting methods for the solver state.
//!
//! Formatting helpers used for logging and for the CLI's final output.

use super::State;

impl State {
    /// Formats the current roster, one line per shift in start order.
    pub fn format_roster(&self) -> String {
        let mut output = String::new();
        let mut shift_order: Vec<usize> = (0..self.shifts.len()).collect();
        shift_order.sort_by_key(|&s| (self.shifts[s].start, self.shifts[s].end));

        for shift_idx in shift_order {
            let mut names: Vec<&str> = self.schedule[shift_idx]
                .iter()
                .map(|&p| self.people[p].label.as_str())
                .collect();
            names.sort();
            output.push_str(&format!(
                "{} [{}/{}]: {}\n",
                self.shift_idx_to_id[shift_idx],
                self.schedule[shift_idx].len(),
                if self.shifts[shift_idx].max_cap == 0 {
                    "∞".to_string()
                } else {
                    self.shifts[shift_idx].max_cap.to_string()
                },
                names.join(", ")
            ));
        }
        output
    }

    /// Formats a detailed breakdown of the current roster's cost.
    ///
    /// One line per person with the component columns, followed by the
    /// global components and the aggregate.
    pub fn format_cost_breakdown(&self) -> String {
        let breakdown = self.evaluate_cost();
        let mut output = String::from("=== COST BREAKDOWN ===\n");
        output.push_str("person: preference / off-day / ranking / type / mandatory = total\n");

        let mut person_order: Vec<usize> = (0..self.people.len()).collect();
        person_order.sort_by(|&a, &b| self.people[a].label.cmp(&self.people[b].label));
        for person_idx in person_order {
            let costs = &breakdown.per_person[person_idx];
            output.push_str(&format!(
                "{}: {:.1} / {:.1} / {:.1} / {:.1} / {:.1} = {:.1}\n",
                self.people[person_idx].label,
                costs.preference,
                costs.off_day,
                costs.ranking,
                costs.shift_type,
                costs.mandatory,
                costs.total
            ));
        }

        let summary = &breakdown.summary;
        output.push_str(&format!(
            "priority: {:.1}  gender: {:.2}  balance: {:.2}\n",
            summary.priority, summary.gender, summary.balance
        ));
        output.push_str(&format!("total: {:.2}\n", summary.total));
        output
    }
}
