use std::collections::HashMap;

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::datetime::days_in_month;
use crate::person::{Person, PersonId};
use crate::task::Task;

/// One task handed to one person on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub date: NaiveDate,
    pub person_id: PersonId,
    pub task: String,
}

/// Spreads every task over every day of `month` in `year`.
///
/// Days are walked in order. Each day, the people who are not absent are
/// stably sorted by the weight they have accumulated so far in this run
/// (lightest first, registry order on ties), the catalog is stably sorted
/// heaviest first, and task `i` goes to person `i % available`. A day on
/// which nobody is available produces nothing and its tasks are dropped.
#[instrument(skip(people, tasks), fields(month = month.name(), people = people.len(), tasks = tasks.len()))]
pub fn distribute(people: &[Person], tasks: &[Task], month: Month, year: i32) -> Vec<Assignment> {
    let mut assignments = Vec::new();
    if people.is_empty() || tasks.is_empty() {
        debug!("nothing to distribute");
        return assignments;
    }

    let mut occurrence_weight: HashMap<PersonId, u32> =
        people.iter().map(|person| (person.id, 0)).collect();

    for date in days_in_month(year, month) {
        let mut available: Vec<&Person> = people
            .iter()
            .filter(|person| !person.is_absent_on(date))
            .collect();

        if available.is_empty() {
            debug!(%date, "nobody available; skipping day");
            continue;
        }

        available.sort_by_key(|person| occurrence_weight.get(&person.id).copied().unwrap_or(0));

        let mut day_tasks: Vec<&Task> = tasks.iter().collect();
        day_tasks.sort_by(|a, b| b.weight.cmp(&a.weight));

        for (idx, task) in day_tasks.into_iter().enumerate() {
            let assignee = available[idx % available.len()];
            *occurrence_weight.entry(assignee.id).or_insert(0) += u32::from(task.weight.get());
            trace!(%date, person = assignee.id, task = %task.name, "assigned");
            assignments.push(Assignment {
                date,
                person_id: assignee.id,
                task: task.name.clone(),
            });
        }
    }

    info!(count = assignments.len(), year, "distribution complete");
    assignments
}
