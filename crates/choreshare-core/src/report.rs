use chrono::NaiveDate;
use serde::Serialize;

use crate::distribute::Assignment;
use crate::person::{Person, PersonId};
use crate::task::Task;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonTotal {
    pub person_id: PersonId,
    pub name: String,
    pub total_weight: u32,
}

/// Weight of `task_name` in the catalog as it is now. Unknown names weigh 0.
pub fn current_weight(tasks: &[Task], task_name: &str) -> u32 {
    tasks
        .iter()
        .find(|task| task.name == task_name)
        .map(|task| u32::from(task.weight.get()))
        .unwrap_or(0)
}

/// Sum of the current weights of everything assigned to `person_id`.
pub fn person_total(person_id: PersonId, tasks: &[Task], assignments: &[Assignment]) -> u32 {
    assignments
        .iter()
        .filter(|entry| entry.person_id == person_id)
        .map(|entry| current_weight(tasks, &entry.task))
        .sum()
}

/// One row per registered person, in registry order.
pub fn weight_totals(
    people: &[Person],
    tasks: &[Task],
    assignments: &[Assignment],
) -> Vec<PersonTotal> {
    people
        .iter()
        .map(|person| PersonTotal {
            person_id: person.id,
            name: person.name.clone(),
            total_weight: person_total(person.id, tasks, assignments),
        })
        .collect()
}

pub fn assignments_on(assignments: &[Assignment], date: NaiveDate) -> Vec<&Assignment> {
    assignments.iter().filter(|entry| entry.date == date).collect()
}

pub fn absent_on(people: &[Person], date: NaiveDate) -> Vec<&Person> {
    people.iter().filter(|person| person.is_absent_on(date)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{absent_on, assignments_on, person_total, weight_totals};
    use crate::distribute::Assignment;
    use crate::person::{AbsenceInterval, Person, PersonColor};
    use crate::task::{Task, Weight};

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).expect("valid date")
    }

    fn entry(d: u32, person_id: u64, task: &str) -> Assignment {
        Assignment {
            date: ymd(d),
            person_id,
            task: task.to_string(),
        }
    }

    #[test]
    fn totals_follow_current_catalog() {
        let people = vec![
            Person::new(1, "A".to_string(), PersonColor::Red),
            Person::new(2, "B".to_string(), PersonColor::Blue),
        ];
        let mut tasks = vec![
            Task::new("Dishes".to_string(), Weight::new(2).expect("weight")),
            Task::new("Floor".to_string(), Weight::new(1).expect("weight")),
        ];
        let assignments = vec![
            entry(1, 1, "Dishes"),
            entry(1, 2, "Floor"),
            entry(2, 2, "Dishes"),
            entry(2, 1, "Floor"),
            entry(3, 9, "Floor"),
        ];

        let totals = weight_totals(&people, &tasks, &assignments);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].total_weight, 3);
        assert_eq!(totals[1].total_weight, 3);

        tasks[0].weight = Weight::new(5).expect("weight");
        assert_eq!(person_total(1, &tasks, &assignments), 6);

        tasks[1].name = "Sweeping".to_string();
        assert_eq!(person_total(2, &tasks, &assignments), 5);
    }

    #[test]
    fn day_views() {
        let mut away = Person::new(1, "A".to_string(), PersonColor::Red);
        away.absences
            .push(AbsenceInterval::new(ymd(2), ymd(3)).expect("range"));
        let here = Person::new(2, "B".to_string(), PersonColor::Blue);
        let people = vec![away, here];

        let absent: Vec<u64> = absent_on(&people, ymd(3)).iter().map(|p| p.id).collect();
        assert_eq!(absent, vec![1]);
        assert!(absent_on(&people, ymd(4)).is_empty());

        let assignments = vec![entry(1, 1, "Dishes"), entry(2, 2, "Dishes")];
        assert_eq!(assignments_on(&assignments, ymd(2)).len(), 1);
    }
}
