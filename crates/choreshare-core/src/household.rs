use anyhow::{Context, anyhow};
use chrono::{DateTime, Month, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::datetime::{ISO_DATE_FORMAT, current_year, parse_month};
use crate::distribute::{Assignment, distribute};
use crate::person::{AbsenceInterval, Person, PersonColor, PersonId};
use crate::report::{PersonTotal, weight_totals};
use crate::task::{Task, TaskId, TaskPatch, Weight};

const SEED_TOML: &str = include_str!("../assets/seed.toml");

/// Everything one session knows about: people, tasks, the selected month and
/// the assignments of the last distribution run.
#[derive(Debug, Clone)]
pub struct Household {
    people: Vec<Person>,
    tasks: Vec<Task>,
    assignments: Vec<Assignment>,
    month: Month,
}

/// A single state change requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddPerson {
        name: String,
        color: Option<PersonColor>,
    },
    RemovePerson {
        id: PersonId,
    },
    RenamePerson {
        id: PersonId,
        name: String,
    },
    AddAbsence {
        person_id: PersonId,
        start: NaiveDate,
        end: NaiveDate,
    },
    RemoveAbsence {
        person_id: PersonId,
        index: usize,
    },
    AddTask {
        name: String,
        weight: Weight,
    },
    EditTask {
        index: usize,
        patch: TaskPatch,
    },
    RemoveTask {
        index: usize,
    },
    SelectMonth(Month),
    Distribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    PersonAdded(PersonId),
    PersonRemoved(Person),
    PersonRenamed(PersonId),
    AbsenceAdded(PersonId),
    AbsenceRemoved(PersonId, AbsenceInterval),
    TaskAdded(TaskId),
    TaskEdited(TaskId),
    TaskRemoved(Task),
    MonthSelected(Month),
    Distributed {
        count: usize,
        month: Month,
        year: i32,
    },
}

#[derive(Debug, Deserialize)]
struct HouseholdFile {
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    people: Vec<PersonEntry>,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonEntry {
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    absences: Vec<AbsenceEntry>,
}

#[derive(Debug, Deserialize)]
struct AbsenceEntry {
    start: toml::Value,
    end: toml::Value,
}

#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    weight: i64,
}

impl Household {
    pub fn empty(month: Month) -> Self {
        Self {
            people: vec![],
            tasks: vec![],
            assignments: vec![],
            month,
        }
    }

    /// The household every session starts with by default.
    pub fn seed(month: Month) -> anyhow::Result<Self> {
        Self::from_toml_str(SEED_TOML, month).context("embedded seed household is invalid")
    }

    /// Builds a household from its TOML description. Entries go through the
    /// same validation as interactive edits.
    #[instrument(skip(raw))]
    pub fn from_toml_str(raw: &str, default_month: Month) -> anyhow::Result<Self> {
        let file: HouseholdFile = toml::from_str(raw).context("failed parsing household toml")?;

        let month = match file.month.as_deref() {
            Some(text) => parse_month(text).ok_or_else(|| anyhow!("unknown month: {text}"))?,
            None => default_month,
        };

        let mut household = Self::empty(month);
        for entry in file.people {
            let color = entry
                .color
                .as_deref()
                .map(str::parse::<PersonColor>)
                .transpose()
                .with_context(|| format!("person {}", entry.name))?;
            let id = household.add_person_with_color(&entry.name, color.unwrap_or_default())?;

            for absence in entry.absences {
                let start = toml_date(&absence.start)?;
                let end = toml_date(&absence.end)?;
                household
                    .add_absence(id, start, end)
                    .with_context(|| format!("absence of {}", entry.name))?;
            }
        }

        for entry in file.tasks {
            let weight = u8::try_from(entry.weight)
                .map_err(|_| anyhow!("weight out of range for {}: {}", entry.name, entry.weight))
                .and_then(Weight::new)
                .with_context(|| format!("task {}", entry.name))?;
            household.add_task(&entry.name, weight)?;
        }

        info!(
            people = household.people.len(),
            tasks = household.tasks.len(),
            month = household.month.name(),
            "loaded household"
        );
        Ok(household)
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn next_person_id(&self) -> PersonId {
        self.people.iter().map(|person| person.id).max().unwrap_or(0) + 1
    }

    pub fn add_person(&mut self, name: &str) -> anyhow::Result<PersonId> {
        self.add_person_with_color(name, PersonColor::Grey)
    }

    #[instrument(skip(self))]
    pub fn add_person_with_color(
        &mut self,
        name: &str,
        color: PersonColor,
    ) -> anyhow::Result<PersonId> {
        let name = required_name(name, "person")?;
        let id = self.next_person_id();
        self.people.push(Person::new(id, name, color));
        debug!(id, "person added");
        Ok(id)
    }

    /// Past assignments keep pointing at the removed id.
    #[instrument(skip(self))]
    pub fn remove_person(&mut self, id: PersonId) -> anyhow::Result<Person> {
        let idx = self.person_index(id)?;
        let removed = self.people.remove(idx);
        debug!(id, "person removed");
        Ok(removed)
    }

    #[instrument(skip(self))]
    pub fn rename_person(&mut self, id: PersonId, name: &str) -> anyhow::Result<()> {
        let name = required_name(name, "person")?;
        let idx = self.person_index(id)?;
        self.people[idx].name = name;
        Ok(())
    }

    /// Case-insensitive substring match on names; an empty term matches all.
    pub fn search_people(&self, term: &str) -> Vec<&Person> {
        let needle = term.trim().to_lowercase();
        self.people
            .iter()
            .filter(|person| person.name.to_lowercase().contains(&needle))
            .collect()
    }

    #[instrument(skip(self))]
    pub fn add_absence(
        &mut self,
        person_id: PersonId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<()> {
        let idx = self.person_index(person_id)?;
        let interval = AbsenceInterval::new(start, end)?;
        self.people[idx].absences.push(interval);
        debug!(person_id, %interval, "absence added");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn remove_absence(
        &mut self,
        person_id: PersonId,
        index: usize,
    ) -> anyhow::Result<AbsenceInterval> {
        let idx = self.person_index(person_id)?;
        let absences = &mut self.people[idx].absences;
        if index >= absences.len() {
            return Err(anyhow!(
                "person {person_id} has no absence #{}",
                index + 1
            ));
        }
        Ok(absences.remove(index))
    }

    #[instrument(skip(self))]
    pub fn add_task(&mut self, name: &str, weight: Weight) -> anyhow::Result<TaskId> {
        let name = required_name(name, "task")?;
        let task = Task::new(name, weight);
        let id = task.id;
        self.tasks.push(task);
        debug!(%id, "task added");
        Ok(id)
    }

    pub fn task_index(&self, id: TaskId) -> anyhow::Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| anyhow!("no task with id {id}"))
    }

    /// Edits the task at `index` in catalog order.
    #[instrument(skip(self))]
    pub fn edit_task(&mut self, index: usize, patch: TaskPatch) -> anyhow::Result<TaskId> {
        if patch.is_empty() {
            return Err(anyhow!("nothing to change"));
        }
        let name = patch
            .name
            .as_deref()
            .map(|name| required_name(name, "task"))
            .transpose()?;

        let task = self
            .tasks
            .get_mut(index)
            .ok_or_else(|| anyhow!("no task #{}", index + 1))?;
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(weight) = patch.weight {
            task.weight = weight;
        }
        Ok(task.id)
    }

    pub fn edit_task_by_id(&mut self, id: TaskId, patch: TaskPatch) -> anyhow::Result<TaskId> {
        let index = self.task_index(id)?;
        self.edit_task(index, patch)
    }

    #[instrument(skip(self))]
    pub fn remove_task(&mut self, index: usize) -> anyhow::Result<Task> {
        if index >= self.tasks.len() {
            return Err(anyhow!("no task #{}", index + 1));
        }
        Ok(self.tasks.remove(index))
    }

    pub fn remove_task_by_id(&mut self, id: TaskId) -> anyhow::Result<Task> {
        let index = self.task_index(id)?;
        self.remove_task(index)
    }

    pub fn select_month(&mut self, month: Month) {
        self.month = month;
    }

    /// Replaces the stored assignments with a fresh run over the selected
    /// month of `year`.
    #[instrument(skip(self), fields(month = self.month.name()))]
    pub fn distribute(&mut self, year: i32) -> usize {
        self.assignments = distribute(&self.people, &self.tasks, self.month, year);
        self.assignments.len()
    }

    pub fn totals(&self) -> Vec<PersonTotal> {
        weight_totals(&self.people, &self.tasks, &self.assignments)
    }

    /// Runs one command. On error nothing has changed.
    #[instrument(skip(self, now))]
    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> anyhow::Result<Outcome> {
        let outcome = match command {
            Command::AddPerson { name, color } => {
                let id = self.add_person_with_color(&name, color.unwrap_or_default())?;
                Outcome::PersonAdded(id)
            }
            Command::RemovePerson { id } => Outcome::PersonRemoved(self.remove_person(id)?),
            Command::RenamePerson { id, name } => {
                self.rename_person(id, &name)?;
                Outcome::PersonRenamed(id)
            }
            Command::AddAbsence {
                person_id,
                start,
                end,
            } => {
                self.add_absence(person_id, start, end)?;
                Outcome::AbsenceAdded(person_id)
            }
            Command::RemoveAbsence { person_id, index } => {
                let removed = self.remove_absence(person_id, index)?;
                Outcome::AbsenceRemoved(person_id, removed)
            }
            Command::AddTask { name, weight } => Outcome::TaskAdded(self.add_task(&name, weight)?),
            Command::EditTask { index, patch } => Outcome::TaskEdited(self.edit_task(index, patch)?),
            Command::RemoveTask { index } => Outcome::TaskRemoved(self.remove_task(index)?),
            Command::SelectMonth(month) => {
                self.select_month(month);
                Outcome::MonthSelected(month)
            }
            Command::Distribute => {
                let year = current_year(now);
                let count = self.distribute(year);
                Outcome::Distributed {
                    count,
                    month: self.month,
                    year,
                }
            }
        };
        debug!(?outcome, "command applied");
        Ok(outcome)
    }

    fn person_index(&self, id: PersonId) -> anyhow::Result<usize> {
        self.people
            .iter()
            .position(|person| person.id == id)
            .ok_or_else(|| anyhow!("no person with id {id}"))
    }
}

fn required_name(raw: &str, what: &str) -> anyhow::Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        warn!(what, "rejected empty name");
        return Err(anyhow!("{what} name is required"));
    }
    Ok(name.to_string())
}

fn toml_date(value: &toml::Value) -> anyhow::Result<NaiveDate> {
    let raw = match value {
        toml::Value::String(text) => text.clone(),
        toml::Value::Datetime(datetime) => datetime.to_string(),
        other => return Err(anyhow!("expected a date, got: {other}")),
    };
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE_FORMAT)
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {raw}"))
}

#[cfg(test)]
mod tests {
    use chrono::{Month, NaiveDate, TimeZone, Utc};

    use super::{Command, Household, Outcome};
    use crate::person::PersonColor;
    use crate::task::{TaskPatch, Weight};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn weight(value: u8) -> Weight {
        Weight::new(value).expect("weight")
    }

    #[test]
    fn seed_matches_the_default_household() {
        let household = Household::seed(Month::March).expect("seed");
        let names: Vec<&str> = household.people().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(household.people()[0].color, PersonColor::Red);
        assert_eq!(
            household.people().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let tasks: Vec<(&str, u8)> = household
            .tasks()
            .iter()
            .map(|t| (t.name.as_str(), t.weight.get()))
            .collect();
        assert_eq!(tasks, vec![("Sol", 1), ("Vaisselle", 2), ("Lessives", 4)]);
    }

    #[test]
    fn person_ids_follow_the_current_maximum() {
        let mut household = Household::empty(Month::March);
        assert_eq!(household.add_person("Alice").expect("add"), 1);
        assert_eq!(household.add_person("Bob").expect("add"), 2);
        household.remove_person(1).expect("remove");
        assert_eq!(household.add_person("Carol").expect("add"), 3);

        let mut lonely = Household::empty(Month::March);
        lonely.add_person("Only").expect("add");
        lonely.remove_person(1).expect("remove");
        assert_eq!(lonely.add_person("Again").expect("add"), 1);
    }

    #[test]
    fn rejected_input_leaves_state_unchanged() {
        let mut household = Household::seed(Month::March).expect("seed");
        let before_people = household.people().to_vec();
        let before_tasks = household.tasks().to_vec();

        assert!(household.add_person("   ").is_err());
        assert!(household.add_absence(1, ymd(2025, 3, 5), ymd(2025, 3, 4)).is_err());
        assert!(household.add_absence(42, ymd(2025, 3, 4), ymd(2025, 3, 5)).is_err());
        assert!(household.remove_absence(1, 0).is_err());
        assert!(household.add_task("", weight(3)).is_err());
        assert!(
            household
                .edit_task(
                    0,
                    TaskPatch {
                        name: Some(" ".to_string()),
                        weight: Some(weight(9)),
                    }
                )
                .is_err()
        );
        assert!(household.remove_task(7).is_err());

        assert_eq!(household.people(), before_people.as_slice());
        assert_eq!(household.tasks(), before_tasks.as_slice());
    }

    #[test]
    fn absences_are_removed_by_position() {
        let mut household = Household::seed(Month::March).expect("seed");
        household.add_absence(2, ymd(2025, 3, 1), ymd(2025, 3, 2)).expect("add");
        household.add_absence(2, ymd(2025, 3, 10), ymd(2025, 3, 12)).expect("add");

        let removed = household.remove_absence(2, 0).expect("remove");
        assert_eq!(removed.start, ymd(2025, 3, 1));
        let left = &household.person(2).expect("bob").absences;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].start, ymd(2025, 3, 10));
    }

    #[test]
    fn duplicate_task_names_are_allowed_and_ids_survive_deletes() {
        let mut household = Household::empty(Month::March);
        let first = household.add_task("Sol", weight(1)).expect("add");
        let second = household.add_task("Sol", weight(3)).expect("add");
        household.remove_task(0).expect("remove");

        assert_eq!(household.task_index(second).expect("index"), 0);
        assert!(household.task_index(first).is_err());

        household
            .edit_task_by_id(
                second,
                TaskPatch {
                    name: None,
                    weight: Some(weight(5)),
                },
            )
            .expect("edit");
        assert_eq!(household.tasks()[0].weight.get(), 5);

        let third = household.add_task("Lessives", weight(4)).expect("add");
        household.remove_task(0).expect("remove");
        assert_eq!(household.task_index(third).expect("index"), 0);

        let removed = household.remove_task_by_id(third).expect("remove by id");
        assert_eq!(removed.id, third);
        assert_eq!(removed.name, "Lessives");
        assert!(household.tasks().is_empty());
        assert!(household.remove_task_by_id(second).is_err());
    }

    #[test]
    fn totals_reflect_weight_edits_after_distribution() {
        let mut household = Household::empty(Month::February);
        household.add_person("A").expect("add");
        household.add_person("B").expect("add");
        household.add_task("Dishes", weight(2)).expect("add");
        household.add_task("Floor", weight(1)).expect("add");
        household.distribute(2025);

        let before: u32 = household.totals().iter().map(|t| t.total_weight).sum();
        assert_eq!(before, 28 * 3);

        household
            .edit_task(
                0,
                TaskPatch {
                    name: None,
                    weight: Some(weight(4)),
                },
            )
            .expect("edit");
        let after: u32 = household.totals().iter().map(|t| t.total_weight).sum();
        assert_eq!(after, 28 * 5);
    }

    #[test]
    fn deleted_people_leave_orphaned_assignments() {
        let mut household = Household::seed(Month::March).expect("seed");
        household.distribute(2025);
        household.remove_person(3).expect("remove");

        assert!(household.assignments().iter().any(|a| a.person_id == 3));
        assert_eq!(household.totals().len(), 2);

        household.distribute(2025);
        assert!(household.assignments().iter().all(|a| a.person_id != 3));
    }

    #[test]
    fn search_is_case_insensitive() {
        let household = Household::seed(Month::March).expect("seed");
        let hits: Vec<&str> = household
            .search_people("AR")
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Charlie"]);
        assert_eq!(household.search_people("").len(), 3);
    }

    #[test]
    fn apply_distribute_uses_the_current_year() {
        let now = Utc
            .with_ymd_and_hms(2026, 6, 15, 12, 0, 0)
            .single()
            .expect("valid now");
        let mut household = Household::seed(Month::June).expect("seed");

        household
            .apply(Command::SelectMonth(Month::February), now)
            .expect("select");
        let outcome = household.apply(Command::Distribute, now).expect("distribute");

        assert_eq!(
            outcome,
            Outcome::Distributed {
                count: 28 * 3,
                month: Month::February,
                year: 2026,
            }
        );
        assert_eq!(household.assignments()[0].date, ymd(2026, 2, 1));
    }

    #[test]
    fn imports_people_absences_and_tasks() {
        let raw = r#"
month = "april"

[[people]]
name = "Dana"
color = "cyan"
absences = [{ start = "2025-04-01", end = "2025-04-03" }]

[[people]]
name = "Eli"

[[tasks]]
name = "Courses"
weight = 3
"#;
        let household = Household::from_toml_str(raw, Month::January).expect("import");
        assert_eq!(household.month(), Month::April);
        assert_eq!(household.people()[0].color, PersonColor::Cyan);
        assert_eq!(household.people()[0].absences.len(), 1);
        assert_eq!(household.people()[1].color, PersonColor::Grey);
        assert_eq!(household.tasks()[0].weight.get(), 3);
    }

    #[test]
    fn import_rejects_invalid_entries() {
        let bad_weight = "[[tasks]]\nname = \"Sol\"\nweight = 10\n";
        assert!(Household::from_toml_str(bad_weight, Month::May).is_err());

        let inverted = r#"
[[people]]
name = "Dana"
absences = [{ start = "2025-04-05", end = "2025-04-03" }]
"#;
        assert!(Household::from_toml_str(inverted, Month::May).is_err());

        let bad_month = "month = \"Brumaire\"\n";
        assert!(Household::from_toml_str(bad_month, Month::May).is_err());
    }
}
