mod people;
mod tasks;
mod views;

use std::io::Write;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::household::{Command, Household, Outcome};
use crate::render::Renderer;

/// What a command needs besides the household itself.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub cfg: &'a Config,
    pub renderer: &'a Renderer,
    pub now: DateTime<Utc>,
    /// Set inside `shell`, where views show exactly what has been
    /// distributed so far.
    pub interactive: bool,
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "people",
        "person-add",
        "person-delete",
        "person-rename",
        "absence-add",
        "absence-remove",
        "tasks",
        "task-add",
        "task-edit",
        "task-delete",
        "month",
        "distribute",
        "calendar",
        "totals",
        "export",
        "shell",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(household, ctx, inv, out), fields(command = %inv.command))]
pub fn dispatch<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    inv: Invocation,
    out: &mut W,
) -> anyhow::Result<()> {
    debug!(args = ?inv.command_args, "dispatching command");
    let args = inv.command_args.as_slice();

    match inv.command.as_str() {
        "people" => people::cmd_people(household, ctx, args, out),
        "person-add" => people::cmd_person_add(household, ctx, args, out),
        "person-delete" => people::cmd_person_delete(household, ctx, args, out),
        "person-rename" => people::cmd_person_rename(household, ctx, args, out),
        "absence-add" => people::cmd_absence_add(household, ctx, args, out),
        "absence-remove" => people::cmd_absence_remove(household, ctx, args, out),
        "tasks" => tasks::cmd_tasks(household, ctx, out),
        "task-add" => tasks::cmd_task_add(household, ctx, args, out),
        "task-edit" => tasks::cmd_task_edit(household, ctx, args, out),
        "task-delete" => tasks::cmd_task_delete(household, ctx, args, out),
        "month" => views::cmd_month(household, ctx, args, out),
        "distribute" => views::cmd_distribute(household, ctx, out),
        "calendar" => views::cmd_calendar(household, ctx, out),
        "totals" => views::cmd_totals(household, ctx, out),
        "export" => views::cmd_export(household, ctx, args, out),
        "_commands" => views::cmd_commands(out),
        "_show" => views::cmd_show(ctx.cfg, out),
        "help" => views::cmd_help(out),
        "version" => {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        "shell" => Err(anyhow!("already in a shell session")),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// Applies `command` and reports the outcome in one line.
fn apply_and_report<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()> {
    let outcome = household.apply(command, ctx.now)?;
    let message = match &outcome {
        Outcome::PersonAdded(id) => format!("Added person {id}."),
        Outcome::PersonRemoved(person) => {
            format!("Deleted person {} ({}).", person.id, person.name)
        }
        Outcome::PersonRenamed(id) => format!("Renamed person {id}."),
        Outcome::AbsenceAdded(id) => format!("Added absence for person {id}."),
        Outcome::AbsenceRemoved(id, interval) => {
            format!("Removed absence {interval} of person {id}.")
        }
        Outcome::TaskAdded(_) => format!("Added task {}.", household.tasks().len()),
        Outcome::TaskEdited(id) => {
            let position = household.task_index(*id).map(|idx| idx + 1).unwrap_or(0);
            format!("Modified task {position}.")
        }
        Outcome::TaskRemoved(task) => format!("Deleted task {}.", task.name),
        Outcome::MonthSelected(month) => format!("Selected {}.", month.name()),
        Outcome::Distributed { count, month, year } => {
            format!("Distributed {count} tasks over {} {year}.", month.name())
        }
    };
    writeln!(out, "{message}")?;
    Ok(())
}

fn parse_position(raw: &str, what: &str) -> anyhow::Result<usize> {
    let position: usize = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("{what} must be a positive number, got: {raw}"))?;
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow!("{what} must be a positive number, got: {raw}"))
}
