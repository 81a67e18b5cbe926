use std::io::Write;
use std::path::Path;

use anyhow::anyhow;
use tracing::{debug, info};

use super::{CommandContext, apply_and_report, known_command_names};
use crate::config::Config;
use crate::datastore::{assignments_json, export_assignments};
use crate::datetime::{current_year, parse_month};
use crate::household::{Command, Household};

pub(super) fn cmd_month<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    let Some(raw) = args.first() else {
        writeln!(
            out,
            "{} {}",
            household.month().name(),
            current_year(ctx.now)
        )?;
        return Ok(());
    };

    let month = parse_month(raw).ok_or_else(|| anyhow!("unknown month: {raw}"))?;
    apply_and_report(household, ctx, Command::SelectMonth(month), out)
}

pub(super) fn cmd_distribute<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command distribute");
    apply_and_report(household, ctx, Command::Distribute, out)
}

pub(super) fn cmd_calendar<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> anyhow::Result<()> {
    ensure_distributed(household, ctx)?;
    ctx.renderer
        .print_calendar(out, household, current_year(ctx.now))
}

pub(super) fn cmd_totals<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> anyhow::Result<()> {
    ensure_distributed(household, ctx)?;
    ctx.renderer.print_totals(out, &household.totals())
}

pub(super) fn cmd_export<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command export");
    ensure_distributed(household, ctx)?;

    match args {
        [] => {
            writeln!(out, "{}", assignments_json(household.assignments())?)?;
        }
        [path] => {
            export_assignments(Path::new(path), household.assignments())?;
            writeln!(
                out,
                "Exported {} assignments to {path}.",
                household.assignments().len()
            )?;
        }
        _ => return Err(anyhow!("usage: export [PATH]")),
    }
    Ok(())
}

pub(super) fn cmd_commands<W: Write>(out: &mut W) -> anyhow::Result<()> {
    for name in known_command_names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

pub(super) fn cmd_show<W: Write>(cfg: &Config, out: &mut W) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
        writeln!(out, "{key}={value}")?;
    }
    Ok(())
}

pub(super) fn cmd_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "Commands:
  people [TERM]                      list people, optionally filtered by name
  person-add NAME... [color:C]       add a person
  person-delete ID                   delete a person
  person-rename ID NAME...           rename a person
  absence-add ID START END           add an inclusive absence range
  absence-remove ID N                remove a person's Nth absence
  tasks                              list tasks in distribution order
  task-add NAME... WEIGHT            add a task weighing 1-9
  task-edit N [name:TEXT] [weight:W] change the Nth task
  task-delete N                      delete the Nth task
  month [NAME|NUMBER]                show or select the month to plan
                                     (a selection lasts for the shell session;
                                     set household.month to start elsewhere)
  distribute                         spread tasks over the selected month
  calendar                           show the month day by day
  totals                             total assigned weight per person
  export [PATH]                      assignments as JSON
  shell                              read commands from stdin
  help, version"
    )?;
    Ok(())
}

/// One-shot views distribute on demand since nothing survives between
/// invocations; the shell shows exactly what was last distributed.
fn ensure_distributed(household: &mut Household, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    if ctx.interactive || !household.assignments().is_empty() {
        return Ok(());
    }
    debug!("no assignments yet; distributing before rendering");
    household.apply(Command::Distribute, ctx.now)?;
    Ok(())
}
