use std::io::Write;

use anyhow::{Context, anyhow};
use tracing::info;

use super::{CommandContext, apply_and_report, parse_position};
use crate::datetime::parse_date_expr;
use crate::household::{Command, Household};
use crate::person::{PersonColor, PersonId};

pub(super) fn cmd_people<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    let term = args.join(" ");
    let matches = household.search_people(&term);
    ctx.renderer.print_people(out, &matches)
}

pub(super) fn cmd_person_add<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command person-add");

    let mut color = None;
    let mut words = Vec::new();
    for arg in args {
        if let Some(raw) = arg.strip_prefix("color:") {
            color = Some(raw.parse::<PersonColor>()?);
        } else {
            words.push(arg.as_str());
        }
    }

    let command = Command::AddPerson {
        name: words.join(" "),
        color,
    };
    apply_and_report(household, ctx, command, out)
}

pub(super) fn cmd_person_delete<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command person-delete");
    let [id] = args else {
        return Err(anyhow!("usage: person-delete ID"));
    };
    let command = Command::RemovePerson {
        id: parse_person_id(id)?,
    };
    apply_and_report(household, ctx, command, out)
}

pub(super) fn cmd_person_rename<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command person-rename");
    let Some((id, name)) = args.split_first() else {
        return Err(anyhow!("usage: person-rename ID NAME..."));
    };
    let command = Command::RenamePerson {
        id: parse_person_id(id)?,
        name: name.join(" "),
    };
    apply_and_report(household, ctx, command, out)
}

pub(super) fn cmd_absence_add<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command absence-add");
    let [id, start, end] = args else {
        return Err(anyhow!("usage: absence-add ID START END"));
    };

    let start = parse_date_expr(start, ctx.now).context("invalid absence start")?;
    let end = parse_date_expr(end, ctx.now).context("invalid absence end")?;
    let command = Command::AddAbsence {
        person_id: parse_person_id(id)?,
        start,
        end,
    };
    apply_and_report(household, ctx, command, out)
}

pub(super) fn cmd_absence_remove<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command absence-remove");
    let [id, position] = args else {
        return Err(anyhow!("usage: absence-remove ID N"));
    };
    let command = Command::RemoveAbsence {
        person_id: parse_person_id(id)?,
        index: parse_position(position, "absence number")?,
    };
    apply_and_report(household, ctx, command, out)
}

fn parse_person_id(raw: &str) -> anyhow::Result<PersonId> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("person id must be a number, got: {raw}"))
}
