use std::io::Write;

use anyhow::anyhow;
use tracing::info;

use super::{CommandContext, apply_and_report, parse_position};
use crate::household::{Command, Household};
use crate::task::{TaskPatch, Weight};

pub(super) fn cmd_tasks<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> anyhow::Result<()> {
    ctx.renderer.print_tasks(out, household.tasks())
}

/// `task-add NAME... WEIGHT`: the last word is the weight.
pub(super) fn cmd_task_add<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command task-add");
    let Some((weight, name)) = args.split_last() else {
        return Err(anyhow!("usage: task-add NAME... WEIGHT"));
    };

    let command = Command::AddTask {
        name: name.join(" "),
        weight: Weight::parse(weight)?,
    };
    apply_and_report(household, ctx, command, out)
}

/// `task-edit N [name:TEXT...] [weight:W]`
pub(super) fn cmd_task_edit<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command task-edit");
    let Some((position, mods)) = args.split_first() else {
        return Err(anyhow!("usage: task-edit N [name:TEXT] [weight:W]"));
    };

    let command = Command::EditTask {
        index: parse_position(position, "task number")?,
        patch: parse_task_mods(mods)?,
    };
    apply_and_report(household, ctx, command, out)
}

pub(super) fn cmd_task_delete<W: Write>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    args: &[String],
    out: &mut W,
) -> anyhow::Result<()> {
    info!("command task-delete");
    let [position] = args else {
        return Err(anyhow!("usage: task-delete N"));
    };
    let command = Command::RemoveTask {
        index: parse_position(position, "task number")?,
    };
    apply_and_report(household, ctx, command, out)
}

fn parse_task_mods(mods: &[String]) -> anyhow::Result<TaskPatch> {
    let mut patch = TaskPatch::default();
    let mut name_words: Option<Vec<&str>> = None;

    for token in mods {
        if let Some(raw) = token.strip_prefix("weight:") {
            if let Some(words) = name_words.take() {
                patch.name = Some(words.join(" "));
            }
            patch.weight = Some(Weight::parse(raw)?);
        } else if let Some(first) = token.strip_prefix("name:") {
            name_words = Some(vec![first]);
        } else if let Some(words) = name_words.as_mut() {
            words.push(token);
        } else {
            return Err(anyhow!("unrecognized modification: {token}"));
        }
    }

    if let Some(words) = name_words {
        patch.name = Some(words.join(" "));
    }
    if patch.is_empty() {
        return Err(anyhow!("task-edit needs name:TEXT and/or weight:W"));
    }
    Ok(patch)
}
