use std::io::{BufRead, Write};

use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::commands::{CommandContext, dispatch};
use crate::household::Household;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellSummary {
    pub commands: usize,
    pub errors: usize,
}

/// Reads one command per line until EOF or `quit`. A rejected command is
/// reported on `err` and the session goes on with the household untouched.
#[instrument(skip_all)]
pub fn run_shell<R, W, E>(
    household: &mut Household,
    ctx: &CommandContext<'_>,
    input: R,
    out: &mut W,
    err: &mut E,
    prompt: bool,
) -> anyhow::Result<ShellSummary>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    info!("shell session started");
    let mut summary = ShellSummary::default();
    let mut lines = input.lines();

    loop {
        if prompt {
            write!(out, "chores> ")?;
            out.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if matches!(trimmed, "quit" | "exit") {
            debug!("shell quit requested");
            break;
        }

        summary.commands += 1;
        let tokens: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        let result = Invocation::from_tokens(ctx.cfg, tokens)
            .and_then(|inv| dispatch(household, ctx, inv, out));

        if let Err(error) = result {
            summary.errors += 1;
            warn!(line = %trimmed, error = %error, "command rejected");
            writeln!(err, "error: {error:#}")?;
        }
    }

    info!(
        commands = summary.commands,
        errors = summary.errors,
        "shell session ended"
    );
    Ok(summary)
}
