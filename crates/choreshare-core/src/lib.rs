pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod distribute;
pub mod household;
pub mod person;
pub mod render;
pub mod report;
pub mod session;
pub mod task;

use std::ffi::OsString;
use std::io::{
  self,
  IsTerminal
};
use std::path::Path;

use anyhow::{
  Context,
  anyhow
};
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::commands::CommandContext;
use crate::household::Household;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting chores CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.choresrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let now = Utc::now();
  let mut household = open_household(
    &cfg,
    cli.empty,
    cli.household.as_deref(),
    now
  )?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  let stdout = io::stdout();
  let mut out = stdout.lock();

  if inv.command == "shell" {
    let ctx = CommandContext {
      cfg: &cfg,
      renderer: &renderer,
      now,
      interactive: true
    };
    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    let summary = session::run_shell(
      &mut household,
      &ctx,
      stdin.lock(),
      &mut out,
      &mut io::stderr().lock(),
      prompt
    )?;
    debug!(?summary, "shell finished");
  } else {
    let ctx = CommandContext {
      cfg: &cfg,
      renderer: &renderer,
      now,
      interactive: false
    };
    commands::dispatch(
      &mut household,
      &ctx,
      inv,
      &mut out
    )?;
  }

  info!("done");
  Ok(())
}

fn open_household(
  cfg: &config::Config,
  empty: bool,
  household_file: Option<&Path>,
  now: chrono::DateTime<Utc>
) -> anyhow::Result<Household> {
  let month = match cfg
    .get("household.month")
    .filter(|raw| !raw.trim().is_empty())
  {
    | Some(raw) => {
      datetime::parse_month(&raw)
        .ok_or_else(|| {
          anyhow!(
            "invalid household.month: \
             {raw}"
          )
        })?
    }
    | None => {
      datetime::current_month(now)
    }
  };

  if empty {
    debug!("starting from an empty household");
    return Ok(Household::empty(month));
  }

  if let Some(path) =
    config::resolve_household_file(
      cfg,
      household_file
    )
  {
    return datastore::load_household(
      &path, month
    );
  }

  let seeded = cfg
    .get_bool("household.seed")
    .unwrap_or(true);
  if !seeded {
    return Ok(Household::empty(month));
  }

  Household::seed(month).context(
    "failed to prepare household"
  )
}
