pub mod aggregate;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod controller;
pub mod density;
pub mod holiday;
pub mod render;
pub mod source;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::controller::{
  TodaySource,
  ViewController,
  ViewState
};
use crate::source::HttpHolidaySource;

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
    "starting holical"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.holicalrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let today_source =
    TodaySource::from_timezone(
      cfg.timezone()?
    );
  let today = today_source.today();
  let view_mode = match cli.view {
    | Some(mode) => mode,
    | None => cfg.default_view()?
  };
  let country = cli
    .country
    .unwrap_or_else(|| {
      cfg.default_country()
    });
  let state = ViewState::new(
    cli.year.unwrap_or(today.year()),
    &country,
    view_mode,
    cli.month.unwrap_or(today.month())
  )
  .context("invalid calendar selection")?;

  let source = HttpHolidaySource::new(
    &cfg.source_url(),
    cfg.source_timeout()?
  )?;
  let mut renderer =
    render::Renderer::new(&cfg)?;
  let mut controller =
    ViewController::new(
      state,
      today_source
    )?;

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed building async runtime"
      )?;

  runtime.block_on(
    controller.load_countries(&source)
  );
  if cli.countries {
    renderer.print_countries(
      controller.countries()
    )?;
    info!("done");
    return Ok(());
  }

  runtime
    .block_on(controller.refresh(&source))?;

  if cli.json {
    renderer.print_json(controller.view())?;
  } else {
    renderer.print_view(
      controller.view(),
      controller.countries()
    )?;
  }

  info!("done");
  Ok(())
}
