pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod logs;
pub mod notify;
pub mod references;
pub mod render;
pub mod reorder;
pub mod sequencer;
pub mod task_store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

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
    "starting slotdesk"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.panelrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  if let Some(url) = cli.url {
    cfg.apply_overrides([(
      "api.url".to_string(),
      url
    )]);
  }

  let backend =
    api::HttpBackend::from_config(&cfg)
      .with_context(|| {
        format!(
          "invalid backend url {}",
          cfg.api_url()
        )
      })?;
  let mut app = app::App::new(backend)
    .with_concurrency(
      cfg.concurrency_input()
    );

  let mut renderer =
    render::Renderer::new(&cfg)?;
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  runtime.block_on(commands::dispatch(
    &mut app,
    &cfg,
    &mut renderer,
    inv
  ))?;

  info!("done");
  Ok(())
}
