use anyhow::anyhow;
use tracing::{
  info,
  instrument
};

use super::modifiers::split_assignments;
use super::settle;
use crate::api::Backend;
use crate::app::App;
use crate::config::Config;
use crate::render::Renderer;

/// `start [parallel|sequential]
/// [concurrency:N]`; parallel unless
/// told otherwise.
#[instrument(skip(app, cfg, renderer, args))]
pub(super) async fn cmd_start<B: Backend>(
  app: &mut App<B>,
  cfg: &Config,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command start");

  let (words, assignments) =
    split_assignments(args);

  let mut sequential = false;
  for word in &words {
    match word.to_ascii_lowercase().as_str()
    {
      | "sequential" | "seq" => {
        sequential = true
      }
      | "parallel" | "par" => {
        sequential = false
      }
      | other => {
        return Err(anyhow!(
          "start: unknown mode {other}"
        ));
      }
    }
  }

  let mut concurrency =
    cfg.concurrency_input();
  for (key, value) in assignments {
    match key.as_str() {
      | "concurrency" | "max" => {
        concurrency = Some(value)
      }
      | other => {
        return Err(anyhow!(
          "start: unknown option {other}"
        ));
      }
    }
  }
  app.set_concurrency(concurrency);

  let loaded = app.load_tasks().await;
  settle(app, renderer, loaded)?;

  let started =
    app.start_automation(sequential).await;
  let run = settle(app, renderer, started)?;
  if let Some(message) =
    run.response.message.as_deref()
  {
    println!("{message}");
  }
  renderer.print_status(
    app.automation_status(),
    app.connection()
  )
}

#[instrument(skip(app, renderer))]
pub(super) async fn cmd_stop<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer
) -> anyhow::Result<()> {
  info!("command stop");

  let stopped = app.stop_automation().await;
  settle(app, renderer, stopped)?;
  renderer.print_status(
    app.automation_status(),
    app.connection()
  )
}
