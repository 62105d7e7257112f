use std::time;

use tokio::time::{
  Instant,
  MissedTickBehavior,
  interval_at
};
use tracing::{
  debug,
  info,
  instrument
};

use crate::api::Backend;
use crate::app::App;
use crate::config::Config;
use crate::render::Renderer;

/// Polls tasks and logs on their own
/// periods until Ctrl-C. The task table
/// is reprinted only when it changed;
/// log entries and notices print once
/// each and notices then age out.
#[instrument(skip(app, cfg, renderer))]
pub(super) async fn cmd_watch<B: Backend>(
  app: &mut App<B>,
  cfg: &Config,
  renderer: &mut Renderer
) -> anyhow::Result<()> {
  let task_period = cfg.task_poll_interval();
  let log_period = cfg.log_poll_interval();
  info!(
    task_secs = task_period.as_secs(),
    log_secs = log_period.as_secs(),
    "command watch"
  );

  // Failures of the first load are shown
  // as notices; polling carries on.
  let _ = app.init().await;
  renderer
    .print_task_table(app.tasks().tasks())?;
  let mut printed_until = None;
  flush(app, renderer, &mut printed_until)?;

  let start = Instant::now();
  let mut task_tick =
    interval_at(start + task_period, task_period);
  task_tick.set_missed_tick_behavior(
    MissedTickBehavior::Delay
  );
  let mut log_tick =
    interval_at(start + log_period, log_period);
  log_tick.set_missed_tick_behavior(
    MissedTickBehavior::Delay
  );

  let shutdown = tokio::signal::ctrl_c();
  tokio::pin!(shutdown);

  loop {
    tokio::select! {
      _ = &mut shutdown => {
        info!("interrupted; leaving watch");
        break;
      }
      _ = task_tick.tick() => {
        let before = app.tasks().tasks().to_vec();
        if let Ok(true) = app.poll_tasks().await
          && app.tasks().tasks() != before.as_slice()
        {
          debug!(count = app.tasks().len(), "task list changed");
          renderer.print_task_table(app.tasks().tasks())?;
        }
      }
      _ = log_tick.tick() => {
        // Poll failures are already queued
        // as notices.
        let _ = app.poll_logs().await;
      }
    }
    flush(app, renderer, &mut printed_until)?;
  }

  Ok(())
}

fn flush<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  printed_until: &mut Option<time::Instant>
) -> anyhow::Result<()> {
  let fresh = app.logs_mut().take_unseen();
  if !fresh.is_empty() {
    let refs: Vec<_> = fresh.iter().collect();
    renderer.print_log_lines(&refs)?;
  }

  let unseen: Vec<_> = app
    .notices()
    .pending()
    .filter(|notice| {
      printed_until
        .is_none_or(|at| notice.raised_at > at)
    })
    .cloned()
    .collect();
  if let Some(newest) = unseen.last() {
    *printed_until = Some(newest.raised_at);
  }
  renderer.print_notices(&unseen)?;

  app.notices_mut().expire(time::Instant::now());
  Ok(())
}
