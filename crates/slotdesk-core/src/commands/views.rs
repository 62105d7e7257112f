use anyhow::anyhow;
use slotdesk_shared::{
  LogCategory,
  LogLevel
};
use tracing::{
  info,
  instrument,
  warn
};

use super::modifiers::{
  apply_settings_assignments,
  reject_words,
  split_assignments
};
use super::settle;
use crate::api::Backend;
use crate::app::App;
use crate::form::SettingsForm;
use crate::logs::LogFilter;
use crate::render::Renderer;

/// `logs [level:L] [category:C]`
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_logs<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command logs");

  let filter = parse_log_filter(args)?;
  app.logs_mut().set_filter(filter);

  let loaded = app.load_logs().await;
  settle(app, renderer, loaded)?;

  let visible = app.logs().visible();
  if visible.is_empty() {
    println!("No log entries.");
    return Ok(());
  }
  renderer.print_log_lines(&visible)
}

fn parse_log_filter(
  args: &[String]
) -> anyhow::Result<LogFilter> {
  let (words, assignments) =
    split_assignments(args);
  reject_words("logs", &words)?;

  let mut filter = LogFilter::default();
  for (key, value) in assignments {
    match key.as_str() {
      | "level" => {
        filter.level = match value.as_str() {
          | "" | "all" => None,
          | raw => Some(
            raw
              .parse::<LogLevel>()
              .map_err(|msg| anyhow!(msg))?
          )
        }
      }
      | "category" | "cat" => {
        filter.category =
          match value.as_str() {
            | "" | "all" => None,
            | raw => Some(
              raw
                .parse::<LogCategory>()
                .map_err(|msg| anyhow!(msg))?
            )
          }
      }
      | other => {
        return Err(anyhow!(
          "logs: unknown filter {other}"
        ));
      }
    }
  }
  Ok(filter)
}

#[instrument(skip(app, renderer))]
pub(super) async fn cmd_settings<
  B: Backend
>(
  app: &mut App<B>,
  renderer: &mut Renderer
) -> anyhow::Result<()> {
  info!("command settings");

  let form = load_settings_form(app, renderer)
    .await?;
  renderer.print_settings(&form)
}

/// `configure key:value...` saves the
/// edited settings.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_configure<
  B: Backend
>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command configure");

  let (words, assignments) =
    split_assignments(args);
  reject_words("configure", &words)?;
  if assignments.is_empty() {
    return Err(anyhow!(
      "configure: nothing to change"
    ));
  }

  let mut form =
    load_settings_form(app, renderer).await?;
  apply_settings_assignments(
    &mut form,
    &assignments
  )?;

  let saved = app.save_settings(&form).await;
  settle(app, renderer, saved)?;

  let shown = app
    .settings()
    .map(SettingsForm::from_settings)
    .unwrap_or(form);
  renderer.print_settings(&shown)
}

/// `test [key:value...]` runs a connection
/// test against the stored settings with
/// the given fields replaced.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_test<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command test");

  let (words, assignments) =
    split_assignments(args);
  reject_words("test", &words)?;

  let loaded = app
    .load_settings()
    .await
    .map(SettingsForm::from_settings);
  let mut form = match loaded {
    | Ok(form) => form,
    | Err(err) => {
      warn!(error = %err, "testing without stored settings");
      app.notices_mut().drain();
      SettingsForm::default()
    }
  };
  apply_settings_assignments(
    &mut form,
    &assignments
  )?;

  let tested =
    app.test_connection(&form).await;
  let response =
    settle(app, renderer, tested)?;
  renderer.print_status(
    app.automation_status(),
    app.connection()
  )?;

  if response.success {
    if response.duration != 0 {
      println!(
        "took {} ms",
        response.duration
      );
    }
    Ok(())
  } else {
    Err(anyhow!(
      "connection test failed: {}",
      if response.error.is_empty() {
        "unknown error"
      } else {
        response.error.as_str()
      }
    ))
  }
}

async fn load_settings_form<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer
) -> anyhow::Result<SettingsForm> {
  let loaded = app
    .load_settings()
    .await
    .map(SettingsForm::from_settings);
  settle(app, renderer, loaded)
}

pub(super) fn cmd_help()
-> anyhow::Result<()> {
  println!(
    "\
slotdesk [options] [ids...] <command> [args...]

Tasks:
  list [id...]                  show the task table or task details
  add key:value...              create a task
  <id> modify key:value...      change fields of a task
  <id> delete                   delete a task
  <id> inwork [on|off]          include or exclude a task from runs
  <id> move <target-id>         drop a task onto another row

  task keys: type status date slot auto driver place index
             container release contract cancel tries delay inwork

References:
  refs [kind]                   list reference records
  refadd <kind> <value> [desc:text]
  refdel <kind> <id|value>

  kinds: operations statuses timeslots autos drivers contracts

Automation:
  start [parallel|sequential] [concurrency:N]
  stop

Monitoring:
  logs [level:L] [category:C]   show backend log entries
  watch                         poll tasks and logs until interrupted

Settings:
  settings                      show stored settings
  configure key:value...        edit and save settings
  test [key:value...]           test the booking site connection

Options:
  --url URL      backend base URL
  --panelrc FILE configuration file
  --rc KEY=VALUE configuration override
  -v / -q        more / less diagnostic output"
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use slotdesk_shared::{
    LogCategory,
    LogLevel
  };

  use super::parse_log_filter;

  fn strings(raw: &[&str]) -> Vec<String> {
    raw
      .iter()
      .map(|s| s.to_string())
      .collect()
  }

  #[test]
  fn log_filter_from_assignments() {
    let filter =
      parse_log_filter(&strings(&[
        "level:error",
        "category:task-execution"
      ]))
      .expect("filter");
    assert_eq!(
      filter.level,
      Some(LogLevel::Error)
    );
    assert_eq!(
      filter.category,
      Some(LogCategory::TaskExecution)
    );

    let all =
      parse_log_filter(&strings(&[
        "level:all"
      ]))
      .expect("filter");
    assert!(all.is_empty());
  }

  #[test]
  fn log_filter_rejects_unknown_keys() {
    assert!(
      parse_log_filter(&strings(&[
        "source:x"
      ]))
      .is_err()
    );
  }
}
