use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{
  debug,
  info,
  instrument
};

use super::modifiers::{
  apply_task_assignments,
  reject_words,
  split_assignments
};
use super::settle;
use crate::api::Backend;
use crate::app::App;
use crate::render::Renderer;

#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_list<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  targets: &[String],
  args: &[String]
) -> anyhow::Result<()> {
  info!("command list");

  let loaded = app.load_tasks().await;
  settle(app, renderer, loaded)?;

  let ids: Vec<&String> =
    targets.iter().chain(args).collect();
  if ids.is_empty() {
    renderer
      .print_task_table(app.tasks().tasks())?;
    return Ok(());
  }

  for id in ids {
    let task =
      app.tasks().get(id).ok_or_else(
        || anyhow!("unknown task: {id}")
      )?;
    renderer.print_task_info(task)?;
  }
  Ok(())
}

#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_add<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String],
  today: NaiveDate
) -> anyhow::Result<()> {
  info!("command add");

  let (words, assignments) =
    split_assignments(args);
  reject_words("add", &words)?;

  let opened = app
    .open_new_task_form(today)
    .await
    .map(|_| ());
  settle(app, renderer, opened)?;

  fill_and_submit(
    app,
    renderer,
    &assignments,
    today
  )
  .await
}

#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_modify<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  id: &str,
  args: &[String],
  today: NaiveDate
) -> anyhow::Result<()> {
  info!("command modify");

  let (words, assignments) =
    split_assignments(args);
  reject_words("modify", &words)?;
  if assignments.is_empty() {
    return Err(anyhow!(
      "modify: nothing to change"
    ));
  }

  let loaded = app.load_tasks().await;
  settle(app, renderer, loaded)?;

  let opened = app
    .open_edit_task_form(id, today)
    .await
    .map(|_| ());
  settle(app, renderer, opened)?;

  fill_and_submit(
    app,
    renderer,
    &assignments,
    today
  )
  .await
}

async fn fill_and_submit<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  assignments: &[(String, String)],
  today: NaiveDate
) -> anyhow::Result<()> {
  let form = app.task_form_mut().ok_or_else(
    || anyhow!("task form is not open")
  )?;
  if let Err(err) = apply_task_assignments(
    form,
    assignments,
    today
  ) {
    app.close_task_form();
    return Err(err);
  }

  if let Some(form) = app.task_form() {
    debug!(
      task_id = ?form.task_id(),
      "submitting task form"
    );
    renderer.print_task_form(form)?;
  }

  let submitted =
    app.submit_task_form().await;
  let outcome =
    settle(app, renderer, submitted);
  app.close_task_form();
  outcome?;

  renderer
    .print_task_table(app.tasks().tasks())
}

#[instrument(skip(app, renderer))]
pub(super) async fn cmd_delete<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  id: &str
) -> anyhow::Result<()> {
  info!("command delete");

  let deleted = app.delete_task(id).await;
  settle(app, renderer, deleted)?;
  renderer
    .print_task_table(app.tasks().tasks())
}

/// `inwork [on|off]`; without a word the
/// flag is flipped.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_inwork<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  id: &str,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command inwork");

  let loaded = app.load_tasks().await;
  settle(app, renderer, loaded)?;

  let value = match args.first() {
    | Some(word) => parse_switch(word)?,
    | None => {
      let task =
        app.tasks().get(id).ok_or_else(
          || anyhow!("unknown task: {id}")
        )?;
      !task.in_work
    }
  };

  let toggled =
    app.toggle_in_work(id, value).await;
  settle(app, renderer, toggled)?;
  renderer
    .print_task_table(app.tasks().tasks())
}

/// `move <target>` drops the task onto
/// the row currently holding `target`.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_move<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  id: &str,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command move");

  let target = match args {
    | [target] => target,
    | _ => {
      return Err(anyhow!(
        "move requires one target task \
         id"
      ));
    }
  };

  let loaded = app.load_tasks().await;
  settle(app, renderer, loaded)?;

  let moved =
    app.move_task(id, target).await;
  if !settle(app, renderer, moved)? {
    println!("Order unchanged.");
  }
  renderer
    .print_task_table(app.tasks().tasks())
}

fn parse_switch(
  word: &str
) -> anyhow::Result<bool> {
  match word.to_ascii_lowercase().as_str()
  {
    | "on" | "yes" | "true" | "1" => {
      Ok(true)
    }
    | "off" | "no" | "false" | "0" => {
      Ok(false)
    }
    | other => Err(anyhow!(
      "expected on or off, got: {other}"
    ))
  }
}
