use anyhow::anyhow;
use slotdesk_shared::ReferenceKind;
use tracing::{
  debug,
  info,
  instrument
};

use super::modifiers::split_assignments;
use super::settle;
use crate::api::Backend;
use crate::app::App;
use crate::render::Renderer;

/// `refs` lists record counts per kind;
/// `refs <kind>` lists one kind.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_refs<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command refs");

  let kind = args
    .first()
    .map(|raw| raw.parse::<ReferenceKind>())
    .transpose()?;

  let loaded = app.load_references().await;
  settle(app, renderer, loaded)?;

  match kind {
    | Some(kind) => {
      app.select_reference_kind(kind);
      renderer.print_references(
        kind,
        app.references().items(kind)
      )
    }
    | None => {
      let counts: Vec<_> = ReferenceKind::ALL
        .iter()
        .map(|&kind| {
          (
            kind,
            app.references().items(kind).len()
          )
        })
        .collect();
      renderer.print_reference_summary(
        &counts,
        app.references().updated_at()
      )
    }
  }
}

/// `refadd <kind> <value...> [desc:...]`
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_refadd<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command refadd");

  let (kind, rest) =
    split_kind("refadd", args)?;
  let (words, assignments) =
    split_assignments(rest);

  let mut description = String::new();
  for (key, value) in assignments {
    match key.as_str() {
      | "desc" | "description" => {
        description = value
      }
      | other => {
        return Err(anyhow!(
          "refadd: unknown option {other}"
        ));
      }
    }
  }
  let value = words.join(" ");
  debug!(%kind, %value, "adding reference record");

  let added = app
    .add_reference(kind, &value, &description)
    .await;
  settle(app, renderer, added)?;
  renderer.print_references(
    kind,
    app.references().items(kind)
  )
}

/// `refdel <kind> <item>`; the item may be
/// given by id or by value.
#[instrument(skip(app, renderer, args))]
pub(super) async fn cmd_refdel<B: Backend>(
  app: &mut App<B>,
  renderer: &mut Renderer,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command refdel");

  let (kind, rest) =
    split_kind("refdel", args)?;
  let needle = match rest {
    | [] => {
      return Err(anyhow!(
        "refdel requires a record id"
      ));
    }
    | words => words.join(" ")
  };

  let loaded = app.load_references().await;
  settle(app, renderer, loaded)?;

  let items = app.references().items(kind);
  let item_id = items
    .iter()
    .find(|item| item.id == needle)
    .or_else(|| {
      app.references().find_value(kind, &needle)
    })
    .map(|item| item.id.clone())
    .ok_or_else(|| {
      anyhow!(
        "no {} record matches {needle}",
        kind.display_name()
      )
    })?;

  let deleted = app
    .delete_reference(kind, &item_id)
    .await;
  settle(app, renderer, deleted)?;
  renderer.print_references(
    kind,
    app.references().items(kind)
  )
}

fn split_kind<'a>(
  command: &str,
  args: &'a [String]
) -> anyhow::Result<(ReferenceKind, &'a [String])>
{
  let (raw, rest) =
    args.split_first().ok_or_else(|| {
      anyhow!(
        "{command} requires a reference \
         kind"
      )
    })?;
  Ok((raw.parse::<ReferenceKind>()?, rest))
}
