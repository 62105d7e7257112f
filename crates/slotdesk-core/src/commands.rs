mod automation;
mod modifiers;
mod refs;
mod task_ops;
mod views;
mod watch;

use anyhow::anyhow;
use chrono::{Local, NaiveDate};
use tracing::{debug, instrument};

use crate::api::Backend;
use crate::app::App;
use crate::cli::Invocation;
use crate::config::Config;
use crate::error::PanelResult;
use crate::render::Renderer;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "list",
        "add",
        "modify",
        "delete",
        "inwork",
        "move",
        "refs",
        "refadd",
        "refdel",
        "start",
        "stop",
        "logs",
        "settings",
        "configure",
        "test",
        "watch",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(app, cfg, renderer, inv))]
pub async fn dispatch<B: Backend>(
    app: &mut App<B>,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();
    debug!(
        command,
        targets = ?inv.targets,
        args = ?inv.command_args,
        "dispatching command"
    );

    let args = inv.command_args.as_slice();
    match command {
        "list" => task_ops::cmd_list(app, renderer, &inv.targets, args).await,
        "add" => task_ops::cmd_add(app, renderer, args, today()).await,
        "modify" => {
            let (id, rest) = target_id(&inv.targets, args, "modify")?;
            task_ops::cmd_modify(app, renderer, &id, rest, today()).await
        }
        "delete" => {
            let (id, _) = target_id(&inv.targets, args, "delete")?;
            task_ops::cmd_delete(app, renderer, &id).await
        }
        "inwork" => {
            let (id, rest) = target_id(&inv.targets, args, "inwork")?;
            task_ops::cmd_inwork(app, renderer, &id, rest).await
        }
        "move" => {
            let (id, rest) = target_id(&inv.targets, args, "move")?;
            task_ops::cmd_move(app, renderer, &id, rest).await
        }
        "refs" => refs::cmd_refs(app, renderer, args).await,
        "refadd" => refs::cmd_refadd(app, renderer, args).await,
        "refdel" => refs::cmd_refdel(app, renderer, args).await,
        "start" => automation::cmd_start(app, cfg, renderer, args).await,
        "stop" => automation::cmd_stop(app, renderer).await,
        "logs" => views::cmd_logs(app, renderer, args).await,
        "settings" => views::cmd_settings(app, renderer).await,
        "configure" => views::cmd_configure(app, renderer, args).await,
        "test" => views::cmd_test(app, renderer, args).await,
        "watch" => watch::cmd_watch(app, cfg, renderer).await,
        "help" => views::cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Task id from the words before the command, else the first argument.
fn target_id<'a>(
    targets: &[String],
    args: &'a [String],
    command: &str,
) -> anyhow::Result<(String, &'a [String])> {
    if let Some(id) = targets.first() {
        return Ok((id.clone(), args));
    }
    match args.split_first() {
        Some((id, rest)) => Ok((id.clone(), rest)),
        None => Err(anyhow!("{command} requires a task id")),
    }
}

/// Prints the notices an operation raised and turns a failed outcome into
/// a command error carrying the operator-facing message.
fn settle<B: Backend, T>(
    app: &mut App<B>,
    renderer: &mut Renderer,
    result: PanelResult<T>,
) -> anyhow::Result<T> {
    let notices = app.notices_mut().drain();
    match result {
        Ok(value) => {
            renderer.print_notices(&notices)?;
            Ok(value)
        }
        Err(err) => {
            let message = notices
                .iter()
                .rev()
                .find(|notice| notice.is_error())
                .map(|notice| notice.message.clone())
                .unwrap_or_else(|| err.to_string());
            let others: Vec<_> = notices.into_iter().filter(|n| n.message != message).collect();
            renderer.print_notices(&others)?;
            Err(anyhow!(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{expand_command_abbrev, known_command_names, target_id};

    #[test]
    fn unique_prefixes_expand() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("mod", &known), Some("modify"));
        assert_eq!(expand_command_abbrev("refa", &known), Some("refadd"));
        assert_eq!(expand_command_abbrev("w", &known), Some("watch"));
        assert_eq!(expand_command_abbrev("st", &known), None);
        assert_eq!(expand_command_abbrev("ref", &known), None);
        assert_eq!(expand_command_abbrev("refs", &known), Some("refs"));
    }

    #[test]
    fn task_id_comes_from_targets_or_first_arg() {
        let args = vec!["t2".to_string(), "on".to_string()];
        let (id, rest) = target_id(&[], &args, "inwork").expect("id");
        assert_eq!(id, "t2");
        assert_eq!(rest, ["on".to_string()]);

        let (id, rest) = target_id(&["t1".to_string()], &args, "inwork").expect("id");
        assert_eq!(id, "t1");
        assert_eq!(rest.len(), 2);

        assert!(target_id(&[], &[], "delete").is_err());
    }
}
