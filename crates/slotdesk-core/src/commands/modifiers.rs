use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use tracing::{
  instrument,
  warn
};

use crate::form::{
  SettingsForm,
  TaskField,
  TaskForm
};

/// Splits command words into free
/// words and `key:value` / `key=value`
/// assignments. Everything after `--`
/// is a free word.
pub fn split_assignments(
  args: &[String]
) -> (Vec<String>, Vec<(String, String)>)
{
  let mut words = Vec::new();
  let mut assignments = Vec::new();

  let mut literal = false;
  for arg in args {
    if arg == "--" {
      literal = true;
      continue;
    }

    if !literal
      && let Some(pair) =
        parse_assignment(arg)
    {
      assignments.push(pair);
      continue;
    }

    words.push(arg.clone());
  }

  (words, assignments)
}

fn parse_assignment(
  tok: &str
) -> Option<(String, String)> {
  let split_at = tok.find([':', '='])?;
  let (key, rest) = tok.split_at(split_at);
  if key.is_empty()
    || !key.chars().all(|c| {
      c.is_ascii_alphabetic() || c == '_'
    })
  {
    return None;
  }

  Some((
    key.to_ascii_lowercase(),
    rest[1..].to_string()
  ))
}

#[instrument(skip(form, assignments))]
pub fn apply_task_assignments(
  form: &mut TaskForm,
  assignments: &[(String, String)],
  today: NaiveDate
) -> anyhow::Result<()> {
  for (key, value) in assignments {
    let field = key
      .parse::<TaskField>()
      .map_err(|msg| anyhow!(msg))?;
    form
      .set(field, value, today)
      .with_context(|| {
        format!("cannot set {field}")
      })?;
  }
  Ok(())
}

#[instrument(skip(form, assignments))]
pub fn apply_settings_assignments(
  form: &mut SettingsForm,
  assignments: &[(String, String)]
) -> anyhow::Result<()> {
  for (key, value) in assignments {
    form.set(key, value)?;
  }
  Ok(())
}

/// Rejects leftover free words where a
/// command only takes assignments.
pub fn reject_words(
  command: &str,
  words: &[String]
) -> anyhow::Result<()> {
  if words.is_empty() {
    return Ok(());
  }
  warn!(command, ?words, "unexpected words");
  Err(anyhow!(
    "{command}: expected key:value \
     arguments, got: {}",
    words.join(" ")
  ))
}
