use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use slotdesk_shared::{LogEntryDto, LogLevel, ReferenceItemDto, ReferenceKind, TaskDto};
use unicode_width::UnicodeWidthStr;

use crate::app::ConnectionState;
use crate::config::Config;
use crate::datetime::format_log_timestamp;
use crate::dispatcher::AutomationStatus;
use crate::form::{SettingsForm, TaskForm};
use crate::notify::{Notice, NoticeKind};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[TaskDto]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let headers = ["#", "ID", "Work", "Type", "Status", "Date", "Slot", "Vehicle", "Driver"]
            .iter()
            .map(|h| h.to_string())
            .collect();

        let rows = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let work = if task.in_work {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                vec![
                    (idx + 1).to_string(),
                    self.paint(&task.id, "33"),
                    work,
                    task.type_task.clone(),
                    task.status.clone(),
                    task.date.clone(),
                    task.time_slot.clone(),
                    task.num_auto.clone(),
                    task.driver.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, task))]
    pub fn print_task_info(&mut self, task: &TaskDto) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "in work   {}", if task.in_work { "yes" } else { "no" })?;
        writeln!(out, "type      {}", task.type_task)?;
        writeln!(out, "status    {}", task.status)?;
        writeln!(out, "date      {}", task.date)?;
        writeln!(out, "slot      {}", task.time_slot)?;
        writeln!(out, "vehicle   {}", task.num_auto)?;
        writeln!(out, "driver    {}", task.driver)?;
        writeln!(out, "place     {}", task.place)?;
        writeln!(out, "index     {}", task.index_container)?;
        writeln!(out, "container {}", task.number_container)?;
        writeln!(out, "release   {}", task.release_order)?;
        writeln!(out, "contract  {}", task.contract_terminal)?;
        writeln!(
            out,
            "attempts  {} every {}s, cancel after {} min",
            task.count_try, task.delay_try, task.time_cancel
        )?;
        if let Some(position) = task.position {
            writeln!(out, "position  {position}")?;
        }
        Ok(())
    }

    /// Form fields as the operator will submit them. A stored value that
    /// can no longer be selected is shown marked.
    pub fn print_task_form(&mut self, form: &TaskForm) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for (field, select) in form.selects() {
            let shown = match (select.selected(), select.stored()) {
                (Some(value), _) => value.to_string(),
                (None, Some(stored)) => self.paint(&format!("{stored} (unavailable)"), "31"),
                (None, None) => String::new(),
            };
            writeln!(out, "{:<10}{}", field.name(), shown)?;
        }
        let date = form
            .date
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_default();
        writeln!(out, "{:<10}{}", "date", date)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, items))]
    pub fn print_references(
        &mut self,
        kind: ReferenceKind,
        items: &[ReferenceItemDto],
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} ({})", kind.display_name(), kind.api_name())?;
        if items.is_empty() {
            writeln!(out, "No records.")?;
            return Ok(());
        }

        let headers = vec!["ID".to_string(), "Value".to_string(), "Description".to_string()];
        let rows = items
            .iter()
            .map(|item| {
                let value = if item.is_selectable() {
                    item.value.clone()
                } else {
                    self.paint(&format!("{} (inactive)", item.value), "2")
                };
                vec![self.paint(&item.id, "33"), value, item.description.clone()]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_reference_summary(
        &mut self,
        counts: &[(ReferenceKind, usize)],
        updated_at: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let headers = vec!["Kind".to_string(), "Name".to_string(), "Records".to_string()];
        let rows = counts
            .iter()
            .map(|(kind, count)| {
                vec![kind.api_name().to_string(), kind.display_name().to_string(), count.to_string()]
            })
            .collect();
        write_table(&mut out, headers, rows)?;
        if let Some(stamp) = updated_at {
            writeln!(out, "updated {stamp}")?;
        }
        Ok(())
    }

    pub fn print_log_lines(&mut self, entries: &[&LogEntryDto]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for entry in entries {
            let line = format_log_line(entry);
            writeln!(out, "{}", self.paint(&line, level_color(entry.level)))?;
        }
        Ok(())
    }

    pub fn print_settings(&mut self, form: &SettingsForm) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let width = SettingsForm::KEYS.iter().map(|k| k.len()).max().unwrap_or(0);
        for key in SettingsForm::KEYS {
            let value = form.get(key).unwrap_or_default();
            let value = if key == "password" && !value.is_empty() {
                "********".to_string()
            } else {
                value
            };
            writeln!(out, "{key:<width$}  {value}")?;
        }
        Ok(())
    }

    pub fn print_status(
        &mut self,
        automation: AutomationStatus,
        connection: ConnectionState,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let automation = match automation {
            AutomationStatus::Running => self.paint("running", "32"),
            AutomationStatus::Stopped => self.paint("stopped", "2"),
        };
        let connection = match connection {
            ConnectionState::Connected => self.paint("connected", "32"),
            ConnectionState::Disconnected => self.paint("disconnected", "31"),
            ConnectionState::Unknown => "unknown".to_string(),
        };
        writeln!(out, "automation {automation}, connection {connection}")?;
        Ok(())
    }

    /// Success notices go to stdout, errors to stderr.
    pub fn print_notices(&mut self, notices: &[Notice]) -> anyhow::Result<()> {
        for notice in notices {
            match notice.kind {
                NoticeKind::Success => {
                    let mut out = io::stdout().lock();
                    writeln!(out, "{}", self.paint(&notice.message, "32"))?;
                }
                NoticeKind::Error => {
                    let mut err = io::stderr().lock();
                    let line = match notice.field {
                        Some(field) => format!("{} [{field}]", notice.message),
                        None => notice.message.clone(),
                    };
                    writeln!(err, "{}", self.paint_err(&line, "31"))?;
                }
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }

    fn paint_err(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stderr().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn format_log_line(entry: &LogEntryDto) -> String {
    let mut line = format!(
        "{} {:<5} {:<18} {}",
        format_log_timestamp(&entry.timestamp),
        entry.level.as_str(),
        entry.category.as_str(),
        entry.message
    );
    if !entry.error.is_empty() {
        line.push_str(" | ");
        line.push_str(&entry.error);
    }
    line
}

fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error | LogLevel::Fatal => "31",
        LogLevel::Warn => "33",
        LogLevel::Trace | LogLevel::Debug => "2",
        LogLevel::Info | LogLevel::Other => "0",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write!(writer, "{:width$} ", header, width = widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use slotdesk_shared::{LogCategory, LogEntryDto, LogLevel};

    use super::{format_log_line, strip_ansi, write_table};

    #[test]
    fn table_pads_by_display_width() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["Driver".to_string(), "Slot".to_string()],
            vec![
                vec!["Иванов".to_string(), "10:00".to_string()],
                vec!["\x1b[33mLi\x1b[0m".to_string(), "12:00".to_string()],
            ],
        )
        .expect("table");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Driver Slot  ");
        assert_eq!(lines[2], "Иванов 10:00 ");
        assert_eq!(strip_ansi(lines[3]), "Li     12:00 ");
    }

    #[test]
    fn log_line_shows_local_timestamp_and_error() {
        let entry = LogEntryDto {
            id: "1".to_string(),
            timestamp: "2026-10-19T08:05:09".to_string(),
            level: LogLevel::Error,
            category: LogCategory::Connection,
            message: "login failed".to_string(),
            details: String::new(),
            task_id: String::new(),
            user_action: false,
            error: "timeout".to_string(),
        };
        let line = format_log_line(&entry);
        assert!(line.starts_with("19.10.2026, 08:05:09 ERROR CONNECTION"));
        assert!(line.ends_with("login failed | timeout"));
    }
}
