use std::collections::HashSet;

use slotdesk_shared::{LogCategory, LogEntryDto, LogLevel};
use tracing::{debug, instrument};

use crate::api::Backend;
use crate::error::PanelResult;
use crate::sequencer::{RequestSequencer, Ticket};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub category: Option<LogCategory>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntryDto) -> bool {
        self.level.is_none_or(|level| entry.level == level)
            && self.category.is_none_or(|category| entry.category == category)
    }

    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.category.is_none()
    }
}

/// Latest polled batch of backend log entries plus the local view state.
#[derive(Debug, Clone)]
pub struct LogViewer {
    entries: Vec<LogEntryDto>,
    filter: LogFilter,
    shown: HashSet<String>,
    sequencer: RequestSequencer,
}

impl Default for LogViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogViewer {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            filter: LogFilter::default(),
            shown: HashSet::new(),
            sequencer: RequestSequencer::new("logs"),
        }
    }

    pub fn entries(&self) -> &[LogEntryDto] {
        &self.entries
    }

    pub fn filter(&self) -> LogFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: LogFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&LogEntryDto> {
        self.entries
            .iter()
            .filter(|entry| self.filter.matches(entry))
            .collect()
    }

    /// Empties the local view. The next poll fills it again.
    pub fn clear(&mut self) {
        debug!(dropped = self.entries.len(), "cleared log view");
        self.entries.clear();
    }

    pub fn begin_load(&mut self) -> Ticket {
        self.sequencer.issue()
    }

    pub fn apply_snapshot(&mut self, ticket: Ticket, entries: Vec<LogEntryDto>) -> bool {
        if !self.sequencer.accept(ticket) {
            return false;
        }
        self.entries = entries;
        true
    }

    #[instrument(skip(self, backend))]
    pub async fn load<B>(&mut self, backend: &B) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        let ticket = self.begin_load();
        let entries = backend.list_logs().await?;
        self.apply_snapshot(ticket, entries);
        Ok(())
    }

    /// Visible entries not handed out before, oldest first. Each entry is
    /// returned once.
    pub fn take_unseen(&mut self) -> Vec<LogEntryDto> {
        let mut fresh = Vec::new();
        for entry in &self.entries {
            if !self.filter.matches(entry) {
                continue;
            }
            if self.shown.insert(entry_key(entry)) {
                fresh.push(entry.clone());
            }
        }
        fresh
    }
}

fn entry_key(entry: &LogEntryDto) -> String {
    if entry.id.is_empty() {
        format!("{}|{}|{}", entry.timestamp, entry.category, entry.message)
    } else {
        entry.id.clone()
    }
}
