use std::fmt;

use slotdesk_shared::{AutomationResponse, AutomationStartRequest, DEFAULT_MAX_CONCURRENCY};
use tracing::{info, instrument, warn};

use crate::api::Backend;
use crate::error::{PanelError, PanelResult};
use crate::form::parse_leading_int;
use crate::task_store::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomationStatus {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for AutomationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationStatus::Stopped => f.write_str("stopped"),
            AutomationStatus::Running => f.write_str("running"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Sequential,
    Parallel { max_concurrency: u32 },
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Sequential => f.write_str("one after another"),
            RunMode::Parallel { max_concurrency } => {
                write!(f, "in parallel (at most {max_concurrency} at once)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRun {
    pub task_count: usize,
    pub mode: RunMode,
    pub response: AutomationResponse,
}

/// Starts and stops automation runs over the in-work tasks. Failures are
/// reported, never retried.
#[derive(Debug, Clone, Default)]
pub struct AutomationDispatcher {
    status: AutomationStatus,
}

impl AutomationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> AutomationStatus {
        self.status
    }

    /// `concurrency` is the raw operator input; it only matters for a
    /// parallel run.
    #[instrument(skip(self, backend, store, concurrency))]
    pub async fn start<B>(
        &mut self,
        backend: &B,
        store: &TaskStore,
        sequential: bool,
        concurrency: Option<&str>,
    ) -> PanelResult<StartedRun>
    where
        B: Backend + ?Sized,
    {
        let task_ids: Vec<String> = store.in_work().map(|task| task.id.clone()).collect();
        if task_ids.is_empty() {
            warn!("no in-work tasks; automation not started");
            return Err(PanelError::NothingSelected);
        }

        let mode = if sequential {
            RunMode::Sequential
        } else {
            RunMode::Parallel {
                max_concurrency: parse_concurrency(concurrency.unwrap_or_default()),
            }
        };
        let request = build_start_request(task_ids, mode);

        let response = backend.start_automation(&request).await?;
        self.status = AutomationStatus::Running;
        info!(count = request.task_ids.len(), %mode, "automation started");

        Ok(StartedRun {
            task_count: request.task_ids.len(),
            mode,
            response,
        })
    }

    #[instrument(skip(self, backend))]
    pub async fn stop<B>(&mut self, backend: &B) -> PanelResult<AutomationResponse>
    where
        B: Backend + ?Sized,
    {
        let response = backend.stop_automation().await?;
        self.status = AutomationStatus::Stopped;
        info!("automation stopped");
        Ok(response)
    }
}

pub fn build_start_request(task_ids: Vec<String>, mode: RunMode) -> AutomationStartRequest {
    match mode {
        RunMode::Sequential => AutomationStartRequest {
            task_ids,
            sequential: true,
            parallel: false,
            max_concurrency: None,
        },
        RunMode::Parallel { max_concurrency } => AutomationStartRequest {
            task_ids,
            sequential: false,
            parallel: true,
            max_concurrency: Some(max_concurrency),
        },
    }
}

/// Leading positive integer of the operator's input, else the default
/// bound.
pub fn parse_concurrency(raw: &str) -> u32 {
    parse_leading_int(raw)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(DEFAULT_MAX_CONCURRENCY)
}

#[cfg(test)]
mod tests {
    use super::{RunMode, build_start_request, parse_concurrency};

    #[test]
    fn concurrency_reads_leading_digits_or_defaults() {
        assert_eq!(parse_concurrency("7"), 7);
        assert_eq!(parse_concurrency("7x"), 7);
        assert_eq!(parse_concurrency(""), 5);
        assert_eq!(parse_concurrency("abc"), 5);
        assert_eq!(parse_concurrency("0"), 5);
        assert_eq!(parse_concurrency("-2"), 5);
    }

    #[test]
    fn parallel_request_carries_bound() {
        let request = build_start_request(vec!["a".to_string()], RunMode::Parallel { max_concurrency: 3 });
        assert!(request.parallel);
        assert!(!request.sequential);
        assert_eq!(request.max_concurrency, Some(3));

        let request = build_start_request(vec!["a".to_string()], RunMode::Sequential);
        assert!(request.sequential);
        assert_eq!(request.max_concurrency, None);
    }
}
