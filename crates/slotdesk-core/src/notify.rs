use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{info, warn};

pub const NOTICE_TTL: Duration = Duration::from_secs(3);
const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Form field to highlight, if the failure is tied to one.
    pub field: Option<&'static str>,
    pub raised_at: Instant,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= NOTICE_TTL
    }
}

/// Transient operator notifications, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    pending: VecDeque<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Success, message.into(), None);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message.into(), None);
    }

    pub fn error_on_field(&mut self, message: impl Into<String>, field: &'static str) {
        self.push(NoticeKind::Error, message.into(), Some(field));
    }

    fn push(&mut self, kind: NoticeKind, message: String, field: Option<&'static str>) {
        match kind {
            NoticeKind::Success => info!(notice = %message, "operator notice"),
            NoticeKind::Error => warn!(notice = %message, field, "operator error notice"),
        }
        if self.pending.len() == MAX_PENDING {
            self.pending.pop_front();
        }
        self.pending.push_back(Notice {
            kind,
            message,
            field,
            raised_at: Instant::now(),
        });
    }

    pub fn pending(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }

    pub fn last(&self) -> Option<&Notice> {
        self.pending.back()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops notices older than the display lifetime.
    pub fn expire(&mut self, now: Instant) {
        self.pending.retain(|notice| !notice.is_expired(now));
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{MAX_PENDING, NoticeKind, Notifier};

    #[test]
    fn notices_expire_after_three_seconds() {
        let mut notifier = Notifier::new();
        notifier.success("saved");
        let raised = notifier.last().expect("notice").raised_at;

        notifier.expire(raised + Duration::from_millis(2_900));
        assert!(!notifier.is_empty());
        notifier.expire(raised + Duration::from_secs(3));
        assert!(notifier.is_empty());
    }

    #[test]
    fn queue_is_bounded_and_keeps_newest() {
        let mut notifier = Notifier::new();
        for n in 0..=MAX_PENDING {
            notifier.error(format!("failure {n}"));
        }
        let drained = notifier.drain();
        assert_eq!(drained.len(), MAX_PENDING);
        assert_eq!(drained[0].message, "failure 1");
        assert!(drained.iter().all(|n| n.kind == NoticeKind::Error));
        assert!(notifier.is_empty());
    }

    #[test]
    fn field_errors_carry_highlight() {
        let mut notifier = Notifier::new();
        notifier.error_on_field("already exists", "value");
        let notice = notifier.last().expect("notice");
        assert!(notice.is_error());
        assert_eq!(notice.field, Some("value"));
    }
}
