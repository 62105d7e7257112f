//! Single-row drag gesture.
//!
//! At most one row is dragged at a time; hovering only changes the
//! highlighted target. A drop computes the new order but never touches the
//! store, the caller commits it after `end()`.

use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        dragged: String,
        over: Option<String>,
    },
    Dropped {
        order: Vec<String>,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Dropped(Vec<String>),
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn dragged(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { dragged, .. } => Some(dragged),
            _ => None,
        }
    }

    /// Row currently highlighted as the drop target.
    pub fn highlighted(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { over, .. } => over.as_deref(),
            _ => None,
        }
    }

    /// Starts a drag. Any earlier gesture that never ended is replaced.
    pub fn start(&mut self, id: &str) {
        if !matches!(self.state, DragState::Idle) {
            debug!(previous = ?self.state, "replacing stale drag gesture");
        }
        self.state = DragState::Dragging {
            dragged: id.to_string(),
            over: None,
        };
    }

    pub fn over(&mut self, target: &str) {
        if let DragState::Dragging { dragged, over } = &mut self.state {
            if dragged == target {
                *over = None;
            } else {
                trace!(target, "drag over");
                *over = Some(target.to_string());
            }
        }
    }

    pub fn leave(&mut self, target: &str) {
        if let DragState::Dragging { over, .. } = &mut self.state
            && over.as_deref() == Some(target)
        {
            *over = None;
        }
    }

    /// Drops the dragged row on `target`. Returns the new order when one
    /// row actually moved; a drop on itself or on a row missing from
    /// `current_order` cancels the gesture instead.
    pub fn drop_on(&mut self, target: &str, current_order: &[String]) -> Option<&[String]> {
        let DragState::Dragging { dragged, .. } = &self.state else {
            return None;
        };
        let dragged = dragged.clone();

        match move_single(current_order, &dragged, target) {
            Some(order) => {
                debug!(dragged = %dragged, target, "row dropped");
                self.state = DragState::Dropped { order };
            }
            None => {
                debug!(dragged = %dragged, target, "drop ignored");
                self.state = DragState::Cancelled;
            }
        }

        match &self.state {
            DragState::Dropped { order } => Some(order),
            _ => None,
        }
    }

    /// Finishes the gesture and returns to idle.
    pub fn end(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dropped { order } => DragOutcome::Dropped(order),
            _ => DragOutcome::Cancelled,
        }
    }
}

/// Moves `dragged` next to `target`: after it when the dragged row came
/// from above, before it otherwise. Every other row keeps its relative
/// order.
pub fn move_single(order: &[String], dragged: &str, target: &str) -> Option<Vec<String>> {
    if dragged == target {
        return None;
    }
    let from = order.iter().position(|id| id == dragged)?;
    let to = order.iter().position(|id| id == target)?;

    let mut next: Vec<String> = order.to_vec();
    let moving = next.remove(from);
    let anchor = next.iter().position(|id| id == target)?;
    let insert_at = if from < to { anchor + 1 } else { anchor };
    next.insert(insert_at, moving);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::{DragOutcome, DragSession, DragState, move_single};

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn moving_down_lands_after_target() {
        let order = ids(&["a", "b", "c", "d"]);
        assert_eq!(move_single(&order, "a", "c"), Some(ids(&["b", "c", "a", "d"])));
    }

    #[test]
    fn moving_up_lands_before_target() {
        let order = ids(&["a", "b", "c", "d"]);
        assert_eq!(move_single(&order, "d", "b"), Some(ids(&["a", "d", "b", "c"])));
    }

    #[test]
    fn self_or_unknown_drop_is_rejected() {
        let order = ids(&["a", "b"]);
        assert_eq!(move_single(&order, "a", "a"), None);
        assert_eq!(move_single(&order, "a", "zz"), None);
        assert_eq!(move_single(&order, "zz", "a"), None);
    }

    #[test]
    fn hover_only_changes_highlight() {
        let mut session = DragSession::new();
        session.start("a");
        session.over("b");
        assert_eq!(session.highlighted(), Some("b"));
        session.over("a");
        assert_eq!(session.highlighted(), None);
        session.over("c");
        session.leave("c");
        assert_eq!(session.highlighted(), None);
        assert_eq!(session.dragged(), Some("a"));
    }

    #[test]
    fn drag_end_without_drop_cancels() {
        let mut session = DragSession::new();
        session.start("a");
        session.over("b");
        assert_eq!(session.end(), DragOutcome::Cancelled);
        assert_eq!(session.state(), &DragState::Idle);
    }

    #[test]
    fn drop_then_end_reports_order() {
        let order = ids(&["2", "1"]);
        let mut session = DragSession::new();
        session.start("1");
        session.over("2");
        assert!(session.drop_on("2", &order).is_some());
        assert_eq!(session.end(), DragOutcome::Dropped(ids(&["1", "2"])));
        assert_eq!(session.state(), &DragState::Idle);
    }

    #[test]
    fn drop_on_self_cancels() {
        let order = ids(&["a", "b"]);
        let mut session = DragSession::new();
        session.start("a");
        assert!(session.drop_on("a", &order).is_none());
        assert_eq!(session.state(), &DragState::Cancelled);
        assert_eq!(session.end(), DragOutcome::Cancelled);
    }

    #[test]
    fn new_start_replaces_stale_gesture() {
        let mut session = DragSession::new();
        session.start("a");
        session.start("b");
        assert_eq!(session.dragged(), Some("b"));
    }
}
