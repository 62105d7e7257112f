//! Client-side mirror of the backend task list.
//!
//! The store owns the display/execution order. Local state only changes
//! from a full snapshot, a server-acknowledged reorder, or an optimistic
//! in-work toggle that is compensated by a resync when the backend
//! rejects it.

use std::collections::BTreeMap;

use slotdesk_shared::{
    SuccessResponse, TaskCreate, TaskDto, TaskReorderRequest, TaskUpdate,
};
use tracing::{debug, info, instrument, warn};

use crate::api::Backend;
use crate::error::{PanelError, PanelResult};
use crate::sequencer::{RequestSequencer, Ticket};

#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: Vec<TaskDto>,
    sequencer: RequestSequencer,
    loaded: bool,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            sequencer: RequestSequencer::new("tasks"),
            loaded: false,
        }
    }

    pub fn tasks(&self) -> &[TaskDto] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&TaskDto> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.id.clone()).collect()
    }

    pub fn in_work(&self) -> impl Iterator<Item = &TaskDto> {
        self.tasks.iter().filter(|task| task.in_work)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn begin_load(&mut self) -> Ticket {
        self.sequencer.issue()
    }

    /// Replaces the collection with a backend snapshot unless a newer load
    /// was issued after `ticket`.
    pub fn apply_snapshot(&mut self, ticket: Ticket, mut tasks: Vec<TaskDto>) -> bool {
        if !self.sequencer.accept(ticket) {
            return false;
        }
        sort_by_position(&mut tasks);
        debug!(count = tasks.len(), ticket = ticket.value(), "applied task snapshot");
        self.tasks = tasks;
        self.loaded = true;
        true
    }

    #[instrument(skip(self, backend))]
    pub async fn load<B>(&mut self, backend: &B) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        let ticket = self.begin_load();
        let tasks = backend.list_tasks().await.map_err(|err| {
            warn!(error = %err, "task load failed; keeping previous list");
            err
        })?;
        self.apply_snapshot(ticket, tasks);
        Ok(())
    }

    #[instrument(skip(self, backend))]
    pub async fn toggle_in_work<B>(&mut self, backend: &B, id: &str, value: bool) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        let before = self.tasks.clone();
        let payload = {
            let task = self
                .tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| PanelError::UnknownTask(id.to_string()))?;
            task.in_work = value;
            TaskUpdate::from(&*task)
        };
        debug!(task_id = id, value, "applied optimistic in-work flag");

        match backend.update_task(&payload).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(task_id = id, error = %err, "in-work update rejected; resyncing");
                self.resync_or_restore(backend, before).await;
                Err(err.into())
            }
        }
    }

    /// Commits a new order. Local positions change only after the backend
    /// acknowledges the full position map.
    #[instrument(skip(self, backend, new_order), fields(count = new_order.len()))]
    pub async fn reorder<B>(&mut self, backend: &B, new_order: &[String]) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        let request = TaskReorderRequest {
            task_positions: positions_for(new_order),
        };

        if let Err(err) = backend.reorder_tasks(&request).await {
            warn!(error = %err, "reorder rejected; reloading authoritative order");
            if let Err(reload_err) = self.load(backend).await {
                warn!(error = %reload_err, "reload after failed reorder also failed");
            }
            return Err(err.into());
        }

        for task in &mut self.tasks {
            if let Some(position) = request.task_positions.get(&task.id) {
                task.position = Some(i64::from(*position));
            }
        }
        sort_by_position(&mut self.tasks);
        info!(count = request.task_positions.len(), "task order updated");
        Ok(())
    }

    #[instrument(skip(self, backend, task), fields(num_auto = %task.num_auto))]
    pub async fn create<B>(&self, backend: &B, task: &TaskCreate) -> PanelResult<SuccessResponse>
    where
        B: Backend + ?Sized,
    {
        Ok(backend.create_task(task).await?)
    }

    #[instrument(skip(self, backend, task), fields(task_id = %task.id))]
    pub async fn update<B>(&self, backend: &B, task: &TaskUpdate) -> PanelResult<SuccessResponse>
    where
        B: Backend + ?Sized,
    {
        Ok(backend.update_task(task).await?)
    }

    #[instrument(skip(self, backend))]
    pub async fn delete<B>(&self, backend: &B, id: &str) -> PanelResult<SuccessResponse>
    where
        B: Backend + ?Sized,
    {
        Ok(backend.delete_task(id).await?)
    }

    async fn resync_or_restore<B>(&mut self, backend: &B, before: Vec<TaskDto>)
    where
        B: Backend + ?Sized,
    {
        if let Err(err) = self.load(backend).await {
            warn!(error = %err, "resync failed; restoring pre-mutation list");
            self.tasks = before;
        }
    }
}

/// 1-based position per id, by index in `order`. A repeated id keeps its
/// last index; the backend judges validity.
pub fn positions_for(order: &[String]) -> BTreeMap<String, u32> {
    let mut positions = BTreeMap::new();
    for (index, id) in order.iter().enumerate() {
        let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
        positions.insert(id.clone(), position);
    }
    positions
}

/// Stable ascending sort; missing positions count as 0.
pub fn sort_by_position(tasks: &mut [TaskDto]) {
    tasks.sort_by_key(TaskDto::sort_position);
}

#[cfg(test)]
mod tests {
    use super::positions_for;

    #[test]
    fn positions_are_one_based_in_submitted_order() {
        let order = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let positions = positions_for(&order);
        assert_eq!(positions.get("b"), Some(&1));
        assert_eq!(positions.get("a"), Some(&2));
        assert_eq!(positions.get("c"), Some(&3));
    }

    #[test]
    fn repeated_id_keeps_last_index() {
        let order = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let positions = positions_for(&order);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions.get("a"), Some(&3));
    }
}
