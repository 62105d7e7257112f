//! Scripted in-memory backend for driving `App` end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use slotdesk_core::api::{ApiResult, Backend};
use slotdesk_core::error::ApiError;
use slotdesk_shared::{
    AutomationResponse, AutomationStartRequest, ConnectionTestRequest, ConnectionTestResponse,
    LogEntryDto, ReferenceAddRequest, ReferenceDeleteRequest, ReferenceItemDto, ReferenceKind,
    ReferencesDto, SettingsDto, SettingsUpdate, SuccessResponse, TaskCreate, TaskDto,
    TaskReorderRequest, TaskUpdate,
};

/// One request the panel made, with its JSON body (`Null` when bodiless).
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub endpoint: &'static str,
    pub body: Value,
}

#[derive(Debug, Default)]
pub struct State {
    pub tasks: Vec<TaskDto>,
    pub refs: ReferencesDto,
    pub logs: Vec<LogEntryDto>,
    pub settings: SettingsDto,
    pub connection: Option<ConnectionTestResponse>,
    pub calls: Vec<Call>,
    failures: HashMap<&'static str, (u16, String)>,
    next_id: u32,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn with_tasks(tasks: Vec<TaskDto>) -> Self {
        let backend = Self::default();
        backend.state().tasks = tasks;
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake backend lock")
    }

    /// Every later call to `endpoint` answers with `status`.
    pub fn fail(&self, endpoint: &'static str, status: u16) {
        self.fail_with(endpoint, status, "");
    }

    /// Like `fail`, with a response body.
    pub fn fail_with(&self, endpoint: &'static str, status: u16, body: &str) {
        self.state()
            .failures
            .insert(endpoint, (status, body.to_string()));
    }

    pub fn heal(&self, endpoint: &'static str) {
        self.state().failures.remove(endpoint);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn endpoints(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(|call| call.endpoint).collect()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .count()
    }

    pub fn last_body(&self, endpoint: &str) -> Option<Value> {
        self.state()
            .calls
            .iter()
            .rev()
            .find(|call| call.endpoint == endpoint)
            .map(|call| call.body.clone())
    }

    pub fn forget_calls(&self) {
        self.state().calls.clear();
    }

    fn record<T: Serialize>(&self, endpoint: &'static str, body: Option<&T>) -> ApiResult<()> {
        let mut state = self.state();
        let body = body
            .map(|b| serde_json::to_value(b).expect("serializable body"))
            .unwrap_or(Value::Null);
        state.calls.push(Call { endpoint, body });
        match state.failures.get(endpoint) {
            Some((status, body)) => Err(ApiError::status(*status, body.clone())),
            None => Ok(()),
        }
    }
}

fn ok() -> SuccessResponse {
    SuccessResponse {
        success: true,
        message: None,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_tasks(&self) -> ApiResult<Vec<TaskDto>> {
        self.record::<()>("list_tasks", None)?;
        Ok(self.state().tasks.clone())
    }

    async fn create_task(&self, task: &TaskCreate) -> ApiResult<SuccessResponse> {
        self.record("create_task", Some(task))?;
        let mut state = self.state();
        state.next_id += 1;
        let position = i64::try_from(state.tasks.len()).expect("small list") + 1;
        let created = TaskDto {
            id: format!("new-{}", state.next_id),
            type_task: task.type_task.clone(),
            status: task.status.clone().unwrap_or_default(),
            date: task.date.clone(),
            time_slot: task.time_slot.clone(),
            num_auto: task.num_auto.clone(),
            driver: task.driver.clone(),
            position: Some(position),
            ..TaskDto::default()
        };
        state.tasks.push(created);
        Ok(ok())
    }

    async fn update_task(&self, task: &TaskUpdate) -> ApiResult<SuccessResponse> {
        self.record("update_task", Some(task))?;
        let mut state = self.state();
        let stored = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| ApiError::status(404, "task not found"))?;
        stored.in_work = task.in_work;
        stored.type_task = task.type_task.clone();
        stored.status = task.status.clone();
        stored.date = task.date.clone();
        stored.time_slot = task.time_slot.clone();
        stored.num_auto = task.num_auto.clone();
        stored.driver = task.driver.clone();
        Ok(ok())
    }

    async fn delete_task(&self, id: &str) -> ApiResult<SuccessResponse> {
        self.record("delete_task", Some(&id))?;
        self.state().tasks.retain(|t| t.id != id);
        Ok(ok())
    }

    async fn reorder_tasks(&self, request: &TaskReorderRequest) -> ApiResult<SuccessResponse> {
        self.record("reorder_tasks", Some(request))?;
        let mut state = self.state();
        for task in &mut state.tasks {
            if let Some(position) = request.task_positions.get(&task.id) {
                task.position = Some(i64::from(*position));
            }
        }
        Ok(ok())
    }

    async fn list_references(&self) -> ApiResult<ReferencesDto> {
        self.record::<()>("list_references", None)?;
        Ok(self.state().refs.clone())
    }

    async fn add_reference(&self, request: &ReferenceAddRequest) -> ApiResult<SuccessResponse> {
        self.record("add_reference", Some(request))?;
        let mut state = self.state();
        if state
            .refs
            .items(request.kind)
            .iter()
            .any(|item| item.value == request.value)
        {
            return Err(ApiError::status(409, "duplicate value"));
        }
        state.next_id += 1;
        let id = format!("ref-{}", state.next_id);
        state.refs.items_mut(request.kind).push(ReferenceItemDto {
            id,
            value: request.value.clone(),
            description: request.description.clone(),
            ..ReferenceItemDto::default()
        });
        Ok(ok())
    }

    async fn delete_reference(
        &self,
        request: &ReferenceDeleteRequest,
    ) -> ApiResult<SuccessResponse> {
        self.record("delete_reference", Some(request))?;
        self.state()
            .refs
            .items_mut(request.kind)
            .retain(|item| item.id != request.item_id);
        Ok(ok())
    }

    async fn start_automation(
        &self,
        request: &AutomationStartRequest,
    ) -> ApiResult<AutomationResponse> {
        self.record("start_automation", Some(request))?;
        Ok(AutomationResponse {
            success: true,
            message: Some("started".to_string()),
        })
    }

    async fn stop_automation(&self) -> ApiResult<AutomationResponse> {
        self.record::<()>("stop_automation", None)?;
        Ok(AutomationResponse {
            success: true,
            message: None,
        })
    }

    async fn list_logs(&self) -> ApiResult<Vec<LogEntryDto>> {
        self.record::<()>("list_logs", None)?;
        Ok(self.state().logs.clone())
    }

    async fn get_settings(&self) -> ApiResult<SettingsDto> {
        self.record::<()>("get_settings", None)?;
        Ok(self.state().settings.clone())
    }

    async fn save_settings(&self, settings: &SettingsUpdate) -> ApiResult<SuccessResponse> {
        self.record("save_settings", Some(settings))?;
        Ok(ok())
    }

    async fn test_connection(
        &self,
        request: &ConnectionTestRequest,
    ) -> ApiResult<ConnectionTestResponse> {
        self.record("test_connection", Some(request))?;
        Ok(self.state().connection.clone().unwrap_or(ConnectionTestResponse {
            success: true,
            message: String::new(),
            error: String::new(),
            duration: 1200,
            tested_at: String::new(),
        }))
    }
}

pub fn task(id: &str, position: i64) -> TaskDto {
    TaskDto {
        id: id.to_string(),
        type_task: "Import".to_string(),
        status: "New".to_string(),
        date: "19.10".to_string(),
        time_slot: "10:00-12:00".to_string(),
        num_auto: "A123BC".to_string(),
        driver: "Ivanov".to_string(),
        position: Some(position),
        ..TaskDto::default()
    }
}

pub fn item(id: &str, value: &str, active: Option<bool>) -> ReferenceItemDto {
    ReferenceItemDto {
        id: id.to_string(),
        value: value.to_string(),
        is_active: active,
        ..ReferenceItemDto::default()
    }
}

/// One active item per kind matching the values `task()` uses.
pub fn references() -> ReferencesDto {
    let mut refs = ReferencesDto::default();
    for (kind, value) in [
        (ReferenceKind::Operations, "Import"),
        (ReferenceKind::Statuses, "New"),
        (ReferenceKind::TimeSlots, "10:00-12:00"),
        (ReferenceKind::Autos, "A123BC"),
        (ReferenceKind::Drivers, "Ivanov"),
        (ReferenceKind::Contracts, "C-1"),
    ] {
        refs.items_mut(kind)
            .push(item(&format!("{}-1", kind.api_name()), value, None));
    }
    refs.updated_at = Some("2026-10-19T08:00:00".to_string());
    refs
}
