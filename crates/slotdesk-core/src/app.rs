//! Application state for one operator session.
//!
//! `App` owns every component and the backend handle. Operations report
//! their outcome as a notice and also return it, so a caller can decide
//! whether to stop.

use chrono::NaiveDate;
use slotdesk_shared::{
    ConnectionTestResponse, ReferenceKind, SettingsDto, SettingsUpdate,
};
use tracing::{debug, info, instrument, warn};

use crate::api::Backend;
use crate::dispatcher::{AutomationDispatcher, AutomationStatus, StartedRun};
use crate::error::{ErrorClass, PanelError, PanelResult};
use crate::form::{SettingsForm, TaskForm};
use crate::logs::LogViewer;
use crate::notify::Notifier;
use crate::references::ReferenceCache;
use crate::reorder::{DragOutcome, DragSession};
use crate::task_store::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Tasks,
    Settings,
    References,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

pub struct App<B> {
    backend: B,
    tasks: TaskStore,
    references: ReferenceCache,
    logs: LogViewer,
    dispatcher: AutomationDispatcher,
    drag: DragSession,
    notices: Notifier,
    tab: Tab,
    reference_kind: ReferenceKind,
    task_form: Option<TaskForm>,
    settings: Option<SettingsDto>,
    connection: ConnectionState,
    concurrency: Option<String>,
}

impl<B: Backend> App<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tasks: TaskStore::new(),
            references: ReferenceCache::new(),
            logs: LogViewer::new(),
            dispatcher: AutomationDispatcher::new(),
            drag: DragSession::new(),
            notices: Notifier::new(),
            tab: Tab::Tasks,
            reference_kind: ReferenceKind::Operations,
            task_form: None,
            settings: None,
            connection: ConnectionState::Unknown,
            concurrency: None,
        }
    }

    /// Raw parallel-run bound as the operator typed it.
    pub fn with_concurrency(mut self, raw: Option<String>) -> Self {
        self.concurrency = raw;
        self
    }

    pub fn set_concurrency(&mut self, raw: Option<String>) {
        self.concurrency = raw;
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn references(&self) -> &ReferenceCache {
        &self.references
    }

    pub fn logs(&self) -> &LogViewer {
        &self.logs
    }

    pub fn logs_mut(&mut self) -> &mut LogViewer {
        &mut self.logs
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn notices(&self) -> &Notifier {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notifier {
        &mut self.notices
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn reference_kind(&self) -> ReferenceKind {
        self.reference_kind
    }

    pub fn automation_status(&self) -> AutomationStatus {
        self.dispatcher.status()
    }

    pub fn settings(&self) -> Option<&SettingsDto> {
        self.settings.as_ref()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn task_form(&self) -> Option<&TaskForm> {
        self.task_form.as_ref()
    }

    pub fn task_form_mut(&mut self) -> Option<&mut TaskForm> {
        self.task_form.as_mut()
    }

    pub fn close_task_form(&mut self) {
        self.task_form = None;
    }

    /// First load of a session: tasks and logs.
    #[instrument(skip(self))]
    pub async fn init(&mut self) -> PanelResult<()> {
        let tasks = self.load_tasks().await;
        let logs = self.load_logs().await;
        tasks.and(logs)
    }

    #[instrument(skip(self))]
    pub async fn switch_tab(&mut self, tab: Tab) -> PanelResult<()> {
        debug!(?tab, "switching tab");
        self.tab = tab;
        match tab {
            Tab::Tasks => self.load_tasks().await,
            Tab::Settings => self.load_settings().await.map(|_| ()),
            Tab::References => self.load_references().await,
        }
    }

    pub fn select_reference_kind(&mut self, kind: ReferenceKind) {
        self.reference_kind = kind;
    }

    pub async fn load_tasks(&mut self) -> PanelResult<()> {
        let result = self.tasks.load(&self.backend).await;
        self.report_failure(result, "failed to load tasks")
    }

    /// Reloads the reference cache and refreshes an open task form.
    pub async fn load_references(&mut self) -> PanelResult<()> {
        let result = self.references.load(&self.backend).await;
        if result.is_ok()
            && let Some(form) = self.task_form.as_mut()
        {
            form.populate(&self.references);
        }
        self.report_failure(result, "failed to load references")
    }

    pub async fn load_logs(&mut self) -> PanelResult<()> {
        let result = self.logs.load(&self.backend).await;
        self.report_failure(result, "failed to load logs")
    }

    pub async fn load_settings(&mut self) -> PanelResult<&SettingsDto> {
        match self.backend.get_settings().await {
            Ok(settings) => {
                let stored = self.settings.insert(settings);
                Ok(&*stored)
            }
            Err(err) => {
                let err = PanelError::from(err);
                self.notices.error(format!("failed to load settings: {err}"));
                Err(err)
            }
        }
    }

    /// Task refresh tick; only runs while the task tab is showing.
    pub async fn poll_tasks(&mut self) -> PanelResult<bool> {
        if self.tab != Tab::Tasks {
            return Ok(false);
        }
        self.load_tasks().await.map(|_| true)
    }

    pub async fn poll_logs(&mut self) -> PanelResult<()> {
        self.load_logs().await
    }

    #[instrument(skip(self))]
    pub async fn toggle_in_work(&mut self, id: &str, value: bool) -> PanelResult<()> {
        let result = self.tasks.toggle_in_work(&self.backend, id, value).await;
        self.report_failure(result, "failed to update task")
    }

    pub fn begin_drag(&mut self, id: &str) {
        self.drag.start(id);
    }

    pub fn drag_over(&mut self, target: &str) {
        self.drag.over(target);
    }

    pub fn drag_leave(&mut self, target: &str) {
        self.drag.leave(target);
    }

    /// Drops the dragged row on `target` against the displayed order.
    pub fn drop_on(&mut self, target: &str) -> bool {
        let order = self.tasks.ids();
        self.drag.drop_on(target, &order).is_some()
    }

    /// Ends the gesture; a drop is committed through the store.
    #[instrument(skip(self))]
    pub async fn end_drag(&mut self) -> PanelResult<bool> {
        let DragOutcome::Dropped(order) = self.drag.end() else {
            debug!("drag ended without a move");
            return Ok(false);
        };

        match self.tasks.reorder(&self.backend, &order).await {
            Ok(()) => {
                self.notices.success("task order updated");
                Ok(true)
            }
            Err(err) => {
                self.notices.error(format!("failed to update task order: {err}"));
                Err(err)
            }
        }
    }

    /// Full gesture for one move: drag `dragged`, hover and drop on
    /// `target`, end.
    pub async fn move_task(&mut self, dragged: &str, target: &str) -> PanelResult<bool> {
        if self.tasks.get(dragged).is_none() {
            let err = PanelError::UnknownTask(dragged.to_string());
            self.notices.error(err.to_string());
            return Err(err);
        }
        self.begin_drag(dragged);
        self.drag_over(target);
        self.drop_on(target);
        self.end_drag().await
    }

    /// Opens a blank task form, loading references first if needed.
    pub async fn open_new_task_form(&mut self, today: NaiveDate) -> PanelResult<&mut TaskForm> {
        self.ensure_references().await?;
        let mut form = TaskForm::new_blank(today);
        form.populate(&self.references);
        Ok(self.task_form.insert(form))
    }

    pub async fn open_edit_task_form(
        &mut self,
        id: &str,
        today: NaiveDate,
    ) -> PanelResult<&mut TaskForm> {
        let Some(task) = self.tasks.get(id) else {
            let err = PanelError::UnknownTask(id.to_string());
            self.notices.error(err.to_string());
            return Err(err);
        };
        let mut form = TaskForm::from_task(task, today);
        self.ensure_references().await?;
        form.populate(&self.references);
        Ok(self.task_form.insert(form))
    }

    /// Submits the open task form as a create or an update; the form is
    /// closed once the backend accepts the write, even if the reload that
    /// follows fails.
    #[instrument(skip(self))]
    pub async fn submit_task_form(&mut self) -> PanelResult<()> {
        let Some(form) = self.task_form.as_ref() else {
            return Ok(());
        };

        let result = match form.task_id() {
            Some(_) => match form.to_update() {
                Ok(update) => self.tasks.update(&self.backend, &update).await.map(|_| ()),
                Err(err) => Err(err.into()),
            },
            None => match form.to_create() {
                Ok(create) => self.tasks.create(&self.backend, &create).await.map(|_| ()),
                Err(err) => Err(err.into()),
            },
        };

        match result {
            Ok(()) => {
                self.task_form = None;
                self.notices.success("task saved");
                // A failed reload is reported on its own notice.
                let _ = self.load_tasks().await;
                Ok(())
            }
            Err(PanelError::Validation(err)) => {
                self.notices.error_on_field(err.to_string(), err.field());
                Err(err.into())
            }
            Err(err) => {
                self.notices.error(format!("failed to save task: {err}"));
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_task(&mut self, id: &str) -> PanelResult<()> {
        match self.tasks.delete(&self.backend, id).await {
            Ok(_) => {
                self.notices.success("task deleted");
                let _ = self.load_tasks().await;
                Ok(())
            }
            Err(err) => {
                self.notices.error(format!("failed to delete task: {err}"));
                Err(err)
            }
        }
    }

    /// Adds a reference item. A duplicate value is reported against the
    /// value field and leaves the cache as it was.
    #[instrument(skip(self, description))]
    pub async fn add_reference(
        &mut self,
        kind: ReferenceKind,
        value: &str,
        description: &str,
    ) -> PanelResult<()> {
        let result = self
            .references
            .add(&self.backend, kind, value, description)
            .await;

        match result {
            Ok(_) => {
                self.notices
                    .success(format!("record \"{}\" added to {}", value.trim(), kind.display_name()));
                let _ = self.load_references().await;
                Ok(())
            }
            Err(PanelError::Validation(err)) => {
                self.notices.error_on_field(err.to_string(), err.field());
                Err(err.into())
            }
            Err(err) => {
                match err.class() {
                    ErrorClass::Conflict => self.notices.error_on_field(
                        format!("a record with this value already exists: \"{}\"", value.trim()),
                        "value",
                    ),
                    ErrorClass::BadInput => self.notices.error(format!("validation error: {err}")),
                    _ => self.notices.error(format!("failed to save record: {err}")),
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_reference(&mut self, kind: ReferenceKind, item_id: &str) -> PanelResult<()> {
        match self.references.delete(&self.backend, kind, item_id).await {
            Ok(_) => {
                self.notices.success("record deleted");
                let _ = self.load_references().await;
                Ok(())
            }
            Err(err) => {
                self.notices.error(format!("failed to delete record: {err}"));
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn start_automation(&mut self, sequential: bool) -> PanelResult<StartedRun> {
        let result = self
            .dispatcher
            .start(&self.backend, &self.tasks, sequential, self.concurrency.as_deref())
            .await;

        match result {
            Ok(run) => {
                self.notices.success(format!(
                    "automation started for {} tasks, running {}",
                    run.task_count, run.mode
                ));
                Ok(run)
            }
            Err(PanelError::NothingSelected) => {
                self.notices.error(PanelError::NothingSelected.to_string());
                Err(PanelError::NothingSelected)
            }
            Err(err) => {
                self.notices.error(format!("failed to start automation: {err}"));
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn stop_automation(&mut self) -> PanelResult<()> {
        match self.dispatcher.stop(&self.backend).await {
            Ok(_) => {
                self.notices.success("automation stopped");
                Ok(())
            }
            Err(err) => {
                self.notices.error(format!("failed to stop automation: {err}"));
                Err(err)
            }
        }
    }

    #[instrument(skip(self, form))]
    pub async fn save_settings(&mut self, form: &SettingsForm) -> PanelResult<()> {
        let update = form.to_update();
        match self.backend.save_settings(&update).await {
            Ok(_) => {
                let previous = self.settings.take().unwrap_or_default();
                self.settings = Some(apply_saved(previous, &update));
                info!("settings saved");
                self.notices.success("settings saved");
                Ok(())
            }
            Err(err) => {
                let err = PanelError::from(err);
                self.notices.error(format!("failed to save settings: {err}"));
                Err(err)
            }
        }
    }

    /// Runs a backend connection test. A completed test that reports
    /// failure is returned as `Ok` with the indicator set to disconnected.
    #[instrument(skip(self, form))]
    pub async fn test_connection(
        &mut self,
        form: &SettingsForm,
    ) -> PanelResult<ConnectionTestResponse> {
        let request = match form.to_connection_test() {
            Ok(request) => request,
            Err(err) => {
                self.notices.error_on_field(err.to_string(), err.field());
                return Err(err.into());
            }
        };

        match self.backend.test_connection(&request).await {
            Ok(response) if response.success => {
                self.connection = ConnectionState::Connected;
                self.notices
                    .success(format!("connection succeeded {}", response.message).trim_end().to_string());
                Ok(response)
            }
            Ok(response) => {
                self.connection = ConnectionState::Disconnected;
                let reason = if response.error.is_empty() {
                    "unknown error"
                } else {
                    response.error.as_str()
                };
                self.notices.error(format!("connection failed: {reason}"));
                Ok(response)
            }
            Err(err) => {
                self.connection = ConnectionState::Disconnected;
                let err = PanelError::from(err);
                self.notices.error(format!("connection test failed: {err}"));
                Err(err)
            }
        }
    }

    async fn ensure_references(&mut self) -> PanelResult<()> {
        let result = self.references.ensure_loaded(&self.backend).await;
        self.report_failure(result, "failed to load references")
    }

    fn report_failure(&mut self, result: PanelResult<()>, what: &str) -> PanelResult<()> {
        if let Err(err) = &result {
            warn!(error = %err, "{what}");
            self.notices.error(format!("{what}: {err}"));
        }
        result
    }
}

fn apply_saved(mut settings: SettingsDto, update: &SettingsUpdate) -> SettingsDto {
    settings.site_url = update.site_url.clone();
    settings.login = update.login.clone();
    settings.password = update.password.clone();
    settings.refresh_interval = update.refresh_interval;
    settings.default_execution_attempts = update.default_execution_attempts;
    settings.default_delay_try = update.default_delay_try;
    settings.element_timeout = update.element_timeout;
    settings.use_headless = update.use_headless;
    settings.save_credentials = update.save_credentials;
    settings.browser_width = update.browser_width;
    settings.browser_height = update.browser_height;
    settings.browser_path = update.browser_path.clone();
    settings.slot_check_attempts = update.slot_check_attempts;
    settings.slot_check_interval = update.slot_check_interval;
    settings
}
