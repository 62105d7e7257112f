use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};

pub const DEFAULT_TIME_CANCEL: i64 = 30;
pub const DEFAULT_COUNT_TRY: i64 = 60;
pub const DEFAULT_DELAY_TRY: i64 = 60;
pub const DEFAULT_MAX_CONCURRENCY: u32 =
  5;

fn default_time_cancel() -> i64 {
  DEFAULT_TIME_CANCEL
}

fn default_count_try() -> i64 {
  DEFAULT_COUNT_TRY
}

fn default_delay_try() -> i64 {
  DEFAULT_DELAY_TRY
}

fn default_true() -> bool {
  true
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskDto {
  pub id:                String,
  #[serde(default)]
  pub in_work:           bool,
  #[serde(default)]
  pub type_task:         String,
  #[serde(default)]
  pub status:            String,
  #[serde(default)]
  pub date:              String,
  #[serde(default)]
  pub time_slot:         String,
  #[serde(default = "default_time_cancel")]
  pub time_cancel:       i64,
  #[serde(default = "default_count_try")]
  pub count_try:         i64,
  #[serde(default = "default_delay_try")]
  pub delay_try:         i64,
  #[serde(default)]
  pub num_auto:          String,
  #[serde(default)]
  pub driver:            String,
  #[serde(default)]
  pub place:             String,
  #[serde(default)]
  pub index_container:   String,
  #[serde(default)]
  pub number_container:  String,
  #[serde(default)]
  pub release_order:     String,
  #[serde(default)]
  pub contract_terminal: String,
  #[serde(default)]
  pub created_at:        String,
  #[serde(default)]
  pub updated_at:        String,
  #[serde(default)]
  pub position:          Option<i64>
}

impl Default for TaskDto {
  fn default() -> Self {
    Self {
      id:                String::new(),
      in_work:           false,
      type_task:         String::new(),
      status:            String::new(),
      date:              String::new(),
      time_slot:         String::new(),
      time_cancel:       DEFAULT_TIME_CANCEL,
      count_try:         DEFAULT_COUNT_TRY,
      delay_try:         DEFAULT_DELAY_TRY,
      num_auto:          String::new(),
      driver:            String::new(),
      place:             String::new(),
      index_container:   String::new(),
      number_container:  String::new(),
      release_order:     String::new(),
      contract_terminal: String::new(),
      created_at:        String::new(),
      updated_at:        String::new(),
      position:          None
    }
  }
}

impl TaskDto {
  /// Sort key used for display and
  /// sequential execution order.
  pub fn sort_position(&self) -> i64 {
    self.position.unwrap_or(0)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskCreate {
  pub type_task:         String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub status:            Option<String>,
  pub date:              String,
  pub time_slot:         String,
  pub num_auto:          String,
  pub driver:            String,
  #[serde(default)]
  pub place:             String,
  #[serde(default)]
  pub index_container:   String,
  #[serde(default)]
  pub number_container:  String,
  #[serde(default)]
  pub release_order:     String,
  #[serde(default)]
  pub contract_terminal: String,
  #[serde(default = "default_time_cancel")]
  pub time_cancel:       i64,
  #[serde(default = "default_count_try")]
  pub count_try:         i64,
  #[serde(default = "default_delay_try")]
  pub delay_try:         i64
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TaskUpdate {
  pub id:                String,
  #[serde(default)]
  pub in_work:           bool,
  pub type_task:         String,
  pub status:            String,
  pub date:              String,
  pub time_slot:         String,
  pub num_auto:          String,
  pub driver:            String,
  #[serde(default)]
  pub place:             String,
  #[serde(default)]
  pub index_container:   String,
  #[serde(default)]
  pub number_container:  String,
  #[serde(default)]
  pub release_order:     String,
  #[serde(default)]
  pub contract_terminal: String,
  #[serde(default = "default_time_cancel")]
  pub time_cancel:       i64,
  #[serde(default = "default_count_try")]
  pub count_try:         i64,
  #[serde(default = "default_delay_try")]
  pub delay_try:         i64
}

impl From<&TaskDto> for TaskUpdate {
  fn from(task: &TaskDto) -> Self {
    Self {
      id:                task.id.clone(),
      in_work:           task.in_work,
      type_task:         task
        .type_task
        .clone(),
      status:            task.status.clone(),
      date:              task.date.clone(),
      time_slot:         task
        .time_slot
        .clone(),
      num_auto:          task
        .num_auto
        .clone(),
      driver:            task.driver.clone(),
      place:             task.place.clone(),
      index_container:   task
        .index_container
        .clone(),
      number_container:  task
        .number_container
        .clone(),
      release_order:     task
        .release_order
        .clone(),
      contract_terminal: task
        .contract_terminal
        .clone(),
      time_cancel:       task.time_cancel,
      count_try:         task.count_try,
      delay_try:         task.delay_try
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TaskReorderRequest {
  pub task_positions:
    BTreeMap<String, u32>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub enum ReferenceKind {
  #[serde(rename = "operations")]
  Operations,
  #[serde(rename = "statuses")]
  Statuses,
  #[serde(rename = "timeslots")]
  TimeSlots,
  #[serde(rename = "autos")]
  Autos,
  #[serde(rename = "drivers")]
  Drivers,
  #[serde(rename = "contracts")]
  Contracts
}

impl ReferenceKind {
  pub const ALL: [ReferenceKind; 6] = [
    ReferenceKind::Operations,
    ReferenceKind::Statuses,
    ReferenceKind::TimeSlots,
    ReferenceKind::Autos,
    ReferenceKind::Drivers,
    ReferenceKind::Contracts
  ];

  /// Name used in add/delete request
  /// bodies.
  pub fn api_name(self) -> &'static str {
    match self {
      | ReferenceKind::Operations => {
        "operations"
      }
      | ReferenceKind::Statuses => {
        "statuses"
      }
      | ReferenceKind::TimeSlots => {
        "timeslots"
      }
      | ReferenceKind::Autos => "autos",
      | ReferenceKind::Drivers => {
        "drivers"
      }
      | ReferenceKind::Contracts => {
        "contracts"
      }
    }
  }

  /// Field name in the
  /// `GET /api/references` payload.
  pub fn field_name(
    self
  ) -> &'static str {
    match self {
      | ReferenceKind::Operations => {
        "operation_types"
      }
      | ReferenceKind::Statuses => {
        "statuses"
      }
      | ReferenceKind::TimeSlots => {
        "time_slots"
      }
      | ReferenceKind::Autos => {
        "car_numbers"
      }
      | ReferenceKind::Drivers => {
        "drivers"
      }
      | ReferenceKind::Contracts => {
        "terminal_contracts"
      }
    }
  }

  pub fn display_name(
    self
  ) -> &'static str {
    match self {
      | ReferenceKind::Operations => {
        "Operations"
      }
      | ReferenceKind::Statuses => {
        "Statuses"
      }
      | ReferenceKind::TimeSlots => {
        "Time slots"
      }
      | ReferenceKind::Autos => {
        "Vehicle numbers"
      }
      | ReferenceKind::Drivers => {
        "Drivers"
      }
      | ReferenceKind::Contracts => {
        "Terminal contracts"
      }
    }
  }
}

impl fmt::Display for ReferenceKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.api_name())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReferenceKind(
  pub String
);

impl fmt::Display
  for UnknownReferenceKind
{
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "unknown reference type: {}",
      self.0
    )
  }
}

impl std::error::Error
  for UnknownReferenceKind
{
}

impl FromStr for ReferenceKind {
  type Err = UnknownReferenceKind;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let needle =
      s.trim().to_ascii_lowercase();
    ReferenceKind::ALL
      .into_iter()
      .find(|kind| {
        kind.api_name() == needle
          || kind.field_name() == needle
      })
      .ok_or_else(|| {
        UnknownReferenceKind(
          s.to_string()
        )
      })
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct ReferenceItemDto {
  #[serde(default)]
  pub id:          String,
  pub value:       String,
  #[serde(default)]
  pub description: String,
  /// Only an explicit `false` hides the
  /// item from selection.
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub is_active:   Option<bool>,
  #[serde(default)]
  pub created_at:  String,
  #[serde(default)]
  pub updated_at:  String
}

impl ReferenceItemDto {
  pub fn is_selectable(&self) -> bool {
    self.is_active != Some(false)
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct ReferencesDto {
  #[serde(default)]
  pub operation_types:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub statuses:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub car_numbers:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub drivers:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub terminal_contracts:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub time_slots:
    Vec<ReferenceItemDto>,
  #[serde(default)]
  pub updated_at: Option<String>
}

impl ReferencesDto {
  pub fn items(
    &self,
    kind: ReferenceKind
  ) -> &[ReferenceItemDto] {
    match kind {
      | ReferenceKind::Operations => {
        &self.operation_types
      }
      | ReferenceKind::Statuses => {
        &self.statuses
      }
      | ReferenceKind::TimeSlots => {
        &self.time_slots
      }
      | ReferenceKind::Autos => {
        &self.car_numbers
      }
      | ReferenceKind::Drivers => {
        &self.drivers
      }
      | ReferenceKind::Contracts => {
        &self.terminal_contracts
      }
    }
  }

  pub fn items_mut(
    &mut self,
    kind: ReferenceKind
  ) -> &mut Vec<ReferenceItemDto> {
    match kind {
      | ReferenceKind::Operations => {
        &mut self.operation_types
      }
      | ReferenceKind::Statuses => {
        &mut self.statuses
      }
      | ReferenceKind::TimeSlots => {
        &mut self.time_slots
      }
      | ReferenceKind::Autos => {
        &mut self.car_numbers
      }
      | ReferenceKind::Drivers => {
        &mut self.drivers
      }
      | ReferenceKind::Contracts => {
        &mut self.terminal_contracts
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ReferenceAddRequest {
  #[serde(rename = "type")]
  pub kind:        ReferenceKind,
  pub value:       String,
  #[serde(default)]
  pub description: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ReferenceDeleteRequest {
  #[serde(rename = "type")]
  pub kind:    ReferenceKind,
  #[serde(rename = "itemId")]
  pub item_id: String
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
  #[serde(other)]
  Other
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
#[serde(
  rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum LogCategory {
  UserAction,
  TaskExecution,
  BrowserAutomation,
  Settings,
  References,
  DataStorage,
  Connection,
  System,
  #[serde(other)]
  Other
}

impl LogLevel {
  pub const ALL: [LogLevel; 6] = [
    LogLevel::Trace,
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Error,
    LogLevel::Fatal
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | LogLevel::Trace => "TRACE",
      | LogLevel::Debug => "DEBUG",
      | LogLevel::Info => "INFO",
      | LogLevel::Warn => "WARN",
      | LogLevel::Error => "ERROR",
      | LogLevel::Fatal => "FATAL",
      | LogLevel::Other => "OTHER"
    }
  }
}

impl fmt::Display for LogLevel {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogLevel {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let wanted =
      s.trim().to_ascii_uppercase();
    LogLevel::ALL
      .into_iter()
      .find(|level| {
        level.as_str() == wanted
      })
      .ok_or_else(|| {
        format!("unknown log level: {s}")
      })
  }
}

impl LogCategory {
  pub const ALL: [LogCategory; 8] = [
    LogCategory::UserAction,
    LogCategory::TaskExecution,
    LogCategory::BrowserAutomation,
    LogCategory::Settings,
    LogCategory::References,
    LogCategory::DataStorage,
    LogCategory::Connection,
    LogCategory::System
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | LogCategory::UserAction => {
        "USER_ACTION"
      }
      | LogCategory::TaskExecution => {
        "TASK_EXECUTION"
      }
      | LogCategory::BrowserAutomation => {
        "BROWSER_AUTOMATION"
      }
      | LogCategory::Settings => {
        "SETTINGS"
      }
      | LogCategory::References => {
        "REFERENCES"
      }
      | LogCategory::DataStorage => {
        "DATA_STORAGE"
      }
      | LogCategory::Connection => {
        "CONNECTION"
      }
      | LogCategory::System => "SYSTEM",
      | LogCategory::Other => "OTHER"
    }
  }
}

impl fmt::Display for LogCategory {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogCategory {
  type Err = String;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let wanted = s
      .trim()
      .to_ascii_uppercase()
      .replace('-', "_");
    LogCategory::ALL
      .into_iter()
      .find(|category| {
        category.as_str() == wanted
      })
      .ok_or_else(|| {
        format!(
          "unknown log category: {s}"
        )
      })
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct LogEntryDto {
  #[serde(default)]
  pub id:          String,
  pub timestamp:   String,
  pub level:       LogLevel,
  pub category:    LogCategory,
  pub message:     String,
  #[serde(default)]
  pub details:     String,
  #[serde(default)]
  pub task_id:     String,
  #[serde(default)]
  pub user_action: bool,
  #[serde(default)]
  pub error:       String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct AutomationStartRequest {
  #[serde(rename = "taskIds")]
  pub task_ids:        Vec<String>,
  pub sequential:      bool,
  pub parallel:        bool,
  #[serde(
    rename = "maxConcurrency",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub max_concurrency: Option<u32>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct AutomationResponse {
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SuccessResponse {
  #[serde(default = "default_true")]
  pub success: bool,
  #[serde(default)]
  pub message: Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct SettingsDto {
  #[serde(default)]
  pub site_url: String,
  #[serde(default)]
  pub login: String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub refresh_interval: i64,
  #[serde(default)]
  pub connection_status: bool,
  #[serde(default)]
  pub last_connection_test:
    Option<String>,
  #[serde(default)]
  pub default_execution_attempts: i64,
  #[serde(default)]
  pub default_delay_try: i64,
  #[serde(default)]
  pub element_timeout: i64,
  #[serde(default)]
  pub use_headless: bool,
  #[serde(default)]
  pub save_credentials: bool,
  #[serde(default)]
  pub browser_width: i64,
  #[serde(default)]
  pub browser_height: i64,
  #[serde(default)]
  pub browser_path: String,
  #[serde(default)]
  pub slot_check_attempts: i64,
  #[serde(default)]
  pub slot_check_interval: i64,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SettingsUpdate {
  pub site_url: String,
  pub login: String,
  pub password: String,
  pub refresh_interval: i64,
  pub default_execution_attempts: i64,
  pub default_delay_try: i64,
  pub element_timeout: i64,
  pub use_headless: bool,
  pub save_credentials: bool,
  pub browser_width: i64,
  pub browser_height: i64,
  pub browser_path: String,
  pub slot_check_attempts: i64,
  pub slot_check_interval: i64
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ConnectionTestRequest {
  pub site_url: String,
  pub login: String,
  pub password: String,
  pub refresh_interval: i64,
  pub default_execution_attempts: i64,
  pub default_delay_try: i64,
  pub element_timeout: i64,
  pub use_headless: bool,
  pub save_credentials: bool,
  pub browser_width: i64,
  pub browser_height: i64,
  pub browser_path: String,
  pub slot_check_attempts: i64,
  pub slot_check_interval: i64
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct ConnectionTestResponse {
  pub success:   bool,
  #[serde(default)]
  pub message:   String,
  #[serde(default)]
  pub error:     String,
  #[serde(default)]
  pub duration:  i64,
  #[serde(default)]
  pub tested_at: String
}
