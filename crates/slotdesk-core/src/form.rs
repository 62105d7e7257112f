//! Editable projections of tasks and settings.
//!
//! Forms never own data: they are built from a record plus the reference
//! cache, edited field by field, and turned back into a request payload.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use slotdesk_shared::{
    ConnectionTestRequest, DEFAULT_COUNT_TRY, DEFAULT_DELAY_TRY, DEFAULT_TIME_CANCEL,
    ReferenceKind, SettingsDto, SettingsUpdate, TaskCreate, TaskDto, TaskUpdate,
};
use tracing::debug;

use crate::datetime::{decode_day_month, encode_day_month, parse_date_entry};
use crate::error::ValidationError;
use crate::references::{ReferenceCache, option_label};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// A select bound to one reference kind.
///
/// `stored` is the raw value of the record being edited and is kept for
/// display even when it is no longer offered; only `selected` is ever
/// submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectField {
    kind: ReferenceKind,
    options: Vec<SelectOption>,
    selected: Option<String>,
    stored: Option<String>,
}

impl SelectField {
    pub fn new(kind: ReferenceKind) -> Self {
        Self {
            kind,
            options: Vec::new(),
            selected: None,
            stored: None,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn stored(&self) -> Option<&str> {
        self.stored.as_deref()
    }

    /// What the operator sees: the live selection, else the stored raw
    /// value.
    pub fn display_value(&self) -> Option<&str> {
        self.selected().or(self.stored())
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    /// Seeds the field from a saved record. The value becomes the
    /// selection once a populate finds it among the options.
    pub fn load_stored(&mut self, value: &str) {
        if value.is_empty() {
            self.stored = None;
            self.selected = None;
        } else {
            self.stored = Some(value.to_string());
            self.selected = Some(value.to_string());
        }
    }

    /// Rebuilds the option list from the cache, keeping the previous
    /// selection only when it is still offered.
    pub fn populate(&mut self, cache: &ReferenceCache) {
        self.options = cache
            .selectable(self.kind)
            .into_iter()
            .map(|item| SelectOption {
                value: item.value.clone(),
                label: option_label(item),
            })
            .collect();

        if let Some(previous) = self.selected.take() {
            if self.has_option(&previous) {
                self.selected = Some(previous);
            } else {
                debug!(kind = %self.kind, value = %previous, "selection no longer offered; reverting to placeholder");
            }
        }
    }

    pub fn select(&mut self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            self.selected = None;
            return Ok(());
        }
        if !self.has_option(value) {
            return Err(ValidationError::Malformed {
                field,
                expected: "reference value",
                value: value.to_string(),
            });
        }
        self.selected = Some(value.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    fn submitted(&self) -> String {
        self.selected.clone().unwrap_or_default()
    }
}

/// Task form field names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Type,
    Status,
    Date,
    TimeSlot,
    Auto,
    Driver,
    Place,
    IndexContainer,
    NumberContainer,
    ReleaseOrder,
    Contract,
    TimeCancel,
    CountTry,
    DelayTry,
    InWork,
}

impl TaskField {
    pub const ALL: [TaskField; 15] = [
        TaskField::Type,
        TaskField::Status,
        TaskField::Date,
        TaskField::TimeSlot,
        TaskField::Auto,
        TaskField::Driver,
        TaskField::Place,
        TaskField::IndexContainer,
        TaskField::NumberContainer,
        TaskField::ReleaseOrder,
        TaskField::Contract,
        TaskField::TimeCancel,
        TaskField::CountTry,
        TaskField::DelayTry,
        TaskField::InWork,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskField::Type => "type",
            TaskField::Status => "status",
            TaskField::Date => "date",
            TaskField::TimeSlot => "slot",
            TaskField::Auto => "auto",
            TaskField::Driver => "driver",
            TaskField::Place => "place",
            TaskField::IndexContainer => "index",
            TaskField::NumberContainer => "container",
            TaskField::ReleaseOrder => "release",
            TaskField::Contract => "contract",
            TaskField::TimeCancel => "cancel",
            TaskField::CountTry => "tries",
            TaskField::DelayTry => "delay",
            TaskField::InWork => "inwork",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let field = match key.as_str() {
            "type" | "type_task" => TaskField::Type,
            "status" => TaskField::Status,
            "date" => TaskField::Date,
            "slot" | "time_slot" => TaskField::TimeSlot,
            "auto" | "num_auto" => TaskField::Auto,
            "driver" => TaskField::Driver,
            "place" => TaskField::Place,
            "index" | "index_container" => TaskField::IndexContainer,
            "container" | "number_container" => TaskField::NumberContainer,
            "release" | "release_order" => TaskField::ReleaseOrder,
            "contract" | "contract_terminal" => TaskField::Contract,
            "cancel" | "time_cancel" => TaskField::TimeCancel,
            "tries" | "count_try" => TaskField::CountTry,
            "delay" | "delay_try" => TaskField::DelayTry,
            "inwork" | "in_work" => TaskField::InWork,
            other => return Err(format!("unknown task field: {other}")),
        };
        Ok(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    task_id: Option<String>,
    pub type_task: SelectField,
    pub status: SelectField,
    pub time_slot: SelectField,
    pub num_auto: SelectField,
    pub driver: SelectField,
    pub contract_terminal: SelectField,
    pub date: Option<NaiveDate>,
    pub place: String,
    pub index_container: String,
    pub number_container: String,
    pub release_order: String,
    pub time_cancel: i64,
    pub count_try: i64,
    pub delay_try: i64,
    pub in_work: bool,
}

impl TaskForm {
    /// Empty form for a new task; the date defaults to `today`.
    pub fn new_blank(today: NaiveDate) -> Self {
        Self {
            task_id: None,
            type_task: SelectField::new(ReferenceKind::Operations),
            status: SelectField::new(ReferenceKind::Statuses),
            time_slot: SelectField::new(ReferenceKind::TimeSlots),
            num_auto: SelectField::new(ReferenceKind::Autos),
            driver: SelectField::new(ReferenceKind::Drivers),
            contract_terminal: SelectField::new(ReferenceKind::Contracts),
            date: Some(today),
            place: String::new(),
            index_container: String::new(),
            number_container: String::new(),
            release_order: String::new(),
            time_cancel: DEFAULT_TIME_CANCEL,
            count_try: DEFAULT_COUNT_TRY,
            delay_try: DEFAULT_DELAY_TRY,
            in_work: false,
        }
    }

    /// Form for editing `task`. The stored `DD.MM` date is read in
    /// `today`'s year.
    pub fn from_task(task: &TaskDto, today: NaiveDate) -> Self {
        let mut form = Self::new_blank(today);
        form.task_id = Some(task.id.clone());
        form.type_task.load_stored(&task.type_task);
        form.status.load_stored(&task.status);
        form.time_slot.load_stored(&task.time_slot);
        form.num_auto.load_stored(&task.num_auto);
        form.driver.load_stored(&task.driver);
        form.contract_terminal.load_stored(&task.contract_terminal);
        form.date = decode_day_month(&task.date, today.year());
        form.place = task.place.clone();
        form.index_container = task.index_container.clone();
        form.number_container = task.number_container.clone();
        form.release_order = task.release_order.clone();
        form.time_cancel = task.time_cancel;
        form.count_try = task.count_try;
        form.delay_try = task.delay_try;
        form.in_work = task.in_work;
        form
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn selects(&self) -> [(TaskField, &SelectField); 6] {
        [
            (TaskField::Type, &self.type_task),
            (TaskField::Status, &self.status),
            (TaskField::TimeSlot, &self.time_slot),
            (TaskField::Auto, &self.num_auto),
            (TaskField::Driver, &self.driver),
            (TaskField::Contract, &self.contract_terminal),
        ]
    }

    /// Repopulates every select from the cache.
    pub fn populate(&mut self, cache: &ReferenceCache) {
        for select in [
            &mut self.type_task,
            &mut self.status,
            &mut self.time_slot,
            &mut self.num_auto,
            &mut self.driver,
            &mut self.contract_terminal,
        ] {
            select.populate(cache);
        }
    }

    pub fn set(&mut self, field: TaskField, raw: &str, today: NaiveDate) -> Result<(), ValidationError> {
        let value = raw.trim();
        match field {
            TaskField::Type => self.type_task.select("type", value),
            TaskField::Status => self.status.select("status", value),
            TaskField::TimeSlot => self.time_slot.select("time slot", value),
            TaskField::Auto => self.num_auto.select("vehicle number", value),
            TaskField::Driver => self.driver.select("driver", value),
            TaskField::Contract => self.contract_terminal.select("terminal contract", value),
            TaskField::Date => {
                if value.is_empty() {
                    self.date = None;
                    return Ok(());
                }
                let date = parse_date_entry(value, today).ok_or_else(|| ValidationError::Malformed {
                    field: "date",
                    expected: "date (DD.MM or YYYY-MM-DD)",
                    value: value.to_string(),
                })?;
                self.date = Some(date);
                Ok(())
            }
            TaskField::Place => {
                self.place = value.to_string();
                Ok(())
            }
            TaskField::IndexContainer => {
                self.index_container = value.to_string();
                Ok(())
            }
            TaskField::NumberContainer => {
                self.number_container = value.to_string();
                Ok(())
            }
            TaskField::ReleaseOrder => {
                self.release_order = value.to_string();
                Ok(())
            }
            TaskField::TimeCancel => {
                self.time_cancel = parse_number("cancel time", value)?;
                Ok(())
            }
            TaskField::CountTry => {
                self.count_try = parse_number("attempt count", value)?;
                Ok(())
            }
            TaskField::DelayTry => {
                self.delay_try = parse_number("attempt delay", value)?;
                Ok(())
            }
            TaskField::InWork => {
                self.in_work = parse_flag("in work", value)?;
                Ok(())
            }
        }
    }

    /// Checks the fields the backend cannot do without. Vehicle and driver
    /// are checked first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.num_auto.selected().is_none() {
            return Err(ValidationError::Required("vehicle number"));
        }
        if self.driver.selected().is_none() {
            return Err(ValidationError::Required("driver"));
        }
        if self.type_task.selected().is_none() {
            return Err(ValidationError::Required("type"));
        }
        if self.date.is_none() {
            return Err(ValidationError::Required("date"));
        }
        if self.time_slot.selected().is_none() {
            return Err(ValidationError::Required("time slot"));
        }
        Ok(())
    }

    fn encoded_date(&self) -> String {
        self.date.map(encode_day_month).unwrap_or_default()
    }

    pub fn to_create(&self) -> Result<TaskCreate, ValidationError> {
        self.validate()?;
        Ok(TaskCreate {
            type_task: self.type_task.submitted(),
            status: self.status.selected().map(str::to_string),
            date: self.encoded_date(),
            time_slot: self.time_slot.submitted(),
            num_auto: self.num_auto.submitted(),
            driver: self.driver.submitted(),
            place: self.place.clone(),
            index_container: self.index_container.clone(),
            number_container: self.number_container.clone(),
            release_order: self.release_order.clone(),
            contract_terminal: self.contract_terminal.submitted(),
            time_cancel: self.time_cancel,
            count_try: self.count_try,
            delay_try: self.delay_try,
        })
    }

    pub fn to_update(&self) -> Result<TaskUpdate, ValidationError> {
        let id = self.task_id.clone().ok_or(ValidationError::Required("id"))?;
        self.validate()?;
        Ok(TaskUpdate {
            id,
            in_work: self.in_work,
            type_task: self.type_task.submitted(),
            status: self.status.submitted(),
            date: self.encoded_date(),
            time_slot: self.time_slot.submitted(),
            num_auto: self.num_auto.submitted(),
            driver: self.driver.submitted(),
            place: self.place.clone(),
            index_container: self.index_container.clone(),
            number_container: self.number_container.clone(),
            release_order: self.release_order.clone(),
            contract_terminal: self.contract_terminal.submitted(),
            time_cancel: self.time_cancel,
            count_try: self.count_try,
            delay_try: self.delay_try,
        })
    }
}

const DISPLAY_BROWSER_WIDTH: i64 = 1280;
const DISPLAY_BROWSER_HEIGHT: i64 = 720;
const DISPLAY_EXECUTION_ATTEMPTS: i64 = 50;
const DISPLAY_ELEMENT_TIMEOUT: i64 = 10;
const DISPLAY_REFRESH_INTERVAL: i64 = 60;

const SAVE_REFRESH_INTERVAL: i64 = 60;
const SAVE_EXECUTION_ATTEMPTS: i64 = 60;
const SAVE_DELAY_TRY: i64 = 60;
const SAVE_SLOT_CHECK_ATTEMPTS: i64 = 10;
const SAVE_SLOT_CHECK_INTERVAL: i64 = 5;

const TEST_REFRESH_INTERVAL: i64 = 10;

/// Settings as text fields, the way an operator edits them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub site_url: String,
    pub login: String,
    pub password: String,
    pub refresh_interval: String,
    pub default_execution_attempts: String,
    pub default_delay_try: String,
    pub element_timeout: String,
    pub browser_width: String,
    pub browser_height: String,
    pub browser_path: String,
    pub slot_check_attempts: String,
    pub slot_check_interval: String,
    pub save_credentials: bool,
}

impl SettingsForm {
    pub const KEYS: [&'static str; 13] = [
        "site_url",
        "login",
        "password",
        "refresh_interval",
        "default_execution_attempts",
        "default_delay_try",
        "element_timeout",
        "browser_width",
        "browser_height",
        "browser_path",
        "slot_check_attempts",
        "slot_check_interval",
        "save_credentials",
    ];

    /// Projects loaded settings for display. Credentials only show when
    /// they are meant to be saved; empty geometry, attempts, timeout and
    /// refresh fields fall back to display defaults.
    pub fn from_settings(settings: &SettingsDto) -> Self {
        let (login, password) = if settings.save_credentials {
            (settings.login.clone(), settings.password.clone())
        } else {
            (String::new(), String::new())
        };

        Self {
            site_url: settings.site_url.clone(),
            login,
            password,
            refresh_interval: number_or(settings.refresh_interval, DISPLAY_REFRESH_INTERVAL),
            default_execution_attempts: number_or(
                settings.default_execution_attempts,
                DISPLAY_EXECUTION_ATTEMPTS,
            ),
            default_delay_try: number_text(settings.default_delay_try),
            element_timeout: number_or(settings.element_timeout, DISPLAY_ELEMENT_TIMEOUT),
            browser_width: number_or(settings.browser_width, DISPLAY_BROWSER_WIDTH),
            browser_height: number_or(settings.browser_height, DISPLAY_BROWSER_HEIGHT),
            browser_path: settings.browser_path.clone(),
            slot_check_attempts: number_text(settings.slot_check_attempts),
            slot_check_interval: number_text(settings.slot_check_interval),
            save_credentials: settings.save_credentials,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "site_url" => self.site_url.clone(),
            "login" => self.login.clone(),
            "password" => self.password.clone(),
            "refresh_interval" => self.refresh_interval.clone(),
            "default_execution_attempts" => self.default_execution_attempts.clone(),
            "default_delay_try" => self.default_delay_try.clone(),
            "element_timeout" => self.element_timeout.clone(),
            "browser_width" => self.browser_width.clone(),
            "browser_height" => self.browser_height.clone(),
            "browser_path" => self.browser_path.clone(),
            "slot_check_attempts" => self.slot_check_attempts.clone(),
            "slot_check_interval" => self.slot_check_interval.clone(),
            "save_credentials" => self.save_credentials.to_string(),
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ValidationError> {
        let value = raw.trim().to_string();
        let slot = match key {
            "site_url" | "url" => &mut self.site_url,
            "login" => &mut self.login,
            "password" => &mut self.password,
            "refresh_interval" | "refresh" => &mut self.refresh_interval,
            "default_execution_attempts" | "attempts" => &mut self.default_execution_attempts,
            "default_delay_try" | "delay" => &mut self.default_delay_try,
            "element_timeout" | "timeout" => &mut self.element_timeout,
            "browser_width" | "width" => &mut self.browser_width,
            "browser_height" | "height" => &mut self.browser_height,
            "browser_path" => &mut self.browser_path,
            "slot_check_attempts" => &mut self.slot_check_attempts,
            "slot_check_interval" => &mut self.slot_check_interval,
            "save_credentials" => {
                self.save_credentials = parse_flag("save credentials", &value)?;
                return Ok(());
            }
            _ => {
                return Err(ValidationError::Malformed {
                    field: "settings",
                    expected: "settings key",
                    value: key.to_string(),
                });
            }
        };
        *slot = value;
        Ok(())
    }

    /// Payload for `POST /api/settings`: numbers parse or default, the
    /// browser is never headless, credentials are dropped unless saved.
    pub fn to_update(&self) -> SettingsUpdate {
        let (login, password) = if self.save_credentials {
            (self.login.clone(), self.password.clone())
        } else {
            (String::new(), String::new())
        };

        SettingsUpdate {
            site_url: self.site_url.clone(),
            login,
            password,
            refresh_interval: parse_int_or(&self.refresh_interval, SAVE_REFRESH_INTERVAL),
            default_execution_attempts: parse_int_or(
                &self.default_execution_attempts,
                SAVE_EXECUTION_ATTEMPTS,
            ),
            default_delay_try: parse_int_or(&self.default_delay_try, SAVE_DELAY_TRY),
            element_timeout: parse_int_or(&self.element_timeout, DISPLAY_ELEMENT_TIMEOUT),
            use_headless: false,
            save_credentials: self.save_credentials,
            browser_width: parse_int_or(&self.browser_width, DISPLAY_BROWSER_WIDTH),
            browser_height: parse_int_or(&self.browser_height, DISPLAY_BROWSER_HEIGHT),
            browser_path: self.browser_path.clone(),
            slot_check_attempts: parse_int_or(&self.slot_check_attempts, SAVE_SLOT_CHECK_ATTEMPTS),
            slot_check_interval: parse_int_or(&self.slot_check_interval, SAVE_SLOT_CHECK_INTERVAL),
        }
    }

    /// Payload for a connection test. Site URL and credentials are
    /// required; attempts, timeout and slot checks use fixed test values.
    pub fn to_connection_test(&self) -> Result<ConnectionTestRequest, ValidationError> {
        if self.site_url.trim().is_empty() {
            return Err(ValidationError::Required("site URL"));
        }
        if self.login.trim().is_empty() {
            return Err(ValidationError::Required("login"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }

        Ok(ConnectionTestRequest {
            site_url: self.site_url.trim().to_string(),
            login: self.login.trim().to_string(),
            password: self.password.clone(),
            refresh_interval: parse_int_or(&self.refresh_interval, TEST_REFRESH_INTERVAL),
            default_execution_attempts: DISPLAY_EXECUTION_ATTEMPTS,
            default_delay_try: parse_int_or(&self.default_delay_try, SAVE_DELAY_TRY),
            element_timeout: DISPLAY_ELEMENT_TIMEOUT,
            use_headless: false,
            save_credentials: self.save_credentials,
            browser_width: parse_int_or(&self.browser_width, DISPLAY_BROWSER_WIDTH),
            browser_height: parse_int_or(&self.browser_height, DISPLAY_BROWSER_HEIGHT),
            browser_path: self.browser_path.clone(),
            slot_check_attempts: SAVE_SLOT_CHECK_ATTEMPTS,
            slot_check_interval: SAVE_SLOT_CHECK_INTERVAL,
        })
    }
}

/// Reads the leading integer of `raw` (optional sign, then digits).
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Leading integer, or `default` when there is none or it is zero.
pub fn parse_int_or(raw: &str, default: i64) -> i64 {
    parse_leading_int(raw).filter(|n| *n != 0).unwrap_or(default)
}

fn number_or(value: i64, default: i64) -> String {
    let shown = if value == 0 { default } else { value };
    shown.to_string()
}

fn number_text(value: i64) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value.parse::<i64>().map_err(|_| ValidationError::Malformed {
        field,
        expected: "number",
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "on" | "true" => Ok(true),
        "0" | "n" | "no" | "off" | "false" | "" => Ok(false),
        _ => Err(ValidationError::Malformed {
            field,
            expected: "yes/no flag",
            value: value.to_string(),
        }),
    }
}
