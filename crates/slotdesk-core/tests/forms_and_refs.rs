mod support;

use chrono::NaiveDate;
use serde_json::json;
use slotdesk_core::app::{App, ConnectionState};
use slotdesk_core::error::{PanelError, ValidationError};
use slotdesk_core::form::{SettingsForm, TaskField};
use slotdesk_shared::{ConnectionTestResponse, ReferenceKind};
use support::{FakeBackend, item, references, task};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

fn panel() -> App<FakeBackend> {
    let backend = FakeBackend::with_tasks(vec![task("a", 1)]);
    backend.state().refs = references();
    App::new(backend)
}

#[tokio::test]
async fn adding_a_reference_posts_it_and_reloads_the_cache() {
    let mut app = panel();
    app.load_references().await.expect("load");
    app.backend().forget_calls();

    app.add_reference(ReferenceKind::Drivers, "  A123BC ", "")
        .await
        .expect("add");

    assert_eq!(
        app.backend().endpoints(),
        vec!["add_reference", "list_references"]
    );
    assert_eq!(
        app.backend().last_body("add_reference"),
        Some(json!({ "type": "drivers", "value": "A123BC", "description": "" }))
    );
    assert!(app
        .references()
        .find_value(ReferenceKind::Drivers, "A123BC")
        .is_some());
    assert!(app.notices().last().is_some_and(|n| !n.is_error()));
}

#[tokio::test]
async fn duplicate_reference_is_reported_on_the_value_field() {
    let mut app = panel();
    app.load_references().await.expect("load");
    let before = app.references().items(ReferenceKind::Drivers).to_vec();
    app.backend().forget_calls();

    let result = app.add_reference(ReferenceKind::Drivers, "Ivanov", "").await;

    assert!(result.is_err());
    assert_eq!(app.backend().endpoints(), vec!["add_reference"]);
    assert_eq!(app.references().items(ReferenceKind::Drivers), before.as_slice());
    let notice = app.notices().last().expect("notice");
    assert!(notice.is_error());
    assert_eq!(notice.field, Some("value"));
    assert!(notice.message.contains("already exists"));
}

#[tokio::test]
async fn blank_reference_value_never_reaches_the_backend() {
    let mut app = panel();
    let result = app.add_reference(ReferenceKind::Autos, "   ", "spare").await;

    assert!(matches!(
        result,
        Err(PanelError::Validation(ValidationError::Required("value")))
    ));
    assert!(app.backend().calls().is_empty());
}

#[tokio::test]
async fn deleting_a_reference_reloads_the_cache() {
    let mut app = panel();
    app.load_references().await.expect("load");

    app.delete_reference(ReferenceKind::Drivers, "drivers-1")
        .await
        .expect("delete");

    assert_eq!(
        app.backend().last_body("delete_reference"),
        Some(json!({ "type": "drivers", "itemId": "drivers-1" }))
    );
    assert!(app.references().items(ReferenceKind::Drivers).is_empty());
}

#[tokio::test]
async fn edit_form_shows_inactive_stored_value_but_requires_a_new_choice() {
    let mut app = panel();
    let mut stale = task("a", 1);
    stale.driver = "Petrov".to_string();
    {
        let mut state = app.backend().state();
        state.tasks = vec![stale];
        state
            .refs
            .drivers
            .push(item("drivers-2", "Petrov", Some(false)));
    }
    app.load_tasks().await.expect("load tasks");

    let form = app.open_edit_task_form("a", today()).await.expect("open");
    assert_eq!(form.driver.selected(), None);
    assert_eq!(form.driver.display_value(), Some("Petrov"));
    assert!(!form.driver.has_option("Petrov"));
    assert_eq!(form.num_auto.selected(), Some("A123BC"));

    let result = app.submit_task_form().await;

    assert!(matches!(
        result,
        Err(PanelError::Validation(ValidationError::Required("driver")))
    ));
    assert_eq!(app.backend().count("update_task"), 0);
    assert_eq!(app.notices().last().and_then(|n| n.field), Some("driver"));
    assert!(app.task_form().is_some());
}

#[tokio::test]
async fn new_task_form_creates_and_reloads() {
    let mut app = panel();
    app.load_tasks().await.expect("load");

    let form = app.open_new_task_form(today()).await.expect("open");
    for (field, value) in [
        (TaskField::Auto, "A123BC"),
        (TaskField::Driver, "Ivanov"),
        (TaskField::Type, "Import"),
        (TaskField::TimeSlot, "10:00-12:00"),
        (TaskField::Date, "05.11"),
    ] {
        form.set(field, value, today()).expect("set field");
    }
    assert_eq!(form.date, NaiveDate::from_ymd_opt(2026, 11, 5));
    assert!(form.set(TaskField::Driver, "Nobody", today()).is_err());

    app.submit_task_form().await.expect("submit");

    let body = app.backend().last_body("create_task").expect("create sent");
    assert_eq!(body["date"], json!("05.11"));
    assert_eq!(body["driver"], json!("Ivanov"));
    assert_eq!(body["time_cancel"], json!(30));
    assert!(body.get("status").is_none());
    assert!(app.task_form().is_none());
    assert_eq!(app.tasks().len(), 2);
}

#[tokio::test]
async fn accepted_create_closes_the_form_even_when_the_reload_fails() {
    let mut app = panel();
    app.load_tasks().await.expect("load");
    let form = app.open_new_task_form(today()).await.expect("open");
    for (field, value) in [
        (TaskField::Auto, "A123BC"),
        (TaskField::Driver, "Ivanov"),
        (TaskField::Type, "Import"),
        (TaskField::TimeSlot, "10:00-12:00"),
    ] {
        form.set(field, value, today()).expect("set field");
    }
    app.backend().fail("list_tasks", 503);

    app.submit_task_form().await.expect("write accepted");

    assert_eq!(app.backend().count("create_task"), 1);
    assert_eq!(app.backend().state().tasks.len(), 2);
    assert!(app.task_form().is_none());
    let messages: Vec<&str> = app.notices().pending().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"task saved"));
    let last = app.notices().last().expect("reload notice");
    assert!(last.is_error());
    assert!(last.message.starts_with("failed to load tasks"));

    app.backend().heal("list_tasks");
    app.load_tasks().await.expect("reload");
    assert_eq!(app.tasks().len(), 2);
}

#[tokio::test]
async fn accepted_reference_add_is_not_reported_as_a_failed_save() {
    let mut app = panel();
    app.load_references().await.expect("load");
    app.backend().fail("list_references", 503);

    app.add_reference(ReferenceKind::Drivers, "Sidorov", "")
        .await
        .expect("write accepted");

    assert!(app
        .backend()
        .state()
        .refs
        .drivers
        .iter()
        .any(|item| item.value == "Sidorov"));
    assert!(!app
        .notices()
        .pending()
        .any(|n| n.message.starts_with("failed to save record")));
    assert!(app
        .notices()
        .last()
        .is_some_and(|n| n.message.starts_with("failed to load references")));
}

#[tokio::test]
async fn new_task_form_requires_vehicle_before_anything_else() {
    let mut app = panel();
    app.open_new_task_form(today()).await.expect("open");

    let result = app.submit_task_form().await;

    assert!(matches!(
        result,
        Err(PanelError::Validation(ValidationError::Required("vehicle number")))
    ));
    assert_eq!(app.backend().count("create_task"), 0);
}

#[tokio::test]
async fn reference_reload_drops_a_selection_that_disappeared() {
    let mut app = panel();
    let form = app.open_new_task_form(today()).await.expect("open");
    form.set(TaskField::Driver, "Ivanov", today()).expect("pick");

    app.backend().state().refs.drivers.clear();
    app.load_references().await.expect("reload");

    let form = app.task_form().expect("still open");
    assert_eq!(form.driver.selected(), None);
    assert!(form.driver.options().is_empty());
}

#[tokio::test]
async fn saving_settings_applies_defaults_and_drops_unsaved_credentials() {
    let mut app = panel();
    let form = SettingsForm {
        site_url: "https://slots.example".to_string(),
        login: "operator".to_string(),
        password: "secret".to_string(),
        refresh_interval: "abc".to_string(),
        browser_width: "1920px".to_string(),
        ..SettingsForm::default()
    };

    app.save_settings(&form).await.expect("save");

    let body = app.backend().last_body("save_settings").expect("sent");
    assert_eq!(body["login"], json!(""));
    assert_eq!(body["password"], json!(""));
    assert_eq!(body["refresh_interval"], json!(60));
    assert_eq!(body["browser_width"], json!(1920));
    assert_eq!(body["browser_height"], json!(720));
    assert_eq!(body["use_headless"], json!(false));
    assert_eq!(
        app.settings().map(|s| s.site_url.as_str()),
        Some("https://slots.example")
    );
}

#[tokio::test]
async fn connection_test_needs_credentials_and_tracks_the_outcome() {
    let mut app = panel();
    let mut form = SettingsForm {
        site_url: "https://slots.example".to_string(),
        ..SettingsForm::default()
    };

    let missing = app.test_connection(&form).await;
    assert!(matches!(
        missing,
        Err(PanelError::Validation(ValidationError::Required("login")))
    ));
    assert_eq!(app.backend().count("test_connection"), 0);

    form.login = "operator".to_string();
    form.password = "secret".to_string();
    let passed = app.test_connection(&form).await.expect("test");
    assert!(passed.success);
    assert_eq!(app.connection(), ConnectionState::Connected);
    let body = app.backend().last_body("test_connection").expect("sent");
    assert_eq!(body["refresh_interval"], json!(10));
    assert_eq!(body["default_execution_attempts"], json!(50));

    app.backend().state().connection = Some(ConnectionTestResponse {
        success: false,
        message: String::new(),
        error: "bad password".to_string(),
        duration: 0,
        tested_at: String::new(),
    });
    let failed = app.test_connection(&form).await.expect("completed test");
    assert!(!failed.success);
    assert_eq!(app.connection(), ConnectionState::Disconnected);
    assert!(app
        .notices()
        .last()
        .is_some_and(|n| n.message.contains("bad password")));
}
