//! Integration tests for the facade: initialization and the prelude.

use formctl::core::settings_loader;
use formctl::prelude::*;
use formctl_test::{NavigationHarness, RecordingSubmitHandler};

#[test]
fn test_init_configures_settings_once() {
    let settings = settings_loader::from_toml_str(
        r#"
        debug = false
        log_level = "warn"
        prevent_reload = true
        server_error_message = "Try again later."
        "#,
    )
    .unwrap();

    formctl::init(settings.clone());
    formctl::init(Settings::default());

    let configured = formctl::core::SETTINGS.get();
    assert!(configured.prevent_reload);
    assert_eq!(
        configured.server_error_message.as_deref(),
        Some("Try again later.")
    );
}

#[tokio::test]
async fn test_prelude_builds_a_working_form() {
    let recorder = RecordingSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = FormController::builder(
        FormSchema::new()
            .field(FieldDef::new("email", FieldType::Email))
            .field(FieldDef::char("message", Some(10), None)),
    )
    .default_values(FormValues::new().with("email", "").with("message", ""))
    .submit_handler(recorder.as_submit_handler())
    .settings(Settings::default())
    .guard(harness.guard())
    .build()
    .unwrap();

    form.set_value("email", json!("user@example.com")).unwrap();
    form.set_value("message", json!("hello there, world")).unwrap();

    assert_eq!(form.submit().await, SubmitOutcome::Submitted);
    recorder.assert_call_count(1);
}
