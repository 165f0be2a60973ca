//! Integration tests for the form controller.
//!
//! Drives a contact form end to end: edit -> validate -> submit -> handle the
//! server's answer, with the navigation guard observed through an isolated
//! harness.

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::json;

use formctl_core::i18n;
use formctl_core::i18n::catalog::register_translations;
use formctl_core::{Settings, DEFAULT_SERVER_ERROR_MESSAGE};
use formctl_forms::{
    FieldDef, FieldErrors, FormController, FormControllerBuilder, FormSchema, FormState, FormValues,
    ServerErrorOutcome, SubmitOutcome, TransportError,
};
use formctl_test::{GatedSubmitHandler, NavigationHarness, RecordingSubmitHandler};

const MIN_MESSAGE: &str = "150文字以上必須です";
const MAX_MESSAGE: &str = "内容は2000文字以内で入力してください";

fn contact_schema() -> FormSchema {
    FormSchema::new().field(
        FieldDef::char("message", Some(150), Some(2000))
            .error_message("min_length", MIN_MESSAGE)
            .error_message("max_length", MAX_MESSAGE),
    )
}

fn contact_builder() -> FormControllerBuilder {
    FormController::builder(contact_schema())
        .default_values(FormValues::new().with("message", ""))
        .settings(Settings::default())
}

/// Maps 422 bodies shaped like `{"errors": {"field": "message"}}`.
fn errors_object(error: &TransportError) -> Option<FieldErrors> {
    if error.status != Some(422) {
        return None;
    }
    let object = error.payload.as_ref()?.get("errors")?.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|m| (k.clone(), m.to_string())))
            .collect(),
    )
}

fn record_submitting(form: &FormController) -> Arc<Mutex<Vec<bool>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    form.subscribe("submitting-log", move |state: &FormState| {
        sink.lock().unwrap().push(state.is_submitting);
    });
    seen
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_short_message_blocks_submit() {
    let recorder = RecordingSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();

    let outcome = form.submit().await;

    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected invalid outcome, got {outcome:?}");
    };
    assert_eq!(errors.get("message").map(String::as_str), Some(MIN_MESSAGE));
    assert_eq!(
        form.field("message").unwrap().error().as_deref(),
        Some(MIN_MESSAGE)
    );
    assert!(!form.is_valid());
    assert!(!form.is_submitting());
    recorder.assert_not_called();
}

#[tokio::test]
async fn test_change_reports_errors_per_keystroke() {
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    let message = form.field("message").unwrap();

    message.handle_change(json!("a".repeat(149)));
    assert_eq!(message.error().as_deref(), Some(MIN_MESSAGE));

    message.handle_change(json!("a".repeat(150)));
    assert!(message.error().is_none());

    message.handle_change(json!("a".repeat(2001)));
    assert_eq!(message.error().as_deref(), Some(MAX_MESSAGE));
    assert!(!form.is_valid());
}

// ── Submission ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Contact {
    message: String,
}

#[tokio::test]
async fn test_valid_message_submits() {
    let recorder = RecordingSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    let seen = record_submitting(&form);

    let text = "あ".repeat(200);
    form.set_value("message", json!(text)).unwrap();
    let outcome = form.submit().await;

    assert_eq!(outcome, SubmitOutcome::Submitted);
    recorder.assert_call_count(1);
    let contact: Contact = recorder.last_values().unwrap().parse().unwrap();
    assert_eq!(contact.message, text);

    assert!(seen.lock().unwrap().ends_with(&[true, false]));
    assert!(!form.is_submitting());
    assert!(form.state().errors().is_empty());
    assert_eq!(form.server_error_message(), "");
    assert_eq!(form.state().submit_count, 1);
}

#[tokio::test]
async fn test_is_submitting_while_handler_in_flight() {
    let gated = GatedSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(gated.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    let (outcome, observed) = tokio::join!(form.submit(), async {
        gated.wait_until_entered().await;
        let observed = form.is_submitting();
        gated.open();
        observed
    });

    assert!(observed);
    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_ignored() {
    let gated = GatedSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(gated.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    let (first, second) = tokio::join!(form.submit(), async {
        gated.wait_until_entered().await;
        let second = form.submit().await;
        gated.open();
        second
    });

    assert_eq!(first, SubmitOutcome::Submitted);
    assert_eq!(second, SubmitOutcome::AlreadySubmitting);
    gated.recorder().assert_call_count(1);
}

#[tokio::test]
async fn test_abandoned_submit_returns_to_idle() {
    let gated = GatedSubmitHandler::new();
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(gated.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    tokio::select! {
        _ = form.submit() => panic!("handler should still be gated"),
        () = gated.wait_until_entered() => {}
    }
    assert!(!form.is_submitting());

    gated.open();
    assert_eq!(form.submit().await, SubmitOutcome::Submitted);
    gated.recorder().assert_call_count(2);
}

// ── Server errors ───────────────────────────────────────────────────

#[tokio::test]
async fn test_generic_failure_shows_fallback_message() {
    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with("connection reset by peer");
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();
    let errors_before = form.state().errors();

    let outcome = form.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(ServerErrorOutcome::GenericMessage(
            DEFAULT_SERVER_ERROR_MESSAGE.to_string()
        ))
    );
    assert_eq!(form.server_error_message(), DEFAULT_SERVER_ERROR_MESSAGE);
    assert!(!form.is_submitting());
    assert_eq!(form.state().errors(), errors_before);
}

#[tokio::test]
async fn test_fallback_message_is_translated() {
    register_translations(
        "xx-formctl-test",
        vec![(DEFAULT_SERVER_ERROR_MESSAGE, "Something went wrong.")],
    );

    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with("boom");
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .settings(Settings {
            language_code: "xx-formctl-test".into(),
            ..Settings::default()
        })
        .submit_handler(recorder.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();
    form.submit().await;

    assert_eq!(form.server_error_message(), "Something went wrong.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fallback_translation_survives_spawned_submit() {
    register_translations(
        "xx-formctl-spawned",
        vec![(DEFAULT_SERVER_ERROR_MESSAGE, "Something went wrong.")],
    );
    i18n::activate("xx-formctl-spawned");

    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with("boom");
    let harness = NavigationHarness::new();
    let form = Arc::new(
        contact_builder()
            .settings(Settings {
                language_code: "xx-formctl-spawned".into(),
                ..Settings::default()
            })
            .submit_handler(recorder.as_submit_handler())
            .guard(harness.guard())
            .build()
            .unwrap(),
    );
    form.set_value("message", json!("x".repeat(200))).unwrap();

    let submitting = Arc::clone(&form);
    let outcome = tokio::spawn(async move { submitting.submit().await })
        .await
        .unwrap();
    i18n::deactivate();

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(ServerErrorOutcome::GenericMessage(
            "Something went wrong.".into()
        ))
    );
    assert_eq!(form.server_error_message(), "Something went wrong.");
}

#[tokio::test]
async fn test_validation_payload_maps_to_fields() {
    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with_transport(
        TransportError::new("unprocessable")
            .with_status(422)
            .with_payload(json!({"errors": {"message": "NGワードが含まれています"}})),
    );
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .validation_error_mapper(errors_object)
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    let outcome = form.submit().await;

    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected(ServerErrorOutcome::FieldErrors(_))
    ));
    assert_eq!(
        form.field("message").unwrap().error().as_deref(),
        Some("NGワードが含まれています")
    );
    assert_eq!(form.server_error_message(), "");
    assert!(!form.is_valid());
}

#[tokio::test]
async fn test_unrecognized_payload_falls_back_to_generic() {
    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with_transport(
        TransportError::new("unprocessable")
            .with_status(422)
            .with_payload(json!({"errors": {"phone": "invalid"}})),
    );
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .validation_error_mapper(errors_object)
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    form.submit().await;

    assert!(form.field("message").unwrap().error().is_none());
    assert_eq!(form.server_error_message(), DEFAULT_SERVER_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_next_submit_clears_server_message() {
    let recorder = RecordingSubmitHandler::new();
    recorder.fail_with("boom");
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(recorder.as_submit_handler())
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();

    form.submit().await;
    assert!(!form.server_error_message().is_empty());

    recorder.succeed();
    assert_eq!(form.submit().await, SubmitOutcome::Submitted);
    assert_eq!(form.server_error_message(), "");
}

// ── Navigation guard ────────────────────────────────────────────────

#[tokio::test]
async fn test_guard_arms_on_first_touch_and_disarms_on_reset() {
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
        .prevent_reload(true)
        .guard(harness.guard())
        .build()
        .unwrap();

    harness.assert_allowed();
    form.field("message").unwrap().handle_change(json!("h"));
    harness.assert_blocked();

    form.field("message").unwrap().handle_change(json!("he"));
    assert_eq!(harness.host().receiver_count(), 1);

    form.reset();
    harness.assert_allowed();
    assert_eq!(form.field("message").unwrap().value(), json!(""));
}

#[tokio::test]
async fn test_guard_ignored_without_prevent_reload() {
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
        .prevent_reload(false)
        .guard(harness.guard())
        .build()
        .unwrap();

    form.field("message").unwrap().handle_blur();
    assert!(form.is_touched());
    harness.assert_allowed();
}

#[tokio::test]
async fn test_guard_stays_armed_while_any_form_is_touched() {
    let harness = NavigationHarness::new();
    let build = || {
        contact_builder()
            .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
            .prevent_reload(true)
            .guard(harness.guard())
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    first.blur("message").unwrap();
    second.blur("message").unwrap();
    assert_eq!(harness.guard().holder_count(), 2);

    first.reset();
    harness.assert_blocked();

    drop(second);
    harness.assert_allowed();
    drop(first);
    assert_eq!(harness.guard().holder_count(), 0);
}

#[tokio::test]
async fn test_reset_on_success_disarms_guard() {
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
        .prevent_reload(true)
        .reset_on_success(true)
        .guard(harness.guard())
        .build()
        .unwrap();
    form.set_value("message", json!("x".repeat(200))).unwrap();
    harness.assert_blocked();

    assert!(form.submit().await.is_submitted());
    harness.assert_allowed();
    assert!(!form.is_touched());
}

#[tokio::test]
async fn test_dropping_form_releases_guard() {
    let harness = NavigationHarness::new();
    let form = contact_builder()
        .submit_handler(RecordingSubmitHandler::new().as_submit_handler())
        .prevent_reload(true)
        .guard(harness.guard())
        .build()
        .unwrap();
    form.blur("message").unwrap();
    harness.assert_blocked();

    drop(form);
    harness.assert_allowed();
}
