#![allow(clippy::unwrap_used, clippy::expect_used)]

use stratum_core::errors::{ExError, ExErrorKind, StratumError};
use stratum_core::logging_facility::test_capture::init_test_capture;
use stratum_core::{log_op_end, log_op_error, log_op_start};
use stratum_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let start_events = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    assert_eq!(start_events, 1, "Should have captured one start event");
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .expect("Should have end event");

    assert_eq!(end_event.field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = StratumError::DowngradeRefused {
        current: 4,
        requested: 2,
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(error_event.field("err.code"), Some("ERR_DOWNGRADE"));
    assert_eq!(error_event.level, tracing::Level::ERROR);
}

#[test]
fn test_log_op_error_leaves_error_usable() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_4";

    let err = ExError::new(ExErrorKind::Persistence).with_message("no such table: users");
    log_op_error!(op_name, err, duration_ms = 1, file = "3.sql");

    // The macro clones, so the caller still owns the error
    assert_eq!(err.kind(), ExErrorKind::Persistence);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .expect("Should have error event");
    assert_eq!(error_event.field("file"), Some("3.sql"));
    assert!(error_event
        .field("error")
        .unwrap_or_default()
        .contains("no such table"));
}

#[test]
fn test_log_macros_with_multiple_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_macros_fields_unique_5";

    log_op_start!(op_name, old_version = 2, new_version = 5);

    let events = capture.events();
    let start_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .expect("Should have start event");

    assert_eq!(start_event.field("old_version"), Some("2"));
    assert_eq!(start_event.field("new_version"), Some("5"));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();

    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}

#[test]
fn test_events_are_scoped_to_thread() {
    let capture = init_test_capture();
    tracing::warn!(marker = "thread_scope_marker", "from test thread");

    std::thread::spawn(|| {
        tracing::warn!(marker = "thread_scope_marker", "from other thread");
    })
    .join()
    .unwrap();

    let mine =
        capture.count_on_current_thread(|e| e.field("marker") == Some("thread_scope_marker"));
    let all = capture.count_events(|e| e.field("marker") == Some("thread_scope_marker"));
    assert_eq!(mine, 1);
    assert_eq!(all, 2);
}

#[test]
fn test_message_is_captured() {
    let capture = init_test_capture();
    tracing::info!(marker = "message_marker", "Foreign keys enabled");

    let events = capture.events_on_current_thread();
    let event = events
        .iter()
        .find(|e| e.field("marker") == Some("message_marker"))
        .expect("Should have marker event");
    assert_eq!(event.message.as_deref(), Some("Foreign keys enabled"));
}
