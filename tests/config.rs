//! Config files on disk feeding a session.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;
use todo_tracker::config::Config;
use todo_tracker::session::{Clock, Session};
use todo_tracker::TaskError;

/// Write `content` to a config.toml inside a fresh temp dir.
fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("failed to write config");
    (dir, path)
}

#[test]
fn explicit_file_overrides_defaults() {
    let (_dir, path) = write_config(
        r#"
[reminders]
due_soon_hours = 36 # a day and a half
show_on_startup = false

[display]
color = false
"#,
    );
    let config = Config::load(Some(path.as_path())).expect("config loads");
    assert_eq!(config.reminders.due_soon_hours, 36);
    assert!(!config.reminders.show_on_startup);
    assert!(!config.display.color);
}

#[test]
fn missing_or_invalid_file_is_a_config_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let missing = dir.path().join("nope.toml");
    assert!(matches!(Config::load(Some(missing.as_path())), Err(TaskError::Config(_))));

    let (_dir, path) = write_config("[reminders]\ndue_soon_hours = -4\n");
    let err = Config::load(Some(path.as_path())).unwrap_err();
    assert!(err.to_string().contains("due_soon_hours must be positive"));
}

#[test]
fn oversized_window_is_rejected_at_load() {
    let (_dir, path) = write_config("[reminders]\ndue_soon_hours = 9223372036854775807\n");
    let err = Config::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, TaskError::Config(_)));
    assert!(err.to_string().contains("due_soon_hours must be at most"));
}

#[test]
fn configured_window_widens_due_soon() {
    let (_dir, path) = write_config("[reminders]\ndue_soon_hours = 36\n");
    let config = Config::load(Some(path.as_path())).expect("config loads");
    let now = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(20, 0, 0).unwrap();
    let mut session = Session::new(config, Clock::Fixed(now)).with_color(false);

    let mut out = Vec::new();
    session
        .run("add Dentist --due 'tomorrow'\nremind\n".as_bytes(), &mut out)
        .expect("session runs");
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("⚠️ REMINDERS: 1 DUE SOON"), "got: {text}");
    assert!(text.contains("Due soon:\n  1    Dentist (2024-06-04 23:59)"));

    // The default two-hour window does not reach tomorrow night.
    let mut session = Session::new(Config::default(), Clock::Fixed(now)).with_color(false);
    let mut out = Vec::new();
    session
        .run("add Dentist --due tomorrow\nremind\n".as_bytes(), &mut out)
        .unwrap();
    assert!(String::from_utf8(out).unwrap().ends_with("No reminders.\n"));
}
