//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_roastplan-cli"))
        .args(args)
        .env("ROASTPLAN_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let stdout = run_ok(data_dir, args);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

/// Local sinks off so tests never ring the bell or pop notifications.
fn quiet_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["config", "set", "desktop.enabled", "false"]);
    run_ok(dir.path(), &["config", "set", "alarm.enabled", "false"]);
    dir
}

#[test]
fn test_config_defaults_written() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["config", "list"]);
    assert!(out.contains("event.serve_at = 15:00"));
    assert!(out.contains("alerts.enabled = false"));
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["config", "set", "event.serve_at", "17:30"]);
    let out = run_ok(dir.path(), &["config", "get", "event.serve_at"]);
    assert_eq!(out.trim(), "17:30");
}

#[test]
fn test_config_rejects_bad_serve_time() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "event.serve_at", "25:99"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let out = run_ok(dir.path(), &["config", "get", "event.serve_at"]);
    assert_eq!(out.trim(), "15:00");
}

#[test]
fn test_config_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_plan_checklist_json() {
    let dir = TempDir::new().unwrap();
    let events = run_json(dir.path(), &["plan", "checklist", "--serve-at", "15:00", "--json"]);
    let events = events.as_array().unwrap();
    assert!(!events.is_empty());
    assert_eq!(events[0]["title"], "Prep: Lamb Shoulder");
    assert_eq!(events[events.len() - 1]["kind"], "serve");
}

#[test]
fn test_plan_show_json() {
    let dir = TempDir::new().unwrap();
    let plan = run_json(dir.path(), &["plan", "show", "--json"]);
    assert!(plan["schedules"]["beef"]["cook_start"].is_string());
    assert!(plan["preheats"]["low"].is_string());
    assert!(plan["preheats"]["high"].is_string());
}

#[test]
fn test_plan_timeline_json() {
    let dir = TempDir::new().unwrap();
    let timeline = run_json(dir.path(), &["plan", "timeline", "--json"]);
    let devices = timeline["devices"].as_array().unwrap();
    assert_eq!(devices[0]["equipment_id"], "oven-top");
    assert!(devices.iter().any(|d| d["equipment_id"] == "rest"));
}

#[test]
fn test_plan_now_midway() {
    let dir = TempDir::new().unwrap();
    let status = run_json(
        dir.path(),
        &["plan", "now", "--serve-at", "15:00", "--at", "14:20", "--json"],
    );
    assert_eq!(status["started"], true);
    let cooking = status["cooking"].as_array().unwrap();
    assert!(cooking.iter().any(|c| c["block"]["recipe_id"] == "beef"));
}

#[test]
fn test_recipe_list_and_show() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["recipe", "list"]);
    assert!(out.contains("beef"));
    assert!(out.contains("lamb-shoulder"));

    let detail = run_json(dir.path(), &["recipe", "show", "beef", "--json"]);
    assert_eq!(detail["id"], "beef");
    assert!(detail["steps"].as_array().is_some());
}

#[test]
fn test_recipe_show_unknown() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["recipe", "show", "goose"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown recipe: goose"));
}

#[test]
fn test_recipe_check_reports_issues() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[[equipment]]
id = "oven"
name = "Oven"
class = "oven"

[[recipes]]
id = "spuds"
name = "Potatoes"
cook_time = 50
equipment = "oven"
constraint = { kind = "sync_with", target = "chicken" }
"#,
    )
    .unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["recipe", "check", path.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stdout.contains("syncs with missing recipe 'chicken'"));
}

#[test]
fn test_custom_table_from_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lunch.toml");
    std::fs::write(
        &path,
        r#"
title = "Sunday Lunch"

[[equipment]]
id = "oven"
name = "Oven"
class = "oven"

[[recipes]]
id = "chicken"
name = "Chicken"
cook_time = 80
rest_time = 15
equipment = "oven"
"#,
    )
    .unwrap();
    run_ok(dir.path(), &["config", "set", "event.recipes_path", path.to_str().unwrap()]);

    let out = run_ok(dir.path(), &["recipe", "list"]);
    assert!(out.contains("chicken"));
    assert!(!out.contains("beef"));
}

#[test]
fn test_alerts_enable_disable() {
    let dir = quiet_dir();
    let status = run_json(dir.path(), &["alerts", "status", "--json"]);
    assert_eq!(status["enabled"], false);
    assert_eq!(status["lead_secs"], 120);
    assert_eq!(status["grace_secs"], 60);

    let out = run_ok(dir.path(), &["alerts", "enable"]);
    assert!(out.contains("alerts enabled"));
    let status = run_json(dir.path(), &["alerts", "status", "--json"]);
    assert_eq!(status["enabled"], true);

    run_ok(dir.path(), &["alerts", "disable"]);
    let status = run_json(dir.path(), &["alerts", "status", "--json"]);
    assert_eq!(status["enabled"], false);
}

#[test]
fn test_alerts_dry_run_fires_every_event() {
    let dir = quiet_dir();
    let events = run_json(dir.path(), &["plan", "checklist", "--json"]);
    let steps = run_json(dir.path(), &["alerts", "dry-run", "--json"]);
    let fired: usize = steps
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["reminders"].as_array().unwrap().len())
        .sum();
    assert_eq!(fired, events.as_array().unwrap().len());
}

#[test]
fn test_alerts_watch_once() {
    let dir = quiet_dir();
    let out = run_ok(dir.path(), &["alerts", "watch", "--once"]);
    assert!(out.contains("watching Christmas Dinner"));
    assert!(out.contains("alerts are off"));
}

#[test]
fn test_alerts_watch_once_waits_for_push() {
    use chrono::{Duration, Local};

    let started = Local::now();
    let serve = started + Duration::minutes(1);
    if serve.date_naive() != started.date_naive() {
        // a serve time past midnight lands on the wrong day
        return;
    }

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .expect_at_least(1)
        .create();

    let dir = quiet_dir();
    run_ok(dir.path(), &["config", "set", "push.enabled", "true"]);
    run_ok(dir.path(), &["config", "set", "push.server", &server.url()]);
    run_ok(dir.path(), &["config", "set", "alerts.enabled", "true"]);

    let serve_at = serve.format("%H:%M").to_string();
    let out = run_ok(
        dir.path(),
        &["alerts", "watch", "--once", "--serve-at", &serve_at],
    );
    assert!(out.contains("(1 sinks)"));
    mock.assert();
}
