//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and a
//! fixed `--now`, then verify outputs.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const NOW: &str = "2026-03-02T10:00:00Z";

const TASKS: &str = r#"[
  {
    "id": "late",
    "content": "File expenses",
    "priority": "high",
    "estimated_time": 30,
    "deadline": "2026-03-02T08:00:00Z"
  },
  {
    "id": "grant",
    "content": "Submit grant",
    "priority": "urgent",
    "estimated_time": 90,
    "deadline": "2026-03-02T10:47:00Z"
  },
  {
    "id": "report",
    "content": "Write report",
    "priority": "medium",
    "category": "writing",
    "estimated_time": 60,
    "actual_time": 90,
    "completed": true,
    "completed_at": "2026-03-01T15:00:00Z"
  }
]"#;

struct Fixture {
    home: TempDir,
    tasks: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let home = tempfile::tempdir().expect("tempdir");
        let tasks = home.path().join("tasks.json");
        std::fs::write(&tasks, TASKS).expect("write tasks");
        Self { home, tasks }
    }

    fn home(&self) -> &Path {
        self.home.path()
    }

    /// Run a CLI command with `--now` pinned and return (stdout, stderr, code).
    fn run(&self, args: &[&str]) -> (String, String, i32) {
        let mut full = vec!["--now", NOW, "--tasks"];
        let tasks = self.tasks.to_string_lossy().to_string();
        full.push(&tasks);
        full.extend_from_slice(args);
        run_cli(self.home(), &full)
    }

    fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--json"];
        full.extend_from_slice(args);
        let (stdout, stderr, code) = self.run(&full);
        assert_eq!(code, 0, "command {args:?} failed: {stderr}");
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON from {args:?}: {e}\n{stdout}"))
    }
}

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_taskpulse"))
        .args(args)
        .env("TASKPULSE_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("pressure"));
    assert!(stdout.contains("watch"));
}

#[test]
fn test_pressure_ranks_overdue_first() {
    let fx = Fixture::new();
    let rows = fx.run_json(&["pressure"]);
    let rows = rows.as_array().unwrap();

    assert_eq!(rows.len(), 2, "completed task should be hidden");
    assert_eq!(rows[0]["id"], "late");
    assert_eq!(rows[0]["name"], "OVERDUE");
    assert_eq!(rows[0]["urgency"], 100);
    assert_eq!(rows[1]["id"], "grant");
}

#[test]
fn test_pressure_all_includes_completed() {
    let fx = Fixture::new();
    let rows = fx.run_json(&["pressure", "--all"]);
    let rows = rows.as_array().unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["id"], "report");
    assert_eq!(rows[2]["message"], "Completed");
}

#[test]
fn test_pressure_text() {
    let fx = Fixture::new();
    let (stdout, _, code) = fx.run(&["pressure"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("OVERDUE"));
    assert!(stdout.contains("Submit grant"));
    assert!(stdout.contains("3 tasks, 2 under pressure"));
}

#[test]
fn test_conflicts_next_hour() {
    let fx = Fixture::new();
    let windows = fx.run_json(&["conflicts"]);
    let windows = windows.as_array().unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0]["window"], "next_hour");
    assert_eq!(windows[0]["severity"], "medium");
    assert_eq!(windows[0]["tasks"][0]["id"], "grant");
}

#[test]
fn test_suggest_starts_with_overdue() {
    let fx = Fixture::new();
    let suggestions = fx.run_json(&["suggest"]);
    let first = &suggestions.as_array().unwrap()[0];

    assert_eq!(first["type"], "critical");
    assert_eq!(first["title"], "Overdue tasks");
    assert_eq!(first["priority_order"], 1);
}

#[test]
fn test_missing_task_file_is_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["--now", NOW, "pressure"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no tasks"));
}

#[test]
fn test_invalid_task_file_fails() {
    let fx = Fixture::new();
    std::fs::write(&fx.tasks, "{ not json").unwrap();
    let (_, stderr, code) = fx.run(&["pressure"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid task file"));
}

#[test]
fn test_invalid_now_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["--now", "yesterday-ish", "pressure"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot parse --now"));
}

#[test]
fn test_learn_updates_patterns() {
    let fx = Fixture::new();
    let (stdout, stderr, code) = fx.run(&["learn", "report"]);
    assert_eq!(code, 0, "learn failed: {stderr}");
    assert!(stdout.contains("learned from report"));
    assert!(fx.home().join("patterns.json").exists());

    let patterns = fx.run_json(&["patterns", "show"]);
    assert_eq!(patterns["version"], 1);
    assert!(patterns["procrastination_coefficient"].as_f64().unwrap() > 1.0);
}

#[test]
fn test_learn_twice_is_refused() {
    let fx = Fixture::new();
    let (_, stderr, code) = fx.run(&["learn", "report"]);
    assert_eq!(code, 0, "learn failed: {stderr}");

    let (_, stderr, code) = fx.run(&["learn", "report"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already learned from report"));

    let patterns = fx.run_json(&["patterns", "show"]);
    assert_eq!(patterns["version"], 1);
    assert_eq!(patterns["historical_observations"].as_array().unwrap().len(), 1);
}

#[test]
fn test_learn_rejects_open_task() {
    let fx = Fixture::new();
    let (_, stderr, code) = fx.run(&["learn", "grant"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not completed"));
}

#[test]
fn test_learn_unknown_task() {
    let fx = Fixture::new();
    let (_, stderr, code) = fx.run(&["learn", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("task not found"));
}

#[test]
fn test_patterns_reset() {
    let fx = Fixture::new();
    fx.run(&["learn", "report"]);
    let (stdout, _, code) = fx.run(&["patterns", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("patterns reset"));

    let patterns = fx.run_json(&["patterns", "show"]);
    assert_eq!(patterns["version"], 0);
}

#[test]
fn test_patterns_report() {
    let fx = Fixture::new();
    let report = fx.run_json(&["patterns", "report"]);
    assert_eq!(report["total_tasks"], 3);
    assert_eq!(report["completed_tasks"], 1);
    assert_eq!(report["timed_completions"], 1);
}

#[test]
fn test_estimate_single_task() {
    let fx = Fixture::new();
    let rows = fx.run_json(&["estimate", "grant"]);
    let row = &rows.as_array().unwrap()[0];

    assert_eq!(row["id"], "grant");
    assert_eq!(row["estimated_minutes"], 90);
    assert_eq!(row["adjusted_minutes"].as_u64().unwrap() % 5, 0);
    assert!(row["realistic_deadline"].is_string());
}

#[test]
fn test_config_set_and_get() {
    let fx = Fixture::new();
    let (stdout, stderr, code) = fx.run(&["config", "set", "notifications.max_notifications_per_hour", "3"]);
    assert_eq!(code, 0, "config set failed: {stderr}");
    assert!(stdout.contains("ok"));

    let (stdout, _, code) = fx.run(&["config", "get", "notifications.max_notifications_per_hour"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");
    assert!(fx.home().join("config.toml").exists());
}

#[test]
fn test_config_rejects_invalid_quiet_hours() {
    let fx = Fixture::new();
    let (_, _, code) = fx.run(&["config", "set", "notifications.quiet_hours.start", "25:00"]);
    assert_eq!(code, 1);

    let (stdout, _, _) = fx.run(&["config", "get", "notifications.quiet_hours.start"]);
    assert_eq!(stdout.trim(), "22:00");
}

#[test]
fn test_config_unknown_key() {
    let fx = Fixture::new();
    let (_, stderr, code) = fx.run(&["config", "get", "notifications.volume"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_plan_arms_remaining_reminders() {
    let fx = Fixture::new();
    let timers = fx.run_json(&["plan"]);
    let timers = timers.as_array().unwrap();

    let offsets: Vec<u64> = timers
        .iter()
        .filter_map(|t| t["key"].get("deadline_reminder"))
        .filter(|k| k["task_id"] == "grant")
        .map(|k| k["offset_minutes"].as_u64().unwrap())
        .collect();
    assert_eq!(offsets, vec![30, 15, 5]);
    assert!(timers.iter().any(|t| t["key"] == "overdue_sweep"));
}

#[test]
fn test_watch_refuses_pinned_clock() {
    let fx = Fixture::new();
    let (_, stderr, code) = fx.run(&["watch"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("system clock"));
}
