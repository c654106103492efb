//! CLI subcommands and the context they share.

pub mod config;
pub mod conflicts;
pub mod estimate;
pub mod learn;
pub mod patterns;
pub mod plan;
pub mod pressure;
pub mod suggest;
pub mod watch;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::path::PathBuf;
use taskpulse_core::storage::data_dir;
use taskpulse_core::task::parse_instant;
use taskpulse_core::{Clock, Config, FileStore, ManualClock, Notification, NotificationSink, Session, Task, TaskSource};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Reads the task file on every call so `watch` sees edits.
#[derive(Debug, Clone)]
pub struct JsonFileTasks {
    path: PathBuf,
}

impl JsonFileTasks {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file is an empty task list.
    pub fn load(&self) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("cannot read {}: {e}", self.path.display()).into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| format!("invalid task file {}: {e}", self.path.display()).into())
    }
}

impl TaskSource for JsonFileTasks {
    fn tasks(&self) -> Vec<Task> {
        self.load().unwrap_or_else(|err| {
            tracing::warn!(%err, "could not read tasks, treating as empty");
            Vec::new()
        })
    }
}

/// Prints notifications to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    pub json: bool,
}

impl NotificationSink for StdoutSink {
    fn deliver(&mut self, notification: &Notification) -> bool {
        if self.json {
            match serde_json::to_string(notification) {
                Ok(line) => println!("{line}"),
                Err(_) => return false,
            }
        } else {
            let mark = if notification.require_interaction { "!" } else { "*" };
            println!(
                "{mark} [{}] {}: {}",
                notification.created_at.format("%H:%M"),
                notification.title,
                notification.body
            );
        }
        true
    }
}

pub struct Context {
    pub data_dir: PathBuf,
    pub tasks: JsonFileTasks,
    pub now: Option<DateTime<Utc>>,
    pub json: bool,
}

impl Context {
    pub fn new(tasks: Option<PathBuf>, now: Option<&str>, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = data_dir()?;
        let now = match now {
            Some(raw) => Some(parse_instant(raw).ok_or_else(|| format!("cannot parse --now '{raw}'"))?),
            None => None,
        };
        let tasks_path = tasks.unwrap_or_else(|| data_dir.join("tasks.json"));
        Ok(Self {
            data_dir,
            tasks: JsonFileTasks::new(tasks_path),
            now,
            json,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        Ok(Config::load_from(&self.config_path())?)
    }

    pub fn offset(&self) -> FixedOffset {
        self.config()
            .map(|cfg| cfg.offset())
            .unwrap_or_else(|err| {
                tracing::warn!(%err, "unreadable config, using UTC");
                Utc.fix()
            })
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    /// Session over the task file, frozen at [`Context::now`].
    pub fn session(&self) -> Session<JsonFileTasks, ManualClock> {
        self.session_with(ManualClock::new(self.now()))
    }

    pub fn session_with<C: Clock>(&self, clock: C) -> Session<JsonFileTasks, C> {
        Session::new(self.tasks.clone(), clock, self.store(), self.offset())
    }

    pub fn load_tasks(&self) -> Result<Vec<Task>, Box<dyn std::error::Error>> {
        self.tasks.load()
    }

    pub fn find_task(&self, id: &str) -> Result<Task, Box<dyn std::error::Error>> {
        self.load_tasks()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| format!("task not found: {id}").into())
    }

    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> CmdResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Format an instant in the given offset.
pub fn local(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}
