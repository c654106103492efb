//! Task types consumed by the smart-scheduling core.
//!
//! Tasks are owned by the host. The core only reads them, derives pressure,
//! estimates and timers from them, and hands back lightweight [`TaskRef`]
//! snapshots inside conflict windows and suggestions.

mod lenient;

pub use lenient::parse_instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Estimate assumed for tasks that carry none (minutes).
pub const DEFAULT_ESTIMATE_MINUTES: u32 = 60;

/// Bucket used for tasks without a category.
pub const DEFAULT_CATEGORY: &str = "general";

/// Task priority.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Weight applied to the pressure ratio.
    pub fn pressure_weight(self) -> f64 {
        match self {
            Priority::Low => 0.7,
            Priority::Medium => 1.0,
            Priority::High => 1.3,
            Priority::Urgent => 1.6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A task as seen by the scheduling core.
///
/// Timestamps and minute counts deserialize leniently: values that cannot be
/// parsed become `None` and a warning is logged instead of failing the whole
/// document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    /// Task text shown in notifications
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    /// Free-form category, bucketed by [`Task::category_key`]
    #[serde(default)]
    pub category: Option<String>,
    /// Estimated duration in minutes
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub estimated_time: Option<u32>,
    /// Actual duration in minutes, set on completion
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub actual_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient::instant")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient::instant")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::instant")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::instant")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with default values.
    pub fn new(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Task {
            id: format!("task-{}-{}", now.timestamp(), uuid::Uuid::new_v4()),
            content: content.into(),
            priority: Priority::Medium,
            category: None,
            estimated_time: None,
            actual_time: None,
            deadline: None,
            completed: false,
            created_at: Some(now),
            completed_at: None,
            started_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_time = Some(minutes);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Mark the task completed with the time it actually took.
    pub fn complete(mut self, actual_minutes: u32, at: DateTime<Utc>) -> Self {
        self.completed = true;
        self.actual_time = Some(actual_minutes);
        self.completed_at = Some(at);
        self
    }

    /// Estimated minutes, falling back to [`DEFAULT_ESTIMATE_MINUTES`].
    pub fn estimate_or_default(&self) -> u32 {
        self.estimated_time.unwrap_or(DEFAULT_ESTIMATE_MINUTES)
    }

    /// Normalized category bucket (trimmed, lowercase, `general` when empty).
    pub fn category_key(&self) -> String {
        category_key(self.category.as_deref())
    }

    /// Fractional hours from `now` until the deadline (negative when overdue).
    pub fn hours_until_deadline(&self, now: DateTime<Utc>) -> Option<f64> {
        self.deadline
            .map(|deadline| (deadline - now).num_seconds() as f64 / 3600.0)
    }

    /// Incomplete and past its deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.deadline.is_some_and(|d| d < now)
    }

    /// Snapshot used in conflict windows, suggestions and timer payloads.
    pub fn to_ref(&self) -> TaskRef {
        TaskRef {
            id: self.id.clone(),
            content: self.content.clone(),
            priority: self.priority,
            deadline: self.deadline,
        }
    }
}

/// Normalize a raw category string into its bucket key.
pub fn category_key(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Lightweight reference to a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRef {
    pub id: String,
    pub content: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
}

/// Where the core reads the current task collection from.
pub trait TaskSource {
    fn tasks(&self) -> Vec<Task>;
}

impl TaskSource for Vec<Task> {
    fn tasks(&self) -> Vec<Task> {
        self.clone()
    }
}

impl TaskSource for [Task] {
    fn tasks(&self) -> Vec<Task> {
        self.to_vec()
    }
}

impl<T: TaskSource + ?Sized> TaskSource for std::sync::Arc<T> {
    fn tasks(&self) -> Vec<Task> {
        (**self).tasks()
    }
}

/// Lets a host share a mutable collection with the session.
impl<T: TaskSource> TaskSource for std::sync::Mutex<T> {
    fn tasks(&self) -> Vec<Task> {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .tasks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("whenever".parse::<Priority>().is_err());
    }

    #[test]
    fn category_key_buckets_blank_and_case() {
        assert_eq!(category_key(Some("  Work ")), "work");
        assert_eq!(category_key(Some("   ")), DEFAULT_CATEGORY);
        assert_eq!(category_key(None), DEFAULT_CATEGORY);
    }

    #[test]
    fn task_creation() {
        let task = Task::new("Write report");
        assert!(task.id.starts_with("task-"));
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.estimate_or_default(), DEFAULT_ESTIMATE_MINUTES);
        assert!(!task.completed);
    }

    #[test]
    fn overdue_requires_incomplete_task() {
        let now = Utc::now();
        let task = Task::new("late").with_deadline(now - Duration::minutes(5));
        assert!(task.is_overdue(now));
        assert!(!task.clone().complete(30, now).is_overdue(now));
        assert!(!Task::new("no deadline").is_overdue(now));
    }

    #[test]
    fn hours_until_deadline_is_signed() {
        let now = Utc::now();
        let task = Task::new("t").with_deadline(now - Duration::minutes(90));
        let hours = task.hours_until_deadline(now).unwrap();
        assert!((hours + 1.5).abs() < 1e-9);
    }

    #[test]
    fn task_deserializes_with_malformed_fields() {
        let json = r#"{
            "id": "t-1",
            "content": "Pay rent",
            "priority": "high",
            "estimated_time": "forty",
            "deadline": "next tuesday",
            "created_at": "2026-03-01"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.estimated_time, None);
        assert_eq!(task.deadline, None);
        assert_eq!(
            task.created_at.unwrap().to_rfc3339(),
            "2026-03-01T00:00:00+00:00"
        );
    }

    #[test]
    fn task_serialization_roundtrip() {
        let task = Task::new("Ship release")
            .with_id("t-2")
            .with_priority(Priority::Urgent)
            .with_category("Work")
            .with_estimate(45)
            .with_deadline(Utc::now() + Duration::hours(3));
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, task);
    }
}
