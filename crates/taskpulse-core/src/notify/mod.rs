//! Notification payloads, delivery sinks and the dispatch gate.
//!
//! The core never renders or shows anything. It decides what to send and
//! when, then hands a [`Notification`] to a [`NotificationSink`] supplied by
//! the host (OS notification bridge, in-app toast, log, ...).

mod gate;
mod settings;

pub use gate::{DispatchGate, GateDecision};
pub use settings::{parse_hhmm, NotificationSettings, QuietHours, ReminderTiming, SettingsPatch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Category of a notification; each has its own on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DeadlineReminder,
    ProcrastinationAlert,
    ProductivitySuggestion,
    Overdue,
}

impl NotificationKind {
    pub fn enabled_in(self, settings: &NotificationSettings) -> bool {
        match self {
            NotificationKind::DeadlineReminder => settings.deadline_reminders,
            NotificationKind::ProcrastinationAlert => settings.procrastination_alerts,
            NotificationKind::ProductivitySuggestion => settings.productivity_suggestions,
            NotificationKind::Overdue => settings.overdue_alerts,
        }
    }
}

/// What happens when the user clicks the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationAction {
    OpenTask { task_id: String },
    OpenDashboard,
}

/// A notification ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Stable per subject; hosts may use it to replace an on-screen duplicate
    pub tag: String,
    pub require_interaction: bool,
    pub action: NotificationAction,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        tag: impl Into<String>,
        action: NotificationAction,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            body: body.into(),
            tag: tag.into(),
            require_interaction: false,
            action,
            created_at,
        }
    }

    pub fn requiring_interaction(mut self, required: bool) -> Self {
        self.require_interaction = required;
        self
    }

    pub fn task_id(&self) -> Option<&str> {
        match &self.action {
            NotificationAction::OpenTask { task_id } => Some(task_id),
            NotificationAction::OpenDashboard => None,
        }
    }
}

/// Delivery boundary. Returns `false` when the notification was rejected
/// (permission denied, platform error, ...).
pub trait NotificationSink: Send {
    fn deliver(&mut self, notification: &Notification) -> bool;
}

/// Writes notifications to the log. Never rejects; used as the
/// lower-fidelity fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&mut self, notification: &Notification) -> bool {
        tracing::info!(
            tag = %notification.tag,
            kind = ?notification.kind,
            "{}: {}",
            notification.title,
            notification.body
        );
        true
    }
}

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    delivered: Arc<Mutex<Vec<Notification>>>,
    reject: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that refuses every notification.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Snapshot of everything delivered so far.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl NotificationSink for MemorySink {
    fn deliver(&mut self, notification: &Notification) -> bool {
        if self.reject {
            return false;
        }
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification::new(
            NotificationKind::Overdue,
            "Overdue: taxes",
            "Was due 2 hours ago",
            "overdue-t1",
            NotificationAction::OpenTask {
                task_id: "t1".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        assert!(writer.deliver(&sample()));
        assert_eq!(sink.delivered().len(), 1);
        sink.clear();
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn rejecting_sink_keeps_nothing() {
        let mut sink = MemorySink::rejecting();
        assert!(!sink.deliver(&sample()));
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn notification_exposes_task_id() {
        let n = sample();
        assert_eq!(n.task_id(), Some("t1"));
        assert!(!n.require_interaction);
        assert_eq!(n.id.len(), 36);
    }

    #[test]
    fn action_serializes_tagged() {
        let json = serde_json::to_value(NotificationAction::OpenDashboard).unwrap();
        assert_eq!(json["type"], "open_dashboard");
    }
}
