//! Notification preferences.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::task::Priority;

/// Minutes-before-deadline offsets, per priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTiming {
    #[serde(default = "default_low_timing")]
    pub low: Vec<u32>,
    #[serde(default = "default_medium_timing")]
    pub medium: Vec<u32>,
    #[serde(default = "default_high_timing")]
    pub high: Vec<u32>,
    #[serde(default = "default_urgent_timing")]
    pub urgent: Vec<u32>,
}

fn default_low_timing() -> Vec<u32> {
    vec![1440]
}
fn default_medium_timing() -> Vec<u32> {
    vec![1440, 60]
}
fn default_high_timing() -> Vec<u32> {
    vec![1440, 120, 30]
}
fn default_urgent_timing() -> Vec<u32> {
    vec![60, 30, 15, 5]
}

impl Default for ReminderTiming {
    fn default() -> Self {
        Self {
            low: default_low_timing(),
            medium: default_medium_timing(),
            high: default_high_timing(),
            urgent: default_urgent_timing(),
        }
    }
}

impl ReminderTiming {
    pub fn for_priority(&self, priority: Priority) -> &[u32] {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
            Priority::Urgent => &self.urgent,
        }
    }

    pub fn set(&mut self, priority: Priority, offsets: Vec<u32>) {
        let slot = match priority {
            Priority::Low => &mut self.low,
            Priority::Medium => &mut self.medium,
            Priority::High => &mut self.high,
            Priority::Urgent => &mut self.urgent,
        };
        *slot = offsets;
    }
}

/// Daily window during which nothing is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    #[serde(default)]
    pub enabled: bool,
    /// "HH:MM"
    #[serde(default = "default_quiet_start")]
    pub start: String,
    /// "HH:MM"
    #[serde(default = "default_quiet_end")]
    pub end: String,
}

fn default_quiet_start() -> String {
    "22:00".into()
}
fn default_quiet_end() -> String {
    "08:00".into()
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_quiet_start(),
            end: default_quiet_end(),
        }
    }
}

impl QuietHours {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            enabled: true,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Whether `minute_of_day` (0..1440) is inside the window.
    ///
    /// Both ends are inclusive. A start later than the end denotes an
    /// overnight window (e.g. 22:00-08:00). A malformed bound disables the
    /// window rather than silencing everything.
    pub fn contains_minute(&self, minute_of_day: u32) -> bool {
        if !self.enabled {
            return false;
        }
        let (start, end) = match (parse_hhmm(&self.start), parse_hhmm(&self.end)) {
            (Ok(s), Ok(e)) => (s, e),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(%err, "ignoring malformed quiet hours");
                return false;
            }
        };

        if start > end {
            minute_of_day >= start || minute_of_day <= end
        } else {
            start <= minute_of_day && minute_of_day <= end
        }
    }

    /// Whether the instant falls inside quiet hours in the given local offset.
    pub fn contains(&self, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        let local = now.with_timezone(&offset);
        self.contains_minute(local.hour() * 60 + local.minute())
    }
}

/// Parse "HH:MM" into minutes since midnight.
pub fn parse_hhmm(raw: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidTimeOfDay(raw.to_string());
    let (h, m) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let h: u32 = h.parse().map_err(|_| invalid())?;
    let m: u32 = m.parse().map_err(|_| invalid())?;
    if h > 23 || m > 59 {
        return Err(invalid());
    }
    Ok(h * 60 + m)
}

/// What to notify about, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub deadline_reminders: bool,
    #[serde(default = "default_true")]
    pub procrastination_alerts: bool,
    #[serde(default = "default_true")]
    pub productivity_suggestions: bool,
    #[serde(default = "default_true")]
    pub overdue_alerts: bool,
    #[serde(default, rename = "reminder_timing_by_priority")]
    pub reminder_timing: ReminderTiming,
    #[serde(default)]
    pub quiet_hours: QuietHours,
    /// 0 disables the limit
    #[serde(default = "default_max_per_hour")]
    pub max_notifications_per_hour: u32,
    /// Local hours (0-23) at which a productivity suggestion is sent
    #[serde(default = "default_productive_hours")]
    pub productive_hours: Vec<u32>,
}

fn default_true() -> bool {
    true
}
fn default_max_per_hour() -> u32 {
    10
}
fn default_productive_hours() -> Vec<u32> {
    vec![9, 14]
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            deadline_reminders: true,
            procrastination_alerts: true,
            productivity_suggestions: true,
            overdue_alerts: true,
            reminder_timing: ReminderTiming::default(),
            quiet_hours: QuietHours::default(),
            max_notifications_per_hour: default_max_per_hour(),
            productive_hours: default_productive_hours(),
        }
    }
}

impl NotificationSettings {
    /// Reject values the scheduler cannot act on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        parse_hhmm(&self.quiet_hours.start)?;
        parse_hhmm(&self.quiet_hours.end)?;
        if let Some(&bad) = self.productive_hours.iter().find(|h| **h > 23) {
            return Err(ValidationError::InvalidHour(bad));
        }
        Ok(())
    }

    /// Apply a partial update, returning the merged settings.
    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = patch.enabled {
            next.enabled = v;
        }
        if let Some(v) = patch.deadline_reminders {
            next.deadline_reminders = v;
        }
        if let Some(v) = patch.procrastination_alerts {
            next.procrastination_alerts = v;
        }
        if let Some(v) = patch.productivity_suggestions {
            next.productivity_suggestions = v;
        }
        if let Some(v) = patch.overdue_alerts {
            next.overdue_alerts = v;
        }
        if let Some(v) = &patch.reminder_timing {
            next.reminder_timing = v.clone();
        }
        if let Some(v) = &patch.quiet_hours {
            next.quiet_hours = v.clone();
        }
        if let Some(v) = patch.max_notifications_per_hour {
            next.max_notifications_per_hour = v;
        }
        if let Some(v) = &patch.productive_hours {
            next.productive_hours = v.clone();
        }
        next
    }
}

/// Partial update for [`NotificationSettings`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub deadline_reminders: Option<bool>,
    pub procrastination_alerts: Option<bool>,
    pub productivity_suggestions: Option<bool>,
    pub overdue_alerts: Option<bool>,
    #[serde(rename = "reminder_timing_by_priority")]
    pub reminder_timing: Option<ReminderTiming>,
    pub quiet_hours: Option<QuietHours>,
    pub max_notifications_per_hour: Option<u32>,
    pub productive_hours: Option<Vec<u32>>,
}
