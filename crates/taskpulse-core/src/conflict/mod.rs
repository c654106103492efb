//! Overcommitment detection over fixed lookahead windows.
//!
//! Each window sums the estimates of the incomplete tasks due inside it and
//! compares the total with the window's length. Windows overlap on purpose
//! (a task due in 30 minutes counts toward `next_hour`, `next_6_hours`,
//! `today` and `this_week`), and only windows whose estimated work exceeds the
//! available time are reported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskRef};

/// Fixed lookahead window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    NextHour,
    Next6Hours,
    Today,
    Tomorrow,
    ThisWeek,
}

impl WindowKind {
    pub const ALL: [WindowKind; 5] = [
        WindowKind::NextHour,
        WindowKind::Next6Hours,
        WindowKind::Today,
        WindowKind::Tomorrow,
        WindowKind::ThisWeek,
    ];

    /// `[start, end]` in hours from now.
    pub fn bounds_hours(self) -> (f64, f64) {
        match self {
            WindowKind::NextHour => (0.0, 1.0),
            WindowKind::Next6Hours => (0.0, 6.0),
            WindowKind::Today => (0.0, 24.0),
            WindowKind::Tomorrow => (24.0, 48.0),
            WindowKind::ThisWeek => (0.0, 168.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowKind::NextHour => "next hour",
            WindowKind::Next6Hours => "next 6 hours",
            WindowKind::Today => "today",
            WindowKind::Tomorrow => "tomorrow",
            WindowKind::ThisWeek => "this week",
        }
    }
}

/// How badly a window is overcommitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// `> 1.5` high, `> 1.0` medium, otherwise low.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.5 {
            Severity::High
        } else if ratio > 1.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// An overcommitted window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictWindow {
    pub window: WindowKind,
    pub tasks: Vec<TaskRef>,
    pub total_estimated_minutes: u32,
    pub available_minutes: u32,
    pub overcommitment_ratio: f64,
    pub severity: Severity,
}

/// Find every window whose estimated work exceeds its length.
///
/// Completed tasks and tasks without a deadline are ignored.
pub fn find_conflicts(tasks: &[Task], now: DateTime<Utc>) -> Vec<ConflictWindow> {
    let candidates: Vec<(&Task, f64)> = tasks
        .iter()
        .filter(|t| !t.completed)
        .filter_map(|t| t.hours_until_deadline(now).map(|h| (t, h)))
        .collect();

    WindowKind::ALL
        .into_iter()
        .filter_map(|window| analyze_window(window, &candidates))
        .collect()
}

fn analyze_window(window: WindowKind, candidates: &[(&Task, f64)]) -> Option<ConflictWindow> {
    let (start, end) = window.bounds_hours();
    let available_minutes = end * 60.0;
    if available_minutes <= 0.0 {
        tracing::warn!(?window, "window has no available time, treating as non-conflicting");
        return None;
    }

    let in_window: Vec<&Task> = candidates
        .iter()
        .filter(|(_, hours)| *hours >= start && *hours <= end)
        .map(|(task, _)| *task)
        .collect();
    if in_window.is_empty() {
        return None;
    }

    let total: u32 = in_window.iter().map(|t| t.estimate_or_default()).sum();
    let ratio = total as f64 / available_minutes;
    if ratio <= 1.0 {
        return None;
    }

    Some(ConflictWindow {
        window,
        tasks: in_window.iter().map(|t| t.to_ref()).collect(),
        total_estimated_minutes: total,
        available_minutes: available_minutes as u32,
        overcommitment_ratio: ratio,
        severity: Severity::from_ratio(ratio),
    })
}
