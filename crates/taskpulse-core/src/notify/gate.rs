//! The check every notification passes before it is handed to a sink.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::settings::NotificationSettings;
use super::NotificationKind;

/// Gate verdict. Everything except `Allow` means "handled, but skipped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    /// Notifications are switched off globally
    Disabled,
    /// This kind of notification is switched off
    CategoryDisabled,
    QuietHours,
    /// `max_notifications_per_hour` distinct notifications already went out
    /// in the last 60 minutes
    RateLimited,
}

impl GateDecision {
    pub fn allows(self) -> bool {
        self == GateDecision::Allow
    }
}

/// Dispatch gate with a sliding one-hour delivery log.
///
/// The hourly limit counts distinct tags: a repeat of a tag already
/// delivered inside the window (an overdue notice re-sent by the sweep) is
/// let through without using up the budget.
#[derive(Debug, Clone, Default)]
pub struct DispatchGate {
    delivered: VecDeque<(DateTime<Utc>, String)>,
}

impl DispatchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a notification of `kind` tagged `tag` may go out at `now`.
    pub fn check(
        &mut self,
        settings: &NotificationSettings,
        kind: NotificationKind,
        tag: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> GateDecision {
        if !settings.enabled {
            return GateDecision::Disabled;
        }
        if !kind.enabled_in(settings) {
            return GateDecision::CategoryDisabled;
        }
        if settings.quiet_hours.contains(now, offset) {
            return GateDecision::QuietHours;
        }

        self.prune(now);
        let limit = settings.max_notifications_per_hour;
        if limit > 0 && self.delivered.len() >= limit as usize && !self.seen(tag) {
            return GateDecision::RateLimited;
        }
        GateDecision::Allow
    }

    /// Count a delivered notification against the hourly limit. Repeats of a
    /// tag already in the window are not counted again.
    pub fn record_delivery(&mut self, at: DateTime<Utc>, tag: &str) {
        self.prune(at);
        if !self.seen(tag) {
            self.delivered.push_back((at, tag.to_string()));
        }
    }

    /// Deliveries inside the current window.
    pub fn recent_deliveries(&mut self, now: DateTime<Utc>) -> usize {
        self.prune(now);
        self.delivered.len()
    }

    fn seen(&self, tag: &str) -> bool {
        self.delivered.iter().any(|(_, t)| t == tag)
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(1);
        while self.delivered.front().is_some_and(|(t, _)| *t <= cutoff) {
            self.delivered.pop_front();
        }
    }
}
