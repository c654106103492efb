use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::{GateDecision, Notification, NotificationKind};
use crate::scheduler::TimerKey;

/// Every state change in the scheduler and session produces an Event.
/// Hosts log or forward them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerArmed {
        key: TimerKey,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerCancelled {
        key: TimerKey,
        at: DateTime<Utc>,
    },
    /// A due timer whose task was completed or removed in the meantime.
    TimerDropped {
        key: TimerKey,
        at: DateTime<Utc>,
    },
    NotificationDispatched {
        notification: Notification,
        /// Delivered through the fallback sink after the primary rejected it
        via_fallback: bool,
        at: DateTime<Utc>,
    },
    /// The dispatch gate held the notification back.
    NotificationSkipped {
        kind: NotificationKind,
        tag: String,
        reason: GateDecision,
        at: DateTime<Utc>,
    },
    /// Both sinks rejected the notification.
    DeliveryFailed {
        kind: NotificationKind,
        tag: String,
        at: DateTime<Utc>,
    },
    PatternsUpdated {
        version: u64,
        procrastination_coefficient: f64,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerArmed { at, .. }
            | Event::TimerCancelled { at, .. }
            | Event::TimerDropped { at, .. }
            | Event::NotificationDispatched { at, .. }
            | Event::NotificationSkipped { at, .. }
            | Event::DeliveryFailed { at, .. }
            | Event::PatternsUpdated { at, .. }
            | Event::SettingsUpdated { at } => *at,
        }
    }

    /// The notification, for dispatch events.
    pub fn dispatched(&self) -> Option<&Notification> {
        match self {
            Event::NotificationDispatched { notification, .. } => Some(notification),
            _ => None,
        }
    }
}
