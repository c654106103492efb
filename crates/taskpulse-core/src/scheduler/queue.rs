//! Keyed timer queue.
//!
//! Timers are plain data ordered by `fire_at`. Nothing here sleeps; the
//! scheduler pops whatever is due when it is polled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::task::TaskRef;

/// Identity of a timer. Arming a key that is already armed replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKey {
    DeadlineReminder { task_id: String, offset_minutes: u32 },
    ProcrastinationAlert { task_id: String },
    ProductivitySuggestion { hour: u32 },
    OverdueSweep,
}

impl TimerKey {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            TimerKey::DeadlineReminder { task_id, .. } | TimerKey::ProcrastinationAlert { task_id } => {
                Some(task_id)
            }
            TimerKey::ProductivitySuggestion { .. } | TimerKey::OverdueSweep => None,
        }
    }

    /// Stable notification tag for this timer.
    pub fn tag(&self) -> String {
        match self {
            TimerKey::DeadlineReminder {
                task_id,
                offset_minutes,
            } => format!("deadline-{task_id}-{offset_minutes}"),
            TimerKey::ProcrastinationAlert { task_id } => format!("procrastination-{task_id}"),
            TimerKey::ProductivitySuggestion { hour } => format!("productivity-{hour}"),
            TimerKey::OverdueSweep => "overdue-sweep".to_string(),
        }
    }
}

impl std::fmt::Display for TimerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerKey::DeadlineReminder {
                task_id,
                offset_minutes,
            } => write!(f, "reminder {offset_minutes}m before {task_id}"),
            TimerKey::ProcrastinationAlert { task_id } => write!(f, "start alert for {task_id}"),
            TimerKey::ProductivitySuggestion { hour } => write!(f, "productivity suggestion at {hour:02}:00"),
            TimerKey::OverdueSweep => write!(f, "overdue sweep"),
        }
    }
}

/// Data captured when the timer was armed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerPayload {
    Reminder { task: TaskRef },
    StartAlert { task: TaskRef, adjusted_minutes: u32 },
    /// Standing timers (productivity, sweep) read fresh state when they fire
    Standing,
}

impl TimerPayload {
    pub fn task(&self) -> Option<&TaskRef> {
        match self {
            TimerPayload::Reminder { task } | TimerPayload::StartAlert { task, .. } => Some(task),
            TimerPayload::Standing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTimer {
    pub key: TimerKey,
    pub fire_at: DateTime<Utc>,
    pub payload: TimerPayload,
}

#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    /// `(fire_at, seq)` keeps insertion order among timers due at the same instant
    order: BTreeMap<(DateTime<Utc>, u64), TimerKey>,
    armed: HashMap<TimerKey, (u64, ScheduledTimer)>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn get(&self, key: &TimerKey) -> Option<&ScheduledTimer> {
        self.armed.get(key).map(|(_, timer)| timer)
    }

    /// Arm a timer, returning the one it replaced.
    pub fn arm(&mut self, timer: ScheduledTimer) -> Option<ScheduledTimer> {
        let replaced = self.cancel(&timer.key);
        self.seq += 1;
        self.order.insert((timer.fire_at, self.seq), timer.key.clone());
        self.armed.insert(timer.key.clone(), (self.seq, timer));
        replaced
    }

    pub fn cancel(&mut self, key: &TimerKey) -> Option<ScheduledTimer> {
        let (seq, timer) = self.armed.remove(key)?;
        self.order.remove(&(timer.fire_at, seq));
        Some(timer)
    }

    /// Cancel every timer belonging to a task.
    pub fn cancel_task(&mut self, task_id: &str) -> Vec<ScheduledTimer> {
        let keys: Vec<TimerKey> = self
            .armed
            .keys()
            .filter(|key| key.task_id() == Some(task_id))
            .cloned()
            .collect();
        let mut cancelled: Vec<ScheduledTimer> =
            keys.iter().filter_map(|key| self.cancel(key)).collect();
        cancelled.sort_by_key(|timer| timer.fire_at);
        cancelled
    }

    pub fn cancel_all(&mut self) -> Vec<ScheduledTimer> {
        self.order.clear();
        let mut cancelled: Vec<ScheduledTimer> =
            self.armed.drain().map(|(_, (_, timer))| timer).collect();
        cancelled.sort_by_key(|timer| timer.fire_at);
        cancelled
    }

    /// Remove and return every timer with `fire_at <= now`, earliest first.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledTimer> {
        let mut due = Vec::new();
        while let Some(entry) = self.order.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let key = entry.remove();
            if let Some((_, timer)) = self.armed.remove(&key) {
                due.push(timer);
            }
        }
        due
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.order.keys().next().map(|(at, _)| *at)
    }

    /// Armed timers in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTimer> {
        self.order
            .values()
            .filter_map(|key| self.armed.get(key).map(|(_, timer)| timer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn reminder(task: &str, offset: u32, fire_in: i64) -> ScheduledTimer {
        ScheduledTimer {
            key: TimerKey::DeadlineReminder {
                task_id: task.to_string(),
                offset_minutes: offset,
            },
            fire_at: t0() + Duration::minutes(fire_in),
            payload: TimerPayload::Standing,
        }
    }

    #[test]
    fn rearming_replaces_previous_timer() {
        let mut queue = TimerQueue::new();
        assert!(queue.arm(reminder("a", 30, 10)).is_none());
        let replaced = queue.arm(reminder("a", 30, 20)).unwrap();
        assert_eq!(replaced.fire_at, t0() + Duration::minutes(10));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_fire_at(), Some(t0() + Duration::minutes(20)));
    }

    #[test]
    fn pop_due_is_ordered_and_inclusive() {
        let mut queue = TimerQueue::new();
        queue.arm(reminder("a", 5, 30));
        queue.arm(reminder("b", 5, 10));
        queue.arm(reminder("c", 5, 20));

        let due = queue.pop_due(t0() + Duration::minutes(20));
        let ids: Vec<_> = due.iter().filter_map(|t| t.key.task_id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(queue.len(), 1);
        assert!(queue.pop_due(t0()).is_empty());
    }

    #[test]
    fn cancel_task_leaves_other_tasks() {
        let mut queue = TimerQueue::new();
        queue.arm(reminder("a", 60, 10));
        queue.arm(reminder("a", 30, 40));
        queue.arm(reminder("b", 30, 40));
        queue.arm(ScheduledTimer {
            key: TimerKey::OverdueSweep,
            fire_at: t0(),
            payload: TimerPayload::Standing,
        });

        let cancelled = queue.cancel_task("a");
        assert_eq!(cancelled.len(), 2);
        assert_eq!(queue.len(), 2);
        assert!(queue.get(&TimerKey::OverdueSweep).is_some());

        assert_eq!(queue.cancel_all().len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.next_fire_at(), None);
    }

    #[test]
    fn tags_are_stable() {
        let key = TimerKey::DeadlineReminder {
            task_id: "t9".to_string(),
            offset_minutes: 15,
        };
        assert_eq!(key.tag(), "deadline-t9-15");
        assert_eq!(
            TimerKey::ProcrastinationAlert {
                task_id: "t9".to_string()
            }
            .tag(),
            "procrastination-t9"
        );
    }
}
