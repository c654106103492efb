//! Reminder and alert scheduling.
//!
//! The scheduler keeps a logical queue of timers and turns the ones that are
//! due into notifications when polled:
//!
//! - **Deadline reminders**: one per offset in the task's priority timing list
//! - **Procrastination alert**: when the adjusted estimate says "start now"
//! - **Productivity suggestions**: once per productive hour, every day
//! - **Overdue sweep**: every five minutes, one notice per overdue task
//!
//! Each notification passes the [`DispatchGate`] before it reaches a sink.
//! The scheduler never sleeps itself; [`driver::run`] maps the queue onto
//! real time.

pub mod driver;
mod queue;

pub use queue::{ScheduledTimer, TimerKey, TimerPayload, TimerQueue};

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use std::collections::HashMap;

use crate::estimation::EstimationModel;
use crate::events::Event;
use crate::notify::{
    DispatchGate, Notification, NotificationAction, NotificationKind, NotificationSettings,
    NotificationSink,
};
use crate::pressure::{classify, classify_all};
use crate::suggestions::rank_active;
use crate::task::{Priority, Task, TaskRef};

/// Minutes between overdue sweeps. Also the longest the driver sleeps.
pub const SWEEP_INTERVAL_MINUTES: i64 = 5;

/// Headline word for a reminder `offset_minutes` before the deadline.
pub fn urgency_label(offset_minutes: u32) -> &'static str {
    match offset_minutes {
        0..=5 => "URGENT",
        6..=15 => "Soon",
        16..=60 => "Approaching",
        _ => "Reminder",
    }
}

/// Render a duration for notification text.
pub fn humanize_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    if minutes < 60 {
        plural(minutes, "minute")
    } else if minutes < 48 * 60 {
        plural((minutes as f64 / 60.0).round() as i64, "hour")
    } else {
        plural((minutes as f64 / 1440.0).round() as i64, "day")
    }
}

/// The next instant strictly after `now` at `hour:00` local time.
fn next_local_hour(hour: u32, now: DateTime<Utc>, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let local = now.with_timezone(&offset);
    let naive = local.date_naive().and_hms_opt(hour, 0, 0)?;
    let today = offset.from_local_datetime(&naive).single()?.with_timezone(&Utc);
    if today > now {
        Some(today)
    } else {
        Some(today + Duration::days(1))
    }
}

/// The task fields timers are derived from. A task whose fingerprint changes
/// is rescheduled.
#[derive(Debug, Clone, PartialEq)]
struct TaskFingerprint {
    content: String,
    priority: Priority,
    estimated_time: Option<u32>,
    deadline: Option<DateTime<Utc>>,
    completed: bool,
    adjusted_minutes: u32,
}

impl TaskFingerprint {
    fn of(task: &Task, model: &EstimationModel) -> Self {
        Self {
            content: task.content.clone(),
            priority: task.priority,
            estimated_time: task.estimated_time,
            deadline: task.deadline,
            completed: task.completed,
            adjusted_minutes: model.adjusted_estimate(task),
        }
    }
}

/// Where notifications go. The fallback is offered anything the primary
/// rejects.
pub struct Sinks<'a> {
    pub primary: &'a mut dyn NotificationSink,
    pub fallback: &'a mut dyn NotificationSink,
}

pub struct Scheduler {
    settings: NotificationSettings,
    offset: FixedOffset,
    queue: TimerQueue,
    gate: DispatchGate,
    standing: bool,
    scheduled: HashMap<String, TaskFingerprint>,
}

impl Scheduler {
    pub fn new(settings: NotificationSettings, offset: FixedOffset) -> Self {
        Self {
            settings,
            offset,
            queue: TimerQueue::new(),
            gate: DispatchGate::new(),
            standing: false,
            scheduled: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Armed timers in firing order.
    pub fn timers(&self) -> impl Iterator<Item = &ScheduledTimer> {
        self.queue.iter()
    }

    pub fn timer(&self, key: &TimerKey) -> Option<&ScheduledTimer> {
        self.queue.get(key)
    }

    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.queue.next_fire_at()
    }

    /// Notifications delivered within the last hour.
    pub fn recent_deliveries(&mut self, now: DateTime<Utc>) -> usize {
        self.gate.recent_deliveries(now)
    }

    /// Arm the standing timers: the overdue sweep and productivity hours.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.standing = true;
        let mut events = vec![self.arm(
            TimerKey::OverdueSweep,
            now + Duration::minutes(SWEEP_INTERVAL_MINUTES),
            TimerPayload::Standing,
            now,
        )];
        events.extend(self.arm_productivity(now));
        events
    }

    /// Replace the settings. Productivity timers follow the new hour list;
    /// per-task timers are left alone (the caller reschedules tasks).
    pub fn apply_settings(&mut self, settings: NotificationSettings, now: DateTime<Utc>) -> Vec<Event> {
        self.settings = settings;
        let stale: Vec<TimerKey> = self
            .queue
            .iter()
            .filter(|t| matches!(t.key, TimerKey::ProductivitySuggestion { .. }))
            .map(|t| t.key.clone())
            .collect();
        let mut events: Vec<Event> = stale
            .into_iter()
            .filter_map(|key| self.cancel(&key, now))
            .collect();
        if self.standing {
            events.extend(self.arm_productivity(now));
        }
        events
    }

    /// (Re)register every timer for a task.
    ///
    /// Existing timers for the task are cancelled first. Only timers that
    /// would fire after `now` are armed, so completed tasks, tasks without a
    /// deadline and tasks past every offset end up with none.
    pub fn schedule_task(&mut self, task: &Task, model: &EstimationModel, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.cancel_task_timers(&task.id, now);
        self.scheduled
            .insert(task.id.clone(), TaskFingerprint::of(task, model));
        if task.completed {
            return events;
        }
        let Some(deadline) = task.deadline else {
            return events;
        };
        let task_ref = task.to_ref();

        let offsets = self.settings.reminder_timing.for_priority(task.priority).to_vec();
        for offset in offsets {
            let fire_at = deadline - Duration::minutes(offset as i64);
            if fire_at > now {
                events.push(self.arm(
                    TimerKey::DeadlineReminder {
                        task_id: task.id.clone(),
                        offset_minutes: offset,
                    },
                    fire_at,
                    TimerPayload::Reminder {
                        task: task_ref.clone(),
                    },
                    now,
                ));
            }
        }

        let adjusted = model.adjusted_estimate(task);
        let start_by = deadline - Duration::minutes(adjusted as i64);
        if start_by > now {
            events.push(self.arm(
                TimerKey::ProcrastinationAlert {
                    task_id: task.id.clone(),
                },
                start_by,
                TimerPayload::StartAlert {
                    task: task_ref,
                    adjusted_minutes: adjusted,
                },
                now,
            ));
        }
        events
    }

    /// Bring the timers in line with the task collection: new and edited
    /// tasks are (re)scheduled, tasks gone from the collection lose their
    /// timers. Unchanged tasks are left alone.
    pub fn sync_tasks(&mut self, tasks: &[Task], model: &EstimationModel, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        for task in tasks {
            if self.scheduled.get(&task.id) != Some(&TaskFingerprint::of(task, model)) {
                tracing::debug!(task_id = %task.id, "task new or changed, rescheduling");
                events.extend(self.schedule_task(task, model, now));
            }
        }
        let gone: Vec<String> = self
            .scheduled
            .keys()
            .filter(|id| !tasks.iter().any(|t| &t.id == *id))
            .cloned()
            .collect();
        for id in gone {
            tracing::debug!(task_id = %id, "task removed, unscheduling");
            events.extend(self.unschedule_task(&id, now));
        }
        events
    }

    pub fn unschedule_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.scheduled.remove(task_id);
        self.cancel_task_timers(task_id, now)
    }

    fn cancel_task_timers(&mut self, task_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.queue
            .cancel_task(task_id)
            .into_iter()
            .map(|timer| {
                tracing::debug!(key = %timer.key, "timer cancelled");
                Event::TimerCancelled { key: timer.key, at: now }
            })
            .collect()
    }

    /// Cancel everything, standing timers included.
    pub fn cancel_all(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.standing = false;
        self.scheduled.clear();
        self.queue
            .cancel_all()
            .into_iter()
            .map(|timer| Event::TimerCancelled { key: timer.key, at: now })
            .collect()
    }

    /// Fire every timer due at `now`.
    ///
    /// `tasks` is the current task collection: tasks that are completed or
    /// no longer in it drop their pending reminders, and the standing timers
    /// read it fresh.
    pub fn poll(&mut self, now: DateTime<Utc>, tasks: &[Task], sinks: &mut Sinks<'_>) -> Vec<Event> {
        let mut events = Vec::new();
        for timer in self.queue.pop_due(now) {
            tracing::debug!(key = %timer.key, fire_at = %timer.fire_at, "timer due");
            match &timer.key {
                TimerKey::DeadlineReminder { .. } | TimerKey::ProcrastinationAlert { .. } => {
                    let resolved = timer
                        .key
                        .task_id()
                        .and_then(|id| tasks.iter().find(|t| t.id == id))
                        .map_or(true, |t| t.completed);
                    if resolved {
                        events.push(Event::TimerDropped { key: timer.key, at: now });
                        continue;
                    }
                    if let Some(notification) = task_notification(&timer, now) {
                        self.dispatch(notification, now, sinks, &mut events);
                    }
                }
                TimerKey::ProductivitySuggestion { hour } => {
                    let hour = *hour;
                    let notification = productivity_notification(timer.key.tag(), tasks, now);
                    self.dispatch(notification, now, sinks, &mut events);
                    if let Some(next) = next_local_hour(hour, now, self.offset) {
                        events.push(self.arm(timer.key, next, TimerPayload::Standing, now));
                    }
                }
                TimerKey::OverdueSweep => {
                    for task in tasks.iter().filter(|t| t.is_overdue(now)) {
                        let notification = overdue_notification(task, now);
                        self.dispatch(notification, now, sinks, &mut events);
                    }
                    events.push(self.arm(
                        timer.key,
                        now + Duration::minutes(SWEEP_INTERVAL_MINUTES),
                        TimerPayload::Standing,
                        now,
                    ));
                }
            }
        }
        events
    }

    fn arm(&mut self, key: TimerKey, fire_at: DateTime<Utc>, payload: TimerPayload, now: DateTime<Utc>) -> Event {
        tracing::debug!(key = %key, %fire_at, "timer armed");
        self.queue.arm(ScheduledTimer {
            key: key.clone(),
            fire_at,
            payload,
        });
        Event::TimerArmed { key, fire_at, at: now }
    }

    fn cancel(&mut self, key: &TimerKey, now: DateTime<Utc>) -> Option<Event> {
        let timer = self.queue.cancel(key)?;
        tracing::debug!(key = %timer.key, "timer cancelled");
        Some(Event::TimerCancelled { key: timer.key, at: now })
    }

    fn arm_productivity(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let hours = self.settings.productive_hours.clone();
        let mut events = Vec::new();
        for hour in hours {
            match next_local_hour(hour, now, self.offset) {
                Some(fire_at) => events.push(self.arm(
                    TimerKey::ProductivitySuggestion { hour },
                    fire_at,
                    TimerPayload::Standing,
                    now,
                )),
                None => tracing::warn!(hour, "ignoring invalid productive hour"),
            }
        }
        events
    }

    fn dispatch(&mut self, notification: Notification, now: DateTime<Utc>, sinks: &mut Sinks<'_>, events: &mut Vec<Event>) {
        let decision = self
            .gate
            .check(&self.settings, notification.kind, &notification.tag, now, self.offset);
        if !decision.allows() {
            tracing::debug!(tag = %notification.tag, ?decision, "notification skipped");
            events.push(Event::NotificationSkipped {
                kind: notification.kind,
                tag: notification.tag,
                reason: decision,
                at: now,
            });
            return;
        }

        let via_fallback = if sinks.primary.deliver(&notification) {
            false
        } else {
            tracing::warn!(tag = %notification.tag, "primary sink rejected notification, using fallback");
            if !sinks.fallback.deliver(&notification) {
                tracing::warn!(tag = %notification.tag, "fallback sink rejected notification");
                events.push(Event::DeliveryFailed {
                    kind: notification.kind,
                    tag: notification.tag,
                    at: now,
                });
                return;
            }
            true
        };

        self.gate.record_delivery(now, &notification.tag);
        tracing::info!(tag = %notification.tag, via_fallback, "notification dispatched");
        events.push(Event::NotificationDispatched {
            notification,
            via_fallback,
            at: now,
        });
    }
}

fn task_action(task: &TaskRef) -> NotificationAction {
    NotificationAction::OpenTask {
        task_id: task.id.clone(),
    }
}

fn task_notification(timer: &ScheduledTimer, now: DateTime<Utc>) -> Option<Notification> {
    match (&timer.key, &timer.payload) {
        (TimerKey::DeadlineReminder { offset_minutes, .. }, TimerPayload::Reminder { task }) => {
            let remaining = task
                .deadline
                .map(|d| (d - now).num_minutes())
                .unwrap_or(*offset_minutes as i64);
            Some(
                Notification::new(
                    NotificationKind::DeadlineReminder,
                    format!("{}: {}", urgency_label(*offset_minutes), task.content),
                    format!("Due in {}", humanize_minutes(remaining)),
                    timer.key.tag(),
                    task_action(task),
                    now,
                )
                .requiring_interaction(*offset_minutes <= 15),
            )
        }
        (
            TimerKey::ProcrastinationAlert { .. },
            TimerPayload::StartAlert {
                task,
                adjusted_minutes,
            },
        ) => {
            let remaining = task.deadline.map(|d| (d - now).num_minutes()).unwrap_or(0);
            Some(
                Notification::new(
                    NotificationKind::ProcrastinationAlert,
                    format!("Time to start: {}", task.content),
                    format!(
                        "At your usual pace this takes about {}, and it is due in {}.",
                        humanize_minutes(*adjusted_minutes as i64),
                        humanize_minutes(remaining)
                    ),
                    timer.key.tag(),
                    task_action(task),
                    now,
                )
                .requiring_interaction(true),
            )
        }
        _ => {
            tracing::warn!(key = %timer.key, "timer payload does not match its key");
            None
        }
    }
}

fn productivity_notification(tag: String, tasks: &[Task], now: DateTime<Utc>) -> Notification {
    let classified = classify_all(tasks, now);
    let ranked = rank_active(&classified);
    let (body, action) = match ranked.first() {
        Some((task, pressure)) => (
            format!("Good time to work on \"{}\" ({})", task.content, pressure.message),
            NotificationAction::OpenTask {
                task_id: task.id.clone(),
            },
        ),
        None => (
            "Nothing pressing right now. A good time to get ahead.".to_string(),
            NotificationAction::OpenDashboard,
        ),
    };
    Notification::new(
        NotificationKind::ProductivitySuggestion,
        "Productive hour",
        body,
        tag,
        action,
        now,
    )
}

fn overdue_notification(task: &Task, now: DateTime<Utc>) -> Notification {
    Notification::new(
        NotificationKind::Overdue,
        format!("Overdue: {}", task.content),
        classify(task, now).message,
        format!("overdue-{}", task.id),
        NotificationAction::OpenTask {
            task_id: task.id.clone(),
        },
        now,
    )
    .requiring_interaction(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{GateDecision, MemorySink, QuietHours};
    use crate::task::Priority;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(NotificationSettings::default(), utc())
    }

    fn armed_keys(events: &[Event]) -> Vec<TimerKey> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::TimerArmed { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    fn poll(s: &mut Scheduler, at: DateTime<Utc>, tasks: &[Task], sink: &mut MemorySink) -> Vec<Event> {
        let mut fallback = MemorySink::new();
        let mut sinks = Sinks {
            primary: sink,
            fallback: &mut fallback,
        };
        s.poll(at, tasks, &mut sinks)
    }

    #[test]
    fn urgency_labels() {
        assert_eq!(urgency_label(5), "URGENT");
        assert_eq!(urgency_label(15), "Soon");
        assert_eq!(urgency_label(30), "Approaching");
        assert_eq!(urgency_label(60), "Approaching");
        assert_eq!(urgency_label(120), "Reminder");
    }

    #[test]
    fn humanized_durations() {
        assert_eq!(humanize_minutes(1), "1 minute");
        assert_eq!(humanize_minutes(45), "45 minutes");
        assert_eq!(humanize_minutes(120), "2 hours");
        assert_eq!(humanize_minutes(3 * 1440), "3 days");
        assert_eq!(humanize_minutes(-5), "0 minutes");
    }

    #[test]
    fn only_future_reminders_are_armed() {
        let mut s = scheduler();
        let task = Task::new("ship")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_estimate(60)
            .with_deadline(now() + Duration::minutes(47));
        let events = s.schedule_task(&task, &EstimationModel::default(), now());

        let offsets: Vec<u32> = armed_keys(&events)
            .into_iter()
            .filter_map(|k| match k {
                TimerKey::DeadlineReminder { offset_minutes, .. } => Some(offset_minutes),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![30, 15, 5]);
        // Start-by time (deadline - 60m) already passed
        assert!(s
            .timer(&TimerKey::ProcrastinationAlert {
                task_id: "t1".to_string()
            })
            .is_none());
    }

    #[test]
    fn rescheduling_replaces_timers() {
        let mut s = scheduler();
        let model = EstimationModel::default();
        let task = Task::new("report")
            .with_id("t1")
            .with_priority(Priority::Medium)
            .with_deadline(now() + Duration::days(3));
        s.schedule_task(&task, &model, now());
        // medium: 1440 and 60 reminders plus the start alert
        assert_eq!(s.timers().count(), 3);

        let events = s.schedule_task(&task.clone().complete(30, now()), &model, now());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::TimerCancelled { .. }))
                .count(),
            3
        );
        assert_eq!(s.timers().count(), 0);
    }

    #[test]
    fn deadline_less_task_has_no_timers() {
        let mut s = scheduler();
        let events = s.schedule_task(&Task::new("someday"), &EstimationModel::default(), now());
        assert!(events.is_empty());
        assert_eq!(s.next_fire_at(), None);
    }

    #[test]
    fn due_reminder_is_dispatched() {
        let mut s = scheduler();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(20));
        s.schedule_task(&task, &EstimationModel::default(), now());

        let mut sink = MemorySink::new();
        let events = poll(&mut s, now() + Duration::minutes(5), &[task.clone()], &mut sink);
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].tag, "deadline-t1-15");
        assert_eq!(delivered[0].title, "Soon: taxes");
        assert_eq!(delivered[0].body, "Due in 15 minutes");
        assert!(delivered[0].require_interaction);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn completed_task_drops_pending_reminder() {
        let mut s = scheduler();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(20));
        s.schedule_task(&task, &EstimationModel::default(), now());

        let mut sink = MemorySink::new();
        let done = task.complete(10, now());
        let events = poll(&mut s, now() + Duration::minutes(5), &[done], &mut sink);
        assert!(sink.delivered().is_empty());
        assert!(matches!(events[0], Event::TimerDropped { .. }));
    }

    #[test]
    fn task_missing_from_source_drops_pending_reminder() {
        let mut s = scheduler();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(20));
        s.schedule_task(&task, &EstimationModel::default(), now());

        let mut sink = MemorySink::new();
        let events = poll(&mut s, now() + Duration::minutes(5), &[], &mut sink);
        assert!(sink.delivered().is_empty());
        assert!(matches!(events[0], Event::TimerDropped { .. }));
    }

    #[test]
    fn sync_arms_new_tasks_and_skips_unchanged_ones() {
        let mut s = scheduler();
        let model = EstimationModel::default();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(47));

        let events = s.sync_tasks(&[task.clone()], &model, now());
        assert_eq!(armed_keys(&events).len(), 3);
        assert!(s.sync_tasks(&[task], &model, now() + Duration::minutes(1)).is_empty());
    }

    #[test]
    fn sync_follows_an_edited_deadline() {
        let mut s = scheduler();
        let model = EstimationModel::default();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(47));
        s.sync_tasks(&[task.clone()], &model, now());

        let moved = task.with_deadline(now() + Duration::minutes(20));
        s.sync_tasks(&[moved], &model, now());
        let reminder = s
            .timer(&TimerKey::DeadlineReminder {
                task_id: "t1".to_string(),
                offset_minutes: 15,
            })
            .unwrap();
        assert_eq!(reminder.fire_at, now() + Duration::minutes(5));
        assert_eq!(
            reminder.payload.task().and_then(|t| t.deadline),
            Some(now() + Duration::minutes(20))
        );
        assert!(s
            .timer(&TimerKey::DeadlineReminder {
                task_id: "t1".to_string(),
                offset_minutes: 30,
            })
            .is_none());
    }

    #[test]
    fn sync_unschedules_removed_tasks() {
        let mut s = scheduler();
        let model = EstimationModel::default();
        let task = Task::new("taxes")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(47));
        s.sync_tasks(&[task], &model, now());

        let events = s.sync_tasks(&[], &model, now());
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(e, Event::TimerCancelled { .. })));
        assert_eq!(s.next_fire_at(), None);
    }

    #[test]
    fn quiet_hours_skip_without_error() {
        let settings = NotificationSettings {
            quiet_hours: QuietHours::new("09:00", "11:00"),
            ..NotificationSettings::default()
        };
        let mut s = Scheduler::new(settings, utc());
        let task = Task::new("call")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(20));
        s.schedule_task(&task, &EstimationModel::default(), now());

        let mut sink = MemorySink::new();
        let events = poll(&mut s, now() + Duration::minutes(5), &[task], &mut sink);
        assert!(sink.delivered().is_empty());
        assert!(matches!(
            events[0],
            Event::NotificationSkipped {
                reason: GateDecision::QuietHours,
                ..
            }
        ));
    }

    #[test]
    fn rejected_delivery_uses_fallback() {
        let mut s = scheduler();
        let task = Task::new("call")
            .with_id("t1")
            .with_priority(Priority::Urgent)
            .with_deadline(now() + Duration::minutes(20));
        s.schedule_task(&task, &EstimationModel::default(), now());

        let mut primary = MemorySink::rejecting();
        let mut fallback = MemorySink::new();
        let mut sinks = Sinks {
            primary: &mut primary,
            fallback: &mut fallback,
        };
        let events = s.poll(now() + Duration::minutes(5), &[task], &mut sinks);
        assert_eq!(fallback.delivered().len(), 1);
        assert!(matches!(
            events[0],
            Event::NotificationDispatched {
                via_fallback: true,
                ..
            }
        ));
    }

    #[test]
    fn sweep_reports_overdue_tasks_and_rearms() {
        let mut s = scheduler();
        s.start(now());
        let overdue = Task::new("late").with_id("t1").with_deadline(now() - Duration::hours(2));
        let fine = Task::new("fine").with_id("t2").with_deadline(now() + Duration::days(2));

        let mut sink = MemorySink::new();
        let at = now() + Duration::minutes(SWEEP_INTERVAL_MINUTES);
        poll(&mut s, at, &[overdue, fine], &mut sink);

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].tag, "overdue-t1");
        assert_eq!(delivered[0].body, "Overdue by 2 hours");
        assert_eq!(
            s.timer(&TimerKey::OverdueSweep).map(|t| t.fire_at),
            Some(at + Duration::minutes(SWEEP_INTERVAL_MINUTES))
        );
    }

    #[test]
    fn productivity_suggestion_names_top_task_and_rearms() {
        let mut s = scheduler();
        s.start(now());
        // 10:00 now, so 09:00 is tomorrow and 14:00 is today
        let at_14 = Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap();
        let key = TimerKey::ProductivitySuggestion { hour: 14 };
        assert_eq!(s.timer(&key).map(|t| t.fire_at), Some(at_14));
        assert_eq!(
            s.timer(&TimerKey::ProductivitySuggestion { hour: 9 }).map(|t| t.fire_at),
            Some(Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap())
        );

        let tasks = vec![
            Task::new("later").with_id("a").with_deadline(now() + Duration::days(10)),
            Task::new("soon").with_id("b").with_deadline(at_14 + Duration::hours(3)),
        ];
        let settings = NotificationSettings {
            overdue_alerts: false,
            ..NotificationSettings::default()
        };
        s.apply_settings(settings, now());

        let mut sink = MemorySink::new();
        poll(&mut s, at_14, &tasks, &mut sink);
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].body, "Good time to work on \"soon\" (Due in 3 hours)");
        assert_eq!(delivered[0].task_id(), Some("b"));
        assert_eq!(
            s.timer(&key).map(|t| t.fire_at),
            Some(at_14 + Duration::days(1))
        );
    }

    #[test]
    fn productivity_hours_follow_settings() {
        let mut s = scheduler();
        s.start(now());
        let settings = NotificationSettings {
            productive_hours: vec![16],
            ..NotificationSettings::default()
        };
        s.apply_settings(settings, now());
        let hours: Vec<u32> = s
            .timers()
            .filter_map(|t| match t.key {
                TimerKey::ProductivitySuggestion { hour } => Some(hour),
                _ => None,
            })
            .collect();
        assert_eq!(hours, vec![16]);
    }

    #[test]
    fn cancel_all_clears_standing_timers() {
        let mut s = scheduler();
        s.start(now());
        assert_eq!(s.timers().count(), 3);
        assert_eq!(s.cancel_all(now()).len(), 3);
        assert_eq!(s.next_fire_at(), None);
    }
}
