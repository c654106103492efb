//! The host-owned entry point.
//!
//! A [`Session`] owns the learned patterns, the notification settings and the
//! timer queue, and borrows everything else from the host: the task
//! collection, the clock, the store and the notification sinks. All mutation
//! happens inside one `&mut self` call, so wrapping the session in a single
//! mutex is enough to share it with [`crate::scheduler::driver::run`].

use chrono::{DateTime, FixedOffset, Utc};

use crate::clock::{Clock, SystemClock};
use crate::conflict::{find_conflicts, ConflictWindow};
use crate::error::Result;
use crate::estimation::{
    detect_patterns, insights, EstimationInsights, EstimationModel, PatternReport, RiskLevel,
    UserPatterns,
};
use crate::events::Event;
use crate::notify::{LogSink, NotificationSettings, NotificationSink, SettingsPatch};
use crate::pressure::{classify, PressureClassification};
use crate::scheduler::{Scheduler, Sinks};
use crate::storage::PatternStore;
use crate::suggestions::{suggest, Suggestion};
use crate::task::{Task, TaskSource};

pub struct Session<S, C = SystemClock> {
    source: S,
    clock: C,
    store: Box<dyn PatternStore>,
    primary: Box<dyn NotificationSink>,
    fallback: Box<dyn NotificationSink>,
    model: EstimationModel,
    scheduler: Scheduler,
}

impl<S: TaskSource, C: Clock> Session<S, C> {
    /// Build a session from whatever the store holds.
    ///
    /// Unreadable or invalid stored state falls back to defaults with a
    /// warning. Both sinks start as [`LogSink`].
    pub fn new(source: S, clock: C, store: impl PatternStore + 'static, offset: FixedOffset) -> Self {
        let patterns = match store.load_patterns() {
            Ok(Some(patterns)) => patterns,
            Ok(None) => UserPatterns::default(),
            Err(err) => {
                tracing::warn!(%err, "could not load learned patterns, starting fresh");
                UserPatterns::default()
            }
        };
        let settings = match store.load_settings() {
            Ok(Some(settings)) => match settings.validate() {
                Ok(()) => settings,
                Err(err) => {
                    tracing::warn!(%err, "stored notification settings are invalid, using defaults");
                    NotificationSettings::default()
                }
            },
            Ok(None) => NotificationSettings::default(),
            Err(err) => {
                tracing::warn!(%err, "could not load notification settings, using defaults");
                NotificationSettings::default()
            }
        };

        Self {
            source,
            clock,
            store: Box::new(store),
            primary: Box::new(LogSink),
            fallback: Box::new(LogSink),
            model: EstimationModel::new(patterns, offset),
            scheduler: Scheduler::new(settings, offset),
        }
    }

    pub fn with_sinks(
        mut self,
        primary: impl NotificationSink + 'static,
        fallback: impl NotificationSink + 'static,
    ) -> Self {
        self.primary = Box::new(primary);
        self.fallback = Box::new(fallback);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.source.tasks()
    }

    pub fn model(&self) -> &EstimationModel {
        &self.model
    }

    pub fn patterns(&self) -> &UserPatterns {
        self.model.patterns()
    }

    pub fn settings(&self) -> &NotificationSettings {
        self.scheduler.settings()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Arm the standing timers and schedule every task in the source.
    pub fn start(&mut self) -> Vec<Event> {
        let now = self.now();
        let mut events = self.scheduler.start(now);
        for task in self.source.tasks() {
            events.extend(self.scheduler.schedule_task(&task, &self.model, now));
        }
        events
    }

    pub fn classify(&self, task: &Task) -> PressureClassification {
        classify(task, self.now())
    }

    /// Every task in the source with its classification, source order.
    pub fn classify_all(&self) -> Vec<(Task, PressureClassification)> {
        let now = self.now();
        self.source
            .tasks()
            .into_iter()
            .map(|task| {
                let pressure = classify(&task, now);
                (task, pressure)
            })
            .collect()
    }

    pub fn conflicts(&self) -> Vec<ConflictWindow> {
        find_conflicts(&self.source.tasks(), self.now())
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        suggest(&self.source.tasks(), self.now())
    }

    pub fn adjusted_estimate(&self, task: &Task) -> u32 {
        self.model.adjusted_estimate(task)
    }

    pub fn realistic_deadline(&self, task: &Task) -> Option<DateTime<Utc>> {
        self.model.realistic_deadline(task, self.now())
    }

    pub fn procrastination_risk(&self, task: &Task) -> RiskLevel {
        self.model.procrastination_risk(task, self.now())
    }

    /// Learn from a completed task and drop its pending timers.
    pub fn record_completion(&mut self, task: &Task) -> Vec<Event> {
        let now = self.now();
        let mut events = Vec::new();
        if self.model.record_completion(task, now) {
            self.persist_patterns();
            let patterns = self.model.patterns();
            events.push(Event::PatternsUpdated {
                version: patterns.version,
                procrastination_coefficient: patterns.procrastination_coefficient,
                at: now,
            });
        }
        events.extend(self.scheduler.unschedule_task(&task.id, now));
        events
    }

    pub fn detect_patterns(&self) -> PatternReport {
        detect_patterns(&self.source.tasks(), self.model.patterns(), self.now())
    }

    pub fn insights(&self) -> EstimationInsights {
        insights(self.model.patterns())
    }

    /// Forget everything learned and persist the empty state.
    pub fn reset_patterns(&mut self) -> Vec<Event> {
        self.model.reset();
        self.persist_patterns();
        vec![Event::PatternsUpdated {
            version: 0,
            procrastination_coefficient: 1.0,
            at: self.now(),
        }]
    }

    /// Schedule one task now. The next [`Session::tick`] unschedules it
    /// again unless the source holds it.
    pub fn schedule_task(&mut self, task: &Task) -> Vec<Event> {
        let now = self.now();
        self.scheduler.schedule_task(task, &self.model, now)
    }

    pub fn unschedule_task(&mut self, task_id: &str) -> Vec<Event> {
        let now = self.now();
        self.scheduler.unschedule_task(task_id, now)
    }

    /// Merge a partial settings update, persist it and reschedule every task
    /// under the new timing.
    ///
    /// # Errors
    ///
    /// Returns a validation error, leaving the current settings untouched,
    /// when the merged settings are invalid.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Vec<Event>> {
        let next = self.scheduler.settings().merged(patch);
        next.validate()?;
        if let Err(err) = self.store.save_settings(&next) {
            tracing::warn!(%err, "could not persist notification settings");
        }

        let now = self.now();
        let mut events = self.scheduler.apply_settings(next, now);
        for task in self.source.tasks() {
            events.extend(self.scheduler.schedule_task(&task, &self.model, now));
        }
        events.push(Event::SettingsUpdated { at: now });
        Ok(events)
    }

    /// Reconcile timers with the task source, then fire every due timer.
    ///
    /// Tasks added or edited in the source since the last tick are
    /// rescheduled and tasks removed from it lose their timers, so a host
    /// only has to keep the source current.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.now();
        let tasks = self.source.tasks();
        let mut events = self.scheduler.sync_tasks(&tasks, &self.model, now);
        let mut sinks = Sinks {
            primary: self.primary.as_mut(),
            fallback: self.fallback.as_mut(),
        };
        events.extend(self.scheduler.poll(now, &tasks, &mut sinks));
        events
    }

    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_fire_at()
    }

    /// Cancel every timer.
    pub fn shutdown(&mut self) -> Vec<Event> {
        let now = self.now();
        self.scheduler.cancel_all(now)
    }

    fn persist_patterns(&mut self) {
        if let Err(err) = self.store.save_patterns(self.model.patterns()) {
            tracing::warn!(%err, "could not persist learned patterns, keeping them in memory");
        }
    }
}
