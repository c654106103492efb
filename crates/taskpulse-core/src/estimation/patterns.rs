//! Learned estimation patterns.
//!
//! [`UserPatterns`] is a plain value: learning never mutates it in place but
//! produces the next version through [`UserPatterns::record_completion`].
//! Every derived multiplier is recomputed from the full observation buffer
//! after each append.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::task::{Priority, Task};

/// Observations kept in the ring buffer.
pub const MAX_OBSERVATIONS: usize = 100;

/// Weight decay per step of age for the global coefficient.
pub const RECENCY_DECAY: f64 = 0.9;

/// Observations a bucket needs before its multiplier is learned.
pub const MIN_BUCKET_OBSERVATIONS: usize = 3;

/// Part of the day a deadline (or completion) falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Morning 6-12, afternoon 12-18, evening 18-22, night 22-6.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Bucket of an instant in the given local offset.
    pub fn of(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::from_hour(instant.with_timezone(&offset).hour())
    }
}

/// One finished task with both an estimate and an actual duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Id of the task this was learned from. Absent in data written before
    /// ids were recorded.
    #[serde(default)]
    pub task_id: Option<String>,
    pub estimated_time: u32,
    pub actual_time: u32,
    pub category: String,
    pub priority: Priority,
    pub completed_at: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
}

impl Observation {
    /// `actual / estimated`
    pub fn ratio(&self) -> f64 {
        self.actual_time as f64 / self.estimated_time as f64
    }
}

/// Learned multipliers plus the observations they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPatterns {
    /// Bumped on every accepted observation
    #[serde(default)]
    pub version: u64,
    #[serde(default = "default_multiplier")]
    pub procrastination_coefficient: f64,
    #[serde(default)]
    pub category_multipliers: BTreeMap<String, f64>,
    #[serde(default = "default_priority_multipliers")]
    pub priority_multipliers: BTreeMap<Priority, f64>,
    #[serde(default = "default_time_of_day_multipliers")]
    pub time_of_day_multipliers: BTreeMap<TimeOfDay, f64>,
    #[serde(default)]
    pub historical_observations: VecDeque<Observation>,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_priority_multipliers() -> BTreeMap<Priority, f64> {
    Priority::ALL.into_iter().map(|p| (p, 1.0)).collect()
}

fn default_time_of_day_multipliers() -> BTreeMap<TimeOfDay, f64> {
    TimeOfDay::ALL.into_iter().map(|t| (t, 1.0)).collect()
}

impl Default for UserPatterns {
    fn default() -> Self {
        Self {
            version: 0,
            procrastination_coefficient: 1.0,
            category_multipliers: BTreeMap::new(),
            priority_multipliers: default_priority_multipliers(),
            time_of_day_multipliers: default_time_of_day_multipliers(),
            historical_observations: VecDeque::new(),
        }
    }
}

impl UserPatterns {
    pub fn category_multiplier(&self, category: &str) -> f64 {
        self.category_multipliers.get(category).copied().unwrap_or(1.0)
    }

    pub fn priority_multiplier(&self, priority: Priority) -> f64 {
        self.priority_multipliers.get(&priority).copied().unwrap_or(1.0)
    }

    pub fn time_of_day_multiplier(&self, bucket: TimeOfDay) -> f64 {
        self.time_of_day_multipliers.get(&bucket).copied().unwrap_or(1.0)
    }

    /// Learn from a completed task.
    ///
    /// Returns the next version of the patterns, or `None` when the task
    /// lacks a positive estimate or actual time (nothing to learn) or was
    /// already learned from.
    pub fn record_completion(
        &self,
        task: &Task,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Option<UserPatterns> {
        let estimated = task.estimated_time.filter(|m| *m > 0)?;
        let actual = task.actual_time.filter(|m| *m > 0)?;
        if self.has_learned(&task.id) {
            tracing::debug!(task_id = %task.id, "completion already learned, skipping");
            return None;
        }
        let completed_at = task.completed_at.unwrap_or(now);

        let mut next = self.clone();
        next.historical_observations.push_back(Observation {
            task_id: Some(task.id.clone()),
            estimated_time: estimated,
            actual_time: actual,
            category: task.category_key(),
            priority: task.priority,
            completed_at,
            time_of_day: TimeOfDay::of(completed_at, offset),
        });
        while next.historical_observations.len() > MAX_OBSERVATIONS {
            next.historical_observations.pop_front();
        }
        next.recompute();
        next.version += 1;
        Some(next)
    }

    /// Whether an observation from `task_id` is still in the buffer.
    pub fn has_learned(&self, task_id: &str) -> bool {
        self.historical_observations
            .iter()
            .any(|obs| obs.task_id.as_deref() == Some(task_id))
    }

    fn recompute(&mut self) {
        let n = self.historical_observations.len();
        if n == 0 {
            return;
        }

        let (weighted, weights) = self
            .historical_observations
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, total), (i, obs)| {
                let w = RECENCY_DECAY.powi((n - 1 - i) as i32);
                (sum + w * obs.ratio(), total + w)
            });
        self.procrastination_coefficient = weighted / weights;

        for (key, mean) in bucket_means(self.historical_observations.iter().map(|o| (o.category.clone(), o.ratio()))) {
            self.category_multipliers.insert(key, mean);
        }
        for (key, mean) in bucket_means(self.historical_observations.iter().map(|o| (o.priority, o.ratio()))) {
            self.priority_multipliers.insert(key, mean);
        }
        for (key, mean) in bucket_means(self.historical_observations.iter().map(|o| (o.time_of_day, o.ratio()))) {
            self.time_of_day_multipliers.insert(key, mean);
        }
    }

    /// Replace values a hand-edited or corrupted store could carry
    /// (negative, NaN, infinite) with the neutral multiplier.
    pub fn sanitized(mut self) -> Self {
        fn fix(value: &mut f64, what: &str) {
            if !value.is_finite() || *value < 0.0 {
                tracing::warn!(what, value = *value, "resetting invalid learned multiplier");
                *value = 1.0;
            }
        }
        fix(&mut self.procrastination_coefficient, "procrastination_coefficient");
        for v in self.category_multipliers.values_mut() {
            fix(v, "category_multiplier");
        }
        for v in self.priority_multipliers.values_mut() {
            fix(v, "priority_multiplier");
        }
        for v in self.time_of_day_multipliers.values_mut() {
            fix(v, "time_of_day_multiplier");
        }
        self.historical_observations
            .retain(|o| o.estimated_time > 0 && o.actual_time > 0);
        while self.historical_observations.len() > MAX_OBSERVATIONS {
            self.historical_observations.pop_front();
        }
        self
    }
}

/// Mean ratio per bucket, only for buckets with enough observations.
fn bucket_means<K: Ord>(samples: impl Iterator<Item = (K, f64)>) -> BTreeMap<K, f64> {
    let mut groups: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for (key, ratio) in samples {
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += ratio;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .filter(|(_, (_, count))| *count >= MIN_BUCKET_OBSERVATIONS)
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}
