//! Adaptive time estimation.
//!
//! Turns a task's own estimate into a more honest one using the multipliers
//! learned in [`UserPatterns`], then derives an earlier internal deadline and
//! a procrastination risk level from it.
//!
//! All computations are pure functions of `(patterns, task, now, offset)`.
//! [`EstimationModel`] bundles the patterns with the local UTC offset so hosts
//! do not have to thread both through every call.

mod patterns;
mod report;

pub use patterns::{
    Observation, TimeOfDay, UserPatterns, MAX_OBSERVATIONS, MIN_BUCKET_OBSERVATIONS,
    RECENCY_DECAY,
};
pub use report::{
    detect_patterns, insights, CategoryInsight, EstimateAccuracy, EstimationInsights,
    PatternReport, RiskFactor, RiskFactorKind,
};

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Minimum lead the clamped realistic deadline keeps ahead of `now` (minutes).
const MIN_REALISTIC_LEAD_MINUTES: f64 = 30.0;

/// How likely the user is to start this task too late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Overdue,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
            RiskLevel::Overdue => "overdue",
        }
    }
}

/// Estimate adjusted by every learned multiplier, rounded to 5 minutes.
///
/// Tasks without an estimate are treated as 60 minutes; tasks without a
/// deadline use a neutral time-of-day multiplier.
pub fn adjusted_estimate(patterns: &UserPatterns, task: &Task, offset: FixedOffset) -> u32 {
    let base = task.estimate_or_default() as f64;
    let time_of_day = task
        .deadline
        .map(|d| patterns.time_of_day_multiplier(TimeOfDay::of(d, offset)))
        .unwrap_or(1.0);

    let raw = base
        * patterns.procrastination_coefficient
        * patterns.category_multiplier(&task.category_key())
        * patterns.priority_multiplier(task.priority)
        * time_of_day;

    if !raw.is_finite() || raw < 0.0 {
        tracing::warn!(task_id = %task.id, raw, "adjusted estimate out of range, using raw estimate");
        return round_to_five(base);
    }
    round_to_five(raw)
}

fn round_to_five(minutes: f64) -> u32 {
    ((minutes / 5.0).round() * 5.0) as u32
}

/// Internal deadline that leaves room for the learned overrun.
///
/// Never earlier than `now`: when the buffered deadline is not strictly in
/// the future it is clamped to `now + max(estimate / 2, 30 min)`.
pub fn realistic_deadline(
    patterns: &UserPatterns,
    task: &Task,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let deadline = task.deadline?;
    let estimated = task.estimate_or_default();
    let buffer = adjusted_estimate(patterns, task, offset).saturating_sub(estimated);

    let candidate = deadline - Duration::minutes(buffer as i64);
    if candidate > now {
        return Some(candidate);
    }
    let lead = (estimated as f64 * 0.5).max(MIN_REALISTIC_LEAD_MINUTES);
    Some(now + Duration::seconds((lead * 60.0).round() as i64))
}

/// Risk of not finishing in time given the adjusted estimate.
pub fn procrastination_risk(
    patterns: &UserPatterns,
    task: &Task,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> RiskLevel {
    if task.completed {
        return RiskLevel::Low;
    }
    let Some(hours) = task.hours_until_deadline(now) else {
        return RiskLevel::Low;
    };
    if hours < 0.0 {
        return RiskLevel::Overdue;
    }
    let needed_hours = adjusted_estimate(patterns, task, offset) as f64 / 60.0;
    if needed_hours <= 0.0 {
        return RiskLevel::Low;
    }

    let ratio = hours / needed_hours;
    if ratio < 0.5 {
        RiskLevel::Critical
    } else if ratio < 1.0 {
        RiskLevel::High
    } else if ratio < 1.5 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Learned patterns plus the local offset used for time-of-day buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationModel {
    patterns: UserPatterns,
    offset: FixedOffset,
}

impl Default for EstimationModel {
    fn default() -> Self {
        Self::new(UserPatterns::default(), utc_offset())
    }
}

impl EstimationModel {
    pub fn new(patterns: UserPatterns, offset: FixedOffset) -> Self {
        Self { patterns, offset }
    }

    pub fn patterns(&self) -> &UserPatterns {
        &self.patterns
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn set_offset(&mut self, offset: FixedOffset) {
        self.offset = offset;
    }

    pub fn adjusted_estimate(&self, task: &Task) -> u32 {
        adjusted_estimate(&self.patterns, task, self.offset)
    }

    pub fn realistic_deadline(&self, task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        realistic_deadline(&self.patterns, task, now, self.offset)
    }

    pub fn procrastination_risk(&self, task: &Task, now: DateTime<Utc>) -> RiskLevel {
        procrastination_risk(&self.patterns, task, now, self.offset)
    }

    /// Learn from a completed task. Returns whether an observation was added.
    pub fn record_completion(&mut self, task: &Task, now: DateTime<Utc>) -> bool {
        match self.patterns.record_completion(task, now, self.offset) {
            Some(next) => {
                tracing::debug!(
                    task_id = %task.id,
                    version = next.version,
                    coefficient = next.procrastination_coefficient,
                    "recorded completion"
                );
                self.patterns = next;
                true
            }
            None => {
                tracing::debug!(task_id = %task.id, "completion lacks estimate or actual time, not learned");
                false
            }
        }
    }

    /// Forget everything learned.
    pub fn reset(&mut self) {
        self.patterns = UserPatterns::default();
    }
}

/// The zero offset.
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}
