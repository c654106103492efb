//! Behavioural pattern detection and estimation reports.
//!
//! [`detect_patterns`] looks at the whole task list plus the learned
//! coefficient and flags habits worth addressing. [`insights`] summarises the
//! observation buffer per category and renders a plain-text report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::patterns::UserPatterns;
use crate::task::Task;

/// Accuracy metrics for a single estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateAccuracy {
    /// Estimated duration in minutes
    pub estimated: u32,
    /// Actual duration in minutes
    pub actual: u32,
    /// Error (actual - estimated), positive = underestimation
    pub error: f64,
    /// Relative error (error / estimated)
    pub relative_error: f64,
}

impl EstimateAccuracy {
    pub fn new(estimated: u32, actual: u32) -> Self {
        let error = actual as f64 - estimated as f64;
        let relative_error = if estimated > 0 {
            error / estimated as f64
        } else {
            0.0
        };
        Self {
            estimated,
            actual,
            error,
            relative_error,
        }
    }

    /// Task took longer than expected.
    pub fn is_underestimation(&self) -> bool {
        self.error > 0.0
    }

    /// Accuracy (0.0-1.0, higher is better).
    pub fn accuracy(&self) -> f64 {
        if self.estimated == 0 {
            return 1.0;
        }
        (1.0 - self.relative_error.abs()).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    LowCompletionRate,
    HighOverdueRate,
    HighProcrastination,
    ModerateProcrastination,
    PoorEstimation,
}

impl RiskFactorKind {
    pub fn description(self) -> &'static str {
        match self {
            RiskFactorKind::LowCompletionRate => "low completion rate",
            RiskFactorKind::HighOverdueRate => "high overdue rate",
            RiskFactorKind::HighProcrastination => "high procrastination tendency",
            RiskFactorKind::ModerateProcrastination => "moderate procrastination tendency",
            RiskFactorKind::PoorEstimation => "poor time estimation",
        }
    }

    pub fn suggestion(self) -> &'static str {
        match self {
            RiskFactorKind::LowCompletionRate => {
                "Break large tasks into smaller steps you can finish in one sitting."
            }
            RiskFactorKind::HighOverdueRate => {
                "Set deadlines earlier than the real ones and start on the riskiest task first."
            }
            RiskFactorKind::HighProcrastination => {
                "Your tasks take much longer than planned. Double your estimates and start earlier."
            }
            RiskFactorKind::ModerateProcrastination => {
                "Tasks tend to run over. Add a buffer of about a quarter to your estimates."
            }
            RiskFactorKind::PoorEstimation => {
                "Track actual time on a few tasks to calibrate how long things take."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub description: String,
    pub suggestion: String,
}

impl From<RiskFactorKind> for RiskFactor {
    fn from(kind: RiskFactorKind) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
            suggestion: kind.suggestion().to_string(),
        }
    }
}

/// Outcome of [`detect_patterns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub risk_factors: Vec<RiskFactor>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Completions that carry both estimate and actual time
    pub timed_completions: usize,
    pub completion_rate: Option<f64>,
    pub overdue_rate: Option<f64>,
    pub average_accuracy: Option<f64>,
    pub procrastination_coefficient: f64,
    /// 0.2-1.0, grows with the amount of evidence
    pub confidence: f64,
}

/// Flag work habits from the task list and the learned coefficient.
pub fn detect_patterns(tasks: &[Task], patterns: &UserPatterns, now: DateTime<Utc>) -> PatternReport {
    let total = tasks.len();
    let completed: Vec<&Task> = tasks.iter().filter(|t| t.completed).collect();
    let overdue = tasks.iter().filter(|t| t.is_overdue(now)).count();
    let accuracies: Vec<f64> = completed
        .iter()
        .filter_map(|t| match (t.estimated_time, t.actual_time) {
            (Some(e), Some(a)) if e > 0 => Some(EstimateAccuracy::new(e, a).accuracy()),
            _ => None,
        })
        .collect();

    let completion_rate = (total > 0).then(|| completed.len() as f64 / total as f64);
    let overdue_rate = (total > 0).then(|| overdue as f64 / total as f64);
    let average_accuracy =
        (!accuracies.is_empty()).then(|| accuracies.iter().sum::<f64>() / accuracies.len() as f64);
    let coefficient = patterns.procrastination_coefficient;

    let mut risk_factors = Vec::new();
    if completion_rate.is_some_and(|r| r < 0.6) {
        risk_factors.push(RiskFactorKind::LowCompletionRate.into());
    }
    if overdue_rate.is_some_and(|r| r > 0.3) {
        risk_factors.push(RiskFactorKind::HighOverdueRate.into());
    }
    if coefficient > 1.5 {
        risk_factors.push(RiskFactorKind::HighProcrastination.into());
    } else if coefficient > 1.2 {
        risk_factors.push(RiskFactorKind::ModerateProcrastination.into());
    }
    if average_accuracy.is_some_and(|a| a < 0.7) {
        risk_factors.push(RiskFactorKind::PoorEstimation.into());
    }

    let confidence = (completed.len() as f64 / 10.0 * 0.5 + accuracies.len() as f64 / 5.0 * 0.3 + 0.2).min(1.0);

    PatternReport {
        risk_factors,
        total_tasks: total,
        completed_tasks: completed.len(),
        timed_completions: accuracies.len(),
        completion_rate,
        overdue_rate,
        average_accuracy,
        procrastination_coefficient: coefficient,
        confidence,
    }
}

/// Observation statistics for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsight {
    pub key: String,
    pub observations: usize,
    /// Mean `actual / estimated`
    pub mean_ratio: f64,
    /// Multiplier currently applied to estimates in this category
    pub multiplier: f64,
}

impl CategoryInsight {
    /// Human-readable correction hint.
    pub fn correction_suggestion(&self) -> String {
        if (self.mean_ratio - 1.0).abs() < 0.05 {
            format!("{}: Estimates are accurate (factor: {:.2}x)", self.key, self.mean_ratio)
        } else if self.mean_ratio > 1.0 {
            format!(
                "{}: Multiply estimates by {:.2}x (tasks take ~{:.0}% longer)",
                self.key,
                self.mean_ratio,
                (self.mean_ratio - 1.0) * 100.0
            )
        } else {
            format!(
                "{}: Multiply estimates by {:.2}x (tasks finish ~{:.0}% faster)",
                self.key,
                self.mean_ratio,
                (1.0 - self.mean_ratio) * 100.0
            )
        }
    }
}

/// Summary of what has been learned so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationInsights {
    pub version: u64,
    pub observations: usize,
    pub procrastination_coefficient: f64,
    pub mean_ratio: Option<f64>,
    /// Sorted by observation count, descending
    pub categories: Vec<CategoryInsight>,
}

impl EstimationInsights {
    /// Category with the highest mean overrun, if any ran over.
    pub fn most_underestimated(&self) -> Option<&CategoryInsight> {
        self.categories
            .iter()
            .filter(|c| c.mean_ratio > 1.0)
            .max_by(|a, b| a.mean_ratio.total_cmp(&b.mean_ratio))
    }

    /// Render as an ASCII table.
    pub fn render(&self) -> String {
        let mut output = String::new();
        output.push_str("\nEstimation Report\n");
        output.push_str(&"=".repeat(60));
        output.push_str("\n\n");

        if self.observations == 0 {
            output.push_str("No completed tasks with estimates yet.\n");
            return output;
        }

        output.push_str(&format!(
            "Observations: {}   Coefficient: {:.2}x\n\n",
            self.observations, self.procrastination_coefficient
        ));
        output.push_str(&format!(
            "{:<20} {:>8} {:>10} {:>12}\n",
            "Category", "Count", "Mean", "Multiplier"
        ));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for c in &self.categories {
            output.push_str(&format!(
                "{:<20} {:>8} {:>9.2}x {:>11.2}x\n",
                truncate(&c.key, 20),
                c.observations,
                c.mean_ratio,
                c.multiplier
            ));
        }
        output.push_str(&"-".repeat(60));
        output.push_str("\n\nCorrections:\n");
        for c in &self.categories {
            output.push_str(&format!("  {}\n", c.correction_suggestion()));
        }
        output
    }
}

/// Summarise the observation buffer.
pub fn insights(patterns: &UserPatterns) -> EstimationInsights {
    let obs = &patterns.historical_observations;
    let mean_ratio = (!obs.is_empty()).then(|| obs.iter().map(|o| o.ratio()).sum::<f64>() / obs.len() as f64);

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for o in obs {
        groups.entry(o.category.as_str()).or_default().push(o.ratio());
    }
    let mut categories: Vec<CategoryInsight> = groups
        .into_iter()
        .map(|(key, ratios)| CategoryInsight {
            key: key.to_string(),
            observations: ratios.len(),
            mean_ratio: ratios.iter().sum::<f64>() / ratios.len() as f64,
            multiplier: patterns.category_multiplier(key),
        })
        .collect();
    categories.sort_by(|a, b| b.observations.cmp(&a.observations));

    EstimationInsights {
        version: patterns.version,
        observations: obs.len(),
        procrastination_coefficient: patterns.procrastination_coefficient,
        mean_ratio,
        categories,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
