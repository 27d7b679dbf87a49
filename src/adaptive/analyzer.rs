//! The custom-mode difficulty analyzer.
//!
//! `analyze_performance` synthesizes a full question configuration from the
//! learner's per-operation statistics; `next_question_config` layers a
//! cheap single-answer adjustment on top of the last full analysis and is
//! called after every answer.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analytics::trend;
use crate::config::AdaptiveParams;
use crate::learner::{Learner, OperationStats, SessionStats};
use crate::types::{DifficultyLevel, Operator, QuestionConfig};

/// Per-operator difficulty boundary, nudged after each answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationBoundary {
    pub min_number: i64,
    pub max_number: i64,
    pub comfort_zone: (i64, i64),
    /// Responses under this are "fast" for boundary adjustment (ms).
    pub speed_threshold_ms: f64,
    pub recent_trend: f64,
    pub suggested_step: i64,
}

impl Default for OperationBoundary {
    fn default() -> Self {
        Self {
            min_number: 1,
            max_number: 10,
            comfort_zone: (1, 10),
            speed_threshold_ms: 4000.0,
            recent_trend: 0.0,
            suggested_step: 1,
        }
    }
}

impl OperationBoundary {
    /// Fast correct answers push the ceiling up a step; slow misses pull it
    /// down twice as hard. The comfort zone trails the ceiling.
    pub fn adjust_bounds(&mut self, success: bool, response_time_ms: f64) {
        if success && response_time_ms < self.speed_threshold_ms {
            self.max_number = (self.max_number + self.suggested_step).min(100);
        } else if !success && response_time_ms > self.speed_threshold_ms * 1.5 {
            self.max_number = (self.max_number - self.suggested_step * 2).max(10);
        }
        self.comfort_zone = ((self.max_number - 5).max(1), self.max_number);
    }
}

/// Stateless with respect to learner identity: a pure function of the
/// statistics passed in, plus the rolling per-operator boundaries it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyAnalyzer {
    boundaries: HashMap<Operator, OperationBoundary>,
    params: AdaptiveParams,
}

impl Default for DifficultyAnalyzer {
    fn default() -> Self {
        Self::new(AdaptiveParams::default())
    }
}

impl DifficultyAnalyzer {
    pub fn new(params: AdaptiveParams) -> Self {
        Self {
            boundaries: Operator::ALL
                .iter()
                .map(|op| (*op, OperationBoundary::default()))
                .collect(),
            params,
        }
    }

    /// Full recompute of the adaptive configuration.
    ///
    /// Never produces an empty operator set: if no operator qualifies, the
    /// most-attempted one is used. Never-practiced operators contribute a
    /// synthetic zero-accuracy record to the unlock gates, so those gates
    /// simply stay closed.
    pub fn analyze_performance(
        &mut self,
        operation_stats: &HashMap<Operator, OperationStats>,
        now: DateTime<Utc>,
    ) -> QuestionConfig {
        let total_attempts: u32 = operation_stats
            .values()
            .map(|stats| stats.problems_attempted)
            .sum();
        if total_attempts == 0 {
            return QuestionConfig::default_custom();
        }

        let mut viable_operators: Vec<Operator> = Vec::new();
        let mut max_range: i64 = 10;
        let mut focus_facts: BTreeSet<String> = BTreeSet::new();

        for op in Operator::ALL {
            let Some(stats) = operation_stats.get(&op) else {
                continue;
            };
            if stats.problems_attempted == 0 {
                continue;
            }

            let boundary = self.boundaries.entry(op).or_default();

            let times: Vec<f64> = stats.recent_response_times.iter().copied().collect();
            boundary.recent_trend = trend::slope(&times);

            if !stats.fact_mastery.is_empty() {
                let avg_mastery = stats.fact_mastery.values().sum::<f64>()
                    / stats.fact_mastery.len() as f64;
                if avg_mastery > 0.8 {
                    boundary.suggested_step = 2;
                } else if avg_mastery < 0.4 {
                    boundary.suggested_step = 1;
                }
            }

            let practiced_recently = stats.last_practiced.is_some_and(|last| {
                now - last < Duration::days(self.params.recent_practice_days)
            });
            let proven = stats.accuracy >= self.params.viable_accuracy
                && stats.problems_attempted >= self.params.viable_attempts;
            if proven || practiced_recently {
                viable_operators.push(op);
                if stats.accuracy >= 85.0 {
                    max_range = max_range.max(boundary.max_number);
                }
                focus_facts.extend(stats.weak_facts(0.8));
            }
        }

        if viable_operators.is_empty() {
            let most_practiced = operation_stats
                .iter()
                .max_by_key(|(_, stats)| stats.problems_attempted)
                .map(|(op, _)| *op)
                .unwrap_or(Operator::Add);
            viable_operators.push(most_practiced);
        }

        let practiced: Vec<&OperationStats> = operation_stats
            .values()
            .filter(|stats| stats.problems_attempted > 0)
            .collect();
        let avg_accuracy =
            practiced.iter().map(|stats| stats.accuracy).sum::<f64>() / practiced.len() as f64;

        let allows_negative = operation_stats
            .values()
            .any(|stats| stats.problems_attempted >= 20 && stats.accuracy >= 75.0)
            && avg_accuracy >= 80.0;

        let division_accuracy = operation_stats
            .get(&Operator::Div)
            .map(|stats| stats.accuracy)
            .unwrap_or(0.0);
        let requires_decimals = viable_operators.contains(&Operator::Div)
            && division_accuracy >= 85.0
            && avg_accuracy >= 85.0;

        let config = QuestionConfig {
            number_range: (1, max_range),
            operators: viable_operators,
            max_digits: if avg_accuracy >= 80.0 { 2 } else { 1 },
            allows_negative,
            requires_decimals,
            difficulty: DifficultyLevel::Custom,
            focus_facts,
            adaptive_timing: true,
        };
        info!(
            operators = config.operators.len(),
            range_max = config.number_range.1,
            focus = config.focus_facts.len(),
            negatives = config.allows_negative,
            decimals = config.requires_decimals,
            "adaptive config recomputed"
        );
        config
    }

    /// Cheap per-answer adjustment of the current configuration. Fast
    /// correct answers nudge the range ceiling up; slow misses pull it
    /// down; a fatigued session temporarily caps it regardless.
    pub fn next_question_config(
        &mut self,
        learner: &Learner,
        session: &SessionStats,
        current: &QuestionConfig,
        last_response_time_ms: Option<f64>,
        last_correct: Option<bool>,
        now: DateTime<Utc>,
    ) -> QuestionConfig {
        let mut next = current.clone();

        if let (Some(response_time), Some(correct)) = (last_response_time_ms, last_correct) {
            if let Some(op) = session.operations_used.iter().next().copied() {
                let boundary = self.boundaries.entry(op).or_default();
                boundary.adjust_bounds(correct, response_time);
                next.number_range = boundary.comfort_zone;
            }
        }

        let struggles = learner.recent_struggles(Some(session), now);
        if !struggles.is_empty() {
            next.focus_facts = struggles;
        }

        if session.problems_attempted > 0
            && session.avg_response_time_ms > self.params.fatigue_threshold_ms
        {
            let reduced = (next.number_range.1 - self.params.fatigue_backoff)
                .max(self.params.range_floor);
            debug!(ceiling = reduced, "fatigue guard engaged");
            next.number_range = (next.number_range.0.min(reduced), reduced);
        }

        next
    }

    pub fn boundary(&self, operator: Operator) -> Option<&OperationBoundary> {
        self.boundaries.get(&operator)
    }
}
