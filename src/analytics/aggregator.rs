//! The analytics aggregator: windowed histories per operator, difficulty,
//! and fact, plus the derived recommendations the rest of the engine
//! consumes.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{CurveTrend, FactAnalytics, LearningCurve, PerformanceMetrics};
use crate::config::AnalyticsParams;
use crate::types::{DifficultyLevel, Operator};

/// Recent attempts considered for the difficulty recommendation.
const MAX_RECENT_ATTEMPTS: usize = 20;

/// Outcome of the difficulty recommendation pass. Idempotent for the same
/// inputs; callers rate-limit how often they act on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyRecommendation {
    pub recommended_level: DifficultyLevel,
    pub should_include_negatives: bool,
    pub should_include_decimals: bool,
    pub learning_trends: CurveTrend,
}

/// Compact per-operator view for summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSummary {
    pub accuracy: f64,
    pub avg_time_ms: f64,
    pub streak: u32,
    pub best_streak: u32,
}

/// Session-level analytics summary for the presentation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub recent_accuracy: f64,
    pub recent_avg_response_time: f64,
    pub learning_trends: CurveTrend,
    pub problematic_facts: Vec<String>,
    pub facts_due_review: Vec<String>,
    pub operator_stats: HashMap<Operator, OperatorSummary>,
}

/// Aggregates attempt outcomes across operators, difficulty tiers, and
/// individual facts. Scoped to a single active learner session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    fact_analytics: HashMap<String, FactAnalytics>,
    difficulty_metrics: HashMap<DifficultyLevel, PerformanceMetrics>,
    operator_metrics: HashMap<Operator, PerformanceMetrics>,
    learning_curve: LearningCurve,
    recent_performance: VecDeque<(bool, f64)>,
    params: AnalyticsParams,
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

impl Analytics {
    /// Fresh tracking structures; one instance per active learner.
    pub fn new() -> Self {
        Self {
            fact_analytics: HashMap::new(),
            difficulty_metrics: DifficultyLevel::ALL
                .iter()
                .map(|level| (*level, PerformanceMetrics::new()))
                .collect(),
            operator_metrics: Operator::ALL
                .iter()
                .map(|op| (*op, PerformanceMetrics::new()))
                .collect(),
            learning_curve: LearningCurve::new(),
            recent_performance: VecDeque::with_capacity(MAX_RECENT_ATTEMPTS),
            params: AnalyticsParams::default(),
        }
    }

    /// Records one answered question across every tracking structure.
    pub fn record_attempt(
        &mut self,
        fact_key: &str,
        operator: Operator,
        difficulty: DifficultyLevel,
        correct: bool,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) {
        self.fact_analytics
            .entry(fact_key.to_string())
            .or_default()
            .update(correct, response_time_ms, now);
        self.difficulty_metrics
            .entry(difficulty)
            .or_default()
            .update(correct, response_time_ms, now);
        self.operator_metrics
            .entry(operator)
            .or_default()
            .update(correct, response_time_ms, now);
        self.learning_curve.update(correct, response_time_ms, now);

        self.recent_performance.push_back((correct, response_time_ms));
        if self.recent_performance.len() > MAX_RECENT_ATTEMPTS {
            self.recent_performance.pop_front();
        }
    }

    /// Facts whose mastery sits below the configured threshold.
    pub fn problematic_facts(&self) -> Vec<String> {
        let mut facts: Vec<String> = self
            .fact_analytics
            .iter()
            .filter(|(_, analytics)| analytics.mastery_level < self.params.mastery_threshold)
            .map(|(fact, _)| fact.clone())
            .collect();
        facts.sort();
        facts
    }

    /// Facts whose spaced-review due date has passed.
    pub fn facts_due_review(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut facts: Vec<String> = self
            .fact_analytics
            .iter()
            .filter(|(_, analytics)| analytics.is_due(now))
            .map(|(fact, _)| fact.clone())
            .collect();
        facts.sort();
        facts
    }

    /// Tier recommendation from the rolling accuracy/speed window, with
    /// negative/decimal inclusion suggestions. No recent attempts means the
    /// lowest tier with nothing unlocked.
    pub fn recommendation(&self) -> DifficultyRecommendation {
        let trends = self.learning_curve.trend();
        if self.recent_performance.is_empty() {
            return DifficultyRecommendation {
                recommended_level: DifficultyLevel::Intro,
                should_include_negatives: false,
                should_include_decimals: false,
                learning_trends: trends,
            };
        }

        let count = self.recent_performance.len().max(1) as f64;
        let accuracy = self
            .recent_performance
            .iter()
            .filter(|(correct, _)| *correct)
            .count() as f64
            / count;
        let avg_time = self
            .recent_performance
            .iter()
            .map(|(_, time)| time)
            .sum::<f64>()
            / count;

        let recommended_level = if accuracy < 0.6 || avg_time > 5000.0 {
            DifficultyLevel::Intro
        } else if accuracy < 0.75 || avg_time > 3000.0 {
            DifficultyLevel::Basic
        } else if accuracy < 0.85 || avg_time > 2000.0 {
            DifficultyLevel::Medium
        } else {
            DifficultyLevel::Hard
        };

        DifficultyRecommendation {
            recommended_level,
            should_include_negatives: accuracy > 0.8,
            should_include_decimals: accuracy > 0.85 && avg_time < 3000.0,
            learning_trends: trends,
        }
    }

    pub fn summary(&self, now: DateTime<Utc>) -> AnalyticsSummary {
        let count = self.recent_performance.len().max(1) as f64;
        AnalyticsSummary {
            recent_accuracy: self
                .recent_performance
                .iter()
                .filter(|(correct, _)| *correct)
                .count() as f64
                / count
                * 100.0,
            recent_avg_response_time: self
                .recent_performance
                .iter()
                .map(|(_, time)| time)
                .sum::<f64>()
                / count,
            learning_trends: self.learning_curve.trend(),
            problematic_facts: self.problematic_facts(),
            facts_due_review: self.facts_due_review(now),
            operator_stats: self
                .operator_metrics
                .iter()
                .map(|(op, metrics)| {
                    (
                        *op,
                        OperatorSummary {
                            accuracy: metrics.accuracy(),
                            avg_time_ms: metrics.average_time_ms(),
                            streak: metrics.streak,
                            best_streak: metrics.best_streak,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn fact(&self, fact_key: &str) -> Option<&FactAnalytics> {
        self.fact_analytics.get(fact_key)
    }

    pub fn operator_metrics(&self, operator: Operator) -> Option<&PerformanceMetrics> {
        self.operator_metrics.get(&operator)
    }

    pub fn difficulty_metrics(&self, difficulty: DifficultyLevel) -> Option<&PerformanceMetrics> {
        self.difficulty_metrics.get(&difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn record_many(analytics: &mut Analytics, n: u32, correct: bool, time: f64) {
        for _ in 0..n {
            analytics.record_attempt(
                "+_3",
                Operator::Add,
                DifficultyLevel::Intro,
                correct,
                time,
                now(),
            );
        }
    }

    #[test]
    fn empty_aggregator_recommends_intro() {
        let analytics = Analytics::new();
        let rec = analytics.recommendation();
        assert_eq!(rec.recommended_level, DifficultyLevel::Intro);
        assert!(!rec.should_include_negatives);
        assert!(!rec.should_include_decimals);
    }

    #[test]
    fn strong_recent_performance_recommends_hard() {
        let mut analytics = Analytics::new();
        record_many(&mut analytics, 20, true, 1200.0);
        let rec = analytics.recommendation();
        assert_eq!(rec.recommended_level, DifficultyLevel::Hard);
        assert!(rec.should_include_negatives);
        assert!(rec.should_include_decimals);
    }

    #[test]
    fn slow_responses_hold_the_recommendation_down() {
        let mut analytics = Analytics::new();
        record_many(&mut analytics, 20, true, 6000.0);
        assert_eq!(
            analytics.recommendation().recommended_level,
            DifficultyLevel::Intro
        );
    }

    #[test]
    fn missed_facts_become_problematic() {
        let mut analytics = Analytics::new();
        record_many(&mut analytics, 3, false, 4000.0);
        assert_eq!(analytics.problematic_facts(), vec!["+_3".to_string()]);
    }

    #[test]
    fn due_review_scan_respects_schedule() {
        let mut analytics = Analytics::new();
        let t0 = now();
        analytics.record_attempt("*_7", Operator::Mul, DifficultyLevel::Basic, false, 3000.0, t0);
        assert!(analytics.facts_due_review(t0).is_empty());
        assert_eq!(
            analytics.facts_due_review(t0 + chrono::Duration::days(2)),
            vec!["*_7".to_string()]
        );
    }

    #[test]
    fn summary_is_total_over_empty_input() {
        let analytics = Analytics::new();
        let summary = analytics.summary(now());
        assert_eq!(summary.recent_accuracy, 0.0);
        assert_eq!(summary.recent_avg_response_time, 0.0);
        assert!(summary.problematic_facts.is_empty());
    }
}
