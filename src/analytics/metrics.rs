//! Windowed performance metrics with confidence and mastery scoring.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::trend;

const WINDOW_SIZE: usize = 20;
/// Consistency penalty kicks in once this many confidence samples exist.
const CONSISTENCY_MIN_SAMPLES: usize = 3;

/// Directional signals derived from the recent windows. Time trend is
/// negated so that positive always means improving.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub time_trend: f64,
    pub accuracy_trend: f64,
    pub confidence_trend: f64,
}

/// Rolling performance record for one operator or difficulty tier:
/// lifetime counters plus bounded recent-history windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub total_time_ms: f64,
    pub fastest_time_ms: Option<f64>,
    pub slowest_time_ms: Option<f64>,
    pub streak: u32,
    pub best_streak: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    response_times: VecDeque<f64>,
    correct_history: VecDeque<bool>,
    confidence_scores: VecDeque<f64>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            total_attempts: 0,
            correct_attempts: 0,
            total_time_ms: 0.0,
            fastest_time_ms: None,
            slowest_time_ms: None,
            streak: 0,
            best_streak: 0,
            last_attempt: None,
            response_times: VecDeque::with_capacity(WINDOW_SIZE),
            correct_history: VecDeque::with_capacity(WINDOW_SIZE),
            confidence_scores: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, correct: bool, response_time_ms: f64, now: DateTime<Utc>) {
        self.total_attempts += 1;
        self.total_time_ms += response_time_ms;
        self.last_attempt = Some(now);

        if self.fastest_time_ms.is_none_or(|t| response_time_ms < t) {
            self.fastest_time_ms = Some(response_time_ms);
        }
        if self.slowest_time_ms.is_none_or(|t| response_time_ms > t) {
            self.slowest_time_ms = Some(response_time_ms);
        }

        if correct {
            self.correct_attempts += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }

        let confidence = self.confidence_score(correct, response_time_ms);
        push_bounded(&mut self.response_times, response_time_ms);
        push_bounded(&mut self.correct_history, correct);
        push_bounded(&mut self.confidence_scores, confidence);
    }

    /// Per-attempt confidence: 1.0/0.0 for correct/incorrect, scaled by how
    /// fast the response was within the observed [fastest, slowest] range.
    /// An undefined range leaves the base score unscaled.
    fn confidence_score(&self, correct: bool, response_time_ms: f64) -> f64 {
        let base = if correct { 1.0 } else { 0.0 };
        if let (Some(fastest), Some(slowest)) = (self.fastest_time_ms, self.slowest_time_ms) {
            let range = slowest - fastest;
            if range > 0.0 {
                let time_factor = (slowest - response_time_ms) / range;
                return base * (0.5 + 0.5 * time_factor);
            }
        }
        base
    }

    /// Lifetime accuracy, percent.
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.correct_attempts as f64 / self.total_attempts as f64 * 100.0
    }

    pub fn average_time_ms(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.total_time_ms / self.total_attempts as f64
    }

    /// Accuracy over the recent window, percent.
    pub fn recent_accuracy(&self) -> f64 {
        if self.correct_history.is_empty() {
            return 0.0;
        }
        let correct = self.correct_history.iter().filter(|c| **c).count();
        correct as f64 / self.correct_history.len() as f64 * 100.0
    }

    pub fn recent_average_time(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
    }

    /// Aggregate mastery: mean recent confidence, penalized by its variance
    /// once enough samples exist. Rewards consistency, not just average
    /// correctness.
    pub fn mastery_score(&self) -> f64 {
        if self.confidence_scores.is_empty() {
            return 0.0;
        }
        let scores: Vec<f64> = self.confidence_scores.iter().copied().collect();
        let base = scores.iter().sum::<f64>() / scores.len() as f64;
        if scores.len() >= CONSISTENCY_MIN_SAMPLES {
            let consistency = (1.0 - trend::variance(&scores)).max(0.0);
            return base * (0.7 + 0.3 * consistency);
        }
        base
    }

    pub fn trend(&self) -> TrendSummary {
        if self.response_times.len() < 2 {
            return TrendSummary::default();
        }
        let times: Vec<f64> = self.response_times.iter().copied().collect();
        let accuracy: Vec<f64> = self
            .correct_history
            .iter()
            .map(|c| if *c { 1.0 } else { 0.0 })
            .collect();
        let confidence: Vec<f64> = self.confidence_scores.iter().copied().collect();
        TrendSummary {
            // Decreasing response time is improvement.
            time_trend: -trend::slope(&times),
            accuracy_trend: trend::slope(&accuracy),
            confidence_trend: trend::slope(&confidence),
        }
    }

    pub fn window_len(&self) -> usize {
        self.correct_history.len()
    }
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T) {
    window.push_back(value);
    if window.len() > WINDOW_SIZE {
        window.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn empty_metrics_report_zero() {
        let metrics = PerformanceMetrics::new();
        assert_eq!(metrics.accuracy(), 0.0);
        assert_eq!(metrics.average_time_ms(), 0.0);
        assert_eq!(metrics.mastery_score(), 0.0);
    }

    #[test]
    fn windows_are_bounded() {
        let mut metrics = PerformanceMetrics::new();
        for i in 0..40 {
            metrics.update(i % 2 == 0, 1000.0, now());
        }
        assert_eq!(metrics.window_len(), WINDOW_SIZE);
        assert_eq!(metrics.total_attempts, 40);
    }

    #[test]
    fn first_attempt_confidence_is_unscaled() {
        let mut metrics = PerformanceMetrics::new();
        metrics.update(true, 2000.0, now());
        // Degenerate range: base score passes through.
        assert!((metrics.mastery_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fast_responses_earn_more_confidence_than_slow() {
        let mut fast = PerformanceMetrics::new();
        fast.update(true, 5000.0, now());
        fast.update(true, 500.0, now());
        fast.update(true, 500.0, now());
        fast.update(true, 500.0, now());

        let mut slow = PerformanceMetrics::new();
        slow.update(true, 5000.0, now());
        slow.update(true, 500.0, now());
        slow.update(true, 4900.0, now());
        slow.update(true, 4900.0, now());

        assert!(fast.mastery_score() > slow.mastery_score());
    }

    #[test]
    fn erratic_performance_is_penalized() {
        let mut steady = PerformanceMetrics::new();
        let mut erratic = PerformanceMetrics::new();
        for i in 0..10 {
            steady.update(true, 1000.0, now());
            erratic.update(i % 2 == 0, 1000.0, now());
        }
        assert!(steady.mastery_score() > erratic.mastery_score());
    }

    #[test]
    fn improving_speed_yields_positive_time_trend() {
        let mut metrics = PerformanceMetrics::new();
        for t in [5000.0, 4000.0, 3000.0, 2000.0, 1000.0] {
            metrics.update(true, t, now());
        }
        assert!(metrics.trend().time_trend > 0.0);
    }

    #[test]
    fn improving_accuracy_yields_positive_accuracy_trend() {
        let mut metrics = PerformanceMetrics::new();
        for correct in [false, false, true, true, true, true] {
            metrics.update(correct, 1000.0, now());
        }
        assert!(metrics.trend().accuracy_trend > 0.0);
    }
}
