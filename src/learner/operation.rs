//! Per-operation statistics and the fact mastery store.
//!
//! Mastery blends accuracy and response speed into a [0,1] scalar per fact
//! and forgets at a fixed per-day rate. The decay pass and the attempt
//! application are separate named operations; `record_attempt` composes
//! them.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mastery lost per day without practice, across the whole operation.
const DECAY_PER_DAY: f64 = 0.05;
/// Response time at which the speed factor bottoms out (ms).
const SPEED_BASELINE_MS: f64 = 5000.0;
const ACCURACY_WEIGHT: f64 = 0.6;
const SPEED_WEIGHT: f64 = 0.4;
/// Scales the per-attempt mastery gain.
const GAIN_SCALE: f64 = 0.1;
/// Flat loss on an incorrect answer. Errors hurt more than one correct
/// answer helps.
const MISS_PENALTY: f64 = 0.15;
/// Response-time ring buffer capacity.
const RECENT_TIMES_CAP: usize = 20;

/// Statistics for a single arithmetic operator, including the fact mastery
/// map keyed by canonical fact keys such as `"+_7"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub problems_attempted: u32,
    pub correct: u32,
    pub avg_response_time_ms: f64,
    /// Percent, 0-100.
    pub accuracy: f64,
    /// No implicit credit: unseen facts are simply absent and read as 0.
    pub fact_mastery: HashMap<String, f64>,
    pub last_practiced: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recent_response_times: VecDeque<f64>,
}

impl OperationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decay pass: every fact in this operation loses mastery for the
    /// whole days elapsed since the last practice. Models forgetting across
    /// the operation, not just the fact being answered.
    pub fn apply_decay(&mut self, now: DateTime<Utc>) {
        let Some(last) = self.last_practiced else {
            return;
        };
        let days = (now - last).num_days();
        if days <= 0 {
            return;
        }
        let decay = DECAY_PER_DAY * days as f64;
        for mastery in self.fact_mastery.values_mut() {
            *mastery = (*mastery - decay).max(0.0);
        }
    }

    /// Applies a single attempt: counters, running averages, the response
    /// time window, and the mastery delta for the answered fact.
    pub fn apply_attempt(
        &mut self,
        fact: &str,
        correct: bool,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) {
        self.problems_attempted += 1;
        if correct {
            self.correct += 1;
        }

        self.avg_response_time_ms = (self.avg_response_time_ms
            * (self.problems_attempted - 1) as f64
            + response_time_ms)
            / self.problems_attempted as f64;
        self.accuracy = self.correct as f64 / self.problems_attempted as f64 * 100.0;

        self.recent_response_times.push_back(response_time_ms);
        if self.recent_response_times.len() > RECENT_TIMES_CAP {
            self.recent_response_times.pop_front();
        }

        let current = self.fact_mastery.get(fact).copied().unwrap_or(0.0);
        let speed_factor = (1.0 - response_time_ms / SPEED_BASELINE_MS).max(0.0);
        let delta = if correct {
            (ACCURACY_WEIGHT + speed_factor * SPEED_WEIGHT) * GAIN_SCALE
        } else {
            -MISS_PENALTY
        };
        self.fact_mastery
            .insert(fact.to_string(), (current + delta).clamp(0.0, 1.0));

        self.last_practiced = Some(now);
    }

    /// Decay pass followed by attempt application.
    pub fn record_attempt(
        &mut self,
        fact: &str,
        correct: bool,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) {
        self.apply_decay(now);
        self.apply_attempt(fact, correct, response_time_ms, now);
    }

    pub fn mastery_for(&self, fact: &str) -> f64 {
        self.fact_mastery.get(fact).copied().unwrap_or(0.0)
    }

    /// Fact keys currently below the given mastery threshold.
    pub fn weak_facts(&self, threshold: f64) -> BTreeSet<String> {
        self.fact_mastery
            .iter()
            .filter(|(_, mastery)| **mastery < threshold)
            .map(|(fact, _)| fact.clone())
            .collect()
    }

    /// Drops fully decayed entries to keep the stored map clean.
    pub fn cleanup_unused_facts(&mut self) {
        self.fact_mastery.retain(|_, mastery| *mastery > 0.0);
    }
}

/// Statistics for a single difficulty tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyStats {
    pub problems_attempted: u32,
    pub correct: u32,
    pub avg_response_time_ms: f64,
    /// Percent, 0-100.
    pub accuracy: f64,
    pub last_played: Option<DateTime<Utc>>,
}

impl DifficultyStats {
    pub fn record_attempt(&mut self, correct: bool, response_time_ms: f64, now: DateTime<Utc>) {
        self.problems_attempted += 1;
        if correct {
            self.correct += 1;
        }
        self.avg_response_time_ms = (self.avg_response_time_ms
            * (self.problems_attempted - 1) as f64
            + response_time_ms)
            / self.problems_attempted as f64;
        self.accuracy = self.correct as f64 / self.problems_attempted as f64 * 100.0;
        self.last_played = Some(now);
    }
}
