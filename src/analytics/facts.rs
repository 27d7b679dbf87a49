//! Per-fact analytics and the spaced-review schedule.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const SPEED_BASELINE_MS: f64 = 5000.0;
const ACCURACY_WEIGHT: f64 = 0.6;
const SPEED_WEIGHT: f64 = 0.4;

/// Detailed record for one arithmetic fact, including when it should next
/// come up for review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactAnalytics {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub total_time_ms: f64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub mastery_level: f64,
    pub due_for_review: Option<DateTime<Utc>>,
}

impl FactAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, correct: bool, response_time_ms: f64, now: DateTime<Utc>) {
        self.total_attempts += 1;
        self.total_time_ms += response_time_ms;
        if correct {
            self.correct_attempts += 1;
        }

        let accuracy = self.correct_attempts as f64 / self.total_attempts as f64;
        let speed_factor = (1.0 - self.average_time_ms() / SPEED_BASELINE_MS).max(0.0);
        self.mastery_level = accuracy * ACCURACY_WEIGHT + speed_factor * SPEED_WEIGHT;

        self.last_attempt = Some(now);
        self.due_for_review = Some(now + review_interval(self.mastery_level));
    }

    pub fn average_time_ms(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        self.total_time_ms / self.total_attempts as f64
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_for_review.is_some_and(|due| due <= now)
    }
}

/// Mastery-tiered spaced repetition: 24h scaled by {1, 2, 4, 7, 14} across
/// the mastery bands [0,.3) [.3,.5) [.5,.7) [.7,.9) [.9,1].
fn review_interval(mastery: f64) -> Duration {
    let multiplier = if mastery < 0.3 {
        1
    } else if mastery < 0.5 {
        2
    } else if mastery < 0.7 {
        4
    } else if mastery < 0.9 {
        7
    } else {
        14
    };
    Duration::hours(24 * multiplier)
}
