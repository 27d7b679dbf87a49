//! Learning progress over time, bucketed into fixed-size time blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::trend;
use crate::analytics::PerformanceMetrics;

const BLOCK_SIZE_MINUTES: i64 = 15;

/// Block-over-block learning trends. Speed is negated so positive means
/// faster; the overall score weights accuracy over speed 0.6/0.4.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveTrend {
    pub accuracy_trend: f64,
    pub speed_trend: f64,
    pub overall_improvement: f64,
}

/// Performance bucketed into 15-minute blocks; trends compare completed
/// blocks against each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningCurve {
    time_blocks: Vec<PerformanceMetrics>,
    current_block: PerformanceMetrics,
    block_started_at: Option<DateTime<Utc>>,
}

impl Default for LearningCurve {
    fn default() -> Self {
        Self {
            time_blocks: Vec::new(),
            current_block: PerformanceMetrics::new(),
            block_started_at: None,
        }
    }
}

impl LearningCurve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, correct: bool, response_time_ms: f64, now: DateTime<Utc>) {
        match self.block_started_at {
            None => self.block_started_at = Some(now),
            Some(started) if (now - started).num_minutes() >= BLOCK_SIZE_MINUTES => {
                let finished = std::mem::take(&mut self.current_block);
                self.time_blocks.push(finished);
                self.block_started_at = Some(now);
            }
            Some(_) => {}
        }
        self.current_block.update(correct, response_time_ms, now);
    }

    pub fn trend(&self) -> CurveTrend {
        if self.time_blocks.is_empty() {
            return CurveTrend::default();
        }
        let accuracy: Vec<f64> = self.time_blocks.iter().map(|b| b.accuracy()).collect();
        let times: Vec<f64> = self
            .time_blocks
            .iter()
            .map(|b| b.average_time_ms())
            .collect();
        let accuracy_trend = trend::slope(&accuracy);
        let time_slope = trend::slope(&times);
        CurveTrend {
            accuracy_trend,
            speed_trend: -time_slope,
            overall_improvement: accuracy_trend * 0.6 - time_slope * 0.4,
        }
    }

    pub fn completed_blocks(&self) -> usize {
        self.time_blocks.len()
    }
}
