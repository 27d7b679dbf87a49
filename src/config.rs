//! Difficulty tier templates and tunable engine parameters.

use serde::{Deserialize, Serialize};

use crate::types::{DifficultyLevel, Operator};

/// Bounds for generated division problems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionRules {
    pub max_dividend: i64,
    pub max_divisor: i64,
    pub max_quotient: i64,
}

/// Bounds for generated multiplication problems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplicationRules {
    pub max_factor: i64,
    pub max_product: i64,
}

/// Fixed generation template for a difficulty tier. The `Custom` tier keeps
/// a template too; it seeds the generators' operator-specific bounds while
/// the analyzer computes everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultySettings {
    pub number_range: (i64, i64),
    pub operators: Vec<Operator>,
    pub max_digits: u32,
    pub allows_negative: bool,
    pub requires_decimals: bool,
    pub division: DivisionRules,
    pub multiplication: MultiplicationRules,
}

impl DifficultySettings {
    pub fn for_level(level: DifficultyLevel) -> Self {
        match level {
            DifficultyLevel::Intro => Self {
                number_range: (1, 7),
                operators: vec![Operator::Add],
                max_digits: 2,
                allows_negative: false,
                requires_decimals: false,
                division: DivisionRules {
                    max_dividend: 49,
                    max_divisor: 7,
                    max_quotient: 7,
                },
                multiplication: MultiplicationRules {
                    max_factor: 7,
                    max_product: 49,
                },
            },
            DifficultyLevel::Basic => Self {
                number_range: (1, 12),
                operators: vec![Operator::Add, Operator::Sub],
                max_digits: 2,
                allows_negative: false,
                requires_decimals: false,
                division: DivisionRules {
                    max_dividend: 144,
                    max_divisor: 12,
                    max_quotient: 12,
                },
                multiplication: MultiplicationRules {
                    max_factor: 12,
                    max_product: 144,
                },
            },
            DifficultyLevel::Medium => Self {
                number_range: (1, 20),
                operators: vec![Operator::Add, Operator::Sub, Operator::Mul],
                max_digits: 2,
                allows_negative: true,
                requires_decimals: false,
                division: DivisionRules {
                    max_dividend: 400,
                    max_divisor: 20,
                    max_quotient: 20,
                },
                multiplication: MultiplicationRules {
                    max_factor: 20,
                    max_product: 400,
                },
            },
            DifficultyLevel::Hard => Self {
                number_range: (1, 50),
                operators: Operator::ALL.to_vec(),
                max_digits: 2,
                allows_negative: true,
                requires_decimals: false,
                division: DivisionRules {
                    max_dividend: 2500,
                    max_divisor: 50,
                    max_quotient: 50,
                },
                multiplication: MultiplicationRules {
                    max_factor: 50,
                    max_product: 2500,
                },
            },
            DifficultyLevel::Custom => Self {
                number_range: (1, 20),
                operators: vec![Operator::Add],
                max_digits: 2,
                allows_negative: false,
                requires_decimals: false,
                division: DivisionRules {
                    max_dividend: 400,
                    max_divisor: 20,
                    max_quotient: 20,
                },
                multiplication: MultiplicationRules {
                    max_factor: 20,
                    max_product: 400,
                },
            },
        }
    }
}

/// Thresholds shared by the analytics layer and learner bookkeeping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    /// Attempts required before the adaptive tier unlocks.
    pub min_problems_for_custom: u32,
    /// Facts below this mastery are considered weak.
    pub mastery_threshold: f64,
    /// Responses faster than this count toward the speed achievement (ms).
    pub fast_response_ms: f64,
    /// Bounded-history window for rolling metrics.
    pub window_size: usize,
}

impl Default for AnalyticsParams {
    fn default() -> Self {
        Self {
            min_problems_for_custom: 20,
            mastery_threshold: 0.8,
            fast_response_ms: 3000.0,
            window_size: 20,
        }
    }
}

/// Parameters for the custom-mode difficulty analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveParams {
    /// Operator viability: accuracy (percent) and attempt floor.
    pub viable_accuracy: f64,
    pub viable_attempts: u32,
    /// Practice within this many days also keeps an operator viable.
    pub recent_practice_days: i64,
    /// Session average response time above this triggers the fatigue guard (ms).
    pub fatigue_threshold_ms: f64,
    /// Range ceiling reduction applied under fatigue.
    pub fatigue_backoff: i64,
    /// Hard bounds on the adaptive range ceiling.
    pub range_ceiling: i64,
    pub range_floor: i64,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        Self {
            viable_accuracy: 70.0,
            viable_attempts: 10,
            recent_practice_days: 2,
            fatigue_threshold_ms: 5000.0,
            fatigue_backoff: 5,
            range_ceiling: 100,
            range_floor: 10,
        }
    }
}
