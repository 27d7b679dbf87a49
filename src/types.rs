//! Shared value types: operators, difficulty tiers, fact keys, and the
//! question-generation configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::DifficultySettings;
use crate::error::EngineError;

/// The four arithmetic operators. The set is closed; dispatch over it is a
/// plain match, never open-ended polymorphism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Display symbol for the presentation collaborator.
    pub fn display_symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "\u{2212}",
            Self::Mul => "\u{00d7}",
            Self::Div => "\u{00f7}",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Sub),
            "*" => Ok(Self::Mul),
            "/" => Ok(Self::Div),
            _ => Err(EngineError::UnknownOperator(s.to_string())),
        }
    }

    /// Applies the operator. Division by zero yields infinity; generator
    /// contracts keep divisors >= 1, so this branch is unreachable for
    /// generated questions.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => {
                if b == 0.0 {
                    f64::INFINITY
                } else {
                    a / b
                }
            }
        }
    }

    /// Multiplication and division facts key on the smaller operand so that
    /// commuted pairs map to the same fact.
    pub fn uses_canonical_base(&self) -> bool {
        matches!(self, Self::Mul | Self::Div)
    }
}

/// Builds the canonical fact key, e.g. `"+_7"` or `"*_3"`.
pub fn fact_key(op: Operator, base: i64) -> String {
    format!("{}_{}", op.symbol(), base)
}

/// Parses a stored fact key back into its operator and base operand.
pub fn parse_fact_key(key: &str) -> Result<(Operator, i64), EngineError> {
    let (symbol, base) = key
        .split_once('_')
        .ok_or_else(|| EngineError::MalformedFactKey(key.to_string()))?;
    let op = Operator::parse(symbol)?;
    let base = base
        .parse::<i64>()
        .map_err(|_| EngineError::MalformedFactKey(key.to_string()))?;
    Ok((op, base))
}

/// Difficulty tiers. Four fixed templates plus the adaptive `Custom` tier
/// whose configuration is computed from learner history.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Intro,
    Basic,
    Medium,
    Hard,
    Custom,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 5] = [
        DifficultyLevel::Intro,
        DifficultyLevel::Basic,
        DifficultyLevel::Medium,
        DifficultyLevel::Hard,
        DifficultyLevel::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Basic => "basic",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "basic" => Self::Basic,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            "custom" => Self::Custom,
            _ => Self::Intro,
        }
    }
}

/// Immutable configuration a question is generated against. Adjustments
/// never mutate in place; the analyzer always produces a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionConfig {
    pub number_range: (i64, i64),
    pub operators: Vec<Operator>,
    pub max_digits: u32,
    pub allows_negative: bool,
    pub requires_decimals: bool,
    pub difficulty: DifficultyLevel,
    #[serde(default)]
    pub focus_facts: BTreeSet<String>,
    #[serde(default)]
    pub adaptive_timing: bool,
}

impl QuestionConfig {
    /// Fixed template for one of the non-adaptive tiers.
    pub fn from_difficulty(level: DifficultyLevel) -> Self {
        let settings = DifficultySettings::for_level(level);
        Self {
            number_range: settings.number_range,
            operators: settings.operators,
            max_digits: settings.max_digits,
            allows_negative: settings.allows_negative,
            requires_decimals: settings.requires_decimals,
            difficulty: level,
            focus_facts: BTreeSet::new(),
            adaptive_timing: false,
        }
    }

    /// The documented fallback for adaptive mode before any history exists:
    /// range 1-10, addition only, single digit, nothing unlocked.
    pub fn default_custom() -> Self {
        Self {
            number_range: (1, 10),
            operators: vec![Operator::Add],
            max_digits: 1,
            allows_negative: false,
            requires_decimals: false,
            difficulty: DifficultyLevel::Custom,
            focus_facts: BTreeSet::new(),
            adaptive_timing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_symbol_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.symbol()), Ok(op));
        }
        assert!(Operator::parse("%").is_err());
    }

    #[test]
    fn fact_key_round_trip() {
        let key = fact_key(Operator::Mul, 7);
        assert_eq!(key, "*_7");
        assert_eq!(parse_fact_key(&key).unwrap(), (Operator::Mul, 7));
    }

    #[test]
    fn fact_key_rejects_garbage() {
        assert!(parse_fact_key("7").is_err());
        assert!(parse_fact_key("%_3").is_err());
        assert!(parse_fact_key("+_x").is_err());
    }

    #[test]
    fn difficulty_parse_defaults_to_intro() {
        assert_eq!(DifficultyLevel::parse("HARD"), DifficultyLevel::Hard);
        assert_eq!(DifficultyLevel::parse("unknown"), DifficultyLevel::Intro);
    }

    #[test]
    fn default_custom_matches_documented_fallback() {
        let config = QuestionConfig::default_custom();
        assert_eq!(config.number_range, (1, 10));
        assert_eq!(config.operators, vec![Operator::Add]);
        assert_eq!(config.max_digits, 1);
        assert!(!config.allows_negative);
        assert!(!config.requires_decimals);
    }

    #[test]
    fn division_by_zero_does_not_panic() {
        assert!(Operator::Div.apply(5.0, 0.0).is_infinite());
    }
}
