//! Question construction, answer checking, and input validation.
//!
//! A [`Question`] is a value: operator, two operands, and which of the
//! three slots (operand, operand, result) is hidden. It is produced once
//! per answer cycle from the active [`QuestionConfig`] and consumed when
//! checked; nothing here mutates learner state.

mod generators;

pub use generators::{
    AddGenerator, DivGenerator, GeneratorSet, MulGenerator, NumberGenerator, SubGenerator,
};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{fact_key, DifficultyLevel, Operator, QuestionConfig};

/// Tolerance for decimal answers and reconstructed division operands.
const ANSWER_EPSILON: f64 = 1e-4;

/// Which slot of `a op b = c` the learner must fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPosition {
    Operand1,
    Operand2,
    Result,
}

impl MissingPosition {
    pub fn as_index(self) -> usize {
        match self {
            Self::Operand1 => 0,
            Self::Operand2 => 1,
            Self::Result => 2,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Operand1,
            1 => Self::Operand2,
            _ => Self::Result,
        }
    }
}

/// A single posed problem. Operands are stored as `f64` so decimal
/// division questions share the representation of integer ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub operator: Operator,
    pub num1: f64,
    pub num2: f64,
    pub missing_position: MissingPosition,
    pub decimal_places: u32,
    pub difficulty: DifficultyLevel,
}

impl Question {
    /// Builds the next question from the active config. Operator choice is
    /// uniform over the configured set; multiplication and division bias
    /// toward configured focus facts; an operand/result triple overlapping
    /// the previous question is retried a bounded number of times.
    pub fn generate(
        config: &QuestionConfig,
        generators: &mut GeneratorSet,
        rng: &mut impl Rng,
    ) -> Question {
        let operator = if config.operators.is_empty() {
            Operator::Add
        } else {
            config.operators[rng.random_range(0..config.operators.len())]
        };

        let mut pair = Self::propose_pair(operator, config, generators, rng);
        for _ in 0..10 {
            let answer = operator.apply(pair.0, pair.1);
            if !generators.triple_overlaps([pair.0, pair.1, answer]) {
                break;
            }
            pair = Self::propose_pair(operator, config, generators, rng);
        }
        let answer = operator.apply(pair.0, pair.1);
        generators.remember_triple([pair.0, pair.1, answer]);

        Question {
            operator,
            num1: pair.0,
            num2: pair.1,
            missing_position: MissingPosition::from_index(rng.random_range(0..3)),
            decimal_places: if config.requires_decimals { 1 } else { 0 },
            difficulty: config.difficulty,
        }
    }

    fn propose_pair(
        operator: Operator,
        config: &QuestionConfig,
        generators: &mut GeneratorSet,
        rng: &mut impl Rng,
    ) -> (f64, f64) {
        if matches!(operator, Operator::Mul | Operator::Div) && rng.random_bool(0.5) {
            if let Some(base) = Self::pick_focus_base(operator, config, rng) {
                let cap = 12.min(config.number_range.1).max(1);
                return match operator {
                    Operator::Div => {
                        // Anchor the divisor so the quotient stays integral.
                        let divisor = base.max(1);
                        let quotient = rng.random_range(1..=cap);
                        ((divisor * quotient) as f64, divisor as f64)
                    }
                    _ => (base as f64, rng.random_range(1..=cap) as f64),
                };
            }
        }
        generators.generator_mut(operator).generate(config, rng)
    }

    /// A random base drawn from the focus facts belonging to `operator`.
    fn pick_focus_base(
        operator: Operator,
        config: &QuestionConfig,
        rng: &mut impl Rng,
    ) -> Option<i64> {
        let bases: Vec<i64> = config
            .focus_facts
            .iter()
            .filter_map(|key| crate::types::parse_fact_key(key).ok())
            .filter(|(op, _)| *op == operator)
            .map(|(_, base)| base)
            .collect();
        if bases.is_empty() {
            None
        } else {
            Some(bases[rng.random_range(0..bases.len())])
        }
    }

    /// The value of the visible equation's result slot.
    pub fn answer(&self) -> f64 {
        self.operator.apply(self.num1, self.num2)
    }

    /// The value the learner is expected to enter.
    pub fn expected_input(&self) -> f64 {
        match self.missing_position {
            MissingPosition::Operand1 => self.num1,
            MissingPosition::Operand2 => self.num2,
            MissingPosition::Result => self.answer(),
        }
    }

    /// Checks a raw input string. Unparseable input is simply wrong; the
    /// caller cannot distinguish it from an incorrect value.
    pub fn check_answer(&self, input: &str) -> bool {
        let trimmed = input.trim();
        let value = if self.decimal_places > 0 {
            trimmed.parse::<f64>().ok()
        } else {
            trimmed.parse::<i64>().ok().map(|v| v as f64)
        };
        let Some(value) = value else {
            return false;
        };

        if self.operator == Operator::Div {
            // Verify algebraically so hidden-operand division does not
            // hinge on float division order.
            return match self.missing_position {
                MissingPosition::Operand1 => {
                    (value - self.num2 * self.answer()).abs() < ANSWER_EPSILON
                }
                MissingPosition::Operand2 => {
                    value != 0.0 && (self.num1 / value - self.answer()).abs() < ANSWER_EPSILON
                }
                MissingPosition::Result => (value - self.answer()).abs() < ANSWER_EPSILON,
            };
        }

        let expected = self.expected_input();
        if self.decimal_places > 0 {
            (value - expected).abs() < ANSWER_EPSILON
        } else {
            value == expected
        }
    }

    /// Keystroke-level validation for incremental input. Accepts prefixes
    /// of plausible answers: empty input and a lone minus sign are valid.
    pub fn validate_input(&self, input: &str, max_digits: u32) -> bool {
        if input.is_empty() || input == "-" {
            return true;
        }
        let decimals_allowed = self.decimal_places > 0;
        for ch in input.chars() {
            if !(ch.is_ascii_digit() || ch == '-' || (ch == '.' && decimals_allowed)) {
                return false;
            }
        }
        if input.matches('-').count() > 1 || (input.contains('-') && !input.starts_with('-')) {
            return false;
        }
        if input.matches('.').count() > 1 {
            return false;
        }
        if let Some((_, frac)) = input.split_once('.') {
            if frac.len() as u32 > self.decimal_places {
                return false;
            }
        }

        let digit_count = input
            .chars()
            .take_while(|ch| *ch != '.')
            .filter(|ch| ch.is_ascii_digit())
            .count() as u32;
        let mut allowed = max_digits.max(self.required_digits());
        if input.starts_with('-') {
            allowed += 1;
        }
        digit_count <= allowed
    }

    /// Digits the actual hidden value needs, so validation never rejects a
    /// correct answer the generator produced.
    fn required_digits(&self) -> u32 {
        fn digits(value: f64) -> u32 {
            let magnitude = value.abs().trunc() as i64;
            magnitude.to_string().len() as u32
        }
        match self.operator {
            // A hidden dividend can carry more digits than the quotient.
            Operator::Div => digits(self.expected_input()).max(digits(self.num1) + 1),
            _ => digits(self.expected_input()),
        }
    }

    /// The mastery-tracking key for this question. Multiplication and
    /// division use the smaller operand as the canonical base.
    pub fn fact_key(&self) -> String {
        let base = if self.operator.uses_canonical_base() {
            self.num1.min(self.num2)
        } else {
            self.num1
        };
        fact_key(self.operator, base as i64)
    }

    fn format_number(&self, value: f64) -> String {
        if self.decimal_places > 0 {
            format!("{value:.prec$}", prec = self.decimal_places as usize)
        } else {
            format!("{}", value as i64)
        }
    }

    /// The three display slots with the hidden one blanked out.
    pub fn display_numbers(&self) -> [String; 3] {
        let mut slots = [
            self.format_number(self.num1),
            self.format_number(self.num2),
            self.format_number(self.answer()),
        ];
        slots[self.missing_position.as_index()] = String::new();
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DifficultyLevel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    fn question(op: Operator, num1: f64, num2: f64, missing: MissingPosition) -> Question {
        Question {
            operator: op,
            num1,
            num2,
            missing_position: missing,
            decimal_places: 0,
            difficulty: DifficultyLevel::Intro,
        }
    }

    #[test]
    fn generated_questions_use_configured_operators() {
        let config = QuestionConfig::from_difficulty(DifficultyLevel::Basic);
        let mut generators = GeneratorSet::new();
        let mut rng = rng();
        for _ in 0..50 {
            let q = Question::generate(&config, &mut generators, &mut rng);
            assert!(config.operators.contains(&q.operator));
            assert_eq!(q.decimal_places, 0);
        }
    }

    #[test]
    fn empty_operator_list_falls_back_to_addition() {
        let config = QuestionConfig {
            operators: Vec::new(),
            ..QuestionConfig::default_custom()
        };
        let mut generators = GeneratorSet::new();
        let q = Question::generate(&config, &mut generators, &mut rng());
        assert_eq!(q.operator, Operator::Add);
    }

    #[test]
    fn correct_result_answer_is_accepted() {
        let q = question(Operator::Add, 3.0, 4.0, MissingPosition::Result);
        assert!(q.check_answer("7"));
        assert!(!q.check_answer("8"));
    }

    #[test]
    fn hidden_operand_checks_the_operand() {
        let q = question(Operator::Sub, 9.0, 4.0, MissingPosition::Operand2);
        assert!(q.check_answer("4"));
        assert!(!q.check_answer("5"));
    }

    #[test]
    fn division_hidden_dividend_reconstructs() {
        let q = question(Operator::Div, 24.0, 6.0, MissingPosition::Operand1);
        assert!(q.check_answer("24"));
        assert!(!q.check_answer("23"));
    }

    #[test]
    fn division_hidden_divisor_rejects_zero() {
        let q = question(Operator::Div, 24.0, 6.0, MissingPosition::Operand2);
        assert!(q.check_answer("6"));
        assert!(!q.check_answer("0"));
    }

    #[test]
    fn decimal_answers_use_tolerance() {
        let mut q = question(Operator::Div, 9.0, 2.0, MissingPosition::Result);
        q.decimal_places = 1;
        assert!(q.check_answer("4.5"));
        assert!(!q.check_answer("4.6"));
    }

    #[test]
    fn unparseable_input_is_wrong_not_an_error() {
        let q = question(Operator::Add, 3.0, 4.0, MissingPosition::Result);
        assert!(!q.check_answer("seven"));
        assert!(!q.check_answer(""));
        assert!(!q.check_answer("7.0")); // integer question, no decimal point
    }

    #[test]
    fn negative_answers_parse() {
        let q = question(Operator::Sub, 3.0, 8.0, MissingPosition::Result);
        assert!(q.check_answer("-5"));
    }

    #[test]
    fn validate_accepts_prefixes_and_rejects_junk() {
        let q = question(Operator::Add, 3.0, 4.0, MissingPosition::Result);
        assert!(q.validate_input("", 1));
        assert!(q.validate_input("-", 1));
        assert!(q.validate_input("7", 1));
        assert!(!q.validate_input("7a", 1));
        assert!(!q.validate_input("7.5", 1)); // decimals off
        assert!(!q.validate_input("77", 1)); // one digit suffices for 7
    }

    #[test]
    fn validate_widens_for_multi_digit_results() {
        // 9 + 9 = 18 needs two digits even at max_digits = 1.
        let q = question(Operator::Add, 9.0, 9.0, MissingPosition::Result);
        assert!(q.validate_input("18", 1));
        assert!(!q.validate_input("181", 1));
    }

    #[test]
    fn validate_allows_division_dividend_width() {
        let q = question(Operator::Div, 49.0, 7.0, MissingPosition::Operand1);
        assert!(q.validate_input("49", 1));
    }

    #[test]
    fn validate_minus_sign_rules() {
        let q = question(Operator::Sub, 3.0, 8.0, MissingPosition::Result);
        assert!(q.validate_input("-5", 1));
        assert!(!q.validate_input("5-", 1));
        assert!(!q.validate_input("--5", 1));
    }

    #[test]
    fn fact_key_uses_smaller_operand_for_multiplication() {
        let q = question(Operator::Mul, 7.0, 3.0, MissingPosition::Result);
        assert_eq!(q.fact_key(), "*_3");
        let q = question(Operator::Add, 7.0, 3.0, MissingPosition::Result);
        assert_eq!(q.fact_key(), "+_7");
    }

    #[test]
    fn display_blanks_the_missing_slot() {
        let q = question(Operator::Mul, 6.0, 4.0, MissingPosition::Operand2);
        assert_eq!(q.display_numbers(), ["6".to_string(), String::new(), "24".to_string()]);
    }

    #[test]
    fn display_formats_decimals() {
        let mut q = question(Operator::Div, 9.0, 2.0, MissingPosition::Operand1);
        q.decimal_places = 1;
        let slots = q.display_numbers();
        assert_eq!(slots[0], ""); // hidden dividend
        assert_eq!(slots[2], "4.5");
    }

    #[test]
    fn consecutive_questions_avoid_operand_overlap() {
        let config = QuestionConfig::from_difficulty(DifficultyLevel::Intro);
        let mut generators = GeneratorSet::new();
        let mut rng = rng();
        let mut overlaps = 0;
        let mut prev = Question::generate(&config, &mut generators, &mut rng);
        for _ in 0..30 {
            let next = Question::generate(&config, &mut generators, &mut rng);
            let prev_vals = [prev.num1, prev.num2, prev.answer()];
            let next_vals = [next.num1, next.num2, next.answer()];
            if next_vals
                .iter()
                .any(|v| prev_vals.iter().any(|p| (v - p).abs() < 1e-9))
            {
                overlaps += 1;
            }
            prev = next;
        }
        // Retry is bounded, so overlap can happen, just not routinely. The
        // Intro range is small; allow a generous margin.
        assert!(overlaps < 15, "overlapped {overlaps} of 30 draws");
    }

    #[test]
    fn focus_facts_bias_multiplication_operands() {
        let config = QuestionConfig {
            operators: vec![Operator::Mul],
            focus_facts: ["*_7".to_string()].into_iter().collect(),
            ..QuestionConfig::default_custom()
        };
        let mut generators = GeneratorSet::new();
        let mut rng = rng();
        let anchored = (0..100)
            .map(|_| Question::generate(&config, &mut generators, &mut rng))
            .filter(|q| (q.num1 - 7.0).abs() < 1e-9 || (q.num2 - 7.0).abs() < 1e-9)
            .count();
        assert!(anchored >= 25, "only {anchored} of 100 anchored on 7");
    }
}
