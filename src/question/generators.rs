//! Per-operator number generators with pedagogical patterns.
//!
//! Each generator mixes structured patterns (doubles, make-ten, fact
//! families, squares...) with free-form pairs, leans harder on the
//! structured ones when recent accuracy drops, and avoids reissuing a
//! recently used pair via bounded retry. The operator set is closed, so
//! dispatch is a match over [`NumberGenerator`], not open polymorphism.

use std::collections::VecDeque;

use rand::Rng;

use crate::config::DifficultySettings;
use crate::types::{Operator, QuestionConfig};

/// Order-insensitive memory of recently issued pairs.
const MAX_RECENT_PAIRS: usize = 10;
/// Rolling (correct, response time) history per generator.
const MAX_HISTORY: usize = 20;
/// Recent slice used for the accuracy/speed estimate.
const RECENT_PERF_WINDOW: usize = 10;
/// Attempts to find a non-repeating pair before accepting a repeat.
const RETRY_LIMIT: usize = 10;

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn same_pair(a: (f64, f64), b: (f64, f64)) -> bool {
    nearly_equal(a.0, b.0) && nearly_equal(a.1, b.1)
}

fn push_unique(family: &mut Vec<(f64, f64)>, pair: (f64, f64)) {
    if !family.iter().any(|p| same_pair(*p, pair)) {
        family.push(pair);
    }
}

/// State shared by all four generators: anti-repetition memory and a local
/// rolling performance estimate used to bias pattern frequencies.
#[derive(Debug, Clone, Default)]
pub struct GeneratorState {
    recent_pairs: VecDeque<(f64, f64)>,
    performance: VecDeque<(bool, f64)>,
}

impl GeneratorState {
    fn track(&mut self, a: f64, b: f64) {
        self.recent_pairs.push_back((a, b));
        if self.recent_pairs.len() > MAX_RECENT_PAIRS {
            self.recent_pairs.pop_front();
        }
    }

    fn recently_used(&self, a: f64, b: f64) -> bool {
        self.recent_pairs
            .iter()
            .any(|p| same_pair(*p, (a, b)) || same_pair(*p, (b, a)))
    }

    fn record_outcome(&mut self, correct: bool, response_time_ms: f64) {
        self.performance.push_back((correct, response_time_ms));
        if self.performance.len() > MAX_HISTORY {
            self.performance.pop_front();
        }
    }

    /// Recent (accuracy, average time). A fresh generator assumes the
    /// learner is doing fine.
    fn recent_performance(&self) -> (f64, f64) {
        if self.performance.is_empty() {
            return (1.0, 0.0);
        }
        let start = self.performance.len().saturating_sub(RECENT_PERF_WINDOW);
        let recent: Vec<&(bool, f64)> = self.performance.iter().skip(start).collect();
        let accuracy =
            recent.iter().filter(|(c, _)| *c).count() as f64 / recent.len() as f64;
        let avg_time = recent.iter().map(|(_, t)| t).sum::<f64>() / recent.len() as f64;
        (accuracy, avg_time)
    }
}

/// Runs the bounded-retry discipline over a proposal closure. On
/// exhaustion the last candidate is accepted; a repeat is preferable to
/// stalling.
fn generate_with_retry(
    state: &mut GeneratorState,
    mut propose: impl FnMut() -> (f64, f64),
) -> (f64, f64) {
    let mut candidate = propose();
    for _ in 0..RETRY_LIMIT {
        if !state.recently_used(candidate.0, candidate.1) {
            state.track(candidate.0, candidate.1);
            return candidate;
        }
        candidate = propose();
    }
    candidate
}

/// Addition: doubles, make-ten, near-doubles, free-form.
#[derive(Debug, Clone)]
pub struct AddGenerator {
    state: GeneratorState,
    doubles_frequency: f64,
    making_ten_frequency: f64,
    near_doubles_frequency: f64,
}

impl Default for AddGenerator {
    fn default() -> Self {
        Self {
            state: GeneratorState::default(),
            doubles_frequency: 0.2,
            making_ten_frequency: 0.2,
            near_doubles_frequency: 0.2,
        }
    }
}

impl AddGenerator {
    pub fn generate(&mut self, config: &QuestionConfig, rng: &mut impl Rng) -> (f64, f64) {
        let (min_val, max_val) = config.number_range;
        let (accuracy, _) = self.state.recent_performance();

        // Struggling learners see more recognizable patterns.
        if accuracy < 0.7 {
            self.doubles_frequency = 0.3;
            self.making_ten_frequency = 0.3;
        } else {
            self.doubles_frequency = 0.2;
            self.making_ten_frequency = 0.2;
        }

        let doubles = self.doubles_frequency;
        let make_ten = self.making_ten_frequency;
        let near_doubles = self.near_doubles_frequency;
        let allows_negative = config.allows_negative;

        generate_with_retry(&mut self.state, || {
            let pattern = rng.random::<f64>();
            if pattern < doubles {
                let n = rng.random_range(min_val..=(max_val / 2).max(min_val));
                (n as f64, n as f64)
            } else if pattern < doubles + make_ten {
                let n1 = rng.random_range(1..=9);
                (n1 as f64, (10 - n1) as f64)
            } else if pattern < doubles + make_ten + near_doubles {
                let base = rng.random_range(min_val..=(max_val / 2).max(min_val));
                let offset = if rng.random_bool(0.5) { 1 } else { -1 };
                (base as f64, (base + offset) as f64)
            } else if allows_negative {
                (
                    rng.random_range(-max_val..=max_val) as f64,
                    rng.random_range(-max_val..=max_val) as f64,
                )
            } else {
                (
                    rng.random_range(min_val..=max_val) as f64,
                    rng.random_range(min_val..=max_val) as f64,
                )
            }
        })
    }

    pub fn fact_family(a: f64, b: f64) -> Vec<(f64, f64)> {
        let mut family = Vec::new();
        push_unique(&mut family, (a, b));
        push_unique(&mut family, (b, a));
        if nearly_equal(a, b) {
            push_unique(&mut family, (a - 1.0, b + 1.0));
        }
        family
    }
}

/// Subtraction: fact-family triples, ten-bridging, explicit negative-answer
/// construction, free-form.
#[derive(Debug, Clone)]
pub struct SubGenerator {
    state: GeneratorState,
    fact_family_frequency: f64,
    bridging_ten_frequency: f64,
}

impl Default for SubGenerator {
    fn default() -> Self {
        Self {
            state: GeneratorState::default(),
            fact_family_frequency: 0.3,
            bridging_ten_frequency: 0.2,
        }
    }
}

impl SubGenerator {
    pub fn generate(&mut self, config: &QuestionConfig, rng: &mut impl Rng) -> (f64, f64) {
        let (min_val, max_val) = config.number_range;
        let (accuracy, _) = self.state.recent_performance();
        if accuracy < 0.7 {
            self.fact_family_frequency = 0.4;
            self.bridging_ten_frequency = 0.3;
        }

        let fact_family = self.fact_family_frequency;
        let bridging = self.bridging_ten_frequency;
        let allows_negative = config.allows_negative;

        generate_with_retry(&mut self.state, || {
            // Negative answers are built answer-first so the result is
            // guaranteed negative instead of rejection-sampled.
            if allows_negative && rng.random_bool(0.25) {
                let n2 = rng.random_range(min_val..=max_val);
                let answer = rng.random_range(-max_val..=-min_val);
                return ((answer + n2) as f64, n2 as f64);
            }

            let pattern = rng.random::<f64>();
            if pattern < fact_family {
                // Reuse an addition fact: (base + addend) - one of them.
                let base = rng.random_range(min_val..=(max_val - 5).max(min_val));
                let addend = rng.random_range(1..=5.min(max_val - base).max(1));
                let n2 = if rng.random_bool(0.5) { base } else { addend };
                ((base + addend) as f64, n2 as f64)
            } else if pattern < fact_family + bridging && max_val >= 15 {
                // Bridge a ten, e.g. 32 - 5. Needs room above 10.
                let base = rng.random_range(1..=(max_val / 10).max(1)) * 10;
                let n1 = (base + rng.random_range(1..=5)).min(max_val);
                let n2 = rng.random_range(2..=7.min(n1 - 1).max(2));
                (n1 as f64, n2 as f64)
            } else {
                let n2 = rng.random_range(min_val..=max_val);
                let n1 = rng.random_range(n2..=max_val);
                (n1 as f64, n2 as f64)
            }
        })
    }

    pub fn fact_family(a: f64, b: f64) -> Vec<(f64, f64)> {
        let result = a - b;
        let mut family = Vec::new();
        push_unique(&mut family, (a, b));
        push_unique(&mut family, (a, result));
        push_unique(&mut family, (b + result, b));
        push_unique(&mut family, (result + b, result));
        family
    }
}

/// Multiplication: perfect squares, double/half pairs, free-form bounded by
/// max factor and product.
#[derive(Debug, Clone)]
pub struct MulGenerator {
    state: GeneratorState,
    square_frequency: f64,
    double_halve_frequency: f64,
}

impl Default for MulGenerator {
    fn default() -> Self {
        Self {
            state: GeneratorState::default(),
            square_frequency: 0.2,
            double_halve_frequency: 0.2,
        }
    }
}

impl MulGenerator {
    pub fn generate(&mut self, config: &QuestionConfig, rng: &mut impl Rng) -> (f64, f64) {
        let rules = DifficultySettings::for_level(config.difficulty).multiplication;
        let (accuracy, _) = self.state.recent_performance();
        if accuracy < 0.7 {
            self.square_frequency = 0.3;
            self.double_halve_frequency = 0.3;
        }

        let squares = self.square_frequency;
        let double_halve = self.double_halve_frequency;
        let min_val = config.number_range.0;
        let max_factor = rules.max_factor;
        let max_product = rules.max_product;
        let state = &mut self.state;

        // Candidates over the product cap are rejected and retried.
        let mut candidate = (0.0, 0.0);
        for _ in 0..RETRY_LIMIT {
            let pattern = rng.random::<f64>();
            candidate = if pattern < squares {
                let root_cap = ((max_factor as f64).sqrt() as i64).max(2);
                let n = rng.random_range(2..=root_cap);
                (n as f64, n as f64)
            } else if pattern < squares + double_halve {
                let base = rng.random_range(2..=(max_factor / 2).max(2));
                ((base * 2) as f64, base as f64)
            } else {
                (
                    rng.random_range(min_val..=max_factor.max(min_val)) as f64,
                    rng.random_range(min_val..=max_factor.max(min_val)) as f64,
                )
            };
            if candidate.0 * candidate.1 <= max_product as f64
                && !state.recently_used(candidate.0, candidate.1)
            {
                state.track(candidate.0, candidate.1);
                return candidate;
            }
        }
        candidate
    }

    pub fn fact_family(a: f64, b: f64) -> Vec<(f64, f64)> {
        let mut family = Vec::new();
        push_unique(&mut family, (a, b));
        push_unique(&mut family, (b, a));
        if (a as i64) % 2 == 0 {
            push_unique(&mut family, (a / 2.0, b * 2.0));
        }
        if (b as i64) % 2 == 0 {
            push_unique(&mut family, (a * 2.0, b / 2.0));
        }
        family
    }
}

/// Division: multiplication-fact-family pairs with guaranteed integer
/// quotients, optional decimal-producing pairs, free-form within the
/// configured divisor/dividend/quotient bounds. Divisors are always >= 1.
#[derive(Debug, Clone)]
pub struct DivGenerator {
    state: GeneratorState,
    fact_family_frequency: f64,
    decimal_frequency: f64,
}

impl Default for DivGenerator {
    fn default() -> Self {
        Self {
            state: GeneratorState::default(),
            fact_family_frequency: 0.3,
            decimal_frequency: 0.2,
        }
    }
}

impl DivGenerator {
    pub fn generate(&mut self, config: &QuestionConfig, rng: &mut impl Rng) -> (f64, f64) {
        let rules = DifficultySettings::for_level(config.difficulty).division;
        let (accuracy, _) = self.state.recent_performance();
        if accuracy < 0.7 {
            self.fact_family_frequency = 0.4;
            if config.requires_decimals {
                self.decimal_frequency = 0.1;
            }
        }

        let fact_family = self.fact_family_frequency;
        let decimals = self.decimal_frequency;
        let requires_decimals = config.requires_decimals;
        let max_divisor = rules.max_divisor.max(1);
        let max_dividend = rules.max_dividend.max(1);
        let max_quotient = rules.max_quotient.max(1);

        generate_with_retry(&mut self.state, || {
            let pattern = rng.random::<f64>();
            if pattern < fact_family {
                let n2 = rng.random_range(2..=max_divisor.max(2));
                let q_cap = (max_dividend / n2).min(max_quotient).max(1);
                let quotient = rng.random_range(1..=q_cap);
                ((n2 * quotient) as f64, n2 as f64)
            } else if pattern < fact_family + decimals && requires_decimals {
                // Half-step dividends produce clean one-decimal quotients.
                let n2 = rng.random_range(2..=10);
                let n1 = (n2 * rng.random_range(1..=10)) as f64 + n2 as f64 / 2.0;
                (n1, n2 as f64)
            } else {
                let n2 = rng.random_range(1..=max_divisor);
                let q_cap = (max_dividend / n2).min(max_quotient);
                if q_cap < 1 {
                    // Bounds leave no room: fall back to quotient = 1.
                    (n2 as f64, n2 as f64)
                } else {
                    let quotient = rng.random_range(1..=q_cap);
                    ((n2 * quotient) as f64, n2 as f64)
                }
            }
        })
    }

    pub fn fact_family(a: f64, b: f64) -> Vec<(f64, f64)> {
        let quotient = a / b;
        let mut family = Vec::new();
        push_unique(&mut family, (a, b));
        push_unique(&mut family, (a, quotient));
        push_unique(&mut family, (b * quotient, quotient));
        push_unique(&mut family, (b * quotient, b));
        family
    }
}

/// Closed dispatch over the four operator generators.
#[derive(Debug, Clone)]
pub enum NumberGenerator {
    Add(AddGenerator),
    Sub(SubGenerator),
    Mul(MulGenerator),
    Div(DivGenerator),
}

impl NumberGenerator {
    pub fn for_operator(operator: Operator) -> Self {
        match operator {
            Operator::Add => Self::Add(AddGenerator::default()),
            Operator::Sub => Self::Sub(SubGenerator::default()),
            Operator::Mul => Self::Mul(MulGenerator::default()),
            Operator::Div => Self::Div(DivGenerator::default()),
        }
    }

    pub fn generate(&mut self, config: &QuestionConfig, rng: &mut impl Rng) -> (f64, f64) {
        match self {
            Self::Add(g) => g.generate(config, rng),
            Self::Sub(g) => g.generate(config, rng),
            Self::Mul(g) => g.generate(config, rng),
            Self::Div(g) => g.generate(config, rng),
        }
    }

    /// Related pairs by commutativity and inverse-operation identities.
    pub fn fact_family(&self, a: f64, b: f64) -> Vec<(f64, f64)> {
        match self {
            Self::Add(_) => AddGenerator::fact_family(a, b),
            Self::Sub(_) => SubGenerator::fact_family(a, b),
            Self::Mul(_) => MulGenerator::fact_family(a, b),
            Self::Div(_) => DivGenerator::fact_family(a, b),
        }
    }

    /// Feeds the local rolling estimate that biases pattern frequencies.
    pub fn adapt_to_performance(&mut self, correct: bool, response_time_ms: f64) {
        let state = match self {
            Self::Add(g) => &mut g.state,
            Self::Sub(g) => &mut g.state,
            Self::Mul(g) => &mut g.state,
            Self::Div(g) => &mut g.state,
        };
        state.record_outcome(correct, response_time_ms);
    }
}

/// One generator per operator plus the short-term memory of the last
/// question's operand/result triple, which suppresses immediate repeats
/// across generators.
#[derive(Debug, Clone)]
pub struct GeneratorSet {
    add: NumberGenerator,
    sub: NumberGenerator,
    mul: NumberGenerator,
    div: NumberGenerator,
    last_triple: Option<[f64; 3]>,
}

impl Default for GeneratorSet {
    fn default() -> Self {
        Self {
            add: NumberGenerator::for_operator(Operator::Add),
            sub: NumberGenerator::for_operator(Operator::Sub),
            mul: NumberGenerator::for_operator(Operator::Mul),
            div: NumberGenerator::for_operator(Operator::Div),
            last_triple: None,
        }
    }
}

impl GeneratorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generator_mut(&mut self, operator: Operator) -> &mut NumberGenerator {
        match operator {
            Operator::Add => &mut self.add,
            Operator::Sub => &mut self.sub,
            Operator::Mul => &mut self.mul,
            Operator::Div => &mut self.div,
        }
    }

    pub fn generator(&self, operator: Operator) -> &NumberGenerator {
        match operator {
            Operator::Add => &self.add,
            Operator::Sub => &self.sub,
            Operator::Mul => &self.mul,
            Operator::Div => &self.div,
        }
    }

    pub fn adapt_to_performance(&mut self, operator: Operator, correct: bool, response_time_ms: f64) {
        self.generator_mut(operator)
            .adapt_to_performance(correct, response_time_ms);
    }

    pub(crate) fn triple_overlaps(&self, values: [f64; 3]) -> bool {
        let Some(last) = self.last_triple else {
            return false;
        };
        values
            .iter()
            .any(|v| last.iter().any(|l| nearly_equal(*v, *l)))
    }

    pub(crate) fn remember_triple(&mut self, values: [f64; 3]) {
        self.last_triple = Some(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DifficultyLevel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn intro_config() -> QuestionConfig {
        QuestionConfig::from_difficulty(DifficultyLevel::Intro)
    }

    #[test]
    fn addition_pairs_stay_in_range() {
        let mut gen = AddGenerator::default();
        let config = intro_config();
        let mut rng = rng();
        // Make-ten pairs may use 1..=9 regardless of the tier range, and a
        // near-double below the range minimum can reach 0.
        let upper = (config.number_range.1 as f64).max(9.0);
        for _ in 0..100 {
            let (a, b) = gen.generate(&config, &mut rng);
            assert!((0.0..=upper).contains(&a), "operand {a} out of range");
            assert!((0.0..=upper).contains(&b), "operand {b} out of range");
        }
    }

    #[test]
    fn subtraction_without_negatives_never_goes_below_zero() {
        let mut gen = SubGenerator::default();
        let config = intro_config();
        let mut rng = rng();
        for _ in 0..200 {
            let (a, b) = gen.generate(&config, &mut rng);
            assert!(a - b >= 0.0, "got {a} - {b}");
        }
    }

    #[test]
    fn negative_mode_produces_some_negative_answers() {
        let mut gen = SubGenerator::default();
        let config = QuestionConfig {
            allows_negative: true,
            number_range: (1, 20),
            ..QuestionConfig::from_difficulty(DifficultyLevel::Medium)
        };
        let mut rng = rng();
        let negatives = (0..300)
            .map(|_| gen.generate(&config, &mut rng))
            .filter(|(a, b)| a - b < 0.0)
            .count();
        assert!(negatives > 0);
    }

    #[test]
    fn multiplication_respects_product_cap() {
        let mut gen = MulGenerator::default();
        let config = intro_config();
        let rules = DifficultySettings::for_level(DifficultyLevel::Intro).multiplication;
        let mut rng = rng();
        for _ in 0..200 {
            let (a, b) = gen.generate(&config, &mut rng);
            assert!(a * b <= rules.max_product as f64);
        }
    }

    #[test]
    fn division_pairs_satisfy_intro_bounds() {
        let mut gen = DivGenerator::default();
        let config = intro_config();
        let mut rng = rng();
        for _ in 0..300 {
            let (dividend, divisor) = gen.generate(&config, &mut rng);
            assert!((1.0..=7.0).contains(&divisor));
            assert!(dividend <= 49.0);
            let quotient = dividend / divisor;
            assert!((1.0..=7.0).contains(&quotient));
            // Integer quotients unless the decimal branch fires (it cannot
            // here: decimals are off at this tier).
            assert!(nearly_equal(quotient, quotient.round()));
        }
    }

    #[test]
    fn decimal_division_produces_fractional_quotients() {
        let mut gen = DivGenerator::default();
        let config = QuestionConfig {
            requires_decimals: true,
            ..QuestionConfig::from_difficulty(DifficultyLevel::Hard)
        };
        let mut rng = rng();
        let fractional = (0..300)
            .map(|_| gen.generate(&config, &mut rng))
            .filter(|(a, b)| {
                let q = a / b;
                !nearly_equal(q, q.round())
            })
            .count();
        assert!(fractional > 0);
    }

    #[test]
    fn immediate_pair_repeats_are_rare() {
        let mut gen = AddGenerator::default();
        let config = intro_config();
        let mut rng = rng();
        let mut previous = gen.generate(&config, &mut rng);
        let mut repeats = 0;
        for _ in 0..11 {
            let next = gen.generate(&config, &mut rng);
            if same_pair(next, previous) || same_pair(next, (previous.1, previous.0)) {
                repeats += 1;
            }
            previous = next;
        }
        // The bounded-retry escape allows at most the odd repeat.
        assert!(repeats <= 1, "repeated {repeats} times in 11 draws");
    }

    #[test]
    fn addition_fact_family_is_commutative() {
        let family = AddGenerator::fact_family(3.0, 4.0);
        assert!(family.iter().any(|p| same_pair(*p, (4.0, 3.0))));
    }

    #[test]
    fn division_fact_family_reconstructs_dividend() {
        let family = DivGenerator::fact_family(12.0, 3.0);
        assert!(family.iter().any(|p| same_pair(*p, (12.0, 4.0))));
        assert!(family.iter().any(|p| same_pair(*p, (12.0, 3.0))));
    }

    #[test]
    fn struggling_history_boosts_structured_patterns() {
        let mut gen = AddGenerator::default();
        for _ in 0..10 {
            gen.state.record_outcome(false, 4000.0);
        }
        let config = intro_config();
        gen.generate(&config, &mut rng());
        assert!((gen.doubles_frequency - 0.3).abs() < 1e-9);
        assert!((gen.making_ten_frequency - 0.3).abs() < 1e-9);
    }
}
