//! The unified entry point: one value that owns the generators, the
//! adaptive analyzer, the session analytics, and the active question
//! configuration.
//!
//! The engine never stores the learner. Callers thread a [`Learner`] and
//! the running [`SessionStats`] through each call, which keeps the engine
//! reusable across learners and trivially testable.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::adaptive::DifficultyAnalyzer;
use crate::analytics::{Analytics, AnalyticsSummary, DifficultyRecommendation};
use crate::learner::{Learner, SessionStats};
use crate::question::{GeneratorSet, Question};
use crate::types::{DifficultyLevel, QuestionConfig};

/// Composes question generation, answer checking, analytics, and adaptive
/// difficulty behind one surface.
#[derive(Debug, Clone)]
pub struct DrillEngine {
    config: QuestionConfig,
    generators: GeneratorSet,
    analyzer: DifficultyAnalyzer,
    analytics: Analytics,
}

impl Default for DrillEngine {
    fn default() -> Self {
        Self::new(DifficultyLevel::Intro)
    }
}

impl DrillEngine {
    pub fn new(difficulty: DifficultyLevel) -> Self {
        Self {
            config: QuestionConfig::from_difficulty(difficulty),
            generators: GeneratorSet::new(),
            analyzer: DifficultyAnalyzer::default(),
            analytics: Analytics::new(),
        }
    }

    /// Switches tiers. The custom tier is synthesized from the learner's
    /// accumulated operation statistics rather than a fixed template.
    pub fn set_difficulty(
        &mut self,
        difficulty: DifficultyLevel,
        learner: &Learner,
        now: DateTime<Utc>,
    ) {
        self.config = if difficulty == DifficultyLevel::Custom {
            self.analyzer
                .analyze_performance(&learner.operation_stats, now)
        } else {
            QuestionConfig::from_difficulty(difficulty)
        };
        info!(difficulty = difficulty.as_str(), "difficulty changed");
    }

    /// Applies the pending mastery decay and opens a session. Decay runs
    /// here, not on a timer: state only moves when the learner shows up.
    pub fn start_session(&self, learner: &mut Learner, now: DateTime<Utc>) -> SessionStats {
        learner.apply_decay_all(now);
        learner.start_session(now)
    }

    pub fn next_question(&mut self) -> Question {
        self.next_question_with(&mut rand::rng())
    }

    /// Deterministic variant for callers that seed their own generator.
    pub fn next_question_with(&mut self, rng: &mut impl rand::Rng) -> Question {
        Question::generate(&self.config, &mut self.generators, rng)
    }

    pub fn check_answer(&self, question: &Question, input: &str) -> bool {
        question.check_answer(input)
    }

    /// Records one answered question everywhere it matters: the learner
    /// aggregate, the session analytics, the generators' local performance
    /// windows, and (in custom mode) the per-answer difficulty adjustment.
    pub fn record_attempt(
        &mut self,
        learner: &mut Learner,
        session: &mut SessionStats,
        question: &Question,
        correct: bool,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) {
        let fact = question.fact_key();
        learner.record_attempt(
            question.operator,
            question.difficulty,
            &fact,
            correct,
            response_time_ms,
            session,
            now,
        );
        self.analytics.record_attempt(
            &fact,
            question.operator,
            question.difficulty,
            correct,
            response_time_ms,
            now,
        );
        self.generators
            .adapt_to_performance(question.operator, correct, response_time_ms);

        if self.config.difficulty == DifficultyLevel::Custom {
            self.config = self.analyzer.next_question_config(
                learner,
                session,
                &self.config,
                Some(response_time_ms),
                Some(correct),
                now,
            );
        }
    }

    /// Checks and records in one step, returning whether the input was
    /// correct.
    pub fn submit_answer(
        &mut self,
        learner: &mut Learner,
        session: &mut SessionStats,
        question: &Question,
        input: &str,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) -> bool {
        let correct = self.check_answer(question, input);
        self.record_attempt(learner, session, question, correct, response_time_ms, now);
        correct
    }

    pub fn config(&self) -> &QuestionConfig {
        &self.config
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn recommendation(&self) -> DifficultyRecommendation {
        self.analytics.recommendation()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> AnalyticsSummary {
        self.analytics.summary(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn fixed_tiers_use_their_template() {
        let engine = DrillEngine::new(DifficultyLevel::Basic);
        assert_eq!(engine.config().number_range, (1, 12));
        assert!(engine.config().operators.contains(&Operator::Sub));
    }

    #[test]
    fn custom_tier_on_a_fresh_learner_is_the_default_config() {
        let now = Utc::now();
        let learner = Learner::new("new", now);
        let mut engine = DrillEngine::new(DifficultyLevel::Intro);
        engine.set_difficulty(DifficultyLevel::Custom, &learner, now);
        assert_eq!(*engine.config(), QuestionConfig::default_custom());
    }

    #[test]
    fn record_attempt_updates_learner_and_analytics() {
        let now = Utc::now();
        let mut learner = Learner::new("kid", now);
        let mut engine = DrillEngine::new(DifficultyLevel::Intro);
        let mut session = engine.start_session(&mut learner, now);

        let question = engine.next_question_with(&mut rng());
        let fact = question.fact_key();
        engine.record_attempt(&mut learner, &mut session, &question, true, 1200.0, now);

        assert_eq!(learner.total_problems_attempted, 1);
        assert_eq!(session.problems_attempted, 1);
        assert!(engine.analytics().fact(&fact).is_some());
    }

    #[test]
    fn submit_answer_round_trips_through_check() {
        let now = Utc::now();
        let mut learner = Learner::new("kid", now);
        let mut engine = DrillEngine::new(DifficultyLevel::Intro);
        let mut session = engine.start_session(&mut learner, now);

        let question = engine.next_question_with(&mut rng());
        let input = format!("{}", question.expected_input() as i64);
        let correct =
            engine.submit_answer(&mut learner, &mut session, &question, &input, 1500.0, now);
        assert!(correct);
        assert_eq!(learner.total_correct, 1);
    }

    #[test]
    fn custom_mode_reconfigures_after_answers() {
        let now = Utc::now();
        let mut learner = Learner::new("kid", now);
        let mut engine = DrillEngine::new(DifficultyLevel::Intro);
        let mut session = engine.start_session(&mut learner, now);
        engine.set_difficulty(DifficultyLevel::Custom, &learner, now);

        let before = engine.config().number_range;
        let mut rng = rng();
        for _ in 0..5 {
            let question = engine.next_question_with(&mut rng);
            engine.record_attempt(&mut learner, &mut session, &question, true, 900.0, now);
        }
        // Fast correct answers walk the ceiling up through the comfort zone.
        assert!(engine.config().number_range.1 > before.1);
    }

    #[test]
    fn fixed_mode_config_is_stable_across_answers() {
        let now = Utc::now();
        let mut learner = Learner::new("kid", now);
        let mut engine = DrillEngine::new(DifficultyLevel::Medium);
        let mut session = engine.start_session(&mut learner, now);

        let mut rng = rng();
        for _ in 0..5 {
            let question = engine.next_question_with(&mut rng);
            engine.record_attempt(&mut learner, &mut session, &question, true, 900.0, now);
        }
        assert_eq!(
            *engine.config(),
            QuestionConfig::from_difficulty(DifficultyLevel::Medium)
        );
    }
}
