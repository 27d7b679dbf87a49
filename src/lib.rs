//! # mathdrill - adaptive arithmetic drill engine
//!
//! Decides which problem to present next, tracks per-fact mastery over time,
//! and reconfigures difficulty continuously so practice stays in a learner's
//! productive zone.
//!
//! The crate is a pure, synchronous core: no I/O, no persistence, no
//! rendering. The persistence collaborator hands in a [`Learner`] aggregate
//! (serde round-trip), the presentation collaborator asks for questions and
//! checks answers, and everything in between is this crate.
//!
//! ## Module structure
//!
//! - [`types`] - operators, difficulty tiers, question configuration
//! - [`config`] - per-tier generation templates and tunable parameters
//! - [`learner`] - the learner aggregate: fact mastery store with time
//!   decay, per-operation and per-tier statistics, sessions, achievements
//! - [`analytics`] - least-squares trend estimation, windowed performance
//!   metrics, spaced-review scheduling, learning curve
//! - [`adaptive`] - the custom-mode difficulty analyzer
//! - [`question`] - per-operator question generators and the question value
//! - [`engine`] - unified entry point composing the above

pub mod adaptive;
pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod learner;
pub mod question;
pub mod types;

pub use adaptive::{DifficultyAnalyzer, OperationBoundary};
pub use analytics::{Analytics, DifficultyRecommendation, FactAnalytics, PerformanceMetrics};
pub use engine::DrillEngine;
pub use error::EngineError;
pub use learner::{AchievementStats, DifficultyStats, Learner, OperationStats, SessionStats};
pub use question::{GeneratorSet, MissingPosition, NumberGenerator, Question};
pub use types::{fact_key, parse_fact_key, DifficultyLevel, Operator, QuestionConfig};
