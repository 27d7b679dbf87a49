//! Performance analytics: trend estimation over bounded histories,
//! confidence and mastery scoring, spaced-review scheduling, and the
//! aggregator that ties them together per operator, difficulty, and fact.

mod aggregator;
mod curve;
mod facts;
mod metrics;
pub mod trend;

pub use aggregator::{Analytics, AnalyticsSummary, DifficultyRecommendation, OperatorSummary};
pub use curve::{CurveTrend, LearningCurve};
pub use facts::FactAnalytics;
pub use metrics::{PerformanceMetrics, TrendSummary};
