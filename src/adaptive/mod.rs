//! Adaptive ("custom") difficulty: full recompute from operation history
//! plus cheap per-answer adjustment.

mod analyzer;

pub use analyzer::{DifficultyAnalyzer, OperationBoundary};
