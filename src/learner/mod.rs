//! The learner aggregate: per-operation fact mastery with time decay,
//! per-tier statistics, explicit session values, and achievements.
//!
//! Everything here is owned by exactly one learner; constructors allocate
//! every map and window freshly so no state is ever shared across learners.

mod operation;
mod profile;
mod session;

pub use operation::{DifficultyStats, OperationStats};
pub use profile::Learner;
pub use session::{AchievementStats, SessionStats};
