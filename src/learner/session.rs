//! Explicit session values and achievement tracking.
//!
//! A session is created by the caller, threaded through `record_attempt`,
//! and folded back into the learner when it ends. There is no hidden
//! "current session" state anywhere in the engine.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DifficultyLevel, Operator};

/// Attempts a session needs before a flawless run counts as perfect.
const PERFECT_SESSION_MIN_ATTEMPTS: u32 = 10;

/// A single practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Calendar date the session started, `YYYY-MM-DD`.
    pub date: String,
    pub started_at: DateTime<Utc>,
    pub duration_mins: f64,
    pub problems_attempted: u32,
    pub correct: u32,
    pub operations_used: BTreeSet<Operator>,
    pub difficulty_levels: BTreeSet<DifficultyLevel>,
    pub avg_response_time_ms: f64,
}

impl SessionStats {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            started_at: now,
            duration_mins: 0.0,
            problems_attempted: 0,
            correct: 0,
            operations_used: BTreeSet::new(),
            difficulty_levels: BTreeSet::new(),
            avg_response_time_ms: 0.0,
        }
    }

    pub fn record_attempt(
        &mut self,
        operator: Operator,
        difficulty: DifficultyLevel,
        correct: bool,
        response_time_ms: f64,
        now: DateTime<Utc>,
    ) {
        self.problems_attempted += 1;
        if correct {
            self.correct += 1;
        }
        self.operations_used.insert(operator);
        self.difficulty_levels.insert(difficulty);
        self.avg_response_time_ms = (self.avg_response_time_ms
            * (self.problems_attempted - 1) as f64
            + response_time_ms)
            / self.problems_attempted as f64;
        self.duration_mins = (now - self.started_at).num_seconds() as f64 / 60.0;
    }

    pub fn is_perfect(&self) -> bool {
        self.problems_attempted >= PERFECT_SESSION_MIN_ATTEMPTS
            && self.correct == self.problems_attempted
    }
}

/// Lifetime achievement counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStats {
    pub perfect_sessions: u32,
    pub problems_solved_under_3s: u32,
    pub longest_streak: u32,
    pub total_practice_days: u32,
    pub consecutive_days_streak: u32,
    pub last_practice_date: Option<NaiveDate>,
}

impl AchievementStats {
    /// Updates day-based counters; only the first attempt of a calendar day
    /// advances them.
    pub fn record_practice_day(&mut self, today: NaiveDate) {
        if self.last_practice_date == Some(today) {
            return;
        }
        match self.last_practice_date {
            Some(last) if (today - last).num_days() == 1 => {
                self.consecutive_days_streak += 1;
            }
            _ => {
                self.consecutive_days_streak = 1;
            }
        }
        self.total_practice_days += 1;
        self.last_practice_date = Some(today);
    }

    pub fn record_fast_response(&mut self, response_time_ms: f64, threshold_ms: f64) {
        if response_time_ms < threshold_ms {
            self.problems_solved_under_3s += 1;
        }
    }

    pub fn record_streak(&mut self, current_streak: u32) {
        if current_streak > self.longest_streak {
            self.longest_streak = current_streak;
        }
    }

    pub fn record_session_end(&mut self, session: &SessionStats) {
        if session.is_perfect() {
            self.perfect_sessions += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn session_running_average_and_duration() {
        let t0 = Utc::now();
        let mut session = SessionStats::start(t0);
        session.record_attempt(
            Operator::Add,
            DifficultyLevel::Intro,
            true,
            1000.0,
            t0 + Duration::seconds(30),
        );
        session.record_attempt(
            Operator::Mul,
            DifficultyLevel::Intro,
            false,
            3000.0,
            t0 + Duration::seconds(90),
        );
        assert!((session.avg_response_time_ms - 2000.0).abs() < 1e-9);
        assert!((session.duration_mins - 1.5).abs() < 1e-9);
        assert_eq!(session.operations_used.len(), 2);
    }

    #[test]
    fn perfect_session_needs_ten_attempts() {
        let t0 = Utc::now();
        let mut session = SessionStats::start(t0);
        for _ in 0..9 {
            session.record_attempt(Operator::Add, DifficultyLevel::Intro, true, 500.0, t0);
        }
        assert!(!session.is_perfect());
        session.record_attempt(Operator::Add, DifficultyLevel::Intro, true, 500.0, t0);
        assert!(session.is_perfect());
    }

    #[test]
    fn consecutive_day_streak() {
        let mut stats = AchievementStats::default();
        let day1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        stats.record_practice_day(day1);
        assert_eq!(stats.consecutive_days_streak, 1);

        // Same day is a no-op.
        stats.record_practice_day(day1);
        assert_eq!(stats.total_practice_days, 1);

        stats.record_practice_day(day1 + Duration::days(1));
        assert_eq!(stats.consecutive_days_streak, 2);

        // A gap resets the streak but still counts the day.
        stats.record_practice_day(day1 + Duration::days(5));
        assert_eq!(stats.consecutive_days_streak, 1);
        assert_eq!(stats.total_practice_days, 3);
    }
}
