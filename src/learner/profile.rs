//! The learner aggregate handed across the persistence boundary.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalyticsParams;
use crate::learner::{AchievementStats, DifficultyStats, OperationStats, SessionStats};
use crate::types::{DifficultyLevel, Operator};

/// Most recent sessions retained on the aggregate.
const SESSION_HISTORY_CAP: usize = 50;
/// Sessions scanned for recent struggles.
const STRUGGLE_SESSION_LOOKBACK: usize = 3;
/// Week-old struggles are included at reduced count.
const OLDER_STRUGGLE_CAP: usize = 3;

/// All per-learner state: totals, streaks, per-operation fact mastery,
/// per-tier statistics, recent sessions, and achievements. Serialized as a
/// whole by the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
    pub total_problems_attempted: u32,
    pub total_correct: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub time_spent_mins: f64,
    pub operation_stats: HashMap<Operator, OperationStats>,
    pub difficulty_stats: HashMap<DifficultyLevel, DifficultyStats>,
    pub recent_sessions: Vec<SessionStats>,
    pub achievement_stats: AchievementStats,
    #[serde(default)]
    pub params: AnalyticsParams,
}

impl Learner {
    /// Every map and window is freshly allocated per learner.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            creation_date: now,
            last_active: None,
            total_problems_attempted: 0,
            total_correct: 0,
            current_streak: 0,
            best_streak: 0,
            time_spent_mins: 0.0,
            operation_stats: Operator::ALL
                .iter()
                .map(|op| (*op, OperationStats::new()))
                .collect(),
            difficulty_stats: DifficultyLevel::ALL
                .iter()
                .map(|level| (*level, DifficultyStats::default()))
                .collect(),
            recent_sessions: Vec::new(),
            achievement_stats: AchievementStats::default(),
            params: AnalyticsParams::default(),
        }
    }

    /// Records one answered problem against the learner and the session the
    /// caller is threading through.
    pub fn record_attempt(
        &mut self,
        operator: Operator,
        difficulty: DifficultyLevel,
        fact: &str,
        correct: bool,
        response_time_ms: f64,
        session: &mut SessionStats,
        now: DateTime<Utc>,
    ) {
        self.total_problems_attempted += 1;
        if correct {
            self.total_correct += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        self.time_spent_mins += response_time_ms / 60_000.0;

        self.operation_stats
            .entry(operator)
            .or_default()
            .record_attempt(fact, correct, response_time_ms, now);
        self.difficulty_stats
            .entry(difficulty)
            .or_default()
            .record_attempt(correct, response_time_ms, now);

        self.achievement_stats
            .record_fast_response(response_time_ms, self.params.fast_response_ms);
        self.achievement_stats.record_practice_day(now.date_naive());
        self.achievement_stats.record_streak(self.current_streak);

        session.record_attempt(operator, difficulty, correct, response_time_ms, now);
        self.last_active = Some(now);

        debug!(
            learner = %self.name,
            operator = operator.symbol(),
            fact,
            correct,
            response_time_ms,
            "attempt recorded"
        );
    }

    /// Starts a fresh session value for the caller to thread through
    /// `record_attempt`.
    pub fn start_session(&self, now: DateTime<Utc>) -> SessionStats {
        SessionStats::start(now)
    }

    /// Folds a finished session back into the aggregate, keeping the most
    /// recent fifty.
    pub fn finish_session(&mut self, session: SessionStats) {
        self.achievement_stats.record_session_end(&session);
        self.recent_sessions.push(session);
        if self.recent_sessions.len() > SESSION_HISTORY_CAP {
            let excess = self.recent_sessions.len() - SESSION_HISTORY_CAP;
            self.recent_sessions.drain(..excess);
        }
    }

    /// Overall mastery of an operation: accuracy, speed, and mean fact
    /// mastery weighted 0.6 / 0.2 / 0.2. Zero for unpracticed operations.
    pub fn mastery_level(&self, operator: Operator) -> f64 {
        let Some(stats) = self.operation_stats.get(&operator) else {
            return 0.0;
        };
        if stats.problems_attempted == 0 {
            return 0.0;
        }
        let accuracy_factor = stats.accuracy / 100.0;
        let speed_factor = (1.0 - stats.avg_response_time_ms / 5000.0).max(0.0);
        let fact_count = stats.fact_mastery.len().max(1);
        let fact_factor = stats.fact_mastery.values().sum::<f64>() / fact_count as f64;
        accuracy_factor * 0.6 + speed_factor * 0.2 + fact_factor * 0.2
    }

    pub fn can_use_custom_mode(&self) -> bool {
        self.total_problems_attempted >= self.params.min_problems_for_custom
    }

    /// Recommended fixed tier from accuracy across practiced tiers.
    /// Idempotent for the same inputs; callers rate-limit how often they
    /// act on it.
    pub fn recommended_difficulty(&self) -> DifficultyLevel {
        if self.total_problems_attempted < 10 {
            return DifficultyLevel::Intro;
        }
        let practiced: Vec<&DifficultyStats> = self
            .difficulty_stats
            .values()
            .filter(|stats| stats.problems_attempted > 0)
            .collect();
        if practiced.is_empty() {
            return DifficultyLevel::Intro;
        }
        let avg_accuracy =
            practiced.iter().map(|stats| stats.accuracy).sum::<f64>() / practiced.len() as f64;

        if avg_accuracy < 60.0 {
            DifficultyLevel::Intro
        } else if avg_accuracy < 75.0 {
            DifficultyLevel::Basic
        } else if avg_accuracy < 85.0 {
            DifficultyLevel::Medium
        } else {
            DifficultyLevel::Hard
        }
    }

    /// Facts the learner struggled with in the last few sessions. The
    /// running session, if any, counts as the most recent one, so misses
    /// surface before the session is folded back in. Facts practiced within
    /// two days are all included; week-old struggles are capped at a few
    /// per operation.
    pub fn recent_struggles(
        &self,
        current_session: Option<&SessionStats>,
        now: DateTime<Utc>,
    ) -> BTreeSet<String> {
        let mut struggles = BTreeSet::new();
        let lookback = current_session
            .into_iter()
            .chain(self.recent_sessions.iter().rev())
            .take(STRUGGLE_SESSION_LOOKBACK);

        for session in lookback {
            for operator in &session.operations_used {
                let Some(stats) = self.operation_stats.get(operator) else {
                    continue;
                };
                let weak = stats.weak_facts(self.params.mastery_threshold);
                let Some(last) = stats.last_practiced else {
                    continue;
                };
                let days_since = (now - last).num_days();
                if days_since <= 2 {
                    struggles.extend(weak);
                } else if days_since <= 7 {
                    struggles.extend(weak.into_iter().take(OLDER_STRUGGLE_CAP));
                }
            }
        }
        struggles
    }

    /// Total elapsed days since the learner last practiced anything.
    pub fn days_since_active(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_active.map(|last| (now - last).num_days())
    }

    /// Convenience guard used by decay simulations: applies the decay pass
    /// to every operation without recording an attempt.
    pub fn apply_decay_all(&mut self, now: DateTime<Utc>) {
        for stats in self.operation_stats.values_mut() {
            stats.apply_decay(now);
        }
    }
}
