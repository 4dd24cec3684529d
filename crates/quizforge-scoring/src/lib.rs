//! Scoring formulas for Quizforge.
//!
//! Question handlers consume scoring through the [`Scoring`] trait, so the
//! formulas stay swappable without touching the engine. [`StandardScoring`]
//! is the shipped implementation: base points decay linearly from 1000 to 0
//! across the answer window, a streak multiplier rewards consecutive full
//! answers, and partial-credit kinds scale the base by their fraction.
//!
//! Contract every implementation must honor (handlers rely on it):
//!
//! - an incorrect answer scores 0;
//! - for a fixed streak, score never increases with elapsed time;
//! - for a fixed time, score never decreases with streak;
//! - a fraction of 0 scores 0, and partial scores scale with the fraction;
//! - boss damage is non-negative.

use quizforge_protocol::ChallengeSettings;

/// Full marks for an instant answer.
const MAX_BASE_POINTS: f64 = 1000.0;

/// Streak bonus per consecutive correct answer beyond the first.
const STREAK_STEP: f64 = 0.1;

/// Streak steps stop accumulating here (+50%).
const STREAK_CAP: u32 = 5;

// ---------------------------------------------------------------------------
// The trait
// ---------------------------------------------------------------------------

/// Pure scoring functions, injected into question handlers.
pub trait Scoring: Send + Sync {
    /// Score for an all-or-nothing answer. `streak` is the player's streak
    /// *after* this answer was recorded, so a first correct answer arrives
    /// with `streak == 1`.
    fn calculate_score(
        &self,
        time_ms: u64,
        is_correct: bool,
        streak: u32,
        duration_secs: u64,
    ) -> i64;

    /// Score for a partial-credit answer; `fraction` is the share of the
    /// question the player got right, in `[0, 1]`.
    fn calculate_partial_score(
        &self,
        time_ms: u64,
        fraction: f64,
        streak: u32,
        duration_secs: u64,
    ) -> i64;

    /// Damage one correct answer deals to a boss.
    fn calculate_boss_damage(
        &self,
        time_ms: u64,
        duration_secs: u64,
        challenge: &ChallengeSettings,
    ) -> u32;

    /// Whether a free-text answer matches any accepted answer.
    fn is_typed_answer_correct(
        &self,
        answer: &str,
        accepted: &[String],
    ) -> bool;
}

// ---------------------------------------------------------------------------
// StandardScoring
// ---------------------------------------------------------------------------

/// The default formulas.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScoring;

impl StandardScoring {
    /// Linear decay from [`MAX_BASE_POINTS`] at t=0 down to 0 at the end of
    /// the window. A zero-length window yields 0; room settings clamp the
    /// duration well above that.
    fn base_points(&self, time_ms: u64, duration_secs: u64) -> f64 {
        let duration_ms = duration_secs.saturating_mul(1000);
        if duration_ms == 0 {
            return 0.0;
        }
        let points = MAX_BASE_POINTS
            - (MAX_BASE_POINTS / duration_ms as f64) * time_ms as f64;
        points.max(0.0)
    }

    fn streak_multiplier(&self, streak: u32) -> f64 {
        let steps = streak.saturating_sub(1).min(STREAK_CAP);
        1.0 + STREAK_STEP * steps as f64
    }
}

impl Scoring for StandardScoring {
    fn calculate_score(
        &self,
        time_ms: u64,
        is_correct: bool,
        streak: u32,
        duration_secs: u64,
    ) -> i64 {
        if !is_correct {
            return 0;
        }
        let base = self.base_points(time_ms, duration_secs);
        (base * self.streak_multiplier(streak)).round() as i64
    }

    fn calculate_partial_score(
        &self,
        time_ms: u64,
        fraction: f64,
        streak: u32,
        duration_secs: u64,
    ) -> i64 {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction == 0.0 {
            return 0;
        }
        let base = self.base_points(time_ms, duration_secs);
        (base * fraction * self.streak_multiplier(streak)).round() as i64
    }

    fn calculate_boss_damage(
        &self,
        time_ms: u64,
        duration_secs: u64,
        challenge: &ChallengeSettings,
    ) -> u32 {
        let duration_ms = duration_secs.saturating_mul(1000).max(1);
        let remaining =
            (1.0 - time_ms as f64 / duration_ms as f64).clamp(0.0, 1.0);
        challenge.base_damage
            + (challenge.speed_bonus as f64 * remaining).round() as u32
    }

    fn is_typed_answer_correct(
        &self,
        answer: &str,
        accepted: &[String],
    ) -> bool {
        let wanted = normalize(answer);
        accepted.iter().any(|a| normalize(a) == wanted)
    }
}

/// Casefolds, trims, and collapses internal whitespace, so `" New  YORK "`
/// matches `"new york"`.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// =========================================================================
// Tests
// =========================================================================
