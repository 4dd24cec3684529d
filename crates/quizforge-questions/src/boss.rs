//! The boss handler: single-choice answers that collectively burn down a
//! shared HP pool.

use std::collections::HashMap;

use rand::RngCore;

use quizforge_protocol::{
    AnswerPayload, BossPublic, BossSettings, Player, PlayerId, Question,
    QuestionKind, QuestionPayload, Reveal,
};
use quizforge_scoring::Scoring;

use crate::handler::{
    record_streak, AnswerTiming, HandlerMeta, QuestionHandler, Verdict,
};

/// A boss question. Individually it scores exactly like single choice;
/// collectively every correct answer adds damage to the question's meta,
/// and the post-round step settles the fight: HP is clamped at zero, and
/// a defeat pays the flat team bonus into every round-score entry exactly
/// once.
pub struct BossHandler;

impl BossHandler {
    fn settings(question: &Question) -> BossSettings {
        question.boss.unwrap_or_default()
    }
}

impl QuestionHandler for BossHandler {
    fn kind(&self) -> QuestionKind {
        QuestionKind::Boss
    }

    fn build_payload(
        &self,
        question: &Question,
        meta: &mut HandlerMeta,
        _rng: &mut dyn RngCore,
    ) -> QuestionPayload {
        let settings = Self::settings(question);
        let mut payload =
            QuestionPayload::new(question.kind, question.text.clone());
        payload.options = question.options.clone();
        payload.boss = Some(BossPublic {
            max_hp: settings.max_hp,
        });
        *meta = HandlerMeta::Boss {
            total_damage: 0,
            remaining_hp: settings.max_hp,
            defeated: false,
        };
        payload
    }

    fn evaluate(
        &self,
        question: &Question,
        player: &mut Player,
        answer: &AnswerPayload,
        meta: &mut HandlerMeta,
        scoring: &dyn Scoring,
        timing: AnswerTiming,
    ) -> Verdict {
        let is_correct = matches!(
            answer,
            AnswerPayload::Index(picked)
                if Some(*picked) == question.correct_index
        );

        if is_correct {
            if let HandlerMeta::Boss { total_damage, .. } = meta {
                let settings = Self::settings(question);
                *total_damage += scoring.calculate_boss_damage(
                    timing.time_ms,
                    timing.duration_secs,
                    &settings.challenge,
                );
            }
        }

        let streak = record_streak(player, is_correct);
        let round_score = scoring.calculate_score(
            timing.time_ms,
            is_correct,
            streak,
            timing.duration_secs,
        );
        Verdict {
            is_correct,
            round_score,
        }
    }

    fn build_reveal(
        &self,
        question: &Question,
        meta: &HandlerMeta,
    ) -> Reveal {
        let settings = Self::settings(question);
        let (remaining_hp, defeated) = match meta {
            HandlerMeta::Boss {
                remaining_hp,
                defeated,
                ..
            } => (*remaining_hp, *defeated),
            _ => (settings.max_hp, false),
        };
        Reveal::Boss {
            correct_index: question.correct_index.unwrap_or(0),
            remaining_hp,
            defeated,
        }
    }

    /// Settles the fight. Runs once per question; the `defeated` flag
    /// makes the bonus unrepeatable even if that ever changed.
    fn apply_post_round(
        &self,
        question: &Question,
        meta: &mut HandlerMeta,
        round_scores: &mut HashMap<PlayerId, i64>,
        players: &mut [Player],
    ) {
        let HandlerMeta::Boss {
            total_damage,
            remaining_hp,
            defeated,
        } = meta
        else {
            return;
        };

        let settings = Self::settings(question);
        *remaining_hp = settings.max_hp.saturating_sub(*total_damage);

        if *remaining_hp == 0 && !*defeated {
            *defeated = true;
            for (id, round_score) in round_scores.iter_mut() {
                *round_score += settings.team_bonus;
                if let Some(player) =
                    players.iter_mut().find(|p| p.id == *id)
                {
                    player.score += settings.team_bonus;
                }
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
