//! Creator Studio: draw-and-rate party rounds.
//!
//! Each round runs three timed phases. One player (the creator) gets a
//! prompt and a create window; everyone else then rates the work 1 to
//! 10; the result screen shows the averages before the next round picks
//! a different creator. Every phase transition re-broadcasts the round
//! as a question payload carrying a [`StudioSnapshot`]. Rounds advance
//! on the phase timers, except that a submission ends the create phase
//! and a full set of ratings ends the rating phase early.

use std::collections::HashMap;
use std::time::Duration;

use rand::{Rng, RngCore};
use tracing::{debug, info};

use quizforge_protocol::{
    AnswerPayload, CreatorSubmission, GameMode, GameOverBroadcast,
    GameStartBroadcast, PlayerId, PromptKind, QuestionKind,
    QuestionPayload, RatingProgress, Recipient, Reject, RejectCode,
    ServerEvent, StudioOutcome, StudioPhase, StudioPrompt, StudioScore,
    StudioSnapshot, SubmissionSavedAck,
};

use crate::config::RoomState;
use crate::dispatch::Dispatch;
use crate::modes::{Flow, ModeRuntime, ModeState};
use crate::timer::Alarm;

#[derive(Debug)]
pub struct StudioState {
    /// Cycled with `round_index` when rounds outnumber prompts.
    pub prompts: Vec<StudioPrompt>,
    pub round_index: usize,
    pub rounds_total: usize,
    pub creator_id: PlayerId,
    pub phase: StudioPhase,
    /// What the creator handed in this round, if anything yet.
    pub submission: Option<CreatorSubmission>,
    /// This round's ratings, one per rater.
    pub ratings: HashMap<PlayerId, i64>,
    /// Sum of round averages per creator, across the whole game.
    pub scoreboard: HashMap<PlayerId, f64>,
}

fn default_prompts(create_secs: u64) -> Vec<StudioPrompt> {
    vec![
        StudioPrompt {
            kind: PromptKind::Draw,
            text: "Draw your favorite animal".into(),
            elements: vec![],
            create_duration_sec: create_secs,
        },
        StudioPrompt {
            kind: PromptKind::Arrange,
            text: "Set a dinner table".into(),
            elements: vec![
                "plate".into(),
                "fork".into(),
                "knife".into(),
                "glass".into(),
                "napkin".into(),
            ],
            create_duration_sec: create_secs,
        },
        StudioPrompt {
            kind: PromptKind::Draw,
            text: "Draw your dream house".into(),
            elements: vec![],
            create_duration_sec: create_secs,
        },
    ]
}

/// Picks the next creator, avoiding the previous one whenever more than
/// one candidate exists.
fn pick_creator(
    candidates: &[PlayerId],
    previous: Option<PlayerId>,
    rng: &mut dyn RngCore,
) -> Option<PlayerId> {
    if candidates.is_empty() {
        return None;
    }
    let pool: Vec<PlayerId> = if candidates.len() > 1 {
        candidates
            .iter()
            .copied()
            .filter(|&id| Some(id) != previous)
            .collect()
    } else {
        candidates.to_vec()
    };
    Some(pool[rng.random_range(0..pool.len())])
}

fn round_snapshot(
    state: &StudioState,
    creator_nickname: String,
) -> StudioSnapshot {
    StudioSnapshot {
        phase: state.phase,
        round_index: state.round_index,
        rounds_total: state.rounds_total,
        creator_id: state.creator_id,
        creator_nickname,
        prompt: state.prompts[state.round_index % state.prompts.len()]
            .clone(),
        top_ratings: vec![],
        average_rating: None,
    }
}

fn studio_payload(snapshot: StudioSnapshot) -> QuestionPayload {
    let mut payload =
        QuestionPayload::new(QuestionKind::Single, snapshot.prompt.text.clone());
    payload.creator_studio = Some(snapshot);
    payload
}

// ---------------------------------------------------------------------------
// Phase transitions
// ---------------------------------------------------------------------------

fn begin_create(cx: &mut Dispatch<'_>) {
    let (payload, create_secs, rounds_total) = {
        let room = &mut *cx.room;
        let ModeState::Studio(state) = &mut room.mode_state else {
            return;
        };
        state.phase = StudioPhase::Create;
        state.submission = None;
        state.ratings.clear();
        room.question_index = state.round_index;
        let creator_nickname = room
            .players
            .iter()
            .find(|p| p.id == state.creator_id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default();
        let snapshot = round_snapshot(state, creator_nickname);
        let create_secs = snapshot.prompt.create_duration_sec;
        (studio_payload(snapshot), create_secs, state.rounds_total)
    };

    let generation = cx.room.timer.arm();
    cx.outbox.schedule(
        Alarm::StudioPhase(StudioPhase::Create),
        generation,
        Duration::from_secs(create_secs),
    );
    cx.broadcast_payload(payload, create_secs, rounds_total);
}

fn begin_rating(cx: &mut Dispatch<'_>) {
    let (payload, rounds_total, eligible) = {
        let room = &mut *cx.room;
        let ModeState::Studio(state) = &mut room.mode_state else {
            return;
        };
        state.phase = StudioPhase::Rating;
        state.ratings.clear();
        let eligible = room
            .players
            .iter()
            .filter(|p| !p.disconnected && p.id != state.creator_id)
            .count();
        let creator_nickname = room
            .players
            .iter()
            .find(|p| p.id == state.creator_id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default();
        let snapshot = round_snapshot(state, creator_nickname);
        (studio_payload(snapshot), state.rounds_total, eligible)
    };
    if eligible == 0 {
        begin_result(cx);
        return;
    }

    let rating_secs = cx.room.settings.studio_rating_secs;
    let generation = cx.room.timer.arm();
    cx.outbox.schedule(
        Alarm::StudioPhase(StudioPhase::Rating),
        generation,
        Duration::from_secs(rating_secs),
    );
    cx.broadcast_payload(payload, rating_secs, rounds_total);
}

fn begin_result(cx: &mut Dispatch<'_>) {
    let (payload, rounds_total, average) = {
        let room = &mut *cx.room;
        let ModeState::Studio(state) = &mut room.mode_state else {
            return;
        };
        state.phase = StudioPhase::Result;

        let mut ratings: Vec<i64> =
            state.ratings.values().copied().collect();
        ratings.sort_unstable_by(|a, b| b.cmp(a));
        let average = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<i64>() as f64 / ratings.len() as f64
        };
        *state.scoreboard.entry(state.creator_id).or_insert(0.0) +=
            average;
        if let Some(creator) = room
            .players
            .iter_mut()
            .find(|p| p.id == state.creator_id)
        {
            creator.score += average.round() as i64;
        }
        ratings.truncate(6);

        let creator_nickname = room
            .players
            .iter()
            .find(|p| p.id == state.creator_id)
            .map(|p| p.nickname.clone())
            .unwrap_or_default();
        let mut snapshot = round_snapshot(state, creator_nickname);
        snapshot.top_ratings = ratings;
        snapshot.average_rating = Some(average);
        (studio_payload(snapshot), state.rounds_total, average)
    };

    info!(
        room_pin = %cx.room.pin,
        round = cx.room.question_index,
        average,
        "studio round scored"
    );
    let result_secs = cx.room.settings.studio_result_secs;
    let generation = cx.room.timer.arm();
    cx.outbox.schedule(
        Alarm::StudioPhase(StudioPhase::Result),
        generation,
        Duration::from_secs(result_secs),
    );
    cx.broadcast_payload(payload, result_secs, rounds_total);
}

fn advance_round(cx: &mut Dispatch<'_>) {
    enum Next {
        Done,
        Round(PlayerId, Vec<PlayerId>),
    }

    let next = {
        let room = &mut *cx.room;
        let ModeState::Studio(state) = &mut room.mode_state else {
            return;
        };
        state.round_index += 1;
        if state.round_index >= state.rounds_total {
            Next::Done
        } else {
            let candidates: Vec<PlayerId> = room
                .players
                .iter()
                .filter(|p| !p.disconnected)
                .map(|p| p.id)
                .collect();
            if candidates.len() < 2 {
                Next::Done
            } else {
                Next::Round(state.creator_id, candidates)
            }
        }
    };

    match next {
        Next::Done => cx.game_over(),
        Next::Round(previous, candidates) => {
            match pick_creator(&candidates, Some(previous), &mut *cx.rng) {
                Some(creator_id) => {
                    if let ModeState::Studio(state) =
                        &mut cx.room.mode_state
                    {
                        state.creator_id = creator_id;
                    }
                    begin_create(cx);
                }
                None => cx.game_over(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Player actions
// ---------------------------------------------------------------------------

fn handle_submission(
    cx: &mut Dispatch<'_>,
    player_id: PlayerId,
    submission: CreatorSubmission,
) {
    enum Outcome {
        CreatorOnly,
        Saved(usize),
    }

    let outcome = {
        let ModeState::Studio(state) = &mut cx.room.mode_state else {
            return;
        };
        if state.phase != StudioPhase::Create {
            debug!(
                room_pin = %cx.room.pin,
                %player_id,
                "submission outside create phase ignored"
            );
            return;
        }
        if player_id != state.creator_id {
            Outcome::CreatorOnly
        } else {
            state.submission = Some(submission.clamped());
            Outcome::Saved(state.round_index)
        }
    };

    match outcome {
        Outcome::CreatorOnly => {
            cx.outbox.reject(
                player_id,
                Reject::new(RejectCode::CreatorStudioCreatorOnly),
            );
        }
        Outcome::Saved(round_index) => {
            info!(
                room_pin = %cx.room.pin,
                %player_id,
                round = round_index,
                "submission saved"
            );
            cx.outbox.push(
                Recipient::Player(player_id),
                ServerEvent::SubmissionSaved(SubmissionSavedAck {
                    round_index,
                }),
            );
            begin_rating(cx);
        }
    }
}

fn handle_rating(cx: &mut Dispatch<'_>, player_id: PlayerId, value: i64) {
    let progress = {
        let room = &mut *cx.room;
        let ModeState::Studio(state) = &mut room.mode_state else {
            return;
        };
        if state.phase != StudioPhase::Rating {
            debug!(
                room_pin = %room.pin,
                %player_id,
                "rating outside rating phase ignored"
            );
            return;
        }
        if player_id == state.creator_id {
            debug!(
                room_pin = %room.pin,
                %player_id,
                "creator rating their own work ignored"
            );
            return;
        }
        if state.ratings.contains_key(&player_id) {
            debug!(
                room_pin = %room.pin,
                %player_id,
                "duplicate rating ignored"
            );
            return;
        }
        let connected_rater = room
            .players
            .iter()
            .any(|p| p.id == player_id && !p.disconnected);
        if !connected_rater {
            return;
        }

        state.ratings.insert(player_id, value.clamp(1, 10));
        let eligible = room
            .players
            .iter()
            .filter(|p| !p.disconnected && p.id != state.creator_id)
            .count();
        let rated = state.ratings.len();
        RatingProgress {
            rated_count: rated,
            eligible_raters: eligible,
            average_rating: state.ratings.values().sum::<i64>() as f64
                / rated as f64,
        }
    };

    cx.outbox.broadcast(ServerEvent::RatingUpdate(progress));
    if progress.rated_count >= progress.eligible_raters {
        begin_result(cx);
    }
}

// ---------------------------------------------------------------------------
// The runtime
// ---------------------------------------------------------------------------

pub struct CreatorStudio;

impl ModeRuntime for CreatorStudio {
    fn mode(&self) -> GameMode {
        GameMode::CreatorStudio
    }

    fn on_game_start(&self, cx: &mut Dispatch<'_>) -> Result<Flow, Reject> {
        if cx.room.connected_count() < 2 {
            return Err(Reject::new(
                RejectCode::CreatorStudioNotEnoughPlayers,
            ));
        }

        let prompts = if cx.room.settings.studio_prompts.is_empty() {
            default_prompts(cx.room.settings.studio_create_secs)
        } else {
            cx.room.settings.studio_prompts.clone()
        };
        let candidates = cx.room.connected_ids();
        let Some(creator_id) =
            pick_creator(&candidates, None, &mut *cx.rng)
        else {
            return Err(Reject::new(
                RejectCode::CreatorStudioNotEnoughPlayers,
            ));
        };

        let rounds_total = cx.room.settings.studio_rounds;
        cx.room.mode_state = ModeState::Studio(StudioState {
            prompts,
            round_index: 0,
            rounds_total,
            creator_id,
            phase: StudioPhase::Create,
            submission: None,
            ratings: HashMap::new(),
            scoreboard: HashMap::new(),
        });
        cx.room.state = RoomState::Question;
        info!(
            room_pin = %cx.room.pin,
            rounds = rounds_total,
            creator = %creator_id,
            "creator studio started"
        );
        cx.outbox
            .broadcast(ServerEvent::GameStart(GameStartBroadcast {
                total_questions: rounds_total,
            }));
        begin_create(cx);
        Ok(Flow::Handled)
    }

    fn on_question_dispatch(
        &self,
        cx: &mut Dispatch<'_>,
        payload: &mut QuestionPayload,
    ) -> Flow {
        let _ = (cx, payload);
        Flow::Handled
    }

    fn on_player_answer(
        &self,
        cx: &mut Dispatch<'_>,
        player_id: PlayerId,
        answer: &AnswerPayload,
    ) -> Flow {
        match answer {
            AnswerPayload::Submission(submission) => {
                handle_submission(cx, player_id, submission.clone());
            }
            AnswerPayload::Rating(value) => {
                handle_rating(cx, player_id, *value);
            }
            _ => {
                debug!(
                    room_pin = %cx.room.pin,
                    %player_id,
                    "unsupported studio action ignored"
                );
            }
        }
        Flow::Handled
    }

    fn on_alarm(&self, cx: &mut Dispatch<'_>, alarm: Alarm) -> Flow {
        let Alarm::StudioPhase(phase) = alarm else {
            return Flow::Delegate;
        };
        let current = match &cx.room.mode_state {
            ModeState::Studio(state) => state.phase,
            _ => return Flow::Handled,
        };
        if phase != current {
            debug!(
                room_pin = %cx.room.pin,
                ?phase,
                ?current,
                "alarm for a finished phase dropped"
            );
            return Flow::Handled;
        }

        match phase {
            StudioPhase::Create => {
                // The window ran out with nothing handed in; the round
                // still gets rated (of an empty canvas).
                if let ModeState::Studio(state) = &mut cx.room.mode_state {
                    if state.submission.is_none() {
                        state.submission = Some(CreatorSubmission::Empty);
                    }
                }
                begin_rating(cx);
            }
            StudioPhase::Rating => begin_result(cx),
            StudioPhase::Result => advance_round(cx),
        }
        Flow::Handled
    }

    fn on_game_over(
        &self,
        cx: &mut Dispatch<'_>,
        broadcast: &mut GameOverBroadcast,
    ) -> Flow {
        if let ModeState::Studio(state) = &cx.room.mode_state {
            let mut scoreboard: Vec<StudioScore> = cx
                .room
                .players
                .iter()
                .filter_map(|p| {
                    state.scoreboard.get(&p.id).map(|&score| StudioScore {
                        id: p.id,
                        nickname: p.nickname.clone(),
                        score,
                    })
                })
                .collect();
            scoreboard.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| a.nickname.cmp(&b.nickname))
            });
            broadcast.creator_studio = Some(StudioOutcome { scoreboard });
        }
        Flow::Delegate
    }
}

// =========================================================================
// Tests
// =========================================================================
