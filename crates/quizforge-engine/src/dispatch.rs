//! The dispatcher: one borrowed view of everything a command may touch.
//!
//! Every room command runs as a method on [`Dispatch`], which bundles the
//! room, the scoring policy, the rng and the outbox for the duration of
//! one command. The flow is two-phase: the dispatcher gives the active
//! mode runtime first refusal on each hook, and runs the default quiz
//! flow only when the runtime delegates. Illegal commands (starting a
//! running game, answering a closed question) are logged and dropped,
//! never errors; the only refusal that travels back to the caller is the
//! `Reject` a mode may raise from `on_game_start`.

use std::time::{Duration, Instant};

use rand::RngCore;
use tracing::{debug, info, warn};

use quizforge_protocol::{
    AnswerAck, AnswerPayload, GameOverBroadcast, GameStartBroadcast,
    PlayerId, QuestionBroadcast, QuestionEndBroadcast, QuestionPayload,
    Recipient, Reject, ServerEvent,
};
use quizforge_questions::{handler_for, AnswerTiming};
use quizforge_scoring::Scoring;

use crate::config::RoomState;
use crate::modes::{runtime_for, Flow, ModeState};
use crate::outbox::Outbox;
use crate::room::Room;
use crate::timer::Alarm;

/// Mutable context for one command against one room.
pub struct Dispatch<'a> {
    pub room: &'a mut Room,
    pub scoring: &'a dyn Scoring,
    pub rng: &'a mut dyn RngCore,
    pub outbox: &'a mut Outbox,
    /// The command's arrival time; answer timing is measured against it.
    pub now: Instant,
}

impl Dispatch<'_> {
    // -- game start ---------------------------------------------------------

    /// Starts the game. Only legal from the lobby; a second start is a
    /// no-op. A mode runtime may refuse (for example a duel without two
    /// players), which leaves the room in the lobby.
    pub fn start_game(&mut self) -> Result<(), Reject> {
        if self.room.state != RoomState::Lobby {
            debug!(
                room_pin = %self.room.pin,
                state = %self.room.state,
                "start ignored outside lobby"
            );
            return Ok(());
        }

        let runtime = runtime_for(self.room.settings.mode);
        if let Flow::Handled = runtime.on_game_start(self)? {
            return Ok(());
        }

        self.room.state = RoomState::Question;
        self.room.question_index = 0;
        info!(
            room_pin = %self.room.pin,
            mode = %self.room.settings.mode,
            players = self.room.players.len(),
            total_questions = self.room.questions.len(),
            "game started"
        );
        self.outbox
            .broadcast(ServerEvent::GameStart(GameStartBroadcast {
                total_questions: self.room.questions.len(),
            }));
        self.dispatch_question();
        Ok(())
    }

    // -- question flow ------------------------------------------------------

    /// Opens the question at the current index, or ends the game when the
    /// list is exhausted.
    pub fn dispatch_question(&mut self) {
        self.room.reset_question_scratch();
        let Some(question) = self.room.current_question().cloned() else {
            self.game_over();
            return;
        };

        let handler = handler_for(question.kind);
        let mut payload = handler.build_payload(
            &question,
            &mut self.room.meta.handler,
            &mut *self.rng,
        );

        let runtime = runtime_for(self.room.settings.mode);
        if let Flow::Handled =
            runtime.on_question_dispatch(self, &mut payload)
        {
            return;
        }

        let duration = self.room.effective_duration();
        self.room.question_started = Some(self.now);
        self.room.question_open = true;
        let generation = self.room.timer.arm();
        self.outbox.schedule(
            Alarm::QuestionTimeout,
            generation,
            Duration::from_secs(duration),
        );
        debug!(
            room_pin = %self.room.pin,
            question_index = self.room.question_index,
            kind = %question.kind,
            duration,
            "question dispatched"
        );
        let total = self.room.questions.len();
        self.broadcast_payload(payload, duration, total);
    }

    /// Sends a question payload to the room and remembers it for replay
    /// to late joiners. Does not touch the timer; the caller owns the
    /// phase deadline.
    pub(crate) fn broadcast_payload(
        &mut self,
        payload: QuestionPayload,
        duration: u64,
        total: usize,
    ) {
        self.room.current_payload = Some(payload.clone());
        self.outbox
            .broadcast(ServerEvent::Question(QuestionBroadcast {
                question_index: self.room.question_index,
                total,
                duration,
                question: payload,
                players: self.room.players.clone(),
            }));
    }

    /// Routes one answer. The mode runtime may intercept (duel moves,
    /// gear tests, studio submissions); otherwise the default flow
    /// evaluates it against the current question.
    pub fn player_answer(&mut self, player_id: PlayerId, answer: AnswerPayload) {
        if self.room.state != RoomState::Question {
            debug!(
                room_pin = %self.room.pin,
                %player_id,
                state = %self.room.state,
                "answer outside question phase ignored"
            );
            return;
        }
        if self.room.player(player_id).is_none() {
            warn!(
                room_pin = %self.room.pin,
                %player_id,
                "answer from unknown player ignored"
            );
            return;
        }

        let runtime = runtime_for(self.room.settings.mode);
        if let Flow::Handled =
            runtime.on_player_answer(self, player_id, &answer)
        {
            return;
        }
        self.default_answer(player_id, answer);
    }

    fn default_answer(&mut self, player_id: PlayerId, answer: AnswerPayload) {
        if !self.room.question_open {
            debug!(
                room_pin = %self.room.pin,
                %player_id,
                "answer after window closed ignored"
            );
            return;
        }
        if self.room.answered.contains(&player_id) {
            debug!(
                room_pin = %self.room.pin,
                %player_id,
                "duplicate answer ignored"
            );
            return;
        }
        let Some(question) = self.room.current_question().cloned() else {
            return;
        };

        let timing = AnswerTiming {
            time_ms: self
                .room
                .question_started
                .map(|started| {
                    self.now.duration_since(started).as_millis() as u64
                })
                .unwrap_or(0),
            duration_secs: self.room.effective_duration(),
        };

        let handler = handler_for(question.kind);
        let verdict;
        {
            let room = &mut *self.room;
            let Some(player) =
                room.players.iter_mut().find(|p| p.id == player_id)
            else {
                return;
            };
            if player.disconnected {
                debug!(
                    room_pin = %room.pin,
                    %player_id,
                    "answer from disconnected player ignored"
                );
                return;
            }
            verdict = handler.evaluate(
                &question,
                player,
                &answer,
                &mut room.meta.handler,
                self.scoring,
                timing,
            );
            player.score += verdict.round_score;
            room.answered.insert(player_id);
            room.round_scores.insert(player_id, verdict.round_score);
        }

        debug!(
            room_pin = %self.room.pin,
            %player_id,
            correct = verdict.is_correct,
            round_score = verdict.round_score,
            "answer evaluated"
        );
        self.outbox.push(
            Recipient::Player(player_id),
            ServerEvent::AnswerReceived(AnswerAck {
                question_index: self.room.question_index,
            }),
        );

        let all_answered = self
            .room
            .connected()
            .all(|p| self.room.answered.contains(&p.id));
        if all_answered {
            self.question_end();
        }
    }

    /// Closes the answer window. Idempotent: a second close (say a
    /// timeout racing the last answer) does nothing.
    pub fn question_end(&mut self) {
        if !self.room.question_open {
            return;
        }
        let runtime = runtime_for(self.room.settings.mode);
        if let Flow::Handled = runtime.on_question_end(self) {
            return;
        }
        self.finish_question();
    }

    /// The default close: settle post-round effects, reveal the answers,
    /// publish the scoreboards.
    pub(crate) fn finish_question(&mut self) {
        self.room.question_open = false;
        self.room.timer.disarm();
        let Some(question) = self.room.current_question().cloned() else {
            return;
        };

        let handler = handler_for(question.kind);
        {
            let room = &mut *self.room;
            handler.apply_post_round(
                &question,
                &mut room.meta.handler,
                &mut room.round_scores,
                &mut room.players,
            );
        }
        let reveal = handler.build_reveal(&question, &self.room.meta.handler);

        info!(
            room_pin = %self.room.pin,
            question_index = self.room.question_index,
            answered = self.room.answered.len(),
            "question closed"
        );
        self.outbox
            .broadcast(ServerEvent::QuestionEnd(QuestionEndBroadcast {
                question_index: self.room.question_index,
                reveal,
                round_scores: self.room.round_score_rows(),
                leaderboard: self.room.leaderboard(),
            }));
    }

    /// Moves to the next question. Only legal between questions; past the
    /// last question it ends the game.
    pub fn advance(&mut self) {
        if self.room.state != RoomState::Question || self.room.question_open
        {
            debug!(
                room_pin = %self.room.pin,
                state = %self.room.state,
                question_open = self.room.question_open,
                "advance ignored"
            );
            return;
        }
        self.room.question_index += 1;
        self.dispatch_question();
    }

    // -- game over ----------------------------------------------------------

    /// Ends the game and publishes the final standings. Idempotent.
    pub fn game_over(&mut self) {
        if self.room.state == RoomState::Finished {
            return;
        }
        self.room.timer.disarm();
        self.room.question_open = false;

        let mut broadcast = GameOverBroadcast {
            leaderboard: self.room.leaderboard(),
            xo: None,
            gear_machine: None,
            creator_studio: None,
        };
        let runtime = runtime_for(self.room.settings.mode);
        match runtime.on_game_over(self, &mut broadcast) {
            Flow::Handled => {}
            Flow::Delegate => self
                .outbox
                .broadcast(ServerEvent::GameOver(broadcast)),
        }

        self.room.mode_state = ModeState::None;
        self.room.state = RoomState::Finished;
        info!(room_pin = %self.room.pin, "game over");
    }

    // -- alarms -------------------------------------------------------------

    /// Delivers a fired deadline. Alarms from a superseded generation
    /// (the phase ended first) are dropped here.
    pub fn handle_alarm(&mut self, alarm: Alarm, generation: u64) {
        if !self.room.timer.accepts(generation) {
            debug!(
                room_pin = %self.room.pin,
                ?alarm,
                generation,
                "stale alarm dropped"
            );
            return;
        }
        match alarm {
            Alarm::QuestionTimeout => self.question_end(),
            Alarm::StudioPhase(_) => {
                let runtime = runtime_for(self.room.settings.mode);
                let _ = runtime.on_alarm(self, alarm);
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
