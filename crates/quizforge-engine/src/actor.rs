//! Room actor: an isolated Tokio task that owns one game room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. No shared mutable state, just message
//! passing. The actor itself stays thin: it translates commands into
//! [`Dispatch`] calls, then routes whatever landed in the outbox to the
//! per-player channels and spawns a sleeper task for at most one
//! pending alarm.

use std::collections::HashMap;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use quizforge_protocol::{
    AnswerPayload, GameMode, Player, PlayerId, QuestionBroadcast, Recipient, Reject, RoomPin,
    ServerEvent,
};
use quizforge_scoring::{Scoring, StandardScoring};

use crate::config::RoomState;
use crate::dispatch::Dispatch;
use crate::error::EngineError;
use crate::outbox::Outbox;
use crate::room::Room;
use crate::timer::Alarm;

/// Commands queue up behind slow consumers; past this depth senders wait.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Channel sender for delivering events to one player's connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it. Everything else is
/// fire-and-forget; outcomes reach players as events.
pub(crate) enum RoomCommand {
    /// Seat a player (or re-seat one who left the room page and came
    /// back under the same id).
    AddPlayer { player: Player, sender: EventSender },

    /// The player's connection dropped; keep the seat, stop sending.
    MarkDisconnected { player_id: PlayerId },

    /// The player's connection is back on a fresh channel.
    MarkReconnected {
        player_id: PlayerId,
        sender: EventSender,
    },

    /// Leave the lobby and dispatch the first question.
    Start {
        reply: oneshot::Sender<Result<(), Reject>>,
    },

    /// An answer (or mode action) from a player.
    Answer {
        player_id: PlayerId,
        answer: AnswerPayload,
    },

    /// Host moved the room to the next question.
    Advance,

    /// Host ended the game early.
    End,

    /// A phase timer expired. Stale generations are dropped.
    Alarm { alarm: Alarm, generation: u64 },

    /// Request a metadata snapshot of the room.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the live game state).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub pin: RoomPin,
    pub state: RoomState,
    pub mode: GameMode,
    pub question_index: usize,
    pub total_questions: usize,
    pub question_open: bool,
    pub players: Vec<Player>,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone, it is just an `mpsc::Sender` wrapper. The
/// `RoomRegistry` holds one of these per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pin: RoomPin,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's pin.
    pub fn pin(&self) -> &RoomPin {
        &self.pin
    }

    /// Seats a player and hands the actor their event channel.
    pub async fn add_player(
        &self,
        player: Player,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        self.send(RoomCommand::AddPlayer { player, sender }).await
    }

    /// Reports a dropped connection.
    pub async fn mark_disconnected(&self, player_id: PlayerId) -> Result<(), EngineError> {
        self.send(RoomCommand::MarkDisconnected { player_id }).await
    }

    /// Reports a re-established connection.
    pub async fn mark_reconnected(
        &self,
        player_id: PlayerId,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        self.send(RoomCommand::MarkReconnected { player_id, sender })
            .await
    }

    /// Starts the game. `Ok(Some(reject))` means the room stayed in the
    /// lobby and the reject says why; `Err` means the actor is gone.
    pub async fn start(&self) -> Result<Option<Reject>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Start { reply: reply_tx }).await?;
        let result = reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.pin.clone()))?;
        Ok(result.err())
    }

    /// Delivers a player answer (fire-and-forget).
    pub async fn answer(
        &self,
        player_id: PlayerId,
        answer: AnswerPayload,
    ) -> Result<(), EngineError> {
        self.send(RoomCommand::Answer { player_id, answer }).await
    }

    /// Moves to the next question.
    pub async fn advance(&self) -> Result<(), EngineError> {
        self.send(RoomCommand::Advance).await
    }

    /// Ends the game now, broadcasting the final standings.
    pub async fn end(&self) -> Result<(), EngineError> {
        self.send(RoomCommand::End).await
    }

    /// Requests the current room snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.pin.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), EngineError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| EngineError::Unavailable(self.pin.clone()))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    scoring: Box<dyn Scoring>,
    rng: StdRng,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    /// Clone of our own command sender, handed to alarm sleeper tasks.
    commands: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        info!(
            room_pin = %self.room.pin,
            mode = %self.room.settings.mode,
            "room actor started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            if self.handle_command(cmd) {
                break;
            }
        }

        // Kill any sleeper still counting down for this room.
        self.room.timer.disarm();
        info!(room_pin = %self.room.pin, "room actor stopped");
    }

    /// Handles one command, then flushes whatever the dispatcher queued.
    /// Returns `true` on shutdown.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        let mut outbox = Outbox::default();
        let mut stop = false;

        match cmd {
            RoomCommand::AddPlayer { player, sender } => {
                info!(
                    room_pin = %self.room.pin,
                    player_id = %player.id,
                    nickname = %player.nickname,
                    "player joined"
                );
                let player_id = player.id;
                self.senders.insert(player_id, sender);
                self.room.add_player(player);
                self.replay_question(player_id, &mut outbox);
            }
            RoomCommand::MarkDisconnected { player_id } => {
                self.senders.remove(&player_id);
                self.room.mark_disconnected(player_id);
            }
            RoomCommand::MarkReconnected { player_id, sender } => {
                self.senders.insert(player_id, sender);
                self.room.mark_reconnected(player_id);
                self.replay_question(player_id, &mut outbox);
            }
            RoomCommand::Start { reply } => {
                let result = self.dispatch(&mut outbox, |cx| cx.start_game());
                let _ = reply.send(result);
            }
            RoomCommand::Answer { player_id, answer } => {
                self.dispatch(&mut outbox, |cx| cx.player_answer(player_id, answer));
            }
            RoomCommand::Advance => {
                self.dispatch(&mut outbox, |cx| cx.advance());
            }
            RoomCommand::End => {
                self.dispatch(&mut outbox, |cx| cx.game_over());
            }
            RoomCommand::Alarm { alarm, generation } => {
                self.dispatch(&mut outbox, |cx| cx.handle_alarm(alarm, generation));
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Shutdown => {
                info!(room_pin = %self.room.pin, "room shutting down");
                stop = true;
            }
        }

        self.flush(outbox);
        stop
    }

    /// Runs one closure against the room through a fresh dispatcher.
    fn dispatch<R>(
        &mut self,
        outbox: &mut Outbox,
        f: impl FnOnce(&mut Dispatch<'_>) -> R,
    ) -> R {
        let mut cx = Dispatch {
            room: &mut self.room,
            scoring: self.scoring.as_ref(),
            rng: &mut self.rng,
            outbox,
            now: Instant::now(),
        };
        f(&mut cx)
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            pin: self.room.pin.clone(),
            state: self.room.state,
            mode: self.room.settings.mode,
            question_index: self.room.question_index,
            total_questions: self.room.questions.len(),
            question_open: self.room.question_open,
            players: self.room.players.clone(),
        }
    }

    /// Re-sends the current question to one player so joiners and
    /// reconnecters land mid-round instead of on a blank screen. The
    /// duration is whatever remains of the answer window; mini-game
    /// boards are untimed and replay with zero.
    fn replay_question(&self, player_id: PlayerId, outbox: &mut Outbox) {
        let Some(payload) = self.room.current_payload.clone() else {
            return;
        };
        let duration = match self.room.question_started {
            Some(started) => {
                let elapsed = Instant::now().duration_since(started).as_secs();
                self.room.effective_duration().saturating_sub(elapsed)
            }
            None => 0,
        };
        let total = match self.room.settings.mode {
            GameMode::CreatorStudio => self.room.settings.studio_rounds,
            GameMode::XoDuel | GameMode::GearMachine => 1,
            _ => self.room.questions.len(),
        };
        outbox.push(
            Recipient::Player(player_id),
            ServerEvent::Question(QuestionBroadcast {
                question_index: self.room.question_index,
                total,
                duration,
                question: payload,
                players: self.room.players.clone(),
            }),
        );
    }

    /// Routes queued events to player channels and arms the pending
    /// alarm, if the dispatcher scheduled one.
    fn flush(&mut self, mut outbox: Outbox) {
        for (recipient, event) in outbox.take_events() {
            match recipient {
                Recipient::All => {
                    for player in &self.room.players {
                        self.send_to(player.id, &event);
                    }
                }
                Recipient::Player(player_id) => {
                    self.send_to(player_id, &event);
                }
                Recipient::AllExcept(excluded) => {
                    for player in &self.room.players {
                        if player.id != excluded {
                            self.send_to(player.id, &event);
                        }
                    }
                }
            }
        }

        if let Some(request) = outbox.take_alarm() {
            let commands = self.commands.clone();
            let task = tokio::spawn(async move {
                tokio::time::sleep(request.after).await;
                let _ = commands
                    .send(RoomCommand::Alarm {
                        alarm: request.alarm,
                        generation: request.generation,
                    })
                    .await;
            });
            self.room.timer.attach(task.abort_handle());
        }
    }

    /// Sends one event to a single player. Silently drops if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, event: &ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event.clone());
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate
/// with it.
pub(crate) fn spawn_room(room: Room) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let pin = room.pin.clone();

    let actor = RoomActor {
        room,
        scoring: Box::new(StandardScoring),
        rng: StdRng::from_os_rng(),
        senders: HashMap::new(),
        commands: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { pin, sender: tx }
}
